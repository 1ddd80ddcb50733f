//! Asset repository: submission, the approval workflow, supply and issuance.
//!
//! Every multi-step write runs in one database transaction and locks the
//! asset row first, so concurrent approvals, issuances and supply changes on
//! the same asset serialize.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use shareslice_core::{
    asset::{
        Actor, AssetAction, AssetError, AssetSubmission, AssetWorkflow, validate_submission,
        validate_supply_change,
    },
    ownership::OwnershipError,
    valuation,
};
use shareslice_shared::{AppError, types::PageRequest};
use uuid::Uuid;

use crate::entities::{
    assets, sea_orm_active_enums::{AssetStatus, ValueSource}, users, value_history,
};
use crate::repositories::fraction::{LedgerWrite, issued_quantity, write_issuance};

/// Error types for asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetRepoError {
    /// Asset not found.
    #[error("Asset not found: {0}")]
    NotFound(Uuid),

    /// Recipient of an issuance does not exist or is deleted.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Submission or workflow rule violated.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Issuance rule violated.
    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AssetRepoError> for AppError {
    fn from(err: AssetRepoError) -> Self {
        match err {
            AssetRepoError::NotFound(id) => Self::not_found("asset", id),
            AssetRepoError::UserNotFound(id) => Self::not_found("user", id),
            AssetRepoError::Asset(e) => Self::from_status(e.status_code(), e.to_string()),
            AssetRepoError::Ownership(e) => Self::from_status(e.status_code(), e.to_string()),
            AssetRepoError::Database(e) => crate::db_error_to_app(e),
        }
    }
}

/// An asset with its current valuation figures.
#[derive(Debug, Clone, Serialize)]
pub struct AssetDetail {
    /// The asset row.
    pub asset: assets::Model,
    /// Most recent valuation, if any.
    pub latest_value: Option<Decimal>,
    /// Latest value divided by available supply.
    pub fraction_value: Decimal,
    /// Units held in active fractions.
    pub issued: i64,
}

/// Result of approving an asset.
#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    /// The approved asset.
    pub asset: assets::Model,
    /// The `initial` valuation.
    pub valuation: value_history::Model,
    /// Genesis fraction and its `issue` transaction.
    pub genesis: LedgerWrite,
}

/// Asset repository.
#[derive(Debug, Clone)]
pub struct AssetRepository {
    db: DatabaseConnection,
}

impl AssetRepository {
    /// Creates a new asset repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits an asset for review. The whole supply starts available.
    ///
    /// # Errors
    ///
    /// Returns `Asset` if the submission breaks a rule.
    pub async fn submit(
        &self,
        submitted_by: Uuid,
        submission: &AssetSubmission,
    ) -> Result<assets::Model, AssetRepoError> {
        validate_submission(submission)?;

        let now = Utc::now().into();
        let asset = assets::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(submission.name.trim().to_string()),
            description: Set(submission.description.clone()),
            total_fractions: Set(submission.total_fractions),
            available_fractions: Set(submission.total_fractions),
            min_units: Set(submission.min_units),
            max_units: Set(submission.max_units),
            submitted_value: Set(valuation::round_value(submission.submitted_value)),
            status: Set(AssetStatus::Pending),
            submitted_by: Set(submitted_by),
            approved_by: Set(None),
            approved_at: Set(None),
            rejection_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let asset = asset.insert(&self.db).await?;
        tracing::info!(asset_id = %asset.id, user_id = %submitted_by, "Asset submitted");
        Ok(asset)
    }

    /// Finds an asset by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<assets::Model>, DbErr> {
        assets::Entity::find_by_id(id).one(&self.db).await
    }

    /// Loads an asset with its latest value and fraction value.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs.
    pub async fn find_detail(&self, id: Uuid) -> Result<AssetDetail, AssetRepoError> {
        let asset = self
            .find_by_id(id)
            .await?
            .ok_or(AssetRepoError::NotFound(id))?;
        let latest_value = self.latest_value(id).await?;
        let issued = issued_quantity(&self.db, id).await?;

        Ok(AssetDetail {
            fraction_value: valuation::fraction_value(latest_value, asset.available_fractions),
            asset,
            latest_value,
            issued,
        })
    }

    /// Lists assets in a status, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        status: AssetStatus,
        page: PageRequest,
    ) -> Result<(Vec<assets::Model>, u64), DbErr> {
        let query = assets::Entity::find().filter(assets::Column::Status.eq(status));

        let total = query.clone().count(&self.db).await?;
        let assets = query
            .order_by_desc(assets::Column::CreatedAt)
            .order_by_asc(assets::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((assets, total))
    }

    /// Counts assets in a status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_by_status(&self, status: AssetStatus) -> Result<u64, DbErr> {
        assets::Entity::find()
            .filter(assets::Column::Status.eq(status))
            .count(&self.db)
            .await
    }

    /// Most recent valuation of an asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_value(&self, asset_id: Uuid) -> Result<Option<Decimal>, DbErr> {
        let latest = value_history::Entity::find()
            .filter(value_history::Column::AssetId.eq(asset_id))
            .order_by_desc(value_history::Column::RecordedAt)
            .order_by_desc(value_history::Column::Id)
            .one(&self.db)
            .await?;

        Ok(latest.map(|v| v.value))
    }

    /// Approves a pending asset.
    ///
    /// In one transaction: marks the asset approved, records the submitted
    /// value as the `initial` valuation, and issues one genesis fraction of
    /// the whole available supply to the submitter.
    ///
    /// # Errors
    ///
    /// Returns `Asset` if the actor is not a manager or the asset is not
    /// pending.
    pub async fn approve(&self, id: Uuid, actor: &Actor) -> Result<Approval, AssetRepoError> {
        let txn = self.db.begin().await?;
        let asset = lock_asset(&txn, id).await?;

        let from = asset.status.into();
        let AssetAction::Approve {
            new_status,
            approved_by,
            approved_at,
        } = AssetWorkflow::approve(from, actor)?
        else {
            return Err(AssetError::InvalidTransition {
                from,
                to: shareslice_core::asset::AssetStatus::Approved,
            }
            .into());
        };

        let submitter = asset.submitted_by;
        let available = asset.available_fractions;
        let value = asset.submitted_value;

        let mut updated: assets::ActiveModel = asset.into();
        updated.status = Set(new_status.into());
        updated.approved_by = Set(Some(approved_by));
        updated.approved_at = Set(Some(approved_at.into()));
        updated.rejection_reason = Set(None);
        updated.updated_at = Set(approved_at.into());
        let asset = updated.update(&txn).await?;

        let valuation = value_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            asset_id: Set(id),
            value: Set(value),
            source: Set(ValueSource::Initial),
            adjusted_by: Set(Some(approved_by)),
            reason: Set(Some("Submitted value".to_string())),
            recorded_at: Set(approved_at.into()),
        }
        .insert(&txn)
        .await?;

        let genesis = write_issuance(&txn, id, submitter, available, approved_at).await?;

        txn.commit().await?;

        tracing::info!(
            asset_id = %id,
            user_id = %approved_by,
            genesis_fraction_id = %genesis.fraction.id,
            quantity = available,
            "Asset approved"
        );

        Ok(Approval {
            asset,
            valuation,
            genesis,
        })
    }

    /// Rejects a pending asset with a reason.
    ///
    /// # Errors
    ///
    /// Returns `Asset` if the actor is not a manager, the reason is empty,
    /// or the asset is not pending.
    pub async fn reject(
        &self,
        id: Uuid,
        actor: &Actor,
        reason: &str,
    ) -> Result<assets::Model, AssetRepoError> {
        let txn = self.db.begin().await?;
        let asset = lock_asset(&txn, id).await?;

        let from = asset.status.into();
        let AssetAction::Reject {
            new_status,
            rejection_reason,
            ..
        } = AssetWorkflow::reject(from, actor, reason)?
        else {
            return Err(AssetError::InvalidTransition {
                from,
                to: shareslice_core::asset::AssetStatus::Rejected,
            }
            .into());
        };

        let mut updated: assets::ActiveModel = asset.into();
        updated.status = Set(new_status.into());
        updated.rejection_reason = Set(Some(rejection_reason));
        updated.updated_at = Set(Utc::now().into());
        let asset = updated.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(asset_id = %id, user_id = %actor.id, "Asset rejected");
        Ok(asset)
    }

    /// Sends a rejected asset back to pending.
    ///
    /// # Errors
    ///
    /// Returns `Asset` if the actor did not submit the asset or it is not
    /// rejected.
    pub async fn resubmit(&self, id: Uuid, actor: &Actor) -> Result<assets::Model, AssetRepoError> {
        let txn = self.db.begin().await?;
        let asset = lock_asset(&txn, id).await?;

        let action = AssetWorkflow::resubmit(asset.status.into(), actor, asset.submitted_by)?;

        let mut updated: assets::ActiveModel = asset.into();
        updated.status = Set(action.new_status().into());
        updated.rejection_reason = Set(None);
        updated.updated_at = Set(Utc::now().into());
        let asset = updated.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(asset_id = %id, user_id = %actor.id, "Asset resubmitted");
        Ok(asset)
    }

    /// Changes the available supply. The fraction value trigger reprices
    /// every fraction of the asset.
    ///
    /// # Errors
    ///
    /// Returns `Asset` if the actor is not a manager or the new supply is
    /// below the issued quantity or above the total.
    pub async fn change_supply(
        &self,
        id: Uuid,
        actor: &Actor,
        available_fractions: i64,
    ) -> Result<assets::Model, AssetRepoError> {
        AssetWorkflow::require_manager(actor)?;

        let txn = self.db.begin().await?;
        let asset = lock_asset(&txn, id).await?;

        let issued = issued_quantity(&txn, id).await?;
        validate_supply_change(asset.total_fractions, issued, available_fractions)?;

        let mut updated: assets::ActiveModel = asset.into();
        updated.available_fractions = Set(available_fractions);
        updated.updated_at = Set(Utc::now().into());
        let asset = updated.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            asset_id = %id,
            user_id = %actor.id,
            available_fractions,
            "Asset supply changed"
        );
        Ok(asset)
    }

    /// Issues units from the unissued pool to `owner_id` as a new root
    /// fraction.
    ///
    /// # Errors
    ///
    /// Returns `Asset` if the actor is not a manager or the asset is not
    /// approved, and `Ownership` if the pool is too small.
    pub async fn issue(
        &self,
        id: Uuid,
        actor: &Actor,
        owner_id: Uuid,
        quantity: i64,
    ) -> Result<LedgerWrite, AssetRepoError> {
        AssetWorkflow::require_manager(actor)?;
        if quantity <= 0 {
            return Err(OwnershipError::NonPositiveQuantity { quantity }.into());
        }

        let txn = self.db.begin().await?;
        let asset = lock_asset(&txn, id).await?;

        let status: shareslice_core::asset::AssetStatus = asset.status.into();
        if !status.is_tradeable() {
            return Err(AssetError::NotApproved { status }.into());
        }

        users::Entity::find_by_id(owner_id)
            .filter(users::Column::IsDeleted.eq(false))
            .one(&txn)
            .await?
            .ok_or(AssetRepoError::UserNotFound(owner_id))?;

        let unissued = asset.available_fractions - issued_quantity(&txn, id).await?;
        if quantity > unissued {
            return Err(OwnershipError::InsufficientUnits {
                available: unissued,
                requested: quantity,
            }
            .into());
        }

        let write = write_issuance(&txn, id, owner_id, quantity, Utc::now()).await?;
        txn.commit().await?;

        tracing::info!(
            asset_id = %id,
            user_id = %owner_id,
            fraction_id = %write.fraction.id,
            quantity,
            "Fractions issued"
        );
        Ok(write)
    }
}

/// Loads an asset with `SELECT ... FOR UPDATE`.
async fn lock_asset(txn: &DatabaseTransaction, id: Uuid) -> Result<assets::Model, AssetRepoError> {
    assets::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(AssetRepoError::NotFound(id))
}
