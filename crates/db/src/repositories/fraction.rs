//! Fraction repository: holdings, lineage, snapshots, and the ledger writes
//! shared by issuance, transfers and trades.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use serde::Serialize;
use shareslice_core::ownership::{
    self, FractionRecord, FractionState, HoldingSlot, OwnerHolding, OwnershipError,
    OwnershipEvent, OwnershipHistory, TransferPlan,
};
use shareslice_shared::{
    AppError,
    types::{FractionId, TransactionId, UserId},
};
use uuid::Uuid;

use crate::entities::{fractions, sea_orm_active_enums::TransactionType, transactions};

/// Error types for fraction reads.
#[derive(Debug, thiserror::Error)]
pub enum FractionError {
    /// Fraction not found.
    #[error("Fraction not found: {0}")]
    NotFound(Uuid),

    /// Stored history could not be decoded or walked.
    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<FractionError> for AppError {
    fn from(err: FractionError) -> Self {
        match err {
            FractionError::NotFound(id) => Self::not_found("fraction", id),
            FractionError::Ownership(e) => Self::from_status(e.status_code(), e.to_string()),
            FractionError::Database(e) => crate::db_error_to_app(e),
        }
    }
}

/// A fraction row with its decoded history.
#[derive(Debug, Clone, Serialize)]
pub struct FractionWithHistory {
    /// The row.
    pub fraction: fractions::Model,
    /// Decoded `owners_history`.
    pub history: OwnershipHistory,
}

/// Rows written by one ledger movement.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerWrite {
    /// The newly created fraction.
    pub fraction: fractions::Model,
    /// The transaction recording the movement.
    pub transaction: transactions::Model,
    /// The source fraction after the split, absent for issuance.
    pub source: Option<fractions::Model>,
}

impl From<&fractions::Model> for FractionState {
    fn from(model: &fractions::Model) -> Self {
        Self {
            id: FractionId::from(model.id),
            owner_id: UserId::from(model.owner_id),
            quantity: model.quantity,
            is_active: model.is_active,
        }
    }
}

impl From<&fractions::Model> for HoldingSlot {
    fn from(model: &fractions::Model) -> Self {
        Self {
            fraction_id: FractionId::from(model.id),
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Creates a root fraction from the unissued pool with an `issue` transaction.
pub(crate) async fn write_issuance<C: ConnectionTrait>(
    conn: &C,
    asset_id: Uuid,
    owner_id: Uuid,
    quantity: i64,
    at: DateTime<Utc>,
) -> Result<LedgerWrite, DbErr> {
    let fraction_id = Uuid::new_v4();
    let transaction_id = Uuid::new_v4();

    let history = OwnershipHistory::starting_with(OwnershipEvent::Issued {
        owner_id: UserId::from(owner_id),
        quantity,
        transaction_id: TransactionId::from(transaction_id),
        at,
    });

    let fraction = fractions::ActiveModel {
        id: Set(fraction_id),
        asset_id: Set(asset_id),
        owner_id: Set(owner_id),
        parent_fraction_id: Set(None),
        quantity: Set(quantity),
        is_active: Set(true),
        fraction_value: Set(Decimal::ZERO),
        owners_history: Set(history.to_json()),
        created_at: Set(at.into()),
        updated_at: Set(at.into()),
    }
    .insert(conn)
    .await?;

    let transaction = transactions::ActiveModel {
        id: Set(transaction_id),
        asset_id: Set(asset_id),
        source_fraction_id: Set(None),
        target_fraction_id: Set(fraction_id),
        from_owner_id: Set(None),
        to_owner_id: Set(owner_id),
        quantity: Set(quantity),
        unit_price: Set(None),
        offer_id: Set(None),
        transaction_type: Set(TransactionType::Issue),
        created_at: Set(at.into()),
    }
    .insert(conn)
    .await?;

    Ok(LedgerWrite {
        fraction,
        transaction,
        source: None,
    })
}

/// How a split is recorded in the ledger.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitKind {
    pub transaction_type: TransactionType,
    pub unit_price: Option<Decimal>,
    pub offer_id: Option<Uuid>,
}

/// Splits `plan.quantity` units off a locked source fraction into a child.
///
/// The source gets a `transferred_out` event and the child starts with a
/// `received` event; both reference the same transaction.
pub(crate) async fn write_split<C, E>(
    conn: &C,
    source: fractions::Model,
    plan: &TransferPlan,
    kind: SplitKind,
    at: DateTime<Utc>,
) -> Result<LedgerWrite, E>
where
    C: ConnectionTrait,
    E: From<DbErr> + From<OwnershipError>,
{
    let child_id = Uuid::new_v4();
    let transaction_id = Uuid::new_v4();
    let asset_id = source.asset_id;

    let (outgoing, incoming) = plan.events(
        FractionId::from(child_id),
        TransactionId::from(transaction_id),
        at,
    );

    let mut source_history = OwnershipHistory::from_json(&source.owners_history)?;
    source_history.push(outgoing);

    let fraction = fractions::ActiveModel {
        id: Set(child_id),
        asset_id: Set(asset_id),
        owner_id: Set(plan.to_owner_id.into()),
        parent_fraction_id: Set(Some(source.id)),
        quantity: Set(plan.quantity),
        is_active: Set(true),
        fraction_value: Set(Decimal::ZERO),
        owners_history: Set(OwnershipHistory::starting_with(incoming).to_json()),
        created_at: Set(at.into()),
        updated_at: Set(at.into()),
    }
    .insert(conn)
    .await?;

    let mut updated: fractions::ActiveModel = source.into();
    updated.quantity = Set(plan.source_remaining);
    updated.is_active = Set(!plan.deactivate_source);
    updated.owners_history = Set(source_history.to_json());
    updated.updated_at = Set(at.into());
    let source = updated.update(conn).await?;

    let transaction = transactions::ActiveModel {
        id: Set(transaction_id),
        asset_id: Set(asset_id),
        source_fraction_id: Set(Some(plan.source_id.into())),
        target_fraction_id: Set(child_id),
        from_owner_id: Set(Some(plan.from_owner_id.into())),
        to_owner_id: Set(plan.to_owner_id.into()),
        quantity: Set(plan.quantity),
        unit_price: Set(kind.unit_price),
        offer_id: Set(kind.offer_id),
        transaction_type: Set(kind.transaction_type),
        created_at: Set(at.into()),
    }
    .insert(conn)
    .await?;

    Ok(LedgerWrite {
        fraction,
        transaction,
        source: Some(source),
    })
}

/// Units of an asset held in active fractions.
pub(crate) async fn issued_quantity<C: ConnectionTrait>(
    conn: &C,
    asset_id: Uuid,
) -> Result<i64, DbErr> {
    let issued = fractions::Entity::find()
        .select_only()
        .column_as(Expr::cust("COALESCE(SUM(quantity), 0)::BIGINT"), "issued")
        .filter(fractions::Column::AssetId.eq(asset_id))
        .filter(fractions::Column::IsActive.eq(true))
        .into_tuple::<i64>()
        .one(conn)
        .await?;

    Ok(issued.unwrap_or(0))
}

/// Fraction repository for reads over the ownership ledger.
#[derive(Debug, Clone)]
pub struct FractionRepository {
    db: DatabaseConnection,
}

impl FractionRepository {
    /// Creates a new fraction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a fraction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<fractions::Model>, DbErr> {
        fractions::Entity::find_by_id(id).one(&self.db).await
    }

    /// Loads a fraction and decodes its history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs and `Ownership` if the stored
    /// history is malformed.
    pub async fn find_with_history(&self, id: Uuid) -> Result<FractionWithHistory, FractionError> {
        let fraction = self
            .find_by_id(id)
            .await?
            .ok_or(FractionError::NotFound(id))?;
        let history = OwnershipHistory::from_json(&fraction.owners_history)?;
        Ok(FractionWithHistory { fraction, history })
    }

    /// Lists an asset's fractions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_asset(
        &self,
        asset_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<fractions::Model>, DbErr> {
        let mut query = fractions::Entity::find().filter(fractions::Column::AssetId.eq(asset_id));
        if !include_inactive {
            query = query.filter(fractions::Column::IsActive.eq(true));
        }

        query
            .order_by_asc(fractions::Column::CreatedAt)
            .order_by_asc(fractions::Column::Id)
            .all(&self.db)
            .await
    }

    /// Lists a user's active fractions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<fractions::Model>, DbErr> {
        fractions::Entity::find()
            .filter(fractions::Column::OwnerId.eq(owner_id))
            .filter(fractions::Column::IsActive.eq(true))
            .order_by_asc(fractions::Column::CreatedAt)
            .order_by_asc(fractions::Column::Id)
            .all(&self.db)
            .await
    }

    /// Units of an asset currently held by owners.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn issued_quantity(&self, asset_id: Uuid) -> Result<i64, DbErr> {
        issued_quantity(&self.db, asset_id).await
    }

    /// Returns the fraction followed by its ancestors up to the root.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs and `Ownership` if the parent
    /// links form a cycle.
    pub async fn lineage(&self, id: Uuid) -> Result<Vec<fractions::Model>, FractionError> {
        let start = self
            .find_by_id(id)
            .await?
            .ok_or(FractionError::NotFound(id))?;

        let siblings = self.list_by_asset(start.asset_id, true).await?;
        let by_id: HashMap<Uuid, fractions::Model> =
            siblings.into_iter().map(|f| (f.id, f)).collect();

        let chain = ownership::lineage(FractionId::from(id), |fid| {
            by_id
                .get(&fid.into_inner())
                .and_then(|f| f.parent_fraction_id)
                .map(FractionId::from)
        })?;

        Ok(chain
            .into_iter()
            .filter_map(|fid| by_id.get(&fid.into_inner()).cloned())
            .collect())
    }

    /// Reconstructs who held the asset at `at` from fraction histories.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a history is malformed.
    pub async fn snapshot(
        &self,
        asset_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<OwnerHolding>, FractionError> {
        let rows = fractions::Entity::find()
            .filter(fractions::Column::AssetId.eq(asset_id))
            .filter(fractions::Column::CreatedAt.lte(at))
            .all(&self.db)
            .await?;

        let records = rows
            .iter()
            .map(|row| {
                Ok(FractionRecord {
                    fraction_id: FractionId::from(row.id),
                    owner_id: UserId::from(row.owner_id),
                    history: OwnershipHistory::from_json(&row.owners_history)?,
                })
            })
            .collect::<Result<Vec<_>, OwnershipError>>()?;

        Ok(ownership::snapshot(&records, at))
    }
}
