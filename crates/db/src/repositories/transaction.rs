//! Read access to the immutable transaction ledger.

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use shareslice_shared::types::PageRequest;
use uuid::Uuid;

use crate::entities::transactions;

/// Filter options for an asset's ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    /// Only transactions where this user gave or received units.
    pub owner_id: Option<Uuid>,
    /// Date range start (inclusive, UTC).
    pub from: Option<NaiveDate>,
    /// Date range end (inclusive, UTC).
    pub to: Option<NaiveDate>,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(id).one(&self.db).await
    }

    /// Transactions where the user is sender or recipient, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        asset_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<(Vec<transactions::Model>, u64), DbErr> {
        let mut query = transactions::Entity::find().filter(party_to(user_id));
        if let Some(asset_id) = asset_id {
            query = query.filter(transactions::Column::AssetId.eq(asset_id));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// An asset's ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_asset(
        &self,
        asset_id: Uuid,
        filter: &LedgerFilter,
        page: PageRequest,
    ) -> Result<(Vec<transactions::Model>, u64), DbErr> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::AssetId.eq(asset_id));

        if let Some(owner_id) = filter.owner_id {
            query = query.filter(party_to(owner_id));
        }
        if let Some(start) = filter.from.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            query = query.filter(transactions::Column::CreatedAt.gte(start.and_utc()));
        }
        if let Some(end) = filter
            .to
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            query = query.filter(transactions::Column::CreatedAt.lt(end.and_utc()));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Most recent transactions across all assets.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recent(&self, limit: u64) -> Result<Vec<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
    }
}

fn party_to(user_id: Uuid) -> Condition {
    Condition::any()
        .add(transactions::Column::FromOwnerId.eq(user_id))
        .add(transactions::Column::ToOwnerId.eq(user_id))
}
