//! Platform-wide counts for the manager dashboard.

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;

use crate::entities::{fractions, sea_orm_active_enums::AssetStatus, transactions, users};
use crate::repositories::asset::AssetRepository;

/// Number of transactions included in [`PlatformStats::recent_transactions`].
pub const RECENT_TRANSACTIONS: u64 = 5;

/// Asset counts by workflow status.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AssetCounts {
    /// Awaiting review.
    pub pending: u64,
    /// Approved and tradeable.
    pub approved: u64,
    /// Rejected.
    pub rejected: u64,
}

/// Snapshot of platform activity.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    /// Active users.
    pub users: u64,
    /// Assets by status.
    pub assets: AssetCounts,
    /// Active fractions.
    pub active_fractions: u64,
    /// All transactions.
    pub transactions: u64,
    /// Latest transactions, newest first.
    pub recent_transactions: Vec<transactions::Model>,
}

/// Stats repository.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    db: DatabaseConnection,
}

impl StatsRepository {
    /// Creates a new stats repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Collects platform counts.
    ///
    /// # Errors
    ///
    /// Returns an error if any query fails.
    pub async fn collect(&self) -> Result<PlatformStats, DbErr> {
        let users = users::Entity::find()
            .filter(users::Column::IsDeleted.eq(false))
            .count(&self.db)
            .await?;

        let asset_repo = AssetRepository::new(self.db.clone());
        let assets = AssetCounts {
            pending: asset_repo.count_by_status(AssetStatus::Pending).await?,
            approved: asset_repo.count_by_status(AssetStatus::Approved).await?,
            rejected: asset_repo.count_by_status(AssetStatus::Rejected).await?,
        };

        let active_fractions = fractions::Entity::find()
            .filter(fractions::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        let transactions_count = transactions::Entity::find().count(&self.db).await?;

        let recent_transactions = transactions::Entity::find()
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(RECENT_TRANSACTIONS)
            .all(&self.db)
            .await?;

        Ok(PlatformStats {
            users,
            assets,
            active_fractions,
            transactions: transactions_count,
            recent_transactions,
        })
    }
}
