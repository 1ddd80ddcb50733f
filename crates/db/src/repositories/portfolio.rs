//! Per-user holdings joined with asset valuations.

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use shareslice_core::portfolio::{Portfolio, PortfolioLine, summarize};
use shareslice_shared::types::AssetId;
use uuid::Uuid;

use crate::entities::{assets, fractions, value_history};

/// Portfolio repository.
#[derive(Debug, Clone)]
pub struct PortfolioRepository {
    db: DatabaseConnection,
}

impl PortfolioRepository {
    /// Creates a new portfolio repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Builds a user's portfolio from their active fractions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn for_user(&self, user_id: Uuid) -> Result<Portfolio, DbErr> {
        let held = fractions::Entity::find()
            .filter(fractions::Column::OwnerId.eq(user_id))
            .filter(fractions::Column::IsActive.eq(true))
            .find_also_related(assets::Entity)
            .all(&self.db)
            .await?;

        let mut asset_ids: Vec<Uuid> = held.iter().map(|(f, _)| f.asset_id).collect();
        asset_ids.sort_unstable();
        asset_ids.dedup();
        let latest = self.latest_values(&asset_ids).await?;

        let lines: Vec<PortfolioLine> = held
            .into_iter()
            .filter_map(|(fraction, asset)| {
                asset.map(|asset| PortfolioLine {
                    asset_id: AssetId::from(asset.id),
                    latest_value: latest.get(&asset.id).copied(),
                    asset_name: asset.name,
                    quantity: fraction.quantity,
                    fraction_value: fraction.fraction_value,
                    available_fractions: asset.available_fractions,
                })
            })
            .collect();

        Ok(summarize(&lines))
    }

    /// Latest valuation per asset, one row each via `DISTINCT ON (asset_id)`.
    async fn latest_values(
        &self,
        asset_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, rust_decimal::Decimal>, DbErr> {
        if asset_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = value_history::Entity::find()
            .distinct_on([value_history::Column::AssetId])
            .filter(value_history::Column::AssetId.is_in(asset_ids.iter().copied()))
            .order_by_asc(value_history::Column::AssetId)
            .order_by_desc(value_history::Column::RecordedAt)
            .order_by_desc(value_history::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|row| (row.asset_id, row.value)).collect())
    }
}
