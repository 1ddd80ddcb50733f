//! Valuation history reads and manual adjustments.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use shareslice_core::{
    asset::{Actor, AssetError, AssetWorkflow},
    valuation::{self, ValuationError},
};
use shareslice_shared::AppError;
use uuid::Uuid;

use crate::entities::{assets, sea_orm_active_enums::ValueSource, value_history};

/// Error types for valuation operations.
#[derive(Debug, thiserror::Error)]
pub enum ValuationRepoError {
    /// Asset not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(Uuid),

    /// Actor or asset state rejected.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Value rejected.
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ValuationRepoError> for AppError {
    fn from(err: ValuationRepoError) -> Self {
        match err {
            ValuationRepoError::AssetNotFound(id) => Self::not_found("asset", id),
            ValuationRepoError::Asset(e) => Self::from_status(e.status_code(), e.to_string()),
            ValuationRepoError::Valuation(e) => Self::from_status(e.status_code(), e.to_string()),
            ValuationRepoError::Database(e) => crate::db_error_to_app(e),
        }
    }
}

/// One valuation with its change from the previous one.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationPoint {
    /// Valuation ID.
    pub id: Uuid,
    /// Asset value.
    pub value: Decimal,
    /// Where the value came from.
    pub source: ValueSource,
    /// Manager who entered it, if any.
    pub adjusted_by: Option<Uuid>,
    /// Free-text reason.
    pub reason: Option<String>,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Percent change from the previous point in the series.
    pub change_percent: Option<Decimal>,
}

/// Attaches `change_percent` to an ascending series.
#[must_use]
pub fn with_change_percent(rows: Vec<value_history::Model>) -> Vec<ValuationPoint> {
    let mut previous: Option<Decimal> = None;
    rows.into_iter()
        .map(|row| {
            let change = previous.and_then(|prev| valuation::change_percent(prev, row.value));
            previous = Some(row.value);
            ValuationPoint {
                id: row.id,
                value: row.value,
                source: row.source,
                adjusted_by: row.adjusted_by,
                reason: row.reason,
                recorded_at: row.recorded_at.with_timezone(&Utc),
                change_percent: change,
            }
        })
        .collect()
}

/// Records a valuation implied by a trade price.
pub(crate) async fn record_trade_valuation<C: ConnectionTrait>(
    conn: &C,
    asset_id: Uuid,
    value: Decimal,
    at: DateTime<Utc>,
) -> Result<value_history::Model, DbErr> {
    value_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        asset_id: Set(asset_id),
        value: Set(valuation::round_value(value)),
        source: Set(ValueSource::Trade),
        adjusted_by: Set(None),
        reason: Set(None),
        recorded_at: Set(at.into()),
    }
    .insert(conn)
    .await
}

/// Valuation repository.
#[derive(Debug, Clone)]
pub struct ValuationRepository {
    db: DatabaseConnection,
}

impl ValuationRepository {
    /// Creates a new valuation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Valuations of an asset in ascending order, optionally bounded by
    /// inclusive calendar dates (UTC).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn history(
        &self,
        asset_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ValuationPoint>, DbErr> {
        let mut query =
            value_history::Entity::find().filter(value_history::Column::AssetId.eq(asset_id));

        if let Some(from) = from {
            let start = from.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
            if let Some(start) = start {
                query = query.filter(value_history::Column::RecordedAt.gte(start));
            }
        }
        if let Some(to) = to {
            let end = to.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc());
            if let Some(end) = end {
                query = query.filter(value_history::Column::RecordedAt.lt(end));
            }
        }

        let rows = query
            .order_by_asc(value_history::Column::RecordedAt)
            .order_by_asc(value_history::Column::Id)
            .all(&self.db)
            .await?;

        Ok(with_change_percent(rows))
    }

    /// Records a manual valuation. The fraction value trigger reprices the
    /// asset's fractions.
    ///
    /// # Errors
    ///
    /// Returns `Asset` if the actor is not a manager, `Valuation` if the
    /// value is not positive or too precise.
    pub async fn record_adjustment(
        &self,
        asset_id: Uuid,
        actor: &Actor,
        value: Decimal,
        reason: Option<String>,
    ) -> Result<value_history::Model, ValuationRepoError> {
        AssetWorkflow::require_manager(actor)?;
        let value = valuation::validate_valuation(value)?;

        assets::Entity::find_by_id(asset_id)
            .one(&self.db)
            .await?
            .ok_or(ValuationRepoError::AssetNotFound(asset_id))?;

        let row = value_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            asset_id: Set(asset_id),
            value: Set(value),
            source: Set(ValueSource::ManualAdjust),
            adjusted_by: Set(Some(actor.id)),
            reason: Set(reason.filter(|r| !r.trim().is_empty())),
            recorded_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(asset_id = %asset_id, user_id = %actor.id, value = %value, "Valuation adjusted");
        Ok(row)
    }
}
