//! Holding aggregation for a user's portfolio.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use shareslice_shared::types::AssetId;

use crate::valuation::{estimated_value, ownership_percent};

/// One active fraction owned by the user, joined with its asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioLine {
    /// Asset the fraction belongs to.
    pub asset_id: AssetId,
    /// Asset display name.
    pub asset_name: String,
    /// Units on the fraction.
    pub quantity: i64,
    /// Current value per unit.
    pub fraction_value: Decimal,
    /// Latest asset valuation, if any.
    pub latest_value: Option<Decimal>,
    /// Asset supply used as the value denominator.
    pub available_fractions: i64,
}

/// Aggregated position in one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holding {
    /// Asset ID.
    pub asset_id: AssetId,
    /// Asset display name.
    pub asset_name: String,
    /// Units held across all fractions.
    pub units: i64,
    /// Number of fractions held.
    pub fractions: usize,
    /// Current value per unit.
    pub fraction_value: Decimal,
    /// Latest asset valuation.
    pub latest_value: Option<Decimal>,
    /// `units * fraction_value`.
    pub estimated_value: Decimal,
    /// Share of the asset's available supply, in percent.
    pub ownership_percent: Decimal,
}

/// A user's holdings with their combined value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    /// Holdings, most valuable first.
    pub holdings: Vec<Holding>,
    /// Sum of estimated values.
    pub total_value: Decimal,
}

/// Groups a user's fractions by asset.
#[must_use]
pub fn summarize(lines: &[PortfolioLine]) -> Portfolio {
    let mut grouped: BTreeMap<AssetId, Holding> = BTreeMap::new();
    let mut supply: BTreeMap<AssetId, i64> = BTreeMap::new();

    for line in lines {
        supply.insert(line.asset_id, line.available_fractions);
        let holding = grouped.entry(line.asset_id).or_insert_with(|| Holding {
            asset_id: line.asset_id,
            asset_name: line.asset_name.clone(),
            units: 0,
            fractions: 0,
            fraction_value: line.fraction_value,
            latest_value: line.latest_value,
            estimated_value: Decimal::ZERO,
            ownership_percent: Decimal::ZERO,
        });
        holding.units += line.quantity;
        holding.fractions += 1;
    }

    let mut holdings: Vec<Holding> = grouped
        .into_values()
        .map(|mut h| {
            h.estimated_value = estimated_value(h.units, h.fraction_value);
            h.ownership_percent =
                ownership_percent(h.units, supply.get(&h.asset_id).copied().unwrap_or(0));
            h
        })
        .collect();

    holdings.sort_by(|a, b| {
        b.estimated_value
            .cmp(&a.estimated_value)
            .then_with(|| a.asset_name.cmp(&b.asset_name))
    });

    let total_value = holdings.iter().map(|h| h.estimated_value).sum();
    Portfolio {
        holdings,
        total_value,
    }
}
