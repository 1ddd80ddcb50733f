//! Point-in-time ownership reconstruction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shareslice_shared::types::{FractionId, UserId};

use crate::ownership::history::OwnershipHistory;

/// A fraction's owner and decoded history.
#[derive(Debug, Clone)]
pub struct FractionRecord {
    /// Fraction ID.
    pub fraction_id: FractionId,
    /// Owner for the fraction's whole life.
    pub owner_id: UserId,
    /// Decoded `owners_history`.
    pub history: OwnershipHistory,
}

/// Units one owner held at the snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OwnerHolding {
    /// Owner.
    pub owner_id: UserId,
    /// Units held across all of the owner's fractions.
    pub quantity: i64,
    /// Number of fractions contributing units.
    pub fractions: usize,
}

/// Replays every fraction's history up to `at` and totals units per owner.
///
/// Fractions created after `at` are ignored and owners left with zero units
/// are dropped. Results are ordered by quantity, largest first.
#[must_use]
pub fn snapshot(records: &[FractionRecord], at: DateTime<Utc>) -> Vec<OwnerHolding> {
    let mut totals: HashMap<UserId, (i64, usize)> = HashMap::new();

    for record in records {
        if let Some(quantity) = record.history.quantity_at(at).filter(|q| *q > 0) {
            let entry = totals.entry(record.owner_id).or_default();
            entry.0 += quantity;
            entry.1 += 1;
        }
    }

    let mut holdings: Vec<OwnerHolding> = totals
        .into_iter()
        .map(|(owner_id, (quantity, fractions))| OwnerHolding {
            owner_id,
            quantity,
            fractions,
        })
        .collect();

    holdings.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.owner_id.cmp(&b.owner_id))
    });
    holdings
}
