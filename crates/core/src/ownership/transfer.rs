//! Transfer planning and FIFO allocation across a seller's fractions.

use chrono::{DateTime, Utc};
use shareslice_shared::types::{FractionId, TransactionId, UserId};

use crate::ownership::error::OwnershipError;
use crate::ownership::history::OwnershipEvent;

/// Per-transfer quantity bounds configured on an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitLimits {
    /// Smallest quantity a transfer may move.
    pub min_units: i64,
    /// Largest quantity a transfer may move.
    pub max_units: i64,
}

impl UnitLimits {
    /// No bounds beyond positivity. Used for the per-fraction legs of a
    /// trade, whose total was already checked against the asset limits.
    pub const UNBOUNDED: Self = Self {
        min_units: 1,
        max_units: i64::MAX,
    };

    /// Fails when `quantity` is outside the bounds.
    pub fn check(&self, quantity: i64) -> Result<(), OwnershipError> {
        if quantity < self.min_units || quantity > self.max_units {
            return Err(OwnershipError::OutsideUnitLimits {
                quantity,
                min: self.min_units,
                max: self.max_units,
            });
        }
        Ok(())
    }
}

/// The parts of a fraction row a transfer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FractionState {
    /// Fraction ID.
    pub id: FractionId,
    /// Current owner.
    pub owner_id: UserId,
    /// Units held.
    pub quantity: i64,
    /// False once the fraction has been fully transferred away.
    pub is_active: bool,
}

/// A validated transfer of units from a source fraction to a new child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Source fraction.
    pub source_id: FractionId,
    /// Owner giving up the units.
    pub from_owner_id: UserId,
    /// Owner of the new child fraction.
    pub to_owner_id: UserId,
    /// Units moved.
    pub quantity: i64,
    /// Units left on the source.
    pub source_remaining: i64,
    /// True when the source is emptied and must be marked inactive.
    pub deactivate_source: bool,
}

impl TransferPlan {
    /// Builds the pair of history events for this transfer.
    ///
    /// The first event is appended to the source; the second starts the
    /// child's history.
    #[must_use]
    pub fn events(
        &self,
        child_id: FractionId,
        transaction_id: TransactionId,
        at: DateTime<Utc>,
    ) -> (OwnershipEvent, OwnershipEvent) {
        (
            OwnershipEvent::TransferredOut {
                to_owner_id: self.to_owner_id,
                child_fraction_id: child_id,
                quantity: self.quantity,
                transaction_id,
                at,
            },
            OwnershipEvent::Received {
                from_owner_id: self.from_owner_id,
                parent_fraction_id: self.source_id,
                quantity: self.quantity,
                transaction_id,
                at,
            },
        )
    }
}

/// Validates moving `quantity` units of `source` to `to_owner_id`.
pub fn plan_transfer(
    source: &FractionState,
    to_owner_id: UserId,
    quantity: i64,
    limits: &UnitLimits,
) -> Result<TransferPlan, OwnershipError> {
    if quantity <= 0 {
        return Err(OwnershipError::NonPositiveQuantity { quantity });
    }
    if !source.is_active {
        return Err(OwnershipError::InactiveFraction {
            fraction_id: source.id,
        });
    }
    if quantity > source.quantity {
        return Err(OwnershipError::InsufficientQuantity {
            fraction_id: source.id,
            available: source.quantity,
            requested: quantity,
        });
    }
    if to_owner_id == source.owner_id {
        return Err(OwnershipError::SelfTransfer {
            owner_id: to_owner_id,
        });
    }
    limits.check(quantity)?;

    let source_remaining = source.quantity - quantity;
    Ok(TransferPlan {
        source_id: source.id,
        from_owner_id: source.owner_id,
        to_owner_id,
        quantity,
        source_remaining,
        deactivate_source: source_remaining == 0,
    })
}

/// An active fraction available to fill a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldingSlot {
    /// Fraction ID.
    pub fraction_id: FractionId,
    /// Units held.
    pub quantity: i64,
    /// Creation time; older slots are consumed first.
    pub created_at: DateTime<Utc>,
}

/// Units taken from one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Fraction the units come from.
    pub fraction_id: FractionId,
    /// Units taken.
    pub quantity: i64,
    /// Units left on the fraction afterwards.
    pub remaining: i64,
}

/// Takes `requested` units from `slots`, oldest first.
///
/// Ties on `created_at` fall back to fraction ID so the order is stable.
/// Slots with no units are skipped.
pub fn allocate_fifo(
    slots: &[HoldingSlot],
    requested: i64,
) -> Result<Vec<Allocation>, OwnershipError> {
    if requested <= 0 {
        return Err(OwnershipError::NonPositiveQuantity {
            quantity: requested,
        });
    }

    let available: i64 = slots.iter().map(|s| s.quantity.max(0)).sum();
    if available < requested {
        return Err(OwnershipError::InsufficientUnits {
            available,
            requested,
        });
    }

    let mut ordered: Vec<&HoldingSlot> = slots.iter().filter(|s| s.quantity > 0).collect();
    ordered.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.fraction_id.cmp(&b.fraction_id))
    });

    let mut outstanding = requested;
    let mut allocations = Vec::new();
    for slot in ordered {
        if outstanding == 0 {
            break;
        }
        let take = slot.quantity.min(outstanding);
        outstanding -= take;
        allocations.push(Allocation {
            fraction_id: slot.fraction_id,
            quantity: take,
            remaining: slot.quantity - take,
        });
    }

    Ok(allocations)
}
