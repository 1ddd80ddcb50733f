//! Property-based tests for FIFO allocation and transfer planning.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use shareslice_shared::types::{FractionId, UserId};
use uuid::Uuid;

use crate::ownership::error::OwnershipError;
use crate::ownership::transfer::{
    FractionState, HoldingSlot, UnitLimits, allocate_fifo, plan_transfer,
};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// Strategy for a seller's holdings: up to 8 fractions with distinct ids.
fn arb_slots() -> impl Strategy<Value = Vec<HoldingSlot>> {
    prop::collection::vec((0i64..500, 0i64..30), 0..8).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (quantity, minutes))| HoldingSlot {
                fraction_id: FractionId::from(Uuid::from_u128(i as u128 + 1)),
                quantity,
                created_at: base_time() + Duration::minutes(minutes),
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Allocation takes exactly the requested units, never more than a slot holds.
    #[test]
    fn prop_fifo_allocates_exactly(slots in arb_slots(), requested in 1i64..2000) {
        let available: i64 = slots.iter().map(|s| s.quantity).sum();

        match allocate_fifo(&slots, requested) {
            Ok(allocations) => {
                prop_assert!(requested <= available);
                let taken: i64 = allocations.iter().map(|a| a.quantity).sum();
                prop_assert_eq!(taken, requested);

                for allocation in &allocations {
                    let slot = slots.iter().find(|s| s.fraction_id == allocation.fraction_id).unwrap();
                    prop_assert!(allocation.quantity > 0);
                    prop_assert_eq!(allocation.quantity + allocation.remaining, slot.quantity);
                }
            }
            Err(OwnershipError::InsufficientUnits { available: a, requested: r }) => {
                prop_assert_eq!(a, available);
                prop_assert_eq!(r, requested);
                prop_assert!(requested > available);
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Only the last allocated slot may be left with units.
    #[test]
    fn prop_fifo_drains_before_moving_on(slots in arb_slots(), requested in 1i64..2000) {
        if let Ok(allocations) = allocate_fifo(&slots, requested) {
            if let Some((_, earlier)) = allocations.split_last() {
                for allocation in earlier {
                    prop_assert_eq!(allocation.remaining, 0);
                }
            }
        }
    }

    /// Planning conserves units between source and child.
    #[test]
    fn prop_transfer_conserves_quantity(held in 1i64..10_000, moved in 1i64..10_000) {
        let source = FractionState {
            id: FractionId::from(Uuid::from_u128(1)),
            owner_id: UserId::from(Uuid::from_u128(10)),
            quantity: held,
            is_active: true,
        };
        let to = UserId::from(Uuid::from_u128(11));

        match plan_transfer(&source, to, moved, &UnitLimits::UNBOUNDED) {
            Ok(plan) => {
                prop_assert_eq!(plan.source_remaining + plan.quantity, held);
                prop_assert_eq!(plan.deactivate_source, plan.source_remaining == 0);
            }
            Err(err) => {
                let is_insufficient = matches!(err, OwnershipError::InsufficientQuantity { .. });
                prop_assert!(is_insufficient);
                prop_assert!(moved > held);
            }
        }
    }
}
