//! Property-based tests for the asset approval workflow.

use proptest::prelude::*;
use uuid::Uuid;

use crate::asset::error::AssetError;
use crate::asset::service::AssetWorkflow;
use crate::asset::types::{Actor, AssetStatus};

fn arb_status() -> impl Strategy<Value = AssetStatus> {
    prop_oneof![
        Just(AssetStatus::Pending),
        Just(AssetStatus::Approved),
        Just(AssetStatus::Rejected),
    ]
}

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_actor() -> impl Strategy<Value = Actor> {
    (arb_uuid(), any::<bool>()).prop_map(|(id, is_manager)| Actor::new(id, is_manager))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approval succeeds exactly for a manager acting on a pending asset.
    #[test]
    fn prop_approve_needs_manager_and_pending(status in arb_status(), actor in arb_actor()) {
        let result = AssetWorkflow::approve(status, &actor);
        let expected_ok = actor.is_manager && status == AssetStatus::Pending;
        prop_assert_eq!(result.is_ok(), expected_ok);

        if !actor.is_manager {
            prop_assert_eq!(result.unwrap_err(), AssetError::NotManager { user_id: actor.id });
        }
    }

    /// Every successful action lands on a status the transition table allows.
    #[test]
    fn prop_actions_follow_transition_table(
        status in arb_status(),
        actor in arb_actor(),
        reason in "[a-z ]{0,30}",
    ) {
        let outcomes = [
            AssetWorkflow::approve(status, &actor),
            AssetWorkflow::reject(status, &actor, &reason),
            AssetWorkflow::resubmit(status, &actor, actor.id),
        ];

        for action in outcomes.into_iter().flatten() {
            prop_assert!(AssetWorkflow::is_valid_transition(status, action.new_status()));
        }
    }

    /// Approved is terminal.
    #[test]
    fn prop_approved_is_terminal(to in arb_status()) {
        prop_assert!(!AssetWorkflow::is_valid_transition(AssetStatus::Approved, to));
    }
}
