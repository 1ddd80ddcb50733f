//! Approval state machine for assets.
//!
//! Approval and rejection are manager-only. The database enforces the same
//! rule on `assets.approved_by` with a trigger; checking here gives callers
//! a typed error before any write.

use chrono::Utc;
use uuid::Uuid;

use crate::asset::error::AssetError;
use crate::asset::types::{Actor, AssetAction, AssetStatus};

/// Stateless service for asset workflow transitions.
pub struct AssetWorkflow;

impl AssetWorkflow {
    /// Approve a pending asset.
    ///
    /// # Returns
    /// * `Ok(AssetAction::Approve)` if the transition is valid
    /// * `Err(AssetError::NotManager)` if the actor is not a manager
    /// * `Err(AssetError::InvalidTransition)` if not in Pending status
    pub fn approve(current_status: AssetStatus, actor: &Actor) -> Result<AssetAction, AssetError> {
        Self::require_manager(actor)?;

        match current_status {
            AssetStatus::Pending => Ok(AssetAction::Approve {
                new_status: AssetStatus::Approved,
                approved_by: actor.id,
                approved_at: Utc::now(),
            }),
            _ => Err(AssetError::InvalidTransition {
                from: current_status,
                to: AssetStatus::Approved,
            }),
        }
    }

    /// Reject a pending asset.
    ///
    /// The reason is trimmed and must not be empty.
    pub fn reject(
        current_status: AssetStatus,
        actor: &Actor,
        reason: &str,
    ) -> Result<AssetAction, AssetError> {
        Self::require_manager(actor)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AssetError::RejectionReasonRequired);
        }

        match current_status {
            AssetStatus::Pending => Ok(AssetAction::Reject {
                new_status: AssetStatus::Rejected,
                rejected_by: actor.id,
                rejection_reason: reason.to_string(),
            }),
            _ => Err(AssetError::InvalidTransition {
                from: current_status,
                to: AssetStatus::Rejected,
            }),
        }
    }

    /// Resubmit a rejected asset for review.
    pub fn resubmit(
        current_status: AssetStatus,
        actor: &Actor,
        submitted_by: Uuid,
    ) -> Result<AssetAction, AssetError> {
        if actor.id != submitted_by {
            return Err(AssetError::NotSubmitter { user_id: actor.id });
        }

        match current_status {
            AssetStatus::Rejected => Ok(AssetAction::Resubmit {
                new_status: AssetStatus::Pending,
                resubmitted_by: actor.id,
                resubmitted_at: Utc::now(),
            }),
            _ => Err(AssetError::InvalidTransition {
                from: current_status,
                to: AssetStatus::Pending,
            }),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: AssetStatus, to: AssetStatus) -> bool {
        matches!(
            (from, to),
            (
                AssetStatus::Pending,
                AssetStatus::Approved | AssetStatus::Rejected
            ) | (AssetStatus::Rejected, AssetStatus::Pending)
        )
    }

    /// Fails unless the actor is a manager.
    pub fn require_manager(actor: &Actor) -> Result<(), AssetError> {
        if actor.is_manager {
            Ok(())
        } else {
            Err(AssetError::NotManager { user_id: actor.id })
        }
    }
}
