//! Asset domain types for the approval workflow.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Asset status in the approval workflow.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
/// - Rejected → Pending (resubmit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    /// Submitted and waiting for a manager.
    Pending,
    /// Approved; fractions exist and can be traded.
    Approved,
    /// Rejected by a manager; the submitter may resubmit.
    Rejected,
}

impl AssetStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Only approved assets carry fractions, valuations, and trades.
    #[must_use]
    pub const fn is_tradeable(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user performing a workflow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID.
    pub id: Uuid,
    /// Whether the user carries the manager flag.
    pub is_manager: bool,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(id: Uuid, is_manager: bool) -> Self {
        Self { id, is_manager }
    }
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum AssetAction {
    /// Approve a pending asset.
    Approve {
        /// The new status after approval.
        new_status: AssetStatus,
        /// The manager who approved.
        approved_by: Uuid,
        /// When the asset was approved.
        approved_at: DateTime<Utc>,
    },
    /// Reject a pending asset.
    Reject {
        /// The new status after rejection.
        new_status: AssetStatus,
        /// The manager who rejected.
        rejected_by: Uuid,
        /// Why the asset was rejected.
        rejection_reason: String,
    },
    /// Send a rejected asset back for review.
    Resubmit {
        /// The new status after resubmission.
        new_status: AssetStatus,
        /// The submitter.
        resubmitted_by: Uuid,
        /// When it was resubmitted.
        resubmitted_at: DateTime<Utc>,
    },
}

impl AssetAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub const fn new_status(&self) -> AssetStatus {
        match self {
            Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Resubmit { new_status, .. } => *new_status,
        }
    }
}

/// A new asset as submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSubmission {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Maximum number of fractions the asset may ever be split into.
    pub total_fractions: i64,
    /// Smallest quantity a single transfer may move.
    pub min_units: i64,
    /// Largest quantity a single transfer may move.
    pub max_units: i64,
    /// Proposed valuation, recorded as the initial value on approval.
    pub submitted_value: Decimal,
}
