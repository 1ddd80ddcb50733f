//! Ownership events and the append-only history stored on each fraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shareslice_shared::types::{FractionId, TransactionId, UserId};

use crate::ownership::error::OwnershipError;

/// One entry in a fraction's `owners_history` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OwnershipEvent {
    /// Fraction created directly from the asset's supply.
    Issued {
        /// Receiving owner.
        owner_id: UserId,
        /// Units issued.
        quantity: i64,
        /// Issuing transaction.
        transaction_id: TransactionId,
        /// When it happened.
        at: DateTime<Utc>,
    },
    /// Fraction created by splitting a parent.
    Received {
        /// Previous owner of the units.
        from_owner_id: UserId,
        /// Fraction the units came from.
        parent_fraction_id: FractionId,
        /// Units received.
        quantity: i64,
        /// Transfer or trade transaction.
        transaction_id: TransactionId,
        /// When it happened.
        at: DateTime<Utc>,
    },
    /// Units split off into a child fraction.
    TransferredOut {
        /// New owner of the units.
        to_owner_id: UserId,
        /// Fraction the units went to.
        child_fraction_id: FractionId,
        /// Units moved.
        quantity: i64,
        /// Transfer or trade transaction.
        transaction_id: TransactionId,
        /// When it happened.
        at: DateTime<Utc>,
    },
}

impl OwnershipEvent {
    /// When the event happened.
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Issued { at, .. } | Self::Received { at, .. } | Self::TransferredOut { at, .. } => {
                *at
            }
        }
    }

    /// Transaction that produced the event.
    #[must_use]
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Self::Issued { transaction_id, .. }
            | Self::Received { transaction_id, .. }
            | Self::TransferredOut { transaction_id, .. } => *transaction_id,
        }
    }

    /// Signed change to the fraction's quantity.
    #[must_use]
    pub fn quantity_delta(&self) -> i64 {
        match self {
            Self::Issued { quantity, .. } | Self::Received { quantity, .. } => *quantity,
            Self::TransferredOut { quantity, .. } => -*quantity,
        }
    }
}

/// Ordered, append-only list of ownership events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnershipHistory(Vec<OwnershipEvent>);

impl OwnershipHistory {
    /// Starts a history with its creation event.
    #[must_use]
    pub fn starting_with(event: OwnershipEvent) -> Self {
        Self(vec![event])
    }

    /// Decodes the JSONB column.
    pub fn from_json(value: &Value) -> Result<Self, OwnershipError> {
        serde_json::from_value(value.clone())
            .map_err(|e| OwnershipError::MalformedHistory(e.to_string()))
    }

    /// Encodes for the JSONB column.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    /// Appends an event.
    pub fn push(&mut self, event: OwnershipEvent) {
        self.0.push(event);
    }

    /// All events in order.
    #[must_use]
    pub fn events(&self) -> &[OwnershipEvent] {
        &self.0
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no events have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `self` is an unchanged prefix of `newer`.
    ///
    /// This is the rule the database trigger enforces on every update.
    #[must_use]
    pub fn is_prefix_of(&self, newer: &Self) -> bool {
        newer.0.starts_with(&self.0)
    }

    /// Quantity held at `at`, or `None` if the fraction did not exist yet.
    #[must_use]
    pub fn quantity_at(&self, at: DateTime<Utc>) -> Option<i64> {
        let mut seen = false;
        let mut quantity = 0;
        for event in self.0.iter().filter(|e| e.at() <= at) {
            seen = true;
            quantity += event.quantity_delta();
        }
        seen.then_some(quantity)
    }

    /// Quantity after every recorded event.
    #[must_use]
    pub fn current_quantity(&self) -> i64 {
        self.0.iter().map(OwnershipEvent::quantity_delta).sum()
    }
}
