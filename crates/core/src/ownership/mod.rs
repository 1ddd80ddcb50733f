//! Fraction splitting and ownership history.
//!
//! A fraction is a quantity of one asset held by a single owner. Transfers
//! never change a fraction's owner: they carve a new child fraction out of
//! the source, link it through `parent_fraction_id`, and append one event
//! to each side's history. Histories only ever grow.
//!
//! # Modules
//!
//! - `error` - Ownership error types
//! - `history` - Ownership events and the append-only history
//! - `transfer` - Transfer planning and FIFO allocation
//! - `snapshot` - Point-in-time ownership reconstruction
//! - `lineage` - Parent chains of split fractions

pub mod error;
pub mod history;
pub mod lineage;
pub mod snapshot;
pub mod transfer;

#[cfg(test)]
mod allocation_props;

pub use error::OwnershipError;
pub use history::{OwnershipEvent, OwnershipHistory};
pub use lineage::lineage;
pub use snapshot::{FractionRecord, OwnerHolding, snapshot};
pub use transfer::{
    Allocation, FractionState, HoldingSlot, TransferPlan, UnitLimits, allocate_fifo,
    plan_transfer,
};
