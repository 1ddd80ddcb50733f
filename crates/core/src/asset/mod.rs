//! Asset submission rules and the approval workflow.
//!
//! # Modules
//!
//! - `types` - Asset status, actors, and workflow actions
//! - `error` - Asset-specific error types
//! - `service` - Approval state machine
//! - `validation` - Submission and supply rules

pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use error::AssetError;
pub use service::AssetWorkflow;
pub use types::{Actor, AssetAction, AssetStatus, AssetSubmission};
pub use validation::{MAX_TOTAL_FRACTIONS, validate_submission, validate_supply_change};
