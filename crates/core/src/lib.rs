//! Core business logic for ShareSlice.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `auth` - Password hashing and credential rules
//! - `asset` - Asset submission rules and the approval state machine
//! - `ownership` - Fraction splitting, FIFO allocation, and ownership history
//! - `valuation` - Fraction value arithmetic
//! - `trading` - Offers, order books, and trade parties
//! - `portfolio` - Holding aggregation per user

pub mod asset;
pub mod auth;
pub mod ownership;
pub mod portfolio;
pub mod trading;
pub mod valuation;
