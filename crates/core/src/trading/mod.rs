//! Offers, order books, and trade parties.
//!
//! An offer is a standing intent to buy or sell units of an asset at a
//! fixed price per unit. Accepting an offer turns it into a trade between
//! the offer owner and the accepting counterparty.

pub mod book;
pub mod error;
pub mod offer;

pub use book::{BookEntry, OrderBook};
pub use error::TradeError;
pub use offer::{
    OfferSide, Parties, TradeSummary, resolve_parties, trade_total, validate_offer, validate_price,
};
