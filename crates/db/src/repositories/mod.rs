//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod asset;
pub mod fraction;
pub mod portfolio;
pub mod session;
pub mod stats;
pub mod trading;
pub mod transaction;
pub mod user;
pub mod valuation;

pub use asset::{Approval, AssetDetail, AssetRepoError, AssetRepository};
pub use fraction::{FractionError, FractionRepository, FractionWithHistory, LedgerWrite};
pub use portfolio::PortfolioRepository;
pub use session::SessionRepository;
pub use stats::{AssetCounts, PlatformStats, StatsRepository};
pub use trading::{
    CreateOfferInput, OfferFilter, TradingError, TradingRepository, TransferInput, UpdateOfferInput,
};
pub use transaction::{LedgerFilter, TransactionRepository};
pub use user::{UpdateUserInput, UserError, UserRepository};
pub use valuation::{ValuationPoint, ValuationRepoError, ValuationRepository};
