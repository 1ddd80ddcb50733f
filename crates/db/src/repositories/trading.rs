//! Transfers, offers, and offer acceptance.
//!
//! A transfer or trade never rewrites ownership on an existing fraction. It
//! splits units into a new child fraction, appends to the source's history,
//! and writes an immutable transaction. Source fractions are locked with
//! `SELECT ... FOR UPDATE` for the duration of the database transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use shareslice_core::{
    asset::{AssetError, AssetStatus as CoreAssetStatus},
    ownership::{
        FractionState, HoldingSlot, OwnershipError, UnitLimits, allocate_fifo, plan_transfer,
    },
    trading::{
        BookEntry, OfferSide, OrderBook, TradeError, TradeSummary, resolve_parties, trade_total,
        validate_offer, validate_price,
    },
    valuation::validate_valuation,
};
use shareslice_shared::{
    AppError,
    types::{AssetId, OfferId, PageRequest, UserId},
};
use uuid::Uuid;

use crate::entities::{assets, fractions, offers, sea_orm_active_enums::TransactionType, users};
use crate::repositories::fraction::{LedgerWrite, SplitKind, write_split};
use crate::repositories::valuation::record_trade_valuation;

/// Error types for transfers and trades.
#[derive(Debug, thiserror::Error)]
pub enum TradingError {
    /// Fraction not found.
    #[error("Fraction not found: {0}")]
    FractionNotFound(Uuid),

    /// Asset not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(Uuid),

    /// Offer not found.
    #[error("Offer not found: {0}")]
    OfferNotFound(Uuid),

    /// Recipient does not exist or is deleted.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Caller does not own the source fraction.
    #[error("User {user_id} does not own fraction {fraction_id}")]
    NotFractionOwner {
        /// The caller.
        user_id: Uuid,
        /// The fraction.
        fraction_id: Uuid,
    },

    /// Asset is not open for trading.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Offer rule violated.
    #[error(transparent)]
    Trade(#[from] TradeError),

    /// Unit movement rejected.
    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TradingError> for AppError {
    fn from(err: TradingError) -> Self {
        match err {
            TradingError::FractionNotFound(id) => Self::not_found("fraction", id),
            TradingError::AssetNotFound(id) => Self::not_found("asset", id),
            TradingError::OfferNotFound(id) => Self::not_found("offer", id),
            TradingError::UserNotFound(id) => Self::not_found("user", id),
            TradingError::NotFractionOwner { .. } => Self::Forbidden(err.to_string()),
            TradingError::Asset(e) => Self::from_status(e.status_code(), e.to_string()),
            TradingError::Trade(e) => Self::from_status(e.status_code(), e.to_string()),
            TradingError::Ownership(e) => Self::from_status(e.status_code(), e.to_string()),
            TradingError::Database(e) => crate::db_error_to_app(e),
        }
    }
}

/// Input for a direct transfer.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Source fraction, owned by the caller.
    pub fraction_id: Uuid,
    /// Recipient.
    pub to_user_id: Uuid,
    /// Units to move.
    pub quantity: i64,
    /// Optional agreed price per unit, recorded on the transaction.
    pub unit_price: Option<Decimal>,
}

/// New terms for an existing offer. Unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct UpdateOfferInput {
    /// New quantity.
    pub quantity: Option<i64>,
    /// New price per unit.
    pub price_per_unit: Option<Decimal>,
}

/// Input for a new offer.
#[derive(Debug, Clone)]
pub struct CreateOfferInput {
    /// Asset to trade.
    pub asset_id: Uuid,
    /// Buy or sell.
    pub side: OfferSide,
    /// Units wanted or offered.
    pub quantity: i64,
    /// Price per unit.
    pub price_per_unit: Decimal,
}

/// Filter options for listing offers.
#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    /// Filter by asset.
    pub asset_id: Option<Uuid>,
    /// Filter by side.
    pub side: Option<OfferSide>,
    /// Minimum price per unit (inclusive).
    pub min_price: Option<Decimal>,
    /// Maximum price per unit (inclusive).
    pub max_price: Option<Decimal>,
    /// Filter by owner.
    pub user_id: Option<Uuid>,
    /// Filter by active flag.
    pub active: Option<bool>,
}

impl From<&offers::Model> for BookEntry {
    fn from(offer: &offers::Model) -> Self {
        Self {
            offer_id: OfferId::from(offer.id),
            user_id: UserId::from(offer.user_id),
            side: OfferSide::from_is_buyer(offer.is_buyer),
            quantity: offer.quantity,
            price_per_unit: offer.price_per_unit,
            created_at: offer.created_at.with_timezone(&Utc),
        }
    }
}

const fn limits_of(asset: &assets::Model) -> UnitLimits {
    UnitLimits {
        min_units: asset.min_units,
        max_units: asset.max_units,
    }
}

fn require_tradeable(asset: &assets::Model) -> Result<(), AssetError> {
    let status: CoreAssetStatus = asset.status.into();
    if status.is_tradeable() {
        Ok(())
    } else {
        Err(AssetError::NotApproved { status })
    }
}

/// Trading repository.
#[derive(Debug, Clone)]
pub struct TradingRepository {
    db: DatabaseConnection,
}

impl TradingRepository {
    /// Creates a new trading repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Moves units from a fraction the caller owns to another user.
    ///
    /// # Errors
    ///
    /// Returns `NotFractionOwner` if the caller does not own the fraction,
    /// `Asset` if the asset is not approved, and `Ownership` if the plan is
    /// rejected (quantity, limits, inactive source, self transfer).
    pub async fn transfer(
        &self,
        actor_id: Uuid,
        input: TransferInput,
    ) -> Result<LedgerWrite, TradingError> {
        if let Some(price) = input.unit_price {
            validate_price(price)?;
        }

        let txn = self.db.begin().await?;

        let source = fractions::Entity::find_by_id(input.fraction_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TradingError::FractionNotFound(input.fraction_id))?;

        if source.owner_id != actor_id {
            return Err(TradingError::NotFractionOwner {
                user_id: actor_id,
                fraction_id: source.id,
            });
        }

        let asset = assets::Entity::find_by_id(source.asset_id)
            .one(&txn)
            .await?
            .ok_or(TradingError::AssetNotFound(source.asset_id))?;
        require_tradeable(&asset)?;
        ensure_user(&txn, input.to_user_id).await?;

        let plan = plan_transfer(
            &FractionState::from(&source),
            UserId::from(input.to_user_id),
            input.quantity,
            &limits_of(&asset),
        )?;

        let kind = SplitKind {
            transaction_type: TransactionType::Transfer,
            unit_price: input.unit_price,
            offer_id: None,
        };
        let write: LedgerWrite =
            write_split::<_, TradingError>(&txn, source, &plan, kind, Utc::now()).await?;

        txn.commit().await?;

        tracing::info!(
            asset_id = %asset.id,
            user_id = %actor_id,
            to_user_id = %input.to_user_id,
            fraction_id = %write.fraction.id,
            quantity = plan.quantity,
            "Fraction transferred"
        );
        Ok(write)
    }

    /// Places an offer. Sell offers must be covered by the seller's current
    /// holdings.
    ///
    /// # Errors
    ///
    /// Returns `Trade` for bad price, quantity or limits, `Asset` if the asset
    /// is not approved, and `Ownership` if a seller lacks the units.
    pub async fn create_offer(
        &self,
        user_id: Uuid,
        input: CreateOfferInput,
    ) -> Result<offers::Model, TradingError> {
        let asset = assets::Entity::find_by_id(input.asset_id)
            .one(&self.db)
            .await?
            .ok_or(TradingError::AssetNotFound(input.asset_id))?;
        require_tradeable(&asset)?;
        validate_offer(input.quantity, input.price_per_unit, &limits_of(&asset))?;

        if input.side == OfferSide::Sell {
            ensure_covered(&self.db, user_id, asset.id, input.quantity).await?;
        }

        let now = Utc::now().into();
        let offer = offers::ActiveModel {
            id: Set(Uuid::new_v4()),
            asset_id: Set(asset.id),
            user_id: Set(user_id),
            is_buyer: Set(input.side.is_buyer()),
            quantity: Set(input.quantity),
            price_per_unit: Set(input.price_per_unit),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            asset_id = %asset.id,
            user_id = %user_id,
            offer_id = %offer.id,
            side = input.side.as_str(),
            "Offer created"
        );
        Ok(offer)
    }

    /// Finds an offer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_offer(&self, id: Uuid) -> Result<Option<offers::Model>, DbErr> {
        offers::Entity::find_by_id(id).one(&self.db).await
    }

    /// Changes the quantity or price of an active offer. Only its owner may
    /// update it, and the new terms are checked like a new offer.
    ///
    /// # Errors
    ///
    /// Returns `Trade` if the caller is not the owner, the offer is inactive,
    /// or the new terms are invalid, and `Ownership` if a sell offer would
    /// exceed the seller's holdings.
    pub async fn update_offer(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
        input: UpdateOfferInput,
    ) -> Result<offers::Model, TradingError> {
        let txn = self.db.begin().await?;
        let offer = lock_offer(&txn, offer_id).await?;
        require_open_offer_owner(&offer, user_id)?;

        let asset = assets::Entity::find_by_id(offer.asset_id)
            .one(&txn)
            .await?
            .ok_or(TradingError::AssetNotFound(offer.asset_id))?;
        require_tradeable(&asset)?;

        let quantity = input.quantity.unwrap_or(offer.quantity);
        let price = input.price_per_unit.unwrap_or(offer.price_per_unit);
        validate_offer(quantity, price, &limits_of(&asset))?;

        if !offer.is_buyer {
            ensure_covered(&txn, user_id, asset.id, quantity).await?;
        }

        let mut updated: offers::ActiveModel = offer.into();
        updated.quantity = Set(quantity);
        updated.price_per_unit = Set(price);
        updated.updated_at = Set(Utc::now().into());
        let offer = updated.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            offer_id = %offer_id,
            user_id = %user_id,
            quantity,
            price_per_unit = %price,
            "Offer updated"
        );
        Ok(offer)
    }

    /// Deactivates an offer. Only its owner may cancel it.
    ///
    /// # Errors
    ///
    /// Returns `Trade` if the caller is not the owner or the offer is already
    /// inactive.
    pub async fn cancel_offer(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
    ) -> Result<offers::Model, TradingError> {
        let txn = self.db.begin().await?;
        let offer = lock_offer(&txn, offer_id).await?;
        require_open_offer_owner(&offer, user_id)?;

        let mut updated: offers::ActiveModel = offer.into();
        updated.is_active = Set(false);
        updated.updated_at = Set(Utc::now().into());
        let offer = updated.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(offer_id = %offer_id, user_id = %user_id, "Offer cancelled");
        Ok(offer)
    }

    /// Lists offers matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_offers(
        &self,
        filter: &OfferFilter,
        page: PageRequest,
    ) -> Result<(Vec<offers::Model>, u64), DbErr> {
        let mut query = offers::Entity::find();

        if let Some(asset_id) = filter.asset_id {
            query = query.filter(offers::Column::AssetId.eq(asset_id));
        }
        if let Some(side) = filter.side {
            query = query.filter(offers::Column::IsBuyer.eq(side.is_buyer()));
        }
        if let Some(min) = filter.min_price {
            query = query.filter(offers::Column::PricePerUnit.gte(min));
        }
        if let Some(max) = filter.max_price {
            query = query.filter(offers::Column::PricePerUnit.lte(max));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(offers::Column::UserId.eq(user_id));
        }
        if let Some(active) = filter.active {
            query = query.filter(offers::Column::IsActive.eq(active));
        }

        let total = query.clone().count(&self.db).await?;
        let offers = query
            .order_by_desc(offers::Column::CreatedAt)
            .order_by_asc(offers::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((offers, total))
    }

    /// Active offers of an asset arranged as bids and asks.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn order_book(&self, asset_id: Uuid) -> Result<OrderBook, DbErr> {
        let active = offers::Entity::find()
            .filter(offers::Column::AssetId.eq(asset_id))
            .filter(offers::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;

        Ok(OrderBook::from_offers(active.iter().map(BookEntry::from)))
    }

    /// Executes a trade against an offer.
    ///
    /// The seller's active fractions are consumed oldest first. Each consumed
    /// fraction yields one child fraction for the buyer and one `trade`
    /// transaction. The offer is deactivated and the trade price is recorded
    /// as a `trade` valuation of the whole available supply.
    ///
    /// # Errors
    ///
    /// Returns `Trade` for inactive offers or self trades, and `Ownership`
    /// if the seller lacks the units.
    pub async fn accept_offer(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
    ) -> Result<TradeSummary, TradingError> {
        let txn = self.db.begin().await?;
        let offer = lock_offer(&txn, offer_id).await?;

        if !offer.is_active {
            return Err(TradeError::OfferInactive {
                offer_id: OfferId::from(offer_id),
            }
            .into());
        }
        ensure_user(&txn, offer.user_id).await?;

        let side = OfferSide::from_is_buyer(offer.is_buyer);
        let parties = resolve_parties(UserId::from(offer.user_id), side, UserId::from(user_id))?;

        let asset = assets::Entity::find_by_id(offer.asset_id)
            .one(&txn)
            .await?
            .ok_or(TradingError::AssetNotFound(offer.asset_id))?;
        require_tradeable(&asset)?;

        let holdings = seller_fractions(&txn, parties.seller.into_inner(), asset.id, true).await?;
        let slots: Vec<HoldingSlot> = holdings.iter().map(HoldingSlot::from).collect();
        let allocations = allocate_fifo(&slots, offer.quantity)?;

        let now = Utc::now();
        let kind = SplitKind {
            transaction_type: TransactionType::Trade,
            unit_price: Some(offer.price_per_unit),
            offer_id: Some(offer.id),
        };

        for allocation in &allocations {
            let Some(source) = holdings
                .iter()
                .find(|f| f.id == allocation.fraction_id.into_inner())
                .cloned()
            else {
                return Err(TradingError::FractionNotFound(
                    allocation.fraction_id.into_inner(),
                ));
            };

            let plan = plan_transfer(
                &FractionState::from(&source),
                parties.buyer,
                allocation.quantity,
                &UnitLimits::UNBOUNDED,
            )?;
            write_split::<_, TradingError>(&txn, source, &plan, kind, now).await?;
        }

        let price = offer.price_per_unit;
        let units = offer.quantity;

        let mut closed: offers::ActiveModel = offer.into();
        closed.is_active = Set(false);
        closed.updated_at = Set(now.into());
        closed.update(&txn).await?;

        if asset.available_fractions > 0 {
            let implied = validate_valuation(price * Decimal::from(asset.available_fractions))
                .map_err(TradeError::from)?;
            record_trade_valuation(&txn, asset.id, implied, now).await?;
        }

        txn.commit().await?;

        tracing::info!(
            asset_id = %asset.id,
            offer_id = %offer_id,
            buyer_id = %parties.buyer,
            seller_id = %parties.seller,
            units,
            "Offer accepted"
        );

        Ok(TradeSummary {
            offer_id: OfferId::from(offer_id),
            offer_side: side,
            asset_id: AssetId::from(asset.id),
            buyer_id: parties.buyer,
            seller_id: parties.seller,
            units_traded: units,
            price_per_unit: price,
            total_value: trade_total(units, price),
            transactions_count: allocations.len(),
        })
    }
}

async fn lock_offer(txn: &DatabaseTransaction, id: Uuid) -> Result<offers::Model, TradingError> {
    offers::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(TradingError::OfferNotFound(id))
}

/// Fails unless `user_id` owns the offer and it is still active.
fn require_open_offer_owner(offer: &offers::Model, user_id: Uuid) -> Result<(), TradeError> {
    if offer.user_id != user_id {
        return Err(TradeError::NotOfferOwner {
            user_id: UserId::from(user_id),
            offer_id: OfferId::from(offer.id),
        });
    }
    if !offer.is_active {
        return Err(TradeError::OfferInactive {
            offer_id: OfferId::from(offer.id),
        });
    }
    Ok(())
}

/// Fails unless the seller currently holds at least `quantity` units.
async fn ensure_covered<C: ConnectionTrait>(
    conn: &C,
    seller_id: Uuid,
    asset_id: Uuid,
    quantity: i64,
) -> Result<(), TradingError> {
    let held: i64 = seller_fractions(conn, seller_id, asset_id, false)
        .await?
        .iter()
        .map(|f| f.quantity)
        .sum();
    if held < quantity {
        return Err(OwnershipError::InsufficientUnits {
            available: held,
            requested: quantity,
        }
        .into());
    }
    Ok(())
}

async fn ensure_user(txn: &DatabaseTransaction, id: Uuid) -> Result<(), TradingError> {
    users::Entity::find_by_id(id)
        .filter(users::Column::IsDeleted.eq(false))
        .one(txn)
        .await?
        .map(|_| ())
        .ok_or(TradingError::UserNotFound(id))
}

/// A seller's active fractions of an asset, oldest first.
async fn seller_fractions<C: ConnectionTrait>(
    conn: &C,
    seller_id: Uuid,
    asset_id: Uuid,
    lock: bool,
) -> Result<Vec<fractions::Model>, DbErr> {
    let mut query = fractions::Entity::find()
        .filter(fractions::Column::OwnerId.eq(seller_id))
        .filter(fractions::Column::AssetId.eq(asset_id))
        .filter(fractions::Column::IsActive.eq(true))
        .order_by_asc(fractions::Column::CreatedAt)
        .order_by_asc(fractions::Column::Id);
    if lock {
        query = query.lock_exclusive();
    }
    query.all(conn).await
}
