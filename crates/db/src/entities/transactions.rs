//! `SeaORM` Entity for transactions table.
//!
//! Rows are immutable once written; a trigger rejects UPDATE and DELETE.

use super::sea_orm_active_enums::TransactionType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub asset_id: Uuid,
    pub source_fraction_id: Option<Uuid>,
    pub target_fraction_id: Uuid,
    pub from_owner_id: Option<Uuid>,
    pub to_owner_id: Uuid,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub unit_price: Option<Decimal>,
    pub offer_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assets::Entity",
        from = "Column::AssetId",
        to = "super::assets::Column::Id"
    )]
    Assets,
    #[sea_orm(
        belongs_to = "super::fractions::Entity",
        from = "Column::SourceFractionId",
        to = "super::fractions::Column::Id"
    )]
    SourceFraction,
    #[sea_orm(
        belongs_to = "super::fractions::Entity",
        from = "Column::TargetFractionId",
        to = "super::fractions::Column::Id"
    )]
    TargetFraction,
    #[sea_orm(
        belongs_to = "super::offers::Entity",
        from = "Column::OfferId",
        to = "super::offers::Column::Id"
    )]
    Offers,
}

impl Related<super::assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
