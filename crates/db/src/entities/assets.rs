//! `SeaORM` Entity for assets table.

use super::sea_orm_active_enums::AssetStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub total_fractions: i64,
    pub available_fractions: i64,
    pub min_units: i64,
    pub max_units: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub submitted_value: Decimal,
    pub status: AssetStatus,
    pub submitted_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubmittedBy",
        to = "super::users::Column::Id"
    )]
    Submitter,
    #[sea_orm(has_many = "super::fractions::Entity")]
    Fractions,
    #[sea_orm(has_many = "super::value_history::Entity")]
    ValueHistory,
    #[sea_orm(has_many = "super::offers::Entity")]
    Offers,
}

impl Related<super::fractions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fractions.def()
    }
}

impl Related<super::value_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ValueHistory.def()
    }
}

impl Related<super::offers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
