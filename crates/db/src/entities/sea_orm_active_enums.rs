//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "asset_status")]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[sea_orm(string_value = "issue")]
    Issue,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "trade")]
    Trade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "value_source")]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    #[sea_orm(string_value = "initial")]
    Initial,
    #[sea_orm(string_value = "manual_adjust")]
    ManualAdjust,
    #[sea_orm(string_value = "trade")]
    Trade,
}

impl From<AssetStatus> for shareslice_core::asset::AssetStatus {
    fn from(status: AssetStatus) -> Self {
        match status {
            AssetStatus::Pending => Self::Pending,
            AssetStatus::Approved => Self::Approved,
            AssetStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<shareslice_core::asset::AssetStatus> for AssetStatus {
    fn from(status: shareslice_core::asset::AssetStatus) -> Self {
        use shareslice_core::asset::AssetStatus as Core;
        match status {
            Core::Pending => Self::Pending,
            Core::Approved => Self::Approved,
            Core::Rejected => Self::Rejected,
        }
    }
}
