//! `SeaORM` entity definitions.

pub mod assets;
pub mod fractions;
pub mod offers;
pub mod sea_orm_active_enums;
pub mod sessions;
pub mod transactions;
pub mod users;
pub mod value_history;
