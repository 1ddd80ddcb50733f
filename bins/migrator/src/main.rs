//! Database migration runner for ShareSlice.
//!
//! Reads `DATABASE_URL` and accepts the standard `sea-orm-migration`
//! subcommands (`up`, `down`, `status`, `fresh`, `refresh`, `reset`).

use sea_orm_migration::prelude::*;
use shareslice_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    cli::run_cli(Migrator).await;
}
