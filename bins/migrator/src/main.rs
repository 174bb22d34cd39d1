//! Database migration runner for Tellr.
//!
//! Reads `DATABASE_URL` (or `-u <url>`). Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - List applied and pending migrations
//!   migrator fresh   - Drop every table and re-apply all migrations

use sea_orm_migration::prelude::*;
use tellr_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
