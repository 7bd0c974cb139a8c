use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod events;
pub mod identity;
pub mod models;
pub mod orders;
pub mod schema;
pub mod status;
pub mod store;

pub use error::{OrderingError, OrderingResult, StoreError, StoreResult};
pub use store::postgres::Database;
pub use store::{MemoryStore, OrderingStore};

pub const EVENT_CHANNEL: &str = "foodtruck.order.event";

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Applies pending migrations and returns how many ran.
pub fn run_migrations(conn: &mut PgConnection) -> anyhow::Result<usize> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow::anyhow!("cannot run migrations: {err}"))?;
    Ok(applied.len())
}
