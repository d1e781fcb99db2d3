//! Pooled SQLite connection

use crate::core::settings;
use crate::infrastructure::seed;
use anyhow::Context;
use di::inject;
use di::injectable;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, OnceLock};

const MISSING_DATABASE_URL: &str =
    "DATABASE_URL is not set. Add it to .env for local runs or the secrets directory for deployment.";

static POOL_OVERRIDE: OnceLock<Mutex<Option<SqlitePool>>> = OnceLock::new();

fn pool_override() -> &'static Mutex<Option<SqlitePool>> {
    POOL_OVERRIDE.get_or_init(|| Mutex::new(None))
}

pub struct DatabaseConnection {
    connection: SqlitePool,
}

#[injectable]
impl DatabaseConnection {
    #[inject]
    pub fn create() -> DatabaseConnection {
        if let Some(pool) = pool_override().lock().unwrap().clone() {
            return DatabaseConnection { connection: pool };
        }

        dotenvy::dotenv().ok();
        let connection_string = settings::get_setting("DATABASE_URL").expect(MISSING_DATABASE_URL);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy(&connection_string)
            .expect("Cannot connect to database");

        DatabaseConnection { connection: pool }
    }
}

impl DatabaseConnection {
    /// Routes every DI-created `DatabaseConnection` through the given
    /// pool. Set once by the startup path; integration tests swap in
    /// their own in-memory pools.
    pub fn set_shared_pool(pool: SqlitePool) {
        *pool_override().lock().unwrap() = Some(pool);
    }

    pub fn clear_shared_pool() {
        *pool_override().lock().unwrap() = None;
    }
}

/// Fatal startup path: resolves the connection string, probes the store,
/// applies migrations and seeds the menu on first run. Any failure here
/// halts the service before it accepts traffic.
pub async fn initialize() -> anyhow::Result<SqlitePool> {
    dotenvy::dotenv().ok();
    let connection_string = settings::get_setting("DATABASE_URL").context(MISSING_DATABASE_URL)?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .context("cannot connect to database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("database connectivity probe failed")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("database migration failed")?;

    seed::seed_menu_if_empty(&pool)
        .await
        .context("menu seeding failed")?;

    DatabaseConnection::set_shared_pool(pool.clone());
    Ok(pool)
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}
