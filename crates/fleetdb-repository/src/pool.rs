//! Database connection pool management.

use fleetdb_config::DatabaseConfig;
use fleetdb_core::{FleetError, FleetResult, Interface};
use async_trait::async_trait;
use shaku::Component;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{ConnectOptions, PgConnection, Postgres};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use tracing::{info, warn};

/// Interface for database pool operations.
#[async_trait]
pub trait DatabasePoolInterface: Interface + Send + Sync {
    /// Returns a reference to the underlying PostgreSQL pool.
    fn inner(&self) -> &PgPool;

    /// Checks if the database connection is healthy.
    async fn health_check(&self) -> FleetResult<()>;

    /// Runs database migrations.
    async fn run_migrations(&self) -> FleetResult<()>;

    /// Closes the database pool.
    async fn close(&self);
}

/// Database pool wrapper.
#[derive(Component)]
#[shaku(interface = DatabasePoolInterface)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connects a new pool using the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> FleetResult<Self> {
        info!("Connecting to PostgreSQL database...");

        let pool = pool_options(config)
            .connect_with(connect_options(config)?)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                FleetError::Store(e)
            })?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Creates a pool that opens connections on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> FleetResult<Self> {
        let pool = pool_options(config).connect_lazy_with(connect_options(config)?);
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying pool.
    #[must_use]
    pub fn inner(&self) -> &PgPool {
        &self.pool
    }
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout())
        .idle_timeout(Some(config.idle_timeout()))
}

fn connect_options(config: &DatabaseConfig) -> FleetResult<PgConnectOptions> {
    let options = PgConnectOptions::from_str(&config.url)
        .map_err(|e| FleetError::Configuration(format!("Invalid database URL: {e}")))?;
    Ok(if config.log_queries {
        options
    } else {
        options.disable_statement_logging()
    })
}

#[async_trait]
impl DatabasePoolInterface for DatabasePool {
    fn inner(&self) -> &PgPool {
        &self.pool
    }

    async fn health_check(&self) -> FleetResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn run_migrations(&self) -> FleetResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| FleetError::Store(e.into()))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

/// A connection that is either the caller's (usually inside a transaction)
/// or one checked out from the pool for the duration of a DAO call.
pub enum DbConn<'a> {
    /// Caller-supplied connection or transaction.
    Borrowed(&'a mut PgConnection),
    /// Connection acquired from the pool; returned on drop.
    Pooled(PoolConnection<Postgres>),
}

impl Deref for DbConn<'_> {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Borrowed(conn) => &**conn,
            Self::Pooled(conn) => &**conn,
        }
    }
}

impl DerefMut for DbConn<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Borrowed(conn) => &mut **conn,
            Self::Pooled(conn) => &mut **conn,
        }
    }
}

/// Uses the caller's connection when given, otherwise acquires one from `pool`.
pub async fn connection<'a>(
    pool: &PgPool,
    tx: Option<&'a mut PgConnection>,
) -> FleetResult<DbConn<'a>> {
    match tx {
        Some(conn) => Ok(DbConn::Borrowed(conn)),
        None => Ok(DbConn::Pooled(pool.acquire().await?)),
    }
}
