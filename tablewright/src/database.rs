//! # Database Module
//!
//! A [`DriverProvider`] over sqlx's `Any` driver, and the [`Database`] handle
//! that executes compiled DDL. The sqlx build covers MySQL and SQLite; SQL
//! Server DDL is generated but has to be run by a caller-supplied executor.

// ============================================================================
// External Crate Imports
// ============================================================================

use async_trait::async_trait;
use futures::future::BoxFuture;
use log::info;
use sqlx::{
    any::{AnyConnectOptions, AnyPoolOptions},
    AnyPool, Row,
};
use std::{str::FromStr, sync::Arc};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    dialect::{Backend, DialectGenerator},
    error::{BoxError, Error, Result},
    migration::{MigrationReport, Migrator, SchemaExecutor},
    provider::{AsyncFactory, DriverProvider, ProviderBinder, SyncFactory},
};

// ============================================================================
// Sqlx Provider
// ============================================================================

/// Driver provider backed by an `sqlx::AnyPool`.
///
/// Named after the URL scheme (`sqlite`, `mysql`), which selects the built-in
/// dialect. Options are produced synchronously, the pool asynchronously.
#[derive(Debug, Clone)]
pub struct SqlxProvider {
    url: String,
    name: String,
    max_connections: u32,
}

impl SqlxProvider {
    /// Creates a new SqlxProviderBuilder for configuring the pool.
    pub fn builder() -> SqlxProviderBuilder {
        SqlxProviderBuilder::new()
    }

    /// A provider with default pool settings.
    pub fn new(url: &str) -> Self {
        SqlxProviderBuilder::new().build(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub struct SqlxProviderBuilder {
    max_connections: u32,
}

impl Default for SqlxProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlxProviderBuilder {
    pub fn new() -> Self {
        Self { max_connections: 5 }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn build(self, url: &str) -> SqlxProvider {
        sqlx::any::install_default_drivers();
        let name = url.split_once(':').map_or(url, |(scheme, _)| scheme).to_string();
        SqlxProvider { url: url.to_string(), name, max_connections: self.max_connections }
    }
}

impl DriverProvider for SqlxProvider {
    type Connection = AnyPool;
    type Options = AnyConnectOptions;

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn options_factory(&self) -> Option<SyncFactory<AnyConnectOptions>> {
        let url = self.url.clone();
        Some(Arc::new(move || -> std::result::Result<AnyConnectOptions, BoxError> {
            Ok(AnyConnectOptions::from_str(&url)?)
        }))
    }

    fn connection_factory_async(&self) -> Option<AsyncFactory<AnyPool>> {
        let url = self.url.clone();
        let max_connections = self.max_connections;
        Some(Arc::new(move || -> BoxFuture<'static, std::result::Result<AnyPool, BoxError>> {
            let url = url.clone();
            Box::pin(async move {
                let pool = AnyPoolOptions::new().max_connections(max_connections).connect(&url).await?;
                Ok(pool)
            })
        }))
    }
}

// ============================================================================
// Database Struct
// ============================================================================

/// A bound connection pool together with the dialect its DDL is compiled in.
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) pool: AnyPool,
    pub(crate) provider: String,
    pub(crate) backend: Option<Backend>,
    pub(crate) generator: Arc<dyn DialectGenerator>,
}

impl Database {
    /// Connects through a fresh [`SqlxProvider`] for `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::bind(&ProviderBinder::bind(SqlxProvider::new(url))).await
    }

    /// Resolves the pool and the DDL generator from a bound provider.
    pub async fn bind<P>(binder: &ProviderBinder<P>) -> Result<Self>
    where
        P: DriverProvider<Connection = AnyPool>,
    {
        let pool = binder.connection().await?;
        let generator = binder.ddl_generator().await?;
        let provider = binder.provider_name().to_string();
        Ok(Self { pool, backend: Backend::from_provider_name(&provider), provider, generator })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn generator(&self) -> &Arc<dyn DialectGenerator> {
        &self.generator
    }

    /// Returns a new Migrator compiling with this database's dialect.
    pub fn migrator(&self) -> Migrator<'_> {
        Migrator::new(self, Arc::clone(&self.generator))
    }

    pub fn provider_name(&self) -> &str {
        &self.provider
    }

    /// Whether introspection runs against SQLite rather than MySQL.
    ///
    /// sqlx's `Any` driver reaches no other backend, so any other provider
    /// cannot be introspected through this handle.
    fn is_sqlite(&self) -> Result<bool> {
        match self.backend {
            Some(Backend::Sqlite) => Ok(true),
            Some(Backend::MySql) => Ok(false),
            _ => Err(Error::ProviderUnrecognized { provider: self.provider.clone() }),
        }
    }

    /// Checks if a table exists in the database.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = if self.is_sqlite()? {
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?"
        } else {
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ? AND table_schema = DATABASE()"
        };

        let row = sqlx::query(query).bind(table_name).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count > 0)
    }

    /// Returns the current columns of a table, in table order.
    pub async fn table_columns(&self, table_name: &str) -> Result<Vec<String>> {
        let columns: Vec<String> = if self.is_sqlite()? {
            let query = format!("PRAGMA table_info(\"{}\")", table_name.replace('"', "\"\""));
            let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
            rows.iter().map(|row| row.try_get("name")).collect::<std::result::Result<_, _>>()?
        } else {
            let query = "SELECT column_name FROM information_schema.columns \
                         WHERE table_name = ? AND table_schema = DATABASE() ORDER BY ordinal_position";
            let rows = sqlx::query(query).bind(table_name).fetch_all(&self.pool).await?;
            rows.iter().map(|row| row.try_get(0)).collect::<std::result::Result<_, _>>()?
        };
        Ok(columns)
    }
}

#[async_trait]
impl SchemaExecutor for Database {
    /// Runs `statements` in one transaction, stopping between statements once
    /// `cancel` fires. The executed prefix is committed either way.
    async fn execute_ddl(&self, statements: &[String], cancel: &CancellationToken) -> Result<MigrationReport> {
        let mut tx = self.pool.begin().await?;
        let mut executed = 0;

        for statement in statements {
            if cancel.is_cancelled() {
                break;
            }
            sqlx::query(statement.as_str()).execute(&mut *tx).await?;
            executed += 1;
        }

        tx.commit().await?;

        let report = MigrationReport::new(executed, statements.len() - executed);
        info!("[{}] executed {} of {} DDL statements", self.generator.name(), executed, statements.len());
        Ok(report)
    }
}
