//! Connection Acquisition
//!
//! [`Database`] hands out one connection per logical operation and guarantees
//! it is given back. Two policies exist:
//!
//! - **Pooled**: a `bb8` pool is created on first use (or by [`Database::init`])
//!   and lives until [`Database::shutdown`]. Checkouts beyond `max_size` wait
//!   for a connection to come back. A connect failure while a checkout waits
//!   ends that checkout with the driver's reason instead of a timeout.
//! - **Per-request**: every acquisition resolves the configuration, opens a
//!   dedicated connection under the connect timeout, and closes it on release.
//!
//! Connect failures surface as [`DatabaseError::Connection`]; nothing is
//! retried here.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bb8::{ErrorSink, ManageConnection, Pool, PooledConnection, RunError};
use futures::future::BoxFuture;
use tokio::sync::{RwLock, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::database::{
    connection::{self, ConnectionConfig},
    connector::{Connector, PgConnector},
    error::DatabaseError,
    schema,
};

/// Upper bound for any connect attempt.
pub const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseMode {
    Pooled,
    PerRequest,
}

impl DatabaseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseMode::Pooled => "pooled",
            DatabaseMode::PerRequest => "per_request",
        }
    }
}

impl FromStr for DatabaseMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pooled" | "pool" => Ok(DatabaseMode::Pooled),
            "per_request" | "per-request" | "serverless" => Ok(DatabaseMode::PerRequest),
            other => Err(format!("unknown database mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Value of the primary connection-string setting, if any.
    pub url: Option<String>,
    /// Fallback settings that were present, in declared order.
    pub fallbacks: Vec<(&'static str, String)>,
    pub mode: DatabaseMode,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(url: Option<String>, mode: DatabaseMode) -> Self {
        let command_timeout = match mode {
            DatabaseMode::Pooled => Duration::from_secs(60),
            DatabaseMode::PerRequest => Duration::from_secs(30),
        };
        DatabaseSettings {
            url,
            fallbacks: Vec::new(),
            mode,
            min_connections: 1,
            max_connections: 10,
            connect_timeout: MAX_CONNECT_TIMEOUT,
            command_timeout,
        }
    }

    /// Resolves the primary setting, or the first usable fallback.
    pub fn resolve(&self) -> Result<ConnectionConfig, DatabaseError> {
        connection::resolve(self.url.as_deref(), |name| {
            self.fallbacks
                .iter()
                .find(|(fallback, _)| *fallback == name)
                .map(|(_, value)| value.clone())
        })
    }

    fn connect_timeout(&self) -> Duration {
        self.connect_timeout.min(MAX_CONNECT_TIMEOUT)
    }
}

/// Opens one connection under the connect timeout. A timed-out attempt is
/// dropped, which releases whatever it had established.
async fn open<C: Connector>(
    connector: &C,
    config: &ConnectionConfig,
    connect_timeout: Duration,
    command_timeout: Duration,
) -> Result<C::Connection, DatabaseError> {
    debug!(
        host = %config.host,
        port = config.port,
        pooler = config.is_pooler(),
        "opening database connection"
    );
    match timeout(connect_timeout, connector.connect(config, command_timeout)).await {
        Ok(Ok(connection)) => Ok(connection),
        Ok(Err(e)) => {
            let error = DatabaseError::connection(config, e.to_string());
            error!(host = %config.host, port = config.port, user = %config.user, "{}", error);
            Err(error)
        }
        Err(_) => {
            let error = DatabaseError::connection(
                config,
                format!("timed out after {}s", connect_timeout.as_secs()),
            );
            error!(host = %config.host, port = config.port, "{}", error);
            Err(error)
        }
    }
}

/// Adapts a [`Connector`] to `bb8`.
pub struct PoolManager<C: Connector> {
    connector: Arc<C>,
    config: ConnectionConfig,
    connect_timeout: Duration,
    command_timeout: Duration,
}

#[async_trait]
impl<C: Connector> ManageConnection for PoolManager<C> {
    type Connection = C::Connection;
    type Error = DatabaseError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        open(
            self.connector.as_ref(),
            &self.config,
            self.connect_timeout,
            self.command_timeout,
        )
        .await
    }

    async fn is_valid(&self, connection: &mut Self::Connection) -> Result<(), Self::Error> {
        self.connector
            .ping(connection)
            .await
            .map_err(|e| DatabaseError::connection(&self.config, e.to_string()))
    }

    fn has_broken(&self, _connection: &mut Self::Connection) -> bool {
        false
    }
}

/// Receives the connect errors `bb8` raises on its background tasks, which
/// would otherwise never reach the checkout waiting on them.
#[derive(Debug, Clone)]
struct ConnectFailures(Arc<watch::Sender<String>>);

impl ErrorSink<DatabaseError> for ConnectFailures {
    fn sink(&self, error: DatabaseError) {
        let reason = match error {
            DatabaseError::Connection { reason, .. } => reason,
            other => other.to_string(),
        };
        self.0.send_replace(reason);
    }

    fn boxed_clone(&self) -> Box<dyn ErrorSink<DatabaseError>> {
        Box::new(self.clone())
    }
}

type SharedPool<C> = Pool<PoolManager<C>>;

struct PoolSlot<C: Connector> {
    pool: SharedPool<C>,
    config: ConnectionConfig,
    failures: ConnectFailures,
}

impl<C: Connector> Clone for PoolSlot<C> {
    fn clone(&self) -> Self {
        PoolSlot {
            pool: self.pool.clone(),
            config: self.config.clone(),
            failures: self.failures.clone(),
        }
    }
}

pub struct Database<C: Connector = PgConnector> {
    settings: DatabaseSettings,
    connector: Arc<C>,
    pool: RwLock<Option<PoolSlot<C>>>,
}

impl<C: Connector> Database<C> {
    pub fn new(settings: DatabaseSettings, connector: C) -> Self {
        Database {
            settings,
            connector: Arc::new(connector),
            pool: RwLock::new(None),
        }
    }

    pub fn mode(&self) -> DatabaseMode {
        self.settings.mode
    }

    #[cfg(test)]
    pub fn connector(&self) -> &C {
        self.connector.as_ref()
    }

    /// Host and port the next acquisition would target, for diagnostics.
    pub fn target(&self) -> Option<(String, u16)> {
        self.settings
            .resolve()
            .ok()
            .map(|config| (config.host, config.port))
    }

    /// Creates the pool if it does not exist yet. A no-op in per-request mode.
    pub async fn init(&self) -> Result<(), DatabaseError> {
        if self.settings.mode == DatabaseMode::Pooled {
            self.pool().await?;
        }
        Ok(())
    }

    /// Closes the pool. A later acquisition starts a fresh pool.
    pub async fn shutdown(&self) {
        if let Some(slot) = self.pool.write().await.take() {
            let state = slot.pool.state();
            drop(slot.pool);
            info!(
                host = %slot.config.host,
                port = slot.config.port,
                connections = state.connections,
                "database pool closed"
            );
        }
    }

    pub async fn is_pool_open(&self) -> bool {
        self.pool.read().await.is_some()
    }

    async fn pool(&self) -> Result<PoolSlot<C>, DatabaseError> {
        if let Some(existing) = self.pool.read().await.as_ref() {
            return Ok(existing.clone());
        }

        let mut slot = self.pool.write().await;
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }

        let config = self.settings.resolve()?;
        let connect_timeout = self.settings.connect_timeout();
        let manager = PoolManager {
            connector: self.connector.clone(),
            config: config.clone(),
            connect_timeout,
            command_timeout: self.settings.command_timeout,
        };
        let max_size = self.settings.max_connections.max(1);
        let failures = ConnectFailures(Arc::new(watch::channel(String::new()).0));
        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(self.settings.min_connections.min(max_size)))
            .connection_timeout(connect_timeout)
            .retry_connection(false)
            .error_sink(Box::new(failures.clone()))
            .build(manager)
            .await?;
        info!(
            host = %config.host,
            port = config.port,
            min = self.settings.min_connections,
            max = max_size,
            "database pool created"
        );

        let created = PoolSlot {
            pool,
            config,
            failures,
        };
        *slot = Some(created.clone());
        Ok(created)
    }

    /// Acquires one connection for one logical operation.
    pub async fn acquire(&self) -> Result<Lease<C>, DatabaseError> {
        match self.settings.mode {
            DatabaseMode::Pooled => {
                let PoolSlot {
                    pool,
                    config,
                    failures,
                } = self.pool().await?;
                // Only failures raised after this point concern this checkout.
                let mut failed = failures.0.subscribe();
                let checkout = tokio::select! {
                    checkout = pool.get_owned() => checkout,
                    Ok(()) = failed.changed() => {
                        let reason = failed.borrow_and_update().clone();
                        return Err(DatabaseError::connection(&config, reason));
                    }
                };
                let connection = checkout.map_err(|e| match e {
                    RunError::User(error) => error,
                    RunError::TimedOut => {
                        DatabaseError::connection(&config, "timed out waiting for a pooled connection")
                    }
                })?;
                Ok(Lease {
                    inner: LeaseInner::Pooled(connection),
                })
            }
            DatabaseMode::PerRequest => {
                let config = self.settings.resolve()?;
                let connection = open(
                    self.connector.as_ref(),
                    &config,
                    self.settings.connect_timeout(),
                    self.settings.command_timeout,
                )
                .await?;
                Ok(Lease {
                    inner: LeaseInner::Dedicated {
                        connection: ManuallyDrop::new(connection),
                        connector: self.connector.clone(),
                        taken: false,
                    },
                })
            }
        }
    }

    /// Runs `operation` on one connection and releases it afterwards, whether
    /// the operation succeeded or not.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let feedback = db
    ///     .with_connection(move |conn| Box::pin(async move { Feedback::find_one(conn, id).await }))
    ///     .await?;
    /// ```
    pub async fn with_connection<F, T>(&self, operation: F) -> Result<T, DatabaseError>
    where
        F: for<'c> FnOnce(&'c mut C::Connection) -> BoxFuture<'c, Result<T, DatabaseError>>,
    {
        let mut lease = self.acquire().await?;
        let result = operation(&mut *lease).await;
        lease.release().await;
        result
    }

    /// Creates the tables if missing. Failures are logged and swallowed so an
    /// unreachable database does not stop the process from serving.
    pub async fn ensure_schema(&self) {
        let started = Instant::now();
        match schema::init_schema(self).await {
            Ok(()) => info!(
                mode = self.settings.mode.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "database tables ensured"
            ),
            Err(e) => {
                error!("failed to initialize database: {}", e);
                warn!("continuing without database initialization");
            }
        }
    }
}

/// A connection checked out for one operation.
pub struct Lease<C: Connector> {
    inner: LeaseInner<C>,
}

enum LeaseInner<C: Connector> {
    Pooled(PooledConnection<'static, PoolManager<C>>),
    /// `connection` is moved out exactly once, by `release` or `Drop`, which
    /// then set `taken`.
    Dedicated {
        connection: ManuallyDrop<C::Connection>,
        connector: Arc<C>,
        taken: bool,
    },
}

impl<C: Connector> Lease<C> {
    /// Gives the connection back: pooled connections return to the pool,
    /// dedicated ones are closed.
    pub async fn release(mut self) {
        if let Some((connection, connector)) = self.take_dedicated() {
            match connector.close(connection).await {
                Ok(()) => debug!("database connection closed"),
                Err(e) => warn!("error closing database connection: {}", e),
            }
        }
    }

    fn take_dedicated(&mut self) -> Option<(C::Connection, Arc<C>)> {
        match &mut self.inner {
            LeaseInner::Dedicated {
                connection,
                connector,
                taken,
            } if !*taken => {
                *taken = true;
                // SAFETY: guarded by `taken`, and both callers are the last
                // users of the lease, so the emptied slot is never read.
                let connection = unsafe { ManuallyDrop::take(connection) };
                Some((connection, connector.clone()))
            }
            _ => None,
        }
    }
}

impl<C: Connector> Deref for Lease<C> {
    type Target = C::Connection;

    fn deref(&self) -> &Self::Target {
        match &self.inner {
            LeaseInner::Pooled(connection) => &**connection,
            LeaseInner::Dedicated { connection, .. } => &**connection,
        }
    }
}

impl<C: Connector> DerefMut for Lease<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.inner {
            LeaseInner::Pooled(connection) => &mut **connection,
            LeaseInner::Dedicated { connection, .. } => &mut **connection,
        }
    }
}

impl<C: Connector> Drop for Lease<C> {
    fn drop(&mut self) {
        if let Some((connection, connector)) = self.take_dedicated() {
            warn!("database connection dropped without release, closing in background");
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = connector.close(connection).await {
                            warn!("error closing database connection: {}", e);
                        }
                    });
                }
                Err(_) => drop(connection),
            }
        }
    }
}
