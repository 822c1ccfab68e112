//! Connection Pool
//!
//! A bounded pool of reusable PostgreSQL connections shared by all in-flight
//! tool operations. Entries are keyed by target database so a per-call
//! database override reuses its own connections instead of churning the
//! default ones.
//!
//! # Pooling Policy
//! - Bounded by a semaphore; acquisition suspends cooperatively (never spins)
//!   and fails with `PoolExhausted` after the configured timeout.
//! - Idle connections are reused most-recently-released-first within their
//!   database key and ping-validated before reuse; a stale entry is discarded
//!   and replaced with a fresh connection, silently, at most once per
//!   acquisition.
//! - At most `max_size` idle connections are retained in total across all
//!   database keys; releasing one past that cap evicts (closes) the idle
//!   entry that has been unused longest, so cycling through many database
//!   overrides cannot accumulate live server connections.
//! - `PoolGuard` returns the connection to the idle queue on drop unless the
//!   transport is broken, so the pool always returns to its bound.
//!
//! The pool never locks around an acquired connection: each guard is used by
//! exactly one in-flight operation.

use std::collections::VecDeque;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, warn};

use crate::config::ConnectionSettings;
use crate::error::{OpsError, Result};

/// A connection the pool can hold
///
/// The seam between pool bookkeeping and the driver: production code uses
/// [`PgConn`], tests inject a fake.
pub trait PooledConnection: Send + 'static {
    /// Cheap liveness check run before an idle entry is reused
    fn ping(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Whether the underlying transport is already known dead
    fn is_broken(&self) -> bool;
}

/// Opens new connections for the pool
pub trait Connect: Send + Sync + 'static {
    /// Connection type produced by this connector
    type Conn: PooledConnection;

    /// Open a connection to the named database
    fn connect(&self, database: &str) -> impl Future<Output = Result<Self::Conn>> + Send;
}

/// Bounded connection pool keyed by target database
///
/// Cloning is cheap: all clones share one bound and one idle list.
pub struct Pool<C: Connect> {
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C: Connect> {
    connector: C,
    default_database: String,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
    max_idle: usize,
    // Idle connections in release order, oldest at the front; the lock is
    // never held across an await point.
    idle: Mutex<VecDeque<(String, C::Conn)>>,
}

impl<C: Connect> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Connect> Pool<C> {
    /// Create a pool bounded to `max_size` connections
    pub fn new(
        connector: C,
        default_database: impl Into<String>,
        max_size: usize,
        acquire_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                connector,
                default_database: default_database.into(),
                permits: Arc::new(Semaphore::new(max_size)),
                acquire_timeout,
                max_idle: max_size,
                idle: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Acquire a live connection to the default database or to
    /// `database_override` if given
    ///
    /// Suspends while the pool is exhausted, up to the acquisition timeout.
    ///
    /// # Errors
    ///
    /// Returns `PoolExhausted` when no slot frees up within the timeout, or
    /// `Connectivity` when a fresh connection cannot be opened.
    pub async fn acquire(&self, database_override: Option<&str>) -> Result<PoolGuard<C>> {
        let inner = &self.inner;
        let permit = tokio::time::timeout(
            inner.acquire_timeout,
            Arc::clone(&inner.permits).acquire_owned(),
        )
        .await
        .map_err(|_| {
            OpsError::pool_exhausted(format!(
                "no connection became available within {}ms",
                inner.acquire_timeout.as_millis()
            ))
        })?
        .map_err(|_| OpsError::pool_exhausted("pool has been shut down"))?;

        let database = database_override.unwrap_or(&inner.default_database).to_string();

        // Reuse an idle entry when its liveness check passes; otherwise
        // discard it and reconnect (the single silent retry).
        if let Some(mut conn) = inner.pop_idle(&database) {
            if !conn.is_broken() && conn.ping().await.is_ok() {
                return Ok(PoolGuard::new(Arc::clone(inner), conn, database, permit));
            }
            debug!(database = %database, "discarding stale pooled connection");
        }

        let conn = inner.connector.connect(&database).await?;
        Ok(PoolGuard::new(Arc::clone(inner), conn, database, permit))
    }

    /// Number of free pool slots (bound minus in-use connections)
    #[must_use]
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// The connector opening this pool's connections
    #[must_use]
    pub fn connector(&self) -> &C {
        &self.inner.connector
    }
}

impl<C: Connect> PoolInner<C> {
    fn pop_idle(&self, database: &str) -> Option<C::Conn> {
        let mut idle = self.idle.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        // Most recently released entry for this database first.
        let pos = idle.iter().rposition(|(db, _)| db == database)?;
        idle.remove(pos).map(|(_, conn)| conn)
    }

    fn push_idle(&self, database: String, conn: C::Conn) {
        let mut idle = self.idle.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        idle.push_back((database, conn));
        // Retention is capped across all database keys; evicting drops the
        // connection, which closes it.
        while idle.len() > self.max_idle {
            if let Some((db, _)) = idle.pop_front() {
                debug!(database = %db, "evicting idle connection over retention cap");
            }
        }
    }
}

/// An acquired connection, returned to the pool on drop
pub struct PoolGuard<C: Connect> {
    pool: Arc<PoolInner<C>>,
    conn: Option<C::Conn>,
    database: String,
    _permit: OwnedSemaphorePermit,
}

impl<C: Connect> PoolGuard<C> {
    fn new(
        pool: Arc<PoolInner<C>>,
        conn: C::Conn,
        database: String,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self { pool, conn: Some(conn), database, _permit: permit }
    }

    /// Database this connection is attached to
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }
}

impl<C: Connect> std::fmt::Debug for PoolGuard<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolGuard").field("database", &self.database).finish_non_exhaustive()
    }
}

impl<C: Connect> Deref for PoolGuard<C> {
    type Target = C::Conn;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl<C: Connect> DerefMut for PoolGuard<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl<C: Connect> Drop for PoolGuard<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if conn.is_broken() {
                debug!(database = %self.database, "dropping broken connection");
            } else {
                self.pool.push_idle(self.database.clone(), conn);
            }
        }
        // The permit drops with the guard, releasing the pool slot.
    }
}

// ============================================================================
// PostgreSQL connector
// ============================================================================

/// Opens tokio-postgres connections from the process-wide settings
pub struct PgConnector {
    settings: ConnectionSettings,
}

impl PgConnector {
    /// Create a connector from resolved connection settings
    #[must_use]
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    fn pg_config(&self, database: &str) -> Config {
        let mut config = Config::new();
        config
            .host(&self.settings.host)
            .port(self.settings.port)
            .user(&self.settings.user)
            .password(&self.settings.password)
            .dbname(database);
        config
    }
}

impl Connect for PgConnector {
    type Conn = PgConn;

    async fn connect(&self, database: &str) -> Result<PgConn> {
        let (client, connection) = self.pg_config(database).connect(NoTls).await.map_err(|e| {
            OpsError::connectivity(format!("failed to connect to PostgreSQL: {e}"))
        })?;

        // Drive the connection until the client is dropped.
        // Note: errors are not logged with detail to prevent credential leakage.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("postgres connection terminated: {e}");
            }
        });

        Ok(PgConn { client, database: database.to_string() })
    }
}

/// A live tokio-postgres connection held by the pool
pub struct PgConn {
    client: Client,
    database: String,
}

impl PgConn {
    /// Access the underlying driver client
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Database this connection is attached to
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }
}

impl PooledConnection for PgConn {
    async fn ping(&mut self) -> Result<()> {
        self.client
            .simple_query("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|e| OpsError::connectivity(format!("liveness check failed: {e}")))
    }

    fn is_broken(&self) -> bool {
        self.client.is_closed()
    }
}

/// The production pool type used by all tool operations
pub type PgPool = Pool<PgConnector>;
