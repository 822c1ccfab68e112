//! Connection Pool Tests
//!
//! Exercises the pool bound, reuse, and failure handling under concurrency
//! using an in-memory connector, so no PostgreSQL server is required.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pgops::error::{OpsError, Result};
use pgops::pool::{Connect, Pool, PooledConnection};

// ============================================================================
// In-memory connector
// ============================================================================

struct FakeConn {
    healthy: bool,
    closed: Arc<AtomicUsize>,
}

impl Drop for FakeConn {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl PooledConnection for FakeConn {
    async fn ping(&mut self) -> Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(OpsError::connectivity("ping failed"))
        }
    }

    fn is_broken(&self) -> bool {
        !self.healthy
    }
}

#[derive(Default)]
struct FakeConnector {
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl FakeConnector {
    fn retained(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }
}

impl Connect for FakeConnector {
    type Conn = FakeConn;

    async fn connect(&self, _database: &str) -> Result<FakeConn> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeConn { healthy: true, closed: Arc::clone(&self.closed) })
    }
}

fn pool(max: usize, timeout: Duration) -> Pool<FakeConnector> {
    Pool::new(FakeConnector::default(), "postgres", max, timeout)
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_fifty_concurrent_operations_over_pool_of_five() {
    let pool = pool(5, Duration::from_secs(5));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let pool = pool.clone();
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        tasks.push(tokio::spawn(async move {
            let guard = pool.acquire(None).await.expect("acquisition must succeed");
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            drop(guard);
        }));
    }
    for task in tasks {
        task.await.expect("no task may panic or deadlock");
    }

    assert!(peak.load(Ordering::SeqCst) <= 5, "bound must hold under load");
    assert_eq!(pool.available(), 5, "all slots must return to the pool");
    assert!(
        pool.connector().opened.load(Ordering::SeqCst) <= 5,
        "healthy connections must be reused, not reopened"
    );
}

#[tokio::test]
async fn test_concurrent_overrides_use_separate_keys() {
    let pool = pool(4, Duration::from_secs(5));
    let mut tasks = Vec::new();
    for i in 0..20 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            let database = if i % 2 == 0 { None } else { Some("analytics") };
            let guard = pool.acquire(database).await.expect("acquisition must succeed");
            tokio::time::sleep(Duration::from_millis(1)).await;
            drop(guard);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(pool.available(), 4);
}

// ============================================================================
// Exhaustion and recovery
// ============================================================================

#[tokio::test]
async fn test_exhaustion_reports_pool_exhausted() {
    let pool = pool(2, Duration::from_millis(50));
    let _a = pool.acquire(None).await.unwrap();
    let _b = pool.acquire(None).await.unwrap();

    let err = pool.acquire(None).await.unwrap_err();
    assert!(matches!(err, OpsError::PoolExhausted(_)));
    assert_eq!(err.error_code(), "POOL_EXHAUSTED");
}

#[tokio::test]
async fn test_idle_retention_capped_across_database_keys() {
    let pool = pool(2, Duration::from_secs(1));
    for database in ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"] {
        drop(pool.acquire(Some(database)).await.unwrap());
    }

    assert_eq!(pool.available(), 2);
    assert_eq!(pool.connector().opened.load(Ordering::SeqCst), 6);
    assert_eq!(
        pool.connector().retained(),
        2,
        "idle connections for old database keys must be closed, not hoarded"
    );
}

#[tokio::test]
async fn test_retained_connection_for_recent_key_is_reused() {
    let pool = pool(2, Duration::from_secs(1));
    drop(pool.acquire(Some("alpha")).await.unwrap());
    drop(pool.acquire(Some("bravo")).await.unwrap());
    // Both keys fit under the cap; going back to either must not reconnect.
    drop(pool.acquire(Some("alpha")).await.unwrap());
    drop(pool.acquire(Some("bravo")).await.unwrap());
    assert_eq!(pool.connector().opened.load(Ordering::SeqCst), 2);
    assert_eq!(pool.connector().retained(), 2);
}

#[tokio::test]
async fn test_failed_acquisition_does_not_leak_a_slot() {
    let pool = pool(1, Duration::from_millis(50));
    let held = pool.acquire(None).await.unwrap();
    assert!(pool.acquire(None).await.is_err());
    drop(held);
    // The timed-out attempt must not have consumed the slot.
    let guard = pool.acquire(None).await.expect("slot must be free again");
    drop(guard);
    assert_eq!(pool.available(), 1);
}
