//! Per-tenant mutual exclusion via Postgres advisory locks.
//!
//! The lock key is derived server-side with `hashtextextended` from
//! `"<processor>:<org>"`, so every process computes the same key. The
//! lock is session-scoped and held on a connection detached from the
//! pool: if the holding invocation crashes, the connection closes and
//! the server releases the lock with it. A dropped-but-unreleased lock
//! therefore cannot leak into a recycled pool connection.

use relay_core::types::OrgId;
use sqlx::postgres::PgConnection;
use sqlx::{Connection, PgPool};

/// A held per-tenant advisory lock.
///
/// Scoped to one processing invocation: call [`release`](Self::release)
/// at invocation end. Dropping without releasing closes the session,
/// which also frees the lock (at the cost of the connection).
pub struct TenantLock {
    conn: PgConnection,
    key: String,
}

impl TenantLock {
    /// Try to acquire the lock for a (processor, organization) pair.
    ///
    /// Non-blocking: returns `Ok(None)` immediately when another
    /// invocation already holds the lock for the same tenant. That is a
    /// normal outcome, not an error.
    pub async fn try_acquire(
        pool: &PgPool,
        processor_name: &str,
        organization_id: OrgId,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut conn = pool.acquire().await?.detach();
        let key = format!("{processor_name}:{organization_id}");

        let acquired: bool =
            sqlx::query_scalar("SELECT pg_try_advisory_lock(hashtextextended($1, 0))")
                .bind(&key)
                .fetch_one(&mut conn)
                .await?;

        if acquired {
            Ok(Some(Self { conn, key }))
        } else {
            // Close eagerly instead of waiting for the drop to do it.
            let _ = conn.close().await;
            Ok(None)
        }
    }

    /// Release the lock and close the holding session.
    pub async fn release(mut self) -> Result<(), sqlx::Error> {
        let released: bool =
            sqlx::query_scalar("SELECT pg_advisory_unlock(hashtextextended($1, 0))")
                .bind(&self.key)
                .fetch_one(&mut self.conn)
                .await?;
        if !released {
            tracing::warn!(key = %self.key, "Advisory lock was not held at release");
        }
        self.conn.close().await
    }
}
