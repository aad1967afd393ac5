//! Audit sink
//!
//! Every mutating operation records an audit entry. Recording is
//! fire-and-forget: a failing sink is logged and swallowed so it can never
//! fail the primary mutation.

use async_trait::async_trait;
use tracing::warn;

use crate::db::{AuditRepository, DbPool};
use crate::models::NewAuditEntry;

/// Destination for audit log entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an entry. Implementations must not propagate failures.
    async fn record(&self, entry: NewAuditEntry);
}

/// Sink backed by the local SQLite audit table
pub struct SqliteAuditSink {
    pool: DbPool,
}

impl SqliteAuditSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(&self, entry: NewAuditEntry) {
        let repo = AuditRepository::new(&self.pool);
        if let Err(e) = repo.insert(entry).await {
            warn!(error = %e, "failed to record audit entry");
        }
    }
}

/// Sink that drops every entry, for tests
#[derive(Default)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _entry: NewAuditEntry) {}
}
