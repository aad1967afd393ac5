//! Inmo CRM Library
//!
//! Backend service for a multi-tenant real-estate CRM: lead management,
//! pipeline tracking, properties, tasks, team administration, audit
//! logging and reporting over an external hosted data store.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use middleware::{auth_middleware, Claims, Session};
use services::{AuditSink, StoreClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Local database pool (audit log)
    pub db: DbPool,
    /// Client for the hosted data store
    pub store: Arc<StoreClient>,
    /// Audit sink; failures are swallowed by the sink itself
    pub audit: Arc<dyn AuditSink>,
}
