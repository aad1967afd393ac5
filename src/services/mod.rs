//! Business logic services

pub mod audit;
pub mod csv_import;
pub mod pipeline;
pub mod rbac;
pub mod store;

pub use audit::{AuditSink, NullAuditSink, SqliteAuditSink};
pub use pipeline::{BoardFilter, LeadStore, PipelineBoard, TransitionNotifier, TransitionOutcome};
pub use rbac::PermissionEvaluator;
pub use store::StoreClient;
