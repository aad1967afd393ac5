//! Middleware components
//!
//! - Session extraction from externally issued JWTs
//! - Permission checks backed by the evaluator

pub mod auth;
pub mod rbac;

pub use auth::{auth_middleware, Claims, Session};
pub use rbac::{require, require_nav, scope_for};
