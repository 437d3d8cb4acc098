//! SQLite storage layer for the hub.
//!
//! This module provides the persistence layer using SQLite with:
//! - WAL mode for file-backed stores
//! - Transaction discipline for atomic writes
//! - Audit entries written in the same transaction as each change
//!
//! # Submodules
//!
//! - [`audit`] - Audit log storage and retention
//! - [`record`] - Generic entity repository contract
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Connection handling and the mutation protocol

pub mod audit;
pub mod record;
pub mod schema;
pub mod sqlite;

pub use audit::{AuditAction, AuditEntry, Module, RetentionPolicy};
pub use record::{Draft, Filter, Patch, Record, SqlValue};
pub use sqlite::{now_ms, MutationContext, SqliteStorage};
