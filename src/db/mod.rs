//! Database access layer.
//!
//! This module provides SQL Server access:
//! - The single long-lived connection
//! - Catalog introspection for training
//! - Value mapping from TDS to JSON

pub mod connection;
pub mod schema;
pub mod types;

pub use connection::{MssqlClient, render_connection_string};
pub use schema::{MetadataSource, SchemaInspector};

use crate::error::AgentResult;
use crate::models::ResultSet;
use async_trait::async_trait;

/// Executes a SQL statement and returns its first result set.
#[async_trait]
pub trait SqlRunner: Send + Sync {
    async fn run_sql(&self, sql: &str) -> AgentResult<ResultSet>;
}
