//! db-agent library
//!
//! Reads SQL Server schema metadata, trains a retrieval-augmented text-to-SQL
//! agent on it, and answers natural-language questions over a web front end
//! or the command line.

pub mod agent;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod llm;
pub mod models;
pub mod store;
pub mod training;
pub mod web;

pub use agent::Agent;
pub use config::Config;
pub use error::{AgentError, AgentResult, ConfigError};
