//! Training data storage.
//!
//! The vector store keeps every training unit together with its embedding and
//! answers similarity queries when a prompt is being built.

pub mod sqlite;

pub use sqlite::SqliteVectorStore;

use crate::error::AgentResult;
use crate::models::{QuestionSql, TrainingKind, TrainingRecord};
use async_trait::async_trait;
use uuid::Uuid;

/// Default number of results for each retrieval query.
pub const DEFAULT_N_RESULTS: usize = 10;

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add_question_sql(&self, question: &str, sql: &str) -> AgentResult<String>;

    async fn add_ddl(&self, ddl: &str) -> AgentResult<String>;

    async fn add_documentation(&self, documentation: &str) -> AgentResult<String>;

    /// Question/SQL pairs whose question is closest to `question`.
    async fn similar_question_sql(&self, question: &str) -> AgentResult<Vec<QuestionSql>>;

    async fn related_ddl(&self, question: &str) -> AgentResult<Vec<String>>;

    async fn related_documentation(&self, question: &str) -> AgentResult<Vec<String>>;

    /// Every stored record, oldest first.
    async fn training_data(&self) -> AgentResult<Vec<TrainingRecord>>;

    /// Returns false when no record had this id.
    async fn remove(&self, id: &str) -> AgentResult<bool>;
}

/// Content-addressed record id: UUIDv5 of the content plus a kind suffix.
/// Storing identical content twice yields the same id.
pub fn deterministic_id(content: &str, kind: TrainingKind) -> String {
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, content.as_bytes());
    format!("{}{}", uuid, kind.id_suffix())
}
