//! SQLite-backed vector store.
//!
//! Records live in one table; embeddings are stored as little-endian `f32`
//! blobs and searched by brute-force cosine similarity. Training sets are a few
//! thousand rows at most, so a full scan per query is fine.

use crate::error::{AgentError, AgentResult};
use crate::llm::Embedder;
use crate::models::{QuestionSql, TrainingKind, TrainingRecord};
use crate::store::{DEFAULT_N_RESULTS, VectorStore, deterministic_id};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SqliteVectorStore {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
    n_results: usize,
}

impl SqliteVectorStore {
    /// Open (or create) the store file at `path`.
    pub async fn open(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> AgentResult<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            embedder,
            n_results: DEFAULT_N_RESULTS,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Opened training store");
        Ok(store)
    }

    /// Number of results returned by each retrieval query.
    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results.max(1);
        self
    }

    async fn init_schema(&self) -> AgentResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS training_data (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                question TEXT,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_training_kind ON training_data(kind)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn embed_one(&self, text: &str) -> AgentResult<Vec<f32>> {
        self.embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::llm("embedding backend returned no vector"))
    }

    async fn upsert(
        &self,
        id: String,
        kind: TrainingKind,
        question: Option<&str>,
        content: &str,
        embed_text: &str,
    ) -> AgentResult<String> {
        let embedding = self.embed_one(embed_text).await?;
        sqlx::query(
            "INSERT OR REPLACE INTO training_data (id, kind, question, content, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&id)
        .bind(kind.as_str())
        .bind(question)
        .bind(content)
        .bind(serialize_embedding(&embedding))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(id = %id, kind = %kind, "Stored training record");
        Ok(id)
    }

    /// Records of `kind` ranked by similarity to `question`, best first.
    async fn nearest(&self, kind: TrainingKind, question: &str) -> AgentResult<Vec<TrainingRecord>> {
        let rows = sqlx::query(
            "SELECT id, kind, question, content, embedding, created_at
             FROM training_data
             WHERE kind = ?1",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embed_one(question).await?;
        let mut scored = rows
            .iter()
            .map(|row| {
                let bytes: Vec<u8> = row.try_get("embedding")?;
                let score = cosine_similarity(&query, &deserialize_embedding(&bytes));
                Ok((score, row_to_record(row)?))
            })
            .collect::<AgentResult<Vec<(f32, TrainingRecord)>>>()?;

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.n_results);
        Ok(scored.into_iter().map(|(_, record)| record).collect())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add_question_sql(&self, question: &str, sql: &str) -> AgentResult<String> {
        let key = json!({ "question": question, "sql": sql }).to_string();
        let id = deterministic_id(&key, TrainingKind::Sql);
        self.upsert(id, TrainingKind::Sql, Some(question), sql, question)
            .await
    }

    async fn add_ddl(&self, ddl: &str) -> AgentResult<String> {
        let id = deterministic_id(ddl, TrainingKind::Ddl);
        self.upsert(id, TrainingKind::Ddl, None, ddl, ddl).await
    }

    async fn add_documentation(&self, documentation: &str) -> AgentResult<String> {
        let id = deterministic_id(documentation, TrainingKind::Documentation);
        self.upsert(id, TrainingKind::Documentation, None, documentation, documentation)
            .await
    }

    async fn similar_question_sql(&self, question: &str) -> AgentResult<Vec<QuestionSql>> {
        Ok(self
            .nearest(TrainingKind::Sql, question)
            .await?
            .into_iter()
            .map(|record| QuestionSql {
                question: record.question.unwrap_or_default(),
                sql: record.content,
            })
            .collect())
    }

    async fn related_ddl(&self, question: &str) -> AgentResult<Vec<String>> {
        Ok(self
            .nearest(TrainingKind::Ddl, question)
            .await?
            .into_iter()
            .map(|record| record.content)
            .collect())
    }

    async fn related_documentation(&self, question: &str) -> AgentResult<Vec<String>> {
        Ok(self
            .nearest(TrainingKind::Documentation, question)
            .await?
            .into_iter()
            .map(|record| record.content)
            .collect())
    }

    async fn training_data(&self) -> AgentResult<Vec<TrainingRecord>> {
        let rows = sqlx::query(
            "SELECT id, kind, question, content, created_at
             FROM training_data
             ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn remove(&self, id: &str) -> AgentResult<bool> {
        let result = sqlx::query("DELETE FROM training_data WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_record(row: &SqliteRow) -> AgentResult<TrainingRecord> {
    let kind: String = row.try_get("kind")?;
    let kind = TrainingKind::parse(&kind)
        .ok_or_else(|| AgentError::invalid_input(format!("Unknown training kind: {}", kind)))?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(TrainingRecord {
        id: row.try_get("id")?,
        kind,
        question: row.try_get("question")?,
        content: row.try_get("content")?,
        created_at,
    })
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON { 0.0 } else { dot / denom }
}
