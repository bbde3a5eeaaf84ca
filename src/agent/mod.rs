//! Retrieval-augmented SQL agent.
//!
//! The agent composes three collaborators: a [`VectorStore`] holding training
//! data, a [`ChatModel`] that writes SQL, and a [`SqlRunner`] that executes
//! it. Training stores units in the vector store; asking a question retrieves
//! related units, prompts the model and runs the SQL it returns.

pub mod prompt;
pub mod sql_validator;

use crate::db::SqlRunner;
use crate::error::{AgentError, AgentResult};
use crate::llm::ChatModel;
use crate::models::{Answer, PlanItemType, ResultSet, TrainingInput, TrainingRecord};
use crate::store::VectorStore;
use crate::training::Trainer;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct Agent {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn ChatModel>,
    db: Arc<dyn SqlRunner>,
}

impl Agent {
    pub fn new(
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn ChatModel>,
        db: Arc<dyn SqlRunner>,
    ) -> Self {
        Self { store, llm, db }
    }

    /// Ask the model which business question `sql` answers.
    pub async fn generate_question(&self, sql: &str) -> AgentResult<String> {
        let reply = self.llm.submit(&prompt::question_prompt(sql)).await?;
        Ok(reply.trim().to_string())
    }

    /// Turn a natural-language question into SQL using retrieved training data.
    pub async fn generate_sql(&self, question: &str) -> AgentResult<String> {
        if question.trim().is_empty() {
            return Err(AgentError::invalid_input("Question must not be empty"));
        }

        let question_sql = self.store.similar_question_sql(question).await?;
        let ddl = self.store.related_ddl(question).await?;
        let documentation = self.store.related_documentation(question).await?;
        debug!(
            examples = question_sql.len(),
            ddl = ddl.len(),
            documentation = documentation.len(),
            "Retrieved training context"
        );

        let messages = prompt::sql_prompt(question, &question_sql, &ddl, &documentation);
        let reply = self.llm.submit(&messages).await?;
        Ok(prompt::extract_sql(&reply))
    }

    /// Run SQL after checking that it is read-only.
    pub async fn run_sql(&self, sql: &str) -> AgentResult<ResultSet> {
        sql_validator::validate_readonly(sql)?;
        self.db.run_sql(sql).await
    }

    /// Generate SQL for `question`, run it and return both.
    pub async fn ask(&self, question: &str) -> AgentResult<Answer> {
        let sql = self.generate_sql(question).await?;
        info!(question = %question, sql = %sql, "Generated SQL");
        let result = self.run_sql(&sql).await?;
        Ok(Answer {
            question: question.to_string(),
            sql,
            result,
        })
    }

    pub async fn training_data(&self) -> AgentResult<Vec<TrainingRecord>> {
        self.store.training_data().await
    }

    pub async fn remove_training_data(&self, id: &str) -> AgentResult<()> {
        if self.store.remove(id).await? {
            info!(id = %id, "Removed training data");
            Ok(())
        } else {
            Err(AgentError::not_found(id))
        }
    }

    async fn store_question_sql(&self, question: Option<String>, sql: &str) -> AgentResult<String> {
        let question = match question {
            Some(question) => question,
            None => self.generate_question(sql).await?,
        };
        self.store.add_question_sql(&question, sql).await
    }
}

#[async_trait]
impl Trainer for Agent {
    async fn train(&self, input: TrainingInput) -> AgentResult<Vec<String>> {
        debug!(kind = input.kind(), "Training");
        match input {
            TrainingInput::Documentation(documentation) => {
                Ok(vec![self.store.add_documentation(&documentation).await?])
            }
            TrainingInput::Ddl(ddl) => Ok(vec![self.store.add_ddl(&ddl).await?]),
            TrainingInput::Sql { question, sql } => {
                Ok(vec![self.store_question_sql(question, &sql).await?])
            }
            TrainingInput::Plan(plan) => {
                let mut ids = Vec::with_capacity(plan.len());
                for item in &plan.items {
                    info!("{}", item);
                    let id = match item.item_type {
                        PlanItemType::Sql => {
                            self.store_question_sql(Some(item.item_name.clone()), &item.item_value)
                                .await?
                        }
                        PlanItemType::Ddl => self.store.add_ddl(&item.item_value).await?,
                        PlanItemType::InformationSchema => {
                            self.store.add_documentation(&item.item_value).await?
                        }
                    };
                    ids.push(id);
                }
                Ok(ids)
            }
        }
    }
}
