//! Training data models.

use crate::models::query::ResultSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a training plan item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanItemType {
    Sql,
    Ddl,
    InformationSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPlanItem {
    pub item_type: PlanItemType,
    /// `{catalog}.{schema}` for information-schema items
    pub item_group: String,
    pub item_name: String,
    pub item_value: String,
}

impl std::fmt::Display for TrainingPlanItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.item_type {
            PlanItemType::Sql => write!(f, "Train on SQL: {} {}", self.item_group, self.item_name),
            PlanItemType::Ddl => write!(f, "Train on DDL: {} {}", self.item_group, self.item_name),
            PlanItemType::InformationSchema => write!(
                f,
                "Train on Information Schema: {} {}",
                self.item_group, self.item_name
            ),
        }
    }
}

/// Structured summary of a database schema, one item per unit to submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub items: Vec<TrainingPlanItem>,
}

impl TrainingPlan {
    pub fn new(items: Vec<TrainingPlanItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One unit submitted to the trainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingInput {
    Plan(TrainingPlan),
    Documentation(String),
    Ddl(String),
    /// A SQL example. Without a question, the agent asks the LLM to infer one.
    Sql {
        question: Option<String>,
        sql: String,
    },
}

impl TrainingInput {
    pub fn documentation(text: impl Into<String>) -> Self {
        Self::Documentation(text.into())
    }

    pub fn sql(sql: impl Into<String>) -> Self {
        Self::Sql {
            question: None,
            sql: sql.into(),
        }
    }

    pub fn question_sql(question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Sql {
            question: Some(question.into()),
            sql: sql.into(),
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Plan(_) => "plan",
            Self::Documentation(_) => "documentation",
            Self::Ddl(_) => "ddl",
            Self::Sql { .. } => "sql",
        }
    }
}

/// Kind of a stored training record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingKind {
    Sql,
    Ddl,
    Documentation,
}

impl TrainingKind {
    /// Suffix appended to record ids.
    pub fn id_suffix(&self) -> &'static str {
        match self {
            Self::Sql => "-sql",
            Self::Ddl => "-ddl",
            Self::Documentation => "-doc",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Ddl => "ddl",
            Self::Documentation => "documentation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sql" => Some(Self::Sql),
            "ddl" => Some(Self::Ddl),
            "documentation" => Some(Self::Documentation),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrainingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of training data as stored by the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub id: String,
    pub kind: TrainingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A question/SQL pair retrieved as a few-shot example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSql {
    pub question: String,
    pub sql: String,
}

/// Result of asking the agent a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub sql: String,
    pub result: ResultSet,
}
