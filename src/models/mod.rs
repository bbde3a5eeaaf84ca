//! Data models for the db-agent.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;
pub mod training;

pub use query::{Record, ResultSet, record_text};
pub use schema::{ConstraintRow, ForeignKeyRow, ProcedureDefinitionRow, ViewDefinitionRow};
pub use training::{
    Answer, PlanItemType, QuestionSql, TrainingInput, TrainingKind, TrainingPlan,
    TrainingPlanItem, TrainingRecord,
};
