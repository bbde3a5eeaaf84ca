//! Training pipeline.
//!
//! Turns schema metadata into training units and submits them in a fixed
//! order. Submissions are independent and non-transactional: the first
//! failure stops the run and whatever was accepted before it stays stored.

pub mod orchestrator;
pub mod plan;
pub mod sentences;

pub use orchestrator::{
    BootstrapOptions, BootstrapReport, CustomTraining, FkDocumentationMode, ProcedureSqlSource,
    run_bootstrap, run_custom_training, run_default_training,
};
pub use plan::build_training_plan;

use crate::error::AgentResult;
use crate::models::TrainingInput;
use async_trait::async_trait;

/// Accepts training units one at a time.
#[async_trait]
pub trait Trainer: Send + Sync {
    /// Submit one unit; returns the ids of the records written.
    async fn train(&self, input: TrainingInput) -> AgentResult<Vec<String>>;
}
