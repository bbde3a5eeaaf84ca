//! Training run sequences.
//!
//! Three fixed sequences exist:
//! - default: schema plan only
//! - custom: ad-hoc documentation, DDL and question/SQL pairs
//! - bootstrap: plan, FK documentation, constraints, views, stored procedures
//!
//! Each stage reads its metadata, then submits its units one by one. Any
//! error aborts the run immediately; nothing is retried or rolled back.

use crate::db::MetadataSource;
use crate::error::{AgentError, AgentResult};
use crate::models::TrainingInput;
use crate::training::Trainer;
use crate::training::plan::build_training_plan;
use crate::training::sentences::{constraint_sentences, fk_documentation, fk_sentences};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, info};

/// How foreign-key sentences are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FkDocumentationMode {
    /// All sentences joined by newlines into one documentation unit
    #[default]
    Joined,
    /// One documentation unit per sentence
    PerSentence,
}

impl std::fmt::Display for FkDocumentationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joined => write!(f, "joined"),
            Self::PerSentence => write!(f, "per-sentence"),
        }
    }
}

/// Which SQL text is paired with each stored procedure name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProcedureSqlSource {
    /// The procedure's own definition
    #[default]
    Definition,
    /// The query body of the last view processed (legacy pipeline behaviour)
    LastViewQuery,
}

impl std::fmt::Display for ProcedureSqlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Definition => write!(f, "definition"),
            Self::LastViewQuery => write!(f, "last-view-query"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapOptions {
    pub fk_mode: FkDocumentationMode,
    pub procedure_sql: ProcedureSqlSource,
}

/// Number of units submitted per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub plan_submitted: bool,
    pub plan_items: usize,
    pub fk_units: usize,
    pub constraint_units: usize,
    pub view_units: usize,
    pub procedure_units: usize,
    pub custom_units: usize,
}

impl BootstrapReport {
    pub fn submissions(&self) -> usize {
        // the plan is one submission regardless of its size
        usize::from(self.plan_submitted)
            + self.fk_units
            + self.constraint_units
            + self.view_units
            + self.procedure_units
            + self.custom_units
    }
}

/// Ad-hoc training units for a custom run. Empty fields are skipped.
#[derive(Debug, Clone, Default)]
pub struct CustomTraining {
    pub documentation: Option<String>,
    pub ddl: Option<String>,
    pub question: Option<String>,
    pub sql: Option<String>,
}

impl CustomTraining {
    /// Drop fields that are empty or whitespace only.
    pub fn without_blanks(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        Self {
            documentation: keep(self.documentation),
            ddl: keep(self.ddl),
            question: keep(self.question),
            sql: keep(self.sql),
        }
    }

    /// True when nothing would be submitted.
    pub fn is_empty(&self) -> bool {
        self.documentation.is_none() && self.ddl.is_none() && self.sql.is_none()
    }
}

/// Schema plan only.
pub async fn run_default_training(
    source: &dyn MetadataSource,
    trainer: &dyn Trainer,
) -> AgentResult<BootstrapReport> {
    let mut report = BootstrapReport::default();
    train_schema_plan(source, trainer, &mut report).await?;
    info!(plan_items = report.plan_items, "Default training complete");
    Ok(report)
}

/// Submit whichever custom units are present, documentation first.
pub async fn run_custom_training(
    trainer: &dyn Trainer,
    custom: CustomTraining,
) -> AgentResult<BootstrapReport> {
    let custom = custom.without_blanks();
    let mut report = BootstrapReport::default();

    if let Some(documentation) = custom.documentation {
        trainer.train(TrainingInput::Documentation(documentation)).await?;
        report.custom_units += 1;
    }
    if let Some(ddl) = custom.ddl {
        trainer.train(TrainingInput::Ddl(ddl)).await?;
        report.custom_units += 1;
    }
    match (custom.question, custom.sql) {
        (question, Some(sql)) => {
            trainer.train(TrainingInput::Sql { question, sql }).await?;
            report.custom_units += 1;
        }
        (Some(_), None) => {
            return Err(AgentError::invalid_input(
                "A question needs the SQL that answers it",
            ));
        }
        (None, None) => {}
    }

    info!(units = report.custom_units, "Custom training complete");
    Ok(report)
}

/// Full metadata bootstrap, meant to run once against a fresh store.
pub async fn run_bootstrap(
    source: &dyn MetadataSource,
    trainer: &dyn Trainer,
    options: BootstrapOptions,
) -> AgentResult<BootstrapReport> {
    let mut report = BootstrapReport::default();

    info!("Training based on INFORMATION SCHEMA");
    train_schema_plan(source, trainer, &mut report).await?;

    info!(mode = %options.fk_mode, "Getting FKs");
    let fks = source.fk_relationships().await?;
    match options.fk_mode {
        FkDocumentationMode::Joined => {
            trainer
                .train(TrainingInput::Documentation(fk_documentation(&fks)))
                .await?;
            report.fk_units += 1;
        }
        FkDocumentationMode::PerSentence => {
            for sentence in fk_sentences(&fks) {
                trainer.train(TrainingInput::Documentation(sentence)).await?;
                report.fk_units += 1;
            }
        }
    }

    info!("Getting Constraints");
    let constraints = source.constraints().await?;
    for sentence in constraint_sentences(&constraints) {
        trainer.train(TrainingInput::Documentation(sentence)).await?;
        report.constraint_units += 1;
    }

    info!("Getting Views Definitions");
    let views = source.view_definitions().await?;
    for view in &views {
        debug!(view = %view.view_name, "Training on view query");
        trainer.train(TrainingInput::sql(view.view_query.clone())).await?;
        report.view_units += 1;
    }

    info!(source = %options.procedure_sql, "Getting Stored Procedures Definitions");
    let procedures = source.stored_procedures().await?;
    for procedure in procedures {
        let sql = match options.procedure_sql {
            ProcedureSqlSource::Definition => procedure.definition,
            ProcedureSqlSource::LastViewQuery => views
                .last()
                .map(|v| v.view_query.clone())
                .ok_or_else(|| {
                    AgentError::invalid_input(
                        "Procedure SQL source is last-view-query but the database has no views",
                    )
                })?,
        };
        trainer
            .train(TrainingInput::question_sql(procedure.procedure_name, sql))
            .await?;
        report.procedure_units += 1;
    }

    info!(
        plan_items = report.plan_items,
        fk_units = report.fk_units,
        constraint_units = report.constraint_units,
        view_units = report.view_units,
        procedure_units = report.procedure_units,
        "Metadata bootstrap complete"
    );
    Ok(report)
}

async fn train_schema_plan(
    source: &dyn MetadataSource,
    trainer: &dyn Trainer,
    report: &mut BootstrapReport,
) -> AgentResult<()> {
    let information_schema = source.information_schema().await?;
    let plan = build_training_plan(&information_schema);
    report.plan_items = plan.len();
    trainer.train(TrainingInput::Plan(plan)).await?;
    report.plan_submitted = true;
    Ok(())
}
