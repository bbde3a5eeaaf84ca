//! Configuration handling for db-agent.
//!
//! Tunables come from CLI arguments with environment fallbacks. Credentials
//! are kept out of the argument parser: they are read from the environment
//! (optionally populated from a `.env` file) into [`Secrets`], and every
//! missing key is reported in one error before anything connects.

use crate::db::render_connection_string;
use crate::error::ConfigError;
use crate::store::DEFAULT_N_RESULTS;
use crate::training::{BootstrapOptions, CustomTraining, FkDocumentationMode, ProcedureSqlSource};
use clap::{Parser, Subcommand};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_STORE_PATH: &str = "training.db";
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8084;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const ODBC_SQL_AUTHENTICATION: &str = "ODBC_SQL_AUTHENTICATION";

/// What to do once configured.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the web front end
    Serve,
    /// Train on the schema plan built from INFORMATION_SCHEMA.COLUMNS
    Train,
    /// Train on ad-hoc documentation, DDL or a question/SQL pair
    CustomTrain {
        /// Free-text documentation about the data
        #[arg(long)]
        documentation: Option<String>,
        /// Business question answered by --sql
        #[arg(long, requires = "sql")]
        question: Option<String>,
        /// Example SQL; the question is generated when omitted
        #[arg(long)]
        sql: Option<String>,
        /// DDL statement
        #[arg(long)]
        ddl: Option<String>,
    },
    /// Train on schema plan, foreign keys, constraints, views and stored procedures
    Bootstrap {
        /// Submit FK sentences as one documentation unit or one per sentence
        #[arg(long, value_enum, default_value_t = FkDocumentationMode::default())]
        fk_mode: FkDocumentationMode,
        /// SQL paired with each stored procedure name
        #[arg(long, value_enum, default_value_t = ProcedureSqlSource::default())]
        procedure_sql: ProcedureSqlSource,
    },
    /// Ask a question, print the generated SQL and its result
    Ask {
        /// Natural-language question
        question: String,
    },
}

impl Command {
    /// Options for the `bootstrap` subcommand, defaults otherwise.
    pub fn bootstrap_options(&self) -> BootstrapOptions {
        match self {
            Self::Bootstrap {
                fk_mode,
                procedure_sql,
            } => BootstrapOptions {
                fk_mode: *fk_mode,
                procedure_sql: *procedure_sql,
            },
            _ => BootstrapOptions::default(),
        }
    }

    /// Units for the `custom-train` subcommand.
    pub fn custom_training(&self) -> Option<CustomTraining> {
        match self {
            Self::CustomTrain {
                documentation,
                question,
                sql,
                ddl,
            } => Some(CustomTraining {
                documentation: documentation.clone(),
                ddl: ddl.clone(),
                question: question.clone(),
                sql: sql.clone(),
            }),
            _ => None,
        }
    }
}

/// Configuration for db-agent.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "db-agent",
    about = "Train a text-to-SQL agent on SQL Server metadata and ask it questions",
    version,
    author
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,

    /// Chat model used to generate SQL
    #[arg(long, global = true, default_value = DEFAULT_MODEL, env = "DB_AGENT_MODEL")]
    pub model: String,

    /// Embedding model used for retrieval
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_EMBEDDING_MODEL,
        env = "DB_AGENT_EMBEDDING_MODEL"
    )]
    pub embedding_model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_OPENAI_BASE_URL,
        env = "OPENAI_BASE_URL"
    )]
    pub openai_base_url: String,

    /// Path of the SQLite file holding training data
    #[arg(long, global = true, default_value = DEFAULT_STORE_PATH, env = "DB_AGENT_STORE_PATH")]
    pub store_path: String,

    /// HTTP host to bind to (serve only)
    #[arg(long, global = true, default_value = DEFAULT_HTTP_HOST, env = "DB_AGENT_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (serve only)
    #[arg(long, global = true, default_value_t = DEFAULT_HTTP_PORT, env = "DB_AGENT_HTTP_PORT")]
    pub http_port: u16,

    /// Number of similar items retrieved for each prompt section
    #[arg(long, global = true, default_value_t = DEFAULT_N_RESULTS, env = "DB_AGENT_N_RESULTS")]
    pub n_results: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "DB_AGENT_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, global = true, env = "DB_AGENT_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            command: Command::Serve,
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            store_path: DEFAULT_STORE_PATH.to_string(),
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            n_results: DEFAULT_N_RESULTS,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Credentials read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub openai_api_key: String,
    pub db_password: String,
    /// Connection string template containing the password placeholder
    pub connection_template: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &"<redacted>")
            .field("db_password", &"<redacted>")
            .field("connection_template", &self.connection_template)
            .finish()
    }
}

impl Secrets {
    /// Every environment variable that must be set, in reporting order.
    pub const REQUIRED: [&'static str; 3] = [OPENAI_API_KEY, DB_PASSWORD, ODBC_SQL_AUTHENTICATION];

    /// Read secrets from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read secrets through `lookup`. Unset and empty values both count as
    /// missing; all missing keys are reported together.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut values = Vec::with_capacity(Self::REQUIRED.len());
        let mut missing = Vec::new();

        for key in Self::REQUIRED {
            match lookup(key).filter(|v| !v.is_empty()) {
                Some(value) => values.push(value),
                None => missing.push(key),
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv { keys: missing });
        }

        let mut values = values.into_iter();
        match (values.next(), values.next(), values.next()) {
            (Some(openai_api_key), Some(db_password), Some(connection_template)) => Ok(Self {
                openai_api_key,
                db_password,
                connection_template,
            }),
            _ => Err(ConfigError::MissingEnv {
                keys: Self::REQUIRED.to_vec(),
            }),
        }
    }

    /// Connection string with the password substituted in.
    pub fn connection_string(&self) -> String {
        render_connection_string(&self.connection_template, &self.db_password)
    }
}
