//! Application wiring.
//!
//! Secrets are resolved first; only then are the collaborators built, in a
//! fixed order: SQL Server connection, language model client, training store.
//! The [`Connector`] trait is the seam that builds them.

use crate::agent::Agent;
use crate::config::{Command, Config, Secrets};
use crate::db::{MetadataSource, MssqlClient, SchemaInspector, SqlRunner};
use crate::error::AgentResult;
use crate::format::format_as_table;
use crate::llm::{ChatModel, Embedder, OpenAiClient};
use crate::store::{SqliteVectorStore, VectorStore};
use crate::training::{
    BootstrapReport, run_bootstrap, run_custom_training, run_default_training,
};
use crate::web::WebServer;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Builds the external collaborators.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn database(&self, connection_string: &str) -> AgentResult<Arc<dyn SqlRunner>>;

    fn language_model(&self, config: &Config, api_key: &str) -> (Arc<dyn ChatModel>, Arc<dyn Embedder>);

    async fn store(
        &self,
        config: &Config,
        embedder: Arc<dyn Embedder>,
    ) -> AgentResult<Arc<dyn VectorStore>>;
}

/// SQL Server over TDS, OpenAI-compatible HTTP API, SQLite store file.
pub struct LiveConnector;

#[async_trait]
impl Connector for LiveConnector {
    async fn database(&self, connection_string: &str) -> AgentResult<Arc<dyn SqlRunner>> {
        Ok(Arc::new(MssqlClient::connect(connection_string).await?))
    }

    fn language_model(&self, config: &Config, api_key: &str) -> (Arc<dyn ChatModel>, Arc<dyn Embedder>) {
        let client = Arc::new(OpenAiClient::new(
            &config.openai_base_url,
            api_key,
            &config.model,
            &config.embedding_model,
        ));
        let chat: Arc<dyn ChatModel> = client.clone();
        let embedder: Arc<dyn Embedder> = client;
        (chat, embedder)
    }

    async fn store(
        &self,
        config: &Config,
        embedder: Arc<dyn Embedder>,
    ) -> AgentResult<Arc<dyn VectorStore>> {
        let store = SqliteVectorStore::open(&config.store_path, embedder)
            .await?
            .with_n_results(config.n_results);
        Ok(Arc::new(store))
    }
}

pub struct App {
    agent: Agent,
    metadata: Arc<dyn MetadataSource>,
}

impl App {
    /// Connect using the process environment and the live collaborators.
    pub async fn connect(config: &Config) -> AgentResult<Self> {
        Self::connect_with(config, |key| std::env::var(key).ok(), &LiveConnector).await
    }

    /// Resolve secrets through `lookup`, then build collaborators with `connector`.
    ///
    /// Missing secrets fail before `connector` is called at all.
    pub async fn connect_with(
        config: &Config,
        lookup: impl Fn(&str) -> Option<String>,
        connector: &dyn Connector,
    ) -> AgentResult<Self> {
        let secrets = Secrets::from_lookup(lookup)?;

        let db = connector.database(&secrets.connection_string()).await?;
        let (llm, embedder) = connector.language_model(config, &secrets.openai_api_key);
        let store = connector.store(config, embedder).await?;
        info!(model = %config.model, store = %config.store_path, "Agent ready");

        let metadata: Arc<dyn MetadataSource> = Arc::new(SchemaInspector::new(db.clone()));
        Ok(Self {
            agent: Agent::new(store, llm, db),
            metadata,
        })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Run one subcommand to completion.
    pub async fn execute(&self, config: &Config) -> AgentResult<()> {
        match &config.command {
            Command::Serve => {
                WebServer::new(self.agent.clone(), &config.http_host, config.http_port)
                    .run()
                    .await
            }
            Command::Train => {
                let report = run_default_training(self.metadata.as_ref(), &self.agent).await?;
                print_report(&report);
                Ok(())
            }
            command @ Command::CustomTrain { .. } => {
                let custom = command.custom_training().unwrap_or_default();
                let report = run_custom_training(&self.agent, custom).await?;
                print_report(&report);
                Ok(())
            }
            command @ Command::Bootstrap { .. } => {
                let report = run_bootstrap(
                    self.metadata.as_ref(),
                    &self.agent,
                    command.bootstrap_options(),
                )
                .await?;
                print_report(&report);
                Ok(())
            }
            Command::Ask { question } => {
                let answer = self.agent.ask(question).await?;
                println!("{}\n", answer.sql);
                print!("{}", format_as_table(&answer.result));
                Ok(())
            }
        }
    }
}

fn print_report(report: &BootstrapReport) {
    println!("Training submissions: {}", report.submissions());
    if report.plan_submitted {
        println!("  schema plan items:   {}", report.plan_items);
    }
    for (label, count) in [
        ("foreign key units:  ", report.fk_units),
        ("constraint units:   ", report.constraint_units),
        ("view queries:       ", report.view_units),
        ("stored procedures:  ", report.procedure_units),
        ("custom units:       ", report.custom_units),
    ] {
        if count > 0 {
            println!("  {} {}", label, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DB_PASSWORD, ODBC_SQL_AUTHENTICATION, OPENAI_API_KEY};
    use crate::error::{AgentError, ConfigError};
    use crate::llm::ChatMessage;
    use crate::models::{QuestionSql, ResultSet, TrainingRecord};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fakes {
        executed: Mutex<Vec<String>>,
        stored: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SqlRunner for Fakes {
        async fn run_sql(&self, sql: &str) -> AgentResult<ResultSet> {
            self.executed.lock().unwrap().push(sql.to_string());
            Ok(ResultSet::default())
        }
    }

    #[async_trait]
    impl ChatModel for Fakes {
        async fn submit(&self, _messages: &[ChatMessage]) -> AgentResult<String> {
            Ok("SELECT 1;".to_string())
        }
    }

    #[async_trait]
    impl Embedder for Fakes {
        async fn embed(&self, texts: &[String]) -> AgentResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    #[async_trait]
    impl VectorStore for Fakes {
        async fn add_question_sql(&self, question: &str, _sql: &str) -> AgentResult<String> {
            self.stored.lock().unwrap().push(question.to_string());
            Ok("id-sql".to_string())
        }
        async fn add_ddl(&self, ddl: &str) -> AgentResult<String> {
            self.stored.lock().unwrap().push(ddl.to_string());
            Ok("id-ddl".to_string())
        }
        async fn add_documentation(&self, documentation: &str) -> AgentResult<String> {
            self.stored.lock().unwrap().push(documentation.to_string());
            Ok("id-doc".to_string())
        }
        async fn similar_question_sql(&self, _q: &str) -> AgentResult<Vec<QuestionSql>> {
            Ok(vec![])
        }
        async fn related_ddl(&self, _q: &str) -> AgentResult<Vec<String>> {
            Ok(vec![])
        }
        async fn related_documentation(&self, _q: &str) -> AgentResult<Vec<String>> {
            Ok(vec![])
        }
        async fn training_data(&self) -> AgentResult<Vec<TrainingRecord>> {
            Ok(vec![])
        }
        async fn remove(&self, _id: &str) -> AgentResult<bool> {
            Ok(false)
        }
    }

    struct FakeConnector {
        fakes: Arc<Fakes>,
        calls: AtomicUsize,
        connection_strings: Mutex<Vec<String>>,
    }

    impl FakeConnector {
        fn new() -> Self {
            Self {
                fakes: Arc::new(Fakes {
                    executed: Mutex::new(Vec::new()),
                    stored: Mutex::new(Vec::new()),
                }),
                calls: AtomicUsize::new(0),
                connection_strings: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn database(&self, connection_string: &str) -> AgentResult<Arc<dyn SqlRunner>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.connection_strings
                .lock()
                .unwrap()
                .push(connection_string.to_string());
            Ok(self.fakes.clone())
        }

        fn language_model(&self, _config: &Config, _api_key: &str) -> (Arc<dyn ChatModel>, Arc<dyn Embedder>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let chat: Arc<dyn ChatModel> = self.fakes.clone();
            let embedder: Arc<dyn Embedder> = self.fakes.clone();
            (chat, embedder)
        }

        async fn store(
            &self,
            _config: &Config,
            _embedder: Arc<dyn Embedder>,
        ) -> AgentResult<Arc<dyn VectorStore>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.fakes.clone())
        }
    }

    fn full_env(key: &str) -> Option<String> {
        match key {
            OPENAI_API_KEY => Some("sk-test".to_string()),
            DB_PASSWORD => Some("hunter2".to_string()),
            ODBC_SQL_AUTHENTICATION => {
                Some("Server=tcp:db,1433;User Id=sa;Password={your_password_here}".to_string())
            }
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_missing_secrets_build_nothing() {
        let connector = FakeConnector::new();
        let result = App::connect_with(&Config::default(), |_| None, &connector).await;

        match result {
            Err(AgentError::Config(ConfigError::MissingEnv { keys })) => {
                assert_eq!(keys, vec![OPENAI_API_KEY, DB_PASSWORD, ODBC_SQL_AUTHENTICATION]);
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected missing secrets"),
        }
        assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connect_substitutes_password() {
        let connector = FakeConnector::new();
        App::connect_with(&Config::default(), full_env, &connector)
            .await
            .unwrap();

        assert_eq!(connector.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            connector.connection_strings.lock().unwrap().as_slice(),
            ["Server=tcp:db,1433;User Id=sa;Password=hunter2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_execute_train_reads_information_schema() {
        let connector = FakeConnector::new();
        let config = Config {
            command: Command::Train,
            ..Config::default()
        };
        let app = App::connect_with(&config, full_env, &connector).await.unwrap();
        app.execute(&config).await.unwrap();

        let executed = connector.fakes.executed.lock().unwrap();
        assert_eq!(executed.as_slice(), ["SELECT * FROM INFORMATION_SCHEMA.COLUMNS".to_string()]);
        // no tables, so the plan is empty and nothing is stored
        assert!(connector.fakes.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_ask_runs_generated_sql() {
        let connector = FakeConnector::new();
        let config = Config {
            command: Command::Ask {
                question: "one?".to_string(),
            },
            ..Config::default()
        };
        let app = App::connect_with(&config, full_env, &connector).await.unwrap();
        app.execute(&config).await.unwrap();

        assert_eq!(
            connector.fakes.executed.lock().unwrap().as_slice(),
            ["SELECT 1;".to_string()]
        );
    }
}
