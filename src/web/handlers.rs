//! HTTP handlers for the question-answering front end.
//!
//! Every JSON response carries a `type` tag so the page script can dispatch on
//! it; failures come back as `{"type": "error", "error": "..."}`.

use crate::agent::Agent;
use crate::error::AgentError;
use crate::training::{CustomTraining, run_custom_training};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, warn};

const INDEX_HTML: &str = include_str!("index.html");

type HandlerResult = Result<Json<Value>, AgentError>;

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = match &self {
            AgentError::InvalidInput { .. } | AgentError::Permission { .. } => {
                StatusCode::BAD_REQUEST
            }
            AgentError::NotFound { .. } => StatusCode::NOT_FOUND,
            err if err.is_collaborator() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }

        let body = Json(json!({ "type": "error", "error": self.to_string() }));
        (status, body).into_response()
    }
}

// Malformed bodies and query strings keep the JSON error shape.
impl From<JsonRejection> for AgentError {
    fn from(rejection: JsonRejection) -> Self {
        AgentError::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for AgentError {
    fn from(rejection: QueryRejection) -> Self {
        AgentError::invalid_input(rejection.body_text())
    }
}

#[derive(Debug, Deserialize)]
pub struct QuestionParams {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct RunSqlRequest {
    pub sql: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrainRequest {
    pub question: Option<String>,
    pub sql: Option<String>,
    pub ddl: Option<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub id: String,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn generate_sql(
    State(agent): State<Agent>,
    params: Result<Query<QuestionParams>, QueryRejection>,
) -> HandlerResult {
    let Query(params) = params?;
    let sql = agent.generate_sql(&params.question).await?;
    Ok(Json(json!({
        "type": "sql",
        "question": params.question,
        "text": sql,
    })))
}

pub async fn run_sql(
    State(agent): State<Agent>,
    request: Result<Json<RunSqlRequest>, JsonRejection>,
) -> HandlerResult {
    let Json(request) = request?;
    let result = agent.run_sql(&request.sql).await?;
    Ok(Json(json!({
        "type": "df",
        "columns": result.columns,
        "rows": result.rows,
    })))
}

pub async fn ask(
    State(agent): State<Agent>,
    params: Result<Json<QuestionParams>, JsonRejection>,
) -> HandlerResult {
    let Json(params) = params?;
    let answer = agent.ask(&params.question).await?;
    Ok(Json(json!({
        "type": "answer",
        "question": answer.question,
        "sql": answer.sql,
        "columns": answer.result.columns,
        "rows": answer.result.rows,
    })))
}

pub async fn get_training_data(State(agent): State<Agent>) -> HandlerResult {
    let records = agent.training_data().await?;
    Ok(Json(json!({
        "type": "training_data",
        "records": records,
    })))
}

pub async fn train(
    State(agent): State<Agent>,
    request: Result<Json<TrainRequest>, JsonRejection>,
) -> HandlerResult {
    let Json(request) = request?;
    let custom = CustomTraining {
        documentation: request.documentation,
        ddl: request.ddl,
        question: request.question,
        sql: request.sql,
    }
    .without_blanks();
    if custom.is_empty() {
        return Err(AgentError::invalid_input(
            "Provide one of: question and sql, sql, ddl, documentation",
        ));
    }

    let report = run_custom_training(&agent, custom).await?;
    Ok(Json(json!({
        "type": "train",
        "units": report.custom_units,
    })))
}

pub async fn remove_training_data(
    State(agent): State<Agent>,
    request: Result<Json<RemoveRequest>, JsonRejection>,
) -> HandlerResult {
    let Json(request) = request?;
    agent.remove_training_data(&request.id).await?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqlRunner;
    use crate::error::AgentResult;
    use crate::llm::{ChatMessage, ChatModel};
    use crate::models::{QuestionSql, ResultSet, TrainingRecord};
    use crate::store::VectorStore;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CountingStore {
        added: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VectorStore for CountingStore {
        async fn add_question_sql(&self, question: &str, _sql: &str) -> AgentResult<String> {
            self.added.lock().unwrap().push(question.to_string());
            Ok("q-sql".to_string())
        }
        async fn add_ddl(&self, ddl: &str) -> AgentResult<String> {
            self.added.lock().unwrap().push(ddl.to_string());
            Ok("d-ddl".to_string())
        }
        async fn add_documentation(&self, documentation: &str) -> AgentResult<String> {
            self.added.lock().unwrap().push(documentation.to_string());
            Ok("d-doc".to_string())
        }
        async fn similar_question_sql(&self, _question: &str) -> AgentResult<Vec<QuestionSql>> {
            Ok(vec![])
        }
        async fn related_ddl(&self, _question: &str) -> AgentResult<Vec<String>> {
            Ok(vec![])
        }
        async fn related_documentation(&self, _question: &str) -> AgentResult<Vec<String>> {
            Ok(vec![])
        }
        async fn training_data(&self) -> AgentResult<Vec<TrainingRecord>> {
            Ok(vec![])
        }
        async fn remove(&self, _id: &str) -> AgentResult<bool> {
            Ok(false)
        }
    }

    struct FixedLlm;

    #[async_trait]
    impl ChatModel for FixedLlm {
        async fn submit(&self, _messages: &[ChatMessage]) -> AgentResult<String> {
            Ok("SELECT 1 AS one;".to_string())
        }
    }

    struct UnreachableDb;

    #[async_trait]
    impl SqlRunner for UnreachableDb {
        async fn run_sql(&self, _sql: &str) -> AgentResult<ResultSet> {
            Err(AgentError::llm("database unreachable"))
        }
    }

    fn agent() -> (Agent, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::default());
        let agent = Agent::new(store.clone(), Arc::new(FixedLlm), Arc::new(UnreachableDb));
        (agent, store)
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (AgentError::invalid_input("bad"), StatusCode::BAD_REQUEST),
            (AgentError::permission("DELETE", "no"), StatusCode::BAD_REQUEST),
            (AgentError::not_found("abc-doc"), StatusCode::NOT_FOUND),
            (AgentError::llm("upstream"), StatusCode::BAD_GATEWAY),
            (
                AgentError::Io(std::io::Error::other("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_generate_sql_handler() {
        let (agent, _) = agent();
        let Json(body) = generate_sql(
            State(agent),
            Ok(Query(QuestionParams {
                question: "one?".to_string(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(body["type"], "sql");
        assert_eq!(body["text"], "SELECT 1 AS one;");
    }

    #[tokio::test]
    async fn test_run_sql_refuses_writes_before_database() {
        let (agent, _) = agent();
        let err = run_sql(
            State(agent),
            Ok(Json(RunSqlRequest {
                sql: "DROP TABLE Customers".to_string(),
            })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AgentError::Permission { .. }));
    }

    #[tokio::test]
    async fn test_train_requires_content() {
        let (agent, store) = agent();
        let err = train(
            State(agent),
            Ok(Json(TrainRequest {
                ddl: Some("  ".to_string()),
                ..Default::default()
            })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput { .. }));
        assert!(store.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_train_documentation() {
        let (agent, store) = agent();
        let Json(body) = train(
            State(agent),
            Ok(Json(TrainRequest {
                documentation: Some("Fiscal year starts in April.".to_string()),
                ..Default::default()
            })),
        )
        .await
        .unwrap();
        assert_eq!(body["units"], 1);
        assert_eq!(
            store.added.lock().unwrap().as_slice(),
            ["Fiscal year starts in April.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let (agent, _) = agent();
        let err = remove_training_data(
            State(agent),
            Ok(Json(RemoveRequest {
                id: "missing-doc".to_string(),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
