//! Tests against a real SQL Server.
//!
//! Set TEST_MSSQL_CONNECTION to an ADO-style connection string (for example
//! `Server=tcp:localhost,1433;User Id=sa;Password=...;TrustServerCertificate=true`)
//! to run them; otherwise they are skipped.

use db_agent::db::{MetadataSource, MssqlClient, SchemaInspector, SqlRunner};
use serde_json::json;
use std::sync::Arc;

async fn connect() -> Option<Arc<MssqlClient>> {
    let connection_string = match std::env::var("TEST_MSSQL_CONNECTION") {
        Ok(s) => s,
        Err(_) => {
            eprintln!("Skipping test: TEST_MSSQL_CONNECTION not set");
            return None;
        }
    };
    Some(Arc::new(
        MssqlClient::connect(&connection_string)
            .await
            .expect("Failed to connect to SQL Server"),
    ))
}

#[tokio::test]
async fn test_mssql_select_values() {
    let Some(client) = connect().await else {
        return;
    };

    let result = client
        .run_sql("SELECT 1 AS one, N'héllo' AS greeting, CAST(NULL AS INT) AS nothing, CAST(1 AS BIT) AS flag")
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["one", "greeting", "nothing", "flag"]);
    assert_eq!(result.len(), 1);
    let row = &result.rows[0];
    assert_eq!(row["one"], json!(1));
    assert_eq!(row["greeting"], json!("héllo"));
    assert_eq!(row["nothing"], json!(null));
    assert_eq!(row["flag"], json!(true));
}

#[tokio::test]
async fn test_mssql_empty_result_keeps_columns() {
    let Some(client) = connect().await else {
        return;
    };

    let result = client
        .run_sql("SELECT name FROM sys.objects WHERE 1 = 0")
        .await
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.columns, vec!["name"]);
}

#[tokio::test]
async fn test_mssql_catalog_queries_run() {
    let Some(client) = connect().await else {
        return;
    };
    let inspector = SchemaInspector::new(client);

    let columns = inspector.information_schema().await.unwrap();
    assert!(columns.find_column("TABLE_NAME").is_some());

    inspector.fk_relationships().await.unwrap();
    inspector.constraints().await.unwrap();
    let views = inspector.view_definitions().await.unwrap();
    assert!(views.iter().all(|v| v.view_name != "database_firewall_rules"));
    inspector.stored_procedures().await.unwrap();
}

#[tokio::test]
async fn test_mssql_error_propagates() {
    let Some(client) = connect().await else {
        return;
    };

    let err = client
        .run_sql("SELECT * FROM table_that_does_not_exist_42")
        .await
        .unwrap_err();
    assert!(matches!(err, db_agent::AgentError::Database(_)));
}
