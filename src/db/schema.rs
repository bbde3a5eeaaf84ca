//! Schema introspection module.
//!
//! Reads SQL Server catalog metadata through a [`SqlRunner`]: the full column
//! listing, foreign-key edges, column constraints, view definitions and stored
//! procedure definitions. Every statement is fixed, parameter-free and
//! read-only; errors from the driver propagate unchanged.

use crate::db::SqlRunner;
use crate::error::AgentResult;
use crate::models::{
    ConstraintRow, ForeignKeyRow, ProcedureDefinitionRow, ResultSet, ViewDefinitionRow,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Source of schema metadata consumed by the training pipeline.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Every row of `INFORMATION_SCHEMA.COLUMNS`, unfiltered.
    async fn information_schema(&self) -> AgentResult<ResultSet>;

    /// Foreign-key edges ordered by (constraint name, parent table, referenced table).
    async fn fk_relationships(&self) -> AgentResult<Vec<ForeignKeyRow>>;

    /// Column constraints ordered by (table name, column name).
    async fn constraints(&self) -> AgentResult<Vec<ConstraintRow>>;

    /// View definitions ordered by view name.
    async fn view_definitions(&self) -> AgentResult<Vec<ViewDefinitionRow>>;

    /// Stored procedure definitions ordered by procedure name.
    async fn stored_procedures(&self) -> AgentResult<Vec<ProcedureDefinitionRow>>;
}

// =============================================================================
// SQL Query Templates
// =============================================================================

pub mod queries {
    pub const INFORMATION_SCHEMA: &str = "SELECT * FROM INFORMATION_SCHEMA.COLUMNS";

    pub const FK_RELATIONSHIPS: &str = r#"
        SELECT
            fk.name AS FK_name,
            tp.name AS parent_table,
            c1.name AS parent_column,
            ref.name AS referenced_table,
            c2.name AS referenced_column
        FROM sys.foreign_keys AS fk
        INNER JOIN sys.foreign_key_columns AS fkc
            ON fk.object_id = fkc.constraint_object_id
        INNER JOIN sys.tables AS tp
            ON fkc.parent_object_id = tp.object_id
        INNER JOIN sys.tables AS ref
            ON fkc.referenced_object_id = ref.object_id
        INNER JOIN sys.columns AS c1
            ON fkc.parent_column_id = c1.column_id
            AND c1.object_id = tp.object_id
        INNER JOIN sys.columns AS c2
            ON fkc.referenced_column_id = c2.column_id
            AND c2.object_id = ref.object_id
        ORDER BY fk.name, tp.name, ref.name
        "#;

    // Joins on table and column name only; two schemas sharing a table name
    // can cross-match.
    pub const CONSTRAINTS: &str = r#"
        SELECT
            t.TABLE_SCHEMA,
            t.TABLE_NAME,
            c.COLUMN_NAME,
            tc.CONSTRAINT_TYPE
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS AS tc
        JOIN INFORMATION_SCHEMA.CONSTRAINT_COLUMN_USAGE AS ccu
            ON tc.CONSTRAINT_NAME = ccu.CONSTRAINT_NAME
        JOIN INFORMATION_SCHEMA.COLUMNS AS c
            ON c.TABLE_NAME = ccu.TABLE_NAME
            AND c.COLUMN_NAME = ccu.COLUMN_NAME
        JOIN INFORMATION_SCHEMA.TABLES AS t
            ON t.TABLE_NAME = c.TABLE_NAME
        ORDER BY t.TABLE_NAME, c.COLUMN_NAME
        "#;

    pub const VIEW_DEFINITIONS: &str = r#"
        SELECT
            v.name AS ViewName,
            m.definition
        FROM sys.views AS v
        JOIN sys.sql_modules AS m
            ON v.object_id = m.object_id
        WHERE v.name NOT IN ('database_firewall_rules')
        ORDER BY v.name
        "#;

    pub const STORED_PROCEDURES: &str = r#"
        SELECT
            p.name AS ProcedureName,
            m.definition AS ProcedureDefinition
        FROM sys.procedures AS p
        JOIN sys.sql_modules AS m
            ON p.object_id = m.object_id
        ORDER BY p.name
        "#;
}

/// Schema inspector for SQL Server catalog introspection.
#[derive(Clone)]
pub struct SchemaInspector {
    runner: Arc<dyn SqlRunner>,
}

impl SchemaInspector {
    pub fn new(runner: Arc<dyn SqlRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl MetadataSource for SchemaInspector {
    async fn information_schema(&self) -> AgentResult<ResultSet> {
        let result = self.runner.run_sql(queries::INFORMATION_SCHEMA).await?;
        debug!(rows = result.len(), "Read information schema");
        Ok(result)
    }

    async fn fk_relationships(&self) -> AgentResult<Vec<ForeignKeyRow>> {
        let result = self.runner.run_sql(queries::FK_RELATIONSHIPS).await?;
        let rows = result
            .rows
            .iter()
            .map(ForeignKeyRow::from_record)
            .collect::<Vec<_>>();
        debug!(count = rows.len(), "Read foreign keys");
        Ok(rows)
    }

    async fn constraints(&self) -> AgentResult<Vec<ConstraintRow>> {
        let result = self.runner.run_sql(queries::CONSTRAINTS).await?;
        let rows = result
            .rows
            .iter()
            .map(ConstraintRow::from_record)
            .collect::<Vec<_>>();
        debug!(count = rows.len(), "Read constraints");
        Ok(rows)
    }

    async fn view_definitions(&self) -> AgentResult<Vec<ViewDefinitionRow>> {
        let result = self.runner.run_sql(queries::VIEW_DEFINITIONS).await?;
        let rows = result
            .rows
            .iter()
            .map(ViewDefinitionRow::from_record)
            .collect::<Vec<_>>();
        debug!(count = rows.len(), "Read view definitions");
        Ok(rows)
    }

    async fn stored_procedures(&self) -> AgentResult<Vec<ProcedureDefinitionRow>> {
        let result = self.runner.run_sql(queries::STORED_PROCEDURES).await?;
        let rows = result
            .rows
            .iter()
            .map(ProcedureDefinitionRow::from_record)
            .collect::<Vec<_>>();
        debug!(count = rows.len(), "Read stored procedures");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns canned results keyed by statement and records what it ran.
    struct CannedRunner {
        results: Vec<(&'static str, ResultSet)>,
        executed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SqlRunner for CannedRunner {
        async fn run_sql(&self, sql: &str) -> AgentResult<ResultSet> {
            self.executed.lock().unwrap().push(sql.to_string());
            self.results
                .iter()
                .find(|(q, _)| *q == sql)
                .map(|(_, rs)| rs.clone())
                .ok_or_else(|| AgentError::invalid_input("unexpected statement"))
        }
    }

    fn result(columns: &[&str], rows: Vec<serde_json::Value>) -> ResultSet {
        ResultSet::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter()
                .map(|r| r.as_object().cloned().unwrap())
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_fk_relationships_preserve_order() {
        let runner = Arc::new(CannedRunner {
            results: vec![(
                queries::FK_RELATIONSHIPS,
                result(
                    &["FK_name", "parent_table", "parent_column", "referenced_table", "referenced_column"],
                    vec![
                        json!({"FK_name": "FK_A", "parent_table": "Orders", "parent_column": "CustomerID", "referenced_table": "Customers", "referenced_column": "ID"}),
                        json!({"FK_name": "FK_B", "parent_table": "Lines", "parent_column": "OrderID", "referenced_table": "Orders", "referenced_column": "ID"}),
                    ],
                ),
            )],
            executed: Mutex::new(Vec::new()),
        });
        let inspector = SchemaInspector::new(runner.clone());

        let rows = inspector.fk_relationships().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fk_name, "FK_A");
        assert_eq!(rows[1].parent_table, "Lines");
        assert_eq!(runner.executed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_view_definitions_extract_query_body() {
        let runner = Arc::new(CannedRunner {
            results: vec![(
                queries::VIEW_DEFINITIONS,
                result(
                    &["ViewName", "definition"],
                    vec![json!({"ViewName": "v1", "definition": "CREATE VIEW v1 AS SELECT 1"})],
                ),
            )],
            executed: Mutex::new(Vec::new()),
        });
        let inspector = SchemaInspector::new(runner);

        let views = inspector.view_definitions().await.unwrap();
        assert_eq!(views[0].view_query, " SELECT 1");
    }

    #[tokio::test]
    async fn test_empty_results() {
        let runner = Arc::new(CannedRunner {
            results: vec![
                (queries::CONSTRAINTS, ResultSet::default()),
                (queries::STORED_PROCEDURES, ResultSet::default()),
            ],
            executed: Mutex::new(Vec::new()),
        });
        let inspector = SchemaInspector::new(runner);

        assert!(inspector.constraints().await.unwrap().is_empty());
        assert!(inspector.stored_procedures().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let runner = Arc::new(CannedRunner {
            results: vec![],
            executed: Mutex::new(Vec::new()),
        });
        let inspector = SchemaInspector::new(runner);

        let err = inspector.information_schema().await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput { .. }));
    }

    #[test]
    fn test_view_query_excludes_firewall_rules() {
        assert!(queries::VIEW_DEFINITIONS.contains("'database_firewall_rules'"));
        assert!(queries::VIEW_DEFINITIONS.contains("ORDER BY v.name"));
    }
}
