//! Read-only enforcement for generated SQL.
//!
//! SQL produced by the language model (or typed into the web UI) is parsed with
//! the T-SQL dialect before it reaches the database. Anything other than a
//! query is refused with a permission error naming the operation, and so is a
//! query that writes (`SELECT ... INTO`).
//!
//! The fixed catalog queries used for training never pass through here.

use crate::error::{AgentError, AgentResult};
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::Parser;

/// Type of SQL statement detected by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlStatementType {
    /// SELECT, WITH ... SELECT and EXPLAIN of a query
    Select,
    /// INSERT, UPDATE, DELETE, MERGE
    DmlWrite,
    /// CREATE, DROP, ALTER, TRUNCATE
    Ddl,
    /// BEGIN, COMMIT, ROLLBACK, SAVE
    Transaction,
    /// EXEC / EXECUTE
    ProcedureCall,
    /// GRANT, REVOKE, DENY, SET, USE, KILL
    Administrative,
    Unknown,
}

mod error_messages {
    pub const DML_WRITE: &str = "Generated SQL must not modify data.";
    pub const DDL: &str = "Generated SQL must not modify the schema.";
    pub const TRANSACTION: &str = "Generated SQL must not control transactions.";
    pub const PROCEDURE: &str = "Generated SQL must not execute stored procedures.";
    pub const ADMINISTRATIVE: &str = "Administrative statements are not allowed.";
    pub const UNKNOWN: &str = "Unrecognized SQL statement. Only queries are allowed.";
    pub const PARSE_ERROR: &str = "Failed to parse SQL statement.";
}

/// Validate that `sql` only contains read-only statements.
///
/// ```
/// use db_agent::agent::sql_validator::validate_readonly;
///
/// assert!(validate_readonly("SELECT TOP 5 * FROM Orders").is_ok());
/// assert!(validate_readonly("DELETE FROM Orders").is_err());
/// ```
pub fn validate_readonly(sql: &str) -> AgentResult<()> {
    let statements = Parser::parse_sql(&MsSqlDialect {}, sql).map_err(|e| {
        AgentError::invalid_input(format!("{} Error: {}", error_messages::PARSE_ERROR, e))
    })?;

    if statements.is_empty() {
        return Err(AgentError::invalid_input("Empty SQL statement"));
    }

    for stmt in statements {
        validate_statement(&stmt)?;
    }

    Ok(())
}

fn validate_statement(stmt: &Statement) -> AgentResult<()> {
    let (stmt_type, operation_name) = classify_statement(stmt);

    let reason = match stmt_type {
        SqlStatementType::Select => return Ok(()),
        SqlStatementType::DmlWrite => error_messages::DML_WRITE,
        SqlStatementType::Ddl => error_messages::DDL,
        SqlStatementType::Transaction => error_messages::TRANSACTION,
        SqlStatementType::ProcedureCall => error_messages::PROCEDURE,
        SqlStatementType::Administrative => error_messages::ADMINISTRATIVE,
        SqlStatementType::Unknown => error_messages::UNKNOWN,
    };
    Err(AgentError::permission(operation_name, reason))
}

fn classify_statement(stmt: &Statement) -> (SqlStatementType, &'static str) {
    match stmt {
        // =====================================================================
        // Read-only
        // =====================================================================
        Statement::Query(query) => {
            query_write(query).unwrap_or((SqlStatementType::Select, "SELECT"))
        }
        Statement::Explain { statement, .. } => {
            let (inner_type, inner_name) = classify_statement(statement);
            if inner_type == SqlStatementType::Select {
                (SqlStatementType::Select, "EXPLAIN")
            } else {
                (inner_type, inner_name)
            }
        }

        // =====================================================================
        // DML writes
        // =====================================================================
        Statement::Insert(_) => (SqlStatementType::DmlWrite, "INSERT"),
        Statement::Update { .. } => (SqlStatementType::DmlWrite, "UPDATE"),
        Statement::Delete(_) => (SqlStatementType::DmlWrite, "DELETE"),
        Statement::Merge { .. } => (SqlStatementType::DmlWrite, "MERGE"),

        // =====================================================================
        // DDL
        // =====================================================================
        Statement::CreateTable { .. } => (SqlStatementType::Ddl, "CREATE TABLE"),
        Statement::CreateView { .. } => (SqlStatementType::Ddl, "CREATE VIEW"),
        Statement::CreateIndex(_) => (SqlStatementType::Ddl, "CREATE INDEX"),
        Statement::CreateSchema { .. } => (SqlStatementType::Ddl, "CREATE SCHEMA"),
        Statement::CreateDatabase { .. } => (SqlStatementType::Ddl, "CREATE DATABASE"),
        Statement::CreateSequence { .. } => (SqlStatementType::Ddl, "CREATE SEQUENCE"),
        Statement::CreateFunction { .. } => (SqlStatementType::Ddl, "CREATE FUNCTION"),
        Statement::CreateProcedure { .. } => (SqlStatementType::Ddl, "CREATE PROCEDURE"),
        Statement::CreateTrigger { .. } => (SqlStatementType::Ddl, "CREATE TRIGGER"),
        Statement::CreateRole { .. } => (SqlStatementType::Ddl, "CREATE ROLE"),
        Statement::AlterTable { .. } => (SqlStatementType::Ddl, "ALTER TABLE"),
        Statement::AlterView { .. } => (SqlStatementType::Ddl, "ALTER VIEW"),
        Statement::AlterIndex { .. } => (SqlStatementType::Ddl, "ALTER INDEX"),
        Statement::AlterRole { .. } => (SqlStatementType::Ddl, "ALTER ROLE"),
        Statement::Drop { .. } => (SqlStatementType::Ddl, "DROP"),
        Statement::DropFunction { .. } => (SqlStatementType::Ddl, "DROP FUNCTION"),
        Statement::DropProcedure { .. } => (SqlStatementType::Ddl, "DROP PROCEDURE"),
        Statement::DropTrigger { .. } => (SqlStatementType::Ddl, "DROP TRIGGER"),
        Statement::Truncate { .. } => (SqlStatementType::Ddl, "TRUNCATE"),

        // =====================================================================
        // Transaction control
        // =====================================================================
        Statement::StartTransaction { .. } => (SqlStatementType::Transaction, "BEGIN"),
        Statement::Commit { .. } => (SqlStatementType::Transaction, "COMMIT"),
        Statement::Rollback { .. } => (SqlStatementType::Transaction, "ROLLBACK"),
        Statement::Savepoint { .. } => (SqlStatementType::Transaction, "SAVE TRANSACTION"),

        // =====================================================================
        // Procedure calls
        // =====================================================================
        Statement::Execute { .. } => (SqlStatementType::ProcedureCall, "EXECUTE"),
        Statement::Call { .. } => (SqlStatementType::ProcedureCall, "CALL"),

        // =====================================================================
        // Administrative
        // =====================================================================
        Statement::Grant { .. } => (SqlStatementType::Administrative, "GRANT"),
        Statement::Revoke { .. } => (SqlStatementType::Administrative, "REVOKE"),
        Statement::Deny { .. } => (SqlStatementType::Administrative, "DENY"),
        Statement::Set(_) => (SqlStatementType::Administrative, "SET"),
        Statement::Use(_) => (SqlStatementType::Administrative, "USE"),
        Statement::Kill { .. } => (SqlStatementType::Administrative, "KILL"),

        _ => (SqlStatementType::Unknown, "Unknown"),
    }
}

/// Find a write hidden inside a query: T-SQL `SELECT ... INTO` creates a table,
/// and CTE or set-operation branches may carry DML.
fn query_write(query: &Query) -> Option<(SqlStatementType, &'static str)> {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            if let Some(found) = query_write(&cte.query) {
                return Some(found);
            }
        }
    }
    set_expr_write(&query.body)
}

fn set_expr_write(body: &SetExpr) -> Option<(SqlStatementType, &'static str)> {
    match body {
        SetExpr::Select(select) if select.into.is_some() => {
            Some((SqlStatementType::Ddl, "SELECT INTO"))
        }
        SetExpr::Select(_) | SetExpr::Values(_) | SetExpr::Table(_) => None,
        SetExpr::Query(query) => query_write(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_write(left).or_else(|| set_expr_write(right))
        }
        SetExpr::Insert(_) => Some((SqlStatementType::DmlWrite, "INSERT")),
        SetExpr::Update(_) => Some((SqlStatementType::DmlWrite, "UPDATE")),
        SetExpr::Delete(_) => Some((SqlStatementType::DmlWrite, "DELETE")),
        SetExpr::Merge(_) => Some((SqlStatementType::DmlWrite, "MERGE")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_ok() {
        assert!(validate_readonly("SELECT * FROM Customers").is_ok());
        assert!(validate_readonly("SELECT TOP 10 Name FROM dbo.Customers ORDER BY Name").is_ok());
    }

    #[test]
    fn test_cte_ok() {
        let sql = "WITH recent AS (SELECT * FROM Orders WHERE OrderDate > '2024-01-01') \
                   SELECT COUNT(*) FROM recent";
        assert!(validate_readonly(sql).is_ok());
    }

    #[test]
    fn test_bracketed_identifiers_ok() {
        assert!(validate_readonly("SELECT [Order ID] FROM [dbo].[Order Lines]").is_ok());
    }

    #[test]
    fn test_insert_blocked() {
        let err = validate_readonly("INSERT INTO Customers VALUES (1)").unwrap_err();
        assert!(matches!(err, AgentError::Permission { .. }));
        assert!(err.to_string().contains("INSERT"));
    }

    #[test]
    fn test_update_and_delete_blocked() {
        assert!(validate_readonly("UPDATE Customers SET Name = 'x'").is_err());
        assert!(validate_readonly("DELETE FROM Customers WHERE Id = 1").is_err());
    }

    #[test]
    fn test_ddl_blocked() {
        let err = validate_readonly("DROP TABLE Customers").unwrap_err();
        assert!(err.to_string().contains("schema"));
        assert!(validate_readonly("CREATE TABLE t (id INT)").is_err());
    }

    #[test]
    fn test_select_into_table_blocked() {
        let err = validate_readonly("SELECT * INTO dbo.Stolen FROM dbo.Customers").unwrap_err();
        assert!(matches!(err, AgentError::Permission { .. }));
        assert!(err.to_string().contains("SELECT INTO"));
    }

    #[test]
    fn test_select_into_temp_table_blocked() {
        let err = validate_readonly("SELECT Id INTO #tmp FROM dbo.Customers").unwrap_err();
        assert!(matches!(err, AgentError::Permission { .. }));
    }

    #[test]
    fn test_select_into_inside_union_blocked() {
        let sql = "SELECT Id FROM dbo.Orders UNION ALL SELECT Id INTO #ids FROM dbo.Customers";
        assert!(validate_readonly(sql).is_err());
    }

    #[test]
    fn test_union_ok() {
        assert!(validate_readonly("SELECT Id FROM dbo.Orders UNION SELECT Id FROM dbo.Customers").is_ok());
    }

    #[test]
    fn test_multiple_statements_blocked() {
        assert!(validate_readonly("SELECT 1; DELETE FROM Customers").is_err());
    }

    #[test]
    fn test_unparseable_is_invalid_input() {
        let err = validate_readonly("I cannot answer that question.").unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput { .. }));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(validate_readonly("").is_err());
    }
}
