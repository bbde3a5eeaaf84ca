//! Schema metadata rows read from SQL Server catalog views.
//!
//! Each type decodes itself from a generic [`Record`] by the column aliases
//! used in the introspection queries.

use crate::models::query::{Record, record_text};
use serde::{Deserialize, Serialize};

/// One single-column foreign-key edge. Multi-column keys appear as several rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRow {
    pub fk_name: String,
    pub parent_table: String,
    pub parent_column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKeyRow {
    pub fn new(
        parent_table: impl Into<String>,
        parent_column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            fk_name: String::new(),
            parent_table: parent_table.into(),
            parent_column: parent_column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
        }
    }

    /// Set the constraint name.
    pub fn with_name(mut self, fk_name: impl Into<String>) -> Self {
        self.fk_name = fk_name.into();
        self
    }

    pub fn from_record(record: &Record) -> Self {
        Self {
            fk_name: record_text(record, "FK_name"),
            parent_table: record_text(record, "parent_table"),
            parent_column: record_text(record, "parent_column"),
            referenced_table: record_text(record, "referenced_table"),
            referenced_column: record_text(record, "referenced_column"),
        }
    }
}

/// One (table, column, constraint type) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRow {
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
    /// e.g. `PRIMARY KEY`, `UNIQUE`, `CHECK`, `FOREIGN KEY`
    pub constraint_type: String,
}

impl ConstraintRow {
    pub fn new(
        table_schema: impl Into<String>,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        constraint_type: impl Into<String>,
    ) -> Self {
        Self {
            table_schema: table_schema.into(),
            table_name: table_name.into(),
            column_name: column_name.into(),
            constraint_type: constraint_type.into(),
        }
    }

    pub fn from_record(record: &Record) -> Self {
        Self {
            table_schema: record_text(record, "TABLE_SCHEMA"),
            table_name: record_text(record, "TABLE_NAME"),
            column_name: record_text(record, "COLUMN_NAME"),
            constraint_type: record_text(record, "CONSTRAINT_TYPE"),
        }
    }
}

/// A view with its full definition and the query body that follows the first ` AS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinitionRow {
    pub view_name: String,
    pub definition: String,
    pub view_query: String,
}

impl ViewDefinitionRow {
    /// Build a row from a name and definition, extracting the query body.
    pub fn new(view_name: impl Into<String>, definition: impl Into<String>) -> Self {
        let definition = definition.into();
        let view_query = crate::training::sentences::extract_view_query(&definition).to_string();
        Self {
            view_name: view_name.into(),
            definition,
            view_query,
        }
    }

    pub fn from_record(record: &Record) -> Self {
        Self::new(
            record_text(record, "ViewName"),
            record_text(record, "definition"),
        )
    }
}

/// A stored procedure and its full, unsplit definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureDefinitionRow {
    pub procedure_name: String,
    pub definition: String,
}

impl ProcedureDefinitionRow {
    pub fn new(procedure_name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            procedure_name: procedure_name.into(),
            definition: definition.into(),
        }
    }

    pub fn from_record(record: &Record) -> Self {
        Self::new(
            record_text(record, "ProcedureName"),
            record_text(record, "ProcedureDefinition"),
        )
    }
}
