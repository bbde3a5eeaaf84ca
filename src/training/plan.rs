//! Training plan synthesis from `INFORMATION_SCHEMA.COLUMNS`.
//!
//! Rows are grouped by (catalog, schema, table) in first-seen order. Each
//! table becomes one information-schema item whose value is a short header
//! followed by a markdown table of that table's column rows.

use crate::format::format_as_markdown;
use crate::models::{PlanItemType, ResultSet, TrainingPlan, TrainingPlanItem, record_text};
use tracing::{debug, warn};

const CATALOG_COLUMN: &str = "table_catalog";
const SCHEMA_COLUMN: &str = "table_schema";
const TABLE_COLUMN: &str = "table_name";

/// Build a training plan from the full column-schema result set.
pub fn build_training_plan(information_schema: &ResultSet) -> TrainingPlan {
    let (Some(catalog_col), Some(schema_col), Some(table_col)) = (
        information_schema.find_column(CATALOG_COLUMN),
        information_schema.find_column(SCHEMA_COLUMN),
        information_schema.find_column(TABLE_COLUMN),
    ) else {
        warn!(
            columns = ?information_schema.columns,
            "Information schema is missing catalog/schema/table columns, training plan is empty"
        );
        return TrainingPlan::default();
    };

    // (catalog, schema, table) -> row indexes, in first-seen order
    let mut groups: Vec<((String, String, String), Vec<usize>)> = Vec::new();
    for (idx, row) in information_schema.rows.iter().enumerate() {
        let key = (
            record_text(row, catalog_col),
            record_text(row, schema_col),
            record_text(row, table_col),
        );
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, rows)) => rows.push(idx),
            None => groups.push((key, vec![idx])),
        }
    }

    let items = groups
        .into_iter()
        .map(|((catalog, schema, table), indexes)| {
            let table_rows = ResultSet::new(
                information_schema.columns.clone(),
                indexes
                    .iter()
                    .map(|&i| information_schema.rows[i].clone())
                    .collect(),
            );
            let doc = format!(
                "The following columns are in the {} table in the {} database:\n\n{}",
                table,
                catalog,
                format_as_markdown(&table_rows)
            );
            TrainingPlanItem {
                item_type: PlanItemType::InformationSchema,
                item_group: format!("{}.{}", catalog, schema),
                item_name: table,
                item_value: doc,
            }
        })
        .collect::<Vec<_>>();

    debug!(tables = items.len(), "Built training plan");
    TrainingPlan::new(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column_row(catalog: &str, schema: &str, table: &str, column: &str) -> crate::models::Record {
        json!({
            "TABLE_CATALOG": catalog,
            "TABLE_SCHEMA": schema,
            "TABLE_NAME": table,
            "COLUMN_NAME": column,
            "DATA_TYPE": "int",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn columns() -> Vec<String> {
        ["TABLE_CATALOG", "TABLE_SCHEMA", "TABLE_NAME", "COLUMN_NAME", "DATA_TYPE"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_one_item_per_table_in_first_seen_order() {
        let rs = ResultSet::new(
            columns(),
            vec![
                column_row("Sales", "dbo", "Orders", "ID"),
                column_row("Sales", "dbo", "Customers", "ID"),
                column_row("Sales", "dbo", "Orders", "CustomerID"),
            ],
        );
        let plan = build_training_plan(&rs);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.items[0].item_name, "Orders");
        assert_eq!(plan.items[0].item_group, "Sales.dbo");
        assert_eq!(plan.items[0].item_type, PlanItemType::InformationSchema);
        assert_eq!(plan.items[1].item_name, "Customers");
    }

    #[test]
    fn test_item_value_contains_every_column_row() {
        let rs = ResultSet::new(
            columns(),
            vec![
                column_row("Sales", "dbo", "Orders", "ID"),
                column_row("Sales", "dbo", "Orders", "CustomerID"),
            ],
        );
        let plan = build_training_plan(&rs);
        let value = &plan.items[0].item_value;
        assert!(value.starts_with(
            "The following columns are in the Orders table in the Sales database:\n\n"
        ));
        assert!(value.contains("| Sales | dbo | Orders | ID | int |"));
        assert!(value.contains("| Sales | dbo | Orders | CustomerID | int |"));
    }

    #[test]
    fn test_same_table_name_in_two_schemas_stays_separate() {
        let rs = ResultSet::new(
            columns(),
            vec![
                column_row("Sales", "dbo", "Orders", "ID"),
                column_row("Sales", "archive", "Orders", "ID"),
            ],
        );
        let plan = build_training_plan(&rs);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.items[1].item_group, "Sales.archive");
    }

    #[test]
    fn test_missing_grouping_columns_yields_empty_plan() {
        let rs = ResultSet::new(
            vec!["COLUMN_NAME".to_string()],
            vec![json!({"COLUMN_NAME": "ID"}).as_object().cloned().unwrap()],
        );
        assert!(build_training_plan(&rs).is_empty());
    }

    #[test]
    fn test_empty_schema_yields_empty_plan() {
        let rs = ResultSet::new(columns(), vec![]);
        assert!(build_training_plan(&rs).is_empty());
    }
}
