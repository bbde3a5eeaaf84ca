//! Natural-language documentation sentences built from schema metadata rows.
//!
//! Every function here is pure: one sentence per input row, in input order,
//! with identifiers interpolated verbatim.

use crate::models::{ConstraintRow, ForeignKeyRow};

/// Marker that separates a view header from its query body.
const VIEW_BODY_MARKER: &str = " AS";

/// Describe how to join along one foreign-key edge.
pub fn fk_sentence(row: &ForeignKeyRow) -> String {
    format!(
        "You can join table {parent} with {referenced} using the key {parent_col} from {parent} and the key {referenced_col} from {referenced}.",
        parent = row.parent_table,
        referenced = row.referenced_table,
        parent_col = row.parent_column,
        referenced_col = row.referenced_column,
    )
}

/// Describe one column constraint.
pub fn constraint_sentence(row: &ConstraintRow) -> String {
    format!(
        "Table {} in schema {} has a {} constraint on column {}.",
        row.table_name, row.table_schema, row.constraint_type, row.column_name
    )
}

pub fn fk_sentences(rows: &[ForeignKeyRow]) -> Vec<String> {
    rows.iter().map(fk_sentence).collect()
}

pub fn constraint_sentences(rows: &[ConstraintRow]) -> Vec<String> {
    rows.iter().map(constraint_sentence).collect()
}

/// All FK sentences as one newline-separated documentation blob.
pub fn fk_documentation(rows: &[ForeignKeyRow]) -> String {
    fk_sentences(rows).join("\n")
}

/// Return the part of a view definition strictly after the first literal ` AS`.
///
/// This is a text search, not a SQL parse. When the marker is absent the
/// result matches `SUBSTRING(def, CHARINDEX(' AS', def) + 3, LEN(def))` with
/// `CHARINDEX` returning 0: the definition minus its first two characters.
pub fn extract_view_query(definition: &str) -> &str {
    match definition.find(VIEW_BODY_MARKER) {
        Some(pos) => &definition[pos + VIEW_BODY_MARKER.len()..],
        None => {
            let skip = definition
                .char_indices()
                .nth(2)
                .map(|(i, _)| i)
                .unwrap_or(definition.len());
            &definition[skip..]
        }
    }
}
