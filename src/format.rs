//! Text rendering of result sets.
//!
//! Markdown tables feed the training plan; ASCII tables are printed by the
//! `ask` command.

use crate::models::ResultSet;
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

fn cell(result: &ResultSet, row: usize, column: &str) -> JsonValue {
    result.rows[row]
        .get(column)
        .cloned()
        .unwrap_or(JsonValue::Null)
}

/// Render as an ASCII table in the style of the MySQL CLI.
pub fn format_as_table(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "Empty set".to_string();
    }

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.width()).collect();
    for row in 0..result.rows.len() {
        for (i, col) in result.columns.iter().enumerate() {
            widths[i] = widths[i].max(format_value(&cell(result, row, col)).width());
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {} ", pad(col, *w, false)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in 0..result.rows.len() {
        let row_str: String = result
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| {
                let value = cell(result, row, col);
                let right = matches!(value, JsonValue::Number(_));
                format!("| {} ", pad(&format_value(&value), *w, right))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_text = if result.len() == 1 { "row" } else { "rows" };
    output.push_str(&format!("{} {} in set\n", result.len(), row_text));

    output
}

/// Pad by display width; `format!` width counts chars, which misaligns CJK text.
fn pad(text: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    if right_align {
        format!("{}{}", fill, text)
    } else {
        format!("{}{}", text, fill)
    }
}

/// Render as a markdown table (no trailing row count).
pub fn format_as_markdown(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "*Empty set*".to_string();
    }

    let mut output = String::new();

    let header: String = result
        .columns
        .iter()
        .map(|c| format!("| {} ", c))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = result.columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in 0..result.rows.len() {
        let row_str: String = result
            .columns
            .iter()
            .map(|col| format!("| {} ", format_value(&cell(result, row, col))))
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output
}
