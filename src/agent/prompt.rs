//! Prompt construction and response parsing for SQL generation.

use crate::llm::ChatMessage;
use crate::models::QuestionSql;
use regex::Regex;
use std::sync::LazyLock;

/// SQL dialect named in every prompt.
pub const DIALECT: &str = "T-SQL / Microsoft SQL Server";

/// Rough upper bound on system prompt size, at about four characters per token.
pub const MAX_PROMPT_CHARS: usize = 14_000 * 4;

static FENCED_SQL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:sql)?\s*\n(.*?)```").expect("valid regex"));
static CTE_SQL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\bWITH\b\s.*?;").expect("valid regex"));
static SELECT_SQL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\bSELECT\b.*?;").expect("valid regex"));

/// Build the chat prompt for turning `question` into SQL.
///
/// The system message carries retrieved DDL and documentation (items that
/// would overflow the character budget are skipped) followed by the response
/// guidelines.
/// Retrieved question/SQL pairs follow as user/assistant turns, and the
/// question itself comes last.
pub fn sql_prompt(
    question: &str,
    question_sql: &[QuestionSql],
    ddl: &[String],
    documentation: &[String],
) -> Vec<ChatMessage> {
    let mut system = format!(
        "You are a {} expert. Please help to generate a SQL query to answer the question. \
         Your response should ONLY be based on the given context and follow the response \
         guidelines and format instructions. ",
        DIALECT
    );

    append_section(&mut system, "\n===Tables \n", ddl);
    append_section(&mut system, "\n===Additional Context \n\n", documentation);

    system.push_str("===Response Guidelines \n");
    system.push_str(
        "1. If the provided context is sufficient, please generate a valid SQL query \
         without any explanations for the question. \n",
    );
    system.push_str(
        "2. If the provided context is insufficient, please explain why it can't be generated. \n",
    );
    system.push_str("3. Please use the most relevant table(s). \n");
    system.push_str(
        "4. If the question has been asked and answered before, please repeat the answer \
         exactly as it was given before. \n",
    );
    system.push_str(&format!(
        "5. Ensure that the output SQL is {}-compliant and executable, and free of syntax errors. \n",
        DIALECT
    ));

    let mut messages = vec![ChatMessage::system(system)];
    for example in question_sql {
        messages.push(ChatMessage::user(&example.question));
        messages.push(ChatMessage::assistant(&example.sql));
    }
    messages.push(ChatMessage::user(question));
    messages
}

fn append_section(prompt: &mut String, header: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    prompt.push_str(header);
    for item in items {
        if prompt.len() + item.len() + 2 > MAX_PROMPT_CHARS {
            continue;
        }
        prompt.push_str(item);
        prompt.push_str("\n\n");
    }
}

/// Prompt asking the model which business question `sql` answers.
pub fn question_prompt(sql: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "The user will give you SQL and you will try to guess what the business question \
             this query is answering. Return just the question without any additional \
             explanation. Do not reference the table name in the question.",
        ),
        ChatMessage::user(sql),
    ]
}

/// Pull the SQL statement out of a model reply.
///
/// Tries, in order: the last fenced code block, the last `WITH ... ;`, the
/// last `SELECT ... ;`. Falls back to the trimmed reply.
pub fn extract_sql(response: &str) -> String {
    for pattern in [&*FENCED_SQL, &*CTE_SQL, &*SELECT_SQL] {
        if let Some(found) = pattern.captures_iter(response).last() {
            let text = found.get(1).or_else(|| found.get(0));
            if let Some(text) = text {
                return text.as_str().trim().to_string();
            }
        }
    }
    response.trim().to_string()
}
