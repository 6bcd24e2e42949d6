//! SQL generation seam and response handling.
//!
//! The LLM call itself lives outside this crate behind [`SqlGenerator`];
//! providers return free-form text, so the prompt template and the response
//! parser live here where the report pipeline can test them. Whatever comes
//! back is untrusted and goes through the safety gate before execution.

use crate::error::GenResult;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request for SQL generation from a natural-language prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlGenerationRequest {
    /// The user's natural-language question.
    pub prompt: String,
    /// Database schema description given to the model.
    pub schema: String,
    /// Optional CRM module hint (e.g. "donations").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

/// A candidate SQL statement produced by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlGeneration {
    pub sql: String,
    pub explanation: String,
    pub confidence: f64,
}

/// Async seam over the text-generation provider.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    /// Produces a candidate SQL string for the request.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Provider`](crate::error::GenerationError::Provider)
    /// if the provider call fails.
    async fn generate_sql(&self, request: &SqlGenerationRequest) -> GenResult<SqlGeneration>;
}

/// Regex for locating a JSON object in a model response.
static JSON_OBJECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid regex: JSON object pattern"));

/// Regex for a fenced `sql` code block.
static SQL_FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```sql\n(.*?)\n```").expect("Invalid regex: SQL fence pattern"));

/// Build the provider prompt for a generation request.
pub fn build_prompt(request: &SqlGenerationRequest) -> String {
    let module_line = request
        .module
        .as_deref()
        .map(|m| format!("CRM Module: {m}\n\n"))
        .unwrap_or_default();

    format!(
        "You are a SQL expert for a CRM system. Generate a safe, read-only SQL query \
based on the user's request.\n\n\
Database Schema:\n{schema}\n\n\
{module_line}User Request: {prompt}\n\n\
IMPORTANT RULES:\n\
1. Only generate SELECT statements (read-only)\n\
2. Never include INSERT, UPDATE, DELETE, DROP, or other modifying statements\n\
3. Always include proper WHERE clauses for tenant isolation\n\
4. Use proper SQL syntax for PostgreSQL\n\
5. Include LIMIT clauses to prevent large result sets\n\
6. Explain what the query does\n\n\
Respond in this JSON format:\n\
{{\n  \"sql\": \"SELECT ...\",\n  \"explanation\": \"This query...\",\n  \"confidence\": 0.95\n}}\n",
        schema = request.schema,
        prompt = request.prompt,
    )
}

/// Parse a provider response into a [`SqlGeneration`].
///
/// JSON-object-first; falls back to a fenced `sql` code block, then to the
/// raw trimmed text. Never fails: the output is untrusted either way and the
/// safety gate decides what happens to it.
pub fn parse_generation(content: &str) -> SqlGeneration {
    if let Some(object) = JSON_OBJECT_REGEX.find(content) {
        if let Ok(value) = serde_json::from_str::<Value>(object.as_str()) {
            return SqlGeneration {
                sql: value
                    .get("sql")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                explanation: value
                    .get("explanation")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                confidence: value.get("confidence").and_then(Value::as_f64).unwrap_or(0.5),
            };
        }
    }

    let sql = SQL_FENCE_REGEX
        .captures(content)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| content.trim().to_string());

    SqlGeneration {
        sql,
        explanation: "Generated SQL query".to_string(),
        confidence: 0.7,
    }
}
