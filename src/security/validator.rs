//! SQL safety gate for report queries.
//!
//! Classifies untrusted SQL text (LLM-generated or user-saved) as safe or
//! unsafe to execute against the shared multi-tenant store, and returns the
//! complete list of problems plus a sanitized form of accepted queries.
//!
//! This is pattern matching over normalized text, not a SQL parser: generated
//! SQL is free-form and a strict grammar would reject too much valid input.
//! The database-level tenant-scoped session (RLS) remains the authoritative
//! second isolation layer; a text gate alone is never relied on.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default result-row cap for report queries.
pub const DEFAULT_MAX_ROWS: u64 = 1000;

/// Default statement timeout budget. Informational for the validator;
/// enforced by the executor.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// DDL/DML vocabulary rejected regardless of context.
pub const DEFAULT_FORBIDDEN_KEYWORDS: [&str; 20] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "EXEC", "EXECUTE", "CALL", "MERGE", "UPSERT", "COPY", "LOAD", "IMPORT", "EXPORT", "BACKUP",
    "RESTORE",
];

/// Tenant-scoped entity tables reachable from report SQL. Casing matches the
/// schema's model identifiers exactly.
pub const TENANT_REPORT_TABLES: [&str; 9] = [
    "Contact",
    "Donation",
    "Campaign",
    "GrantApp",
    "Organization",
    "Staff",
    "PipelineEvent",
    "FileAsset",
    "Report",
];

/// Function names that warrant a warning when they appear anywhere in a query.
const DANGEROUS_FUNCTIONS: [&str; 3] = ["EXEC", "EVAL", "LOAD_FILE"];

/// Regex for stripping line comments (`--` to end of line).
static LINE_COMMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)--.*$").expect("Invalid regex: line comment pattern"));

/// Regex for stripping block comments (`/* ... */`, spanning newlines).
static BLOCK_COMMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid regex: block comment pattern"));

/// Regex for collapsing whitespace runs.
static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace pattern"));

/// Regex for extracting the first explicit LIMIT bound.
static LIMIT_VALUE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)LIMIT\s+(\d+)").expect("Invalid regex: limit value pattern"));

/// Regex for extracting table references after FROM and JOIN.
static TABLE_REF_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:FROM|JOIN)\s+(\w+)").expect("Invalid regex: table pattern"));

/// Per-call validation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Maximum result-row cap an explicit LIMIT may request.
    pub max_rows: u64,
    /// Statement timeout budget. Not enforced here; the executor owns it.
    pub statement_timeout: Duration,
    /// Tables the query may reference. Empty means unrestricted.
    pub allowed_tables: Vec<String>,
    /// Keywords whose presence rejects the query outright.
    pub forbidden_keywords: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            allowed_tables: vec![],
            forbidden_keywords: DEFAULT_FORBIDDEN_KEYWORDS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
        }
    }
}

impl ValidationPolicy {
    /// Fixed policy for the tenant report feature: default row cap and
    /// forbidden set, table references restricted to the tenant-scoped
    /// entity surface. A SELECT against an internal table is rejected here
    /// even when it passes every other check.
    pub fn tenant_reports() -> Self {
        Self {
            allowed_tables: TENANT_REPORT_TABLES
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
            ..Self::default()
        }
    }
}

/// Validation outcome: hard errors, soft warnings, and the sanitized text
/// when (and only when) no error was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Comment-stripped, whitespace-normalized SQL. This is the text to
    /// execute; present iff `errors` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitized_sql: Option<String>,
}

/// SQL safety validator.
///
/// Stateless and cheap to clone; holds only the policy applied by
/// [`validate`](SqlValidator::validate). Safe to share across tasks.
#[derive(Debug, Clone, Default)]
pub struct SqlValidator {
    policy: ValidationPolicy,
}

impl SqlValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_rows(mut self, max_rows: u64) -> Self {
        self.policy.max_rows = max_rows;
        self
    }

    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.policy.statement_timeout = timeout;
        self
    }

    pub fn allowed_tables(mut self, tables: Vec<String>) -> Self {
        self.policy.allowed_tables = tables;
        self
    }

    pub fn forbidden_keywords(mut self, keywords: Vec<String>) -> Self {
        self.policy.forbidden_keywords = keywords;
        self
    }

    /// Validate SQL text against this validator's policy.
    ///
    /// Never panics on malformed input; every finding is reported through the
    /// result so the caller can render the full list at once.
    pub fn validate(&self, sql: &str) -> ValidationResult {
        self.validate_with(sql, &self.policy)
    }

    /// Validate SQL text against an explicit policy.
    pub fn validate_with(&self, sql: &str, policy: &ValidationPolicy) -> ValidationResult {
        let sanitized = sanitize(sql);
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // Every check runs against the sanitized text, never the raw input,
        // so comment-splitting a keyword cannot evade the scan.
        let found = forbidden_keywords_in(&sanitized, &policy.forbidden_keywords);
        if !found.is_empty() {
            warn!("Forbidden keywords in candidate SQL: {}", found.join(", "));
            errors.push(format!("Forbidden keywords detected: {}", found.join(", ")));
        }

        if !is_select_statement(&sanitized) {
            errors.push("Only SELECT statements are allowed".to_string());
        }

        if !has_limit_clause(&sanitized) {
            warnings.push(format!(
                "Query should include LIMIT clause (max {} rows)",
                policy.max_rows
            ));
        } else if let Some(limit) = extract_limit_value(&sanitized) {
            if limit > policy.max_rows {
                errors.push(format!(
                    "LIMIT exceeds maximum allowed rows ({})",
                    policy.max_rows
                ));
            }
        }

        if !policy.allowed_tables.is_empty() {
            let tables = extract_table_names(&sanitized);
            let unauthorized: Vec<String> = tables
                .into_iter()
                .filter(|t| !policy.allowed_tables.iter().any(|a| a == t))
                .collect();
            if !unauthorized.is_empty() {
                warn!("Unauthorized table references: {}", unauthorized.join(", "));
                errors.push(format!("Unauthorized tables: {}", unauthorized.join(", ")));
            }
        }

        let patterns = dangerous_patterns_in(&sanitized);
        if !patterns.is_empty() {
            warnings.push(format!(
                "Potentially dangerous patterns detected: {}",
                patterns.join(", ")
            ));
        }

        let is_valid = errors.is_empty();
        ValidationResult {
            is_valid,
            sanitized_sql: is_valid.then_some(sanitized),
            errors,
            warnings,
        }
    }

    /// Validate with the fixed tenant-report policy.
    ///
    /// `tenant_id` does not change the decision; it is accepted for call-site
    /// symmetry and audit logging.
    pub fn validate_for_reports(&self, sql: &str, tenant_id: &str) -> ValidationResult {
        debug!("Validating report SQL for tenant {}", tenant_id);
        self.validate_with(sql, &ValidationPolicy::tenant_reports())
    }
}

/// Strip comments, collapse whitespace runs, and trim.
///
/// The output is what every validation stage and the executed text operate
/// on, so stripped comments cannot reintroduce anything after acceptance.
pub fn sanitize(sql: &str) -> String {
    let stripped = LINE_COMMENT_REGEX.replace_all(sql, "");
    let stripped = BLOCK_COMMENT_REGEX.replace_all(&stripped, "");
    WHITESPACE_REGEX
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Append `LIMIT {max_rows}` to the trimmed input unless a LIMIT token is
/// already present (case-insensitive). Idempotent; performs no validation.
pub fn add_limit_if_missing(sql: &str, max_rows: u64) -> String {
    if has_limit_clause(sql) {
        sql.to_string()
    } else {
        format!("{} LIMIT {}", sql.trim(), max_rows)
    }
}

/// Forbidden keywords present in the text, word-boundary matched so that
/// identifiers like `inserted_at` do not trip the scan. Returned in policy
/// order, which is the order the aggregated error message lists them in.
fn forbidden_keywords_in(sql: &str, keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|keyword| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
                .map(|re| re.is_match(sql))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn is_select_statement(sql: &str) -> bool {
    sql.trim().to_uppercase().starts_with("SELECT")
}

fn has_limit_clause(sql: &str) -> bool {
    sql.to_uppercase().contains("LIMIT")
}

/// First integer following a LIMIT token. A LIMIT with no extractable bound
/// yields `None`; a literal too large for u64 is still an oversized limit.
fn extract_limit_value(sql: &str) -> Option<u64> {
    LIMIT_VALUE_REGEX
        .captures(sql)
        .map(|caps| caps[1].parse().unwrap_or(u64::MAX))
}

/// Table names referenced after FROM or JOIN, deduplicated in first-seen
/// order. A heuristic: it can over-match inside string literals and misses
/// quoted identifiers, which is acceptable for a gate backed by RLS.
fn extract_table_names(sql: &str) -> Vec<String> {
    let mut tables = Vec::new();
    for caps in TABLE_REF_REGEX.captures_iter(sql) {
        let name = caps[1].to_string();
        if !tables.contains(&name) {
            tables.push(name);
        }
    }
    tables
}

/// Structurally risky patterns. Warnings only: subqueries and UNIONs have
/// legitimate reporting uses, so these are surfaced for review, not blocked.
fn dangerous_patterns_in(sql: &str) -> Vec<String> {
    let upper = sql.to_uppercase();
    let mut patterns = Vec::new();

    if upper.contains("(SELECT") {
        patterns.push("subqueries".to_string());
    }
    if upper.contains("UNION") {
        patterns.push("UNION statements".to_string());
    }
    for func in DANGEROUS_FUNCTIONS {
        if upper.contains(func) {
            patterns.push(format!("{func} function"));
        }
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_select() {
        let validator = SqlValidator::new();

        let result = validator.validate("SELECT * FROM Contact LIMIT 10");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());

        let result =
            validator.validate("SELECT id, name FROM Contact WHERE score > 50 LIMIT 100");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_valid_select_with_join() {
        let validator = SqlValidator::new();
        let result = validator.validate(
            "SELECT c.name, d.amount \
             FROM Contact c \
             JOIN Donation d ON c.id = d.contactId \
             LIMIT 50",
        );
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_valid_select_with_aggregation() {
        let validator = SqlValidator::new();
        let result = validator.validate(
            "SELECT COUNT(*) as total_donations, SUM(amount) as total_amount \
             FROM Donation \
             WHERE date >= '2024-01-01' \
             LIMIT 1",
        );
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_forbidden_keywords() {
        let validator = SqlValidator::new();

        let result = validator.validate("INSERT INTO Contact (name) VALUES ('x')");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Forbidden keywords detected: INSERT".to_string())
        );

        let result = validator.validate("UPDATE Contact SET name = 'y' WHERE id = 1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Forbidden keywords detected: UPDATE".to_string())
        );

        let result = validator.validate("DELETE FROM Contact WHERE id = 1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Forbidden keywords detected: DELETE".to_string())
        );

        let result = validator.validate("DROP TABLE Contact");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Forbidden keywords detected: DROP".to_string())
        );
    }

    #[test]
    fn test_forbidden_keywords_aggregate_into_one_error() {
        let validator = SqlValidator::new();
        let result = validator.validate("INSERT INTO a SELECT * FROM b; DROP TABLE b");
        assert!(
            result
                .errors
                .contains(&"Forbidden keywords detected: INSERT, DROP".to_string())
        );
    }

    #[test]
    fn test_keyword_word_boundary() {
        // Identifiers containing a keyword must not trip the scan.
        let validator = SqlValidator::new();
        let result = validator.validate("SELECT inserted_at, updated_by FROM Contact LIMIT 10");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_keyword_inside_string_literal_is_still_flagged() {
        // The scan is text-based and does not understand literals; a
        // word-bounded keyword inside a string rejects conservatively.
        let validator = SqlValidator::new();
        let result = validator.validate("SELECT * FROM Contact WHERE note = 'INSERT' LIMIT 10");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Forbidden keywords detected: INSERT".to_string())
        );
    }

    #[test]
    fn test_non_select_rejected() {
        let validator = SqlValidator::new();

        let result = validator.validate("SHOW TABLES");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Only SELECT statements are allowed".to_string())
        );

        // Independent of the keyword scan: SHOW contains no forbidden keyword.
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_empty_input_rejected() {
        let validator = SqlValidator::new();
        let result = validator.validate("");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Only SELECT statements are allowed".to_string())
        );
        assert!(result.sanitized_sql.is_none());
    }

    #[test]
    fn test_missing_limit_is_warning_only() {
        let validator = SqlValidator::new();
        let result = validator.validate("SELECT * FROM Contact");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(
            result
                .warnings
                .contains(&"Query should include LIMIT clause (max 1000 rows)".to_string())
        );
    }

    #[test]
    fn test_excessive_limit_rejected() {
        let validator = SqlValidator::new();
        let result = validator.validate("SELECT * FROM Contact LIMIT 2000");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"LIMIT exceeds maximum allowed rows (1000)".to_string())
        );
    }

    #[test]
    fn test_limit_without_bound_is_neither_error_nor_warning() {
        // The presence check passed, and no bound could be extracted; the
        // most conservative non-throwing interpretation is "no bound".
        let validator = SqlValidator::new();
        let result = validator.validate("SELECT * FROM Contact LIMIT ALL");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_huge_limit_literal_rejected() {
        let validator = SqlValidator::new();
        let result = validator.validate("SELECT * FROM Contact LIMIT 99999999999999999999999999");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"LIMIT exceeds maximum allowed rows (1000)".to_string())
        );
    }

    #[test]
    fn test_allowed_tables() {
        let validator = SqlValidator::new().allowed_tables(vec!["Contact".into(), "Donation".into()]);

        let result = validator.validate("SELECT * FROM Contact LIMIT 10");
        assert!(result.is_valid);

        let result = validator.validate("SELECT * FROM User LIMIT 10");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Unauthorized tables: User".to_string())
        );
    }

    #[test]
    fn test_unauthorized_tables_aggregate_in_first_seen_order() {
        let validator = SqlValidator::new().allowed_tables(vec!["Contact".into()]);
        let result = validator.validate(
            "SELECT * FROM User u JOIN Session s ON s.userId = u.id JOIN User x ON x.id = u.id LIMIT 5",
        );
        assert!(
            result
                .errors
                .contains(&"Unauthorized tables: User, Session".to_string())
        );
    }

    #[test]
    fn test_subquery_warning() {
        let validator = SqlValidator::new();
        let result = validator.validate(
            "SELECT * FROM Contact \
             WHERE id IN (SELECT contactId FROM Donation WHERE amount > 1000) \
             LIMIT 10",
        );
        assert!(result.is_valid);
        assert!(
            result
                .warnings
                .contains(&"Potentially dangerous patterns detected: subqueries".to_string())
        );
    }

    #[test]
    fn test_union_warning() {
        let validator = SqlValidator::new();
        let result = validator.validate(
            "SELECT name FROM Contact UNION SELECT name FROM Organization LIMIT 10",
        );
        assert!(result.is_valid);
        assert!(
            result
                .warnings
                .contains(&"Potentially dangerous patterns detected: UNION statements".to_string())
        );
    }

    #[test]
    fn test_sanitize_strips_comments() {
        let validator = SqlValidator::new();
        let result = validator.validate(
            "SELECT * FROM Contact -- trailing comment\n/* block\ncomment */ LIMIT 10",
        );
        assert!(result.is_valid);
        let sanitized = result.sanitized_sql.unwrap();
        assert!(!sanitized.contains("--"));
        assert!(!sanitized.contains("/*"));
    }

    #[test]
    fn test_sanitize_normalizes_whitespace() {
        let validator = SqlValidator::new();
        let result = validator.validate("SELECT   *   FROM   Contact   LIMIT   10");
        assert!(result.is_valid);
        assert_eq!(
            result.sanitized_sql.as_deref(),
            Some("SELECT * FROM Contact LIMIT 10")
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize("SELECT *\n  FROM Contact /* c */ LIMIT\t10");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_comment_split_keyword_not_evaded() {
        // Scanning runs on the stripped text, so a keyword split by a block
        // comment (`DR/**/OP`) reassembles and is caught.
        let result = SqlValidator::new().validate("SELECT * FROM t WHERE a = DR/**/OP LIMIT 1");
        assert!(
            result
                .errors
                .contains(&"Forbidden keywords detected: DROP".to_string())
        );
    }

    #[test]
    fn test_sanitized_sql_present_iff_no_errors() {
        let validator = SqlValidator::new();

        let valid = validator.validate("SELECT * FROM Contact LIMIT 10");
        assert!(valid.errors.is_empty());
        assert!(valid.sanitized_sql.is_some());

        let invalid = validator.validate("DROP TABLE Contact");
        assert!(!invalid.errors.is_empty());
        assert!(invalid.sanitized_sql.is_none());

        // Warnings alone do not suppress the sanitized output.
        let warned = validator.validate("SELECT * FROM Contact");
        assert!(warned.errors.is_empty());
        assert!(!warned.warnings.is_empty());
        assert!(warned.sanitized_sql.is_some());
    }

    #[test]
    fn test_case_insensitive_keywords() {
        let validator = SqlValidator::new();

        let result = validator.validate("select * from contact limit 10");
        assert!(result.is_valid);

        let result = validator.validate("insert into contact (name) values ('x')");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Forbidden keywords detected: INSERT".to_string())
        );
    }

    #[test]
    fn test_add_limit_if_missing() {
        assert_eq!(
            add_limit_if_missing("SELECT * FROM Contact", 50),
            "SELECT * FROM Contact LIMIT 50"
        );
        assert_eq!(
            add_limit_if_missing("SELECT * FROM Contact LIMIT 25", 50),
            "SELECT * FROM Contact LIMIT 25"
        );
    }

    #[test]
    fn test_add_limit_if_missing_is_idempotent() {
        let once = add_limit_if_missing("SELECT * FROM Contact", 50);
        assert_eq!(add_limit_if_missing(&once, 50), once);
    }

    #[test]
    fn test_validate_for_reports() {
        let validator = SqlValidator::new();

        let result = validator.validate_for_reports("SELECT * FROM Contact LIMIT 10", "tenant-123");
        assert!(result.is_valid);

        // The tenant entity surface is closed: internal tables are rejected
        // even though the statement is a syntactically harmless SELECT.
        let result = validator.validate_for_reports("SELECT * FROM users LIMIT 10", "tenant-123");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Unauthorized tables: users".to_string())
        );
    }

    #[test]
    fn test_tenant_reports_policy() {
        let policy = ValidationPolicy::tenant_reports();
        assert_eq!(policy.max_rows, 1000);
        assert_eq!(policy.statement_timeout, Duration::from_secs(30));
        assert_eq!(policy.allowed_tables.len(), 9);
        assert_eq!(policy.forbidden_keywords.len(), 20);
    }

    #[test]
    fn test_validate_with_overrides_builder_policy() {
        let validator = SqlValidator::new().max_rows(10);
        let strict = validator.validate("SELECT * FROM Contact LIMIT 100");
        assert!(!strict.is_valid);

        let relaxed = validator.validate_with(
            "SELECT * FROM Contact LIMIT 100",
            &ValidationPolicy::default(),
        );
        assert!(relaxed.is_valid);
    }
}
