//! Error types for the report engine.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` conversions.
//!
//! Validator findings are not errors: the safety gate reports everything it
//! found through [`ValidationResult`](crate::security::ValidationResult) so a
//! caller can render the complete list at once. Only the execution pipeline
//! turns a rejected query into [`SecurityError::RejectedSql`].

use std::borrow::Cow;
use thiserror::Error;

/// Main error type for the report engine.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    Internal { message: Cow<'static, str> },
}

/// SQL generation (LLM provider) errors.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Provider call failed: {0}")]
    Provider(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

/// Security-related errors raised by the execution pipeline.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// The safety gate rejected the SQL text. Carries the verbatim error list
    /// so callers can surface every problem at once.
    #[error("Invalid SQL: {}", .errors.join(", "))]
    RejectedSql { errors: Vec<String> },

    #[error("Rate limit exceeded: {0} reports per minute")]
    RateLimitExceeded(u32),

    #[error("Concurrent report limit exceeded: {0}")]
    ConcurrentLimitExceeded(u32),
}

/// Errors from the tenant-scoped database session.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Query timeout after {0}ms")]
    Timeout(u64),

    #[error("Tenant context error: {0}")]
    TenantContext(String),
}

/// Saved report store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("Store operation failed: {0}")]
    OperationFailed(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(Cow<'static, str>),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: Cow<'static, str>,
        message: Cow<'static, str>,
    },
}

/// Result type alias for ReportError.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Result type alias for GenerationError.
pub type GenResult<T> = std::result::Result<T, GenerationError>;

/// Result type alias for SecurityError.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

/// Result type alias for DatabaseError.
pub type DbResult<T> = std::result::Result<T, DatabaseError>;

/// Result type alias for StoreError.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
