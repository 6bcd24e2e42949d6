//! SQL safety validation and report rate limiting.

pub mod limits;
pub mod validator;

pub use limits::{ReportLimitStatus, ReportPermit, ReportRateLimiter};
pub use validator::{
    DEFAULT_FORBIDDEN_KEYWORDS, DEFAULT_MAX_ROWS, DEFAULT_STATEMENT_TIMEOUT, SqlValidator,
    TENANT_REPORT_TABLES, ValidationPolicy, ValidationResult, add_limit_if_missing, sanitize,
};
