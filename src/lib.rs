//! Safety gate and execution pipeline for LLM-generated CRM report SQL.
//!
//! Natural-language report prompts are turned into SQL by an external
//! provider; that text is untrusted and runs against a shared multi-tenant
//! store through a raw-query escape hatch. This crate gates it: a text-level
//! validator that guarantees a candidate query cannot mutate data, escape the
//! tenant entity surface, or request unbounded result sets, plus the pipeline
//! that generates, validates, executes, and persists report queries around it.
//!
//! The gate is one of two layers. Accepted SQL still executes only inside a
//! tenant-scoped session, where row-level security enforces isolation at the
//! database.
//!
//! # Example
//!
//! ```
//! use crmblr_report_engine::security::SqlValidator;
//!
//! let validator = SqlValidator::new();
//!
//! let result = validator.validate("SELECT * FROM Contact LIMIT 10");
//! assert!(result.is_valid);
//! assert_eq!(
//!     result.sanitized_sql.as_deref(),
//!     Some("SELECT * FROM Contact LIMIT 10")
//! );
//!
//! let result = validator.validate("DROP TABLE Contact");
//! assert!(!result.is_valid);
//! assert!(result.errors[0].contains("DROP"));
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod reports;
pub mod security;

pub use config::{ReportEngineConfig, ReportEngineConfigBuilder};
pub use database::{CellValue, Row, TenantDatabase};
pub use error::{ReportError, Result};
pub use llm::{SqlGeneration, SqlGenerationRequest, SqlGenerator};
pub use reports::{
    GenerateReportRequest, NewReport, ReportRun, ReportService, RunReportRequest, SavedReport,
    SavedReportStore,
};
pub use security::{
    ReportRateLimiter, SqlValidator, ValidationPolicy, ValidationResult, add_limit_if_missing,
};
