//! Report feature: generation, execution, persistence, export.

pub mod export;
pub mod schema;
pub mod service;
pub mod store;

pub use export::{ExportFormat, write_csv, write_json, write_run};
pub use schema::schema_description;
pub use service::{GenerateReportRequest, ReportRun, ReportService, RunReportRequest};
pub use store::{NewReport, SavedReport, SavedReportStore};
