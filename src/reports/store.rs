//! Saved report persistence seam.

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A report definition persisted for re-running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedReport {
    pub id: String,
    pub name: String,
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tenant_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A report definition to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub name: String,
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tenant_id: String,
    pub created_by: String,
}

/// Async seam over the saved-report table.
///
/// Implementations run inside the same tenant-scoped session the report
/// pipeline establishes around each call.
#[async_trait]
pub trait SavedReportStore: Send + Sync {
    /// Persists a report definition.
    async fn save(&self, report: NewReport) -> StoreResult<SavedReport>;

    /// Lists a tenant's saved reports, newest first.
    async fn list(&self, tenant_id: &str) -> StoreResult<Vec<SavedReport>>;
}
