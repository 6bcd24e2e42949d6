//! Report pipeline: generate, gate, execute, persist.

use crate::config::ReportEngineConfig;
use crate::database::{Row, TenantDatabase};
use crate::error::{DatabaseError, Result, SecurityError};
use crate::llm::{SqlGeneration, SqlGenerationRequest, SqlGenerator};
use crate::reports::schema::schema_description;
use crate::reports::store::{NewReport, SavedReport, SavedReportStore};
use crate::security::{ReportRateLimiter, SqlValidator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Request to generate report SQL from natural language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportRequest {
    pub prompt: String,
    #[serde(default)]
    pub module: Option<String>,
}

/// Request to execute report SQL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReportRequest {
    pub sql: String,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Result of one report execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRun {
    pub data: Vec<Row>,
    pub row_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Orchestrates the report feature around the safety gate.
///
/// Every SQL string — freshly generated or user-saved — goes through
/// [`SqlValidator::validate_for_reports`] before it comes near a connection,
/// and only the sanitized text is ever executed. Tenant context is set before
/// and cleared after each database call, on every exit path.
pub struct ReportService {
    generator: Arc<dyn SqlGenerator>,
    database: Arc<dyn TenantDatabase>,
    store: Arc<dyn SavedReportStore>,
    validator: SqlValidator,
    limiter: ReportRateLimiter,
    config: ReportEngineConfig,
}

impl ReportService {
    pub fn new(
        generator: Arc<dyn SqlGenerator>,
        database: Arc<dyn TenantDatabase>,
        store: Arc<dyn SavedReportStore>,
        config: ReportEngineConfig,
    ) -> Self {
        Self {
            generator,
            database,
            store,
            validator: SqlValidator::new(),
            limiter: ReportRateLimiter::new(
                config.rate_limit_per_minute,
                config.max_concurrent_reports,
            ),
            config,
        }
    }

    /// Generate candidate SQL for a natural-language prompt.
    ///
    /// The generated text is validated with the tenant-report policy before
    /// it is returned; a rejected candidate never reaches the caller as
    /// something executable.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::RejectedSql`] with the full error list if the
    /// candidate fails validation.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id))]
    pub async fn generate_sql(
        &self,
        request: &GenerateReportRequest,
        tenant_id: &str,
    ) -> Result<SqlGeneration> {
        let generation_request = SqlGenerationRequest {
            prompt: request.prompt.clone(),
            schema: schema_description().to_string(),
            module: request.module.clone(),
        };

        let generation = self.generator.generate_sql(&generation_request).await?;

        let validation = self
            .validator
            .validate_for_reports(&generation.sql, tenant_id);
        if !validation.is_valid {
            return Err(SecurityError::RejectedSql {
                errors: validation.errors,
            }
            .into());
        }

        debug!("Generated report SQL accepted by safety gate");
        Ok(generation)
    }

    /// Execute report SQL inside a tenant-scoped session.
    ///
    /// Validates again even for previously accepted text (saved reports may
    /// predate policy changes), executes only the sanitized form, and clears
    /// the tenant context on every path so a pooled connection never leaks
    /// scope into the next call.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::RejectedSql`] without touching the database
    /// if validation fails, [`SecurityError::RateLimitExceeded`] or
    /// [`SecurityError::ConcurrentLimitExceeded`] when the tenant is over
    /// budget, and [`DatabaseError::Timeout`] when the statement budget
    /// elapses.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id))]
    pub async fn run_report(
        &self,
        request: &RunReportRequest,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<ReportRun> {
        let validation = self.validator.validate_for_reports(&request.sql, tenant_id);
        let Some(sanitized) = validation.sanitized_sql else {
            return Err(SecurityError::RejectedSql {
                errors: validation.errors,
            }
            .into());
        };
        for warning in &validation.warnings {
            warn!("Report SQL warning for tenant {}: {}", tenant_id, warning);
        }

        let _permit = self.limiter.try_acquire(tenant_id)?;

        self.database.set_tenant_context(tenant_id, user_id).await?;

        let outcome = match timeout(
            self.config.statement_timeout,
            self.database.execute_raw(&sanitized),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DatabaseError::Timeout(
                self.config.statement_timeout.as_millis() as u64,
            )),
        };

        // Clear before inspecting the outcome: a failed query must not leave
        // the session scoped on a pooled connection.
        let cleared = self.database.clear_tenant_context().await;
        let rows = outcome?;
        cleared?;

        Ok(ReportRun {
            row_count: rows.len(),
            data: rows,
            limit: request.limit,
        })
    }

    /// Persist a report definition for the tenant.
    #[instrument(skip(self, report), fields(tenant_id = %report.tenant_id))]
    pub async fn save_report(&self, report: NewReport) -> Result<SavedReport> {
        self.database
            .set_tenant_context(&report.tenant_id, &report.created_by)
            .await?;

        let saved = self.store.save(report).await;
        let cleared = self.database.clear_tenant_context().await;
        let saved = saved?;
        cleared?;

        Ok(saved)
    }

    /// List the tenant's saved reports, newest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn saved_reports(&self, tenant_id: &str, user_id: &str) -> Result<Vec<SavedReport>> {
        self.database.set_tenant_context(tenant_id, user_id).await?;

        let reports = self.store.list(tenant_id).await;
        let cleared = self.database.clear_tenant_context().await;
        let reports = reports?;
        cleared?;

        Ok(reports)
    }
}
