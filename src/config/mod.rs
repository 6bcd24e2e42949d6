//! Engine configuration and builder.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Execution-side configuration for the report pipeline.
///
/// The validation policy itself is fixed by the tenant-report preset
/// ([`ValidationPolicy::tenant_reports`](crate::security::ValidationPolicy::tenant_reports));
/// this covers what the executor enforces around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEngineConfig {
    /// Wall-clock budget for one report query.
    pub statement_timeout: Duration,
    /// Report executions allowed per tenant per minute.
    pub rate_limit_per_minute: u32,
    /// Concurrent report executions allowed per tenant.
    pub max_concurrent_reports: u32,
}

impl Default for ReportEngineConfig {
    fn default() -> Self {
        Self {
            statement_timeout: Duration::from_secs(30),
            rate_limit_per_minute: 30,
            max_concurrent_reports: 4,
        }
    }
}

impl ReportEngineConfig {
    pub fn builder() -> ReportEngineConfigBuilder {
        ReportEngineConfigBuilder::default()
    }
}

/// Builder for [`ReportEngineConfig`] with fluent API.
#[derive(Default)]
pub struct ReportEngineConfigBuilder {
    config: ReportEngineConfig,
}

impl ReportEngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.config.statement_timeout = timeout;
        self
    }

    pub fn rate_limit_per_minute(mut self, rate: u32) -> Self {
        self.config.rate_limit_per_minute = rate;
        self
    }

    pub fn max_concurrent_reports(mut self, limit: u32) -> Self {
        self.config.max_concurrent_reports = limit;
        self
    }

    /// Build from environment variables.
    pub fn from_env(mut self) -> Result<Self> {
        if let Ok(timeout_ms) = env::var("REPORT_STATEMENT_TIMEOUT_MS") {
            let ms: u64 = timeout_ms.parse().map_err(|_| ConfigError::InvalidValue {
                field: "REPORT_STATEMENT_TIMEOUT_MS".into(),
                message: "Invalid timeout in milliseconds".into(),
            })?;
            self.config.statement_timeout = Duration::from_millis(ms);
        }

        if let Ok(rate) = env::var("REPORT_RATE_LIMIT_PER_MINUTE") {
            self.config.rate_limit_per_minute =
                rate.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "REPORT_RATE_LIMIT_PER_MINUTE".into(),
                    message: "Invalid rate limit".into(),
                })?;
        }

        if let Ok(limit) = env::var("REPORT_MAX_CONCURRENT") {
            self.config.max_concurrent_reports =
                limit.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "REPORT_MAX_CONCURRENT".into(),
                    message: "Invalid concurrency limit".into(),
                })?;
        }

        Ok(self)
    }

    pub fn build(self) -> Result<ReportEngineConfig> {
        self.validate()?;
        Ok(self.config)
    }

    fn validate(&self) -> Result<()> {
        if self.config.rate_limit_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rate_limit_per_minute".into(),
                message: "Rate limit must be greater than 0".into(),
            }
            .into());
        }
        if self.config.max_concurrent_reports == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_reports".into(),
                message: "Concurrency limit must be greater than 0".into(),
            }
            .into());
        }
        Ok(())
    }
}
