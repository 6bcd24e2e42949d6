//! Per-tenant rate limiting for report execution.
//!
//! Report queries run raw SQL against the shared store, so each tenant gets
//! its own token bucket and concurrency cap: one tenant's report storm cannot
//! starve the others. Validation itself is never rate limited.

use crate::error::{SecurityError, SecurityResult};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, warn};

struct TenantBucket {
    tokens: f64,
    last_refill: Instant,
    concurrent: u32,
}

/// Token bucket rate limiter keyed by tenant id.
pub struct ReportRateLimiter {
    /// Report executions allowed per tenant per minute.
    max_per_minute: u32,
    /// Concurrent report executions allowed per tenant.
    max_concurrent: u32,
    buckets: DashMap<String, Mutex<TenantBucket>>,
}

impl ReportRateLimiter {
    pub fn new(max_per_minute: u32, max_concurrent: u32) -> Self {
        Self {
            max_per_minute,
            max_concurrent,
            buckets: DashMap::new(),
        }
    }

    /// Try to acquire an execution permit for a tenant.
    ///
    /// The returned guard releases the concurrency slot on drop; spent
    /// tokens refill over time.
    pub fn try_acquire(&self, tenant_id: &str) -> SecurityResult<ReportPermit<'_>> {
        let entry = self
            .buckets
            .entry(tenant_id.to_string())
            .or_insert_with(|| {
                Mutex::new(TenantBucket {
                    tokens: f64::from(self.max_per_minute),
                    last_refill: Instant::now(),
                    concurrent: 0,
                })
            });

        let mut bucket = entry.lock();
        Self::refill(&mut bucket, self.max_per_minute);

        if bucket.concurrent >= self.max_concurrent {
            warn!(
                "Concurrent report limit exceeded for tenant {}: {}/{}",
                tenant_id, bucket.concurrent, self.max_concurrent
            );
            return Err(SecurityError::ConcurrentLimitExceeded(self.max_concurrent));
        }

        if bucket.tokens < 1.0 {
            warn!("Report rate limit exceeded for tenant {}", tenant_id);
            return Err(SecurityError::RateLimitExceeded(self.max_per_minute));
        }

        bucket.tokens -= 1.0;
        bucket.concurrent += 1;

        debug!(
            "Report permit acquired for tenant {}: {:.1} tokens remaining, {} concurrent",
            tenant_id, bucket.tokens, bucket.concurrent
        );

        drop(bucket);
        drop(entry);

        Ok(ReportPermit {
            limiter: self,
            tenant_id: tenant_id.to_string(),
        })
    }

    /// Refill tokens based on elapsed time.
    fn refill(bucket: &mut TenantBucket, max_per_minute: u32) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();

        if elapsed > 0.0 {
            let refill_rate = f64::from(max_per_minute) / 60.0;
            bucket.tokens = (bucket.tokens + elapsed * refill_rate).min(f64::from(max_per_minute));
            bucket.last_refill = now;
        }
    }

    fn release(&self, tenant_id: &str) {
        if let Some(entry) = self.buckets.get(tenant_id) {
            let mut bucket = entry.lock();
            bucket.concurrent = bucket.concurrent.saturating_sub(1);
            debug!(
                "Report permit released for tenant {}: {} concurrent",
                tenant_id, bucket.concurrent
            );
        }
    }

    /// Current status for a tenant. A tenant with no bucket yet reports a
    /// full budget.
    pub fn status(&self, tenant_id: &str) -> ReportLimitStatus {
        match self.buckets.get(tenant_id) {
            Some(entry) => {
                let mut bucket = entry.lock();
                Self::refill(&mut bucket, self.max_per_minute);
                ReportLimitStatus {
                    available_tokens: bucket.tokens as u32,
                    max_per_minute: self.max_per_minute,
                    concurrent_reports: bucket.concurrent,
                    max_concurrent: self.max_concurrent,
                }
            }
            None => ReportLimitStatus {
                available_tokens: self.max_per_minute,
                max_per_minute: self.max_per_minute,
                concurrent_reports: 0,
                max_concurrent: self.max_concurrent,
            },
        }
    }
}

/// RAII guard that releases the tenant's concurrency slot on drop.
pub struct ReportPermit<'a> {
    limiter: &'a ReportRateLimiter,
    tenant_id: String,
}

impl<'a> Drop for ReportPermit<'a> {
    fn drop(&mut self) {
        self.limiter.release(&self.tenant_id);
    }
}

/// Rate limiter status for one tenant.
#[derive(Debug, Clone)]
pub struct ReportLimitStatus {
    pub available_tokens: u32,
    pub max_per_minute: u32,
    pub concurrent_reports: u32,
    pub max_concurrent: u32,
}
