//! Tenant-scoped database seam.

use crate::database::result::Row;
use crate::error::DbResult;
use async_trait::async_trait;

/// Async seam over the tenant-scoped raw query executor.
///
/// Implementations wrap a real connection/ORM layer. The report pipeline
/// calls `set_tenant_context` before `execute_raw` and `clear_tenant_context`
/// on every exit path, so a pooled connection never carries one tenant's
/// context into the next call. Row-level security on the tenant-scoped
/// tables is the second, database-enforced isolation layer behind the
/// text-level gate.
#[async_trait]
pub trait TenantDatabase: Send + Sync {
    /// Scopes the session to a tenant and acting user.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::TenantContext`](crate::error::DatabaseError::TenantContext)
    /// if the session variables cannot be set.
    async fn set_tenant_context(&self, tenant_id: &str, user_id: &str) -> DbResult<()>;

    /// Clears the tenant scope from the session.
    async fn clear_tenant_context(&self) -> DbResult<()>;

    /// Executes sanitized, validated SQL and returns the result rows.
    ///
    /// Callers must pass only text accepted by the safety gate; this trait
    /// performs no validation of its own.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::QueryFailed`](crate::error::DatabaseError::QueryFailed)
    /// if execution fails.
    async fn execute_raw(&self, sql: &str) -> DbResult<Vec<Row>>;
}
