//! Database abstraction for report execution.
//!
//! The concrete connection layer lives outside this crate; the pipeline only
//! needs a raw query executor that can be scoped to a tenant session.

pub mod result;
pub mod traits;

pub use result::{CellValue, Row};
pub use traits::TenantDatabase;
