//! Result type aliases

use crate::error::PortalError;

/// Standard Result type for portal operations
pub type PortalResult<T> = Result<T, PortalError>;
