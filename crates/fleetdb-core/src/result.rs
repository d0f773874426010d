//! Result type aliases for FleetDB.

use crate::FleetError;

/// A specialized `Result` type for FleetDB operations.
pub type FleetResult<T> = Result<T, FleetError>;
