//! # FleetDB Core
//!
//! Core types for the FleetDB data-access layer: errors, typed IDs, the
//! ordering and page types shared by every paginated listing, and the
//! inventory entities the DAOs read and write.

pub mod domain;
pub mod error;
pub mod id;
pub mod logging;
pub mod pagination;
pub mod result;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use logging::*;
pub use pagination::*;
pub use result::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::{module, HasComponent, Interface};
