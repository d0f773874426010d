//! Inventory entities and their create/update inputs.
//!
//! Timestamps are set explicitly: constructors stamp `created` and `updated`,
//! and [`Tenant::apply`]-style updates call `touch()`.

pub mod ssh_key;
pub mod subnet;
pub mod tenant;

pub use ssh_key::*;
pub use subnet::*;
pub use tenant::*;
