//! DAO (Data Access Object) layer.
//!
//! Each entity has a DAO interface in this module and a PostgreSQL
//! implementation under [`r#impl`]. Every method takes an optional caller
//! connection so several calls can share one transaction:
//!
//! ```text
//! caller ─ Option<&mut PgConnection> ─▶ dyn SshKeyDao ─▶ PgSshKeyDaoImpl ─▶ PostgreSQL
//! ```
//!
//! Paginated reads build a filtered query through [`crate::QueryFilter`] and
//! hand it to [`crate::paginate`].

pub mod r#impl;
pub mod ssh_key_dao;
pub mod subnet_dao;
pub mod tenant_dao;

pub use r#impl::{PgSshKeyDaoImpl, PgSubnetDaoImpl, PgTenantDaoImpl};
pub use ssh_key_dao::{SshKeyDao, SshKeyFilter, SSH_KEY_TABLE};
pub use subnet_dao::{SubnetDao, SubnetFilter, SUBNET_TABLE};
pub use tenant_dao::{TenantDao, TENANT_TABLE};

use serde::{Deserialize, Serialize};

/// Related rows that can be attached to an entity when it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The owning tenant.
    Tenant,
}

impl Relation {
    pub(crate) fn requested(relations: &[Self], relation: Self) -> bool {
        relations.contains(&relation)
    }
}
