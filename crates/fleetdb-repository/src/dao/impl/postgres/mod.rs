//! PostgreSQL DAO implementations.

mod ssh_key_dao_impl;
mod subnet_dao_impl;
mod tenant_dao_impl;

pub use ssh_key_dao_impl::PgSshKeyDaoImpl;
pub use subnet_dao_impl::PgSubnetDaoImpl;
pub use tenant_dao_impl::PgTenantDaoImpl;

use crate::dao::Relation;
use fleetdb_core::{FleetResult, SshKey, Subnet, Tenant, TenantId};
use sqlx::PgConnection;
use tracing::debug;

/// An entity that belongs to a tenant and can carry it when loaded.
pub(crate) trait TenantOwned {
    fn tenant_id(&self) -> TenantId;
    fn set_tenant(&mut self, tenant: Option<Tenant>);
}

impl TenantOwned for SshKey {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn set_tenant(&mut self, tenant: Option<Tenant>) {
        self.tenant = tenant;
    }
}

impl TenantOwned for Subnet {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn set_tenant(&mut self, tenant: Option<Tenant>) {
        self.tenant = tenant;
    }
}

/// Loads the owning tenants of `entities` in one query when
/// [`Relation::Tenant`] was requested.
pub(crate) async fn attach_tenants<E: TenantOwned + Send>(
    conn: &mut PgConnection,
    entities: &mut [E],
    relations: &[Relation],
) -> FleetResult<()> {
    if entities.is_empty() || !Relation::requested(relations, Relation::Tenant) {
        return Ok(());
    }

    let ids: Vec<TenantId> = entities.iter().map(TenantOwned::tenant_id).collect();
    let tenants = tenant_dao_impl::load_tenants(conn, &ids).await?;
    debug!("Attaching {} tenants to {} rows", tenants.len(), entities.len());

    for entity in entities {
        let tenant = tenants.get(&entity.tenant_id()).cloned();
        entity.set_tenant(tenant);
    }
    Ok(())
}
