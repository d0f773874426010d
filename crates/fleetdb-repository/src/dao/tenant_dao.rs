//! TenantDao trait.

use crate::filter::EntityTable;
use async_trait::async_trait;
use fleetdb_core::{CreateTenant, FleetResult, Interface, OrderByConfig, Tenant, TenantId, UpdateTenant};
use sqlx::PgConnection;

/// Table descriptor for tenants.
pub const TENANT_TABLE: EntityTable = EntityTable {
    entity: "Tenant",
    name: "tenant",
    alias: "tn",
    order_by: OrderByConfig::new(&["name", "org", "created", "updated"], "created"),
    search_columns: &[],
};

/// Tenant data access.
///
/// Every method runs on `tx` when given, otherwise on a pooled connection.
#[async_trait]
pub trait TenantDao: Interface + Send + Sync {
    /// Validates and inserts a new tenant.
    ///
    /// Returns `Conflict` if the org already has a live tenant with that name.
    async fn create(&self, tx: Option<&mut PgConnection>, input: CreateTenant) -> FleetResult<Tenant>;

    /// Finds a live tenant by ID, or `NotFound`.
    async fn get_by_id(&self, tx: Option<&mut PgConnection>, id: TenantId) -> FleetResult<Tenant>;

    /// All live tenants of an org, oldest first.
    async fn get_all_by_org(&self, tx: Option<&mut PgConnection>, org: &str) -> FleetResult<Vec<Tenant>>;

    /// Applies a partial update and returns the stored row.
    async fn update(
        &self,
        tx: Option<&mut PgConnection>,
        id: TenantId,
        input: UpdateTenant,
    ) -> FleetResult<Tenant>;

    /// Soft-deletes a tenant. Deleting a missing tenant is not an error.
    async fn delete(&self, tx: Option<&mut PgConnection>, id: TenantId) -> FleetResult<()>;
}
