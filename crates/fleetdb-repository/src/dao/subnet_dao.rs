//! SubnetDao trait and its list filter.

use super::Relation;
use crate::filter::{in_values, EntityTable, QueryFilter};
use async_trait::async_trait;
use fleetdb_core::{
    CreateSubnet, FleetResult, Interface, OrderByConfig, PageRequest, PageResult, Subnet,
    SubnetClear, SubnetId, SubnetStatus, SubnetStatusCounts, TenantId, UpdateSubnet,
};
use sea_query::SelectStatement;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

/// Table descriptor for subnets.
pub const SUBNET_TABLE: EntityTable = EntityTable {
    entity: "Subnet",
    name: "subnet",
    alias: "su",
    order_by: OrderByConfig::new(&["name", "status", "created", "updated"], "created"),
    search_columns: &["name", "description", "status"],
};

/// Filters for [`SubnetDao::get_all`]. Empty lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetFilter {
    pub ids: Vec<SubnetId>,
    pub names: Vec<String>,
    pub orgs: Vec<String>,
    pub tenant_ids: Vec<TenantId>,
    pub statuses: Vec<SubnetStatus>,
    /// Free-text search over name, description and status.
    pub search: Option<String>,
}

impl QueryFilter for SubnetFilter {
    fn apply(&self, query: &mut SelectStatement) {
        let table = &SUBNET_TABLE;
        let ids: Vec<_> = self.ids.iter().map(|id| id.into_inner()).collect();
        let tenant_ids: Vec<_> = self.tenant_ids.iter().map(|id| id.into_inner()).collect();
        let statuses: Vec<_> = self.statuses.iter().map(SubnetStatus::as_str).collect();

        let conditions = [
            in_values(table, "id", &ids),
            in_values(table, "name", &self.names),
            in_values(table, "org", &self.orgs),
            in_values(table, "tenant_id", &tenant_ids),
            in_values(table, "status", &statuses),
        ];
        for condition in conditions.into_iter().flatten() {
            query.cond_where(condition);
        }

        if let Some(search) = table.search().predicate(self.search.as_deref()) {
            query.cond_where(search);
        }
    }
}

/// Subnet data access.
#[async_trait]
pub trait SubnetDao: Interface + Send + Sync {
    /// Validates and inserts a new subnet.
    async fn create(&self, tx: Option<&mut PgConnection>, input: CreateSubnet) -> FleetResult<Subnet>;

    /// Finds a live subnet by ID, or `NotFound`.
    async fn get_by_id(
        &self,
        tx: Option<&mut PgConnection>,
        id: SubnetId,
        relations: &[Relation],
    ) -> FleetResult<Subnet>;

    /// One page of live subnets matching `filter`, with the total match count.
    async fn get_all(
        &self,
        tx: Option<&mut PgConnection>,
        filter: &SubnetFilter,
        page: &PageRequest,
        relations: &[Relation],
    ) -> FleetResult<PageResult<Subnet>>;

    /// Live subnets per status, optionally limited to one tenant.
    ///
    /// Every status appears in the result, with zero when it has no subnets.
    async fn get_count_by_status(
        &self,
        tx: Option<&mut PgConnection>,
        tenant_id: Option<TenantId>,
    ) -> FleetResult<SubnetStatusCounts>;

    /// Applies a partial update and returns the stored row.
    async fn update(
        &self,
        tx: Option<&mut PgConnection>,
        id: SubnetId,
        input: UpdateSubnet,
    ) -> FleetResult<Subnet>;

    /// Sets the selected nullable fields to NULL and returns the stored row.
    async fn clear(
        &self,
        tx: Option<&mut PgConnection>,
        id: SubnetId,
        fields: SubnetClear,
    ) -> FleetResult<Subnet>;

    /// Soft-deletes a subnet. Deleting a missing subnet is not an error.
    async fn delete(&self, tx: Option<&mut PgConnection>, id: SubnetId) -> FleetResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::PostgresQueryBuilder;

    #[test]
    fn test_status_filter_uses_stored_names() {
        let filter = SubnetFilter {
            statuses: vec![SubnetStatus::Ready, SubnetStatus::Error],
            ..Default::default()
        };
        let sql = filter.filtered(&SUBNET_TABLE).to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""su"."status" IN ('Ready', 'Error')"#), "{sql}");
    }

    #[test]
    fn test_search_covers_all_search_columns() {
        let filter = SubnetFilter {
            search: Some("edge".to_string()),
            ..Default::default()
        };
        let sql = filter.filtered(&SUBNET_TABLE).to_string(PostgresQueryBuilder);
        for column in SUBNET_TABLE.search_columns {
            assert!(sql.contains(&format!(r#""su"."{column}" ILIKE '%edge%'"#)), "{sql}");
        }
    }

    #[test]
    fn test_unknown_sort_field_is_rejected() {
        let err = fleetdb_core::OrderSpec::new(
            "mtu",
            fleetdb_core::OrderDirection::Ascending,
            SUBNET_TABLE.order_by.allowed_fields,
        )
        .unwrap_err();
        assert!(matches!(err, fleetdb_core::FleetError::InvalidSortField { .. }));
    }
}
