//! SshKeyDao trait and its list filter.

use super::Relation;
use crate::filter::{in_values, EntityTable, QueryFilter};
use async_trait::async_trait;
use fleetdb_core::{
    CreateSshKey, FleetResult, Interface, OrderByConfig, PageRequest, PageResult, SshKey, SshKeyId,
    TenantId, UpdateSshKey,
};
use sea_query::SelectStatement;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

/// Table descriptor for SSH keys.
pub const SSH_KEY_TABLE: EntityTable = EntityTable {
    entity: "SshKey",
    name: "ssh_key",
    alias: "sk",
    order_by: OrderByConfig::new(&["name", "org", "tenant_id", "created", "updated"], "created"),
    search_columns: &["name"],
};

/// Filters for [`SshKeyDao::get_all`]. Empty lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshKeyFilter {
    pub ids: Vec<SshKeyId>,
    pub names: Vec<String>,
    pub orgs: Vec<String>,
    pub tenant_ids: Vec<TenantId>,
    pub fingerprints: Vec<String>,
    /// Free-text search over the key name.
    pub search: Option<String>,
}

impl QueryFilter for SshKeyFilter {
    fn apply(&self, query: &mut SelectStatement) {
        let table = &SSH_KEY_TABLE;
        let ids: Vec<_> = self.ids.iter().map(|id| id.into_inner()).collect();
        let tenant_ids: Vec<_> = self.tenant_ids.iter().map(|id| id.into_inner()).collect();

        let conditions = [
            in_values(table, "id", &ids),
            in_values(table, "name", &self.names),
            in_values(table, "org", &self.orgs),
            in_values(table, "tenant_id", &tenant_ids),
            in_values(table, "fingerprint", &self.fingerprints),
        ];
        for condition in conditions.into_iter().flatten() {
            query.cond_where(condition);
        }

        if let Some(search) = table.search().predicate(self.search.as_deref()) {
            query.cond_where(search);
        }
    }
}

/// SSH key data access.
#[async_trait]
pub trait SshKeyDao: Interface + Send + Sync {
    /// Validates and inserts a new key.
    async fn create(&self, tx: Option<&mut PgConnection>, input: CreateSshKey) -> FleetResult<SshKey>;

    /// Finds a live key by ID, or `NotFound`.
    async fn get_by_id(
        &self,
        tx: Option<&mut PgConnection>,
        id: SshKeyId,
        relations: &[Relation],
    ) -> FleetResult<SshKey>;

    /// One page of live keys matching `filter`, with the total match count.
    ///
    /// Fails with `InvalidSortField` or `InvalidPageParams` before touching
    /// the database.
    async fn get_all(
        &self,
        tx: Option<&mut PgConnection>,
        filter: &SshKeyFilter,
        page: &PageRequest,
        relations: &[Relation],
    ) -> FleetResult<PageResult<SshKey>>;

    /// Applies a partial update and returns the stored row.
    async fn update(
        &self,
        tx: Option<&mut PgConnection>,
        id: SshKeyId,
        input: UpdateSshKey,
    ) -> FleetResult<SshKey>;

    /// Clears the public key and soft-deletes the row. Missing keys are ignored.
    async fn delete(&self, tx: Option<&mut PgConnection>, id: SshKeyId) -> FleetResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::PostgresQueryBuilder;

    #[test]
    fn test_empty_filter_only_excludes_deleted() {
        let sql = SshKeyFilter::default()
            .filtered(&SSH_KEY_TABLE)
            .to_string(PostgresQueryBuilder);
        assert_eq!(
            sql,
            r#"SELECT "sk".* FROM "ssh_key" AS "sk" WHERE "sk"."deleted" IS NULL"#
        );
    }

    #[test]
    fn test_filters_are_and_ed() {
        let filter = SshKeyFilter {
            orgs: vec!["acme".to_string()],
            fingerprints: vec!["SHA256:abc".to_string()],
            ..Default::default()
        };
        let sql = filter.filtered(&SSH_KEY_TABLE).to_string(PostgresQueryBuilder);
        assert!(
            sql.ends_with(
                r#"WHERE "sk"."deleted" IS NULL AND "sk"."org" IN ('acme') AND "sk"."fingerprint" IN ('SHA256:abc')"#
            ),
            "{sql}"
        );
    }

    #[test]
    fn test_search_is_grouped() {
        let filter = SshKeyFilter {
            tenant_ids: vec![TenantId::new()],
            search: Some("deploy".to_string()),
            ..Default::default()
        };
        let sql = filter.filtered(&SSH_KEY_TABLE).to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""sk"."tenant_id" IN ("#), "{sql}");
        assert!(sql.contains("AND (") && sql.contains("to_tsquery('english', 'deploy')"), "{sql}");
        assert!(
            sql.ends_with(r#"@@ to_tsquery('english', 'deploy')) OR ("sk"."name" ILIKE '%deploy%'))"#),
            "{sql}"
        );
    }

    #[test]
    fn test_blank_search_matches_absent_search() {
        let blank = SshKeyFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            blank.filtered(&SSH_KEY_TABLE).to_string(PostgresQueryBuilder),
            SshKeyFilter::default().filtered(&SSH_KEY_TABLE).to_string(PostgresQueryBuilder)
        );
    }
}
