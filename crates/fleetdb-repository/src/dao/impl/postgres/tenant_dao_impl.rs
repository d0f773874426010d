//! PostgreSQL tenant DAO implementation.

use crate::dao::tenant_dao::{TenantDao, TENANT_TABLE};
use crate::paginator::apply_order;
use crate::{connection, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetdb_core::{
    CreateTenant, FleetError, FleetResult, OrderPlan, Tenant, TenantConfig, TenantId,
    UpdateTenant, UserId, ValidateExt,
};
use sea_query::{Alias, Order, PostgresQueryBuilder, SelectStatement};
use shaku::Component;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL tenant DAO.
#[derive(Component, Clone)]
#[shaku(interface = TenantDao)]
pub struct PgTenantDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgTenantDaoImpl {
    /// Creates a new tenant DAO.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TenantRow {
    id: Uuid,
    name: String,
    display_name: Option<String>,
    org: String,
    org_display_name: Option<String>,
    config: Json<TenantConfig>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    deleted: Option<DateTime<Utc>>,
    created_by: Uuid,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Self {
            id: TenantId::from_uuid(row.id),
            name: row.name,
            display_name: row.display_name,
            org: row.org,
            org_display_name: row.org_display_name,
            config: row.config.0,
            created: row.created,
            updated: row.updated,
            deleted: row.deleted,
            created_by: UserId::from_uuid(row.created_by),
        }
    }
}

async fn find(conn: &mut PgConnection, id: TenantId) -> FleetResult<Tenant> {
    let row = sqlx::query_as::<_, TenantRow>(
        "SELECT * FROM tenant WHERE id = $1 AND deleted IS NULL",
    )
    .bind(id.into_inner())
    .fetch_optional(conn)
    .await?;

    row.map(Tenant::from)
        .ok_or_else(|| FleetError::not_found(TENANT_TABLE.entity, id))
}

/// Live tenants with the given IDs, keyed by ID.
pub(crate) async fn load_tenants(
    conn: &mut PgConnection,
    ids: &[TenantId],
) -> FleetResult<HashMap<TenantId, Tenant>> {
    let mut ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, TenantRow>(
        "SELECT * FROM tenant WHERE id = ANY($1) AND deleted IS NULL",
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(Tenant::from)
        .map(|tenant| (tenant.id, tenant))
        .collect())
}

/// Live tenants of `org` in the table's default order, then by ID.
fn by_org_statement(org: &str) -> SelectStatement {
    let mut query = TENANT_TABLE.select();
    query.cond_where(TENANT_TABLE.col("org").eq(org));
    apply_order(&mut query, &TENANT_TABLE, &OrderPlan::default_for(&TENANT_TABLE.order_by));
    query.order_by((Alias::new(TENANT_TABLE.alias), Alias::new("id")), Order::Asc);
    query
}

#[async_trait]
impl TenantDao for PgTenantDaoImpl {
    async fn create(&self, tx: Option<&mut PgConnection>, input: CreateTenant) -> FleetResult<Tenant> {
        input.validate_input()?;
        let tenant = Tenant::new(input);
        debug!("Creating tenant {} in org {}", tenant.name, tenant.org);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            INSERT INTO tenant (id, name, display_name, org, org_display_name, config,
                                created, updated, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant.id.into_inner())
        .bind(&tenant.name)
        .bind(&tenant.display_name)
        .bind(&tenant.org)
        .bind(&tenant.org_display_name)
        .bind(Json(&tenant.config))
        .bind(tenant.created)
        .bind(tenant.updated)
        .bind(tenant.created_by.into_inner())
        .fetch_one(&mut *conn)
        .await
        .map_err(FleetError::from_write_error)?;

        Ok(row.into())
    }

    async fn get_by_id(&self, tx: Option<&mut PgConnection>, id: TenantId) -> FleetResult<Tenant> {
        debug!("Finding tenant by id: {}", id);
        let mut conn = connection(self.pool.inner(), tx).await?;
        find(&mut conn, id).await
    }

    async fn get_all_by_org(&self, tx: Option<&mut PgConnection>, org: &str) -> FleetResult<Vec<Tenant>> {
        debug!("Finding tenants of org: {}", org);

        let sql = by_org_statement(org).to_string(PostgresQueryBuilder);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let rows = sqlx::query_as::<_, TenantRow>(&sql)
            .persistent(false)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn update(
        &self,
        tx: Option<&mut PgConnection>,
        id: TenantId,
        input: UpdateTenant,
    ) -> FleetResult<Tenant> {
        input.validate_input()?;
        debug!("Updating tenant: {}", id);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let mut tenant = find(&mut conn, id).await?;
        if input.is_empty() {
            return Ok(tenant);
        }
        tenant.apply(input);

        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            UPDATE tenant
            SET name = $2, display_name = $3, org_display_name = $4, config = $5, updated = $6
            WHERE id = $1 AND deleted IS NULL
            RETURNING *
            "#,
        )
        .bind(id.into_inner())
        .bind(&tenant.name)
        .bind(&tenant.display_name)
        .bind(&tenant.org_display_name)
        .bind(Json(&tenant.config))
        .bind(tenant.updated)
        .fetch_optional(&mut *conn)
        .await
        .map_err(FleetError::from_write_error)?;

        row.map(Tenant::from)
            .ok_or_else(|| FleetError::not_found(TENANT_TABLE.entity, id))
    }

    async fn delete(&self, tx: Option<&mut PgConnection>, id: TenantId) -> FleetResult<()> {
        let mut conn = connection(self.pool.inner(), tx).await?;
        let result = sqlx::query(
            "UPDATE tenant SET deleted = $2, updated = $2 WHERE id = $1 AND deleted IS NULL",
        )
        .bind(id.into_inner())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        debug!("Deleted tenant {} ({} rows)", id, result.rows_affected());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_org_uses_default_order() {
        let sql = by_org_statement("acme").to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""tn"."org" = 'acme'"#), "{sql}");
        assert!(sql.contains(r#""tn"."deleted" IS NULL"#), "{sql}");
        assert!(
            sql.ends_with(r#"ORDER BY "tn"."created" ASC, "tn"."id" ASC"#),
            "{sql}"
        );
    }

    #[test]
    fn test_by_org_follows_configured_default_field() {
        let sql = by_org_statement("acme").to_string(PostgresQueryBuilder);
        let expected = format!(r#"ORDER BY "tn"."{}" ASC"#, TENANT_TABLE.order_by.default_field);
        assert!(sql.contains(&expected), "{sql}");
    }
}
