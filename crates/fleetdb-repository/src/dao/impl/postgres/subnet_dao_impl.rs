//! PostgreSQL subnet DAO implementation.

use super::attach_tenants;
use crate::dao::subnet_dao::{SubnetDao, SubnetFilter, SUBNET_TABLE};
use crate::dao::Relation;
use crate::{connection, paginate, DatabasePoolInterface, QueryFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetdb_core::{
    CreateSubnet, FleetError, FleetResult, PageRequest, PageResult, Subnet, SubnetClear, SubnetId,
    SubnetStatus, SubnetStatusCounts, TenantId, UpdateSubnet, UserId, ValidateExt,
};
use shaku::Component;
use sqlx::{FromRow, PgConnection};
use std::slice;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL subnet DAO.
#[derive(Component, Clone)]
#[shaku(interface = SubnetDao)]
pub struct PgSubnetDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgSubnetDaoImpl {
    /// Creates a new subnet DAO.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubnetRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    org: String,
    tenant_id: Uuid,
    ipv4_prefix: Option<String>,
    ipv4_gateway: Option<String>,
    prefix_length: i32,
    mtu: Option<i32>,
    status: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    deleted: Option<DateTime<Utc>>,
    created_by: Uuid,
}

impl TryFrom<SubnetRow> for Subnet {
    type Error = FleetError;

    fn try_from(row: SubnetRow) -> Result<Self, Self::Error> {
        let status = stored_status(&row.status)?;

        Ok(Self {
            id: SubnetId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            org: row.org,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            ipv4_prefix: row.ipv4_prefix,
            ipv4_gateway: row.ipv4_gateway,
            prefix_length: row.prefix_length,
            mtu: row.mtu,
            status,
            created: row.created,
            updated: row.updated,
            deleted: row.deleted,
            created_by: UserId::from_uuid(row.created_by),
            tenant: None,
        })
    }
}

fn stored_status(status: &str) -> FleetResult<SubnetStatus> {
    status
        .parse::<SubnetStatus>()
        .map_err(|_| FleetError::internal(format!("Invalid subnet status in database: {status}")))
}

async fn find(conn: &mut PgConnection, id: SubnetId) -> FleetResult<Subnet> {
    let row = sqlx::query_as::<_, SubnetRow>(
        "SELECT * FROM subnet WHERE id = $1 AND deleted IS NULL",
    )
    .bind(id.into_inner())
    .fetch_optional(conn)
    .await?;

    row.map(Subnet::try_from)
        .transpose()?
        .ok_or_else(|| FleetError::not_found(SUBNET_TABLE.entity, id))
}

#[async_trait]
impl SubnetDao for PgSubnetDaoImpl {
    async fn create(&self, tx: Option<&mut PgConnection>, input: CreateSubnet) -> FleetResult<Subnet> {
        input.validate_input()?;
        let subnet = Subnet::new(input);
        debug!("Creating subnet {} for tenant {}", subnet.name, subnet.tenant_id);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let row = sqlx::query_as::<_, SubnetRow>(
            r#"
            INSERT INTO subnet (id, name, description, org, tenant_id, ipv4_prefix, ipv4_gateway,
                                prefix_length, mtu, status, created, updated, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(subnet.id.into_inner())
        .bind(&subnet.name)
        .bind(&subnet.description)
        .bind(&subnet.org)
        .bind(subnet.tenant_id.into_inner())
        .bind(&subnet.ipv4_prefix)
        .bind(&subnet.ipv4_gateway)
        .bind(subnet.prefix_length)
        .bind(subnet.mtu)
        .bind(subnet.status.as_str())
        .bind(subnet.created)
        .bind(subnet.updated)
        .bind(subnet.created_by.into_inner())
        .fetch_one(&mut *conn)
        .await
        .map_err(FleetError::from_write_error)?;

        Subnet::try_from(row)
    }

    async fn get_by_id(
        &self,
        tx: Option<&mut PgConnection>,
        id: SubnetId,
        relations: &[Relation],
    ) -> FleetResult<Subnet> {
        debug!("Finding subnet by id: {}", id);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let mut subnet = find(&mut conn, id).await?;
        attach_tenants(&mut conn, slice::from_mut(&mut subnet), relations).await?;
        Ok(subnet)
    }

    async fn get_all(
        &self,
        tx: Option<&mut PgConnection>,
        filter: &SubnetFilter,
        page: &PageRequest,
        relations: &[Relation],
    ) -> FleetResult<PageResult<Subnet>> {
        debug!("Listing subnets: {:?}, {:?}", filter, page);

        let query = filter.filtered(&SUBNET_TABLE);
        let mut conn = connection(self.pool.inner(), tx).await?;
        let mut result = paginate::<SubnetRow>(&mut conn, &query, page, &SUBNET_TABLE)
            .await?
            .try_map(Subnet::try_from)?;

        attach_tenants(&mut conn, &mut result.items, relations).await?;
        Ok(result)
    }

    async fn get_count_by_status(
        &self,
        tx: Option<&mut PgConnection>,
        tenant_id: Option<TenantId>,
    ) -> FleetResult<SubnetStatusCounts> {
        debug!("Counting subnets by status for tenant {:?}", tenant_id);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM subnet
            WHERE deleted IS NULL AND ($1::uuid IS NULL OR tenant_id = $1)
            GROUP BY status
            "#,
        )
        .bind(tenant_id.map(TenantId::into_inner))
        .fetch_all(&mut *conn)
        .await?;

        let mut counts = SubnetStatusCounts::default();
        for (status, count) in rows {
            counts.add(stored_status(&status)?, u64::try_from(count).unwrap_or_default());
        }
        Ok(counts)
    }

    async fn update(
        &self,
        tx: Option<&mut PgConnection>,
        id: SubnetId,
        input: UpdateSubnet,
    ) -> FleetResult<Subnet> {
        input.validate_input()?;
        debug!("Updating subnet: {}", id);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let mut subnet = find(&mut conn, id).await?;
        if input.is_empty() {
            return Ok(subnet);
        }
        subnet.apply(input);

        let row = sqlx::query_as::<_, SubnetRow>(
            r#"
            UPDATE subnet
            SET name = $2, description = $3, ipv4_prefix = $4, ipv4_gateway = $5,
                prefix_length = $6, mtu = $7, status = $8, updated = $9
            WHERE id = $1 AND deleted IS NULL
            RETURNING *
            "#,
        )
        .bind(id.into_inner())
        .bind(&subnet.name)
        .bind(&subnet.description)
        .bind(&subnet.ipv4_prefix)
        .bind(&subnet.ipv4_gateway)
        .bind(subnet.prefix_length)
        .bind(subnet.mtu)
        .bind(subnet.status.as_str())
        .bind(subnet.updated)
        .fetch_optional(&mut *conn)
        .await
        .map_err(FleetError::from_write_error)?;

        row.map(Subnet::try_from)
            .transpose()?
            .ok_or_else(|| FleetError::not_found(SUBNET_TABLE.entity, id))
    }

    async fn clear(
        &self,
        tx: Option<&mut PgConnection>,
        id: SubnetId,
        fields: SubnetClear,
    ) -> FleetResult<Subnet> {
        debug!("Clearing subnet {}: {:?}", id, fields);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let mut subnet = find(&mut conn, id).await?;
        if fields.is_empty() {
            return Ok(subnet);
        }
        subnet.clear(fields);

        let row = sqlx::query_as::<_, SubnetRow>(
            r#"
            UPDATE subnet
            SET description = $2, ipv4_prefix = $3, ipv4_gateway = $4, mtu = $5, updated = $6
            WHERE id = $1 AND deleted IS NULL
            RETURNING *
            "#,
        )
        .bind(id.into_inner())
        .bind(&subnet.description)
        .bind(&subnet.ipv4_prefix)
        .bind(&subnet.ipv4_gateway)
        .bind(subnet.mtu)
        .bind(subnet.updated)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(Subnet::try_from)
            .transpose()?
            .ok_or_else(|| FleetError::not_found(SUBNET_TABLE.entity, id))
    }

    async fn delete(&self, tx: Option<&mut PgConnection>, id: SubnetId) -> FleetResult<()> {
        let mut conn = connection(self.pool.inner(), tx).await?;
        let result = sqlx::query(
            "UPDATE subnet SET deleted = $2, updated = $2 WHERE id = $1 AND deleted IS NULL",
        )
        .bind(id.into_inner())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        debug!("Deleted subnet {} ({} rows)", id, result.rows_affected());
        Ok(())
    }
}
