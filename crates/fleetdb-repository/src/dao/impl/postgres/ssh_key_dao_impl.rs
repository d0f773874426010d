//! PostgreSQL SSH key DAO implementation.

use super::attach_tenants;
use crate::dao::ssh_key_dao::{SshKeyDao, SshKeyFilter, SSH_KEY_TABLE};
use crate::dao::Relation;
use crate::{connection, paginate, DatabasePoolInterface, QueryFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetdb_core::{
    CreateSshKey, FleetError, FleetResult, PageRequest, PageResult, SshKey, SshKeyId, TenantId,
    UpdateSshKey, UserId, ValidateExt,
};
use shaku::Component;
use sqlx::{FromRow, PgConnection};
use std::slice;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL SSH key DAO.
#[derive(Component, Clone)]
#[shaku(interface = SshKeyDao)]
pub struct PgSshKeyDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgSshKeyDaoImpl {
    /// Creates a new SSH key DAO.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SshKeyRow {
    id: Uuid,
    name: String,
    org: String,
    tenant_id: Uuid,
    public_key: String,
    fingerprint: Option<String>,
    expires: Option<DateTime<Utc>>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    deleted: Option<DateTime<Utc>>,
    created_by: Uuid,
}

impl From<SshKeyRow> for SshKey {
    fn from(row: SshKeyRow) -> Self {
        Self {
            id: SshKeyId::from_uuid(row.id),
            name: row.name,
            org: row.org,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            public_key: row.public_key,
            fingerprint: row.fingerprint,
            expires: row.expires,
            created: row.created,
            updated: row.updated,
            deleted: row.deleted,
            created_by: UserId::from_uuid(row.created_by),
            tenant: None,
        }
    }
}

async fn find(conn: &mut PgConnection, id: SshKeyId) -> FleetResult<SshKey> {
    let row = sqlx::query_as::<_, SshKeyRow>(
        "SELECT * FROM ssh_key WHERE id = $1 AND deleted IS NULL",
    )
    .bind(id.into_inner())
    .fetch_optional(conn)
    .await?;

    row.map(SshKey::from)
        .ok_or_else(|| FleetError::not_found(SSH_KEY_TABLE.entity, id))
}

#[async_trait]
impl SshKeyDao for PgSshKeyDaoImpl {
    async fn create(&self, tx: Option<&mut PgConnection>, input: CreateSshKey) -> FleetResult<SshKey> {
        input.validate_input()?;
        let key = SshKey::new(input);
        debug!("Creating SSH key {} for tenant {}", key.name, key.tenant_id);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let row = sqlx::query_as::<_, SshKeyRow>(
            r#"
            INSERT INTO ssh_key (id, name, org, tenant_id, public_key, fingerprint, expires,
                                 created, updated, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(key.id.into_inner())
        .bind(&key.name)
        .bind(&key.org)
        .bind(key.tenant_id.into_inner())
        .bind(&key.public_key)
        .bind(&key.fingerprint)
        .bind(key.expires)
        .bind(key.created)
        .bind(key.updated)
        .bind(key.created_by.into_inner())
        .fetch_one(&mut *conn)
        .await
        .map_err(FleetError::from_write_error)?;

        Ok(row.into())
    }

    async fn get_by_id(
        &self,
        tx: Option<&mut PgConnection>,
        id: SshKeyId,
        relations: &[Relation],
    ) -> FleetResult<SshKey> {
        debug!("Finding SSH key by id: {}", id);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let mut key = find(&mut conn, id).await?;
        attach_tenants(&mut conn, slice::from_mut(&mut key), relations).await?;
        Ok(key)
    }

    async fn get_all(
        &self,
        tx: Option<&mut PgConnection>,
        filter: &SshKeyFilter,
        page: &PageRequest,
        relations: &[Relation],
    ) -> FleetResult<PageResult<SshKey>> {
        debug!("Listing SSH keys: {:?}, {:?}", filter, page);

        let query = filter.filtered(&SSH_KEY_TABLE);
        let mut conn = connection(self.pool.inner(), tx).await?;
        let mut result = paginate::<SshKeyRow>(&mut conn, &query, page, &SSH_KEY_TABLE)
            .await?
            .map(SshKey::from);

        attach_tenants(&mut conn, &mut result.items, relations).await?;
        Ok(result)
    }

    async fn update(
        &self,
        tx: Option<&mut PgConnection>,
        id: SshKeyId,
        input: UpdateSshKey,
    ) -> FleetResult<SshKey> {
        input.validate_input()?;
        debug!("Updating SSH key: {}", id);

        let mut conn = connection(self.pool.inner(), tx).await?;
        let mut key = find(&mut conn, id).await?;
        if input.is_empty() {
            return Ok(key);
        }
        key.apply(input);

        let row = sqlx::query_as::<_, SshKeyRow>(
            r#"
            UPDATE ssh_key
            SET name = $2, org = $3, tenant_id = $4, public_key = $5, fingerprint = $6,
                expires = $7, updated = $8
            WHERE id = $1 AND deleted IS NULL
            RETURNING *
            "#,
        )
        .bind(id.into_inner())
        .bind(&key.name)
        .bind(&key.org)
        .bind(key.tenant_id.into_inner())
        .bind(&key.public_key)
        .bind(&key.fingerprint)
        .bind(key.expires)
        .bind(key.updated)
        .fetch_optional(&mut *conn)
        .await
        .map_err(FleetError::from_write_error)?;

        row.map(SshKey::from)
            .ok_or_else(|| FleetError::not_found(SSH_KEY_TABLE.entity, id))
    }

    async fn delete(&self, tx: Option<&mut PgConnection>, id: SshKeyId) -> FleetResult<()> {
        let mut conn = connection(self.pool.inner(), tx).await?;
        let result = sqlx::query(
            r#"
            UPDATE ssh_key
            SET public_key = '', deleted = $2, updated = $2
            WHERE id = $1 AND deleted IS NULL
            "#,
        )
        .bind(id.into_inner())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        debug!("Deleted SSH key {} ({} rows)", id, result.rows_affected());
        Ok(())
    }
}
