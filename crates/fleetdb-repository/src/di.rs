//! Dependency injection wiring using Shaku.

use crate::{DatabasePool, DatabasePoolParameters, PgSshKeyDaoImpl, PgSubnetDaoImpl, PgTenantDaoImpl};
use fleetdb_config::DatabaseConfig;
use fleetdb_core::{module, FleetResult};
use sqlx::PgPool;
use std::sync::Arc;

// Database pool plus one PostgreSQL DAO per entity.
module! {
    pub RepositoryModule {
        components = [
            DatabasePool,
            PgTenantDaoImpl,
            PgSshKeyDaoImpl,
            PgSubnetDaoImpl,
        ],
        providers = [],
    }
}

/// Connects to the database and builds the repository module.
pub async fn build_repository_module(config: &DatabaseConfig) -> FleetResult<Arc<RepositoryModule>> {
    let db_pool = DatabasePool::connect(config).await?;
    Ok(repository_module_with_pool(db_pool.inner().clone()))
}

/// Builds the repository module around an existing pool.
#[must_use]
pub fn repository_module_with_pool(pool: PgPool) -> Arc<RepositoryModule> {
    let module = RepositoryModule::builder()
        .with_component_parameters::<DatabasePool>(DatabasePoolParameters { pool })
        .build();
    Arc::new(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabasePoolInterface, SshKeyDao, SubnetDao, TenantDao};
    use fleetdb_core::HasComponent;

    #[tokio::test]
    async fn test_module_resolves_all_daos() {
        let config = DatabaseConfig {
            min_connections: 0,
            ..DatabaseConfig::default()
        };
        let pool = DatabasePool::connect_lazy(&config).unwrap();
        let module = repository_module_with_pool(pool.inner().clone());

        let _tenants: Arc<dyn TenantDao> = module.resolve();
        let _keys: Arc<dyn SshKeyDao> = module.resolve();
        let _subnets: Arc<dyn SubnetDao> = module.resolve();
        let db: Arc<dyn DatabasePoolInterface> = module.resolve();
        assert_eq!(db.inner().size(), 0);
    }

    #[tokio::test]
    async fn test_module_pool_is_the_given_pool() {
        let config = DatabaseConfig {
            min_connections: 0,
            ..DatabaseConfig::default()
        };
        let pool = DatabasePool::connect_lazy(&config).unwrap();
        let module = RepositoryModule::builder()
            .with_component_parameters::<DatabasePool>(DatabasePoolParameters {
                pool: pool.inner().clone(),
            })
            .build();

        let db: Arc<dyn DatabasePoolInterface> = module.resolve();
        db.close().await;
        assert!(pool.inner().is_closed());
    }
}
