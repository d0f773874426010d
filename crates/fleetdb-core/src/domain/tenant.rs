//! Tenant entity.

use crate::validation::rules::not_blank;
use crate::{TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Per-tenant feature switches, stored as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantConfig {
    /// Whether instances of this tenant accept SSH logins.
    pub enable_ssh_access: bool,
    /// Whether the tenant may place instances on specific machines.
    pub targeted_instance_creation: bool,
}

/// An organization's tenancy in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub display_name: Option<String>,
    pub org: String,
    pub org_display_name: Option<String>,
    pub config: TenantConfig,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: UserId,
}

/// Input for creating a tenant.
#[derive(Debug, Clone, Validate)]
pub struct CreateTenant {
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 256))]
    pub display_name: Option<String>,
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub org: String,
    #[validate(length(max = 256))]
    pub org_display_name: Option<String>,
    pub config: TenantConfig,
    pub created_by: UserId,
}

/// Partial update for a tenant. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateTenant {
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 256))]
    pub display_name: Option<String>,
    #[validate(length(max = 256))]
    pub org_display_name: Option<String>,
    pub config: Option<TenantConfig>,
}

impl UpdateTenant {
    /// Returns true if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.display_name.is_none()
            && self.org_display_name.is_none()
            && self.config.is_none()
    }
}

impl Tenant {
    /// Creates a tenant stamped with the current time.
    #[must_use]
    pub fn new(input: CreateTenant) -> Self {
        let now = Utc::now();
        Self {
            id: TenantId::new(),
            name: input.name,
            display_name: input.display_name,
            org: input.org,
            org_display_name: input.org_display_name,
            config: input.config,
            created: now,
            updated: now,
            deleted: None,
            created_by: input.created_by,
        }
    }

    /// Applies a partial update. Touches `updated` only if something changed.
    pub fn apply(&mut self, update: UpdateTenant) {
        if update.is_empty() {
            return;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(display_name) = update.display_name {
            self.display_name = Some(display_name);
        }
        if let Some(org_display_name) = update.org_display_name {
            self.org_display_name = Some(org_display_name);
        }
        if let Some(config) = update.config {
            self.config = config;
        }
        self.touch();
    }

    /// Sets `updated` to now.
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// Returns true if the tenant has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidateExt;

    fn input() -> CreateTenant {
        CreateTenant {
            name: "acme".to_string(),
            display_name: Some("Acme".to_string()),
            org: "acme-org".to_string(),
            org_display_name: None,
            config: TenantConfig {
                enable_ssh_access: true,
                targeted_instance_creation: false,
            },
            created_by: UserId::new(),
        }
    }

    #[test]
    fn test_new_stamps_timestamps() {
        let tenant = Tenant::new(input());
        assert_eq!(tenant.created, tenant.updated);
        assert!(!tenant.is_deleted());
        assert!(tenant.config.enable_ssh_access);
    }

    #[test]
    fn test_apply_touches_updated() {
        let mut tenant = Tenant::new(input());
        let before = tenant.updated;
        tenant.apply(UpdateTenant {
            name: Some("acme-2".to_string()),
            ..Default::default()
        });
        assert_eq!(tenant.name, "acme-2");
        assert!(tenant.updated >= before);
        assert_eq!(tenant.display_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_empty_update_keeps_updated() {
        let mut tenant = Tenant::new(input());
        let before = tenant.updated;
        tenant.apply(UpdateTenant::default());
        assert_eq!(tenant.updated, before);
    }

    #[test]
    fn test_create_validation() {
        assert!(input().validate_input().is_ok());
        let mut bad = input();
        bad.org = " ".to_string();
        assert!(bad.validate_input().is_err());
    }

    #[test]
    fn test_config_json_keys() {
        let json = serde_json::to_value(TenantConfig {
            enable_ssh_access: true,
            targeted_instance_creation: true,
        })
        .unwrap();
        assert_eq!(json["enableSshAccess"], true);
        assert_eq!(json["targetedInstanceCreation"], true);

        let parsed: TenantConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, TenantConfig::default());
    }
}
