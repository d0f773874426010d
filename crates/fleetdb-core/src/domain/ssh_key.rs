//! SSH key entity.

use super::Tenant;
use crate::validation::rules::{not_blank, ssh_public_key};
use crate::{SshKeyId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A public key that tenant instances accept for SSH login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshKey {
    pub id: SshKeyId,
    pub name: String,
    pub org: String,
    pub tenant_id: TenantId,
    pub public_key: String,
    pub fingerprint: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: UserId,
    /// Owning tenant, present only when the relation was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
}

/// Input for creating an SSH key.
#[derive(Debug, Clone, Validate)]
pub struct CreateSshKey {
    /// Explicit ID; a new one is generated when absent.
    pub id: Option<SshKeyId>,
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub org: String,
    pub tenant_id: TenantId,
    #[validate(custom(function = "ssh_public_key"))]
    pub public_key: String,
    #[validate(length(max = 256))]
    pub fingerprint: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub created_by: UserId,
}

/// Partial update for an SSH key. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateSshKey {
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub org: Option<String>,
    pub tenant_id: Option<TenantId>,
    #[validate(custom(function = "ssh_public_key"))]
    pub public_key: Option<String>,
    #[validate(length(max = 256))]
    pub fingerprint: Option<String>,
    pub expires: Option<DateTime<Utc>>,
}

impl UpdateSshKey {
    /// Returns true if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.org.is_none()
            && self.tenant_id.is_none()
            && self.public_key.is_none()
            && self.fingerprint.is_none()
            && self.expires.is_none()
    }
}

impl SshKey {
    /// Creates a key stamped with the current time.
    #[must_use]
    pub fn new(input: CreateSshKey) -> Self {
        let now = Utc::now();
        Self {
            id: input.id.unwrap_or_default(),
            name: input.name,
            org: input.org,
            tenant_id: input.tenant_id,
            public_key: input.public_key,
            fingerprint: input.fingerprint,
            expires: input.expires,
            created: now,
            updated: now,
            deleted: None,
            created_by: input.created_by,
            tenant: None,
        }
    }

    /// Applies a partial update. Touches `updated` only if something changed.
    pub fn apply(&mut self, update: UpdateSshKey) {
        if update.is_empty() {
            return;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(org) = update.org {
            self.org = org;
        }
        if let Some(tenant_id) = update.tenant_id {
            self.tenant_id = tenant_id;
            self.tenant = None;
        }
        if let Some(public_key) = update.public_key {
            self.public_key = public_key;
        }
        if let Some(fingerprint) = update.fingerprint {
            self.fingerprint = Some(fingerprint);
        }
        if let Some(expires) = update.expires {
            self.expires = Some(expires);
        }
        self.touch();
    }

    /// Sets `updated` to now.
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// Returns true if the key has an expiry in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|expires| expires <= Utc::now())
    }
}
