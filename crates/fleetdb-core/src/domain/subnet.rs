//! Subnet entity and its lifecycle status.

use super::Tenant;
use crate::validation::rules::{ipv4_address, not_blank};
use crate::{FleetError, SubnetId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Provisioning status of a subnet. Stored as its name, e.g. `"Ready"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubnetStatus {
    #[default]
    Pending,
    Provisioning,
    Ready,
    Error,
    Deleting,
    Deleted,
    Unknown,
}

impl SubnetStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Provisioning,
        Self::Ready,
        Self::Error,
        Self::Deleting,
        Self::Deleted,
        Self::Unknown,
    ];

    /// The stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Provisioning => "Provisioning",
            Self::Ready => "Ready",
            Self::Error => "Error",
            Self::Deleting => "Deleting",
            Self::Deleted => "Deleted",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns true once the subnet is being or has been torn down.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleting | Self::Deleted)
    }
}

impl fmt::Display for SubnetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubnetStatus {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| FleetError::validation(format!("unknown subnet status '{s}'")))
    }
}

/// An IPv4 network segment owned by a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: SubnetId,
    pub name: String,
    pub description: Option<String>,
    pub org: String,
    pub tenant_id: TenantId,
    pub ipv4_prefix: Option<String>,
    pub ipv4_gateway: Option<String>,
    pub prefix_length: i32,
    pub mtu: Option<i32>,
    pub status: SubnetStatus,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: UserId,
    /// Owning tenant, present only when the relation was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
}

/// Input for creating a subnet.
#[derive(Debug, Clone, Validate)]
pub struct CreateSubnet {
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub org: String,
    pub tenant_id: TenantId,
    #[validate(custom(function = "ipv4_address"))]
    pub ipv4_prefix: Option<String>,
    #[validate(custom(function = "ipv4_address"))]
    pub ipv4_gateway: Option<String>,
    #[validate(range(min = 1, max = 32))]
    pub prefix_length: i32,
    #[validate(range(min = 576, max = 9216))]
    pub mtu: Option<i32>,
    pub status: SubnetStatus,
    pub created_by: UserId,
}

/// Partial update for a subnet. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateSubnet {
    #[validate(length(min = 1, max = 256), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    #[validate(custom(function = "ipv4_address"))]
    pub ipv4_prefix: Option<String>,
    #[validate(custom(function = "ipv4_address"))]
    pub ipv4_gateway: Option<String>,
    #[validate(range(min = 1, max = 32))]
    pub prefix_length: Option<i32>,
    #[validate(range(min = 576, max = 9216))]
    pub mtu: Option<i32>,
    pub status: Option<SubnetStatus>,
}

impl UpdateSubnet {
    /// Returns true if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.ipv4_prefix.is_none()
            && self.ipv4_gateway.is_none()
            && self.prefix_length.is_none()
            && self.mtu.is_none()
            && self.status.is_none()
    }
}

/// Nullable subnet fields to reset to NULL. `true` clears the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubnetClear {
    pub description: bool,
    pub ipv4_prefix: bool,
    pub ipv4_gateway: bool,
    pub mtu: bool,
}

impl SubnetClear {
    /// Returns true if no field would be cleared.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.description || self.ipv4_prefix || self.ipv4_gateway || self.mtu)
    }
}

/// Live subnet counts per status.
///
/// Every status is present, so a status with no subnets reads as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetStatusCounts {
    pub total: u64,
    pub by_status: HashMap<SubnetStatus, u64>,
}

impl Default for SubnetStatusCounts {
    fn default() -> Self {
        Self {
            total: 0,
            by_status: SubnetStatus::ALL.into_iter().map(|status| (status, 0)).collect(),
        }
    }
}

impl SubnetStatusCounts {
    /// Adds `count` subnets in `status`.
    pub fn add(&mut self, status: SubnetStatus, count: u64) {
        *self.by_status.entry(status).or_default() += count;
        self.total += count;
    }

    /// Count for one status.
    #[must_use]
    pub fn get(&self, status: SubnetStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or_default()
    }
}

impl Subnet {
    /// Creates a subnet stamped with the current time.
    #[must_use]
    pub fn new(input: CreateSubnet) -> Self {
        let now = Utc::now();
        Self {
            id: SubnetId::new(),
            name: input.name,
            description: input.description,
            org: input.org,
            tenant_id: input.tenant_id,
            ipv4_prefix: input.ipv4_prefix,
            ipv4_gateway: input.ipv4_gateway,
            prefix_length: input.prefix_length,
            mtu: input.mtu,
            status: input.status,
            created: now,
            updated: now,
            deleted: None,
            created_by: input.created_by,
            tenant: None,
        }
    }

    /// Applies a partial update. Touches `updated` only if something changed.
    pub fn apply(&mut self, update: UpdateSubnet) {
        if update.is_empty() {
            return;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(prefix) = update.ipv4_prefix {
            self.ipv4_prefix = Some(prefix);
        }
        if let Some(gateway) = update.ipv4_gateway {
            self.ipv4_gateway = Some(gateway);
        }
        if let Some(prefix_length) = update.prefix_length {
            self.prefix_length = prefix_length;
        }
        if let Some(mtu) = update.mtu {
            self.mtu = Some(mtu);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.touch();
    }

    /// Resets the selected fields to `None`. Touches `updated` only if any was selected.
    pub fn clear(&mut self, fields: SubnetClear) {
        if fields.is_empty() {
            return;
        }
        if fields.description {
            self.description = None;
        }
        if fields.ipv4_prefix {
            self.ipv4_prefix = None;
        }
        if fields.ipv4_gateway {
            self.ipv4_gateway = None;
        }
        if fields.mtu {
            self.mtu = None;
        }
        self.touch();
    }

    /// Sets `updated` to now.
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }
}
