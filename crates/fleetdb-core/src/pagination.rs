//! Pagination and ordering types for list operations.
//!
//! A [`PageRequest`] carries the caller's offset, limit and requested
//! ordering. Requested fields are only turned into [`OrderSpec`]s after being
//! checked against an entity's [`OrderByConfig`], and an [`OrderPlan`] always
//! ends with the entity's tie-break field so results come back in a stable order.

use crate::{FleetError, FleetResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page size used when the caller does not set a limit.
pub const DEFAULT_LIMIT: i64 = 20;

/// Page size callers pass when they want every matching row in one page.
///
/// It is not enforced as a cap on `limit`.
pub const TOTAL_LIMIT: i64 = 10_000;

/// Sort direction of one ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Smallest first.
    #[default]
    #[serde(rename = "ASC", alias = "asc", alias = "ascending", alias = "ASCENDING")]
    Ascending,
    /// Largest first.
    #[serde(rename = "DESC", alias = "desc", alias = "descending", alias = "DESCENDING")]
    Descending,
}

impl OrderDirection {
    /// Returns the SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for OrderDirection {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" | "ASCENDING" => Ok(Self::Ascending),
            "DESC" | "DESCENDING" => Ok(Self::Descending),
            other => Err(FleetError::invalid_page_params(format!(
                "unknown order direction '{other}'"
            ))),
        }
    }
}

/// An ordering requested by a caller. Not yet checked against any allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Name of the field to sort by.
    pub field: String,
    /// Sort direction.
    #[serde(default)]
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates an ordering request.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Ascending ordering on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, OrderDirection::Ascending)
    }

    /// Descending ordering on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, OrderDirection::Descending)
    }

    /// Builds an ordering request from a raw direction string such as `"desc"`.
    pub fn parse(field: impl Into<String>, direction: &str) -> FleetResult<Self> {
        Ok(Self::new(field, direction.parse()?))
    }
}

/// Sortable fields of an entity and the field used to break ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderByConfig {
    /// Fields a caller may sort by.
    pub allowed_fields: &'static [&'static str],
    /// Field appended to every ordering; should be unique per row.
    pub default_field: &'static str,
}

impl OrderByConfig {
    /// Creates a configuration.
    #[must_use]
    pub const fn new(
        allowed_fields: &'static [&'static str],
        default_field: &'static str,
    ) -> Self {
        Self {
            allowed_fields,
            default_field,
        }
    }

    /// Returns true if `field` may be sorted by.
    #[must_use]
    pub fn is_allowed(&self, field: &str) -> bool {
        self.allowed_fields.contains(&field)
    }
}

/// A field and direction that passed allow-list validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    field: String,
    direction: OrderDirection,
}

impl OrderSpec {
    /// Validates `field` against `allowed_fields`.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidSortField`] if the field is not allowed.
    pub fn new(
        field: impl Into<String>,
        direction: OrderDirection,
        allowed_fields: &[&str],
    ) -> FleetResult<Self> {
        let field = field.into();
        if !allowed_fields.contains(&field.as_str()) {
            return Err(FleetError::invalid_sort_field(field, allowed_fields));
        }
        Ok(Self { field, direction })
    }

    /// Validates an [`OrderBy`] request.
    pub fn from_request(order_by: &OrderBy, allowed_fields: &[&str]) -> FleetResult<Self> {
        Self::new(order_by.field.clone(), order_by.direction, allowed_fields)
    }

    /// The validated field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The sort direction.
    #[must_use]
    pub const fn direction(&self) -> OrderDirection {
        self.direction
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

/// The final ORDER BY sequence for a paginated query.
///
/// Never empty, and the last entry is always the entity's default field.
/// Ordering is only deterministic if that field is unique per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    specs: Vec<OrderSpec>,
}

impl OrderPlan {
    /// Composes the caller's requested orderings with the entity's tie-break field.
    ///
    /// Requested orderings keep their order. A field requested twice keeps its
    /// first occurrence. When the default field is requested, anything after it
    /// is dropped; otherwise the default field is appended ascending.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidSortField`] for the first requested field
    /// outside the allow-list.
    pub fn resolve(requested: &[OrderBy], config: &OrderByConfig) -> FleetResult<Self> {
        let mut specs: Vec<OrderSpec> = Vec::with_capacity(requested.len() + 1);

        for (index, order_by) in requested.iter().enumerate() {
            let spec = OrderSpec::from_request(order_by, config.allowed_fields)?;
            if specs.iter().any(|s| s.field == spec.field) {
                continue;
            }
            let is_default = spec.field == config.default_field;
            specs.push(spec);
            if is_default {
                // The remaining requests still have to be valid fields.
                for rest in &requested[index + 1..] {
                    OrderSpec::from_request(rest, config.allowed_fields)?;
                }
                return Ok(Self { specs });
            }
        }

        specs.push(OrderSpec {
            field: config.default_field.to_string(),
            direction: OrderDirection::Ascending,
        });
        Ok(Self { specs })
    }

    /// Plan containing only the tie-break field, ascending.
    #[must_use]
    pub fn default_for(config: &OrderByConfig) -> Self {
        Self {
            specs: vec![OrderSpec {
                field: config.default_field.to_string(),
                direction: OrderDirection::Ascending,
            }],
        }
    }

    /// The ordered terms.
    #[must_use]
    pub fn specs(&self) -> &[OrderSpec] {
        &self.specs
    }

    /// The last term, which is always the tie-break field.
    #[must_use]
    pub fn tie_break(&self) -> Option<&OrderSpec> {
        self.specs.last()
    }

    /// Iterates over the terms in order.
    pub fn iter(&self) -> std::slice::Iter<'_, OrderSpec> {
        self.specs.iter()
    }

    /// Number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Always false for a resolved plan.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl fmt::Display for OrderPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.specs.iter().map(ToString::to_string).collect();
        f.write_str(&terms.join(", "))
    }
}

impl<'a> IntoIterator for &'a OrderPlan {
    type Item = &'a OrderSpec;
    type IntoIter = std::slice::Iter<'a, OrderSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

/// A request for a page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Number of rows to skip. Defaults to 0.
    #[serde(default)]
    pub offset: Option<i64>,
    /// Maximum number of rows to return. Defaults to [`DEFAULT_LIMIT`].
    #[serde(default)]
    pub limit: Option<i64>,
    /// Requested ordering. Empty means the entity's default ordering.
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
}

/// Offset and limit after validation and defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

impl PageRequest {
    /// Creates a request with default offset, limit and ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the offset.
    #[must_use]
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the limit.
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Appends an ordering request.
    #[must_use]
    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    /// Request for every matching row in one page.
    #[must_use]
    pub fn all() -> Self {
        Self::new().with_limit(TOTAL_LIMIT)
    }

    /// Validates offset and limit and applies defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidPageParams`] when offset is negative or
    /// limit is below 1.
    pub fn bounds(&self) -> FleetResult<PageBounds> {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        let offset = u64::try_from(offset).map_err(|_| {
            FleetError::invalid_page_params(format!("offset must not be negative, got {offset}"))
        })?;
        if limit < 1 {
            return Err(FleetError::invalid_page_params(format!(
                "limit must be at least 1, got {limit}"
            )));
        }
        let limit = u64::try_from(limit)
            .map_err(|_| FleetError::invalid_page_params("limit out of range"))?;

        Ok(PageBounds { offset, limit })
    }
}

/// One page of results and the number of rows matching the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult<T> {
    /// The rows on this page.
    pub items: Vec<T>,
    /// Rows matching the filter, ignoring offset and limit.
    pub total: u64,
}

impl<T> PageResult<T> {
    /// Creates a page.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    /// A page with no rows and a total of zero.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Maps the rows to a different type, keeping the total.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }

    /// Converts every row, failing on the first error.
    pub fn try_map<U, E, F: FnMut(T) -> Result<U, E>>(self, f: F) -> Result<PageResult<U>, E> {
        Ok(PageResult {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
        })
    }

    /// Returns true if the page has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of rows on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> IntoIterator for PageResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
