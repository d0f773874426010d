//! Table descriptors and filter application for paginated listings.

use crate::search::SearchNormalizer;
use fleetdb_core::OrderByConfig;
use sea_query::{Alias, Asterisk, Expr, Query, SelectStatement, SimpleExpr};

/// Static description of an entity's table as the paginator needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityTable {
    /// Entity name used in logs and `NotFound` errors.
    pub entity: &'static str,
    /// Table name.
    pub name: &'static str,
    /// Alias every column reference is qualified with.
    pub alias: &'static str,
    /// Sortable fields and the tie-break field.
    pub order_by: OrderByConfig,
    /// Columns searched by free-text search.
    pub search_columns: &'static [&'static str],
}

impl EntityTable {
    /// `SELECT alias.* FROM name AS alias WHERE alias.deleted IS NULL`.
    #[must_use]
    pub fn select(&self) -> SelectStatement {
        Query::select()
            .column((Alias::new(self.alias), Asterisk))
            .from_as(Alias::new(self.name), Alias::new(self.alias))
            .cond_where(self.col("deleted").is_null())
            .to_owned()
    }

    /// Column qualified with the table alias.
    #[must_use]
    pub fn col(&self, column: &str) -> Expr {
        Expr::col((Alias::new(self.alias), Alias::new(column)))
    }

    /// Search normalizer over this table's searchable columns.
    #[must_use]
    pub fn search(&self) -> SearchNormalizer<'static> {
        SearchNormalizer::new(self.alias, self.search_columns)
    }
}

/// A set of filters that narrows an entity query.
///
/// Implementations only add `WHERE` conditions, always through `cond_where`.
/// They never order, limit or offset the query; that is left to the paginator.
pub trait QueryFilter {
    /// Adds this filter's conditions to `query`.
    fn apply(&self, query: &mut SelectStatement);

    /// Returns the entity's base query with this filter applied.
    fn filtered(&self, table: &EntityTable) -> SelectStatement {
        let mut query = table.select();
        self.apply(&mut query);
        query
    }
}

/// `column IN (values)` when `values` is non-empty.
pub(crate) fn in_values<V>(table: &EntityTable, column: &str, values: &[V]) -> Option<SimpleExpr>
where
    V: Clone + Into<sea_query::Value>,
{
    if values.is_empty() {
        None
    } else {
        Some(table.col(column).is_in(values.iter().cloned()))
    }
}
