//! Offset pagination over a filtered entity query.
//!
//! Page parameters and the requested ordering are validated before anything
//! touches the database. The total is counted over the filtered query
//! wrapped as a subquery, and the page itself is fetched from a separate copy
//! of that query with the resolved ORDER BY, LIMIT and OFFSET applied. The
//! caller's query is never modified.
//!
//! Without a caller transaction, rows written between the count and the fetch
//! can make `total` and the page disagree.

use crate::filter::EntityTable;
use async_trait::async_trait;
use fleetdb_core::{FleetResult, OrderDirection, OrderPlan, PageBounds, PageRequest, PageResult};
use sea_query::{Alias, Asterisk, Expr, Order, PostgresQueryBuilder, Query, SelectStatement};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection};
use tracing::debug;

/// Runs a `SELECT COUNT(*)` statement and returns the count.
#[async_trait]
pub trait RowCounter: Send {
    /// Executes `sql`, which yields a single `bigint`.
    async fn count_rows(&mut self, sql: &str) -> FleetResult<u64>;
}

#[async_trait]
impl RowCounter for PgConnection {
    async fn count_rows(&mut self, sql: &str) -> FleetResult<u64> {
        let count: i64 = sqlx::query_scalar(sql)
            .persistent(false)
            .fetch_one(&mut *self)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// A bounded query ready to fetch one page, plus the total it was counted against.
#[derive(Debug, Clone)]
pub struct Paginator {
    /// Filtered query with ORDER BY, LIMIT and OFFSET applied.
    pub query: SelectStatement,
    /// Rows matching the filter, ignoring offset and limit.
    pub total: u64,
    /// Effective limit.
    pub limit: u64,
    /// Effective offset.
    pub offset: u64,
    /// ORDER BY terms applied to `query`.
    pub plan: OrderPlan,
}

impl Paginator {
    /// Validates `request`, counts the rows matching `filtered`, and builds
    /// the bounded page query.
    ///
    /// # Errors
    ///
    /// `InvalidPageParams` or `InvalidSortField` before any statement runs;
    /// otherwise whatever the counter returns.
    pub async fn new<C>(
        counter: &mut C,
        filtered: &SelectStatement,
        request: &PageRequest,
        table: &EntityTable,
    ) -> FleetResult<Self>
    where
        C: RowCounter + ?Sized,
    {
        let bounds = request.bounds()?;
        let plan = OrderPlan::resolve(&request.order_by, &table.order_by)?;

        let count_sql = count_statement(filtered).to_string(PostgresQueryBuilder);
        let total = counter.count_rows(&count_sql).await?;

        let query = bounded_statement(filtered, table, &plan, bounds);

        debug!(
            entity = table.entity,
            offset = bounds.offset,
            limit = bounds.limit,
            total,
            order = %plan,
            "Built paginated query"
        );

        Ok(Self {
            query,
            total,
            limit: bounds.limit,
            offset: bounds.offset,
            plan,
        })
    }

    /// Renders the bounded query.
    #[must_use]
    pub fn sql(&self) -> String {
        self.query.to_string(PostgresQueryBuilder)
    }
}

/// `SELECT COUNT(*) FROM (<filtered>) AS filtered`, built from a copy of `filtered`.
#[must_use]
pub fn count_statement(filtered: &SelectStatement) -> SelectStatement {
    Query::select()
        .expr(Expr::col(Asterisk).count())
        .from_subquery(filtered.clone(), Alias::new("filtered"))
        .to_owned()
}

/// A copy of `filtered` ordered by `plan` and bounded by `bounds`.
#[must_use]
pub fn bounded_statement(
    filtered: &SelectStatement,
    table: &EntityTable,
    plan: &OrderPlan,
    bounds: PageBounds,
) -> SelectStatement {
    let mut query = filtered.clone();
    apply_order(&mut query, table, plan);
    query.limit(bounds.limit).offset(bounds.offset);
    query
}

/// Appends `plan` to the ORDER BY of `query`, qualified by the table alias.
pub(crate) fn apply_order(query: &mut SelectStatement, table: &EntityTable, plan: &OrderPlan) {
    for spec in plan {
        query.order_by(
            (Alias::new(table.alias), Alias::new(spec.field())),
            sql_order(spec.direction()),
        );
    }
}

fn sql_order(direction: OrderDirection) -> Order {
    match direction {
        OrderDirection::Ascending => Order::Asc,
        OrderDirection::Descending => Order::Desc,
    }
}

/// Counts, then fetches one page of `T` on the same connection.
pub async fn paginate<T>(
    conn: &mut PgConnection,
    filtered: &SelectStatement,
    request: &PageRequest,
    table: &EntityTable,
) -> FleetResult<PageResult<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let paginator = Paginator::new(&mut *conn, filtered, request, table).await?;
    let sql = paginator.sql();

    let items = sqlx::query_as::<_, T>(&sql)
        .persistent(false)
        .fetch_all(&mut *conn)
        .await?;

    Ok(PageResult::new(items, paginator.total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::QueryFilter;
    use fleetdb_core::{FleetError, OrderBy, OrderByConfig};

    const WIDGETS: EntityTable = EntityTable {
        entity: "Widget",
        name: "widget",
        alias: "wd",
        order_by: OrderByConfig::new(&["name", "status", "created"], "created"),
        search_columns: &["name"],
    };

    #[derive(Default)]
    struct RecordingCounter {
        total: u64,
        statements: Vec<String>,
    }

    #[async_trait]
    impl RowCounter for RecordingCounter {
        async fn count_rows(&mut self, sql: &str) -> FleetResult<u64> {
            self.statements.push(sql.to_string());
            Ok(self.total)
        }
    }

    struct StatusFilter(&'static str);

    impl QueryFilter for StatusFilter {
        fn apply(&self, query: &mut SelectStatement) {
            query.cond_where(WIDGETS.col("status").eq(self.0));
        }
    }

    fn filtered() -> SelectStatement {
        StatusFilter("Ready").filtered(&WIDGETS)
    }

    #[tokio::test]
    async fn test_defaults() {
        let mut counter = RecordingCounter {
            total: 25,
            ..Default::default()
        };
        let paginator = Paginator::new(&mut counter, &filtered(), &PageRequest::new(), &WIDGETS)
            .await
            .unwrap();

        assert_eq!(paginator.total, 25);
        assert_eq!(paginator.limit, 20);
        assert_eq!(paginator.offset, 0);
        let sql = paginator.sql();
        assert!(sql.ends_with(r#"ORDER BY "wd"."created" ASC LIMIT 20 OFFSET 0"#), "{sql}");
    }

    #[tokio::test]
    async fn test_count_has_filters_but_no_ordering() {
        let mut counter = RecordingCounter::default();
        let request = PageRequest::new()
            .with_limit(5)
            .with_offset(10)
            .order_by(OrderBy::desc("name"));
        Paginator::new(&mut counter, &filtered(), &request, &WIDGETS)
            .await
            .unwrap();

        assert_eq!(counter.statements.len(), 1);
        let count_sql = &counter.statements[0];
        let filtered_sql = filtered().to_string(PostgresQueryBuilder);
        assert_eq!(
            count_sql,
            &format!(r#"SELECT COUNT(*) FROM ({filtered_sql}) AS "filtered""#)
        );
        assert!(count_sql.contains(r#""wd"."status" = 'Ready'"#));
        assert!(!count_sql.contains("ORDER BY"));
        assert!(!count_sql.contains("LIMIT"));
    }

    #[tokio::test]
    async fn test_bounded_query_orders_and_limits() {
        let mut counter = RecordingCounter::default();
        let request = PageRequest::new()
            .with_limit(5)
            .with_offset(10)
            .order_by(OrderBy::desc("name"));
        let paginator = Paginator::new(&mut counter, &filtered(), &request, &WIDGETS)
            .await
            .unwrap();

        let sql = paginator.sql();
        assert!(sql.contains(r#""wd"."status" = 'Ready'"#), "{sql}");
        assert!(
            sql.ends_with(r#"ORDER BY "wd"."name" DESC, "wd"."created" ASC LIMIT 5 OFFSET 10"#),
            "{sql}"
        );
    }

    #[tokio::test]
    async fn test_input_query_is_not_mutated() {
        let query = filtered();
        let before = query.to_string(PostgresQueryBuilder);

        let mut counter = RecordingCounter::default();
        let request = PageRequest::new().order_by(OrderBy::asc("status"));
        let paginator = Paginator::new(&mut counter, &query, &request, &WIDGETS)
            .await
            .unwrap();

        assert_eq!(query.to_string(PostgresQueryBuilder), before);
        assert_ne!(paginator.sql(), before);
        assert!(!counter.statements[0].contains("ORDER BY"));
    }

    #[tokio::test]
    async fn test_invalid_sort_field_runs_nothing() {
        let mut counter = RecordingCounter::default();
        let request = PageRequest::new().order_by(OrderBy::asc("password"));
        let err = Paginator::new(&mut counter, &filtered(), &request, &WIDGETS)
            .await
            .unwrap_err();

        assert!(matches!(err, FleetError::InvalidSortField { ref field, .. } if field == "password"));
        assert!(counter.statements.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_page_params_run_nothing() {
        for request in [
            PageRequest::new().with_limit(0),
            PageRequest::new().with_offset(-1),
        ] {
            let mut counter = RecordingCounter::default();
            let err = Paginator::new(&mut counter, &filtered(), &request, &WIDGETS)
                .await
                .unwrap_err();
            assert!(matches!(err, FleetError::InvalidPageParams(_)));
            assert!(counter.statements.is_empty());
        }
    }

    #[test]
    fn test_count_statement_is_independent_copy() {
        let query = filtered();
        let mut count = count_statement(&query);
        count.limit(1);
        assert!(!query.to_string(PostgresQueryBuilder).contains("LIMIT"));
    }
}
