//! Free-text search over an entity's searchable columns.
//!
//! A search string becomes one predicate: a PostgreSQL full-text match over
//! the concatenated columns, OR'ed with a case-insensitive substring match on
//! each column so partial words still find rows.

use sea_query::extension::postgres::PgExpr;
use sea_query::{Alias, Condition, Expr};

/// Text search configuration used for both the document and the query.
const TS_CONFIG: &str = "english";

/// Builds search predicates for one table alias and its searchable columns.
#[derive(Debug, Clone, Copy)]
pub struct SearchNormalizer<'a> {
    alias: &'a str,
    columns: &'a [&'a str],
}

impl<'a> SearchNormalizer<'a> {
    /// Creates a normalizer for columns of the table aliased `alias`.
    #[must_use]
    pub const fn new(alias: &'a str, columns: &'a [&'a str]) -> Self {
        Self { alias, columns }
    }

    /// Splits `raw` into lower-cased tokens.
    ///
    /// Every character other than alphanumerics and `-`, `_`, `.`, `@` is
    /// removed, and tokens left empty are dropped.
    #[must_use]
    pub fn terms(raw: &str) -> Vec<String> {
        raw.split_whitespace()
            .map(|term| {
                term.chars()
                    .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
                    .flat_map(char::to_lowercase)
                    .collect::<String>()
            })
            .filter(|term| !term.is_empty())
            .collect()
    }

    /// The `to_tsquery` input for `raw`: all terms joined with `&`.
    #[must_use]
    pub fn ts_query(raw: &str) -> Option<String> {
        let terms = Self::terms(raw);
        if terms.is_empty() {
            None
        } else {
            Some(terms.join(" & "))
        }
    }

    /// The search predicate for `raw`, or `None` when there is nothing to search.
    #[must_use]
    pub fn predicate(&self, raw: Option<&str>) -> Option<Condition> {
        let raw = raw?.trim();
        if self.columns.is_empty() {
            return None;
        }
        let ts_query = Self::ts_query(raw)?;

        let pattern = format!("%{}%", escape_like_wildcards(raw));
        let full_text = Expr::cust_with_values(
            format!(
                "to_tsvector('{TS_CONFIG}', {}) @@ to_tsquery('{TS_CONFIG}', $1)",
                self.document()
            ),
            [ts_query],
        );

        Some(self.columns.iter().fold(Condition::any().add(full_text), |any, column| {
            any.add(self.col(column).ilike(pattern.as_str()))
        }))
    }

    /// `coalesce(a.c1, ' ') || ' ' || coalesce(a.c2, ' ') ...`
    fn document(&self) -> String {
        self.columns
            .iter()
            .map(|column| format!(r#"coalesce("{}"."{}", ' ')"#, self.alias, column))
            .collect::<Vec<_>>()
            .join(" || ' ' || ")
    }

    fn col(&self, column: &str) -> Expr {
        Expr::col((Alias::new(self.alias), Alias::new(column)))
    }
}

/// Escapes SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
#[must_use]
pub fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{PostgresQueryBuilder, Query};

    const COLUMNS: &[&str] = &["name", "description"];

    fn render(predicate: Condition) -> String {
        Query::select()
            .expr(Expr::val(1))
            .cond_where(predicate)
            .to_string(PostgresQueryBuilder)
    }

    #[test]
    fn test_terms_are_normalized() {
        assert_eq!(
            SearchNormalizer::terms("  San  JOSE!  (usa) "),
            vec!["san", "jose", "usa"]
        );
        assert_eq!(
            SearchNormalizer::terms("ops@acme.io web-01 db_2"),
            vec!["ops@acme.io", "web-01", "db_2"]
        );
        assert!(SearchNormalizer::terms("!!! ()").is_empty());
    }

    #[test]
    fn test_terms_are_conjunctive() {
        assert_eq!(
            SearchNormalizer::ts_query("San Jose USA").as_deref(),
            Some("san & jose & usa")
        );
    }

    #[test]
    fn test_empty_search_has_no_predicate() {
        let search = SearchNormalizer::new("su", COLUMNS);
        assert!(search.predicate(None).is_none());
        assert!(search.predicate(Some("")).is_none());
        assert!(search.predicate(Some("   ")).is_none());
        assert!(search.predicate(Some("&|!")).is_none());
    }

    #[test]
    fn test_no_columns_has_no_predicate() {
        let search = SearchNormalizer::new("su", &[]);
        assert!(search.predicate(Some("web")).is_none());
    }

    #[test]
    fn test_predicate_combines_full_text_and_substring() {
        let search = SearchNormalizer::new("su", COLUMNS);
        let sql = render(search.predicate(Some("Web Tier")).unwrap());

        assert!(
            sql.contains(
                r#"to_tsvector('english', coalesce("su"."name", ' ') || ' ' || coalesce("su"."description", ' '))"#
            ),
            "{sql}"
        );
        assert!(sql.contains("to_tsquery('english', 'web & tier')"), "{sql}");
        assert!(sql.contains(r#""su"."name" ILIKE '%Web Tier%'"#), "{sql}");
        assert!(sql.contains(r#""su"."description" ILIKE '%Web Tier%'"#), "{sql}");
        assert_eq!(sql.matches(" OR ").count(), 2, "{sql}");
    }

    #[test]
    fn test_quote_in_search_is_stripped_from_terms() {
        let search = SearchNormalizer::new("su", COLUMNS);
        let sql = render(search.predicate(Some("x'; DROP TABLE subnet; --")).unwrap());
        assert!(sql.contains("to_tsquery('english', 'x & drop & table & subnet & --')"), "{sql}");
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100\\%");
        assert_eq!(escape_like_wildcards("a_b"), "a\\_b");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\\\b");
    }
}
