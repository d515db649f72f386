//! List query construction and execution.
//!
//! # Responsibility
//! - Translate a [`ListQuery`] into one predicate shared by the page query
//!   and the count query.
//! - Execute both and assemble a [`ListResult`].
//!
//! # Invariants
//! - The page and count statements are rendered from the same [`Predicate`].
//! - An empty predicate renders no `WHERE` clause at all.
//! - All user-supplied values are bound, never interpolated.
//! - Page order is insertion order (`seq`).

use crate::context::OpContext;
use crate::db::{StoreHandle, UNICODE_LOWER_FN};
use crate::error::{query_error, DataError, DataResult};
use crate::model::assessment::HealthAssessment;
use crate::model::list_query::{Filter, ListQuery, ListResult};
use crate::repo::{decode_document, log_outcome};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::time::Instant;

const MODULE: &str = "query";
const OP: &str = "list";

const STATUS_PATH: &str = "$.data.status";
const DATE_PATH: &str = "$.data.date";
const AGE_PATH: &str = "$.data.detail.age";

/// Filter/search condition applied to both page and count queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<String>,
    binds: Vec<Value>,
}

/// Rendered SQL plus its bound values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

impl Predicate {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn push(&mut self, clause: String, value: Value) {
        self.clauses.push(clause);
        self.binds.push(value);
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", self.clauses.join(" AND "))
    }

    /// Windowed page statement.
    pub fn page_statement(&self, offset: u32, limit: u32) -> Statement {
        let mut binds = self.binds.clone();
        binds.push(Value::Integer(i64::from(limit)));
        binds.push(Value::Integer(i64::from(offset)));
        Statement {
            sql: format!(
                "SELECT doc_key, document FROM health_assessment{} ORDER BY seq ASC LIMIT ? OFFSET ?;",
                self.where_sql()
            ),
            binds,
        }
    }

    /// Unwindowed count statement.
    pub fn count_statement(&self) -> Statement {
        Statement {
            sql: format!(
                "SELECT COUNT(*) FROM health_assessment{};",
                self.where_sql()
            ),
            binds: self.binds.clone(),
        }
    }
}

/// Builds the listing predicate.
///
/// A non-empty `key_id` bypasses `filter` and `search` entirely.
///
/// # Errors
/// - `Validation` when a range filter carries more than two bounds.
pub fn build_predicate(query: &ListQuery) -> DataResult<Predicate> {
    let mut predicate = Predicate::default();

    if let Some(key) = query.key_id.as_deref().filter(|key| !key.is_empty()) {
        predicate.push("doc_key = ?".to_string(), Value::Text(key.to_string()));
        return Ok(predicate);
    }

    let text = query.search.text.as_str();
    if !text.is_empty() {
        predicate.push(
            format!(
                "{UNICODE_LOWER_FN}(json_extract(document, '{STATUS_PATH}')) \
                 LIKE {UNICODE_LOWER_FN}(?) ESCAPE '\\'"
            ),
            Value::Text(format!("%{}%", escape_like(text))),
        );
    }

    push_filter_clauses(&mut predicate, &query.filter)?;
    Ok(predicate)
}

fn push_filter_clauses(predicate: &mut Predicate, filter: &Filter) -> DataResult<()> {
    let date_bounds = range_bounds("dateAge", &filter.date_age)?;
    let date_expr = format!("json_extract(document, '{DATE_PATH}')");
    if let Some(lower) = date_bounds.0.filter(|value| !value.is_empty()) {
        predicate.push(format!("{date_expr} >= ?"), Value::Text(lower.clone()));
    }
    if let Some(upper) = date_bounds.1.filter(|value| !value.is_empty()) {
        predicate.push(format!("{date_expr} <= ?"), Value::Text(upper.clone()));
    }

    let age_bounds = range_bounds("age", &filter.age)?;
    let age_expr = format!("CAST(json_extract(document, '{AGE_PATH}') AS INTEGER)");
    if let Some(min) = age_bounds.0 {
        predicate.push(format!("{age_expr} >= ?"), Value::Integer(*min));
    }
    if let Some(max) = age_bounds.1 {
        predicate.push(format!("{age_expr} <= ?"), Value::Integer(*max));
    }

    let equality = [
        ("gender", &filter.gender),
        ("covid", &filter.covid),
        ("pcr", &filter.pcr),
        ("rapid", &filter.rapid),
    ];
    for (field, value) in equality {
        if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
            predicate.push(
                format!("json_extract(document, '$.data.detail.{field}') = ?"),
                Value::Text(value.to_string()),
            );
        }
    }

    Ok(())
}

fn range_bounds<'a, T>(
    name: &str,
    bounds: &'a [T],
) -> DataResult<(Option<&'a T>, Option<&'a T>)> {
    match bounds {
        [] => Ok((None, None)),
        [lower] => Ok((Some(lower), None)),
        [lower, upper] => Ok((Some(lower), Some(upper))),
        _ => Err(DataError::validation(
            OP,
            format!(
                "`{name}` expects at most two bounds, got {}",
                bounds.len()
            ),
        )),
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Runs the page query and, when needed, the count query.
///
/// An empty first page (`offset == 0`, `limit > 0`) means nothing matches,
/// so the count query is skipped. Empty pages caused by the window itself
/// still report the true total.
pub(crate) fn execute_list(
    store: &StoreHandle,
    ctx: &OpContext,
    query: &ListQuery,
) -> DataResult<ListResult> {
    let started_at = Instant::now();
    let result = build_predicate(query).and_then(|predicate| {
        let page = predicate.page_statement(query.offset, query.limit);
        let count = predicate.count_statement();
        debug!(
            "event=list_build module={MODULE} filtered={} offset={} limit={} page={}",
            !predicate.is_empty(),
            query.offset,
            query.limit,
            query.page
        );

        store.run(ctx, OP, |conn| {
            let items = fetch_page(ctx, conn, &page)?;
            if items.is_empty() && query.offset == 0 && query.limit > 0 {
                return Ok(ListResult::default());
            }
            let total_count = fetch_count(ctx, conn, &count)?;
            Ok(ListResult { items, total_count })
        })
    });

    let key = query.key_id.as_deref().unwrap_or("*");
    log_outcome(MODULE, OP, key, started_at, &result);
    result
}

fn fetch_page(
    ctx: &OpContext,
    conn: &Connection,
    page: &Statement,
) -> DataResult<Vec<HealthAssessment>> {
    let fail = |err| query_error(ctx, OP, &page.sql, err);

    let mut stmt = conn.prepare(&page.sql).map_err(fail)?;
    let mut rows = stmt.query(params_from_iter(page.binds.iter())).map_err(fail)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next().map_err(fail)? {
        let key: String = row.get(0).map_err(fail)?;
        let document: String = row.get(1).map_err(fail)?;
        items.push(decode_document(&key, &document)?);
    }
    Ok(items)
}

fn fetch_count(ctx: &OpContext, conn: &Connection, count: &Statement) -> DataResult<u64> {
    let total: i64 = conn
        .query_row(&count.sql, params_from_iter(count.binds.iter()), |row| {
            row.get(0)
        })
        .map_err(|err| query_error(ctx, OP, &count.sql, err))?;
    Ok(u64::try_from(total).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::{build_predicate, escape_like, execute_list};
    use crate::context::OpContext;
    use crate::db::open_live_store_in_memory;
    use crate::error::DataError;
    use crate::model::list_query::{Filter, ListQuery};
    use rusqlite::types::Value;

    #[test]
    fn empty_query_renders_no_where_clause() {
        let predicate = build_predicate(&ListQuery::window(0, 10)).unwrap();
        assert!(predicate.is_empty());

        let page = predicate.page_statement(0, 10);
        assert!(!page.sql.contains("WHERE"));
        assert_eq!(page.binds, vec![Value::Integer(10), Value::Integer(0)]);

        let count = predicate.count_statement();
        assert_eq!(count.sql, "SELECT COUNT(*) FROM health_assessment;");
        assert!(count.binds.is_empty());
    }

    #[test]
    fn page_and_count_share_the_same_predicate() {
        let query = ListQuery::window(5, 2)
            .with_search("pos")
            .with_filter(Filter {
                gender: Some("F".to_string()),
                ..Filter::default()
            });
        let predicate = build_predicate(&query).unwrap();
        let page = predicate.page_statement(5, 2);
        let count = predicate.count_statement();

        let where_of = |sql: &str| {
            let start = sql.find(" WHERE ").unwrap();
            let end = sql.find(" ORDER BY ").unwrap_or(sql.len() - 1);
            sql[start..end].to_string()
        };
        assert_eq!(where_of(&page.sql), where_of(&count.sql));
        assert_eq!(page.binds[..count.binds.len()], count.binds[..]);
    }

    #[test]
    fn key_lookup_bypasses_filter_and_search() {
        let query = ListQuery::window(0, 1)
            .with_key("abc")
            .with_search("ignored")
            .with_filter(Filter {
                age: vec![1, 2],
                ..Filter::default()
            });
        let predicate = build_predicate(&query).unwrap();
        let count = predicate.count_statement();
        assert_eq!(
            count.sql,
            "SELECT COUNT(*) FROM health_assessment WHERE doc_key = ?;"
        );
        assert_eq!(count.binds, vec![Value::Text("abc".to_string())]);
    }

    #[test]
    fn search_text_is_escaped_and_wrapped() {
        let query = ListQuery::window(0, 1).with_search(" 50%_off ");
        let predicate = build_predicate(&query).unwrap();
        assert_eq!(
            predicate.count_statement().binds,
            vec![Value::Text("% 50\\%\\_off %".to_string())]
        );
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn whitespace_search_still_builds_a_predicate() {
        let predicate = build_predicate(&ListQuery::window(0, 1).with_search(" ")).unwrap();
        assert!(!predicate.is_empty());
        assert_eq!(
            predicate.count_statement().binds,
            vec![Value::Text("% %".to_string())]
        );
    }

    #[test]
    fn too_many_bounds_is_validation_error() {
        let query = ListQuery::window(0, 1).with_filter(Filter {
            age: vec![1, 2, 3],
            ..Filter::default()
        });
        let err = build_predicate(&query).unwrap_err();
        assert!(matches!(err, DataError::Validation { operation: "list", .. }));
    }

    #[test]
    fn every_filter_combination_prepares_cleanly() {
        let store = open_live_store_in_memory().unwrap();
        let filters = [
            Filter::default(),
            Filter {
                age: vec![18],
                ..Filter::default()
            },
            Filter {
                age: vec![18, 65],
                date_age: vec![String::new(), "2021-12-31".to_string()],
                ..Filter::default()
            },
            Filter {
                covid: Some("negative".to_string()),
                pcr: Some(String::new()),
                rapid: Some("positive".to_string()),
                ..Filter::default()
            },
        ];

        for filter in filters {
            for search in ["", "x"] {
                // Non-zero offset forces the count statement to run too.
                let query = ListQuery::window(1, 10)
                    .with_filter(filter.clone())
                    .with_search(search);
                let result = execute_list(&store, &OpContext::background(), &query).unwrap();
                assert!(result.items.is_empty());
                assert_eq!(result.total_count, 0);
            }
        }
    }
}
