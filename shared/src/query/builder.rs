//! SQL generation for the gateway's read patterns.
//!
//! Every builder is a pure function of a normalized [`QueryRequest`]. The filter
//! expression and identifiers are embedded verbatim: callers are responsible for
//! making sure they are safe to splice into SQL.

use crate::models::QueryRequest;

/// Reserved column every log table is partitioned by, in unix seconds.
pub const TIME_COLUMN: &str = "_time_";

/// Alias of the count column in count and group-by queries.
pub const COUNT_ALIAS: &str = "count";

/// Alias of the group value column in group-by queries.
pub const GROUP_ALIAS: &str = "f";

/// Alias of the count column in schema probe queries.
pub const PROBE_ALIAS: &str = "c";

/// Column holding the name in `show databases` / `show tables` results.
pub const NAME_COLUMN: &str = "name";

/// WHERE clause shared by the list, count and group-by queries.
fn predicate(req: &QueryRequest) -> String {
    format!(
        "{} AND {TIME_COLUMN} >= {} AND {TIME_COLUMN} < {}",
        req.query, req.start_time, req.end_time
    )
}

/// Builds the paginated row listing query.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use shared::config::QueryDefaults;
/// use shared::models::QueryRequest;
/// use shared::query::build_list_query;
///
/// let req = QueryRequest::new("logs", "app")
///     .with_time_range(100, 200)
///     .with_page(2, 10)
///     .normalized_at(Utc::now(), &QueryDefaults::default());
///
/// assert_eq!(
///     build_list_query(&req),
///     "SELECT * FROM logs.app WHERE 1=1 AND _time_ >= 100 AND _time_ < 200 LIMIT 10 OFFSET 10"
/// );
/// ```
#[must_use]
pub fn build_list_query(req: &QueryRequest) -> String {
    let sql = format!(
        "SELECT * FROM {} WHERE {} LIMIT {} OFFSET {}",
        req.table_ref,
        predicate(req),
        req.page_size,
        req.offset()
    );
    tracing::debug!(step = "list", %sql, "Built query");
    sql
}

/// Builds the query counting every row matching the request's predicate.
#[must_use]
pub fn build_count_query(req: &QueryRequest) -> String {
    let sql = format!(
        "SELECT count(*) as {COUNT_ALIAS} FROM {} WHERE {}",
        req.table_ref,
        predicate(req)
    );
    tracing::debug!(step = "count", %sql, "Built query");
    sql
}

/// Builds the query counting matching rows per value of the request's group field.
///
/// The group field must be present and non-empty; otherwise the generated SQL
/// is malformed. [`crate::gateway::Gateway::group_counts`] checks this before calling.
#[must_use]
pub fn build_group_by_query(req: &QueryRequest) -> String {
    let field = req.group_field.as_deref().unwrap_or_default();
    let sql = format!(
        "SELECT count(*) as {COUNT_ALIAS}, {field} as {GROUP_ALIAS} FROM {} WHERE {} group by {field}",
        req.table_ref,
        predicate(req)
    );
    tracing::debug!(step = "group_by", %sql, "Built query");
    sql
}

/// Builds the query listing every database of a connection.
#[must_use]
pub fn build_database_list_query() -> String {
    "show databases".to_string()
}

/// Builds the query listing every table of a database.
#[must_use]
pub fn build_table_list_query(database: &str) -> String {
    format!("show tables in {database}")
}

/// Builds the query counting columns named `marker` on `table`.
#[must_use]
pub fn build_schema_probe_query(table: &str, marker: &str) -> String {
    format!(
        "select count(*) as {PROBE_ALIAS} from system.columns where table = '{table}' and name = '{marker}'"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryDefaults;
    use chrono::{TimeZone, Utc};

    fn normalized(req: QueryRequest) -> QueryRequest {
        req.normalized_at(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            &QueryDefaults::default(),
        )
    }

    #[test]
    fn test_list_query_with_defaults() {
        let req = normalized(QueryRequest::new("logs", "app"));

        assert_eq!(
            build_list_query(&req),
            "SELECT * FROM logs.app WHERE 1=1 AND _time_ >= 1699996400 AND _time_ < 1700000000 LIMIT 20 OFFSET 0"
        );
    }

    #[test]
    fn test_list_query_offset() {
        let req = normalized(QueryRequest::new("logs", "app").with_page(4, 25));
        assert!(build_list_query(&req).ends_with("LIMIT 25 OFFSET 75"));
    }

    #[test]
    fn test_list_query_is_deterministic() {
        let req = normalized(QueryRequest::new("logs", "app").with_query("level = 'error'"));
        assert_eq!(build_list_query(&req), build_list_query(&req));
    }

    #[test]
    fn test_count_query() {
        let req = normalized(
            QueryRequest::new("logs", "app")
                .with_query("level = 'error'")
                .with_time_range(10, 20),
        );

        assert_eq!(
            build_count_query(&req),
            "SELECT count(*) as count FROM logs.app WHERE level = 'error' AND _time_ >= 10 AND _time_ < 20"
        );
    }

    #[test]
    fn test_group_by_query() {
        let req = normalized(
            QueryRequest::new("logs", "app")
                .with_time_range(10, 20)
                .with_group_field("level"),
        );

        assert_eq!(
            build_group_by_query(&req),
            "SELECT count(*) as count, level as f FROM logs.app WHERE 1=1 AND _time_ >= 10 AND _time_ < 20 group by level"
        );
    }

    #[test]
    fn test_queries_share_predicate() {
        let req = normalized(
            QueryRequest::new("logs", "app")
                .with_query("status >= 500 OR level = 'fatal'")
                .with_group_field("host"),
        );
        let clause = predicate(&req);

        assert!(build_list_query(&req).contains(&format!("WHERE {clause} LIMIT")));
        assert!(build_count_query(&req).ends_with(&format!("WHERE {clause}")));
        assert!(build_group_by_query(&req).contains(&format!("WHERE {clause} group by")));
    }

    #[test]
    fn test_catalog_queries() {
        assert_eq!(build_database_list_query(), "show databases");
        assert_eq!(build_table_list_query("logs"), "show tables in logs");
        assert_eq!(
            build_schema_probe_query("app", TIME_COLUMN),
            "select count(*) as c from system.columns where table = 'app' and name = '_time_'"
        );
    }
}
