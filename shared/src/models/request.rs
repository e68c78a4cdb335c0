//! Search request model and its normalization rules.

use crate::config::defaults::DEFAULT_FILTER;
use crate::config::QueryDefaults;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A log search request.
///
/// Raw requests may leave most fields at their zero value; [`QueryRequest::normalized_at`]
/// fills in every default so the query builders can rely on concrete values.
///
/// # Example
///
/// ```
/// use shared::config::QueryDefaults;
/// use shared::models::QueryRequest;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
/// let req = QueryRequest::new("logs", "app").normalized_at(now, &QueryDefaults::default());
///
/// assert_eq!(req.table_ref, "logs.app");
/// assert_eq!(req.query, "1=1");
/// assert_eq!(req.start_time, 1_700_000_000 - 3600);
/// assert_eq!(req.end_time, 1_700_000_000);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Datasource type tag of the owning instance (e.g. `ch`).
    #[serde(default)]
    pub datasource_type: String,

    /// Name of the owning instance.
    #[serde(default)]
    pub instance_name: String,

    /// Database holding the table.
    #[serde(default)]
    pub database: String,

    /// Table to search.
    #[serde(default)]
    pub table: String,

    /// Fully qualified `database.table` reference used in generated SQL.
    #[serde(default)]
    pub table_ref: String,

    /// Free-form filter expression, embedded verbatim into the WHERE clause.
    #[serde(default)]
    pub query: String,

    /// Inclusive window start, unix seconds.
    #[serde(default)]
    pub start_time: i64,

    /// Exclusive window end, unix seconds.
    #[serde(default)]
    pub end_time: i64,

    /// One-based page number.
    #[serde(default)]
    pub page: u32,

    /// Rows per page.
    #[serde(default)]
    pub page_size: u32,

    /// Column to group by for group counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_field: Option<String>,
}

impl QueryRequest {
    /// Creates a raw request for the given database and table.
    #[must_use]
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            ..Self::default()
        }
    }

    /// Sets the owning instance.
    #[must_use]
    pub fn with_instance(
        mut self,
        datasource_type: impl Into<String>,
        instance_name: impl Into<String>,
    ) -> Self {
        self.datasource_type = datasource_type.into();
        self.instance_name = instance_name.into();
        self
    }

    /// Sets the filter expression.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Sets the time window, in unix seconds.
    #[must_use]
    pub fn with_time_range(mut self, start_time: i64, end_time: i64) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Sets the page number and page size.
    #[must_use]
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Sets the group-by column.
    #[must_use]
    pub fn with_group_field(mut self, field: impl Into<String>) -> Self {
        self.group_field = Some(field.into());
        self
    }

    /// Applies defaults relative to `now`.
    ///
    /// - `table_ref` is recomputed whenever `database` is non-empty
    /// - `page` and `page_size` are floored to 1 and the default page size
    /// - an empty filter becomes the tautology `1=1`
    /// - a zero time bound becomes the trailing default window ending at `now`
    /// - an empty group field is dropped
    ///
    /// Normalizing an already normalized request returns it unchanged.
    #[must_use]
    pub fn normalized_at(mut self, now: DateTime<Utc>, defaults: &QueryDefaults) -> Self {
        if !self.database.is_empty() {
            self.table_ref = format!("{}.{}", self.database, self.table);
        }
        if self.page == 0 {
            self.page = 1;
        }
        if self.page_size == 0 {
            self.page_size = defaults.page_size;
        }
        if self.query.is_empty() {
            self.query = DEFAULT_FILTER.to_string();
        }
        if self.start_time == 0 {
            self.start_time = now.timestamp() - defaults.window_secs;
        }
        if self.end_time == 0 {
            self.end_time = now.timestamp();
        }
        if self.group_field.as_deref().is_some_and(str::is_empty) {
            self.group_field = None;
        }
        self
    }

    /// Row offset of the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}
