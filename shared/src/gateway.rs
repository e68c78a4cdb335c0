//! Query gateway.
//!
//! Normalizes search requests and orchestrates the row listing, count and
//! declared-field lookups into a single [`QueryResult`].
//!
//! Row listing is mandatory: its failure aborts the search. The count and the
//! declared fields are enrichment: their failure leaves the zero value in
//! place and is recorded in [`QueryResult::degraded`].

use crate::config::QueryDefaults;
use crate::error::GatewayError;
use crate::materializer::materialize;
use crate::models::{Degradation, QueryRequest, QueryResult, Record};
use crate::query::{
    build_count_query, build_group_by_query, build_list_query, COUNT_ALIAS, GROUP_ALIAS,
};
use crate::storage::{ConnectionHandle, FieldCatalog, InstanceRegistry};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Log search gateway.
#[derive(Clone)]
pub struct Gateway {
    registry: Arc<dyn InstanceRegistry>,
    fields: Arc<dyn FieldCatalog>,
    defaults: QueryDefaults,
}

impl Gateway {
    /// Creates a gateway over the given registry and field catalog.
    pub fn new(registry: Arc<dyn InstanceRegistry>, fields: Arc<dyn FieldCatalog>) -> Self {
        Self {
            registry,
            fields,
            defaults: QueryDefaults::default(),
        }
    }

    /// Overrides the normalization defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Returns the normalization defaults.
    #[must_use]
    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Returns the instance registry.
    #[must_use]
    pub fn registry(&self) -> &dyn InstanceRegistry {
        self.registry.as_ref()
    }

    /// Normalizes a raw request relative to the current time.
    #[must_use]
    pub fn prepare(&self, raw: QueryRequest) -> QueryRequest {
        self.prepare_at(raw, Utc::now())
    }

    /// Normalizes a raw request relative to `now`.
    #[must_use]
    pub fn prepare_at(&self, raw: QueryRequest, now: DateTime<Utc>) -> QueryRequest {
        raw.normalized_at(now, &self.defaults)
    }

    /// Runs a normalized search.
    ///
    /// # Errors
    ///
    /// Returns an error only if the row listing fails; count and field lookup
    /// failures are recorded in [`QueryResult::degraded`] instead.
    pub fn search(
        &self,
        conn: &ConnectionHandle,
        req: &QueryRequest,
    ) -> Result<QueryResult, GatewayError> {
        let rows = fetch(conn, &build_list_query(req))?;

        let mut degraded = Vec::new();

        let total_count = match self.try_count(conn, req) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(table = %req.table_ref, error = %e, "Count query failed; reporting 0");
                degraded.push(Degradation::Count {
                    reason: e.to_string(),
                });
                0
            }
        };

        let available_fields = match self.declared_fields(req) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!(
                    instance = %req.instance_name,
                    table = %req.table_ref,
                    error = %e,
                    "Declared field lookup failed; reporting none"
                );
                degraded.push(Degradation::Fields {
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };

        tracing::debug!(
            table = %req.table_ref,
            rows = rows.len(),
            total = total_count,
            "Search completed"
        );

        Ok(QueryResult {
            rows,
            total_count,
            page_size: req.page_size,
            available_fields,
            degraded,
        })
    }

    /// Counts every row matching a normalized request, or 0 if the count fails.
    #[must_use]
    pub fn count(&self, conn: &ConnectionHandle, req: &QueryRequest) -> u64 {
        self.try_count(conn, req).unwrap_or(0)
    }

    fn try_count(&self, conn: &ConnectionHandle, req: &QueryRequest) -> Result<u64, GatewayError> {
        let rows = fetch(conn, &build_count_query(req))?;
        let Some(row) = rows.first() else {
            return Ok(0);
        };
        row.get(COUNT_ALIAS)
            .and_then(crate::models::Value::as_u64)
            .ok_or_else(|| GatewayError::decode(COUNT_ALIAS, "missing or not a non-negative integer"))
    }

    fn declared_fields(&self, req: &QueryRequest) -> Result<Vec<String>, GatewayError> {
        let instance = self
            .registry
            .resolve(&req.datasource_type, &req.instance_name)?;
        self.fields
            .list_declared_fields(instance.id, &req.database, &req.table)
    }

    /// Counts matching rows per value of the request's group field.
    ///
    /// Group values are rendered as strings; `NULL` groups render as `""`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidRequest`] if the request has no group field.
    /// - Any execution or decode failure of the group-by query.
    pub fn group_counts(
        &self,
        conn: &ConnectionHandle,
        req: &QueryRequest,
    ) -> Result<BTreeMap<String, u64>, GatewayError> {
        if req.group_field.as_deref().map_or(true, str::is_empty) {
            return Err(GatewayError::InvalidRequest(
                "group field is required".to_string(),
            ));
        }

        let rows = fetch(conn, &build_group_by_query(req))?;
        let mut groups = BTreeMap::new();
        for row in &rows {
            let count = row
                .get(COUNT_ALIAS)
                .and_then(crate::models::Value::as_u64)
                .ok_or_else(|| GatewayError::decode(COUNT_ALIAS, "missing or not a non-negative integer"))?;
            let key = row
                .get(GROUP_ALIAS)
                .map(ToString::to_string)
                .unwrap_or_default();
            *groups.entry(key).or_insert(0) += count;
        }
        Ok(groups)
    }
}

/// Executes `sql` on `conn` and materializes its rows.
fn fetch(conn: &ConnectionHandle, sql: &str) -> Result<Vec<Record>, GatewayError> {
    materialize(conn.execute(sql)?)
}
