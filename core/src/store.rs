// CRUDKit
// Copyright 2024 The CRUDKit Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Generic persistence store for types that implement the `Model` trait.
//!
//! The store exposes the operations that the CRUD conventions need: create, retrieve, update,
//! replace, delete, search and count.  Every operation takes a `Conn` that selects the
//! transaction boundary: an externally supplied transaction is joined as-is and never committed
//! here, whereas handing over the whole database makes the operation open its own transaction,
//! commit it on success and roll it back on drop on any other exit path.
//!
//! Searching and counting only honor criteria whose field appears in the store's auto-filter
//! allow-list; any other criteria are silently ignored.  Pagination is applied last, after
//! filtering and ordering.

use crate::db::{Conn, DbError, DbResult, Executor};
use crate::model::{ColumnSpec, FieldKind, FieldValue, Model, RowValues};
use std::fmt::Write;
use std::marker::PhantomData;
use uuid::Uuid;

/// Placeholder syntax used by a database backend.
#[derive(Clone, Copy)]
enum PlaceholderStyle {
    /// Numbered `$1`-style placeholders (PostgreSQL).
    #[cfg_attr(not(feature = "postgres"), allow(unused))]
    Dollar,

    /// Positional `?`-style placeholders (SQLite).
    #[cfg_attr(not(feature = "sqlite"), allow(unused))]
    Question,
}

impl PlaceholderStyle {
    /// Renders the placeholder for the 1-based parameter `i`.
    fn render(&self, i: usize) -> String {
        match self {
            PlaceholderStyle::Dollar => format!("${}", i),
            PlaceholderStyle::Question => "?".to_owned(),
        }
    }
}

/// Search and count criteria: optional field filters plus pagination bounds.
///
/// Filters whose value is `Null` are skipped, mirroring the behavior of absent criteria.
#[derive(Clone, Debug, Default)]
pub struct SearchCriteria {
    /// Requested field filters, not yet validated against any allow-list.
    filters: Vec<(String, FieldValue)>,

    /// Number of leading matches to skip.
    pub offset: Option<u64>,

    /// Maximum number of matches to return.  Absent means no limit.
    pub limit: Option<u64>,
}

impl SearchCriteria {
    /// Creates empty criteria: match everything, no pagination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter for `field` equal to `value`.
    pub fn with_filter<F: Into<String>>(mut self, field: F, value: FieldValue) -> Self {
        self.filters.push((field.into(), value));
        self
    }

    /// Sets the pagination offset.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the pagination limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A persistence store for the model type `M`.
///
/// The store carries configuration only; all row state lives in the database.  Construction
/// happens once at application wiring time and the instance is shared read-only afterwards.
#[derive(Clone)]
pub struct Store<M: Model> {
    /// Fields that `search`/`count` criteria may filter on.  Criteria naming any other field
    /// are ignored.
    auto_filters: &'static [&'static str],

    /// Column used to order search results.  No ordering is applied when unset.
    order_by: Option<&'static str>,

    /// Marker for the model type this store manages.
    _model: PhantomData<M>,
}

impl<M: Model> Default for Store<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Store<M> {
    /// Creates a store with no auto-filter fields and no ordering.
    pub fn new() -> Self {
        Self { auto_filters: &[], order_by: None, _model: PhantomData }
    }

    /// Declares the fields that search criteria are allowed to filter on.
    pub fn with_auto_filters(mut self, fields: &'static [&'static str]) -> Self {
        self.auto_filters = fields;
        self
    }

    /// Declares the column used to order search results.
    pub fn with_order_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }

    /// Creates a new `instance`, assigning a generated identifier if it has none yet.
    pub async fn create(&self, conn: Conn<'_>, mut instance: M) -> DbResult<M> {
        if instance.id().is_none() {
            instance.assign_id(Uuid::new_v4());
        }
        match conn {
            Conn::Tx(ex) => self.insert(ex, &instance).await?,
            Conn::Db(db) => {
                let mut tx = db.begin().await?;
                self.insert(tx.ex(), &instance).await?;
                tx.commit().await?;
            }
        }
        Ok(instance)
    }

    /// Retrieves the model with the given `id`.
    pub async fn retrieve(&self, conn: Conn<'_>, id: Uuid) -> DbResult<M> {
        match conn {
            Conn::Tx(ex) => self.fetch_by_id(ex, id).await,
            Conn::Db(db) => {
                let mut ex = db.ex().await?;
                self.fetch_by_id(&mut ex, id).await
            }
        }
    }

    /// Updates the model with the given `id` by merging `patch` into it.
    ///
    /// The merge is a partial overwrite: fields that are unset in the patch retain their
    /// previous values.
    pub async fn update(&self, conn: Conn<'_>, id: Uuid, patch: &M::Patch) -> DbResult<M> {
        match conn {
            Conn::Tx(ex) => self.update_in(ex, id, patch).await,
            Conn::Db(db) => {
                let mut tx = db.begin().await?;
                let instance = self.update_in(tx.ex(), id, patch).await?;
                tx.commit().await?;
                Ok(instance)
            }
        }
    }

    /// Updates the model with the given `id`, or creates it when it does not exist yet.
    ///
    /// Note that the update path merges the patch into the existing row, so absent patch fields
    /// default to the current values rather than being cleared.  This is an upsert via
    /// retrieve-or-create, not an atomic one.
    pub async fn replace(&self, conn: Conn<'_>, id: Uuid, patch: &M::Patch) -> DbResult<M> {
        match conn {
            Conn::Tx(ex) => self.replace_in(ex, id, patch).await,
            Conn::Db(db) => {
                let mut tx = db.begin().await?;
                let instance = self.replace_in(tx.ex(), id, patch).await?;
                tx.commit().await?;
                Ok(instance)
            }
        }
    }

    /// Deletes the model with the given `id`, failing if it does not exist.
    pub async fn delete(&self, conn: Conn<'_>, id: Uuid) -> DbResult<()> {
        match conn {
            Conn::Tx(ex) => self.delete_by_id(ex, id).await,
            Conn::Db(db) => {
                let mut tx = db.begin().await?;
                self.delete_by_id(tx.ex(), id).await?;
                tx.commit().await?;
                Ok(())
            }
        }
    }

    /// Returns the models matching `criteria`, ordered and paginated.
    pub async fn search(&self, conn: Conn<'_>, criteria: &SearchCriteria) -> DbResult<Vec<M>> {
        match conn {
            Conn::Tx(ex) => self.query_search(ex, criteria).await,
            Conn::Db(db) => {
                let mut ex = db.ex().await?;
                self.query_search(&mut ex, criteria).await
            }
        }
    }

    /// Returns the number of models matching `criteria`, ignoring pagination bounds.
    pub async fn count(&self, conn: Conn<'_>, criteria: &SearchCriteria) -> DbResult<i64> {
        match conn {
            Conn::Tx(ex) => self.query_count(ex, criteria).await,
            Conn::Db(db) => {
                let mut ex = db.ex().await?;
                self.query_count(&mut ex, criteria).await
            }
        }
    }

    /// Returns the criteria filters that name an auto-filter field, with their column specs.
    ///
    /// Unknown fields and `Null` values are dropped.
    fn allowed_filters<'a>(&self, criteria: &'a SearchCriteria) -> Vec<(ColumnSpec, &'a FieldValue)> {
        criteria
            .filters
            .iter()
            .filter(|(_, value)| *value != FieldValue::Null)
            .filter(|(name, _)| self.auto_filters.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                M::columns().iter().find(|spec| spec.name == name.as_str()).map(|spec| (*spec, value))
            })
            .collect()
    }

    /// Builds the `INSERT` statement for a full row.
    fn insert_sql(style: PlaceholderStyle) -> String {
        let names: Vec<&str> = M::columns().iter().map(|c| c.name).collect();
        let placeholders: Vec<String> =
            (1..=names.len()).map(|i| style.render(i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            M::table(),
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// Builds the `SELECT` statement for a single row by primary key.
    fn select_by_id_sql(style: PlaceholderStyle) -> String {
        let names: Vec<&str> = M::columns().iter().map(|c| c.name).collect();
        format!(
            "SELECT {} FROM {} WHERE {} = {}",
            names.join(", "),
            M::table(),
            M::columns()[0].name,
            style.render(1)
        )
    }

    /// Builds the `UPDATE` statement that rewrites all non-key columns of a row.
    fn update_sql(style: PlaceholderStyle) -> String {
        let assignments: Vec<String> = M::columns()
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, spec)| format!("{} = {}", spec.name, style.render(i + 1)))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE {} = {}",
            M::table(),
            assignments.join(", "),
            M::columns()[0].name,
            style.render(1)
        )
    }

    /// Builds the `DELETE` statement for a single row by primary key.
    fn delete_sql(style: PlaceholderStyle) -> String {
        format!("DELETE FROM {} WHERE {} = {}", M::table(), M::columns()[0].name, style.render(1))
    }

    /// Builds the `WHERE` clause for the given allowed filters, starting placeholders at 1.
    fn where_sql(style: PlaceholderStyle, filters: &[(ColumnSpec, &FieldValue)]) -> String {
        if filters.is_empty() {
            return String::new();
        }
        let conditions: Vec<String> = filters
            .iter()
            .enumerate()
            .map(|(i, (spec, _))| format!("{} = {}", spec.name, style.render(i + 1)))
            .collect();
        format!(" WHERE {}", conditions.join(" AND "))
    }

    /// Builds the full search statement: filtering, then ordering, then pagination.
    fn search_sql(
        &self,
        style: PlaceholderStyle,
        filters: &[(ColumnSpec, &FieldValue)],
        criteria: &SearchCriteria,
    ) -> String {
        let names: Vec<&str> = M::columns().iter().map(|c| c.name).collect();
        let mut sql = format!("SELECT {} FROM {}", names.join(", "), M::table());
        sql.push_str(&Self::where_sql(style, filters));
        if let Some(column) = self.order_by {
            write!(sql, " ORDER BY {}", column).expect("Writing to a string cannot fail");
        }
        match (criteria.limit, criteria.offset) {
            (None, None) => (),
            (Some(limit), None) => {
                write!(sql, " LIMIT {}", limit).expect("Writing to a string cannot fail")
            }
            (None, Some(offset)) => {
                // SQLite requires a LIMIT clause in order to accept an OFFSET.
                match style {
                    PlaceholderStyle::Dollar => write!(sql, " OFFSET {}", offset),
                    PlaceholderStyle::Question => write!(sql, " LIMIT -1 OFFSET {}", offset),
                }
                .expect("Writing to a string cannot fail")
            }
            (Some(limit), Some(offset)) => write!(sql, " LIMIT {} OFFSET {}", limit, offset)
                .expect("Writing to a string cannot fail"),
        }
        sql
    }

    /// Builds the count statement for the given filters.  Pagination never applies to counts.
    fn count_sql(style: PlaceholderStyle, filters: &[(ColumnSpec, &FieldValue)]) -> String {
        format!(
            "SELECT COUNT(*) AS count FROM {}{}",
            M::table(),
            Self::where_sql(style, filters)
        )
    }

    /// Inserts a full row for `instance`, classifying constraint violations.
    async fn insert(&self, ex: &mut Executor, instance: &M) -> DbResult<()> {
        let values = instance.values();
        let rows_affected = match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                let sql = Self::insert_sql(PlaceholderStyle::Dollar);
                let mut query = sqlx::query(&sql);
                for (spec, value) in M::columns().iter().zip(values.iter()) {
                    query = pg::bind(query, spec.kind, value);
                }
                query
                    .execute(ex.conn())
                    .await
                    .map_err(crate::db::postgres::map_sqlx_error)
                    .map_err(remap_duplicate::<M>)?
                    .rows_affected()
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                let sql = Self::insert_sql(PlaceholderStyle::Question);
                let mut query = sqlx::query(&sql);
                for (spec, value) in M::columns().iter().zip(values.iter()) {
                    query = lite::bind(query, spec.kind, value);
                }
                query
                    .execute(ex.conn())
                    .await
                    .map_err(crate::db::sqlite::map_sqlx_error)
                    .map_err(remap_duplicate::<M>)?
                    .rows_affected()
            }

            #[allow(unreachable_patterns)]
            _ => unreachable!("No database backend enabled"),
        };
        if rows_affected != 1 {
            return Err(DbError::BackendError(format!(
                "Insert affected {} rows",
                rows_affected
            )));
        }
        Ok(())
    }

    /// Fetches a single row by primary key, or `NotFound` when it does not exist.
    async fn fetch_by_id(&self, ex: &mut Executor, id: Uuid) -> DbResult<M> {
        let maybe_values = match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                let sql = Self::select_by_id_sql(PlaceholderStyle::Dollar);
                let maybe_row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(ex.conn())
                    .await
                    .map_err(crate::db::postgres::map_sqlx_error)?;
                match maybe_row {
                    Some(row) => Some(pg::row_values(&row, M::columns())?),
                    None => None,
                }
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                let sql = Self::select_by_id_sql(PlaceholderStyle::Question);
                let maybe_row = sqlx::query(&sql)
                    .bind(id.to_string())
                    .fetch_optional(ex.conn())
                    .await
                    .map_err(crate::db::sqlite::map_sqlx_error)?;
                match maybe_row {
                    Some(row) => Some(lite::row_values(&row, M::columns())?),
                    None => None,
                }
            }

            #[allow(unreachable_patterns)]
            _ => unreachable!("No database backend enabled"),
        };
        match maybe_values {
            Some(values) => Ok(M::from_row(&values)?),
            None => Err(DbError::NotFound(M::model_name().to_owned())),
        }
    }

    /// Merges `patch` into the stored row for `id` and persists the result.
    async fn update_in(&self, ex: &mut Executor, id: Uuid, patch: &M::Patch) -> DbResult<M> {
        let mut instance = self.fetch_by_id(ex, id).await?;
        instance.merge(patch);
        self.write_row(ex, &instance).await?;
        Ok(instance)
    }

    /// Updates the row for `id`, creating it from `patch` if it does not exist.
    async fn replace_in(&self, ex: &mut Executor, id: Uuid, patch: &M::Patch) -> DbResult<M> {
        match self.update_in(ex, id, patch).await {
            Ok(instance) => Ok(instance),
            Err(DbError::NotFound(_)) => {
                let instance = M::from_patch(id, patch)?;
                self.insert(ex, &instance).await?;
                Ok(instance)
            }
            Err(e) => Err(e),
        }
    }

    /// Rewrites all non-key columns of the row backing `instance`.
    async fn write_row(&self, ex: &mut Executor, instance: &M) -> DbResult<()> {
        let values = instance.values();
        let rows_affected = match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                let sql = Self::update_sql(PlaceholderStyle::Dollar);
                let mut query = sqlx::query(&sql);
                for (spec, value) in M::columns().iter().zip(values.iter()) {
                    query = pg::bind(query, spec.kind, value);
                }
                query
                    .execute(ex.conn())
                    .await
                    .map_err(crate::db::postgres::map_sqlx_error)?
                    .rows_affected()
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                let sql = Self::update_sql(PlaceholderStyle::Question);
                let mut query = sqlx::query(&sql);
                for (spec, value) in M::columns().iter().zip(values.iter()) {
                    query = lite::bind(query, spec.kind, value);
                }
                query
                    .execute(ex.conn())
                    .await
                    .map_err(crate::db::sqlite::map_sqlx_error)?
                    .rows_affected()
            }

            #[allow(unreachable_patterns)]
            _ => unreachable!("No database backend enabled"),
        };
        match rows_affected {
            0 => Err(DbError::NotFound(M::model_name().to_owned())),
            1 => Ok(()),
            n => Err(DbError::BackendError(format!("Update affected {} rows", n))),
        }
    }

    /// Deletes the row for `id`, counting affected rows instead of checking existence first.
    async fn delete_by_id(&self, ex: &mut Executor, id: Uuid) -> DbResult<()> {
        let rows_affected = match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                let sql = Self::delete_sql(PlaceholderStyle::Dollar);
                sqlx::query(&sql)
                    .bind(id)
                    .execute(ex.conn())
                    .await
                    .map_err(crate::db::postgres::map_sqlx_error)?
                    .rows_affected()
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                let sql = Self::delete_sql(PlaceholderStyle::Question);
                sqlx::query(&sql)
                    .bind(id.to_string())
                    .execute(ex.conn())
                    .await
                    .map_err(crate::db::sqlite::map_sqlx_error)?
                    .rows_affected()
            }

            #[allow(unreachable_patterns)]
            _ => unreachable!("No database backend enabled"),
        };
        match rows_affected {
            0 => Err(DbError::NotFound(M::model_name().to_owned())),
            1 => Ok(()),
            n => Err(DbError::BackendError(format!("Deletion affected {} rows", n))),
        }
    }

    /// Runs the search query for `criteria`.
    async fn query_search(&self, ex: &mut Executor, criteria: &SearchCriteria) -> DbResult<Vec<M>> {
        let filters = self.allowed_filters(criteria);
        let all_values = match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                let sql = self.search_sql(PlaceholderStyle::Dollar, &filters, criteria);
                let mut query = sqlx::query(&sql);
                for (spec, value) in &filters {
                    query = pg::bind(query, spec.kind, value);
                }
                let rows = query
                    .fetch_all(ex.conn())
                    .await
                    .map_err(crate::db::postgres::map_sqlx_error)?;
                let mut all_values = Vec::with_capacity(rows.len());
                for row in rows {
                    all_values.push(pg::row_values(&row, M::columns())?);
                }
                all_values
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                let sql = self.search_sql(PlaceholderStyle::Question, &filters, criteria);
                let mut query = sqlx::query(&sql);
                for (spec, value) in &filters {
                    query = lite::bind(query, spec.kind, value);
                }
                let rows = query
                    .fetch_all(ex.conn())
                    .await
                    .map_err(crate::db::sqlite::map_sqlx_error)?;
                let mut all_values = Vec::with_capacity(rows.len());
                for row in rows {
                    all_values.push(lite::row_values(&row, M::columns())?);
                }
                all_values
            }

            #[allow(unreachable_patterns)]
            _ => unreachable!("No database backend enabled"),
        };
        let mut instances = Vec::with_capacity(all_values.len());
        for values in &all_values {
            instances.push(M::from_row(values)?);
        }
        Ok(instances)
    }

    /// Runs the count query for `criteria`.
    async fn query_count(&self, ex: &mut Executor, criteria: &SearchCriteria) -> DbResult<i64> {
        let filters = self.allowed_filters(criteria);
        match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                use sqlx::Row;
                let sql = Self::count_sql(PlaceholderStyle::Dollar, &filters);
                let mut query = sqlx::query(&sql);
                for (spec, value) in &filters {
                    query = pg::bind(query, spec.kind, value);
                }
                let row = query
                    .fetch_one(ex.conn())
                    .await
                    .map_err(crate::db::postgres::map_sqlx_error)?;
                row.try_get("count").map_err(crate::db::postgres::map_sqlx_error)
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                use sqlx::Row;
                let sql = Self::count_sql(PlaceholderStyle::Question, &filters);
                let mut query = sqlx::query(&sql);
                for (spec, value) in &filters {
                    query = lite::bind(query, spec.kind, value);
                }
                let row = query
                    .fetch_one(ex.conn())
                    .await
                    .map_err(crate::db::sqlite::map_sqlx_error)?;
                row.try_get("count").map_err(crate::db::sqlite::map_sqlx_error)
            }

            #[allow(unreachable_patterns)]
            _ => unreachable!("No database backend enabled"),
        }
    }
}

/// Rewrites a generic duplicate-entry classification to name the model being inserted.
fn remap_duplicate<M: Model>(e: DbError) -> DbError {
    match e {
        DbError::AlreadyExists(_) => DbError::AlreadyExists(M::model_name().to_owned()),
        e => e,
    }
}

/// PostgreSQL-specific value binding and row decoding.
#[cfg(feature = "postgres")]
mod pg {
    use super::*;
    use crate::db::postgres::map_sqlx_error;
    use sqlx::postgres::{PgArguments, PgRow};
    use sqlx::query::Query;
    use sqlx::{Postgres, Row};

    /// Binds `value` to the next placeholder of `query`, using `kind` to type SQL NULLs.
    pub(super) fn bind<'q>(
        query: Query<'q, Postgres, PgArguments>,
        kind: FieldKind,
        value: &FieldValue,
    ) -> Query<'q, Postgres, PgArguments> {
        match value {
            FieldValue::Bool(b) => query.bind(*b),
            FieldValue::Float(f) => query.bind(*f),
            FieldValue::Int(i) => query.bind(*i),
            FieldValue::Text(s) => query.bind(s.clone()),
            FieldValue::Uuid(u) => query.bind(*u),
            FieldValue::Null => match kind {
                FieldKind::Bool => query.bind(None::<bool>),
                FieldKind::Float => query.bind(None::<f64>),
                FieldKind::Int => query.bind(None::<i64>),
                FieldKind::Text => query.bind(None::<String>),
                FieldKind::Uuid => query.bind(None::<Uuid>),
            },
        }
    }

    /// Decodes the given `columns` of a fetched `row` into backend-independent values.
    pub(super) fn row_values(row: &PgRow, columns: &'static [ColumnSpec]) -> DbResult<RowValues> {
        let mut values = RowValues::new();
        for spec in columns {
            let value = match spec.kind {
                FieldKind::Bool => row
                    .try_get::<Option<bool>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Bool),
                FieldKind::Float => row
                    .try_get::<Option<f64>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Float),
                FieldKind::Int => row
                    .try_get::<Option<i64>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Int),
                FieldKind::Text => row
                    .try_get::<Option<String>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Text),
                FieldKind::Uuid => row
                    .try_get::<Option<Uuid>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Uuid),
            };
            values.insert(spec.name, value.unwrap_or(FieldValue::Null));
        }
        Ok(values)
    }
}

/// SQLite-specific value binding and row decoding.  UUIDs are stored as hyphenated text.
#[cfg(feature = "sqlite")]
mod lite {
    use super::*;
    use crate::db::sqlite::map_sqlx_error;
    use sqlx::query::Query;
    use sqlx::sqlite::{SqliteArguments, SqliteRow};
    use sqlx::{Row, Sqlite};

    /// Binds `value` to the next placeholder of `query`, using `kind` to type SQL NULLs.
    pub(super) fn bind<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        kind: FieldKind,
        value: &FieldValue,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            FieldValue::Bool(b) => query.bind(*b),
            FieldValue::Float(f) => query.bind(*f),
            FieldValue::Int(i) => query.bind(*i),
            FieldValue::Text(s) => query.bind(s.clone()),
            FieldValue::Uuid(u) => query.bind(u.to_string()),
            FieldValue::Null => match kind {
                FieldKind::Bool => query.bind(None::<bool>),
                FieldKind::Float => query.bind(None::<f64>),
                FieldKind::Int => query.bind(None::<i64>),
                FieldKind::Text => query.bind(None::<String>),
                FieldKind::Uuid => query.bind(None::<String>),
            },
        }
    }

    /// Decodes the given `columns` of a fetched `row` into backend-independent values.
    pub(super) fn row_values(row: &SqliteRow, columns: &'static [ColumnSpec]) -> DbResult<RowValues> {
        let mut values = RowValues::new();
        for spec in columns {
            let value = match spec.kind {
                FieldKind::Bool => row
                    .try_get::<Option<bool>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Bool),
                FieldKind::Float => row
                    .try_get::<Option<f64>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Float),
                FieldKind::Int => row
                    .try_get::<Option<i64>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Int),
                FieldKind::Text => row
                    .try_get::<Option<String>, _>(spec.name)
                    .map_err(map_sqlx_error)?
                    .map(FieldValue::Text),
                FieldKind::Uuid => {
                    let raw = row
                        .try_get::<Option<String>, _>(spec.name)
                        .map_err(map_sqlx_error)?;
                    match raw {
                        Some(raw) => Some(FieldValue::Uuid(Uuid::parse_str(&raw).map_err(
                            |e| {
                                DbError::DataIntegrityError(format!(
                                    "Invalid UUID in column {}: {}",
                                    spec.name, e
                                ))
                            },
                        )?)),
                        None => None,
                    }
                }
            };
            values.insert(spec.name, value.unwrap_or(FieldValue::Null));
        }
        Ok(values)
    }
}
