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

//! Generic business logic for any service.
//!
//! Every service should implement its own `Driver` type encapsulating the state it needs,
//! which in most cases is the database plus one `CrudStoreAdapter` per resource.  The adapter
//! bridges the shape of the CRUD handlers (identifiers and patches in, models out) to the
//! typed operations of the generic `Store`, opening one scoped transaction per logical
//! operation.

use crate::db::{Conn, Db, DbError};
use crate::model::Model;
use crate::store::{SearchCriteria, Store};
use std::sync::Arc;
use uuid::Uuid;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all error type for unexpected database errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates an error in the input data.
    #[error("{0}")]
    InvalidInput(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that an entry cannot be removed because other entries still reference it.
    #[error("{0}")]
    StillReferenced(String),

    /// Indicates that the backing database is temporarily unavailable.
    #[error("Service unavailable")]
    Unavailable,
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists(_) => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::InvalidInput(e.to_string()),
            DbError::MissingDependency(_) => DriverError::InvalidInput(e.to_string()),
            DbError::NotFound(_) => DriverError::NotFound(e.to_string()),
            DbError::StillReferenced(_) => DriverError::StillReferenced(e.to_string()),
            DbError::Unavailable => DriverError::Unavailable,
        }
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;

/// Runs the synchronous `f` on the blocking thread pool and awaits its result.
///
/// This is the escape hatch for interoperating with blocking legacy code inside the async call
/// graph; nothing else in this library leaves the cooperative scheduling model.
pub async fn run_blocking<F, T>(f: F) -> DriverResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DriverError::BackendError(format!("Blocking task failed: {}", e)))
}

/// Bridges the CRUD handler shape to a `Store`'s typed operations.
///
/// Every operation opens its own scoped transaction (or plain session for reads) against the
/// owned database handle, so callers need not manage transaction boundaries.  Services that
/// coordinate multiple store operations in one transaction should use the `Store` directly
/// with a caller-owned `Conn::Tx`.
#[derive(Clone)]
pub struct CrudStoreAdapter<M: Model> {
    /// The database the adapter operates against.
    db: Arc<dyn Db + Send + Sync>,

    /// The store that implements the typed operations.
    store: Store<M>,
}

impl<M: Model> CrudStoreAdapter<M> {
    /// Creates a new adapter for `store` against `db`.
    pub fn new(db: Arc<dyn Db + Send + Sync>, store: Store<M>) -> Self {
        Self { db, store }
    }

    /// Returns the database handle the adapter operates against.
    pub fn db(&self) -> &Arc<dyn Db + Send + Sync> {
        &self.db
    }

    /// Creates `instance`, assigning a generated identifier if it has none.
    pub async fn create(&self, instance: M) -> DriverResult<M> {
        Ok(self.store.create(Conn::Db(self.db.as_ref()), instance).await?)
    }

    /// Retrieves the model with the given `id`.
    pub async fn retrieve(&self, id: Uuid) -> DriverResult<M> {
        Ok(self.store.retrieve(Conn::Db(self.db.as_ref()), id).await?)
    }

    /// Merges `patch` into the model with the given `id`.
    pub async fn update(&self, id: Uuid, patch: &M::Patch) -> DriverResult<M> {
        Ok(self.store.update(Conn::Db(self.db.as_ref()), id, patch).await?)
    }

    /// Updates the model with the given `id`, creating it when absent.
    pub async fn replace(&self, id: Uuid, patch: &M::Patch) -> DriverResult<M> {
        Ok(self.store.replace(Conn::Db(self.db.as_ref()), id, patch).await?)
    }

    /// Deletes the model with the given `id`.
    pub async fn delete(&self, id: Uuid) -> DriverResult<()> {
        Ok(self.store.delete(Conn::Db(self.db.as_ref()), id).await?)
    }

    /// Returns the models matching `criteria` along with the total match count, which ignores
    /// pagination bounds.
    pub async fn search(&self, criteria: &SearchCriteria) -> DriverResult<(Vec<M>, i64)> {
        let items = self.store.search(Conn::Db(self.db.as_ref()), criteria).await?;
        let count = self.store.count(Conn::Db(self.db.as_ref()), criteria).await?;
        Ok((items, count))
    }

    /// Returns the number of models matching `criteria`.
    pub async fn count(&self, criteria: &SearchCriteria) -> DriverResult<i64> {
        Ok(self.store.count(Conn::Db(self.db.as_ref()), criteria).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_conversions() {
        assert_eq!(
            DriverError::NotFound("Person not found".to_owned()),
            DriverError::from(DbError::NotFound("Person".to_owned()))
        );
        assert_eq!(
            DriverError::AlreadyExists("Person already exists".to_owned()),
            DriverError::from(DbError::AlreadyExists("Person".to_owned()))
        );
        assert_eq!(DriverError::Unavailable, DriverError::from(DbError::Unavailable));
        assert!(matches!(
            DriverError::from(DbError::MissingDependency("x".to_owned())),
            DriverError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_run_blocking_returns_value() {
        let value = run_blocking(|| 40 + 2).await.unwrap();
        assert_eq!(42, value);
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_panics_as_errors() {
        let err = run_blocking::<_, ()>(|| panic!("boom")).await.unwrap_err();
        match err {
            DriverError::BackendError(msg) => assert!(msg.contains("Blocking task failed")),
            e => panic!("Wrong error type: {:?}", e),
        }
    }
}
