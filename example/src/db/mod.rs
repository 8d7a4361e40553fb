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

//! Database schema and store configuration for the service.

use crate::model::Person;
use crudkit_core::db::{postgres, DbResult, Executor};
use crudkit_core::store::Store;

#[cfg(test)]
mod tests;

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(ref mut ex) => {
            postgres::run_schema(ex, include_str!("postgres.sql")).await
        }

        #[cfg(test)]
        Executor::Sqlite(ref mut ex) => {
            crudkit_core::db::sqlite::run_schema(ex, include_str!("sqlite.sql")).await
        }

        #[allow(unreachable_patterns)]
        _ => unreachable!(),
    }
}

/// Creates the store for persons.
///
/// Search criteria may filter on names; results come back ordered by last name.
pub(crate) fn person_store() -> Store<Person> {
    Store::new().with_auto_filters(&["first_name", "last_name"]).with_order_by("last_name")
}
