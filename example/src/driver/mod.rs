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

//! Business logic for the service.

use crate::db::person_store;
use crate::model::Person;
use crudkit_core::db::Db;
use crudkit_core::driver::CrudStoreAdapter;
use std::sync::Arc;

mod person;
#[cfg(test)]
pub(crate) mod testutils;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": each one runs in its own
/// scoped transaction.  For this reason, these operations consume the driver in an attempt to
/// minimize the possibility of executing two operations where one was intended.
#[derive(Clone)]
pub struct Driver {
    /// CRUD operations over persons.
    persons: CrudStoreAdapter<Person>,
}

impl Driver {
    /// Creates a new driver backed by the given database.
    pub fn new(db: Arc<dyn Db + Send + Sync>) -> Self {
        Self { persons: CrudStoreAdapter::new(db, person_store()) }
    }
}
