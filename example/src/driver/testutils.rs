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

//! Test utilities for the driver layer.

use crate::db::init_schema;
use crate::driver::Driver;
use crudkit_core::db::Db;
use std::sync::Arc;

/// State of a test scenario against an in-memory database.
pub(crate) struct TestContext {
    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the test database and a driver against it.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(crudkit_core::db::sqlite::testutils::setup().await);
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone());
        Self { driver }
    }

    /// Returns a driver instance to run one operation with.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }
}
