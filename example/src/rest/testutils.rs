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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::Driver;
use crate::model::Person;
use crate::rest::{conventional_routes, finish};
use axum::routing::get;
use axum::Router;
use crudkit_core::db::{Conn, Db};
use crudkit_core::model::Model;
use crudkit_core::rest::audit::{AuditOptions, LoggingDataMap};
use crudkit_core::rest::BaseUrls;
use std::sync::Arc;
use uuid::Uuid;

/// Handler mounted outside the CRUD conventions so that tests can exercise the exception
/// handling path end to end.
async fn explode_handler() -> &'static str {
    panic!("kaboom");
}

/// State of a test scenario against an in-memory database.
pub(crate) struct TestContext {
    /// The database backing the app.
    db: Arc<dyn Db + Send + Sync>,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Initializes the test app with default audit options in debug/testing mode.
    pub(crate) async fn setup() -> Self {
        Self::setup_with(AuditOptions::default()).await
    }

    /// Initializes the test app with the given audit `options`.
    pub(crate) async fn setup_with(options: AuditOptions) -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(crudkit_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone());

        let mut data_map = LoggingDataMap::new();
        let routes = conventional_routes(&mut data_map)
            .unwrap()
            .route("/explode", get(explode_handler));
        let app = finish(
            routes,
            data_map,
            driver,
            BaseUrls::from_str("http://test.example.com/"),
            options,
            true,
            true,
        );
        Self { db, app }
    }

    /// Returns a clone of the app under test.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the app under test.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Seeds a person directly through the store and returns its identifier.
    pub(crate) async fn create_person(&self, first_name: &str, last_name: &str) -> Uuid {
        let person = Person::new(None, first_name.to_owned(), last_name.to_owned());
        let created =
            db::person_store().create(Conn::Db(self.db.as_ref()), person).await.unwrap();
        created.id().unwrap()
    }

    /// Checks whether a person with the given identifier exists.
    pub(crate) async fn has_person(&self, id: Uuid) -> bool {
        db::person_store().retrieve(Conn::Db(self.db.as_ref()), id).await.is_ok()
    }

    /// Fetches a person directly through the store.
    pub(crate) async fn get_person(&self, id: Uuid) -> Person {
        db::person_store().retrieve(Conn::Db(self.db.as_ref()), id).await.unwrap()
    }
}
