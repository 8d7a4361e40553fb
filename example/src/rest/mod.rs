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

//! Entry point to the REST server.
//!
//! All person routes are registered through the CRUD conventions; the only routing decisions
//! made here are which operations the service supports and which handler serves each one.

use crate::driver::Driver;
use axum::middleware;
use axum::Router;
use crudkit_core::namespace::Namespace;
use crudkit_core::operations::Operation;
use crudkit_core::rest::audit::{audit_middleware, AuditOptions, AuditState, LoggingDataMap};
use crudkit_core::rest::crud::{ConfigError, CrudRouter};
use crudkit_core::rest::{exceptions, BaseUrls};
use std::sync::Arc;

mod person_count;
mod person_create;
mod person_delete;
mod person_replace;
mod person_retrieve;
mod person_search;
mod person_update;
mod resources;
#[cfg(test)]
mod testutils;

/// Shared state available to every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    /// The business logic of the service.
    pub(crate) driver: Driver,

    /// The base URL the service hands out in links.
    pub(crate) base_urls: Arc<BaseUrls>,
}

/// The namespace under which all person routes live.
pub(crate) fn person_ns() -> Namespace {
    Namespace::new("person").with_version("v1")
}

/// Registers the conventional person routes, recording audit identifiers in `data_map`.
fn conventional_routes(data_map: &mut LoggingDataMap) -> Result<Router<AppState>, ConfigError> {
    Ok(CrudRouter::new(person_ns(), data_map)
        .register(Operation::Search, "search_persons", person_search::handler)?
        .register(Operation::Count, "count_persons", person_count::handler)?
        .register(Operation::Create, "create_person", person_create::handler)?
        .register(Operation::Retrieve, "retrieve_person", person_retrieve::handler)?
        .register(Operation::Update, "update_person", person_update::handler)?
        .register(Operation::Replace, "replace_person", person_replace::handler)?
        .register(Operation::Delete, "delete_person", person_delete::handler)?
        .into_router())
}

/// Wraps `routes` with the exception and audit middleware and binds the app state.
///
/// The panic layer sits closest to the routes, then the exception middleware, then the audit
/// middleware on the outside so that it observes the final response of every request.
fn finish(
    routes: Router<AppState>,
    data_map: LoggingDataMap,
    driver: Driver,
    base_urls: BaseUrls,
    options: AuditOptions,
    debug: bool,
    testing: bool,
) -> Router {
    let audit_state =
        Arc::new(AuditState { options, data_map: Arc::new(data_map), debug, testing });
    routes
        .layer(exceptions::catch_panic_layer())
        .layer(middleware::from_fn(exceptions::exception_middleware))
        .layer(middleware::from_fn_with_state(audit_state, audit_middleware))
        .with_state(AppState { driver, base_urls: Arc::new(base_urls) })
}

/// Creates the router for the application.
pub(crate) fn app(
    driver: Driver,
    base_urls: BaseUrls,
    options: AuditOptions,
    debug: bool,
    testing: bool,
) -> Result<Router, ConfigError> {
    let mut data_map = LoggingDataMap::new();
    let routes = conventional_routes(&mut data_map)?;
    Ok(finish(routes, data_map, driver, base_urls, options, debug, testing))
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use axum::http;
    use crudkit_core::rest::testutils::*;

    #[tokio::test]
    async fn test_panicking_handler_returns_error_envelope() {
        let context = TestContext::setup().await;

        let envelope =
            OneShotBuilder::new(context.into_app(), (http::Method::GET, "/explode"))
                .send_empty()
                .await
                .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
                .expect_error("kaboom")
                .await;
        assert_eq!(500, envelope.code);
        assert!(!envelope.retryable);
        assert!(envelope.context.errors.is_empty());
    }

    #[tokio::test]
    async fn test_unconventional_routes_are_served_and_timed() {
        let context = TestContext::setup().await;

        // /explode is not registered through the conventions, so the audit middleware skips
        // logging for it, but requests still flow through normally.
        let checker = OneShotBuilder::new(context.into_app(), (http::Method::GET, "/explode"))
            .with_header("X-Request-Id", "abc")
            .send_empty()
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(checker.header("X-Process-Time").is_some());
        let envelope = checker.expect_error("kaboom").await;
        assert_eq!(
            Some(&serde_json::Value::from("abc")),
            envelope.context.extra.get("x-request-id")
        );
    }
}
