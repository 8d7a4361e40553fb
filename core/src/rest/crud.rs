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

//! CRUD convention wiring: mounts handlers on an axum router under the paths and methods that
//! the registered operations dictate.
//!
//! Registration happens once at application startup and fails fast: any invalid or clashing
//! route definition surfaces as a `ConfigError` naming the offending path and method, never as
//! a request-time failure.  Each registration also records the operation's audit identifiers
//! in the logging data map and attaches the operation's default status code, which rewrites
//! plain `200 OK` responses so that handlers do not need to pick codes themselves.
//!
//! Response typing is the handler's return type; there is no separate response-model
//! registration.  Handlers declare their dependencies explicitly as axum extractors.

use crate::namespace::Namespace;
use crate::operations::Operation;
use crate::rest::audit::LoggingDataMap;
use axum::handler::Handler;
use axum::http::{Method, StatusCode};
use axum::middleware::map_response;
use axum::response::Response;
use axum::routing::{on, MethodFilter};
use axum::Router;
use std::collections::HashSet;

/// Configuration-time route wiring errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A route was registered twice under the same path and method.
    #[error("Error configuring endpoint {path} {method}: route is already defined")]
    DuplicateRoute {
        /// Path of the offending registration.
        path: String,

        /// Method of the offending registration.
        method: String,
    },

    /// A route definition was rejected before reaching the router.
    #[error("Error configuring endpoint {path} {method}: {reason}")]
    InvalidRoute {
        /// Path of the offending registration.
        path: String,

        /// Method of the offending registration.
        method: String,

        /// Why the definition was rejected.
        reason: String,
    },
}

/// Maps an HTTP method to the corresponding axum method filter.
fn method_filter(method: &Method) -> Result<MethodFilter, String> {
    if *method == Method::GET {
        Ok(MethodFilter::GET)
    } else if *method == Method::POST {
        Ok(MethodFilter::POST)
    } else if *method == Method::PUT {
        Ok(MethodFilter::PUT)
    } else if *method == Method::PATCH {
        Ok(MethodFilter::PATCH)
    } else if *method == Method::DELETE {
        Ok(MethodFilter::DELETE)
    } else if *method == Method::HEAD {
        Ok(MethodFilter::HEAD)
    } else if *method == Method::OPTIONS {
        Ok(MethodFilter::OPTIONS)
    } else if *method == Method::TRACE {
        Ok(MethodFilter::TRACE)
    } else {
        Err(format!("Unroutable method {}", method))
    }
}

/// Converts a canonical `{param}`-style path into axum's `:param` capture syntax.
fn axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                format!(":{}", &segment[1..segment.len() - 1])
            } else {
                segment.to_owned()
            }
        })
        .collect::<Vec<String>>()
        .join("/")
}

/// Checks that a generated path is mountable: absolute with no empty segments.
fn validate_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err("path must be absolute".to_owned());
    }
    if path.len() == 1 || path.split('/').skip(1).any(str::is_empty) {
        return Err("path has empty segments".to_owned());
    }
    Ok(())
}

/// Registers handlers for the operations of one namespace, accumulating them into a router.
///
/// The builder owns the clash bookkeeping so that a duplicate (path, method) pair is reported
/// as a `ConfigError` here rather than as a panic inside the underlying router.
#[must_use]
pub struct CrudRouter<'a, S> {
    /// The namespace whose operations are being registered.
    namespace: Namespace,

    /// The audit identifiers recorded for every registration.
    data_map: &'a mut LoggingDataMap,

    /// The router accumulated so far.
    router: Router<S>,

    /// The (path, method) pairs registered so far, for clash detection.
    registered: HashSet<(String, String)>,
}

impl<'a, S: Clone + Send + Sync + 'static> CrudRouter<'a, S> {
    /// Starts registering operations of `namespace`, recording audit identifiers in
    /// `data_map`.
    pub fn new(namespace: Namespace, data_map: &'a mut LoggingDataMap) -> Self {
        Self { namespace, data_map, router: Router::new(), registered: HashSet::new() }
    }

    /// Continues registration on top of a previously built `router`, for services that expose
    /// several namespaces on one router.
    pub fn on_router(
        namespace: Namespace,
        data_map: &'a mut LoggingDataMap,
        router: Router<S>,
    ) -> Self {
        Self { namespace, data_map, router, registered: HashSet::new() }
    }

    /// Registers `handler` (named `handler_name` for audit purposes) for `operation`.
    ///
    /// The route is mounted under the namespace's path for the operation, restricted to the
    /// operation's method, and responses that come back as plain `200 OK` are rewritten to the
    /// operation's default status code.
    pub fn register<H, T>(
        mut self,
        operation: Operation,
        handler_name: &'static str,
        handler: H,
    ) -> Result<Self, ConfigError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let info = operation.info();
        let path = self.namespace.path_for_operation(operation);
        let method = info.method.to_string();

        if self.namespace.subject().is_empty() {
            return Err(ConfigError::InvalidRoute {
                path,
                method,
                reason: "namespace subject is empty".to_owned(),
            });
        }
        validate_path(&path).map_err(|reason| ConfigError::InvalidRoute {
            path: path.clone(),
            method: method.clone(),
            reason,
        })?;
        let filter = method_filter(&info.method).map_err(|reason| ConfigError::InvalidRoute {
            path: path.clone(),
            method: method.clone(),
            reason,
        })?;
        if !self.registered.insert((path.clone(), method.clone())) {
            return Err(ConfigError::DuplicateRoute { path, method });
        }

        self.data_map.add_entry(&self.namespace, operation, handler_name);

        let default_code = info.default_code;
        let method_router = on(filter, handler).layer(map_response(
            move |mut response: Response| async move {
                if response.status() == StatusCode::OK && default_code != StatusCode::OK {
                    *response.status_mut() = default_code;
                }
                response
            },
        ));
        self.router = self.router.route(&axum_path(&path), method_router);
        Ok(self)
    }

    /// Finishes registration and returns the accumulated router.
    pub fn into_router(self) -> Router<S> {
        self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::Request;
    use axum::Json;
    use tower::util::ServiceExt;

    /// Trivial collection handler for registration tests.
    async fn list_handler() -> Json<Vec<String>> {
        Json(vec!["a".to_owned()])
    }

    /// Trivial creation handler for registration tests.
    async fn create_handler() -> Json<String> {
        Json("created".to_owned())
    }

    /// Trivial deletion handler for registration tests.
    async fn delete_handler(Path(_id): Path<String>) {}

    /// Handler that picks its own status code, which must not be rewritten.
    async fn teapot_handler() -> (StatusCode, &'static str) {
        (StatusCode::IM_A_TEAPOT, "short and stout")
    }

    #[test]
    fn test_axum_path_conversion() {
        assert_eq!("/api/v1/pizza", axum_path("/api/v1/pizza"));
        assert_eq!("/api/v1/pizza/:pizza_id", axum_path("/api/v1/pizza/{pizza_id}"));
        assert_eq!(
            "/api/v1/pizza/:pizza_id/order",
            axum_path("/api/v1/pizza/{pizza_id}/order")
        );
    }

    #[test]
    fn test_validate_path() {
        validate_path("/api/v1/pizza").unwrap();
        validate_path("relative").unwrap_err();
        validate_path("/api//pizza").unwrap_err();
        validate_path("/").unwrap_err();
    }

    #[test]
    fn test_register_records_logging_entries() {
        let ns = Namespace::new("pizza").with_version("v1");
        let mut data_map = LoggingDataMap::new();
        let _router: Router<()> = CrudRouter::new(ns, &mut data_map)
            .register(Operation::Search, "list_handler", list_handler)
            .unwrap()
            .register(Operation::Create, "create_handler", create_handler)
            .unwrap()
            .into_router();

        let entry = data_map.get_entry("/api/v1/pizza", &Method::GET);
        assert_eq!(Some("pizza.search.v1".to_owned()), entry.operation_name);
        assert_eq!(Some("list_handler".to_owned()), entry.function_name);

        let entry = data_map.get_entry("/api/v1/pizza", &Method::POST);
        assert_eq!(Some("pizza.create.v1".to_owned()), entry.operation_name);
    }

    #[test]
    fn test_register_rejects_duplicates_naming_path_and_method() {
        let ns = Namespace::new("pizza").with_version("v1");
        let mut data_map = LoggingDataMap::new();
        let err = CrudRouter::<()>::new(ns, &mut data_map)
            .register(Operation::Search, "list_handler", list_handler)
            .unwrap()
            .register(Operation::Search, "list_handler", list_handler)
            .unwrap_err();
        assert_eq!(
            ConfigError::DuplicateRoute {
                path: "/api/v1/pizza".to_owned(),
                method: "GET".to_owned()
            },
            err
        );
        assert!(err.to_string().contains("/api/v1/pizza"));
        assert!(err.to_string().contains("GET"));
    }

    #[test]
    fn test_register_rejects_empty_subject() {
        let ns = Namespace::new("").with_version("v1");
        let mut data_map = LoggingDataMap::new();
        let err = CrudRouter::<()>::new(ns, &mut data_map)
            .register(Operation::Search, "list_handler", list_handler)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoute { .. }));
    }

    #[tokio::test]
    async fn test_registered_route_serves_requests() {
        let ns = Namespace::new("pizza").with_version("v1");
        let mut data_map = LoggingDataMap::new();
        let router: Router<()> = CrudRouter::new(ns, &mut data_map)
            .register(Operation::Search, "list_handler", list_handler)
            .unwrap()
            .into_router();

        let response = router
            .oneshot(Request::get("/api/v1/pizza").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());
    }

    #[tokio::test]
    async fn test_default_status_code_rewrites_plain_ok() {
        let ns = Namespace::new("pizza").with_version("v1");
        let mut data_map = LoggingDataMap::new();
        let router: Router<()> = CrudRouter::new(ns, &mut data_map)
            .register(Operation::Create, "create_handler", create_handler)
            .unwrap()
            .register(Operation::Delete, "delete_handler", delete_handler)
            .unwrap()
            .into_router();

        let response = router
            .clone()
            .oneshot(Request::post("/api/v1/pizza").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(StatusCode::CREATED, response.status());

        let response = router
            .oneshot(
                Request::delete("/api/v1/pizza/1234").body(axum::body::Body::empty()).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(StatusCode::NO_CONTENT, response.status());
    }

    #[tokio::test]
    async fn test_explicit_status_codes_are_not_rewritten() {
        let ns = Namespace::new("pizza").with_version("v1");
        let mut data_map = LoggingDataMap::new();
        let router: Router<()> = CrudRouter::new(ns, &mut data_map)
            .register(Operation::Create, "teapot_handler", teapot_handler)
            .unwrap()
            .into_router();

        let response = router
            .oneshot(Request::post("/api/v1/pizza").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(StatusCode::IM_A_TEAPOT, response.status());
    }

    #[tokio::test]
    async fn test_methods_share_a_path() {
        let ns = Namespace::new("pizza").with_version("v1");
        let mut data_map = LoggingDataMap::new();
        let router: Router<()> = CrudRouter::new(ns, &mut data_map)
            .register(Operation::Search, "list_handler", list_handler)
            .unwrap()
            .register(Operation::Create, "create_handler", create_handler)
            .unwrap()
            .into_router();

        let response = router
            .clone()
            .oneshot(Request::get("/api/v1/pizza").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(StatusCode::OK, response.status());

        let response = router
            .oneshot(Request::post("/api/v1/pizza").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(StatusCode::CREATED, response.status());
    }
}
