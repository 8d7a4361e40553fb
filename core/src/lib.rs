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

//! Convention library to build CRUD microservices on top of axum and sqlx.
//!
//! Services built with this library adhere to the following layered architecture, and they
//! should structure their code to have these modules as well:
//!
//! 1.  `model`: This is the base layer, providing high-level data types that represent concepts
//!     in the domain of the application.  Persistent entities implement the `Model` trait so
//!     that the generic `Store` can manage them.
//!
//! 1.  `db`: This is the persistence layer.  Services define their schema here and rely on the
//!     generic `Store` for CRUD, search and count operations.
//!
//! 1.  `driver`: This is the business logic layer.  Services provide their own `Driver` type to
//!     encapsulate the in-memory state required by the app and to coordinate access to the
//!     database.  The `CrudStoreAdapter` covers the common case where an entity's operations
//!     are pure CRUD.
//!
//! 1.  `rest`: This is the HTTP layer.  Services declare a `Namespace` per resource and mount
//!     their handlers through the `CrudRouter`, which derives URL paths, default status codes
//!     and audit metadata from the `Operation` being registered.  The audit and exception
//!     middleware wrap the resulting router.
//!
//! 1.  `main`: This is the app launcher.  Its sole purpose is to gather configuration data from
//!     environment variables and call the service's `serve` function.
//!
//! There are result and error types in every layer, such as `DbResult` and `DbError`.  Errors
//! float to the top of the app using the `?` operator and are translated to the JSON error
//! envelope `{code, context, message, retryable}` once they leave the REST layer.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod db;
pub mod driver;
pub mod env;
pub mod model;
pub mod namespace;
pub mod operations;
pub mod rest;
pub mod store;
