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

//! Entry point to the sample service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crudkit_core::db::postgres::{PostgresDb, PostgresOptions};
use crudkit_core::db::Db;
use crudkit_core::env::get_optional_var;
use crudkit_core::rest::audit::AuditOptions;
use crudkit_core::rest::BaseUrls;
use crudkit_example::db::init_schema;
use crudkit_example::serve;
use std::net::Ipv4Addr;

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = get_optional_var::<u16>("EXAMPLE", "PORT").unwrap().unwrap_or(3000);
    let addr = (Ipv4Addr::LOCALHOST, port);

    let db_opts = PostgresOptions::from_env("PGSQL_PROD").unwrap();
    let db = Box::new(PostgresDb::connect(db_opts).unwrap());
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();

    let base_urls = BaseUrls::from_env("EXAMPLE").unwrap();
    let audit_options = AuditOptions::from_env("EXAMPLE_AUDIT").unwrap();
    let debug = get_optional_var::<bool>("EXAMPLE", "DEBUG").unwrap().unwrap_or(false);

    serve(addr, db, base_urls, audit_options, debug).await.unwrap()
}
