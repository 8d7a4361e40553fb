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

//! Tests for the service's schema and store configuration.

use crate::db::{init_schema, person_store};
use crate::model::{Person, PersonPatch};
use crudkit_core::db::sqlite::testutils::setup;
use crudkit_core::db::{Conn, Db, DbError};
use crudkit_core::model::{FieldValue, Model};
use crudkit_core::store::SearchCriteria;
use uuid::Uuid;

/// Sets up a fresh in-memory database with the service schema.
pub(crate) async fn setup_db() -> crudkit_core::db::sqlite::SqliteDb {
    let db = setup().await;
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    db
}

/// Shorthand to build an unsaved person.
fn person(first_name: &str, last_name: &str) -> Person {
    Person::new(None, first_name.to_owned(), last_name.to_owned())
}

#[tokio::test]
async fn test_store_round_trip() {
    let db = setup_db().await;
    let store = person_store();

    let created = store.create(Conn::Db(&db), person("Bob", "Jones")).await.unwrap();
    let id = created.id().unwrap();

    let fetched = store.retrieve(Conn::Db(&db), id).await.unwrap();
    assert_eq!(created, fetched);
}

#[tokio::test]
async fn test_store_merge_semantics() {
    let db = setup_db().await;
    let store = person_store();

    let created = store.create(Conn::Db(&db), person("Bob", "Jones")).await.unwrap();
    let id = created.id().unwrap();

    let patch = PersonPatch { first_name: Some("Rob".to_owned()), last_name: None };
    let updated = store.update(Conn::Db(&db), id, &patch).await.unwrap();
    assert_eq!("Rob", updated.first_name());
    assert_eq!("Jones", updated.last_name());
}

#[tokio::test]
async fn test_store_orders_by_last_name() {
    let db = setup_db().await;
    let store = person_store();

    store.create(Conn::Db(&db), person("Ada", "Zimmer")).await.unwrap();
    store.create(Conn::Db(&db), person("Zoe", "Abbott")).await.unwrap();

    let all = store.search(Conn::Db(&db), &SearchCriteria::new()).await.unwrap();
    let last_names: Vec<&str> = all.iter().map(|p| p.last_name().as_str()).collect();
    assert_eq!(vec!["Abbott", "Zimmer"], last_names);
}

#[tokio::test]
async fn test_store_filters_on_names_only() {
    let db = setup_db().await;
    let store = person_store();

    store.create(Conn::Db(&db), person("Bob", "Jones")).await.unwrap();
    store.create(Conn::Db(&db), person("Ann", "Smith")).await.unwrap();

    let criteria =
        SearchCriteria::new().with_filter("first_name", FieldValue::Text("Ann".to_owned()));
    let found = store.search(Conn::Db(&db), &criteria).await.unwrap();
    assert_eq!(1, found.len());
    assert_eq!("Ann", found[0].first_name());

    // The primary key is not an auto-filter field, so the criteria is ignored.
    let criteria = SearchCriteria::new()
        .with_filter("id", FieldValue::Uuid(Uuid::new_v4()))
        .with_filter("first_name", FieldValue::Text("Ann".to_owned()));
    let found = store.search(Conn::Db(&db), &criteria).await.unwrap();
    assert_eq!(1, found.len());
}

#[tokio::test]
async fn test_store_delete_missing() {
    let db = setup_db().await;
    let store = person_store();

    let err = store.delete(Conn::Db(&db), Uuid::new_v4()).await.unwrap_err();
    assert_eq!(DbError::NotFound("Person".to_owned()), err);
}
