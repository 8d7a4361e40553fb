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

//! Operations on persons.

use crate::driver::Driver;
use crate::model::{Person, PersonPatch};
use crudkit_core::driver::DriverResult;
use crudkit_core::store::SearchCriteria;
use uuid::Uuid;

impl Driver {
    /// Creates a new `person`, assigning it an identifier.
    pub(crate) async fn create_person(self, person: Person) -> DriverResult<Person> {
        self.persons.create(person).await
    }

    /// Gets the person with the given `id`.
    pub(crate) async fn get_person(self, id: Uuid) -> DriverResult<Person> {
        self.persons.retrieve(id).await
    }

    /// Merges `patch` into the person with the given `id`.
    pub(crate) async fn update_person(self, id: Uuid, patch: PersonPatch) -> DriverResult<Person> {
        self.persons.update(id, &patch).await
    }

    /// Rewrites the person with the given `id`, creating it when absent.
    pub(crate) async fn replace_person(self, id: Uuid, patch: PersonPatch) -> DriverResult<Person> {
        self.persons.replace(id, &patch).await
    }

    /// Deletes the person with the given `id`.
    pub(crate) async fn delete_person(self, id: Uuid) -> DriverResult<()> {
        self.persons.delete(id).await
    }

    /// Returns the persons matching `criteria` plus the total match count.
    pub(crate) async fn search_persons(
        self,
        criteria: &SearchCriteria,
    ) -> DriverResult<(Vec<Person>, i64)> {
        self.persons.search(criteria).await
    }

    /// Returns the number of persons matching `criteria`.
    pub(crate) async fn count_persons(self, criteria: &SearchCriteria) -> DriverResult<i64> {
        self.persons.count(criteria).await
    }
}
