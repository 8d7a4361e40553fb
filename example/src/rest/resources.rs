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

//! Request and response schemas of the person APIs.  All payloads are camel-cased JSON.

use crate::model::{Person, PersonPatch};
use crudkit_core::model::{FieldValue, Model};
use crudkit_core::rest::{RestError, RestResult};
use crudkit_core::store::SearchCriteria;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload to create a person.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewPersonRequest {
    /// The person's first name.
    pub(crate) first_name: String,

    /// The person's last name.
    pub(crate) last_name: String,
}

impl NewPersonRequest {
    /// Converts the payload into an unsaved model instance.
    pub(crate) fn into_person(self) -> Person {
        Person::new(None, self.first_name, self.last_name)
    }

    /// Converts the payload into a full patch, for replace semantics.
    pub(crate) fn into_patch(self) -> PersonPatch {
        PersonPatch { first_name: Some(self.first_name), last_name: Some(self.last_name) }
    }
}

/// Payload to partially update a person.  Absent fields retain their previous values.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdatePersonRequest {
    /// New first name, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) first_name: Option<String>,

    /// New last name, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) last_name: Option<String>,
}

impl UpdatePersonRequest {
    /// Converts the payload into a patch.
    pub(crate) fn into_patch(self) -> PersonPatch {
        PersonPatch { first_name: self.first_name, last_name: self.last_name }
    }
}

/// A person as returned by the APIs.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersonResponse {
    /// The person's identifier.
    pub(crate) id: Uuid,

    /// The person's first name.
    pub(crate) first_name: String,

    /// The person's last name.
    pub(crate) last_name: String,
}

impl PersonResponse {
    /// Renders a stored person.  Stored persons always carry an identifier.
    pub(crate) fn try_from_person(person: &Person) -> RestResult<PersonResponse> {
        let id = person
            .id()
            .ok_or_else(|| RestError::InternalError("Person has no identifier".to_owned()))?;
        Ok(PersonResponse {
            id,
            first_name: person.first_name().clone(),
            last_name: person.last_name().clone(),
        })
    }
}

/// Query parameters accepted by the search and count APIs.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchPersonsQuery {
    /// Pagination offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) offset: Option<u64>,

    /// Pagination limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<u64>,

    /// Filter by exact first name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) first_name: Option<String>,

    /// Filter by exact last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) last_name: Option<String>,
}

impl SearchPersonsQuery {
    /// Converts the query parameters into store search criteria.
    pub(crate) fn into_criteria(self) -> SearchCriteria {
        let mut criteria = SearchCriteria::new();
        if let Some(offset) = self.offset {
            criteria = criteria.with_offset(offset);
        }
        if let Some(limit) = self.limit {
            criteria = criteria.with_limit(limit);
        }
        if let Some(first_name) = self.first_name {
            criteria = criteria.with_filter("first_name", FieldValue::Text(first_name));
        }
        if let Some(last_name) = self.last_name {
            criteria = criteria.with_filter("last_name", FieldValue::Text(last_name));
        }
        criteria
    }
}
