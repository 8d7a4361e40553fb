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

//! High-level data types.

use crudkit_core::model::{
    ColumnSpec, FieldKind, FieldValue, Model, ModelError, ModelResult, RowValues,
};
use derive_getters::Getters;
use derive_more::Constructor;
use uuid::Uuid;

/// A person known to the service.
#[derive(Clone, Constructor, Debug, Getters, PartialEq)]
pub(crate) struct Person {
    /// Primary key; absent until the store assigns one.
    #[getter(skip)]
    id: Option<Uuid>,

    /// The person's first name.
    first_name: String,

    /// The person's last name.
    last_name: String,
}

/// Partial view of a `Person`; unset fields keep their previous values when merged.
#[derive(Clone, Debug, Default)]
pub(crate) struct PersonPatch {
    /// New first name, if changing.
    pub(crate) first_name: Option<String>,

    /// New last name, if changing.
    pub(crate) last_name: Option<String>,
}

impl Model for Person {
    type Patch = PersonPatch;

    fn model_name() -> &'static str {
        "Person"
    }

    fn table() -> &'static str {
        "persons"
    }

    fn columns() -> &'static [ColumnSpec] {
        &[
            ColumnSpec { name: "id", kind: FieldKind::Uuid },
            ColumnSpec { name: "first_name", kind: FieldKind::Text },
            ColumnSpec { name: "last_name", kind: FieldKind::Text },
        ]
    }

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.map(FieldValue::Uuid).unwrap_or(FieldValue::Null),
            FieldValue::Text(self.first_name.clone()),
            FieldValue::Text(self.last_name.clone()),
        ]
    }

    fn from_row(row: &RowValues) -> ModelResult<Self> {
        Ok(Person {
            id: Some(row.uuid("id")?),
            first_name: row.text("first_name")?,
            last_name: row.text("last_name")?,
        })
    }

    fn merge(&mut self, patch: &PersonPatch) {
        if let Some(first_name) = &patch.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            self.last_name = last_name.clone();
        }
    }

    fn from_patch(id: Uuid, patch: &PersonPatch) -> ModelResult<Self> {
        match (&patch.first_name, &patch.last_name) {
            (Some(first_name), Some(last_name)) => {
                Ok(Person::new(Some(id), first_name.clone(), last_name.clone()))
            }
            _ => Err(ModelError("Person requires a first and a last name".to_owned())),
        }
    }
}
