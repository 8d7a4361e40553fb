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

//! API to retrieve a person by id.

use crate::rest::resources::PersonResponse;
use crate::rest::AppState;
use axum::extract::{Path, State};
use axum::Json;
use crudkit_core::rest::{EmptyBody, RestError};
use uuid::Uuid;

/// API handler.
pub(crate) async fn handler(
    State(state): State<AppState>,
    Path(person_id): Path<Uuid>,
    _: EmptyBody,
) -> Result<Json<PersonResponse>, RestError> {
    let person = state.driver.get_person(person_id).await?;
    Ok(Json(PersonResponse::try_from_person(&person)?))
}
