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

//! API to search persons.

use crate::rest::resources::{PersonResponse, SearchPersonsQuery};
use crate::rest::{person_ns, AppState};
use axum::extract::{Query, State};
use axum::Json;
use crudkit_core::operations::Operation;
use crudkit_core::rest::schemas::SearchPage;
use crudkit_core::rest::{RestError, RestResult};

/// API handler.
pub(crate) async fn handler(
    State(state): State<AppState>,
    Query(query): Query<SearchPersonsQuery>,
) -> Result<Json<SearchPage<PersonResponse>>, RestError> {
    let criteria = query.into_criteria();
    let (items, count) = state.driver.search_persons(&criteria).await?;
    let items = items
        .iter()
        .map(PersonResponse::try_from_person)
        .collect::<RestResult<Vec<PersonResponse>>>()?;

    let url = person_ns().url_for(&state.base_urls, Operation::Search, None);
    let page =
        SearchPage::new(items, count, criteria.offset, criteria.limit).with_links(&url);
    Ok(Json(page))
}
