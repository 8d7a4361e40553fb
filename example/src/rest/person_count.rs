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

//! API to count persons.  Served under HEAD; the HTTP layer strips the body on the wire.

use crate::rest::resources::SearchPersonsQuery;
use crate::rest::AppState;
use axum::extract::{Query, State};
use axum::Json;
use crudkit_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(
    State(state): State<AppState>,
    Query(query): Query<SearchPersonsQuery>,
) -> Result<Json<i64>, RestError> {
    let count = state.driver.count_persons(&query.into_criteria()).await?;
    Ok(Json(count))
}

#[cfg(test)]
mod tests {
    use crate::rest::resources::*;
    use crate::rest::testutils::*;
    use axum::http;
    use crudkit_core::rest::testutils::*;

    /// The route under test.
    fn route() -> (http::Method, &'static str) {
        (http::Method::HEAD, "/api/v1/person")
    }

    #[tokio::test]
    async fn test_count_all() {
        let context = TestContext::setup().await;
        context.create_person("Bob", "Jones").await;
        context.create_person("Ann", "Smith").await;

        let count = OneShotBuilder::new(context.into_app(), route())
            .send_empty()
            .await
            .expect_json::<i64>()
            .await;
        assert_eq!(2, count);
    }

    #[tokio::test]
    async fn test_count_with_filter() {
        let context = TestContext::setup().await;
        context.create_person("Bob", "Jones").await;
        context.create_person("Ann", "Smith").await;

        let count = OneShotBuilder::new(context.into_app(), route())
            .with_query(SearchPersonsQuery {
                last_name: Some("Smith".to_owned()),
                ..SearchPersonsQuery::default()
            })
            .send_empty()
            .await
            .expect_json::<i64>()
            .await;
        assert_eq!(1, count);
    }
}
