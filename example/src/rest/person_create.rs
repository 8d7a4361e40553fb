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

//! API to create a person.

use crate::rest::resources::{NewPersonRequest, PersonResponse};
use crate::rest::AppState;
use axum::extract::State;
use axum::Json;
use crudkit_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(
    State(state): State<AppState>,
    Json(request): Json<NewPersonRequest>,
) -> Result<Json<PersonResponse>, RestError> {
    let person = state.driver.create_person(request.into_person()).await?;
    Ok(Json(PersonResponse::try_from_person(&person)?))
}

#[cfg(test)]
mod tests {
    use crate::rest::resources::*;
    use crate::rest::testutils::*;
    use axum::http;
    use crudkit_core::rest::testutils::*;

    /// The route under test.
    fn route() -> (http::Method, &'static str) {
        (http::Method::POST, "/api/v1/person")
    }

    #[tokio::test]
    async fn test_create_returns_201_with_generated_id() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(NewPersonRequest {
                first_name: "Bob".to_owned(),
                last_name: "Jones".to_owned(),
            })
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<PersonResponse>()
            .await;
        assert_eq!("Bob", response.first_name);
        assert_eq!("Jones", response.last_name);

        assert!(context.has_person(response.id).await);
    }

    #[tokio::test]
    async fn test_create_response_is_camel_cased() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(NewPersonRequest {
                first_name: "Bob".to_owned(),
                last_name: "Jones".to_owned(),
            })
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<serde_json::Value>()
            .await;
        assert!(response.get("firstName").is_some());
        assert!(response.get("lastName").is_some());
        assert!(response.get("first_name").is_none());
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route());
}
