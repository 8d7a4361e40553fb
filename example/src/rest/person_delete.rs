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

//! API to delete a person.

use crate::rest::AppState;
use axum::extract::{Path, State};
use crudkit_core::rest::{EmptyBody, RestError};
use uuid::Uuid;

/// API handler.  The conventions turn the empty success response into a 204.
pub(crate) async fn handler(
    State(state): State<AppState>,
    Path(person_id): Path<Uuid>,
    _: EmptyBody,
) -> Result<(), RestError> {
    state.driver.delete_person(person_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use axum::http;
    use crudkit_core::rest::testutils::*;
    use uuid::Uuid;

    /// The route under test.
    fn route(id: &Uuid) -> (http::Method, String) {
        (http::Method::DELETE, format!("/api/v1/person/{}", id))
    }

    #[tokio::test]
    async fn test_delete_returns_204_with_empty_body() {
        let context = TestContext::setup().await;
        let id = context.create_person("Bob", "Jones").await;

        OneShotBuilder::new(context.app(), route(&id))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NO_CONTENT)
            .expect_empty()
            .await;

        assert!(!context.has_person(id).await);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_404() {
        let context = TestContext::setup().await;
        let id = context.create_person("Bob", "Jones").await;

        OneShotBuilder::new(context.app(), route(&Uuid::new_v4()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Person not found")
            .await;

        // The miss must not have touched other rows.
        assert!(context.has_person(id).await);
    }

    test_payload_must_be_empty!(
        TestContext::setup().await.into_app(),
        route(&uuid::Uuid::new_v4())
    );
}
