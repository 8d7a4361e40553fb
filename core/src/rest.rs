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

//! Generic code for REST handlers.
//!
//! Every error that leaves the REST layer is rendered as the JSON envelope
//! `{code, context, message, retryable}`.  The `RestError` hierarchy fixes all four fields at
//! construction time, so no reflection over arbitrary error objects happens anywhere: an error
//! either is a `RestError` (possibly converted from a lower layer through `From`) or it is
//! normalized to the 500 "Unknown Error" envelope by the exception middleware.
//!
//! Every API of a service should be put in its own `.rs` file, using a name like
//! `<entity>_<operation>.rs`.  This may seem overkill, but putting every API in its own file
//! makes it easy to ensure all the integration tests for the given API truly belong to that
//! API.

use crate::driver::DriverError;
use crate::model::ModelError;
use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::AsHeaderName;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

pub mod audit;
mod base_urls;
pub use base_urls::BaseUrls;
pub mod crud;
pub mod exceptions;
pub mod schemas;

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
///
/// Every variant has a fixed status code and retryable flag; the carried string is the
/// client-facing message.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// Indicates that the request conflicts with existing state, such as creating a duplicate
    /// or deleting an entity that is still referenced.
    #[error("{0}")]
    Conflict(String),

    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// Indicates that the backing services cannot take the request right now.  Retryable.
    #[error("{0}")]
    Unavailable(String),

    /// Indicates a request that was well-formed but semantically unprocessable.
    #[error("{0}")]
    UnprocessableEntity(String),
}

impl RestError {
    /// Returns the HTTP status code of this error.
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            RestError::Conflict(_) => http::StatusCode::CONFLICT,
            RestError::InternalError(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => http::StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => http::StatusCode::NOT_FOUND,
            RestError::PayloadNotEmpty => http::StatusCode::PAYLOAD_TOO_LARGE,
            RestError::Unavailable(_) => http::StatusCode::SERVICE_UNAVAILABLE,
            RestError::UnprocessableEntity(_) => http::StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Returns true when retrying the same request might succeed.
    pub fn retryable(&self) -> bool {
        matches!(self, RestError::Unavailable(_))
    }

    /// Renders this error as the client-visible envelope.
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.status_code().as_u16(),
            context: ErrorContext::default(),
            message: self.to_string(),
            retryable: self.retryable(),
        }
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::InvalidInput(_) => RestError::UnprocessableEntity(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
            DriverError::StillReferenced(_) => RestError::Conflict(e.to_string()),
            DriverError::Unavailable => RestError::Unavailable(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl From<serde_json::Error> for RestError {
    fn from(e: serde_json::Error) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        self.envelope().into_response()
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// A sub-error inside an error envelope's context.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SubError {
    /// Textual description of the sub-error.
    pub message: String,
}

/// The `context` object of an error envelope.
///
/// Always carries an `errors` list (possibly empty).  Request-context headers captured by the
/// exception middleware appear as additional keys.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ErrorContext {
    /// Structured sub-errors, such as per-field validation failures.
    pub errors: Vec<SubError>,

    /// Additional context entries, flattened into the JSON object.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The uniform JSON error shape returned to clients:
/// `{"code": int, "context": {"errors": []}, "message": str, "retryable": bool}`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    /// Numeric status code, also used as the HTTP status of the response.
    pub code: u16,

    /// Context of the failure.
    pub context: ErrorContext,

    /// Human-readable message.
    pub message: String,

    /// Whether retrying the same request might succeed.
    pub retryable: bool,
}

impl ErrorEnvelope {
    /// The envelope for failures nothing knows anything about.
    pub fn unknown_error() -> Self {
        ErrorEnvelope {
            code: http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            context: ErrorContext::default(),
            message: "Unknown Error".to_owned(),
            retryable: false,
        }
    }

    /// Returns the envelope's code as an HTTP status, defaulting to 500 when out of range.
    pub fn status(&self) -> http::StatusCode {
        http::StatusCode::from_u16(self.code)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status(), Json(&self)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data that
/// we don't care about.  This future-proofs the service.
pub struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        match axum::body::to_bytes(req.into_body(), 0).await {
            Ok(bytes) if bytes.is_empty() => Ok(EmptyBody {}),
            _ => Err(RestError::PayloadNotEmpty),
        }
    }
}

/// Extracts the header `name` from `headers` and ensures it has at most one value.
pub fn get_unique_header<K: AsHeaderName + Copy>(
    headers: &HeaderMap,
    name: K,
) -> RestResult<Option<&HeaderValue>> {
    let mut iter = headers.get_all(name).iter();
    let value = iter.next();
    if iter.next().is_some() {
        return Err(RestError::InvalidRequest(format!(
            "Header {} cannot have more than one value",
            name.as_str()
        )));
    }
    Ok(value)
}

/// Common test code for the REST server.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use axum::http::{self, HeaderName};
    use axum::Router;
    use bytes::Bytes;
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use tower::util::ServiceExt;

    /// Maximum body size for testing purposes.
    const MAX_BODY_SIZE: usize = 1024;

    /// Builder for a single request to the API server.
    #[must_use]
    pub struct OneShotBuilder {
        /// The router for the app being tested.
        app: Router,

        /// Builder for the request that will be sent to the app.
        builder: axum::http::request::Builder,
    }

    impl OneShotBuilder {
        /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
            let builder = Request::builder().method(method).uri(uri.as_ref());
            Self { app, builder }
        }

        /// Extends the URI in the request with a `query`.
        pub fn with_query<Q: Serialize>(mut self, query: Q) -> Self {
            let uri = self.builder.uri_ref().unwrap().to_string();
            assert!(!uri.contains('?'), "URI already contains a query: {}", uri);
            self.builder = self.builder.uri(format!(
                "{}?{}",
                uri,
                serde_urlencoded::to_string(query).unwrap()
            ));
            self
        }

        /// Sets the header `name` to `value` in the outgoing request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Finishes building the request and sends it with an empty payload.
        pub async fn send_empty(self) -> ResponseChecker {
            let request = self.builder.body(axum::body::Body::empty()).unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a binary payload.
        pub async fn send_bytes(self, bytes: Bytes) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.as_ref())
                .body(axum::body::Body::from(bytes))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a text payload.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
                .body(axum::body::Body::from(text.into()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a JSON payload.
        pub async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(axum::body::Body::from(serde_json::to_vec(&request).unwrap()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }
    }

    /// Type alias for the complex type returned by the `oneshot` function.
    type HttpResponse = hyper::Response<axum::body::Body>;

    /// Validator for the outcome of a request sent by a `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// Actual response that we received from the app.
        response: HttpResponse,

        /// Expected HTTP status code in the response above.
        exp_status: http::StatusCode,
    }

    impl From<HttpResponse> for ResponseChecker {
        fn from(response: HttpResponse) -> Self {
            Self { response, exp_status: http::StatusCode::OK }
        }
    }

    impl ResponseChecker {
        /// Sets the expected exit HTTP status to `status`.
        pub fn expect_status(mut self, status: http::StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Performs common validation operations on the response.
        pub fn verify(&self) {
            assert_eq!(self.exp_status, self.response.status());
        }

        /// Returns the value of the unique header `name`, if present.
        pub fn header(&self, name: &str) -> Option<String> {
            self.response
                .headers()
                .get(name)
                .map(|value| value.to_str().unwrap().to_owned())
        }

        /// Finishes checking the response and expects it to contain an empty body.
        pub async fn expect_empty(self) {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let body = String::from_utf8(body.to_vec()).unwrap();
            assert!(body.is_empty(), "Body not empty; got {}", body);
        }

        /// Finishes checking the response and expects its body to be an `ErrorEnvelope` whose
        /// message matches `exp_re`.  Returns the envelope for further validation.
        pub async fn expect_error(self, exp_re: &str) -> ErrorEnvelope {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let envelope: ErrorEnvelope = match serde_json::from_slice(&body) {
                Ok(envelope) => envelope,
                Err(e) => {
                    let body = String::from_utf8(body.to_vec()).unwrap();
                    panic!("Invalid error response due to {}; content was {}", e, body);
                }
            };
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&envelope.message),
                "Error message '{}' does not match re '{}'",
                envelope.message,
                exp_re
            );
            assert_eq!(self.exp_status.as_u16(), envelope.code);
            envelope
        }

        /// Finishes checking the response and expects it to contain a valid JSON object of
        /// type `T`.
        pub async fn expect_json<T: DeserializeOwned>(self) -> T {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            serde_json::from_slice::<T>(&body).unwrap()
        }

        /// Finishes checking the response and expects its body to be valid UTF-8 and to match
        /// `exp_re`.
        pub async fn expect_text(self, exp_re: &str) {
            assert!(!exp_re.is_empty(), "Use expect_empty to validate empty responses");

            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            let body = String::from_utf8(body.to_vec()).unwrap();
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(re.is_match(&body), "Body content '{}' does not match re '{}'", body, exp_re);
        }

        /// Finishes checking the response and returns the body of the response as UTF-8.
        pub async fn take_body_as_text(self) -> String {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
            String::from_utf8(body.to_vec()).unwrap()
        }

        /// Finishes checking the response and returns the response itself for out of band
        /// validation of properties not supported by the `ResponseChecker`.
        pub async fn take_response(self) -> HttpResponse {
            self.verify();

            self.response
        }
    }

    /// Generates a test to verify that an API that expects JSON fails when it gets something
    /// else.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr $(, $query:expr)? ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
                    .expect_text("Content-Type")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_json;

    /// Generates a test to verify that an API that does not expect a payload fails as
    /// necessary.
    #[macro_export]
    macro_rules! test_payload_must_be_empty {
        ( $app:expr, $route:expr $(, $query:expr)? ) => {
            #[tokio::test]
            async fn test_payload_must_be_empty() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .send_text("should not be here")
                    .await
                    .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                    .expect_error("should be empty")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_empty;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unique_header_missing() {
        let mut headers = HeaderMap::new();
        headers.append("ignore-me", "ignored".parse().unwrap());
        assert!(get_unique_header(&headers, "the-header").unwrap().is_none());
    }

    #[test]
    fn test_get_unique_header_one() {
        let mut headers = HeaderMap::new();
        headers.append("ignore-me", "ignored".parse().unwrap());
        headers.append("the-header", "foo".parse().unwrap());
        assert_eq!(b"foo", get_unique_header(&headers, "the-header").unwrap().unwrap().as_bytes());
    }

    #[test]
    fn test_get_unique_header_many() {
        let mut headers = HeaderMap::new();
        headers.append("the-header", "foo".parse().unwrap());
        headers.append("ignore-me", "ignored".parse().unwrap());
        headers.append("The-Header", "bar".parse().unwrap());
        assert_eq!(
            RestError::InvalidRequest(
                "Header the-header cannot have more than one value".to_owned()
            ),
            get_unique_header(&headers, "the-header").unwrap_err()
        );
    }

    #[test]
    fn test_rest_error_status_codes() {
        assert_eq!(
            http::StatusCode::NOT_FOUND,
            RestError::NotFound("Person not found".to_owned()).status_code()
        );
        assert_eq!(
            http::StatusCode::CONFLICT,
            RestError::Conflict("dup".to_owned()).status_code()
        );
        assert_eq!(
            http::StatusCode::SERVICE_UNAVAILABLE,
            RestError::Unavailable("down".to_owned()).status_code()
        );
    }

    #[test]
    fn test_rest_error_envelope_fields() {
        let envelope = RestError::NotFound("Person not found".to_owned()).envelope();
        assert_eq!(404, envelope.code);
        assert_eq!("Person not found", envelope.message);
        assert!(!envelope.retryable);
        assert!(envelope.context.errors.is_empty());

        let envelope = RestError::Unavailable("down".to_owned()).envelope();
        assert!(envelope.retryable);
    }

    #[test]
    fn test_error_envelope_serialization_shape() {
        let envelope = RestError::NotFound("nope".to_owned()).envelope();
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            serde_json::json!({
                "code": 404,
                "context": {"errors": []},
                "message": "nope",
                "retryable": false,
            }),
            value
        );
    }

    #[test]
    fn test_error_envelope_unknown_error() {
        let envelope = ErrorEnvelope::unknown_error();
        assert_eq!(500, envelope.code);
        assert_eq!("Unknown Error", envelope.message);
        assert!(!envelope.retryable);
    }

    #[test]
    fn test_error_envelope_bad_code_defaults_to_500() {
        let mut envelope = ErrorEnvelope::unknown_error();
        envelope.code = 9999;
        assert_eq!(http::StatusCode::INTERNAL_SERVER_ERROR, envelope.status());
    }

    #[test]
    fn test_driver_error_conversions() {
        use crate::driver::DriverError;

        assert_eq!(
            RestError::NotFound("Person not found".to_owned()),
            RestError::from(DriverError::NotFound("Person not found".to_owned()))
        );
        assert_eq!(
            RestError::Conflict("Person already exists".to_owned()),
            RestError::from(DriverError::AlreadyExists("Person already exists".to_owned()))
        );
        assert!(matches!(
            RestError::from(DriverError::Unavailable),
            RestError::Unavailable(_)
        ));
    }
}
