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

//! Global exception handling: no failure leaves the service as anything but the JSON error
//! envelope.
//!
//! Two layers cooperate here.  The panic layer sits closest to the handlers and converts a
//! panicking handler into the 500 envelope, binding the panic message to the response for the
//! audit middleware to observe.  The exception middleware sits outside it and is the single
//! point where envelopes are finalized: it merges the request-scoped `X-Request-*` context
//! into whatever envelope the inner layers produced.

use crate::rest::audit::request_context;
use crate::rest::ErrorEnvelope;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;

/// Failure detail bound to a response when a handler panicked.  Logged by the audit
/// middleware in debug and testing modes; never sent to clients.
#[derive(Clone, Debug)]
pub struct StackTrace(pub String);

/// Signature of the panic responder installed by `catch_panic_layer`.
type PanicResponder = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Returns the layer that converts handler panics into the error envelope.
///
/// Mount this closest to the routes so that the exception middleware and the audit middleware
/// observe the synthesized response.
pub fn catch_panic_layer() -> CatchPanicLayer<PanicResponder> {
    CatchPanicLayer::custom(panic_response as PanicResponder)
}

/// Builds the 500 envelope response for a panic payload.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        (*message).to_owned()
    } else {
        String::new()
    };

    let mut envelope = ErrorEnvelope::unknown_error();
    if !message.is_empty() {
        envelope.message = message.clone();
    }

    let trace = if message.is_empty() { "panic".to_owned() } else { message };
    let mut response = envelope.into_response();
    response.extensions_mut().insert(StackTrace(trace));
    response
}

/// The exception middleware: finalizes error envelopes with the request-scoped context.
///
/// Responses that carry no envelope pass through untouched.
pub async fn exception_middleware(request: Request, next: Next) -> Response {
    let context = request_context(request.headers());
    let response = next.run(request).await;

    let envelope = match response.extensions().get::<ErrorEnvelope>() {
        Some(envelope) if !context.is_empty() => {
            let mut envelope = envelope.clone();
            envelope.context.extra.extend(context);
            envelope
        }
        _ => return response,
    };

    let stack_trace = response.extensions().get::<StackTrace>().cloned();
    let mut response = envelope.into_response();
    if let Some(stack_trace) = stack_trace {
        response.extensions_mut().insert(stack_trace);
    }
    response
}
