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

//! Audit log support: one structured record per conventional request.
//!
//! The middleware resolves "what operation is this" from the raw URL path and method through
//! the `LoggingDataMap` that route registration populated.  If the lookup comes back empty the
//! request is not logged at all; that is the escape hatch for routes mounted outside the CRUD
//! conventions.  GET requests need a disambiguator because retrieve and search share the
//! method; they are told apart by the presence of the identifier path segment.
//!
//! Request and response bodies are captured only in debug mode and under a size gate, and the
//! capture is best effort: bodies that fail to decode as JSON are silently dropped.  Capturing
//! the response body requires consuming and replacing the body, since it can only be read once.

use crate::env::get_optional_var;
use crate::namespace::Namespace;
use crate::operations::Operation;
use crate::rest::exceptions::StackTrace;
use crate::rest::ErrorEnvelope;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use log::{debug, error, info};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Header that suppresses audit logging for a single request.
pub const NOLOG_HEADER: &str = "x-request-nolog";

/// Prefix of the headers propagated into the audit and error contexts.
const REQUEST_CONTEXT_PREFIX: &str = "x-request-";

/// Response header reporting handler latency in seconds.
const PROCESS_TIME_HEADER: &str = "X-Process-Time";

/// Maximum length of error messages included in audit records.
const ERROR_MESSAGE_LIMIT: usize = 2048;

/// Default size gate for request body capture, in bytes.
const DEFAULT_INCLUDE_REQUEST_BODY: usize = 400;

/// Default size gate for response body capture, in bytes.
const DEFAULT_INCLUDE_RESPONSE_BODY: usize = 400;

/// Configuration knobs of the audit middleware.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct AuditOptions {
    /// Capture request bodies up to this many bytes; zero disables capture.
    pub include_request_body: usize,

    /// Capture response bodies up to this many bytes; zero disables capture.
    pub include_response_body: usize,

    /// Include the request path in audit records.
    pub include_path: bool,

    /// Include single-valued UUID query arguments in audit records.
    pub include_query_string: bool,

    /// Emit non-error records at debug level instead of info.
    pub log_as_debug: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        AuditOptions {
            include_request_body: DEFAULT_INCLUDE_REQUEST_BODY,
            include_response_body: DEFAULT_INCLUDE_RESPONSE_BODY,
            include_path: false,
            include_query_string: false,
            log_as_debug: false,
        }
    }
}

impl AuditOptions {
    /// Initializes the options from environment variables whose name is prefixed with the
    /// given `prefix`, falling back to the documented defaults.
    ///
    /// This will use variables such as `<prefix>_INCLUDE_REQUEST_BODY`,
    /// `<prefix>_INCLUDE_RESPONSE_BODY`, `<prefix>_INCLUDE_PATH`,
    /// `<prefix>_INCLUDE_QUERY_STRING` and `<prefix>_LOG_AS_DEBUG`.
    pub fn from_env(prefix: &str) -> Result<AuditOptions, String> {
        let defaults = AuditOptions::default();
        Ok(AuditOptions {
            include_request_body: get_optional_var::<usize>(prefix, "INCLUDE_REQUEST_BODY")?
                .unwrap_or(defaults.include_request_body),
            include_response_body: get_optional_var::<usize>(prefix, "INCLUDE_RESPONSE_BODY")?
                .unwrap_or(defaults.include_response_body),
            include_path: get_optional_var::<bool>(prefix, "INCLUDE_PATH")?
                .unwrap_or(defaults.include_path),
            include_query_string: get_optional_var::<bool>(prefix, "INCLUDE_QUERY_STRING")?
                .unwrap_or(defaults.include_query_string),
            log_as_debug: get_optional_var::<bool>(prefix, "LOG_AS_DEBUG")?
                .unwrap_or(defaults.log_as_debug),
        })
    }
}

/// The audit identifiers of one registered route.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoggingInfo {
    /// Dotted operation name, such as `person.retrieve.v1`.
    pub operation_name: Option<String>,

    /// Name of the handler function serving the route.
    pub function_name: Option<String>,
}

impl LoggingInfo {
    /// Returns true when this info carries no identifiers, meaning the route was not
    /// registered through the CRUD conventions.
    pub fn is_empty(&self) -> bool {
        self.operation_name.is_none() && self.function_name.is_none()
    }
}

/// Key of one logging data map entry.
///
/// The fields are: version, subject, object, method, and the GET disambiguator.  The key must
/// be derivable identically from the registration-time namespace and from the runtime URL
/// path, or lookups silently come back empty.
type LoggingKey = (Option<String>, String, Option<String>, String, Option<&'static str>);

/// Maps (path shape, method) keys to the audit identifiers recorded at registration time.
///
/// Populated once during route registration and treated as immutable afterwards; the audit
/// middleware reads it on every request because it only has the raw path string, not the
/// original namespace, at request time.
#[derive(Debug, Default)]
pub struct LoggingDataMap {
    /// The registered entries.
    entries: HashMap<LoggingKey, LoggingInfo>,
}

impl LoggingDataMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the audit identifiers for `operation` registered under `namespace` with the
    /// handler named `function_name`.  A later registration with the same key wins.
    pub fn add_entry(&mut self, namespace: &Namespace, operation: Operation, function_name: &str) {
        let operation_name = namespace.operation_name_for_logging(operation);
        let key = Self::key_for_namespace(namespace, operation);
        self.entries.insert(
            key,
            LoggingInfo {
                operation_name: Some(operation_name),
                function_name: Some(function_name.to_owned()),
            },
        );
    }

    /// Resolves the audit identifiers for a request, returning the empty info when the path
    /// does not correspond to a registered conventional route.
    pub fn get_entry(&self, path: &str, method: &Method) -> LoggingInfo {
        match Self::key_for_path(path, method) {
            Some(key) => self.entries.get(&key).cloned().unwrap_or_default(),
            None => LoggingInfo::default(),
        }
    }

    /// Derives the map key from a registration-time namespace and operation.
    fn key_for_namespace(namespace: &Namespace, operation: Operation) -> LoggingKey {
        let object = if operation.is_relation() {
            namespace.object().map(str::to_owned)
        } else {
            None
        };
        (
            namespace.version().map(str::to_owned),
            namespace.subject().to_owned(),
            object,
            operation.info().method.to_string(),
            Self::disambiguator(operation),
        )
    }

    /// Derives the map key from a runtime URL path and method.
    ///
    /// Single subject: `/api/v1/pizza` maps to `(v1, pizza, None, GET, search)`.
    /// Subject and id: `/api/v1/pizza/1234` maps to `(v1, pizza, None, GET, retrieve)`.
    /// Subject and object: `/api/v1/pizza/1234/order` maps to `(v1, pizza, order, GET, None)`.
    fn key_for_path(path: &str, method: &Method) -> Option<LoggingKey> {
        let parts: Vec<&str> = path.split('/').collect();

        // Only paths of the shape /{prefix}/{version}/... are conventional.
        if parts.len() < 4 || !parts[0].is_empty() || !parts[2].starts_with('v') {
            return None;
        }

        let version = Some(parts[2].to_owned());
        let subject = Self::resource_name(parts[3]);
        match parts.len() {
            // Collection shape.  GET is ambiguous between search and retrieve, and the lack of
            // an identifier segment means search.
            4 => {
                let disambiguator = (*method == Method::GET).then_some("search");
                Some((version, subject, None, method.to_string(), disambiguator))
            }

            // Instance shape: the trailing segment is the identifier.
            5 => {
                let disambiguator = (*method == Method::GET).then_some("retrieve");
                Some((version, subject, None, method.to_string(), disambiguator))
            }

            // Relation shape: subject, identifier, object.
            6 => Some((version, subject, Some(parts[5].to_owned()), method.to_string(), None)),

            _ => None,
        }
    }

    /// Returns the disambiguator recorded for GET operations that share a method.
    fn disambiguator(operation: Operation) -> Option<&'static str> {
        let info = operation.info();
        if info.method == Method::GET && (info.name == "search" || info.name == "retrieve") {
            Some(info.name)
        } else {
            None
        }
    }

    /// Strips a query string from a path segment.
    fn resource_name(part: &str) -> String {
        part.split('?').next().unwrap_or(part).to_owned()
    }
}

/// Process-wide state of the audit middleware.
pub struct AuditState {
    /// Configuration knobs.
    pub options: AuditOptions,

    /// The identifiers recorded at route registration time.
    pub data_map: Arc<LoggingDataMap>,

    /// Whether the application runs in debug mode; gates body capture and stack traces.
    pub debug: bool,

    /// Whether the application runs under tests; gates stack traces like `debug`.
    pub testing: bool,
}

/// Capture of key information for one request.
struct RequestInfo {
    /// Dotted operation name resolved from the logging data map.
    operation: Option<String>,

    /// Handler function name resolved from the logging data map.
    func: Option<String>,

    /// HTTP method of the request.
    method: String,

    /// URL path of the request.
    path: String,

    /// Raw query string of the request, if any.
    query: Option<String>,

    /// `X-Request-*` headers of the request.
    request_context: Map<String, Value>,

    /// Handler latency in milliseconds, filled in after the handler ran.
    elapsed_time_ms: Option<f64>,

    /// Captured request body, when capture is enabled and the body was JSON.
    request_body: Option<Value>,

    /// Captured response body, when capture is enabled and the body was JSON.
    response_body: Option<Value>,

    /// Final status code of the response.
    status_code: Option<u16>,

    /// Error envelope bound to the response, when the request failed.
    error: Option<ErrorEnvelope>,

    /// Stack trace bound to the response by the panic handler, when one unwound.
    stack_trace: Option<String>,
}

impl RequestInfo {
    /// Captures the request-scoped context available before the handler runs.
    fn new(request: &Request, info: &LoggingInfo) -> Self {
        RequestInfo {
            operation: info.operation_name.clone(),
            func: info.function_name.clone(),
            method: request.method().to_string(),
            path: request.uri().path().to_owned(),
            query: request.uri().query().map(str::to_owned),
            request_context: request_context(request.headers()),
            elapsed_time_ms: None,
            request_body: None,
            response_body: None,
            status_code: None,
            error: None,
            stack_trace: None,
        }
    }

    /// Returns true when the response completed without a client or server error.
    fn success(&self) -> bool {
        self.status_code.map(|code| code < 400).unwrap_or(false)
    }

    /// Renders the audit record as one JSON object.
    fn to_json(&self, options: &AuditOptions, include_stack_trace: bool) -> Value {
        let mut record = Map::new();
        if let Some(operation) = &self.operation {
            record.insert("operation".to_owned(), Value::from(operation.clone()));
        }
        if let Some(func) = &self.func {
            record.insert("func".to_owned(), Value::from(func.clone()));
        }
        record.insert("method".to_owned(), Value::from(self.method.clone()));
        if let Some(elapsed_time_ms) = self.elapsed_time_ms {
            record.insert("elapsed_time_ms".to_owned(), Value::from(elapsed_time_ms));
        }

        if options.include_path {
            record.insert("path".to_owned(), Value::from(self.path.clone()));
        }
        if options.include_query_string {
            for (key, value) in self.uuid_query_args() {
                record.insert(key, Value::from(value));
            }
        }

        for (key, value) in &self.request_context {
            record.insert(key.clone(), value.clone());
        }

        record.insert("success".to_owned(), Value::from(self.success()));
        if let Some(status_code) = self.status_code {
            record.insert("status_code".to_owned(), Value::from(status_code));
        }

        if !self.success() {
            if let Some(error) = &self.error {
                let mut message = error.message.clone();
                message.truncate(ERROR_MESSAGE_LIMIT);
                record.insert("message".to_owned(), Value::from(message));
                record.insert(
                    "context".to_owned(),
                    serde_json::to_value(&error.context).unwrap_or(Value::Null),
                );
            }
            if include_stack_trace {
                if let Some(stack_trace) = &self.stack_trace {
                    record.insert("stack_trace".to_owned(), Value::from(stack_trace.clone()));
                }
            }
        }

        if let Some(request_body) = &self.request_body {
            record.insert("request_body".to_owned(), request_body.clone());
        }
        if let Some(response_body) = &self.response_body {
            record.insert("response_body".to_owned(), response_body.clone());
        }

        Value::Object(record)
    }

    /// Returns the single-valued query arguments whose value is a UUID.
    ///
    /// Only identifiers are safe to log unconditionally; arbitrary query values may carry
    /// payload data.
    fn uuid_query_args(&self) -> Vec<(String, String)> {
        let query = match &self.query {
            Some(query) => query,
            None => return vec![],
        };
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs
            .iter()
            .filter(|(key, value)| {
                Uuid::parse_str(value).is_ok()
                    && pairs.iter().filter(|(other, _)| other == key).count() == 1
            })
            .cloned()
            .collect()
    }

    /// Emits the audit record.  500-class responses log as errors; everything else logs at
    /// info, or debug when so configured.
    fn log(&self, options: &AuditOptions, include_stack_trace: bool) {
        let record = self.to_json(options, include_stack_trace);
        if self.status_code.map(|code| code >= 500).unwrap_or(false) {
            error!(target: "audit", "{}", record);
        } else if options.log_as_debug {
            debug!(target: "audit", "{}", record);
        } else {
            info!(target: "audit", "{}", record);
        }
    }
}

/// Extracts the `X-Request-*` headers that travel into audit records and error contexts.
pub fn request_context(headers: &HeaderMap) -> Map<String, Value> {
    let mut context = Map::new();
    for (name, value) in headers {
        let name = name.as_str().to_lowercase();
        if name.starts_with(REQUEST_CONTEXT_PREFIX) {
            if let Ok(value) = value.to_str() {
                context.insert(name, Value::from(value));
            }
        }
    }
    context
}

/// Checks whether the request asked to suppress audit logging via `X-Request-Nolog`.
fn nolog_requested(headers: &HeaderMap) -> bool {
    headers
        .get(NOLOG_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| matches!(value.to_lowercase().as_str(), "true" | "yes" | "1"))
        .unwrap_or(false)
}

/// Returns the declared content length of a message, if it carries one.
fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(http::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok())
}

/// Buffers the request body and puts an equivalent body back in place, returning the JSON
/// decode of the bytes if they were JSON.
///
/// Only called when the declared content length fits the capture gate, so the in-memory copy
/// is bounded.
async fn buffer_request_body(request: Request, limit: usize) -> (Request, Option<Value>) {
    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => {
            let decoded = serde_json::from_slice(&bytes).ok();
            (Request::from_parts(parts, Body::from(bytes)), decoded)
        }
        Err(_) => (Request::from_parts(parts, Body::empty()), None),
    }
}

/// Buffers the response body and puts an equivalent body back in place, returning the JSON
/// decode of the bytes if they were JSON.
///
/// This consumes and replaces the body's byte stream, which is the only way to read a response
/// body without breaking the client's ability to also read it.
async fn buffer_response_body(response: Response, limit: usize) -> (Response, Option<Value>) {
    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => {
            let decoded = serde_json::from_slice(&bytes).ok();
            (Response::from_parts(parts, Body::from(bytes)), decoded)
        }
        Err(_) => (Response::from_parts(parts, Body::empty()), None),
    }
}

/// The audit middleware: times the handler, resolves the operation identifiers, captures the
/// configured context, and emits one structured record per request.
///
/// Logging problems never fail the request; only the wrapped handler's outcome determines the
/// response.
pub async fn audit_middleware(
    State(state): State<Arc<AuditState>>,
    request: Request,
    next: Next,
) -> Response {
    let info = state.data_map.get_entry(request.uri().path(), request.method());
    let skip_logging = info.is_empty() || nolog_requested(request.headers());

    let mut request_info = RequestInfo::new(&request, &info);

    let request = if !skip_logging
        && state.debug
        && state.options.include_request_body > 0
        && content_length(request.headers())
            .map(|length| length < state.options.include_request_body)
            .unwrap_or(false)
    {
        let (request, body) = buffer_request_body(request, state.options.include_request_body).await;
        request_info.request_body = body;
        request
    } else {
        request
    };

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    request_info.elapsed_time_ms = Some(elapsed.as_secs_f64() * 1000.0);
    request_info.status_code = Some(response.status().as_u16());
    request_info.error = response.extensions().get::<ErrorEnvelope>().cloned();
    request_info.stack_trace =
        response.extensions().get::<StackTrace>().map(|trace| trace.0.clone());

    let mut response = if !skip_logging
        && state.debug
        && state.options.include_response_body > 0
        && content_length(response.headers())
            .map(|length| length < state.options.include_response_body)
            .unwrap_or(false)
    {
        let (response, body) =
            buffer_response_body(response, state.options.include_response_body).await;
        request_info.response_body = body;
        response
    } else {
        response
    };

    if let Ok(value) = HeaderValue::from_str(&format!("{:.6}", elapsed.as_secs_f64())) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }

    if !skip_logging {
        request_info.log(&state.options, state.debug || state.testing);
    }

    response
}
