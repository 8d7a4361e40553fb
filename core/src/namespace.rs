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

//! The `Namespace` type: the resource-identity context of a route group.
//!
//! A namespace combines a subject (the resource), an optional related object, a version and a
//! path prefix.  From those it derives the URL path of every operation, the dotted operation
//! name used as the audit-log correlation key, and absolute URLs to operations.
//!
//! Subject and object names are given explicitly in snake case; they become URL path segments
//! verbatim.

use crate::operations::{Operation, PathPattern};
use crate::rest::BaseUrls;
use url::Url;

/// Default version used in logging names when the namespace has none.
const DEFAULT_LOGGING_VERSION: &str = "v1";

/// The resource-identity context used to compute URL paths and logging keys.
///
/// Immutable after construction; create one per route group at wiring time.
#[derive(Clone, Copy, Debug)]
pub struct Namespace {
    /// Snake-case name of the subject resource.
    subject: &'static str,

    /// Snake-case name of the related object, for relation operations.
    object: Option<&'static str>,

    /// API version segment, such as `v1`.
    version: Option<&'static str>,

    /// Leading path segment, conventionally `api`.
    prefix: &'static str,
}

impl Namespace {
    /// Creates a namespace for `subject` with the conventional `api` prefix and no version.
    pub fn new(subject: &'static str) -> Self {
        Self { subject, object: None, version: None, prefix: "api" }
    }

    /// Sets the API version segment.
    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the related object targeted by relation operations.
    pub fn with_object(mut self, object: &'static str) -> Self {
        self.object = Some(object);
        self
    }

    /// Overrides the leading path segment.
    pub fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    /// Returns the subject name.
    pub fn subject(&self) -> &'static str {
        self.subject
    }

    /// Returns the related object name, if any.
    pub fn object(&self) -> Option<&'static str> {
        self.object
    }

    /// Returns the version segment, if any.
    pub fn version(&self) -> Option<&'static str> {
        self.version
    }

    /// Returns the path segments shared by all operations: prefix, version and subject, with
    /// empty parts omitted.
    fn path_parts(&self) -> Vec<&'static str> {
        [Some(self.prefix), self.version, Some(self.subject)]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Converts an operation into its convention-based URL path.
    ///
    /// Collection-shaped operations resolve to `/{prefix}/{version}/{subject}` and
    /// instance-shaped operations append a `{subject}_id` placeholder segment, plus the object
    /// segment for relation operations.  The result is deterministic and independent of any
    /// request context.
    pub fn path_for_operation(&self, operation: Operation) -> String {
        let id_part = format!("{{{}_id}}", self.subject);
        let mut parts: Vec<&str> = self.path_parts();
        match operation.info().pattern {
            PathPattern::Collection => (),
            PathPattern::Instance => {
                parts.push(&id_part);
                if operation.is_relation() {
                    if let Some(object) = self.object {
                        parts.push(object);
                    }
                }
            }
        }
        format!("/{}", parts.join("/"))
    }

    /// Produces the dotted operation name recorded with every audit entry:
    /// `subject.operation[.object].version`.  The version falls back to `v1` when unset.  This
    /// string has no routing significance.
    pub fn operation_name_for_logging(&self, operation: Operation) -> String {
        let version = self.version.unwrap_or(DEFAULT_LOGGING_VERSION);
        match self.object.filter(|_| operation.is_relation()) {
            Some(object) => {
                format!("{}.{}.{}.{}", self.subject, operation.info().name, object, version)
            }
            None => format!("{}.{}.{}", self.subject, operation.info().name, version),
        }
    }

    /// Constructs an absolute URL for an operation against this resource.
    ///
    /// Instance-shaped operations require the `id` to substitute for the identifier segment.
    pub fn url_for(&self, base_urls: &BaseUrls, operation: Operation, id: Option<&str>) -> Url {
        let mut path = self.path_for_operation(operation);
        if let Some(id) = id {
            path = path.replace(&format!("{{{}_id}}", self.subject), id);
        }
        base_urls.make_url(path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_search_operation() {
        let ns = Namespace::new("pizza").with_version("v1");
        assert_eq!("/api/v1/pizza", ns.path_for_operation(Operation::Search));
    }

    #[test]
    fn test_path_for_collection_operations_has_no_identifier() {
        let ns = Namespace::new("pizza").with_version("v1");
        for op in [
            Operation::Search,
            Operation::Count,
            Operation::Create,
            Operation::CreateCollection,
            Operation::DeleteBatch,
        ] {
            assert_eq!("/api/v1/pizza", ns.path_for_operation(op), "{:?}", op);
        }
    }

    #[test]
    fn test_path_for_instance_operations_has_identifier() {
        let ns = Namespace::new("pizza").with_version("v1");
        for op in [Operation::Retrieve, Operation::Delete, Operation::Replace, Operation::Update]
        {
            assert_eq!("/api/v1/pizza/{pizza_id}", ns.path_for_operation(op), "{:?}", op);
        }
    }

    #[test]
    fn test_path_for_relation_operations_appends_object() {
        let ns = Namespace::new("pizza").with_version("v1").with_object("waiter");
        for op in [Operation::CreateFor, Operation::SearchFor] {
            assert_eq!("/api/v1/pizza/{pizza_id}/waiter", ns.path_for_operation(op), "{:?}", op);
        }
    }

    #[test]
    fn test_path_omits_missing_version() {
        let ns = Namespace::new("pizza");
        assert_eq!("/api/pizza", ns.path_for_operation(Operation::Search));
        assert_eq!("/api/pizza/{pizza_id}", ns.path_for_operation(Operation::Retrieve));
    }

    #[test]
    fn test_path_honors_custom_prefix() {
        let ns = Namespace::new("pizza").with_version("v2").with_prefix("internal");
        assert_eq!("/internal/v2/pizza", ns.path_for_operation(Operation::Search));
    }

    #[test]
    fn test_operation_name_for_logging() {
        let ns = Namespace::new("pizza").with_version("v1");
        assert_eq!("pizza.retrieve.v1", ns.operation_name_for_logging(Operation::Retrieve));
        assert_eq!("pizza.search.v1", ns.operation_name_for_logging(Operation::Search));
    }

    #[test]
    fn test_operation_name_for_logging_with_object() {
        let ns = Namespace::new("pizza").with_version("v1").with_object("order");
        assert_eq!(
            "pizza.retrieve_for.order.v1",
            ns.operation_name_for_logging(Operation::RetrieveFor)
        );

        // The object only appears in names of relation operations.
        assert_eq!("pizza.retrieve.v1", ns.operation_name_for_logging(Operation::Retrieve));
    }

    #[test]
    fn test_operation_name_for_logging_defaults_version() {
        let ns = Namespace::new("pizza");
        assert_eq!("pizza.create.v1", ns.operation_name_for_logging(Operation::Create));
    }

    #[test]
    fn test_url_for_collection_operation() {
        let ns = Namespace::new("pizza").with_version("v1");
        let base_urls = BaseUrls::from_str("http://example.com/");
        assert_eq!(
            "http://example.com/api/v1/pizza",
            ns.url_for(&base_urls, Operation::Search, None).as_str()
        );
    }

    #[test]
    fn test_url_for_instance_operation_substitutes_id() {
        let ns = Namespace::new("pizza").with_version("v1");
        let base_urls = BaseUrls::from_str("http://example.com/");
        assert_eq!(
            "http://example.com/api/v1/pizza/1234",
            ns.url_for(&base_urls, Operation::Retrieve, Some("1234")).as_str()
        );
    }
}
