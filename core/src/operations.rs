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

//! The enumerated set of CRUD operations and their routing conventions.
//!
//! Every operation maps a logical verb to an HTTP method, a URL shape and a default status
//! code.  The set is fixed: services pick the operations they support and the conventions
//! derive everything else.

use http::{Method, StatusCode};

/// URL shape of an operation.
///
/// Collection-shaped operations address the resource as a whole; instance-shaped operations
/// address one entity and carry an identifier segment (plus a related-object segment for the
/// `*For` relation variants).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PathPattern {
    /// The operation addresses the whole collection: `/{prefix}/{version}/{subject}`.
    Collection,

    /// The operation addresses one instance: `/{prefix}/{version}/{subject}/{subject_id}`,
    /// with `/{object}` appended when a related object is present.
    Instance,
}

/// Routing conventions of a single operation.
#[derive(Clone, Debug)]
pub struct OperationInfo {
    /// Snake-case name of the operation, used for operation ids and logging names.
    pub name: &'static str,

    /// HTTP method the operation is served under.
    pub method: Method,

    /// URL shape of the operation.
    pub pattern: PathPattern,

    /// Status code returned when the handler completes without choosing one.
    pub default_code: StatusCode,
}

/// An enumerated CRUD verb.
///
/// The `*For` variants target a related object within the subject's namespace, e.g. the orders
/// of one customer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    // Collection operations.
    /// List entities matching filter criteria.
    Search,
    /// Count entities matching filter criteria.
    Count,
    /// Create a new entity.
    Create,

    // Instance operations.
    /// Fetch one entity by id.
    Retrieve,
    /// Delete one entity by id.
    Delete,
    /// Create or fully rewrite one entity by id.
    Replace,
    /// Partially update one entity by id.
    Update,

    // Batch operations.
    /// Delete many entities in one request.
    DeleteBatch,
    /// Update many entities in one request.
    UpdateBatch,
    /// Create many entities in one request.
    CreateCollection,
    /// Run a search stored on the server side.
    SavedSearch,

    // Relation operations.
    /// Create a related object under one entity.
    CreateFor,
    /// Delete a related object under one entity.
    DeleteFor,
    /// Create or fully rewrite a related object under one entity.
    ReplaceFor,
    /// Fetch a related object under one entity.
    RetrieveFor,
    /// List related objects under one entity.
    SearchFor,
    /// Partially update a related object under one entity.
    UpdateFor,
}

impl Operation {
    /// All defined operations, for iteration in wiring and tests.
    pub const ALL: &'static [Operation] = &[
        Operation::Search,
        Operation::Count,
        Operation::Create,
        Operation::Retrieve,
        Operation::Delete,
        Operation::Replace,
        Operation::Update,
        Operation::DeleteBatch,
        Operation::UpdateBatch,
        Operation::CreateCollection,
        Operation::SavedSearch,
        Operation::CreateFor,
        Operation::DeleteFor,
        Operation::ReplaceFor,
        Operation::RetrieveFor,
        Operation::SearchFor,
        Operation::UpdateFor,
    ];

    /// Returns the routing conventions for this operation.
    pub fn info(&self) -> OperationInfo {
        /// Abbreviation to keep the table below readable.
        fn info(
            name: &'static str,
            method: Method,
            pattern: PathPattern,
            default_code: StatusCode,
        ) -> OperationInfo {
            OperationInfo { name, method, pattern, default_code }
        }

        use PathPattern::{Collection, Instance};
        match self {
            Operation::Search => info("search", Method::GET, Collection, StatusCode::OK),
            Operation::Count => info("count", Method::HEAD, Collection, StatusCode::OK),
            Operation::Create => info("create", Method::POST, Collection, StatusCode::CREATED),

            Operation::Retrieve => info("retrieve", Method::GET, Instance, StatusCode::OK),
            Operation::Delete => {
                info("delete", Method::DELETE, Instance, StatusCode::NO_CONTENT)
            }
            Operation::Replace => info("replace", Method::PUT, Instance, StatusCode::OK),
            Operation::Update => info("update", Method::PATCH, Instance, StatusCode::OK),

            Operation::DeleteBatch => {
                info("delete_batch", Method::DELETE, Collection, StatusCode::NO_CONTENT)
            }
            Operation::UpdateBatch => {
                info("update_batch", Method::PATCH, Collection, StatusCode::OK)
            }
            Operation::CreateCollection => {
                info("create_collection", Method::POST, Collection, StatusCode::OK)
            }
            Operation::SavedSearch => {
                info("saved_search", Method::POST, Collection, StatusCode::OK)
            }

            Operation::CreateFor => {
                info("create_for", Method::POST, Instance, StatusCode::CREATED)
            }
            Operation::DeleteFor => {
                info("delete_for", Method::DELETE, Instance, StatusCode::NO_CONTENT)
            }
            Operation::ReplaceFor => info("replace_for", Method::PUT, Instance, StatusCode::OK),
            Operation::RetrieveFor => info("retrieve_for", Method::GET, Instance, StatusCode::OK),
            Operation::SearchFor => info("search_for", Method::GET, Instance, StatusCode::OK),
            Operation::UpdateFor => info("update_for", Method::PATCH, Instance, StatusCode::OK),
        }
    }

    /// Returns true when this operation targets a related object.
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            Operation::CreateFor
                | Operation::DeleteFor
                | Operation::ReplaceFor
                | Operation::RetrieveFor
                | Operation::SearchFor
                | Operation::UpdateFor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_operations_have_no_identifier() {
        for op in
            [Operation::Search, Operation::Count, Operation::Create, Operation::DeleteBatch]
        {
            assert_eq!(PathPattern::Collection, op.info().pattern, "{:?}", op);
        }
    }

    #[test]
    fn test_instance_operations_have_identifier() {
        for op in [
            Operation::Retrieve,
            Operation::Delete,
            Operation::Replace,
            Operation::Update,
            Operation::RetrieveFor,
        ] {
            assert_eq!(PathPattern::Instance, op.info().pattern, "{:?}", op);
        }
    }

    #[test]
    fn test_default_codes() {
        assert_eq!(StatusCode::CREATED, Operation::Create.info().default_code);
        assert_eq!(StatusCode::NO_CONTENT, Operation::Delete.info().default_code);
        assert_eq!(StatusCode::NO_CONTENT, Operation::DeleteFor.info().default_code);
        assert_eq!(StatusCode::OK, Operation::Search.info().default_code);
        assert_eq!(StatusCode::OK, Operation::Update.info().default_code);
    }

    #[test]
    fn test_relation_variants() {
        for op in Operation::ALL {
            assert_eq!(op.info().name.ends_with("_for"), op.is_relation(), "{:?}", op);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = Operation::ALL.iter().map(|op| op.info().name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(Operation::ALL.len(), names.len());
    }
}
