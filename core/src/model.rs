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

//! Base data types for the domain models that the generic `Store` can persist.
//!
//! Services describe each persistent entity by implementing the `Model` trait.  The trait
//! surfaces everything the store needs to know statically: table and column names, how to read
//! and write the entity's field values, and how to merge a partial update (a "patch") into an
//! existing row.  Nothing here is introspected at runtime; the whole description is fixed at
//! compile time.

use std::collections::BTreeMap;
use uuid::Uuid;

/// Indicates a problem processing model data, such as an out-of-range value.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;

/// Data type of a single model column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// A boolean column.
    Bool,

    /// A double-precision floating point column.
    Float,

    /// A 64-bit integer column.
    Int,

    /// A text column.
    Text,

    /// A UUID column.  Stored natively on PostgreSQL and as hyphenated text on SQLite.
    Uuid,
}

/// A single column value, decoupled from any database driver.
///
/// `Null` stands for SQL NULL in both directions: binding a `Null` writes NULL and reading a
/// NULL column yields `Null` regardless of the column's declared kind.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// A boolean value.
    Bool(bool),

    /// A double-precision floating point value.
    Float(f64),

    /// A 64-bit integer value.
    Int(i64),

    /// The SQL NULL value.
    Null,

    /// A text value.
    Text(String),

    /// A UUID value.
    Uuid(Uuid),
}

/// Static description of one column of a model's table.
#[derive(Clone, Copy, Debug)]
pub struct ColumnSpec {
    /// Name of the column in the schema.
    pub name: &'static str,

    /// Data type of the column.
    pub kind: FieldKind,
}

/// A row fetched from the database, decoded into `FieldValue`s and keyed by column name.
///
/// The typed accessors convert decoding problems into `ModelError`s so that model hydration
/// code can use `?` throughout.
#[derive(Debug, Default)]
pub struct RowValues(BTreeMap<&'static str, FieldValue>);

impl RowValues {
    /// Creates an empty set of row values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the value for `column`.
    pub fn insert(&mut self, column: &'static str, value: FieldValue) {
        self.0.insert(column, value);
    }

    /// Returns the raw value of `column`, failing if the column was not fetched.
    fn raw(&self, column: &str) -> ModelResult<&FieldValue> {
        self.0.get(column).ok_or_else(|| ModelError(format!("Column {} not fetched", column)))
    }

    /// Returns the non-NULL UUID value of `column`.
    pub fn uuid(&self, column: &str) -> ModelResult<Uuid> {
        match self.raw(column)? {
            FieldValue::Uuid(u) => Ok(*u),
            other => Err(ModelError(format!("Column {} is not a UUID: {:?}", column, other))),
        }
    }

    /// Returns the non-NULL text value of `column`.
    pub fn text(&self, column: &str) -> ModelResult<String> {
        match self.raw(column)? {
            FieldValue::Text(s) => Ok(s.clone()),
            other => Err(ModelError(format!("Column {} is not text: {:?}", column, other))),
        }
    }

    /// Returns the text value of `column`, or `None` if the column is NULL.
    pub fn opt_text(&self, column: &str) -> ModelResult<Option<String>> {
        match self.raw(column)? {
            FieldValue::Null => Ok(None),
            FieldValue::Text(s) => Ok(Some(s.clone())),
            other => Err(ModelError(format!("Column {} is not text: {:?}", column, other))),
        }
    }

    /// Returns the non-NULL integer value of `column`.
    pub fn int(&self, column: &str) -> ModelResult<i64> {
        match self.raw(column)? {
            FieldValue::Int(i) => Ok(*i),
            other => Err(ModelError(format!("Column {} is not an integer: {:?}", column, other))),
        }
    }

    /// Returns the integer value of `column`, or `None` if the column is NULL.
    pub fn opt_int(&self, column: &str) -> ModelResult<Option<i64>> {
        match self.raw(column)? {
            FieldValue::Null => Ok(None),
            FieldValue::Int(i) => Ok(Some(*i)),
            other => Err(ModelError(format!("Column {} is not an integer: {:?}", column, other))),
        }
    }

    /// Returns the non-NULL boolean value of `column`.
    pub fn bool(&self, column: &str) -> ModelResult<bool> {
        match self.raw(column)? {
            FieldValue::Bool(b) => Ok(*b),
            other => Err(ModelError(format!("Column {} is not a boolean: {:?}", column, other))),
        }
    }

    /// Returns the non-NULL float value of `column`.
    pub fn float(&self, column: &str) -> ModelResult<f64> {
        match self.raw(column)? {
            FieldValue::Float(f) => Ok(*f),
            other => Err(ModelError(format!("Column {} is not a float: {:?}", column, other))),
        }
    }
}

/// Description of a persistent entity managed by the generic `Store`.
///
/// The first entry of `columns()` must be the primary key, which is always a UUID.  `values()`
/// must return one value per column, in the same order as `columns()`.
pub trait Model: Sized + Send + Sync + 'static {
    /// Partial view of the model used by update and replace operations.  Fields that are unset
    /// in the patch retain their previous values when merged.
    type Patch: Send + Sync + 'static;

    /// Human-facing name of the entity, used in error messages ("Person not found").
    fn model_name() -> &'static str;

    /// Name of the table backing the entity.
    fn table() -> &'static str;

    /// Ordered description of the table's columns; the primary key comes first.
    fn columns() -> &'static [ColumnSpec];

    /// Returns the primary key, if one has been assigned yet.
    fn id(&self) -> Option<Uuid>;

    /// Assigns the primary key.  Only called when `id()` is `None`.
    fn assign_id(&mut self, id: Uuid);

    /// Returns the current field values, parallel to `columns()`.
    fn values(&self) -> Vec<FieldValue>;

    /// Hydrates an instance from a fetched row.
    fn from_row(row: &RowValues) -> ModelResult<Self>;

    /// Merges a patch into this instance.  Unset patch fields keep the current values.
    fn merge(&mut self, patch: &Self::Patch);

    /// Promotes a patch to a full instance with the given primary key.  Fails when the patch
    /// lacks fields that the entity requires.
    fn from_patch(id: Uuid, patch: &Self::Patch) -> ModelResult<Self>;
}
