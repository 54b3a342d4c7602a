//  Copyright 2024 MrCroxx
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use anyhow::Result;

/// Basic logging store.
pub mod basic;
/// Store registry.
pub mod factory;
/// Shared in-memory store.
pub mod memory;
/// Latency-timing decorator.
pub mod wrapper;

/// One named field of a record. Values are raw bytes and are not required to
/// be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name, `"<prefix><i>"`.
    pub name: String,
    /// Field value.
    pub value: Vec<u8>,
}

/// Why a store operation did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The requested record does not exist.
    #[error("record not found")]
    NotFound,
    /// The backend does not support this operation.
    #[error("operation not implemented")]
    NotImplemented,
    /// Any other backend failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result of a store operation.
pub type DbResult<T> = std::result::Result<T, DbError>;

/// A layer for accessing the record store to be benchmarked. Each worker
/// thread is given its own handle; any argument-based initialization should
/// be done by `init()`, which runs on the owning worker before first use.
///
/// The driver does not act on the outcome of individual operations beyond
/// counting them. The semantics of insert, update and delete vary from store
/// to store; operations may or may not be durable once they return, and some
/// backends may report success regardless of whether a record with a matching
/// key existed before the call. Implement whichever semantics match the
/// system under test and explain them when presenting results.
pub trait Db: Send {
    /// Initialize any state for this handle.
    /// Called once per handle; there is one handle per worker thread.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Clean up any state for this handle.
    /// Called once per handle at the end of its worker's run.
    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read a record, returning its fields.
    ///
    /// * `table` - The name of the table.
    /// * `key` - The record key of the record to read.
    /// * `fields` - The fields to read, or `None` for all of them.
    fn read(&mut self, table: &str, key: &str, fields: Option<&[String]>) -> DbResult<Vec<Field>>;

    /// Scan a range of records starting at `key`, returning up to `len`
    /// records in key order.
    ///
    /// * `table` - The name of the table.
    /// * `key` - The record key of the first record to read.
    /// * `len` - The number of records to read.
    /// * `fields` - The fields to read, or `None` for all of them.
    fn scan(
        &mut self,
        table: &str,
        key: &str,
        len: usize,
        fields: Option<&[String]>,
    ) -> DbResult<Vec<Vec<Field>>>;

    /// Update a record. The given field/value pairs overwrite existing
    /// values with the same field names; other fields are left alone.
    fn update(&mut self, table: &str, key: &str, values: Vec<Field>) -> DbResult<()>;

    /// Insert a record with the given field/value pairs.
    fn insert(&mut self, table: &str, key: &str, values: Vec<Field>) -> DbResult<()>;

    /// Delete a record.
    fn delete(&mut self, table: &str, key: &str) -> DbResult<()>;
}
