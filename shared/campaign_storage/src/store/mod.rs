//! Backing store seam
//!
//! The storage services only need a small capability set from the backing
//! store: bounded filtered scans with a resume key, point and batch lookups,
//! puts, deletes and a guarded list update. [`DynamoRecordStore`] provides
//! it on top of `DynamoDB`; `MemoryRecordStore` (feature `test-utils`)
//! mirrors the same scan semantics in memory.

mod dynamo;
mod error;
#[cfg(any(test, feature = "test-utils"))]
mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

pub use dynamo::DynamoRecordStore;
pub use error::{StoreError, StoreResult};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryRecordStore;

use crate::predicate::Predicate;

/// A stored record, in `DynamoDB` attribute form
pub type Item = HashMap<String, AttributeValue>;

/// One bounded scan round
#[derive(Debug, Clone)]
pub struct ScanRequest<'a> {
    /// Table to scan
    pub table_name: &'a str,
    /// Predicate applied to each record after it is read
    pub predicate: Option<&'a Predicate>,
    /// Resume position from a previous round or cursor
    pub exclusive_start_key: Option<Item>,
    /// Maximum number of records read (not matched) in this round
    pub limit: i32,
}

/// Result of one scan round
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Records that matched the predicate
    pub items: Vec<Item>,
    /// Position to resume from, absent when the table is exhausted
    pub last_evaluated_key: Option<Item>,
}

/// Result of one batch lookup round
#[derive(Debug, Clone, Default)]
pub struct BatchGetPage {
    /// Records found
    pub items: Vec<Item>,
    /// Keys the store did not get to and that should be requested again
    pub unprocessed_keys: Vec<Item>,
}

/// Guarded replacement of list attributes on one record
#[derive(Debug, Clone)]
pub struct ListUpdate {
    /// `(attribute, values)` pairs written as string lists
    pub assignments: Vec<(String, Vec<String>)>,
    /// `(attribute, value)` pairs read before the update was computed
    ///
    /// Every attribute must still hold its value for the write to apply;
    /// `None` requires the attribute to be absent.
    pub guards: Vec<(String, Option<AttributeValue>)>,
}

/// Minimal capability set the storage services need from a backing store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads up to `request.limit` records and returns those matching the predicate
    async fn scan(&self, request: ScanRequest<'_>) -> StoreResult<ScanPage>;

    /// Point lookup by primary key
    async fn get_item(&self, table_name: &str, key: Item) -> StoreResult<Option<Item>>;

    /// Looks up several keys in one round
    async fn batch_get_items(&self, table_name: &str, keys: Vec<Item>)
        -> StoreResult<BatchGetPage>;

    /// Writes a full record, replacing any existing one
    async fn put_item(&self, table_name: &str, item: Item) -> StoreResult<()>;

    /// Deletes a record by primary key
    async fn delete_item(&self, table_name: &str, key: Item) -> StoreResult<()>;

    /// Applies a guarded list update and returns the updated record
    ///
    /// Fails with [`StoreError::ConditionFailed`] when the record is gone or
    /// any guarded attribute changed.
    async fn set_lists(&self, table_name: &str, key: Item, update: ListUpdate)
        -> StoreResult<Item>;
}
