//! In-memory record store for tests and local development
//!
//! Tables are ordered by identity so scans are deterministic. Scan rounds
//! follow `DynamoDB` semantics: `limit` bounds the records read, the
//! predicate is applied afterwards, and a resume key is returned whenever
//! unread records remain.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

use super::{BatchGetPage, Item, ListUpdate, RecordStore, ScanPage, ScanRequest};
use super::{StoreError, StoreResult};

struct MemoryTable {
    id_attribute: String,
    rows: BTreeMap<String, Item>,
}

/// Record store holding tables in memory
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<String, MemoryTable>>,
    scan_rounds: AtomicUsize,
}

impl MemoryRecordStore {
    /// Creates a store with no tables
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty table keyed by `id_attribute`
    #[must_use]
    pub fn with_table(self, table_name: &str, id_attribute: &str) -> Self {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                table_name.to_string(),
                MemoryTable {
                    id_attribute: id_attribute.to_string(),
                    rows: BTreeMap::new(),
                },
            );
        self
    }

    /// Number of scan rounds served so far
    #[must_use]
    pub fn scan_rounds(&self) -> usize {
        self.scan_rounds.load(Ordering::SeqCst)
    }

    /// Number of records held in a table
    #[must_use]
    pub fn len(&self, table_name: &str) -> usize {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table_name)
            .map_or(0, |table| table.rows.len())
    }

    fn with_table_mut<T>(
        &self,
        table_name: &str,
        f: impl FnOnce(&mut MemoryTable) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables.get_mut(table_name).ok_or_else(|| {
            StoreError::Request(format!("Requested resource not found: {table_name}"))
        })?;
        f(table)
    }
}

impl MemoryTable {
    fn row_id(&self, item: &Item) -> StoreResult<String> {
        match item.get(&self.id_attribute) {
            Some(AttributeValue::S(id) | AttributeValue::N(id)) => Ok(id.clone()),
            _ => Err(StoreError::Request(format!(
                "Missing key attribute `{}`",
                self.id_attribute
            ))),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn scan(&self, request: ScanRequest<'_>) -> StoreResult<ScanPage> {
        self.scan_rounds.fetch_add(1, Ordering::SeqCst);
        let limit = usize::try_from(request.limit.max(1)).unwrap_or(1);

        self.with_table_mut(request.table_name, |table| {
            let lower = match &request.exclusive_start_key {
                Some(key) => Bound::Excluded(table.row_id(key)?),
                None => Bound::Unbounded,
            };

            let mut read = table.rows.range((lower, Bound::Unbounded));
            let evaluated: Vec<&Item> = read
                .by_ref()
                .take(limit)
                .map(|(_, item)| item)
                .collect();
            let exhausted = read.next().is_none();

            let last_evaluated_key = match (exhausted, evaluated.last()) {
                (false, Some(last)) => last
                    .get(&table.id_attribute)
                    .cloned()
                    .map(|id| Item::from([(table.id_attribute.clone(), id)])),
                _ => None,
            };

            let items = evaluated
                .into_iter()
                .filter(|item| request.predicate.map_or(true, |p| p.matches(item)))
                .cloned()
                .collect();

            Ok(ScanPage {
                items,
                last_evaluated_key,
            })
        })
    }

    async fn get_item(&self, table_name: &str, key: Item) -> StoreResult<Option<Item>> {
        self.with_table_mut(table_name, |table| {
            let id = table.row_id(&key)?;
            Ok(table.rows.get(&id).cloned())
        })
    }

    async fn batch_get_items(
        &self,
        table_name: &str,
        keys: Vec<Item>,
    ) -> StoreResult<BatchGetPage> {
        self.with_table_mut(table_name, |table| {
            let mut items = Vec::with_capacity(keys.len());
            for key in &keys {
                let id = table.row_id(key)?;
                if let Some(item) = table.rows.get(&id) {
                    items.push(item.clone());
                }
            }
            Ok(BatchGetPage {
                items,
                unprocessed_keys: Vec::new(),
            })
        })
    }

    async fn put_item(&self, table_name: &str, item: Item) -> StoreResult<()> {
        self.with_table_mut(table_name, |table| {
            let id = table.row_id(&item)?;
            table.rows.insert(id, item);
            Ok(())
        })
    }

    async fn delete_item(&self, table_name: &str, key: Item) -> StoreResult<()> {
        self.with_table_mut(table_name, |table| {
            let id = table.row_id(&key)?;
            table.rows.remove(&id);
            Ok(())
        })
    }

    async fn set_lists(
        &self,
        table_name: &str,
        key: Item,
        update: ListUpdate,
    ) -> StoreResult<Item> {
        self.with_table_mut(table_name, |table| {
            let id = table.row_id(&key)?;
            let row = table.rows.get_mut(&id).ok_or(StoreError::ConditionFailed)?;

            let changed = update
                .guards
                .iter()
                .any(|(attribute, expected)| row.get(attribute) != expected.as_ref());
            if changed {
                return Err(StoreError::ConditionFailed);
            }

            for (attribute, values) in update.assignments {
                let list = values.into_iter().map(AttributeValue::S).collect();
                row.insert(attribute, AttributeValue::L(list));
            }
            Ok(row.clone())
        })
    }
}
