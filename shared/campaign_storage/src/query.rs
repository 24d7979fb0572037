//! Filtered list query service
//!
//! One generic implementation serves every entity type; the per-entity
//! variation lives entirely in the [`EntitySchema`] passed at construction.
//!
//! The store applies the predicate after reading each bounded scan round, so
//! a sparse predicate over a large table could keep scanning indefinitely.
//! A request therefore reads at most [`MAX_SCAN_ROUNDS`] rounds and returns
//! whatever matched by then, with a cursor to continue.
//!
//! Pages are cut in scan order before sorting. Cursors therefore never skip
//! or repeat records, but a requested sort orders records within a page,
//! not across the whole table.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::entity::EntitySchema;
use crate::filter::ListFilter;
use crate::records::item_to_json;
use crate::sort::sort_items;
use crate::store::{Item, RecordStore, ScanRequest};
use crate::{cursor, CampaignStorageError, CampaignStorageResult};

/// Maximum scan rounds issued for one list request
pub const MAX_SCAN_ROUNDS: usize = 10;

/// One page of list results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// Cursor for the next page, absent when there is none
    pub next_cursor: Option<String>,
    /// Whether another page may follow
    pub has_next_page: bool,
    /// Always absent; exact counts would need an unbounded scan
    pub total_count: Option<u64>,
}

impl Page<Item> {
    /// Converts the page's items to JSON
    ///
    /// # Errors
    ///
    /// Returns `CampaignStorageError::SerializationError` if an item cannot be converted
    pub fn into_json(self) -> CampaignStorageResult<Page<Value>> {
        let items = self
            .items
            .into_iter()
            .map(item_to_json)
            .collect::<CampaignStorageResult<Vec<_>>>()?;

        Ok(Page {
            items,
            next_cursor: self.next_cursor,
            has_next_page: self.has_next_page,
            total_count: self.total_count,
        })
    }
}

/// Filtered, sorted, cursor-paginated listing over one entity table
pub struct ListQueryService {
    store: Arc<dyn RecordStore>,
    schema: Arc<EntitySchema>,
    table_name: String,
}

impl ListQueryService {
    /// Creates a new list service
    ///
    /// # Arguments
    ///
    /// * `store` - Shared backing store
    /// * `schema` - Shape of the entity table
    /// * `table_name` - Table holding the entity
    #[must_use]
    pub const fn new(
        store: Arc<dyn RecordStore>,
        schema: Arc<EntitySchema>,
        table_name: String,
    ) -> Self {
        Self {
            store,
            schema,
            table_name,
        }
    }

    /// Schema this service lists
    #[must_use]
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Lists one page of records matching the filter
    ///
    /// An absent filter means no predicate, the default page size and the
    /// first page.
    ///
    /// # Errors
    ///
    /// Returns `CampaignStorageError::InvalidCursor` if the supplied cursor
    /// cannot be decoded, `CampaignStorageError::InvalidFilter` if the filter
    /// is malformed, and `CampaignStorageError::BackendUnavailable` if the
    /// store request fails
    pub async fn list(&self, filter: Option<&ListFilter>) -> CampaignStorageResult<Page<Item>> {
        let default_filter = ListFilter::default();
        let filter = filter.unwrap_or(&default_filter);

        let limit = filter.limit(&self.schema);
        let predicate = filter.to_predicate(&self.schema)?;
        let mut resume_key = filter
            .cursor()
            .map(|cursor| cursor::decode(cursor, &self.schema))
            .transpose()?;

        // One extra record tells whether more exist beyond this page
        let wanted = limit + 1;
        let round_limit = i32::try_from(wanted).unwrap_or(i32::MAX);
        let mut accumulated: Vec<Item> = Vec::with_capacity(wanted);
        let mut rounds = 0;

        loop {
            rounds += 1;
            let page = self
                .store
                .scan(ScanRequest {
                    table_name: &self.table_name,
                    predicate: predicate.as_ref(),
                    exclusive_start_key: resume_key.take(),
                    limit: round_limit,
                })
                .await
                .map_err(|e| {
                    let context = format!("Error fetching {}", self.schema.label());
                    CampaignStorageError::backend(context, e)
                })?;

            debug!(
                entity = self.schema.label(),
                round = rounds,
                matched = page.items.len(),
                "Scan round complete"
            );

            accumulated.extend(page.items);
            resume_key = page.last_evaluated_key;

            if accumulated.len() >= wanted || resume_key.is_none() {
                break;
            }
            if rounds >= MAX_SCAN_ROUNDS {
                warn!(
                    entity = self.schema.label(),
                    matched = accumulated.len(),
                    "Scan round cap reached; returning partial page"
                );
                break;
            }
        }

        let overflow = accumulated.len() > limit;
        accumulated.truncate(limit);

        // Resume right after the last record kept, so nothing matched but
        // dropped by the truncation is skipped
        let next_key = if overflow {
            accumulated
                .last()
                .and_then(|item| self.schema.key_of(item))
                .or(resume_key)
        } else {
            resume_key
        };

        sort_items(&mut accumulated, &filter.sort);

        let next_cursor = next_key.as_ref().map(cursor::encode).transpose()?;

        Ok(Page {
            items: accumulated,
            has_next_page: next_cursor.is_some(),
            next_cursor,
            total_count: None,
        })
    }
}
