//! Record lookups and writes for one entity table

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::Value;
use tracing::{info, warn};

use crate::entity::EntitySchema;
use crate::store::{Item, ListUpdate, RecordStore, StoreError};
use crate::{CampaignStorageError, CampaignStorageResult};

/// `DynamoDB` `BatchGetItem` accepts at most 100 keys per request
const BATCH_GET_CHUNK_SIZE: usize = 100;

/// Rounds spent re-requesting unprocessed keys before giving up
const MAX_UNPROCESSED_RETRIES: u32 = 3;

/// Converts a stored item to JSON
///
/// # Errors
///
/// Returns `CampaignStorageError::SerializationError` if the item cannot be converted
pub fn item_to_json(item: Item) -> CampaignStorageResult<Value> {
    Ok(serde_dynamo::from_item(item)?)
}

/// Converts a JSON object to a storable item
///
/// # Errors
///
/// Returns `CampaignStorageError::InvalidInput` if the value is not an object
pub fn item_from_json(value: &Value) -> CampaignStorageResult<Item> {
    if !value.is_object() {
        return Err(CampaignStorageError::InvalidInput(
            "record must be a JSON object".to_string(),
        ));
    }
    serde_dynamo::to_item(value).map_err(|e| CampaignStorageError::InvalidInput(e.to_string()))
}

/// Storage client for record-level operations on one entity table
pub struct RecordStorage {
    store: Arc<dyn RecordStore>,
    schema: Arc<EntitySchema>,
    table_name: String,
}

impl RecordStorage {
    /// Creates a new storage instance
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

    fn backend_error(
        &self,
        operation: &str,
    ) -> impl FnOnce(StoreError) -> CampaignStorageError + '_ {
        let context = format!("Error {operation} {}", self.schema.label());
        move |source| CampaignStorageError::backend(context, source)
    }

    /// Get a single record by id
    ///
    /// # Errors
    ///
    /// Returns `CampaignStorageError::BackendUnavailable` if the store lookup fails
    pub async fn get_one(&self, id: &str) -> CampaignStorageResult<Option<Item>> {
        self.store
            .get_item(&self.table_name, self.schema.key_for(id))
            .await
            .map_err(self.backend_error("fetching"))
    }

    /// Get several records by id
    ///
    /// Duplicate ids are collapsed, ids with no record are skipped, and the
    /// result follows the order of first appearance in `ids`.
    ///
    /// # Errors
    ///
    /// Returns `CampaignStorageError::BackendUnavailable` if a store request
    /// fails or keys stay unprocessed after retries
    pub async fn batch_get(&self, ids: &[String]) -> CampaignStorageResult<Vec<Item>> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();

        let mut found: HashMap<String, Item> = HashMap::with_capacity(unique.len());

        for chunk in unique.chunks(BATCH_GET_CHUNK_SIZE) {
            let mut pending: Vec<Item> = chunk.iter().map(|id| self.schema.key_for(id)).collect();
            let mut retries = 0;

            while !pending.is_empty() {
                if retries > MAX_UNPROCESSED_RETRIES {
                    return Err(CampaignStorageError::backend(
                        format!("Error fetching {}", self.schema.label()),
                        StoreError::UnprocessedKeys(pending.len()),
                    ));
                }
                if retries > 0 {
                    warn!(
                        entity = self.schema.label(),
                        unprocessed = pending.len(),
                        retry = retries,
                        "Retrying unprocessed batch keys"
                    );
                    tokio::time::sleep(Duration::from_millis(50 * u64::from(retries))).await;
                }

                let page = self
                    .store
                    .batch_get_items(&self.table_name, pending)
                    .await
                    .map_err(self.backend_error("fetching"))?;

                for item in page.items {
                    if let Some(id) = self.schema.id_of(&item) {
                        found.insert(id.to_string(), item);
                    }
                }
                pending = page.unprocessed_keys;
                retries += 1;
            }
        }

        Ok(unique.into_iter().filter_map(|id| found.remove(id)).collect())
    }

    /// Writes a record, replacing any existing record with the same id
    ///
    /// A UUID v4 id is generated when the record has none, and the lowercase
    /// shadow of every searchable field is refreshed so case-insensitive
    /// search finds the record.
    ///
    /// # Errors
    ///
    /// Returns `CampaignStorageError::InvalidInput` if the id is not a
    /// non-empty string, or `CampaignStorageError::BackendUnavailable` if the
    /// store write fails
    pub async fn put(&self, mut record: Item) -> CampaignStorageResult<Item> {
        let id_attribute = self.schema.id_attribute();
        match record.get(id_attribute) {
            None | Some(AttributeValue::Null(_)) => {
                record.insert(
                    id_attribute.to_string(),
                    AttributeValue::S(uuid::Uuid::new_v4().to_string()),
                );
            }
            Some(AttributeValue::S(id)) if !id.is_empty() => {}
            Some(_) => {
                return Err(CampaignStorageError::InvalidInput(format!(
                    "`{id_attribute}` must be a non-empty string"
                )));
            }
        }

        for field in self.schema.search_fields() {
            let Some(shadow) = &field.shadow else {
                continue;
            };
            match record.get(&field.attribute) {
                Some(AttributeValue::S(text)) => {
                    let folded = AttributeValue::S(text.to_lowercase());
                    record.insert(shadow.clone(), folded);
                }
                _ => {
                    record.remove(shadow);
                }
            }
        }

        self.store
            .put_item(&self.table_name, record.clone())
            .await
            .map_err(self.backend_error("saving"))?;

        Ok(record)
    }

    /// Delete a record by id
    ///
    /// # Errors
    ///
    /// Returns `CampaignStorageError::BackendUnavailable` if the store delete fails
    pub async fn delete(&self, id: &str) -> CampaignStorageResult<()> {
        self.store
            .delete_item(&self.table_name, self.schema.key_for(id))
            .await
            .map_err(self.backend_error("deleting"))
    }

    /// Moves `value` from one string-list attribute of a record to another
    ///
    /// The value is removed from `from_attribute` and appended to
    /// `to_attribute` unless already present there. Both lists are written in
    /// one update guarded on both attributes being unchanged since the read.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `InvalidInput` - the attributes are equal or hold something other than string lists
    /// - `NotFound` - the record does not exist or `value` is not in `from_attribute`
    /// - `Conflict` - the record changed between read and write
    /// - `BackendUnavailable` - a store request fails
    pub async fn move_id(
        &self,
        record_id: &str,
        value: &str,
        from_attribute: &str,
        to_attribute: &str,
    ) -> CampaignStorageResult<Item> {
        if from_attribute == to_attribute {
            return Err(CampaignStorageError::InvalidInput(
                "source and target attributes must differ".to_string(),
            ));
        }

        let record = self.get_one(record_id).await?.ok_or_else(|| {
            CampaignStorageError::NotFound(format!("{} record {record_id}", self.schema.label()))
        })?;

        let from = string_list(&record, from_attribute)?;
        let mut to = string_list(&record, to_attribute)?;

        if !from.iter().any(|entry| entry == value) {
            return Err(CampaignStorageError::NotFound(format!(
                "{value} is not in {from_attribute}"
            )));
        }

        let remaining: Vec<String> = from.into_iter().filter(|entry| entry != value).collect();
        if !to.iter().any(|entry| entry == value) {
            to.push(value.to_string());
        }

        let guards = [from_attribute, to_attribute]
            .into_iter()
            .map(|attribute| (attribute.to_string(), record.get(attribute).cloned()))
            .collect();

        let updated = self
            .store
            .set_lists(
                &self.table_name,
                self.schema.key_for(record_id),
                ListUpdate {
                    assignments: vec![
                        (from_attribute.to_string(), remaining),
                        (to_attribute.to_string(), to),
                    ],
                    guards,
                },
            )
            .await
            .map_err(|err| match err {
                StoreError::ConditionFailed => CampaignStorageError::Conflict(format!(
                    "{} record {record_id} changed during update",
                    self.schema.label()
                )),
                other => self.backend_error("updating")(other),
            })?;

        info!(
            entity = self.schema.label(),
            record_id, value, from_attribute, to_attribute, "Moved id between lists"
        );

        Ok(updated)
    }
}

/// Reads a string-list attribute; absent or null reads as empty
fn string_list(record: &Item, attribute: &str) -> CampaignStorageResult<Vec<String>> {
    let not_a_list = || {
        CampaignStorageError::InvalidInput(format!("`{attribute}` is not a list of strings"))
    };

    match record.get(attribute) {
        None | Some(AttributeValue::Null(_)) => Ok(Vec::new()),
        Some(AttributeValue::Ss(values)) => Ok(values.clone()),
        Some(AttributeValue::L(values)) => values
            .iter()
            .map(|value| match value {
                AttributeValue::S(text) => Ok(text.clone()),
                _ => Err(not_a_list()),
            })
            .collect(),
        Some(_) => Err(not_a_list()),
    }
}
