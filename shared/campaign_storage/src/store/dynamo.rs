//! `DynamoDB` implementation of the record store

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::SdkError,
    types::{AttributeValue, KeysAndAttributes, ReturnValue},
    Client as DynamoDbClient,
};
use tracing::debug;

use super::{BatchGetPage, Item, ListUpdate, RecordStore, ScanPage, ScanRequest};
use super::{StoreError, StoreResult};

/// Record store backed by `DynamoDB` tables
pub struct DynamoRecordStore {
    dynamodb_client: Arc<DynamoDbClient>,
}

impl DynamoRecordStore {
    /// Creates a new store
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client, shared process-wide
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>) -> Self {
        Self { dynamodb_client }
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn scan(&self, request: ScanRequest<'_>) -> StoreResult<ScanPage> {
        let mut scan = self
            .dynamodb_client
            .scan()
            .table_name(request.table_name)
            .limit(request.limit)
            .set_exclusive_start_key(request.exclusive_start_key);

        if let Some(predicate) = request.predicate {
            let filter = predicate.to_expression();
            debug!(
                table = request.table_name,
                expression = %filter.expression,
                "Scanning with filter expression"
            );
            scan = scan
                .filter_expression(filter.expression)
                .set_expression_attribute_names(Some(filter.names))
                .set_expression_attribute_values(Some(filter.values));
        }

        let response = scan.send().await?;

        Ok(ScanPage {
            items: response.items.unwrap_or_default(),
            last_evaluated_key: response.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    async fn get_item(&self, table_name: &str, key: Item) -> StoreResult<Option<Item>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(table_name)
            .set_key(Some(key))
            .send()
            .await?;

        Ok(response.item)
    }

    async fn batch_get_items(
        &self,
        table_name: &str,
        keys: Vec<Item>,
    ) -> StoreResult<BatchGetPage> {
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .build()
            .map_err(|e| StoreError::Request(format!("Failed to build batch keys: {e:?}")))?;

        let response = self
            .dynamodb_client
            .batch_get_item()
            .request_items(table_name, keys_and_attributes)
            .send()
            .await?;

        let items = response
            .responses
            .and_then(|mut responses| responses.remove(table_name))
            .unwrap_or_default();
        let unprocessed_keys = response
            .unprocessed_keys
            .and_then(|mut unprocessed| unprocessed.remove(table_name))
            .map(|keys_and_attributes| keys_and_attributes.keys)
            .unwrap_or_default();

        Ok(BatchGetPage {
            items,
            unprocessed_keys,
        })
    }

    async fn put_item(&self, table_name: &str, item: Item) -> StoreResult<()> {
        self.dynamodb_client
            .put_item()
            .table_name(table_name)
            .set_item(Some(item))
            .send()
            .await?;

        Ok(())
    }

    async fn delete_item(&self, table_name: &str, key: Item) -> StoreResult<()> {
        self.dynamodb_client
            .delete_item()
            .table_name(table_name)
            .set_key(Some(key))
            .send()
            .await?;

        Ok(())
    }

    async fn set_lists(
        &self,
        table_name: &str,
        key: Item,
        update: ListUpdate,
    ) -> StoreResult<Item> {
        let mut request = self
            .dynamodb_client
            .update_item()
            .table_name(table_name)
            .set_key(Some(key))
            .return_values(ReturnValue::AllNew);

        let mut conditions = Vec::with_capacity(update.guards.len());
        for (index, (attribute, expected)) in update.guards.into_iter().enumerate() {
            request = request.expression_attribute_names(format!("#g{index}"), attribute);
            match expected {
                Some(value) => {
                    request = request.expression_attribute_values(format!(":g{index}"), value);
                    conditions.push(format!("#g{index} = :g{index}"));
                }
                None => conditions.push(format!("attribute_not_exists(#g{index})")),
            }
        }
        request = request.condition_expression(conditions.join(" AND "));

        let mut assignments = Vec::with_capacity(update.assignments.len());
        for (index, (attribute, values)) in update.assignments.into_iter().enumerate() {
            let list = values.into_iter().map(AttributeValue::S).collect();
            request = request
                .expression_attribute_names(format!("#l{index}"), attribute)
                .expression_attribute_values(format!(":l{index}"), AttributeValue::L(list));
            assignments.push(format!("#l{index} = :l{index}"));
        }

        let response = request
            .update_expression(format!("SET {}", assignments.join(", ")))
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(ref svc)
                    if svc.err().is_conditional_check_failed_exception() =>
                {
                    StoreError::ConditionFailed
                }
                other => other.into(),
            })?;

        Ok(response.attributes.unwrap_or_default())
    }
}
