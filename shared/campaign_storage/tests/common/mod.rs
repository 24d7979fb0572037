#![allow(dead_code)]

use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;
use campaign_storage::entity::EntityKind;
use campaign_storage::query::ListQueryService;
use campaign_storage::records::RecordStorage;
use campaign_storage::store::MemoryRecordStore;
use campaign_storage::Item;

pub const CHARACTERS_TABLE: &str = "test-characters";
pub const CONDITIONS_TABLE: &str = "test-conditions";

/// Test context wiring both services over one in-memory table
pub struct TestContext {
    pub store: Arc<MemoryRecordStore>,
    pub query: ListQueryService,
    pub records: RecordStorage,
}

/// Creates an empty in-memory table for an entity type
pub fn setup_test(kind: EntityKind, table_name: &str) -> TestContext {
    let schema = Arc::new(kind.schema());
    let store = Arc::new(
        MemoryRecordStore::new().with_table(table_name, schema.id_attribute()),
    );

    TestContext {
        query: ListQueryService::new(store.clone(), schema.clone(), table_name.to_string()),
        records: RecordStorage::new(store.clone(), schema, table_name.to_string()),
        store,
    }
}

pub fn string(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

pub fn number(value: i64) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

pub fn string_list(values: &[&str]) -> AttributeValue {
    AttributeValue::L(values.iter().map(|value| string(value)).collect())
}

/// Builds a character record; `put` fills in the shadow fields
pub fn character(id: &str, name: &str, will: Option<i64>) -> Item {
    let mut item = Item::from([
        ("characterId".to_string(), string(id)),
        ("name".to_string(), string(name)),
    ]);
    if let Some(will) = will {
        item.insert("will".to_string(), number(will));
    }
    item
}

pub fn ids(items: &[Item], id_attribute: &str) -> Vec<String> {
    items
        .iter()
        .map(|item| match item.get(id_attribute) {
            Some(AttributeValue::S(id)) => id.clone(),
            other => panic!("unexpected id attribute: {other:?}"),
        })
        .collect()
}

pub fn names(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .map(|item| match item.get("name") {
            Some(AttributeValue::S(name)) => name.clone(),
            other => panic!("unexpected name attribute: {other:?}"),
        })
        .collect()
}
