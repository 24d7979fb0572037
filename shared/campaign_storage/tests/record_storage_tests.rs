mod common;

use std::sync::Arc;

use async_trait::async_trait;
use campaign_storage::entity::EntityKind;
use campaign_storage::records::RecordStorage;
use campaign_storage::store::{
    BatchGetPage, ListUpdate, MemoryRecordStore, RecordStore, ScanPage, ScanRequest, StoreResult,
};
use campaign_storage::{CampaignStorageError, Item};
use common::{character, ids, setup_test, string, string_list, CHARACTERS_TABLE};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_get_one_existing_and_missing() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    ctx.records
        .put(character("c-1", "Vex", Some(12)))
        .await
        .expect("Failed to put character");

    let found = ctx.records.get_one("c-1").await.expect("Failed to get");
    let missing = ctx.records.get_one("c-404").await.expect("Failed to get");

    assert_eq!(found.and_then(|item| item.get("name").cloned()), Some(string("Vex")));
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_put_generates_id_and_shadow_fields() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    let mut record = character("ignored", "Lady Ash", None);
    record.remove("characterId");

    let stored = ctx.records.put(record).await.expect("Failed to put character");

    let id = ids(std::slice::from_ref(&stored), "characterId").remove(0);
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(stored.get("nameLowerCase"), Some(&string("lady ash")));
    assert_eq!(ctx.store.len(CHARACTERS_TABLE), 1);
}

#[tokio::test]
async fn test_put_rejects_non_string_id() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    let mut record = character("c-1", "Vex", None);
    record.insert("characterId".to_string(), common::number(7));

    let result = ctx.records.put(record).await;

    assert!(matches!(result, Err(CampaignStorageError::InvalidInput(_))));
    assert_eq!(ctx.store.len(CHARACTERS_TABLE), 0);
}

#[tokio::test]
async fn test_delete_removes_record() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    ctx.records
        .put(character("c-1", "Vex", None))
        .await
        .expect("Failed to put character");

    ctx.records.delete("c-1").await.expect("Failed to delete");

    assert!(ctx.records.get_one("c-1").await.expect("Failed to get").is_none());
}

#[tokio::test]
async fn test_batch_get_dedupes_and_keeps_request_order() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    for id in ["c-1", "c-2", "c-3"] {
        ctx.records
            .put(character(id, id, None))
            .await
            .expect("Failed to put character");
    }
    let requested: Vec<String> = ["c-3", "c-404", "c-1", "c-3"]
        .iter()
        .map(ToString::to_string)
        .collect();

    let items = ctx.records.batch_get(&requested).await.expect("Failed to batch get");

    assert_eq!(ids(&items, "characterId"), vec!["c-3", "c-1"]);
}

#[tokio::test]
async fn test_batch_get_spans_chunks() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    let requested: Vec<String> = (0..250).map(|index| format!("c-{index:03}")).collect();
    for id in &requested {
        ctx.store
            .put_item(CHARACTERS_TABLE, character(id, id, None))
            .await
            .expect("Failed to seed character");
    }

    let items = ctx.records.batch_get(&requested).await.expect("Failed to batch get");

    assert_eq!(ids(&items, "characterId"), requested);
}

#[tokio::test]
async fn test_batch_get_empty_input() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);

    let items = ctx.records.batch_get(&[]).await.expect("Failed to batch get");

    assert!(items.is_empty());
}

async fn seed_with_inventory(ctx: &common::TestContext) {
    let mut record = character("c-1", "Vex", None);
    record.insert("inventory".to_string(), string_list(&["o-1", "o-2"]));
    record.insert("equipment".to_string(), string_list(&["o-9"]));
    ctx.records.put(record).await.expect("Failed to put character");
}

#[tokio::test]
async fn test_move_id_between_lists() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    seed_with_inventory(&ctx).await;

    let updated = ctx
        .records
        .move_id("c-1", "o-2", "inventory", "equipment")
        .await
        .expect("Failed to move id");

    assert_eq!(updated.get("inventory"), Some(&string_list(&["o-1"])));
    assert_eq!(updated.get("equipment"), Some(&string_list(&["o-9", "o-2"])));

    let stored = ctx.records.get_one("c-1").await.expect("Failed to get");
    assert_eq!(stored, Some(updated));
}

#[tokio::test]
async fn test_move_id_into_missing_list_creates_it() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    seed_with_inventory(&ctx).await;

    let updated = ctx
        .records
        .move_id("c-1", "o-1", "inventory", "conditions")
        .await
        .expect("Failed to move id");

    assert_eq!(updated.get("conditions"), Some(&string_list(&["o-1"])));
}

#[tokio::test]
async fn test_move_id_does_not_duplicate_target_entry() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    let mut record = character("c-1", "Vex", None);
    record.insert("inventory".to_string(), string_list(&["o-1"]));
    record.insert("equipment".to_string(), string_list(&["o-1"]));
    ctx.records.put(record).await.expect("Failed to put character");

    let updated = ctx
        .records
        .move_id("c-1", "o-1", "inventory", "equipment")
        .await
        .expect("Failed to move id");

    assert_eq!(updated.get("inventory"), Some(&string_list(&[])));
    assert_eq!(updated.get("equipment"), Some(&string_list(&["o-1"])));
}

#[tokio::test]
async fn test_move_id_failures() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    seed_with_inventory(&ctx).await;

    let missing_record = ctx.records.move_id("c-404", "o-1", "inventory", "equipment").await;
    let missing_value = ctx.records.move_id("c-1", "o-404", "inventory", "equipment").await;
    let same_list = ctx.records.move_id("c-1", "o-1", "inventory", "inventory").await;
    let not_a_list = ctx.records.move_id("c-1", "o-1", "name", "equipment").await;

    assert!(matches!(missing_record, Err(CampaignStorageError::NotFound(_))));
    assert!(matches!(missing_value, Err(CampaignStorageError::NotFound(_))));
    assert!(matches!(same_list, Err(CampaignStorageError::InvalidInput(_))));
    assert!(matches!(not_a_list, Err(CampaignStorageError::InvalidInput(_))));
}

/// Serves reads from a snapshot taken before a concurrent writer ran
struct StaleReadStore {
    inner: Arc<MemoryRecordStore>,
    snapshot: Item,
}

#[async_trait]
impl RecordStore for StaleReadStore {
    async fn scan(&self, request: ScanRequest<'_>) -> StoreResult<ScanPage> {
        self.inner.scan(request).await
    }

    async fn get_item(&self, _table_name: &str, _key: Item) -> StoreResult<Option<Item>> {
        Ok(Some(self.snapshot.clone()))
    }

    async fn batch_get_items(
        &self,
        table_name: &str,
        keys: Vec<Item>,
    ) -> StoreResult<BatchGetPage> {
        self.inner.batch_get_items(table_name, keys).await
    }

    async fn put_item(&self, table_name: &str, item: Item) -> StoreResult<()> {
        self.inner.put_item(table_name, item).await
    }

    async fn delete_item(&self, table_name: &str, key: Item) -> StoreResult<()> {
        self.inner.delete_item(table_name, key).await
    }

    async fn set_lists(
        &self,
        table_name: &str,
        key: Item,
        update: ListUpdate,
    ) -> StoreResult<Item> {
        self.inner.set_lists(table_name, key, update).await
    }
}

#[tokio::test]
async fn test_concurrent_moves_into_same_list_conflict() {
    let ctx = setup_test(EntityKind::Characters, CHARACTERS_TABLE);
    let mut record = character("c-1", "Vex", None);
    record.insert("inventory".to_string(), string_list(&["o-1"]));
    record.insert("loot".to_string(), string_list(&["o-2"]));
    record.insert("equipment".to_string(), string_list(&[]));
    let snapshot = ctx.records.put(record).await.expect("Failed to put character");

    let late_writer = RecordStorage::new(
        Arc::new(StaleReadStore {
            inner: ctx.store.clone(),
            snapshot,
        }),
        Arc::new(EntityKind::Characters.schema()),
        CHARACTERS_TABLE.to_string(),
    );

    ctx.records
        .move_id("c-1", "o-1", "inventory", "equipment")
        .await
        .expect("Failed to move id");
    let result = late_writer.move_id("c-1", "o-2", "loot", "equipment").await;

    assert!(matches!(result, Err(CampaignStorageError::Conflict(_))));
    let stored = ctx
        .records
        .get_one("c-1")
        .await
        .expect("Failed to get")
        .expect("record exists");
    assert_eq!(stored.get("equipment"), Some(&string_list(&["o-1"])));
    assert_eq!(stored.get("loot"), Some(&string_list(&["o-2"])));
}
