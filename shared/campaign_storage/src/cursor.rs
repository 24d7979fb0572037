//! Opaque pagination cursors
//!
//! A cursor is the base64 encoding of the JSON form of the store's resume
//! key, e.g. `{"characterId":"c-01"}`. Callers treat it as opaque.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::entity::EntitySchema;
use crate::store::Item;
use crate::{CampaignStorageError, CampaignStorageResult};

/// Encodes a store resume key as a cursor
///
/// # Errors
///
/// Returns `CampaignStorageError::SerializationError` if the key cannot be
/// converted to JSON
pub fn encode(key: &Item) -> CampaignStorageResult<String> {
    let value: Value = serde_dynamo::from_item(key.clone())?;
    let json = serde_json::to_vec(&value)
        .map_err(|e| CampaignStorageError::SerializationError(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

/// Decodes a cursor into a resume key for a schema's table
///
/// The decoded key must consist of exactly the identity attribute with a
/// non-empty string value.
///
/// # Errors
///
/// Returns `CampaignStorageError::InvalidCursor` if the cursor is not
/// base64, not JSON, or not shaped like a key of this table
pub fn decode(cursor: &str, schema: &EntitySchema) -> CampaignStorageResult<Item> {
    let bytes = STANDARD
        .decode(cursor.trim())
        .map_err(|e| CampaignStorageError::InvalidCursor(format!("not base64: {e}")))?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| CampaignStorageError::InvalidCursor(format!("not JSON: {e}")))?;

    let Value::Object(map) = value else {
        return Err(CampaignStorageError::InvalidCursor(
            "expected a JSON object".to_string(),
        ));
    };

    let id_attribute = schema.id_attribute();
    let valid_id = matches!(map.get(id_attribute), Some(Value::String(id)) if !id.is_empty());
    if map.len() != 1 || !valid_id {
        return Err(CampaignStorageError::InvalidCursor(format!(
            "expected a key with only `{id_attribute}`"
        )));
    }

    serde_dynamo::to_item(&map)
        .map_err(|e| CampaignStorageError::InvalidCursor(e.to_string()))
}
