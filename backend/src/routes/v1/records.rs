use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension, Json};
use axum_valid::Valid;
use campaign_storage::{
    entity::EntityKind,
    filter::ListFilter,
    query::Page,
    records::{item_from_json, item_to_json},
    registry::CampaignCollections,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::types::{AppError, FilterJson};

/// Path naming an entity collection
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EntityPath {
    /// Entity type: `characters`, `actions`, `conditions` or `objects`
    pub entity: EntityKind,
}

/// Path naming one record of an entity collection
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecordPath {
    /// Entity type: `characters`, `actions`, `conditions` or `objects`
    pub entity: EntityKind,
    /// Record id
    pub id: String,
}

/// Request to fetch several records by id
#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct BatchGetRequest {
    /// Record ids; duplicates are collapsed
    #[validate(length(min = 1, max = 100))]
    pub ids: Vec<String>,
}

/// Records found by a batch lookup, in request order
#[derive(Debug, Serialize, JsonSchema)]
pub struct BatchGetResponse {
    /// Found records; unknown ids are skipped
    pub items: Vec<Value>,
}

/// Request to move an id between two list attributes of a record
#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoveIdRequest {
    /// Id to move
    #[validate(length(min = 1))]
    pub value: String,

    /// List attribute currently holding the id
    #[validate(length(min = 1))]
    pub from_field: String,

    /// List attribute receiving the id
    #[validate(length(min = 1))]
    pub to_field: String,
}

/// List records of an entity type
///
/// Applies the filter's search term and field conditions, sorts the page and
/// returns a cursor for the next page. An empty body or an empty object lists
/// everything with the default page size.
///
/// # Errors
///
/// Returns an error if:
/// - `400 BAD_REQUEST` - Malformed filter or cursor
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Database connectivity issues
pub async fn list_records(
    Path(EntityPath { entity }): Path<EntityPath>,
    Extension(collections): Extension<Arc<CampaignCollections>>,
    FilterJson(filter): FilterJson<ListFilter>,
) -> Result<Json<Page<Value>>, AppError> {
    let page = collections.get(entity).query.list(filter.as_ref()).await?;

    Ok(Json(page.into_json()?))
}

/// Get several records by id
///
/// # Errors
///
/// Returns an error if:
/// - `400 BAD_REQUEST` - Empty id list or more than 100 ids
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Database connectivity issues
pub async fn batch_get_records(
    Path(EntityPath { entity }): Path<EntityPath>,
    Extension(collections): Extension<Arc<CampaignCollections>>,
    Valid(Json(payload)): Valid<Json<BatchGetRequest>>,
) -> Result<Json<BatchGetResponse>, AppError> {
    let items = collections
        .get(entity)
        .records
        .batch_get(&payload.ids)
        .await?
        .into_iter()
        .map(item_to_json)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(BatchGetResponse { items }))
}

/// Get a record by id
///
/// # Errors
///
/// Returns an error if:
/// - `404 NOT_FOUND` - No record with the given id
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Database connectivity issues
pub async fn get_record(
    Path(RecordPath { entity, id }): Path<RecordPath>,
    Extension(collections): Extension<Arc<CampaignCollections>>,
) -> Result<Json<Value>, AppError> {
    let Some(item) = collections.get(entity).records.get_one(&id).await? else {
        return Err(AppError::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{entity} record {id} not found"),
            false,
        ));
    };

    Ok(Json(item_to_json(item)?))
}

/// Create or replace a record
///
/// An id is generated when the record has none. The stored record, including
/// its id and derived search fields, is returned.
///
/// # Errors
///
/// Returns an error if:
/// - `400 BAD_REQUEST` - Body is not an object or the id is not a non-empty string
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Database connectivity issues
pub async fn put_record(
    Path(EntityPath { entity }): Path<EntityPath>,
    Extension(collections): Extension<Arc<CampaignCollections>>,
    Json(record): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let item = item_from_json(&record)?;
    let stored = collections.get(entity).records.put(item).await?;

    Ok(Json(item_to_json(stored)?))
}

/// Delete a record by id
///
/// Deleting a missing record succeeds.
///
/// # Returns
///
/// Returns `204 NO_CONTENT` on success
///
/// # Errors
///
/// Returns an error if:
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Database connectivity issues
pub async fn delete_record(
    Path(RecordPath { entity, id }): Path<RecordPath>,
    Extension(collections): Extension<Arc<CampaignCollections>>,
) -> Result<StatusCode, AppError> {
    collections.get(entity).records.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Move an id from one list attribute of a record to another
///
/// Used to move objects between a character's inventory and equipment, or to
/// attach actions and conditions.
///
/// # Errors
///
/// Returns an error if:
/// - `400 BAD_REQUEST` - Same source and target, or the attributes are not lists of ids
/// - `404 NOT_FOUND` - Record missing, or the id is not in the source list
/// - `409 CONFLICT` - The record changed concurrently; retry
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Database connectivity issues
pub async fn move_id(
    Path(RecordPath { entity, id }): Path<RecordPath>,
    Extension(collections): Extension<Arc<CampaignCollections>>,
    Valid(Json(payload)): Valid<Json<MoveIdRequest>>,
) -> Result<Json<Value>, AppError> {
    let updated = collections
        .get(entity)
        .records
        .move_id(&id, &payload.value, &payload.from_field, &payload.to_field)
        .await?;

    Ok(Json(item_to_json(updated)?))
}
