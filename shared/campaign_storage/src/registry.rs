//! Per-entity service registry

use std::sync::Arc;

use crate::entity::EntityKind;
use crate::query::ListQueryService;
use crate::records::RecordStorage;
use crate::store::RecordStore;

/// Table names for every campaign entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// Characters table
    pub characters: String,
    /// Actions table
    pub actions: String,
    /// Conditions table
    pub conditions: String,
    /// Objects table
    pub objects: String,
}

impl TableNames {
    /// Table name for an entity type
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Characters => &self.characters,
            EntityKind::Actions => &self.actions,
            EntityKind::Conditions => &self.conditions,
            EntityKind::Objects => &self.objects,
        }
    }
}

/// List and record services for one entity table
pub struct Collection {
    /// Filtered list queries
    pub query: ListQueryService,
    /// Lookups and writes
    pub records: RecordStorage,
}

impl Collection {
    /// Builds both services for an entity over a shared store
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, kind: EntityKind, table_name: &str) -> Self {
        let schema = Arc::new(kind.schema());
        Self {
            query: ListQueryService::new(store.clone(), schema.clone(), table_name.to_string()),
            records: RecordStorage::new(store, schema, table_name.to_string()),
        }
    }
}

/// Services for every campaign entity, sharing one backing store
pub struct CampaignCollections {
    characters: Collection,
    actions: Collection,
    conditions: Collection,
    objects: Collection,
}

impl CampaignCollections {
    /// Creates the services for every entity table
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, tables: &TableNames) -> Self {
        let collection = |kind: EntityKind| Collection::new(store.clone(), kind, tables.get(kind));
        Self {
            characters: collection(EntityKind::Characters),
            actions: collection(EntityKind::Actions),
            conditions: collection(EntityKind::Conditions),
            objects: collection(EntityKind::Objects),
        }
    }

    /// Services for an entity type
    #[must_use]
    pub const fn get(&self, kind: EntityKind) -> &Collection {
        match kind {
            EntityKind::Characters => &self.characters,
            EntityKind::Actions => &self.actions,
            EntityKind::Conditions => &self.conditions,
            EntityKind::Objects => &self.objects,
        }
    }
}
