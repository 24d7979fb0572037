//! Entity schema descriptors
//!
//! An [`EntitySchema`] tells the generic list and record services how one
//! entity table is shaped: its identity attribute, which text fields are
//! searchable (and their lowercase shadow fields), and which fields can be
//! filtered and how they compare.

use std::collections::BTreeMap;

use aws_sdk_dynamodb::types::AttributeValue;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::store::Item;

/// Default number of records per page
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Hard cap on records per page
pub const MAX_PAGE_LIMIT: usize = 100;

/// How a filterable field compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text compared with `eq`, `ne`, `contains` and `beginsWith`
    String,
    /// Number compared with `eq`, `ne`, `lt`, `le`, `gt`, `ge` and `between`
    Number,
}

/// A searchable text field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchField {
    /// Raw attribute name
    pub attribute: String,
    /// Precomputed lowercase copy of the attribute, when maintained
    pub shadow: Option<String>,
}

/// Per-entity table shape consumed by the storage services
#[derive(Debug, Clone)]
pub struct EntitySchema {
    label: String,
    id_attribute: String,
    search_fields: Vec<SearchField>,
    filter_fields: BTreeMap<String, FieldKind>,
    default_limit: usize,
    max_limit: usize,
}

impl EntitySchema {
    /// Starts building a schema
    ///
    /// # Arguments
    ///
    /// * `label` - Plural entity name used in error messages, e.g. `actions`
    /// * `id_attribute` - Name of the identity (partition key) attribute
    #[must_use]
    pub fn builder(label: &str, id_attribute: &str) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            schema: Self {
                label: label.to_string(),
                id_attribute: id_attribute.to_string(),
                search_fields: Vec::new(),
                filter_fields: BTreeMap::new(),
                default_limit: DEFAULT_PAGE_LIMIT,
                max_limit: MAX_PAGE_LIMIT,
            },
        }
    }

    /// Plural entity name
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Identity attribute name
    #[must_use]
    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }

    /// Searchable text fields
    #[must_use]
    pub fn search_fields(&self) -> &[SearchField] {
        &self.search_fields
    }

    /// Comparator kind of a filterable field, `None` when not filterable
    #[must_use]
    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.filter_fields.get(field).copied()
    }

    /// Page size used when the caller gives none
    #[must_use]
    pub const fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Largest page size; larger requests are capped
    #[must_use]
    pub const fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Builds the primary key for an id
    #[must_use]
    pub fn key_for(&self, id: &str) -> Item {
        Item::from([(self.id_attribute.clone(), AttributeValue::S(id.to_string()))])
    }

    /// Extracts the primary key of a stored item
    #[must_use]
    pub fn key_of(&self, item: &Item) -> Option<Item> {
        item.get(&self.id_attribute)
            .map(|id| Item::from([(self.id_attribute.clone(), id.clone())]))
    }

    /// Extracts the string id of a stored item
    #[must_use]
    pub fn id_of<'a>(&self, item: &'a Item) -> Option<&'a str> {
        match item.get(&self.id_attribute) {
            Some(AttributeValue::S(id)) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Builder for [`EntitySchema`]
#[derive(Debug, Clone)]
pub struct EntitySchemaBuilder {
    schema: EntitySchema,
}

impl EntitySchemaBuilder {
    /// Adds a searchable text field with no shadow field
    ///
    /// Searchable fields are also filterable as strings.
    #[must_use]
    pub fn search_field(self, attribute: impl ToString) -> Self {
        self.add_search_field(attribute.to_string(), None)
    }

    /// Adds a searchable text field backed by a lowercase shadow field
    #[must_use]
    pub fn search_field_with_shadow(self, attribute: impl ToString, shadow: impl ToString) -> Self {
        self.add_search_field(attribute.to_string(), Some(shadow.to_string()))
    }

    fn add_search_field(mut self, attribute: String, shadow: Option<String>) -> Self {
        self.schema
            .filter_fields
            .insert(attribute.clone(), FieldKind::String);
        self.schema
            .search_fields
            .push(SearchField { attribute, shadow });
        self
    }

    /// Adds a filterable field
    #[must_use]
    pub fn filter_field(mut self, attribute: impl ToString, kind: FieldKind) -> Self {
        self.schema
            .filter_fields
            .insert(attribute.to_string(), kind);
        self
    }

    /// Overrides the default page size
    #[must_use]
    pub const fn default_limit(mut self, limit: usize) -> Self {
        self.schema.default_limit = limit;
        self
    }

    /// Overrides the page size cap
    #[must_use]
    pub const fn max_limit(mut self, limit: usize) -> Self {
        self.schema.max_limit = limit;
        self
    }

    /// Finishes the schema
    #[must_use]
    pub fn build(self) -> EntitySchema {
        self.schema
    }
}

/// Campaign entity types
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    /// Player and non-player characters
    Characters,
    /// Actions a character can take
    Actions,
    /// Conditions that can afflict a character
    Conditions,
    /// Items, weapons and equipment
    Objects,
}

impl EntityKind {
    /// Built-in schema for this entity type
    #[must_use]
    pub fn schema(self) -> EntitySchema {
        match self {
            Self::Characters => {
                EntitySchema::builder("characters", &CharacterAttribute::CharacterId.to_string())
                    .search_field_with_shadow(
                        CharacterAttribute::Name,
                        CharacterAttribute::NameLowerCase,
                    )
                    .search_field_with_shadow(
                        CharacterAttribute::Description,
                        CharacterAttribute::DescriptionLowerCase,
                    )
                    .filter_field(CharacterAttribute::CharacterCategory, FieldKind::String)
                    .filter_field(CharacterAttribute::Will, FieldKind::Number)
                    .filter_field(CharacterAttribute::Speed, FieldKind::Number)
                    .filter_field(CharacterAttribute::Weight, FieldKind::Number)
                    .filter_field(CharacterAttribute::Height, FieldKind::Number)
                    .build()
            }
            Self::Actions => {
                EntitySchema::builder("actions", &ActionAttribute::ActionId.to_string())
                    .search_field_with_shadow(ActionAttribute::Name, ActionAttribute::NameLowerCase)
                    .search_field_with_shadow(
                        ActionAttribute::Description,
                        ActionAttribute::DescriptionLowerCase,
                    )
                    .filter_field(ActionAttribute::ActionType, FieldKind::String)
                    .filter_field(ActionAttribute::Source, FieldKind::String)
                    .filter_field(ActionAttribute::Target, FieldKind::String)
                    .filter_field(ActionAttribute::Range, FieldKind::Number)
                    .build()
            }
            Self::Conditions => {
                EntitySchema::builder("conditions", &ConditionAttribute::ConditionId.to_string())
                    .search_field_with_shadow(
                        ConditionAttribute::Name,
                        ConditionAttribute::NameLowerCase,
                    )
                    .search_field_with_shadow(
                        ConditionAttribute::Description,
                        ConditionAttribute::DescriptionLowerCase,
                    )
                    .filter_field(ConditionAttribute::ConditionType, FieldKind::String)
                    .build()
            }
            Self::Objects => {
                EntitySchema::builder("objects", &ObjectAttribute::ObjectId.to_string())
                    .search_field_with_shadow(ObjectAttribute::Name, ObjectAttribute::NameLowerCase)
                    .search_field(ObjectAttribute::Description)
                    .filter_field(ObjectAttribute::ObjectCategory, FieldKind::String)
                    .filter_field(ObjectAttribute::IsLimb, FieldKind::String)
                    .filter_field(ObjectAttribute::Weight, FieldKind::Number)
                    .filter_field(ObjectAttribute::Bulk, FieldKind::Number)
                    .filter_field(ObjectAttribute::Lethality, FieldKind::Number)
                    .build()
            }
        }
    }
}

/// `DynamoDB` attribute names for the characters table
#[derive(Debug, Display)]
#[strum(serialize_all = "camelCase")]
pub enum CharacterAttribute {
    /// Primary key
    CharacterId,
    /// Display name
    Name,
    /// Lowercase copy of `name`
    NameLowerCase,
    /// Free-text description
    Description,
    /// Lowercase copy of `description`
    DescriptionLowerCase,
    /// Character category (e.g. player, npc)
    CharacterCategory,
    /// Will attribute
    Will,
    /// Movement speed
    Speed,
    /// Weight
    Weight,
    /// Height
    Height,
    /// Ids of objects carried
    Inventory,
    /// Ids of objects equipped
    Equipment,
    /// Ids of actions available
    Actions,
    /// Ids of active conditions
    Conditions,
}

/// `DynamoDB` attribute names for the actions table
#[derive(Debug, Display)]
#[strum(serialize_all = "camelCase")]
pub enum ActionAttribute {
    /// Primary key
    ActionId,
    /// Display name
    Name,
    /// Lowercase copy of `name`
    NameLowerCase,
    /// Free-text description
    Description,
    /// Lowercase copy of `description`
    DescriptionLowerCase,
    /// Action type (e.g. attack, skill)
    ActionType,
    /// Attribute the action draws on
    Source,
    /// Attribute the action targets
    Target,
    /// Effective range
    Range,
}

/// `DynamoDB` attribute names for the conditions table
#[derive(Debug, Display)]
#[strum(serialize_all = "camelCase")]
pub enum ConditionAttribute {
    /// Primary key
    ConditionId,
    /// Display name
    Name,
    /// Lowercase copy of `name`
    NameLowerCase,
    /// Free-text description
    Description,
    /// Lowercase copy of `description`
    DescriptionLowerCase,
    /// Condition type (e.g. buff, debuff)
    ConditionType,
}

/// `DynamoDB` attribute names for the objects table
#[derive(Debug, Display)]
#[strum(serialize_all = "camelCase")]
pub enum ObjectAttribute {
    /// Primary key
    ObjectId,
    /// Display name
    Name,
    /// Lowercase copy of `name`
    NameLowerCase,
    /// Free-text description
    Description,
    /// Object category (e.g. weapon, armor)
    ObjectCategory,
    /// Whether the object replaces a limb
    IsLimb,
    /// Weight
    Weight,
    /// Bulk
    Bulk,
    /// Lethality
    Lethality,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_attribute_names_are_camel_case() {
        assert_eq!(CharacterAttribute::CharacterId.to_string(), "characterId");
        assert_eq!(CharacterAttribute::NameLowerCase.to_string(), "nameLowerCase");
        assert_eq!(
            ConditionAttribute::DescriptionLowerCase.to_string(),
            "descriptionLowerCase"
        );
        assert_eq!(ObjectAttribute::IsLimb.to_string(), "isLimb");
    }

    #[test]
    fn test_entity_kind_parses_path_segment() {
        assert_eq!(EntityKind::from_str("actions").unwrap(), EntityKind::Actions);
        assert_eq!(EntityKind::Objects.to_string(), "objects");
        assert!(EntityKind::from_str("monsters").is_err());
    }

    #[test]
    fn test_builtin_schemas_use_uniform_limits() {
        for kind in EntityKind::iter() {
            let schema = kind.schema();
            assert_eq!(schema.label(), kind.to_string());
            assert_eq!(schema.default_limit(), DEFAULT_PAGE_LIMIT);
            assert_eq!(schema.max_limit(), MAX_PAGE_LIMIT);
            assert!(!schema.search_fields().is_empty());
        }
    }

    #[test]
    fn test_search_fields_are_filterable_strings() {
        let schema = EntityKind::Characters.schema();

        assert_eq!(schema.id_attribute(), "characterId");
        assert_eq!(schema.field_kind("name"), Some(FieldKind::String));
        assert_eq!(schema.field_kind("will"), Some(FieldKind::Number));
        assert_eq!(schema.field_kind("nameLowerCase"), None);
    }

    #[test]
    fn test_key_helpers() {
        let schema = EntityKind::Actions.schema();
        let mut item = schema.key_for("a-1");
        item.insert("name".to_string(), AttributeValue::S("Slash".to_string()));

        assert_eq!(schema.id_of(&item), Some("a-1"));
        assert_eq!(schema.key_of(&item), Some(schema.key_for("a-1")));
    }
}
