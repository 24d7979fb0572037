//! List filter request types
//!
//! A [`ListFilter`] arrives from the caller as loosely typed JSON and is
//! translated against an [`EntitySchema`] into a store [`Predicate`].
//! Malformed clauses are rejected with
//! [`CampaignStorageError::InvalidFilter`] rather than skipped.

use std::collections::BTreeMap;

use aws_sdk_dynamodb::types::AttributeValue;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{EntitySchema, FieldKind};
use crate::predicate::{Comparator, Predicate};
use crate::{CampaignStorageError, CampaignStorageResult};

/// Caller-supplied predicate, sort and pagination for a list request
///
/// Field conditions sit at the top level, keyed by attribute name:
/// `{"search": "poison", "will": {"gte": 15}, "sort": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    /// Case-insensitive substring match across the searchable fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Sort keys, most significant first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortKey>,
    /// Page size and resume cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Per-field conditions
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldCondition>,
}

/// Page size and resume position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Requested page size; defaults to 10 and is capped at 100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Opaque cursor from a previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending, missing values last
    #[default]
    Asc,
    /// Descending, missing values first
    Desc,
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    /// Attribute to sort by
    pub field: String,
    /// Sort direction
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending sort key
    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort key
    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// Conditions on one field; every operator given must hold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldCondition {
    /// Equal to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<Value>,
    /// Not equal to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ne: Option<Value>,
    /// Less than (numbers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
    /// Less than or equal (numbers)
    #[serde(default, alias = "lte", skip_serializing_if = "Option::is_none")]
    pub le: Option<Value>,
    /// Greater than (numbers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    /// Greater than or equal (numbers)
    #[serde(default, alias = "gte", skip_serializing_if = "Option::is_none")]
    pub ge: Option<Value>,
    /// Inclusive range `[low, high]` (numbers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<Vec<Value>>,
    /// Substring match (strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    /// Prefix match (strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begins_with: Option<String>,
}

impl ListFilter {
    /// Adds a field condition
    #[must_use]
    pub fn with_field(mut self, field: &str, condition: FieldCondition) -> Self {
        self.fields.insert(field.to_string(), condition);
        self
    }

    /// Effective page size for a schema, clamped to `[1, max_limit]`
    #[must_use]
    pub fn limit(&self, schema: &EntitySchema) -> usize {
        let requested = self
            .pagination
            .as_ref()
            .and_then(|pagination| pagination.limit);

        match requested {
            None => schema.default_limit(),
            Some(limit) => usize::try_from(limit)
                .unwrap_or(1)
                .clamp(1, schema.max_limit()),
        }
    }

    /// Resume cursor, if the caller supplied one
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.pagination
            .as_ref()
            .and_then(|pagination| pagination.cursor.as_deref())
    }

    /// Translates the filter into a store predicate
    ///
    /// Returns `None` when the filter places no constraint on records.
    ///
    /// # Errors
    ///
    /// Returns `CampaignStorageError::InvalidFilter` if a field is not
    /// filterable for this schema, an operator does not fit the field kind,
    /// or an operand has the wrong type
    pub fn to_predicate(&self, schema: &EntitySchema) -> CampaignStorageResult<Option<Predicate>> {
        let mut clauses = Vec::new();

        if let Some(search) = self.search_clause(schema) {
            clauses.push(search);
        }

        for (field, condition) in &self.fields {
            let kind = schema.field_kind(field).ok_or_else(|| {
                CampaignStorageError::InvalidFilter(format!(
                    "field `{field}` is not filterable on {}",
                    schema.label()
                ))
            })?;
            clauses.extend(condition.to_clauses(field, kind)?);
        }

        Ok(match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Predicate::All(clauses)),
        })
    }

    fn search_clause(&self, schema: &EntitySchema) -> Option<Predicate> {
        let term = self.search.as_deref().map(str::trim).filter(|term| !term.is_empty())?;
        let folded = term.to_lowercase();

        let alternatives = schema
            .search_fields()
            .iter()
            .flat_map(|field| {
                let shadow = field.shadow.as_ref().map(|shadow| Predicate::Contains {
                    field: shadow.clone(),
                    value: AttributeValue::S(folded.clone()),
                });
                // Records written before the shadow field existed only carry the raw value
                let raw = Predicate::Contains {
                    field: field.attribute.clone(),
                    value: AttributeValue::S(term.to_string()),
                };
                shadow.into_iter().chain(std::iter::once(raw))
            })
            .collect::<Vec<_>>();

        if alternatives.is_empty() {
            None
        } else {
            Some(Predicate::Any(alternatives))
        }
    }
}

impl FieldCondition {
    fn to_clauses(&self, field: &str, kind: FieldKind) -> CampaignStorageResult<Vec<Predicate>> {
        let mut clauses = Vec::new();

        let comparisons = [
            (Comparator::Eq, &self.eq),
            (Comparator::Ne, &self.ne),
            (Comparator::Lt, &self.lt),
            (Comparator::Le, &self.le),
            (Comparator::Gt, &self.gt),
            (Comparator::Ge, &self.ge),
        ];
        for (comparator, operand) in comparisons {
            let Some(operand) = operand else {
                continue;
            };
            let ordered = !matches!(comparator, Comparator::Eq | Comparator::Ne);
            if ordered && kind == FieldKind::String {
                return Err(invalid(field, "ordering comparators only apply to numeric fields"));
            }
            clauses.push(Predicate::Compare {
                field: field.to_string(),
                comparator,
                value: operand_value(field, kind, operand)?,
            });
        }

        if let Some(bounds) = &self.between {
            if kind == FieldKind::String {
                return Err(invalid(field, "`between` only applies to numeric fields"));
            }
            let [low, high] = bounds.as_slice() else {
                return Err(invalid(field, "`between` takes exactly two bounds"));
            };
            let low = operand_value(field, kind, low)?;
            let high = operand_value(field, kind, high)?;
            if let (AttributeValue::N(low), AttributeValue::N(high)) = (&low, &high) {
                if parse_number(low) > parse_number(high) {
                    return Err(invalid(field, "`between` lower bound exceeds upper bound"));
                }
            }
            clauses.push(Predicate::Between {
                field: field.to_string(),
                low,
                high,
            });
        }

        let text_operators = [("contains", &self.contains), ("beginsWith", &self.begins_with)];
        for (operator, operand) in text_operators {
            let Some(operand) = operand else {
                continue;
            };
            if kind == FieldKind::Number {
                return Err(invalid(field, &format!("`{operator}` only applies to string fields")));
            }
            clauses.push(if operator == "contains" {
                Predicate::Contains {
                    field: field.to_string(),
                    value: AttributeValue::S(operand.clone()),
                }
            } else {
                Predicate::BeginsWith {
                    field: field.to_string(),
                    value: operand.clone(),
                }
            });
        }

        if clauses.is_empty() {
            return Err(invalid(field, "no operator given"));
        }
        Ok(clauses)
    }
}

fn operand_value(
    field: &str,
    kind: FieldKind,
    operand: &Value,
) -> CampaignStorageResult<AttributeValue> {
    match (kind, operand) {
        (FieldKind::String, Value::String(text)) => Ok(AttributeValue::S(text.clone())),
        (FieldKind::Number, Value::Number(number)) => Ok(AttributeValue::N(number.to_string())),
        (FieldKind::Number, Value::String(text)) if parse_number(text).is_some() => {
            Ok(AttributeValue::N(text.trim().to_string()))
        }
        (FieldKind::String, _) => Err(invalid(field, "expected a string operand")),
        (FieldKind::Number, _) => Err(invalid(field, "expected a numeric operand")),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|number| number.is_finite())
}

fn invalid(field: &str, reason: &str) -> CampaignStorageError {
    CampaignStorageError::InvalidFilter(format!("{field}: {reason}"))
}
