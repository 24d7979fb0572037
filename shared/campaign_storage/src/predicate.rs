//! Store-side record predicates
//!
//! A [`Predicate`] is built once per list request and either rendered into a
//! `DynamoDB` `FilterExpression` or evaluated directly against an item.

use std::cmp::Ordering;
use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::store::Item;

/// Comparison operators supported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
}

impl Comparator {
    /// `DynamoDB` expression symbol
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    const fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => matches!(ordering, Ordering::Equal),
            Self::Ne => !matches!(ordering, Ordering::Equal),
            Self::Lt => matches!(ordering, Ordering::Less),
            Self::Le => !matches!(ordering, Ordering::Greater),
            Self::Gt => matches!(ordering, Ordering::Greater),
            Self::Ge => !matches!(ordering, Ordering::Less),
        }
    }
}

/// Record predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Every inner predicate holds
    All(Vec<Predicate>),
    /// At least one inner predicate holds
    Any(Vec<Predicate>),
    /// `field <comparator> value`
    Compare {
        /// Attribute name
        field: String,
        /// Operator
        comparator: Comparator,
        /// Right-hand operand
        value: AttributeValue,
    },
    /// `field BETWEEN low AND high`, inclusive
    Between {
        /// Attribute name
        field: String,
        /// Lower bound
        low: AttributeValue,
        /// Upper bound
        high: AttributeValue,
    },
    /// Substring match on strings, membership on lists and sets
    Contains {
        /// Attribute name
        field: String,
        /// Needle
        value: AttributeValue,
    },
    /// String prefix match
    BeginsWith {
        /// Attribute name
        field: String,
        /// Prefix
        value: String,
    },
}

/// A rendered `DynamoDB` filter expression with its placeholder tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    /// Expression text, e.g. `(#f0 >= :v0) AND (contains(#f1, :v1))`
    pub expression: String,
    /// `#name` placeholder to attribute name
    pub names: HashMap<String, String>,
    /// `:value` placeholder to attribute value
    pub values: HashMap<String, AttributeValue>,
}

#[derive(Default)]
struct ExpressionWriter {
    placeholders: HashMap<String, String>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ExpressionWriter {
    fn name(&mut self, field: &str) -> String {
        if let Some(placeholder) = self.placeholders.get(field) {
            return placeholder.clone();
        }
        let placeholder = format!("#f{}", self.placeholders.len());
        self.placeholders
            .insert(field.to_string(), placeholder.clone());
        self.names.insert(placeholder.clone(), field.to_string());
        placeholder
    }

    fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    fn write(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::All(inner) => self.join(inner, " AND "),
            Predicate::Any(inner) => self.join(inner, " OR "),
            Predicate::Compare {
                field,
                comparator,
                value,
            } => {
                let name = self.name(field);
                let value = self.value(value.clone());
                format!("{name} {} {value}", comparator.symbol())
            }
            Predicate::Between { field, low, high } => {
                let name = self.name(field);
                let low = self.value(low.clone());
                let high = self.value(high.clone());
                format!("{name} BETWEEN {low} AND {high}")
            }
            Predicate::Contains { field, value } => {
                let name = self.name(field);
                let value = self.value(value.clone());
                format!("contains({name}, {value})")
            }
            Predicate::BeginsWith { field, value } => {
                let name = self.name(field);
                let value = self.value(AttributeValue::S(value.clone()));
                format!("begins_with({name}, {value})")
            }
        }
    }

    fn join(&mut self, inner: &[Predicate], separator: &str) -> String {
        match inner {
            [single] => self.write(single),
            _ => inner
                .iter()
                .map(|predicate| format!("({})", self.write(predicate)))
                .collect::<Vec<_>>()
                .join(separator),
        }
    }
}

impl Predicate {
    /// Renders the predicate into `DynamoDB` filter expression syntax
    #[must_use]
    pub fn to_expression(&self) -> FilterExpression {
        let mut writer = ExpressionWriter::default();
        let expression = writer.write(self);
        FilterExpression {
            expression,
            names: writer.names,
            values: writer.values,
        }
    }

    /// Evaluates the predicate against an item the way `DynamoDB` would
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::All(inner) => inner.iter().all(|predicate| predicate.matches(item)),
            Self::Any(inner) => inner.iter().any(|predicate| predicate.matches(item)),
            Self::Compare {
                field,
                comparator,
                value,
            } => match item.get(field) {
                Some(actual) => compare_operands(actual, value)
                    .is_some_and(|ordering| comparator.accepts(ordering)),
                None => *comparator == Comparator::Ne,
            },
            Self::Between { field, low, high } => item.get(field).is_some_and(|actual| {
                compare_operands(actual, low).is_some_and(Ordering::is_ge)
                    && compare_operands(actual, high).is_some_and(Ordering::is_le)
            }),
            Self::Contains { field, value } => match (item.get(field), value) {
                (Some(AttributeValue::S(haystack)), AttributeValue::S(needle)) => {
                    haystack.contains(needle.as_str())
                }
                (Some(AttributeValue::L(list)), needle) => list.contains(needle),
                (Some(AttributeValue::Ss(set)), AttributeValue::S(needle)) => {
                    set.contains(needle)
                }
                (Some(AttributeValue::Ns(set)), AttributeValue::N(needle)) => {
                    set.contains(needle)
                }
                _ => false,
            },
            Self::BeginsWith { field, value } => matches!(
                item.get(field),
                Some(AttributeValue::S(actual)) if actual.starts_with(value.as_str())
            ),
        }
    }
}

/// Orders two operands of the same scalar type; mixed types do not compare
fn compare_operands(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::S(left), AttributeValue::S(right)) => Some(left.cmp(right)),
        (AttributeValue::N(left), AttributeValue::N(right)) => {
            let left = left.parse::<f64>().ok()?;
            let right = right.parse::<f64>().ok()?;
            left.partial_cmp(&right)
        }
        (AttributeValue::Bool(left), AttributeValue::Bool(right)) => Some(left.cmp(right)),
        (left, right) if left == right => Some(Ordering::Equal),
        _ => None,
    }
}
