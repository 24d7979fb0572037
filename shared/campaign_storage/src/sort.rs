//! In-memory multi-key sort of scanned records

use std::cmp::Ordering;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::filter::{SortDirection, SortKey};
use crate::store::Item;

/// Sorts items by the given keys
///
/// Strings compare case-insensitively and numbers numerically. Records
/// missing a sort field go last for `ASC` and first for `DESC`. Ties fall
/// through to the next key and finally keep their incoming order.
pub fn sort_items(items: &mut [Item], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    items.sort_by(|left, right| {
        keys.iter()
            .map(|key| compare_by_key(left, right, key))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

fn compare_by_key(left: &Item, right: &Item, key: &SortKey) -> Ordering {
    // Missing values rank above every present value, so the direction flip
    // puts them last for ASC and first for DESC.
    let ordering = match (present(left, &key.field), present(right, &key.field)) {
        (Some(left), Some(right)) => compare_values(left, right),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };

    match key.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn present<'a>(item: &'a Item, field: &str) -> Option<&'a AttributeValue> {
    item.get(field)
        .filter(|value| !matches!(value, AttributeValue::Null(_)))
}

fn compare_values(left: &AttributeValue, right: &AttributeValue) -> Ordering {
    match (left, right) {
        (AttributeValue::N(left), AttributeValue::N(right)) => {
            match (left.parse::<f64>(), right.parse::<f64>()) {
                (Ok(left), Ok(right)) => left.total_cmp(&right),
                _ => left.cmp(right),
            }
        }
        (AttributeValue::S(left), AttributeValue::S(right)) => left
            .to_lowercase()
            .cmp(&right.to_lowercase()),
        (AttributeValue::Bool(left), AttributeValue::Bool(right)) => left.cmp(right),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

/// Orders mixed types: numbers, then strings, then booleans, then the rest
const fn type_rank(value: &AttributeValue) -> u8 {
    match value {
        AttributeValue::N(_) => 0,
        AttributeValue::S(_) => 1,
        AttributeValue::Bool(_) => 2,
        _ => 3,
    }
}
