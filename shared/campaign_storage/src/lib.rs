//! Campaign storage services
//!
//! This crate provides the `DynamoDB` storage layer for campaign entities
//! (characters, actions, conditions and objects): filtered and paginated
//! listing, point and batch lookups, writes, and moving ids between list
//! attributes of a record.

pub mod cursor;
pub mod entity;
mod error;
pub mod filter;
pub mod predicate;
pub mod query;
pub mod records;
pub mod registry;
pub mod sort;
pub mod store;

pub use error::{CampaignStorageError, CampaignStorageResult};
pub use store::Item;
