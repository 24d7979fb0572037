//! Error types for backing store operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    batch_get_item::BatchGetItemError, delete_item::DeleteItemError, get_item::GetItemError,
    put_item::PutItemError, scan::ScanError, update_item::UpdateItemError,
};
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to scan a `DynamoDB` table
    #[error("Failed to scan DynamoDB table: {0:?}")]
    DynamoDbScanError(#[from] SdkError<ScanError>),

    /// Failed to get an item from `DynamoDB`
    #[error("Failed to get item from DynamoDB: {0:?}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to batch get items from `DynamoDB`
    #[error("Failed to batch get items from DynamoDB: {0:?}")]
    DynamoDbBatchGetError(#[from] SdkError<BatchGetItemError>),

    /// Failed to put an item into `DynamoDB`
    #[error("Failed to put item into DynamoDB: {0:?}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to update an item in `DynamoDB`
    #[error("Failed to update item in DynamoDB: {0:?}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// Failed to delete an item from `DynamoDB`
    #[error("Failed to delete item from DynamoDB: {0:?}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// The condition guarding a write no longer holds
    #[error("Conditional check failed")]
    ConditionFailed,

    /// Keys were still unprocessed after all batch retries
    #[error("{0} keys left unprocessed after retries")]
    UnprocessedKeys(usize),

    /// Failed to assemble a request
    #[error("Failed to build store request: {0}")]
    Request(String),
}

impl StoreError {
    /// Checks if this error represents an upstream (5xx) error
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        match self {
            Self::DynamoDbScanError(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::DynamoDbGetError(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::DynamoDbBatchGetError(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::DynamoDbPutError(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::DynamoDbUpdateError(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::DynamoDbDeleteError(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::UnprocessedKeys(_) => true,
            Self::ConditionFailed | Self::Request(_) => false,
        }
    }

    fn check_sdk_error_status<E>(sdk_err: &SdkError<E>) -> bool {
        if let SdkError::ServiceError(err) = sdk_err {
            let raw = err.raw();
            let status = raw.status();
            return status.as_u16() >= 500;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exhausted_retries_count_as_upstream() {
        assert!(StoreError::UnprocessedKeys(3).is_upstream_error());
        assert!(!StoreError::ConditionFailed.is_upstream_error());
        assert!(!StoreError::Request("missing key".to_string()).is_upstream_error());
    }
}
