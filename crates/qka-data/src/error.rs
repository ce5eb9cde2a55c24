//! Data-layer error types

use qka_core::InvocationError;
use qka_store::StoreError;
use thiserror::Error;

pub type DataResult<T> = std::result::Result<T, DataError>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("stock code must be 6 digits: {0}")]
    InvalidCode(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid calendar format: {0}")]
    InvalidFormat(String),

    #[error("unknown sector: {0}")]
    UnknownSector(String),

    #[error("unrecognized time: {0}")]
    InvalidTime(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failure inside the market-data source itself
    #[error("{0}")]
    Source(String),
}

impl From<DataError> for InvocationError {
    fn from(err: DataError) -> Self {
        InvocationError::new(err.to_string())
    }
}
