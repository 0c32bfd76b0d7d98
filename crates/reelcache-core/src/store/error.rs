use thiserror::Error;

use crate::models::RecordId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Local storage unavailable: {0}")]
    Unavailable(String),

    #[error("No stored record with id {0}")]
    NotFound(RecordId),
}
