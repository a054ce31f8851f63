pub mod carrier;
pub mod reference;
pub mod repository;

pub use carrier::{CarrierClient, CarrierOperation};
pub use reference::{Account, ReferenceData, ReferenceRows};
pub use repository::{AccountDirectory, ReferenceSource, RowStore};

use serde_json::Value;

/// Failure taxonomy shared by every layer of the order desk.
///
/// Nothing here is retried or translated: the boundary layer maps each kind
/// to a status class and passes the message through.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{message}")]
    CarrierError {
        message: String,
        /// Raw carrier response, kept for diagnostics.
        response: Option<Value>,
    },
    #[error("{0}")]
    StoreError(String),
}

impl CoreError {
    pub fn carrier(message: impl Into<String>, response: Option<Value>) -> Self {
        CoreError::CarrierError {
            message: message.into(),
            response,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
