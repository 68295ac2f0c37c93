use crate::consts::RATE_LIMITED_STATUS;

/// Errors produced while talking to the Safe transaction service.
#[derive(Debug, thiserror::Error)]
pub enum SafeApiError {
    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service answered with a non-2xx status.
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// The chain key is not part of the registry. Never retried.
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    /// The input is not a 20 byte hex address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A 2xx body could not be decoded into the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SafeApiError {
    /// Returns the HTTP status for [SafeApiError::Api], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            SafeApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(RATE_LIMITED_STATUS)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// A request that failed before any HTTP status was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Errors returned by a [crate::wallet::WalletCapabilities] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("User rejected the request")]
    Rejected,

    #[error("Wallet error: {0}")]
    Other(String),
}

/// Errors raised by a [crate::store::KeyValueStore] on write.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write store file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = SafeApiError> = std::result::Result<T, E>;
