//! Error types for the KNX DPT codec and node layer.

use thiserror::Error;

use crate::types::Action;

/// Result type alias for KNX operations.
pub type Result<T> = std::result::Result<T, KnxError>;

/// KNX codec and node error types.
#[derive(Debug, Error)]
pub enum KnxError {
    /// No registry entry for the datapoint type code
    #[error("Unsupported dpt[{0}]")]
    UnsupportedDpt(String),

    /// Action other than write/read reached the encoder
    #[error("Unsupported action[{0}]")]
    UnsupportedAction(Action),

    /// Value shape does not match what the DPT rule expects
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Request carries no destination group address
    #[error("Missing destination group address")]
    MissingAddress,

    /// Malformed group address
    #[error("Invalid group address: {0}")]
    InvalidAddress(String),

    /// Request payload is not valid JSON or not an object
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Controller mode other than tunnel/unicast
    #[error("Unsupported mode[{0}]")]
    UnsupportedMode(String),

    /// No open bus connection
    #[error("Not connected")]
    NotConnected,

    /// Connection timeout
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// Telegram was not accepted by the transport in time
    #[error("Send timeout")]
    SendTimeout,

    /// Failure reported by the bus transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Channel closed
    #[error("Channel closed")]
    ChannelClosed,
}

impl KnxError {
    /// Create an invalid value error with a message.
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    /// Create a transport error with a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Check if this error was raised by the DPT codec itself.
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedDpt(_) | Self::UnsupportedAction(_) | Self::InvalidValue(_)
        )
    }

    /// Check if this error indicates a connection problem.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::ConnectionTimeout | Self::Transport(_)
        )
    }
}
