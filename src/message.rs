//! Flow messages exchanged with the host automation runtime.
//!
//! Outbound requests arrive as loosely-typed JSON:
//!
//! ```json
//! { "dstgad": "1/2/34", "value": 21.5, "dpt": "9" }
//! ```
//!
//! Inbound bus data leaves as an [`InboundMessage`] with topic `knx:event` or
//! `knx:status` and the raw payload forwarded as text.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::encode;
use crate::error::{KnxError, Result};
use crate::types::{Action, DptCode, DptValue, GroupAddress, Telegram};

/// DPT marker for inbound data that was not decoded.
pub const NO_DPT: &str = "no_dpt";

/// Request to send a group telegram.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct OutboundRequest {
    /// Destination group address, e.g. `"1/2/34"`
    #[serde(default)]
    pub dstgad: Option<String>,
    /// Value to write; absent or `null` for reads
    #[serde(default)]
    pub value: Option<Value>,
    /// DPT code as string or number, defaults to `"1"`
    #[serde(default)]
    pub dpt: Option<Value>,
}

impl OutboundRequest {
    /// Read a request from a message payload.
    ///
    /// The payload is either a JSON object or a string containing one.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        match payload {
            Value::String(text) => Ok(serde_json::from_str(text)?),
            Value::Object(_) => Ok(Self::deserialize(payload)?),
            other => Err(serde_json::Error::custom(format!(
                "payload must be an object or a JSON string, got {other}"
            ))
            .into()),
        }
    }

    /// Check if the request carries a value.
    #[inline]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Parsed destination address.
    pub fn destination(&self) -> Result<GroupAddress> {
        self.dstgad
            .as_deref()
            .ok_or(KnxError::MissingAddress)?
            .parse()
    }

    /// DPT code, `"1"` when omitted.
    pub fn dpt(&self) -> Result<DptCode> {
        match &self.dpt {
            None | Some(Value::Null) => Ok(DptCode::default()),
            Some(code) => DptCode::from_json(code),
        }
    }

    /// Build the telegram for an action, encoding the value for writes.
    pub fn to_telegram(&self, action: Action) -> Result<Telegram> {
        let destination = self.destination()?;
        let dpt = self.dpt()?;

        match action {
            Action::Write => {
                let value = self
                    .value
                    .as_ref()
                    .ok_or_else(|| KnxError::invalid_value("write without value"))?;
                let value = DptValue::from_json(value)?;
                let payload = encode(dpt.as_str(), &value, action)?;
                Ok(Telegram::write(destination, payload, dpt))
            }
            Action::Read => Ok(Telegram::read(destination, dpt)),
            Action::Response => Err(KnxError::UnsupportedAction(action)),
        }
    }
}

/// Kind of inbound bus data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundKind {
    /// Spontaneous group write seen on the bus
    Event,
    /// Answer to a status (read) request
    Status,
}

impl InboundKind {
    /// Message topic for this kind.
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::Event => "knx:event",
            Self::Status => "knx:status",
        }
    }
}

/// Payload of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundPayload {
    /// Source physical address
    pub srcphy: String,
    /// Destination group address
    pub dstgad: String,
    /// Always [`NO_DPT`]
    pub dpt: String,
    /// Raw payload as lossy UTF-8 text
    pub value: String,
    /// `"event"` or `"status"`
    #[serde(rename = "type")]
    pub kind: InboundKind,
}

/// Message emitted for inbound bus data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// `knx:event` or `knx:status`
    pub topic: String,
    /// Message body
    pub payload: InboundPayload,
}

impl InboundMessage {
    /// Wrap raw bus data without interpreting it.
    pub fn new(kind: InboundKind, source: &str, destination: GroupAddress, data: &[u8]) -> Self {
        Self {
            topic: kind.topic().to_owned(),
            payload: InboundPayload {
                srcphy: source.to_owned(),
                dstgad: destination.to_string(),
                dpt: NO_DPT.to_owned(),
                value: String::from_utf8_lossy(data).into_owned(),
                kind,
            },
        }
    }
}
