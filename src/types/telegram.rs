//! Encoded payloads and outgoing group telegrams.

use bytes::Bytes;

use super::{Action, DptCode, GroupAddress};

/// Result of encoding a value for the bus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EncodedValue {
    /// No payload (read request)
    #[default]
    None,
    /// Bit-packed boolean (DPT 1)
    Bool(bool),
    /// Fixed-width byte payload
    Bytes(Bytes),
}

impl EncodedValue {
    /// Payload bytes, if this is a byte payload.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(&b[..]),
            _ => None,
        }
    }

    /// Boolean value, if this is a bit payload.
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if there is no payload.
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for EncodedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("-"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Bytes(bytes) => {
                for byte in bytes.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// One group telegram handed to the bus transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    /// Destination group address
    pub destination: GroupAddress,
    /// Telegram action
    pub action: Action,
    /// Encoded payload, [`EncodedValue::None`] for reads
    pub payload: EncodedValue,
    /// DPT the payload was encoded with
    pub dpt: DptCode,
}

impl Telegram {
    /// Create a GroupValue_Write telegram.
    pub fn write(destination: GroupAddress, payload: EncodedValue, dpt: DptCode) -> Self {
        Self {
            destination,
            action: Action::Write,
            payload,
            dpt,
        }
    }

    /// Create a GroupValue_Read (status request) telegram.
    pub fn read(destination: GroupAddress, dpt: DptCode) -> Self {
        Self {
            destination,
            action: Action::Read,
            payload: EncodedValue::None,
            dpt,
        }
    }
}

impl std::fmt::Display for Telegram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} dpt={} value={}",
            self.action, self.destination, self.dpt, self.payload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_value_accessors() {
        let v = EncodedValue::Bytes(Bytes::from_static(&[0x00, 0x3F]));
        assert_eq!(v.as_bytes(), Some(&[0x00, 0x3F][..]));
        assert_eq!(v.as_bool(), None);

        assert_eq!(EncodedValue::Bool(true).as_bool(), Some(true));
        assert!(EncodedValue::default().is_none());
    }

    #[test]
    fn test_encoded_value_display() {
        assert_eq!(EncodedValue::None.to_string(), "-");
        assert_eq!(EncodedValue::Bool(false).to_string(), "false");
        assert_eq!(
            EncodedValue::Bytes(Bytes::from_static(&[0x37, 0x3B, 0x3B])).to_string(),
            "373b3b"
        );
    }

    #[test]
    fn test_telegram_display() {
        let dst: GroupAddress = "1/2/34".parse().unwrap();
        let t = Telegram::write(dst, EncodedValue::Bool(true), DptCode::default());
        assert_eq!(t.to_string(), "write 1/2/34 dpt=1 value=true");

        let t = Telegram::read(dst, DptCode::from("9"));
        assert_eq!(t.action, Action::Read);
        assert!(t.payload.is_none());
        assert_eq!(t.to_string(), "read 1/2/34 dpt=9 value=-");
    }
}
