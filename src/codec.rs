//! DPT encoder.
//!
//! Packs a [`DptValue`] into the payload a group write telegram carries.
//!
//! ```text
//! DPT 3   (1 byte):  0000 CAAA              C = control, A = step amount
//! DPT 10  (3 bytes): DDDH HHHH  00MM MMMM  00SS SSSS
//! DPT 17  (2 bytes): 0000 0000  VVVV VVVV  (value <= 255)
//!                    LLLL LLLL  HHHH HHHH  (256..=65535, little-endian)
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KnxError, Result};
use crate::types::{Action, DptValue, EncodeRule, EncodedValue, Packer, Registry, TimeOfDay};

/// Maximum number of characters in a DPT 16 string.
pub const STRING_LENGTH: usize = 14;

/// Encode a value for the given DPT code.
///
/// Only [`Action::Write`] encodes. [`Action::Read`] returns
/// [`EncodedValue::None`] without looking at the value, the transport sends a
/// status request instead. [`Action::Response`] is rejected.
///
/// # Example
///
/// ```rust
/// use knx_dpt::{encode, Action, DimmerControl, DptValue};
///
/// let payload = encode("3", &DimmerControl::new(true, 5).into(), Action::Write)?;
/// assert_eq!(payload.as_bytes(), Some(&[0x0D][..]));
///
/// let payload = encode("1", &DptValue::from("true"), Action::Write)?;
/// assert_eq!(payload.as_bool(), Some(true));
/// # Ok::<(), knx_dpt::KnxError>(())
/// ```
pub fn encode(dpt: &str, value: &DptValue, action: Action) -> Result<EncodedValue> {
    match action {
        Action::Write => {}
        Action::Read => return Ok(EncodedValue::None),
        Action::Response => return Err(KnxError::UnsupportedAction(action)),
    }

    let rule = Registry::lookup(dpt)?;
    let encoded = pack(rule, value)?;
    debug!("encoded {:?} with {}: {}", value, rule, encoded);
    Ok(encoded)
}

/// Pack a value with an already resolved rule.
pub fn pack(rule: &EncodeRule, value: &DptValue) -> Result<EncodedValue> {
    let encoded = match rule.packer {
        Packer::Switch => return Ok(EncodedValue::Bool(pack_switch(value))),
        Packer::Dimming => pack_dimming(value)?,
        Packer::Float32 => pack_float(value)?,
        Packer::TimeOfDay => pack_time(value)?,
        Packer::String14 => pack_string(value)?,
        Packer::Scene => pack_scene(value)?,
    };
    debug_assert_eq!(encoded.len(), rule.byte_width());
    Ok(EncodedValue::Bytes(encoded))
}

fn pack_switch(value: &DptValue) -> bool {
    matches!(value.text_form().as_deref(), Some("true" | "1"))
}

fn pack_dimming(value: &DptValue) -> Result<Bytes> {
    let byte = match value {
        DptValue::Dimmer(dimmer) => {
            if !(0..=7).contains(&dimmer.amount) {
                return Err(KnxError::invalid_value(format!(
                    "dimmer amount {} out of range 0..=7",
                    dimmer.amount
                )));
            }
            ((u8::from(dimmer.control) << 3) | (dimmer.amount as u8 & 0x07)) & 0x0F
        }
        other => match other.as_integer() {
            Some(raw) => (raw & 0x0F) as u8,
            None => {
                return Err(KnxError::invalid_value(format!(
                    "dimming expects {{c, amount}} or an integer, got {other:?}"
                )))
            }
        },
    };
    Ok(Bytes::copy_from_slice(&[byte]))
}

fn pack_float(value: &DptValue) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(4);
    buf.put_f32_le(value.parse_float()? as f32);
    Ok(buf.freeze())
}

fn pack_time(value: &DptValue) -> Result<Bytes> {
    let time = match value {
        DptValue::Time(time) => *time,
        DptValue::Dimmer(_) => {
            return Err(KnxError::invalid_value(format!(
                "time of day expects {{day, hours, minutes, seconds}} or an integer, got {value:?}"
            )))
        }
        other => TimeOfDay::from_bits(other.parse_int()?),
    };

    let hours = time.hours.min(23);
    let minutes = time.minutes.min(59);
    let seconds = time.seconds.min(59);

    let mut buf = BytesMut::with_capacity(3);
    buf.put_u8((((time.day & 0x07) << 5) | (hours & 0x1F)) as u8);
    buf.put_u8((minutes & 0x3F) as u8);
    buf.put_u8((seconds & 0x3F) as u8);
    Ok(buf.freeze())
}

fn pack_string(value: &DptValue) -> Result<Bytes> {
    let text = value
        .text_form()
        .ok_or_else(|| KnxError::invalid_value(format!("string expects a scalar, got {value:?}")))?;

    let mut buf = BytesMut::zeroed(STRING_LENGTH);
    for (slot, ch) in buf.iter_mut().zip(text.chars()) {
        // Latin-1: keep the low byte of the code point
        *slot = (u32::from(ch) & 0xFF) as u8;
    }
    Ok(buf.freeze())
}

fn pack_scene(value: &DptValue) -> Result<Bytes> {
    let raw = value.parse_int()?;
    let bytes = if raw <= 0xFF {
        [0x00, (raw & 0xFF) as u8]
    } else if raw <= 0xFFFF {
        (raw as u16).to_le_bytes()
    } else {
        return Err(KnxError::invalid_value(format!(
            "value {raw} above 65535 cannot be encoded"
        )));
    };
    Ok(Bytes::copy_from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DimmerControl;

    fn write(dpt: &str, value: impl Into<DptValue>) -> Result<EncodedValue> {
        encode(dpt, &value.into(), Action::Write)
    }

    fn bytes(dpt: &str, value: impl Into<DptValue>) -> Vec<u8> {
        write(dpt, value).unwrap().as_bytes().unwrap().to_vec()
    }

    #[test]
    fn test_switch() {
        assert_eq!(write("1", "true").unwrap(), EncodedValue::Bool(true));
        assert_eq!(write("1", "0").unwrap(), EncodedValue::Bool(false));
        assert_eq!(write("1", 1).unwrap(), EncodedValue::Bool(true));
        assert_eq!(write("1", true).unwrap(), EncodedValue::Bool(true));
        assert_eq!(write("1", 1.0).unwrap(), EncodedValue::Bool(true));

        // Anything else is false, never an error
        assert_eq!(write("1", "TRUE").unwrap(), EncodedValue::Bool(false));
        assert_eq!(write("1", 2).unwrap(), EncodedValue::Bool(false));
        assert_eq!(write("1", "on").unwrap(), EncodedValue::Bool(false));
        assert_eq!(
            write("1", TimeOfDay::new(1, 0, 0, 0)).unwrap(),
            EncodedValue::Bool(false)
        );
    }

    #[test]
    fn test_dimming_object() {
        assert_eq!(bytes("3", DimmerControl::new(true, 5)), [0b0000_1101]);
        assert_eq!(bytes("3", DimmerControl::new(false, 7)), [0x07]);
        assert_eq!(bytes("3", DimmerControl::new(true, 0)), [0x08]);
    }

    #[test]
    fn test_dimming_amount_out_of_range() {
        let err = write("3", DimmerControl::new(true, 8)).unwrap_err();
        assert!(matches!(err, KnxError::InvalidValue(_)));
        assert!(write("3", DimmerControl::new(false, -1)).is_err());
    }

    #[test]
    fn test_dimming_bare_integer() {
        assert_eq!(bytes("3", 0x0D), [0x0D]);
        assert_eq!(bytes("3", 0xFF), [0x0F]);
        assert_eq!(bytes("3", 9.0), [0x09]);
        assert!(write("3", "5").is_err());
        assert!(write("3", 2.5).is_err());
        assert!(write("3", TimeOfDay::default()).is_err());
    }

    #[test]
    fn test_float32_little_endian() {
        let out = bytes("9", "3.14");
        assert_eq!(out.len(), 4);
        let back = f32::from_le_bytes([out[0], out[1], out[2], out[3]]);
        assert_eq!(back, 3.14f32);

        assert_eq!(bytes("9", 1), 1.0f32.to_le_bytes());
        assert_eq!(bytes("9", -21.5), (-21.5f32).to_le_bytes());
        assert_eq!(bytes("9", "20.5 C"), 20.5f32.to_le_bytes());
    }

    #[test]
    fn test_float32_rejects_non_numeric() {
        assert!(matches!(write("9", "warm"), Err(KnxError::InvalidValue(_))));
        assert!(write("9", true).is_err());
        assert!(write("9", DimmerControl::new(true, 1)).is_err());
    }

    #[test]
    fn test_time_shared_by_integer_codes() {
        let time = TimeOfDay::new(1, 23, 59, 59);
        let expected = [0x37, 0x3B, 0x3B];
        for code in ["5", "5.001", "6", "7", "8", "10"] {
            assert_eq!(bytes(code, time), expected, "dpt {code}");
        }
    }

    #[test]
    fn test_time_clamps_fields() {
        assert_eq!(bytes("10", TimeOfDay::new(0, 30, 75, 99)), [0x17, 0x3B, 0x3B]);
        // Day is masked, not clamped
        assert_eq!(bytes("10", TimeOfDay::new(9, 0, 0, 0)), [0x20, 0x00, 0x00]);
    }

    #[test]
    fn test_time_from_integer_bits() {
        let raw: i64 = (2 << 21) | (12 << 16) | (30 << 8) | 15;
        assert_eq!(bytes("10", raw), [0x4C, 0x1E, 0x0F]);
        assert_eq!(bytes("10", raw.to_string()), [0x4C, 0x1E, 0x0F]);

        // Plain small numbers land in the seconds field
        assert_eq!(bytes("5", 42), [0x00, 0x00, 0x2A]);
        // Hours bits 24..=31 clamp to 23
        assert_eq!(bytes("7", 31 << 16), [0x17, 0x00, 0x00]);
    }

    #[test]
    fn test_time_rejects_non_numeric() {
        assert!(write("10", "noon").is_err());
        assert!(write("5", true).is_err());
        assert!(write("10", DimmerControl::new(true, 1)).is_err());
    }

    #[test]
    fn test_string_padding_and_truncation() {
        let out = bytes("16", "KNX");
        assert_eq!(out.len(), 14);
        assert_eq!(&out[..3], b"KNX");
        assert!(out[3..].iter().all(|&b| b == 0));

        let out = bytes("16", "Hello KNX World!");
        assert_eq!(&out[..], b"Hello KNX Worl");
    }

    #[test]
    fn test_string_shared_by_integer_codes() {
        for code in ["12", "13", "16"] {
            let out = bytes(code, 4_294_967_295i64);
            assert_eq!(&out[..10], b"4294967295");
            assert_eq!(&out[10..], [0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_string_latin1() {
        let out = bytes("16", "Grüße");
        assert_eq!(&out[..5], [b'G', b'r', 0xFC, 0xDF, b'e']);
        assert_eq!(bytes("16", true)[..4], *b"true");
        assert_eq!(bytes("16", 1e21)[..6], *b"1e+21\0");
        assert_eq!(bytes("16", 1.5e-7)[..6], *b"1.5e-7");
        assert!(write("16", DimmerControl::new(true, 1)).is_err());
    }

    #[test]
    fn test_scene() {
        assert_eq!(bytes("17", 63), [0x00, 0x3F]);
        assert_eq!(bytes("17", 300), [0x2C, 0x01]);
        assert_eq!(bytes("20", 255), [0x00, 0xFF]);
        assert_eq!(bytes("20", 256), [0x00, 0x01]);
        assert_eq!(bytes("20", 65535), [0xFF, 0xFF]);
        assert_eq!(bytes("17", "12"), [0x00, 0x0C]);
        assert_eq!(bytes("17", "0x1F"), [0x00, 0x1F]);
        assert_eq!(bytes("20", "0x012C"), [0x2C, 0x01]);
    }

    #[test]
    fn test_scene_boundaries() {
        assert_eq!(bytes("17", 65535), [0xFF, 0xFF]);
        assert!(matches!(write("17", 65536), Err(KnxError::InvalidValue(_))));
        assert!(matches!(write("20", 70000), Err(KnxError::InvalidValue(_))));
        assert_eq!(bytes("17", -1), [0x00, 0xFF]);
        assert!(write("17", "scene").is_err());
    }

    #[test]
    fn test_unsupported_dpt() {
        assert!(matches!(write("99", 1), Err(KnxError::UnsupportedDpt(c)) if c == "99"));
        assert!(matches!(write("14", 1.5), Err(KnxError::UnsupportedDpt(_))));
    }

    #[test]
    fn test_action_gate() {
        let v = DptValue::from(1);
        assert_eq!(encode("1", &v, Action::Read).unwrap(), EncodedValue::None);
        assert_eq!(encode("99", &v, Action::Read).unwrap(), EncodedValue::None);
        assert!(matches!(
            encode("1", &v, Action::Response),
            Err(KnxError::UnsupportedAction(Action::Response))
        ));
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let values: [(&str, DptValue); 4] = [
            ("3", DimmerControl::new(true, 3).into()),
            ("9", "21.7".into()),
            ("10", TimeOfDay::new(3, 8, 15, 0).into()),
            ("16", "same".into()),
        ];
        for (dpt, value) in &values {
            let first = encode(dpt, value, Action::Write).unwrap();
            let second = encode(dpt, value, Action::Write).unwrap();
            assert_eq!(first, second);
        }
    }
}
