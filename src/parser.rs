//! DPT payload decoder.
//!
//! The inverse of the packers in [`crate::codec`]. Inbound bus data is
//! forwarded opaquely by the node layer; this is for callers that know which
//! DPT a group address carries.

use crate::error::{KnxError, Result};
use crate::types::{DimmerControl, DptValue, Packer, Registry, TimeOfDay};

/// Decode a payload for the given DPT code.
///
/// # Example
///
/// ```rust
/// use knx_dpt::{decode, DptValue, TimeOfDay};
///
/// let value = decode("10", &[0x37, 0x3B, 0x3B])?;
/// assert_eq!(value, DptValue::Time(TimeOfDay::new(1, 23, 59, 59)));
/// # Ok::<(), knx_dpt::KnxError>(())
/// ```
pub fn decode(dpt: &str, data: &[u8]) -> Result<DptValue> {
    let rule = Registry::lookup(dpt)?;

    match rule.packer {
        Packer::Switch => decode_switch(data),
        Packer::Dimming => decode_dimming(data),
        Packer::Float32 => decode_float(data),
        Packer::TimeOfDay => decode_time(data),
        Packer::String14 => decode_string(data),
        Packer::Scene => decode_scene(data),
    }
}

/// Check that a payload has exactly `width` bytes.
fn expect_len(data: &[u8], width: usize) -> Result<()> {
    if data.len() != width {
        return Err(KnxError::invalid_value(format!(
            "expected {width} payload bytes, got {}",
            data.len()
        )));
    }
    Ok(())
}

/// Switch value lives in the low bit of the first byte.
fn decode_switch(data: &[u8]) -> Result<DptValue> {
    let byte = data
        .first()
        .ok_or_else(|| KnxError::invalid_value("empty switch payload"))?;
    Ok(DptValue::Bool(byte & 0x01 != 0))
}

fn decode_dimming(data: &[u8]) -> Result<DptValue> {
    expect_len(data, 1)?;
    Ok(DptValue::Dimmer(DimmerControl::new(
        data[0] & 0x08 != 0,
        (data[0] & 0x07) as i64,
    )))
}

fn decode_float(data: &[u8]) -> Result<DptValue> {
    expect_len(data, 4)?;
    let value = f32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    Ok(DptValue::Float(value as f64))
}

fn decode_time(data: &[u8]) -> Result<DptValue> {
    expect_len(data, 3)?;
    Ok(DptValue::Time(TimeOfDay::new(
        (data[0] >> 5) as u32,
        (data[0] & 0x1F) as u32,
        (data[1] & 0x3F) as u32,
        (data[2] & 0x3F) as u32,
    )))
}

/// Latin-1 text up to the first NUL.
fn decode_string(data: &[u8]) -> Result<DptValue> {
    if data.len() > crate::codec::STRING_LENGTH {
        return Err(KnxError::invalid_value(format!(
            "string payload of {} bytes exceeds {}",
            data.len(),
            crate::codec::STRING_LENGTH
        )));
    }
    let text = data
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect();
    Ok(DptValue::Text(text))
}

/// A zero high byte marks the short form `[0x00, value]`.
///
/// Little-endian values whose low byte is zero (256, 512, ...) therefore
/// decode as the short form; the encoding is ambiguous there.
fn decode_scene(data: &[u8]) -> Result<DptValue> {
    expect_len(data, 2)?;
    let value = if data[0] == 0x00 {
        data[1] as u16
    } else {
        u16::from_le_bytes([data[0], data[1]])
    };
    Ok(DptValue::Int(value as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::types::Action;

    #[test]
    fn test_decode_switch() {
        assert_eq!(decode("1", &[0x01]).unwrap(), DptValue::Bool(true));
        assert_eq!(decode("1", &[0x80]).unwrap(), DptValue::Bool(false));
        assert!(decode("1", &[]).is_err());
    }

    #[test]
    fn test_decode_dimming() {
        assert_eq!(
            decode("3", &[0x0D]).unwrap(),
            DptValue::Dimmer(DimmerControl::new(true, 5))
        );
        assert!(decode("3", &[0x0D, 0x00]).is_err());
    }

    #[test]
    fn test_decode_float() {
        let payload = 3.14f32.to_le_bytes();
        match decode("9", &payload).unwrap() {
            DptValue::Float(v) => assert!((v - 3.14).abs() < 1e-6),
            other => panic!("Expected Float, got {other:?}"),
        }
        assert!(decode("9", &payload[..2]).is_err());
    }

    #[test]
    fn test_decode_time_for_shared_codes() {
        for code in ["5", "5.001", "6", "7", "8", "10"] {
            assert_eq!(
                decode(code, &[0x37, 0x3B, 0x3B]).unwrap(),
                DptValue::Time(TimeOfDay::new(1, 23, 59, 59))
            );
        }
    }

    #[test]
    fn test_decode_string() {
        let mut payload = [0u8; 14];
        payload[..3].copy_from_slice(b"KNX");
        assert_eq!(decode("16", &payload).unwrap(), DptValue::Text("KNX".into()));
        assert_eq!(decode("12", &[0xFC]).unwrap(), DptValue::Text("ü".into()));
        assert!(decode("13", &[b'a'; 15]).is_err());
    }

    #[test]
    fn test_decode_scene() {
        assert_eq!(decode("17", &[0x00, 0x3F]).unwrap(), DptValue::Int(63));
        assert_eq!(decode("20", &[0x2C, 0x01]).unwrap(), DptValue::Int(300));
        // Ambiguous with the short form
        assert_eq!(decode("17", &[0x00, 0x01]).unwrap(), DptValue::Int(1));
    }

    #[test]
    fn test_decode_unknown_dpt() {
        assert!(matches!(decode("99", &[0x00]), Err(KnxError::UnsupportedDpt(_))));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let cases: [(&str, DptValue); 4] = [
            ("3", DptValue::Dimmer(DimmerControl::new(false, 4))),
            ("10", DptValue::Time(TimeOfDay::new(7, 6, 5, 4))),
            ("16", DptValue::Text("Living room".into())),
            ("17", DptValue::Int(1000)),
        ];
        for (dpt, value) in cases {
            let encoded = encode(dpt, &value, Action::Write).unwrap();
            let decoded = decode(dpt, encoded.as_bytes().unwrap()).unwrap();
            assert_eq!(decoded, value, "dpt {dpt}");
        }
    }
}
