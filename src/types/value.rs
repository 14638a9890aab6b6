//! Application-level values accepted by the DPT encoder.
//!
//! Callers hand over loosely-typed JSON (`true`, `"3.14"`, `{"c": 1, "amount": 5}`).
//! [`DptValue`] is the explicit tagged form of that input; each packer decides
//! which variants it accepts.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::error::{KnxError, Result};

/// Dimmer step command (DPT 3): direction bit plus step code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimmerControl {
    /// Direction / control bit
    #[serde(rename = "c")]
    pub control: bool,
    /// Step code, valid range 0..=7
    pub amount: i64,
}

impl DimmerControl {
    /// Create a dimmer control value.
    #[inline]
    pub const fn new(control: bool, amount: i64) -> Self {
        Self { control, amount }
    }
}

/// Time of day with weekday (DPT 10 layout).
///
/// Fields are kept unclamped; the packer clamps hours/minutes/seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeOfDay {
    /// Day of week, 0 = no day, 1 = Monday .. 7 = Sunday
    pub day: u32,
    /// Hours 0..=23
    pub hours: u32,
    /// Minutes 0..=59
    pub minutes: u32,
    /// Seconds 0..=59
    pub seconds: u32,
}

impl TimeOfDay {
    /// Create a time of day value.
    #[inline]
    pub const fn new(day: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            day,
            hours,
            minutes,
            seconds,
        }
    }

    /// Extract the fields from a packed integer.
    ///
    /// Bit layout: day 21-23, hours 16-20, minutes 8-13, seconds 0-5.
    #[inline]
    pub const fn from_bits(raw: i64) -> Self {
        Self {
            day: ((raw >> 21) & 0x07) as u32,
            hours: ((raw >> 16) & 0x1F) as u32,
            minutes: ((raw >> 8) & 0x3F) as u32,
            seconds: (raw & 0x3F) as u32,
        }
    }
}

/// Tagged application value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DptValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Text, also used for numbers given as strings
    Text(String),
    /// Dimmer control `{c, amount}`
    Dimmer(DimmerControl),
    /// Time of day `{day, hours, minutes, seconds}`
    Time(TimeOfDay),
}

impl DptValue {
    /// Convert a loosely-typed JSON value.
    ///
    /// Objects with `c` and `amount` become [`DptValue::Dimmer`]; objects with any
    /// of `day`, `hours`, `minutes`, `seconds` become [`DptValue::Time`] with absent
    /// fields set to zero. `null`, arrays and other objects are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => n
                    .as_f64()
                    .map(Self::Float)
                    .ok_or_else(|| KnxError::invalid_value(format!("unrepresentable number {n}"))),
            },
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Object(map) => {
                if map.contains_key("c") && map.contains_key("amount") {
                    let control = bool_like(&map["c"])
                        .ok_or_else(|| KnxError::invalid_value("dimmer field c must be boolean-like"))?;
                    let amount = integral(&map["amount"])
                        .ok_or_else(|| KnxError::invalid_value("dimmer field amount must be an integer"))?;
                    return Ok(Self::Dimmer(DimmerControl::new(control, amount)));
                }
                const TIME_FIELDS: [&str; 4] = ["day", "hours", "minutes", "seconds"];
                if TIME_FIELDS.iter().any(|k| map.contains_key(*k)) {
                    let mut fields = [0u32; 4];
                    for (slot, key) in fields.iter_mut().zip(TIME_FIELDS) {
                        if let Some(v) = map.get(key) {
                            *slot = integral(v)
                                .and_then(|i| u32::try_from(i).ok())
                                .ok_or_else(|| {
                                    KnxError::invalid_value(format!(
                                        "time field {key} must be a non-negative integer"
                                    ))
                                })?;
                        }
                    }
                    let [day, hours, minutes, seconds] = fields;
                    return Ok(Self::Time(TimeOfDay::new(day, hours, minutes, seconds)));
                }
                Err(KnxError::invalid_value("unrecognized object shape"))
            }
            Value::Null => Err(KnxError::invalid_value("value is null")),
            Value::Array(_) => Err(KnxError::invalid_value("arrays are not supported")),
        }
    }

    /// String form of a scalar value, `None` for composite values.
    ///
    /// Integral floats print without a fractional part (`1.0` → `"1"`).
    pub fn text_form(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Self::Int(i) => Some(Cow::Owned(i.to_string())),
            Self::Float(f) => Some(Cow::Owned(float_text(*f))),
            Self::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Dimmer(_) | Self::Time(_) => None,
        }
    }

    /// Integer value if this is an integer or an integral float.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Parse as integer using the leading numeric prefix of the text form.
    ///
    /// Floats truncate toward zero; booleans and composites are rejected.
    pub fn parse_int(&self) -> Result<i64> {
        match self {
            Self::Int(i) => Ok(*i),
            Self::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            Self::Text(s) => int_prefix(s)
                .ok_or_else(|| KnxError::invalid_value(format!("{s:?} is not an integer"))),
            other => Err(KnxError::invalid_value(format!("{other:?} is not an integer"))),
        }
    }

    /// Parse as floating point using the leading numeric prefix of the text form.
    pub fn parse_float(&self) -> Result<f64> {
        match self {
            Self::Int(i) => Ok(*i as f64),
            Self::Float(f) if !f.is_nan() => Ok(*f),
            Self::Text(s) => float_prefix(s)
                .ok_or_else(|| KnxError::invalid_value(format!("{s:?} is not a number"))),
            other => Err(KnxError::invalid_value(format!("{other:?} is not a number"))),
        }
    }
}

impl From<bool> for DptValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for DptValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for DptValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for DptValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DptValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for DptValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DimmerControl> for DptValue {
    fn from(v: DimmerControl) -> Self {
        Self::Dimmer(v)
    }
}

impl From<TimeOfDay> for DptValue {
    fn from(v: TimeOfDay) -> Self {
        Self::Time(v)
    }
}

impl TryFrom<&Value> for DptValue {
    type Error = KnxError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_json(value)
    }
}

fn bool_like(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(false),
            Some(f) if f == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn integral(v: &Value) -> Option<i64> {
    let Value::Number(n) = v else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn float_text(f: f64) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if f == 0.0 {
        // -0 prints as 0
        return "0".to_owned();
    }
    let magnitude = f.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        // Exponent form with an explicit sign: 1e+21, 1.5e-7
        let text = format!("{f:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    f.to_string()
}

/// Length of the `[+-]?digits` prefix, or `None` if there are no digits.
fn signed_digits(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    (digits > 0).then_some(sign + digits)
}

fn int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    if let Some(hex) = hex_prefix(s) {
        return hex;
    }
    let end = signed_digits(s)?;
    let digits = &s[..end];
    // Out-of-range literals saturate
    digits.parse::<i64>().ok().or_else(|| {
        Some(if digits.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        })
    })
}

/// `[+-]?0x<hex digits>`. `Some(None)` when the marker has no digits after it.
fn hex_prefix(s: &str) -> Option<Option<i64>> {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let rest = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))?;
    let len = rest.bytes().take_while(u8::is_ascii_hexdigit).count();
    if len == 0 {
        return Some(None);
    }
    let magnitude = i64::from_str_radix(&rest[..len], 16).unwrap_or(i64::MAX);
    Some(Some(if negative { -magnitude } else { magnitude }))
}

fn float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].replace("Infinity", "inf").parse().ok();
    }

    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        if let Some(exp) = signed_digits(&s[end + 1..]) {
            end += 1 + exp;
        }
    }
    s[..end].parse().ok()
}
