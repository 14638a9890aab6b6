//! Datapoint type codes and the DPT registry.
//!
//! The registry is a fixed table keyed by the textual DPT code. Several codes
//! share one packer: `5`, `5.001`, `6`, `7`, `8` and `10` all go through the
//! time-of-day packer, `12`, `13` and `16` through the 14-byte string packer.

use std::str::FromStr;

use serde_json::Value;

use crate::error::{KnxError, Result};

/// Default DPT code when the caller omits one (switch).
pub const DEFAULT_DPT: &str = "1";

/// Datapoint type code, e.g. `"1"`, `"5.001"`, `"9"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DptCode(String);

impl DptCode {
    /// Create a DPT code from text.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Read a code given as a JSON string or number (`"9"` or `9`).
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self(s.clone())),
            Value::Number(n) => Ok(Self(match n.as_f64() {
                Some(f) if n.as_i64().is_none() && n.as_u64().is_none() => f.to_string(),
                _ => n.to_string(),
            })),
            other => Err(KnxError::UnsupportedDpt(other.to_string())),
        }
    }

    /// The code as text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Main number of the code (`"5.001"` → `"5"`).
    pub fn main(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }

    /// Registry rule for this code.
    pub fn rule(&self) -> Result<&'static EncodeRule> {
        Registry::lookup(&self.0)
    }
}

impl Default for DptCode {
    fn default() -> Self {
        Self(DEFAULT_DPT.to_owned())
    }
}

impl FromStr for DptCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<&str> for DptCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Display for DptCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expected input shape of an encode rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Boolean, number or numeric text
    Scalar,
    /// `{c, amount}` or a bare integer
    Dimmer,
    /// `{day, hours, minutes, seconds}` or a packed integer
    Time,
    /// Anything with a text form
    RawString,
}

/// Packing routine selected by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packer {
    /// Boolean switch, no payload bytes
    Switch,
    /// 4-bit dimmer control in one byte
    Dimming,
    /// IEEE-754 single precision, little-endian
    Float32,
    /// 3-byte time of day
    TimeOfDay,
    /// 14-byte zero padded Latin-1 string
    String14,
    /// 2-byte scene / HVAC value
    Scene,
}

impl Packer {
    /// Payload width in bytes (0 for bit-packed booleans).
    #[inline]
    pub const fn byte_width(&self) -> usize {
        match self {
            Self::Switch => 0,
            Self::Dimming => 1,
            Self::Float32 => 4,
            Self::TimeOfDay => 3,
            Self::String14 => 14,
            Self::Scene => 2,
        }
    }

    /// Input shape the packer accepts.
    #[inline]
    pub const fn shape(&self) -> ValueShape {
        match self {
            Self::Switch | Self::Float32 | Self::Scene => ValueShape::Scalar,
            Self::Dimming => ValueShape::Dimmer,
            Self::TimeOfDay => ValueShape::Time,
            Self::String14 => ValueShape::RawString,
        }
    }
}

/// Encode rule for one DPT code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeRule {
    /// DPT code this rule answers to
    pub code: &'static str,
    /// Human readable KNX function name
    pub name: &'static str,
    /// Packing routine
    pub packer: Packer,
}

impl EncodeRule {
    const fn new(code: &'static str, name: &'static str, packer: Packer) -> Self {
        Self { code, name, packer }
    }

    /// Payload width in bytes.
    #[inline]
    pub const fn byte_width(&self) -> usize {
        self.packer.byte_width()
    }

    /// Expected input shape.
    #[inline]
    pub const fn shape(&self) -> ValueShape {
        self.packer.shape()
    }
}

impl std::fmt::Display for EncodeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DPT {} ({})", self.code, self.name)
    }
}

static RULES: [EncodeRule; 14] = [
    EncodeRule::new("1", "Switch", Packer::Switch),
    EncodeRule::new("3", "Dimming control", Packer::Dimming),
    EncodeRule::new("5", "8-bit unsigned value", Packer::TimeOfDay),
    EncodeRule::new("5.001", "Percentage", Packer::TimeOfDay),
    EncodeRule::new("6", "8-bit signed value", Packer::TimeOfDay),
    EncodeRule::new("7", "16-bit unsigned value", Packer::TimeOfDay),
    EncodeRule::new("8", "16-bit signed value", Packer::TimeOfDay),
    EncodeRule::new("9", "Floating point", Packer::Float32),
    EncodeRule::new("10", "Time", Packer::TimeOfDay),
    EncodeRule::new("12", "32-bit unsigned value", Packer::String14),
    EncodeRule::new("13", "32-bit signed value", Packer::String14),
    EncodeRule::new("16", "14 character ASCII", Packer::String14),
    EncodeRule::new("17", "Scene", Packer::Scene),
    EncodeRule::new("20", "HVAC mode", Packer::Scene),
];

/// Immutable DPT registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry;

impl Registry {
    /// Look up the rule for a code by exact string match.
    pub fn lookup(code: &str) -> Result<&'static EncodeRule> {
        RULES
            .iter()
            .find(|rule| rule.code == code)
            .ok_or_else(|| KnxError::UnsupportedDpt(code.to_owned()))
    }

    /// Check whether a code is supported.
    #[inline]
    pub fn contains(code: &str) -> bool {
        RULES.iter().any(|rule| rule.code == code)
    }

    /// All supported rules in registry order.
    #[inline]
    pub fn rules() -> &'static [EncodeRule] {
        &RULES
    }
}
