//! KNX group addresses.

use std::str::FromStr;

use crate::error::{KnxError, Result};

/// Three-level group address `main/middle/sub`.
///
/// Packed into 16 bits: main (5 bits), middle (3 bits), sub (8 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct GroupAddress(u16);

impl GroupAddress {
    /// Create from the three address levels.
    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self> {
        if main > 31 {
            return Err(KnxError::InvalidAddress(format!("main must be 0-31, got {main}")));
        }
        if middle > 7 {
            return Err(KnxError::InvalidAddress(format!(
                "middle must be 0-7, got {middle}"
            )));
        }
        Ok(Self(((main as u16) << 11) | ((middle as u16) << 8) | sub as u16))
    }

    /// Main group (0-31).
    #[inline]
    pub const fn main(&self) -> u8 {
        ((self.0 >> 11) & 0x1F) as u8
    }

    /// Middle group (0-7).
    #[inline]
    pub const fn middle(&self) -> u8 {
        ((self.0 >> 8) & 0x07) as u8
    }

    /// Sub group (0-255).
    #[inline]
    pub const fn sub(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Raw 16-bit value.
    #[inline]
    pub const fn raw(&self) -> u16 {
        self.0
    }
}

impl From<u16> for GroupAddress {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl FromStr for GroupAddress {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let [main, middle, sub] = parts[..] else {
            return Err(KnxError::InvalidAddress(s.to_owned()));
        };

        let level = |part: &str| {
            part.parse::<u8>()
                .map_err(|_| KnxError::InvalidAddress(s.to_owned()))
        };
        Self::new(level(main)?, level(middle)?, level(sub)?)
    }
}

impl std::fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}
