//! Telegram actions and their resolution from message topics.

use std::str::FromStr;

use crate::error::{KnxError, Result};

/// Semantic operation a group telegram performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// GroupValue_Write
    #[default]
    Write,
    /// GroupValue_Read (status request)
    Read,
    /// GroupValue_Response
    Response,
}

impl Action {
    /// Lowercase action name as used in topics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Read => "read",
            Self::Response => "response",
        }
    }

    /// Check if this action carries an encoded payload.
    #[inline]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "write" => Ok(Self::Write),
            "read" => Ok(Self::Read),
            "response" => Ok(Self::Response),
            other => Err(KnxError::invalid_value(format!("unknown action {other:?}"))),
        }
    }
}

/// Resolve the action for a message topic.
///
/// Matching is by case-sensitive substring, first hit wins:
/// `"read"` → [`Action::Read`], `"respon"` → [`Action::Response`],
/// anything else → [`Action::Write`]. A request without a value is always a read.
pub fn resolve_action(topic: &str, has_value: bool) -> Action {
    if !has_value {
        return Action::Read;
    }
    if topic.contains("read") {
        Action::Read
    } else if topic.contains("respon") {
        Action::Response
    } else {
        Action::Write
    }
}
