//! # knx_dpt
//!
//! KNX datapoint type (DPT) codec for Rust.
//!
//! This crate converts application values into the fixed-width payloads a KNX
//! group telegram carries, and provides the flow-node glue that turns loosely
//! typed messages into telegrams for an external bus transport.
//!
//! ## Features
//!
//! - **Pure codec**: stateless `encode` / `decode`, safe to call from anywhere
//! - **Fixed registry**: exact-match lookup of DPT codes, unknown codes are errors
//! - **Explicit values**: JSON input is mapped to a tagged [`DptValue`]
//! - **Node glue**: shared controller connection, `knx-out` and `knx-in` nodes
//!
//! ## Quick Start
//!
//! ```rust
//! use knx_dpt::{encode, resolve_action, Action, DptValue, TimeOfDay};
//!
//! let action = resolve_action("knx:write", true);
//! assert_eq!(action, Action::Write);
//!
//! let payload = encode("10", &TimeOfDay::new(1, 23, 59, 59).into(), action)?;
//! assert_eq!(payload.as_bytes(), Some(&[0x37, 0x3B, 0x3B][..]));
//!
//! let payload = encode("17", &DptValue::from(300), action)?;
//! assert_eq!(payload.as_bytes(), Some(&[0x2C, 0x01][..]));
//! # Ok::<(), knx_dpt::KnxError>(())
//! ```
//!
//! ## Supported DPTs
//!
//! ```text
//! Code                      Payload    Packing
//! 1                         bit        "true" / "1" → true
//! 3                         1 byte     control bit 3, step 0-2
//! 9                         4 bytes    IEEE-754 single, little-endian
//! 5 5.001 6 7 8 10          3 bytes    time of day (day/hours, minutes, seconds)
//! 12 13 16                  14 bytes   Latin-1 text, zero padded
//! 17 20                     2 bytes    [0, v] up to 255, little-endian u16 above
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

// Logging goes through tracing when `tracing-support` is enabled and
// compiles to nothing otherwise.
#[cfg(feature = "tracing-support")]
macro_rules! debug { ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }; }
#[cfg(feature = "tracing-support")]
macro_rules! info { ($($arg:tt)*) => { ::tracing::info!($($arg)*) }; }
#[cfg(feature = "tracing-support")]
macro_rules! warn { ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }; }
#[cfg(feature = "tracing-support")]
macro_rules! error { ($($arg:tt)*) => { ::tracing::error!($($arg)*) }; }

#[cfg(not(feature = "tracing-support"))]
macro_rules! debug { ($($arg:tt)*) => { if false { let _ = ::std::format!($($arg)*); } }; }
#[cfg(not(feature = "tracing-support"))]
macro_rules! info { ($($arg:tt)*) => { if false { let _ = ::std::format!($($arg)*); } }; }
#[cfg(not(feature = "tracing-support"))]
macro_rules! warn { ($($arg:tt)*) => { if false { let _ = ::std::format!($($arg)*); } }; }
#[cfg(not(feature = "tracing-support"))]
macro_rules! error { ($($arg:tt)*) => { if false { let _ = ::std::format!($($arg)*); } }; }

pub mod codec;
pub mod controller;
pub mod error;
pub mod message;
pub mod node;
pub mod parser;
pub mod types;

// Re-export main types
pub use codec::{encode, pack};
pub use controller::{
    BusConnection, BusData, BusNotification, ConnectionMode, Connector, Controller,
    ControllerConfig, NodeStatus,
};
pub use error::{KnxError, Result};
pub use message::{InboundKind, InboundMessage, InboundPayload, OutboundRequest};
pub use node::{InNode, OutNode};
pub use parser::decode;
pub use types::*;
