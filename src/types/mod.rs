//! KNX type definitions.
//!
//! This module contains the core types shared by the codec and the node layer:
//!
//! - `DptCode` / `Registry` - Datapoint type codes and their encode rules
//! - `DptValue` - Tagged application value
//! - `Action` - Write / read / response, resolved from message topics
//! - `GroupAddress` - Three-level group address
//! - `Telegram` / `EncodedValue` - What is handed to the bus transport

mod action;
mod address;
mod dpt;
mod telegram;
mod value;

pub use action::*;
pub use address::*;
pub use dpt::*;
pub use telegram::*;
pub use value::*;
