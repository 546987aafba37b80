//! Kestrel Controller Communication Protocol
//!
//! This crate implements the controller side of the serial link between a
//! microcontroller and its host process. Messages are small, fixed-layout
//! structures; each travels in one packet with COBS byte stuffing and a
//! trailing CRC, and no allocation happens anywhere on the path.
//!
//! # Packet Format
//!
//! ```text
//! ┌───────┬────────┬──────────┬──────────────────┬───────────┬──────────┐
//! │ START │ LENGTH │ OVERHEAD │ COBS(PAYLOAD)    │ DELIMITER │ CRC      │
//! │ 1B    │ 1B     │ 1B       │ 1–254B           │ 1B (0x00) │ 1/2/4B   │
//! └───────┴────────┴──────────┴──────────────────┴───────────┴──────────┘
//! ```
//!
//! The first payload byte is the [`Protocol`] code that selects the header
//! layout following it. Module data and parameter messages append an object
//! after the header.
//!
//! # Layers
//!
//! - [`cobs`] / [`crc`] - byte stuffing and checksums
//! - [`transport`] - framing, reception state machine, object read/write
//! - [`messages`] / [`prototypes`] - the closed set of message layouts
//! - [`communication`] - message-level send, receive and parameter extraction

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod cobs;
pub mod communication;
pub mod config;
pub mod crc;
pub mod messages;
pub mod prototypes;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod mock;

pub use communication::{Communication, CommunicationError, CommunicationStatus};
pub use config::{ConfigError, CrcConfig, TransportConfig};
pub use crc::CrcProcessor;
pub use messages::{DynamicRuntimeParameters, InboundMessage, Protocol, Scope, ServiceProtocol};
pub use prototypes::{Prototype, ScalarKind};
pub use transport::{TransportError, TransportLayer, TransportStatus};
pub use wire::Wire;
