//! Kestrel Hardware Abstraction Layer
//!
//! This crate defines the few hardware collaborators the communication stack
//! needs from the board: a byte stream to the host, a diagnostic output pin and
//! a monotonic microsecond clock. Chip-specific code implements these traits,
//! or uses the adapters behind the `embedded-io`, `embedded-hal` and
//! `embassy-time` features.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  kestrel-protocol (Communication)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  kestrel-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  board UART / │       │  embedded-io, │
//! │  USB CDC impl │       │  embassy-time │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialStream`] - Pollable byte stream to the host
//! - [`gpio::OutputPin`] - Digital output (fault indicator)
//! - [`clock::MonotonicClock`] - Microsecond time source

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::MonotonicClock;
pub use gpio::OutputPin;
pub use uart::SerialStream;
