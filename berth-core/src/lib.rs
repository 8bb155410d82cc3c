//! Core types for the berth service topology synthesizer.
//!
//! Defines the closed service set and its port offsets, the allocated
//! port map, secrets, claims, and signed tokens. No I/O happens here.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod claims;
pub mod error;
pub mod ports;
pub mod secret;
pub mod service;
pub mod token;

pub use claims::{Claims, Role};
pub use error::CoreError;
pub use ports::PortMap;
pub use secret::Secret;
pub use service::{Service, Topology};
pub use token::Token;
