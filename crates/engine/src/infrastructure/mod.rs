//! Infrastructure implementations.
//!
//! Contains port trait definitions and the built-in adapters.

pub mod clock;
pub mod memory;
pub mod ports;
