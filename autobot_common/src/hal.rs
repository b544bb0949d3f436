//! Hardware abstraction layer types and configuration.
//!
//! This module contains the channel identities, value types, the `Transport`
//! trait and `HalError`, and the configuration types of the AutoBot HAL.

pub mod channel;
pub mod config;
pub mod driver;
pub mod types;
