//! AutoBot Common Library
//!
//! This crate provides the channel identities, value types, error taxonomy,
//! wire constants and configuration loading shared by the AutoBot crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Wire protocol constants and defaults
//! - [`hal`] - Channels, values, HAL errors, the `Transport` trait and HAL configuration
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! autobot_common = { path = "../autobot_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use autobot_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
