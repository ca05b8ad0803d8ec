//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the asset viewer core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Asset event bus
//!
//! ## Overview
//!
//! This crate holds the ambient pieces every other core crate leans on. It
//! establishes the logging conventions, the fail-fast configuration builder and
//! the broadcast channel used to observe asset loading from outside the
//! provider.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
