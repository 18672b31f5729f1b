//! Service configuration.
//!
//! This module provides the options model bound from host configuration,
//! its YAML loader, and validation.

mod error;
mod options;

pub use error::ConfigError;
pub use options::{ContractVersion, ServiceOptions, ValueProcessor};
