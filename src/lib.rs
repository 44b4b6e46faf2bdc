//! envmirror library
//!
//! Loads key/value pairs from a `.env`-style file and the process environment
//! and mirrors them onto typed structures.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod service;

pub use config::{
    AdapterRegistry, ConfigSource, ConfigValue, Configurator, Directive, Field, FieldDirective,
    Mirror,
};
pub use error::{ConfigError, ConfigResult, ErrorCode};
