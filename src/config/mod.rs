//! Declarative environment-configuration binding.
//!
//! Binding runs in one pass at startup:
//! 1. **Source** - a flat `KEY=VALUE` file, keys matched case-insensitively
//! 2. **Fallback** - the process environment, queried by exact name (optional)
//! 3. **Default** - a `default(...)` directive on the field
//!
//! ## Directives
//! - `ignore` - skip the field entirely
//! - `rename(KEY)` - look the field up under `KEY`
//! - `required` - a missing value is fatal
//! - `array(DELIM)` - element delimiter, only on sequence fields (default `,`)
//! - `redacted` - log a placeholder instead of the value
//! - `default(VALUE)` - raw value used when nothing else provides one
//!
//! ## Native types
//! `String`, `PathBuf`, `bool`, `i32`, `i64`, `u16`, `u32`, `u64`, `usize`,
//! `f32`, `f64`, plus `Vec<T>` and `Option<T>` of those. Everything else goes
//! through the [`AdapterRegistry`].

mod adapters;
mod binder;
mod directive;
mod source;
mod value;

pub use adapters::{AdapterFn, AdapterRegistry};
pub use binder::{Configurator, FieldReport, ValueOrigin, log_value};
pub use directive::{
    DEFAULT_ARRAY_DELIMITER, Directive, Field, FieldDirective, Mirror, REDACTED_PLACEHOLDER, Slot,
};
pub use source::ConfigSource;
pub use value::{ConfigValue, RawValue, split_elements};
