//! Field declarations and per-field directives.
//!
//! A target type lists its fields in declaration order by implementing
//! [`Mirror`]. Each [`Field`] borrows its storage slot and carries the
//! directives attached to it, either through builder methods or a tag string:
//!
//! ```
//! use envmirror::{Field, Mirror, field};
//!
//! #[derive(Default)]
//! struct Settings {
//!     kafka_host: String,
//!     kafka_use_tls: bool,
//!     brokers: Vec<String>,
//! }
//!
//! impl Mirror for Settings {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             field!(self.kafka_host).rename("KAFKA_HOST").required(),
//!             field!(self.kafka_use_tls).tag("rename(KAFKA_USE_TLS)"),
//!             field!(self.brokers).tag("rename(BROKERS), array(;)"),
//!         ]
//!     }
//! }
//! ```

use super::binder::Configurator;
use super::value::{ConfigValue, RawValue};
use crate::error::{ConfigError, ConfigResult};
use serde::Serialize;
use std::any::type_name;

/// Placeholder logged in place of redacted values.
pub const REDACTED_PLACEHOLDER: &str = "*****<REDACTED>*****";

/// Default element delimiter for sequence fields.
pub const DEFAULT_ARRAY_DELIMITER: &str = ",";

/// A single metadata directive attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Skip the field entirely
    Ignore,
    /// Look the field up under another key
    Rename(String),
    /// Absence of a value is fatal
    Required,
    /// Element delimiter; only valid on sequence fields
    Array(String),
    /// Log a placeholder instead of the value
    Redacted,
    /// Raw value used when neither the file nor the environment has one
    Default(String),
}

impl Directive {
    /// Parse a tag string such as `rename(KAFKA_HOST), required, array(;)`.
    ///
    /// Directives are separated by commas or whitespace. Arguments run from
    /// `(` to the next `)` and are taken verbatim, so `array(,)` works.
    pub fn parse_tags(tags: &str) -> Result<Vec<Directive>, String> {
        let mut directives = Vec::new();
        let mut rest = tags;

        loop {
            rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
            if rest.is_empty() {
                break;
            }

            let name_end = rest
                .find(|c: char| c == '(' || c == ',' || c.is_whitespace())
                .unwrap_or(rest.len());
            let name = &rest[..name_end];
            rest = &rest[name_end..];

            let argument = if let Some(after_paren) = rest.strip_prefix('(') {
                let close = after_paren
                    .find(')')
                    .ok_or_else(|| format!("unclosed argument for directive '{}'", name))?;
                rest = &after_paren[close + 1..];
                Some(&after_paren[..close])
            } else {
                None
            };

            directives.push(Self::from_parts(name, argument)?);
        }

        Ok(directives)
    }

    fn from_parts(name: &str, argument: Option<&str>) -> Result<Directive, String> {
        match (name, argument) {
            ("ignore", None) => Ok(Directive::Ignore),
            ("required", None) => Ok(Directive::Required),
            ("redacted", None) => Ok(Directive::Redacted),
            ("array", None) => Ok(Directive::Array(DEFAULT_ARRAY_DELIMITER.to_string())),
            ("array", Some(delimiter)) => Ok(Directive::Array(delimiter.to_string())),
            ("rename", Some(key)) => Ok(Directive::Rename(key.to_string())),
            ("default", Some(value)) => Ok(Directive::Default(value.to_string())),
            ("rename" | "default", None) => Err(format!("directive '{}' needs an argument", name)),
            ("ignore" | "required" | "redacted", Some(_)) => {
                Err(format!("directive '{}' takes no argument", name))
            }
            (other, _) => Err(format!("unknown directive '{}'", other)),
        }
    }
}

/// Per-field metadata after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDirective {
    /// Declared field name
    pub field: String,
    /// Key used for lookup (declared name unless renamed)
    pub lookup_name: String,
    pub required: bool,
    /// Derived from the field's type, never from a directive
    pub is_array: bool,
    pub array_delimiter: String,
    pub redacted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// Write access to a field's storage, type-erased.
pub trait Slot {
    /// Whether the slot holds a sequence.
    fn is_sequence(&self) -> bool;
    /// Whether the literal `null` clears the slot.
    fn is_nullable(&self) -> bool;
    /// Name of the slot's type, for diagnostics.
    fn type_name(&self) -> &'static str;
    /// Convert `raw` and store it.
    fn assign(&mut self, key: &str, raw: RawValue<'_>, configurator: &Configurator)
    -> ConfigResult<()>;
}

impl<T: ConfigValue> Slot for T {
    fn is_sequence(&self) -> bool {
        T::SEQUENCE
    }

    fn is_nullable(&self) -> bool {
        T::NULLABLE
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn assign(
        &mut self,
        key: &str,
        raw: RawValue<'_>,
        configurator: &Configurator,
    ) -> ConfigResult<()> {
        *self = T::bind(key, raw, configurator)?;
        Ok(())
    }
}

/// A declared field: name, storage slot and attached directives.
pub struct Field<'a> {
    name: &'static str,
    slot: &'a mut dyn Slot,
    directives: Vec<Directive>,
    tag_error: Option<String>,
}

impl<'a> Field<'a> {
    /// Declare a field. Prefer the [`field!`](crate::field) macro, which
    /// takes the name from the field identifier.
    pub fn new<T: ConfigValue>(name: &'static str, slot: &'a mut T) -> Self {
        Self {
            name,
            slot,
            directives: Vec::new(),
            tag_error: None,
        }
    }

    pub fn ignore(self) -> Self {
        self.with(Directive::Ignore)
    }

    pub fn rename(self, key: impl Into<String>) -> Self {
        self.with(Directive::Rename(key.into()))
    }

    pub fn required(self) -> Self {
        self.with(Directive::Required)
    }

    pub fn array(self, delimiter: impl Into<String>) -> Self {
        self.with(Directive::Array(delimiter.into()))
    }

    pub fn redacted(self) -> Self {
        self.with(Directive::Redacted)
    }

    pub fn default_value(self, value: impl Into<String>) -> Self {
        self.with(Directive::Default(value.into()))
    }

    /// Attach a directive.
    pub fn with(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    /// Attach directives from a tag string. Parse errors surface when the
    /// field is resolved.
    pub fn tag(mut self, tags: &str) -> Self {
        match Directive::parse_tags(tags) {
            Ok(directives) => self.directives.extend(directives),
            Err(reason) => {
                self.tag_error.get_or_insert(reason);
            }
        }
        self
    }

    /// Declared name of the field.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub(crate) fn slot_mut(&mut self) -> &mut (dyn Slot + 'a) {
        &mut *self.slot
    }

    /// Resolve the field's directives. `None` means the field is ignored.
    ///
    /// When a directive repeats, the last one wins.
    pub fn resolve(&self) -> ConfigResult<Option<FieldDirective>> {
        if self.directives.contains(&Directive::Ignore) {
            return Ok(None);
        }
        if let Some(reason) = &self.tag_error {
            return Err(ConfigError::invalid_directive(self.name, reason.clone()));
        }

        let mut resolved = FieldDirective {
            field: self.name.to_string(),
            lookup_name: self.name.to_string(),
            required: false,
            is_array: self.slot.is_sequence(),
            array_delimiter: DEFAULT_ARRAY_DELIMITER.to_string(),
            redacted: false,
            default_value: None,
        };

        for directive in &self.directives {
            match directive {
                Directive::Ignore => {}
                Directive::Rename(key) => {
                    if key.is_empty() {
                        return Err(ConfigError::invalid_directive(self.name, "empty rename"));
                    }
                    resolved.lookup_name = key.clone();
                }
                Directive::Required => resolved.required = true,
                Directive::Array(delimiter) => {
                    if !resolved.is_array {
                        return Err(ConfigError::ArrayOnScalar {
                            field: self.name.to_string(),
                        });
                    }
                    if delimiter.is_empty() {
                        return Err(ConfigError::invalid_directive(
                            self.name,
                            "empty array delimiter",
                        ));
                    }
                    resolved.array_delimiter = delimiter.clone();
                }
                Directive::Redacted => resolved.redacted = true,
                Directive::Default(value) => resolved.default_value = Some(value.clone()),
            }
        }

        Ok(Some(resolved))
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("type", &self.slot.type_name())
            .field("directives", &self.directives)
            .finish()
    }
}

/// A structure whose fields can be populated by a [`Configurator`].
pub trait Mirror {
    /// The structure's fields in declaration order.
    fn fields(&mut self) -> Vec<Field<'_>>;
}

/// Declare a [`Field`] named after the struct field it borrows.
///
/// `field!(self.kafka_host)` expands to
/// `Field::new("kafka_host", &mut self.kafka_host)`.
#[macro_export]
macro_rules! field {
    ($target:ident . $name:ident) => {
        $crate::Field::new(stringify!($name), &mut $target.$name)
    };
}
