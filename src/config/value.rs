//! Coercion of raw strings into typed field values.
//!
//! Text, booleans, integers, floats and paths are understood natively. Any
//! other type opts in with an empty `impl ConfigValue for MyType {}` and is
//! converted by the adapter registered for it.

use super::binder::Configurator;
use crate::error::{ConfigError, ConfigResult};
use std::path::PathBuf;

/// Raw value handed to a field after lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue<'a> {
    /// A single value, for scalar fields
    Text(&'a str),
    /// The value split on the field's delimiter, for sequence fields
    List(Vec<&'a str>),
    /// The literal `null`, only produced for nullable fields
    Null,
}

/// A type the binder can write into a field.
pub trait ConfigValue: Sized + 'static {
    /// Whether the field holds a sequence of elements.
    const SEQUENCE: bool = false;
    /// Whether the literal `null` clears the field.
    const NULLABLE: bool = false;

    /// Convert a single raw string. The default asks the adapter registry.
    fn coerce(key: &str, raw: &str, configurator: &Configurator) -> ConfigResult<Self> {
        configurator.adapters().adapt::<Self>(key, raw, configurator)
    }

    /// Convert a looked-up value into the field's type.
    fn bind(key: &str, raw: RawValue<'_>, configurator: &Configurator) -> ConfigResult<Self> {
        match raw {
            RawValue::Text(text) => Self::coerce(key, text, configurator),
            other => Err(ConfigError::Internal(format!(
                "scalar field {} received {:?}",
                key, other
            ))),
        }
    }
}

impl ConfigValue for String {
    fn coerce(_key: &str, raw: &str, _configurator: &Configurator) -> ConfigResult<Self> {
        Ok(raw.to_string())
    }
}

impl ConfigValue for PathBuf {
    fn coerce(_key: &str, raw: &str, _configurator: &Configurator) -> ConfigResult<Self> {
        Ok(PathBuf::from(raw))
    }
}

/// Permissive: anything other than a case-insensitive `true` is `false`.
impl ConfigValue for bool {
    fn coerce(_key: &str, raw: &str, _configurator: &Configurator) -> ConfigResult<Self> {
        Ok(raw.eq_ignore_ascii_case("true"))
    }
}

macro_rules! numeric_config_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConfigValue for $ty {
                fn coerce(key: &str, raw: &str, _configurator: &Configurator) -> ConfigResult<Self> {
                    raw.parse::<$ty>()
                        .map_err(|err| ConfigError::number_format(key, raw, stringify!($ty), err))
                }
            }
        )*
    };
}

numeric_config_value!(i32, i64, u16, u32, u64, usize, f32, f64);

impl<T: ConfigValue> ConfigValue for Vec<T> {
    const SEQUENCE: bool = true;

    fn bind(key: &str, raw: RawValue<'_>, configurator: &Configurator) -> ConfigResult<Self> {
        match raw {
            RawValue::List(items) => items
                .into_iter()
                .map(|item| T::coerce(key, item, configurator))
                .collect(),
            RawValue::Text(text) => Self::coerce(key, text, configurator),
            RawValue::Null => Err(ConfigError::Internal(format!(
                "sequence field {} received null",
                key
            ))),
        }
    }
}

impl<T: ConfigValue> ConfigValue for Option<T> {
    const SEQUENCE: bool = T::SEQUENCE;
    const NULLABLE: bool = true;

    fn coerce(key: &str, raw: &str, configurator: &Configurator) -> ConfigResult<Self> {
        T::coerce(key, raw, configurator).map(Some)
    }

    fn bind(key: &str, raw: RawValue<'_>, configurator: &Configurator) -> ConfigResult<Self> {
        match raw {
            RawValue::Null => Ok(None),
            other => T::bind(key, other, configurator).map(Some),
        }
    }
}

/// Split a raw sequence value. Trailing empty parts are dropped, so an empty
/// value is an empty sequence and `"a,b,"` is `["a", "b"]`. Interior empty
/// parts are kept.
pub fn split_elements<'a>(raw: &'a str, delimiter: &str) -> Vec<&'a str> {
    let mut parts: Vec<&str> = raw.split(delimiter).collect();
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    parts
}
