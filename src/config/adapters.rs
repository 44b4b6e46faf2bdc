//! Registry of conversion functions for types the binder does not understand
//! natively.
//!
//! The registry is an explicit object shared between binders as
//! `Arc<AdapterRegistry>`. Registrations are additive for the lifetime of the
//! registry; registering the same type again replaces the previous adapter.

use super::binder::Configurator;
use crate::error::{ConfigError, ConfigResult};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Type-erased adapter: `(lookup name, raw value, binder) -> value`.
pub type AdapterFn =
    Arc<dyn Fn(&str, &str, &Configurator) -> anyhow::Result<Box<dyn Any>> + Send + Sync>;

#[derive(Clone)]
struct Registered {
    type_name: &'static str,
    adapter: AdapterFn,
}

/// Process-wide mapping from target type to conversion function.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<TypeId, Registered>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the adapter for `T`. The latest registration wins.
    pub fn register<T, F>(&self, adapter: F)
    where
        T: 'static,
        F: Fn(&str, &str, &Configurator) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let erased: AdapterFn = Arc::new(
            move |key: &str, raw: &str, configurator: &Configurator| {
                adapter(key, raw, configurator).map(|value| Box::new(value) as Box<dyn Any>)
            },
        );
        let entry = Registered {
            type_name: type_name::<T>(),
            adapter: erased,
        };

        let mut adapters = self
            .adapters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if adapters.insert(TypeId::of::<T>(), entry).is_some() {
            debug!("Replaced adapter for {}", type_name::<T>());
        } else {
            debug!("Registered adapter for {}", type_name::<T>());
        }
    }

    /// Look up the adapter registered for a type.
    pub fn resolve(&self, type_id: TypeId) -> Option<AdapterFn> {
        self.adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .map(|entry| Arc::clone(&entry.adapter))
    }

    /// Whether an adapter is registered for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.resolve(TypeId::of::<T>()).is_some()
    }

    /// Names of the registered types, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|entry| entry.type_name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert `raw` into `T` with the registered adapter.
    ///
    /// The lock is released before the adapter runs, so adapters may perform
    /// nested lookups or register further adapters.
    pub(crate) fn adapt<T: 'static>(
        &self,
        key: &str,
        raw: &str,
        configurator: &Configurator,
    ) -> ConfigResult<T> {
        let Some(adapter) = self.resolve(TypeId::of::<T>()) else {
            return Err(ConfigError::no_adapter(key, type_name::<T>()));
        };

        let value = adapter(key, raw, configurator)
            .map_err(|err| ConfigError::adapter_failed(key, type_name::<T>(), err))?;

        value.downcast::<T>().map(|value| *value).map_err(|_| {
            ConfigError::Internal(format!(
                "adapter for {} returned a value of another type",
                type_name::<T>()
            ))
        })
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
