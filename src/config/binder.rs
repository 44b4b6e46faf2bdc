//! The configurator: lookup, coercion and assignment of declared fields.

use super::adapters::AdapterRegistry;
use super::directive::{FieldDirective, Mirror, REDACTED_PLACEHOLDER};
use super::source::ConfigSource;
use super::value::{RawValue, split_elements};
use crate::error::{ConfigError, ConfigResult};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

/// Where a looked-up value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrigin {
    /// The config file
    File,
    /// The process environment fallback
    Environment,
    /// A `default(...)` directive
    Default,
}

impl std::fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueOrigin::File => write!(f, "file"),
            ValueOrigin::Environment => write!(f, "environment"),
            ValueOrigin::Default => write!(f, "default"),
        }
    }
}

/// How a single field would be bound, with the value made log-safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    #[serde(flatten)]
    pub directive: FieldDirective,
    /// None when no value was found
    pub origin: Option<ValueOrigin>,
    /// Log-safe rendering of the value (placeholder when redacted)
    pub value: Option<String>,
}

/// Binds values from a [`ConfigSource`] (and optionally the process
/// environment) onto structures implementing [`Mirror`].
#[derive(Debug, Clone)]
pub struct Configurator {
    source: Arc<ConfigSource>,
    adapters: Arc<AdapterRegistry>,
    allow_system_environment: bool,
}

impl Configurator {
    /// Conventional config file in the working directory.
    pub const DEFAULT_PATH: &'static str = ".env";

    /// Create a configurator reading `.env` from the working directory.
    pub fn create() -> ConfigResult<Self> {
        Self::from_path(Self::DEFAULT_PATH)
    }

    /// Create a configurator reading the given file. A missing file is an
    /// empty source.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Ok(Self::from_source(ConfigSource::load(path)?))
    }

    /// Create a configurator over an already parsed source, with a fresh
    /// adapter registry.
    pub fn from_source(source: ConfigSource) -> Self {
        Self {
            source: Arc::new(source),
            adapters: Arc::new(AdapterRegistry::new()),
            allow_system_environment: true,
        }
    }

    /// Share an adapter registry with other configurators.
    pub fn with_adapters(mut self, adapters: Arc<AdapterRegistry>) -> Self {
        self.adapters = adapters;
        self
    }

    /// Enable or disable the process-environment fallback (enabled by default).
    pub fn allow_default_to_system_environment(mut self, allow: bool) -> Self {
        self.allow_system_environment = allow;
        self
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    /// Shared handle to the adapter registry.
    pub fn adapters_handle(&self) -> Arc<AdapterRegistry> {
        Arc::clone(&self.adapters)
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn allows_system_environment(&self) -> bool {
        self.allow_system_environment
    }

    /// Look up `key` case-insensitively in the file, then (if allowed) by its
    /// exact name in the process environment.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|(value, _)| value)
    }

    /// Like [`get`](Self::get), also reporting where the value came from.
    pub fn lookup(&self, key: &str) -> Option<(String, ValueOrigin)> {
        if let Some(value) = self.source.get(key) {
            return Some((value.to_string(), ValueOrigin::File));
        }

        if self.allow_system_environment {
            // Non-unicode values are treated as absent
            return std::env::var(key)
                .ok()
                .map(|value| (value, ValueOrigin::Environment));
        }

        None
    }

    /// Populate the target's fields in declaration order.
    ///
    /// Directives of every field are resolved before the first lookup. The
    /// pass stops at the first error; fields assigned before it keep their
    /// new values.
    pub fn mirror<T: Mirror + ?Sized>(&self, target: &mut T) -> ConfigResult<()> {
        let mut fields = target.fields();
        let directives = fields
            .iter()
            .map(|field| field.resolve())
            .collect::<ConfigResult<Vec<_>>>()?;

        for (field, directive) in fields.iter_mut().zip(directives) {
            let Some(directive) = directive else {
                continue;
            };

            let Some((value, origin)) = self.resolve_value(&directive) else {
                if directive.required {
                    return Err(ConfigError::MissingRequired {
                        field: directive.field.clone(),
                        key: directive.lookup_name.clone(),
                    });
                }
                continue;
            };

            let slot = field.slot_mut();
            let raw = raw_value(&directive, &value, slot.is_nullable());
            debug!(
                origin = %origin,
                "Setting variable {}={}",
                directive.lookup_name,
                log_value(&directive, &raw)
            );

            slot.assign(&directive.lookup_name, raw, self)
                .map_err(|err| {
                    let err = err.with_field(&directive.field);
                    if directive.redacted {
                        err.redact(REDACTED_PLACEHOLDER)
                    } else {
                        err
                    }
                })?;
        }

        Ok(())
    }

    /// Mirror, and terminate the process with status 1 on failure.
    ///
    /// For startup code that has nothing to report beyond the error. Callers
    /// that want to render diagnostics first use [`mirror`](Self::mirror) and
    /// exit themselves, as `envmirror check` does.
    ///
    /// ```no_run
    /// use envmirror::{Configurator, Field, Mirror, field};
    ///
    /// #[derive(Default)]
    /// struct Startup {
    ///     kafka_host: String,
    /// }
    ///
    /// impl Mirror for Startup {
    ///     fn fields(&mut self) -> Vec<Field<'_>> {
    ///         vec![field!(self.kafka_host).rename("KAFKA_HOST").required()]
    ///     }
    /// }
    ///
    /// let mut startup = Startup::default();
    /// Configurator::create()?.mirror_or_exit(&mut startup);
    /// # Ok::<(), envmirror::ConfigError>(())
    /// ```
    pub fn mirror_or_exit<T: Mirror + ?Sized>(&self, target: &mut T) {
        if let Err(err) = self.mirror(target) {
            error!(
                field = err.field().unwrap_or("-"),
                "Configurator failed: {}", err
            );
            std::process::exit(1);
        }
    }

    /// Build a default target and mirror onto it.
    pub fn bind<T: Mirror + Default>(&self) -> ConfigResult<T> {
        let mut target = T::default();
        self.mirror(&mut target)?;
        Ok(target)
    }

    /// Report how each non-ignored field would be bound, without assigning.
    ///
    /// Values are rendered log-safe. Missing required fields are reported with
    /// no origin rather than as errors; directive errors are still returned.
    pub fn describe<T: Mirror + ?Sized>(&self, target: &mut T) -> ConfigResult<Vec<FieldReport>> {
        let fields = target.fields();
        let mut reports = Vec::with_capacity(fields.len());

        for field in &fields {
            let Some(directive) = field.resolve()? else {
                continue;
            };

            let (origin, value) = match self.resolve_value(&directive) {
                Some((value, origin)) => {
                    let raw = raw_value(&directive, &value, false);
                    (Some(origin), Some(log_value(&directive, &raw)))
                }
                None => (None, None),
            };

            reports.push(FieldReport {
                directive,
                origin,
                value,
            });
        }

        Ok(reports)
    }

    fn resolve_value(&self, directive: &FieldDirective) -> Option<(String, ValueOrigin)> {
        self.lookup(&directive.lookup_name).or_else(|| {
            directive
                .default_value
                .clone()
                .map(|value| (value, ValueOrigin::Default))
        })
    }
}

/// Shape a looked-up string for the field: split sequences, recognize `null`
/// for nullable fields.
fn raw_value<'a>(directive: &FieldDirective, value: &'a str, nullable: bool) -> RawValue<'a> {
    if nullable && value == "null" {
        RawValue::Null
    } else if directive.is_array {
        RawValue::List(split_elements(value, &directive.array_delimiter))
    } else {
        RawValue::Text(value)
    }
}

/// Log-safe rendering of a raw value. Never contains a redacted value.
pub fn log_value(directive: &FieldDirective, raw: &RawValue<'_>) -> String {
    if directive.redacted {
        return REDACTED_PLACEHOLDER.to_string();
    }
    match raw {
        RawValue::Text(text) => text.to_string(),
        RawValue::List(items) => items.join(directive.array_delimiter.as_str()),
        RawValue::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigValue, Field};
    use crate::error::ErrorCode;
    use crate::field;

    #[derive(Debug, Default)]
    struct Broker {
        kafka_host: String,
        kafka_use_tls: bool,
        partitions: i32,
        services: Vec<String>,
        token: Option<String>,
        cache: Option<u64>,
    }

    impl Mirror for Broker {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                field!(self.kafka_host).rename("KAFKA_HOST").required(),
                field!(self.kafka_use_tls),
                field!(self.partitions).default_value("3"),
                field!(self.services).array(";"),
                field!(self.token).redacted(),
                field!(self.cache).ignore(),
            ]
        }
    }

    fn configurator(content: &str) -> Configurator {
        Configurator::from_source(ConfigSource::parse(content))
            .allow_default_to_system_environment(false)
    }

    #[test]
    fn test_mirror_binds_declared_fields() {
        let cfg = configurator(
            "KAFKA_HOST=kafka:9092\nKAFKA_USE_TLS=TRUE\nSERVICES=tea;milk\nTOKEN=abc\nCACHE=5",
        );
        let broker: Broker = cfg.bind().unwrap();

        assert_eq!(broker.kafka_host, "kafka:9092");
        assert!(broker.kafka_use_tls);
        assert_eq!(broker.partitions, 3);
        assert_eq!(broker.services, vec!["tea", "milk"]);
        assert_eq!(broker.token.as_deref(), Some("abc"));
        assert_eq!(broker.cache, None);
    }

    #[test]
    fn test_missing_optional_field_keeps_value() {
        let cfg = configurator("KAFKA_HOST=h");
        let mut broker = Broker {
            kafka_use_tls: true,
            services: vec!["keep".to_string()],
            ..Default::default()
        };
        cfg.mirror(&mut broker).unwrap();

        assert!(broker.kafka_use_tls);
        assert_eq!(broker.services, vec!["keep"]);
    }

    #[test]
    fn test_missing_required_field() {
        let cfg = configurator("KAFKA_USE_TLS=true");
        let err = cfg.bind::<Broker>().unwrap_err();

        assert_eq!(err.code(), ErrorCode::MissingRequired);
        assert_eq!(err.field(), Some("kafka_host"));
        assert!(err.to_string().contains("KAFKA_HOST"));
    }

    #[test]
    fn test_null_clears_optional_field() {
        let cfg = configurator("KAFKA_HOST=null\nTOKEN=null");
        let mut broker = Broker {
            token: Some("old".to_string()),
            ..Default::default()
        };
        cfg.mirror(&mut broker).unwrap();

        // Plain text fields take null literally
        assert_eq!(broker.kafka_host, "null");
        assert_eq!(broker.token, None);
    }

    #[test]
    fn test_redacted_number_error_hides_value() {
        #[derive(Debug, Default)]
        struct Pin {
            pin: u32,
        }
        impl Mirror for Pin {
            fn fields(&mut self) -> Vec<Field<'_>> {
                vec![field!(self.pin).redacted()]
            }
        }

        let cfg = configurator("PIN=hunter2");
        let err = cfg.bind::<Pin>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::NumberFormat);
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_log_value() {
        let mut hosts: Vec<String> = Vec::new();
        let directive = Field::new("hosts", &mut hosts)
            .array(";")
            .resolve()
            .unwrap()
            .unwrap();
        let raw = RawValue::List(vec!["a", "b"]);
        assert_eq!(log_value(&directive, &raw), "a;b");

        let redacted = FieldDirective {
            redacted: true,
            ..directive
        };
        assert_eq!(log_value(&redacted, &raw), REDACTED_PLACEHOLDER);
    }

    #[test]
    fn test_redacted_adapter_error_hides_value() {
        #[derive(Debug)]
        struct Token;
        impl ConfigValue for Token {}

        #[derive(Debug, Default)]
        struct Auth {
            tok: Option<Token>,
        }
        impl Mirror for Auth {
            fn fields(&mut self) -> Vec<Field<'_>> {
                vec![field!(self.tok).redacted()]
            }
        }

        let cfg = configurator("TOK=hunter2");
        cfg.adapters()
            .register::<Token, _>(|_, raw, _| anyhow::bail!("bad token {}", raw));

        let err = cfg.bind::<Auth>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::AdapterFailed);
        let rendered = format!("{:#}", anyhow::Error::new(err));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains(REDACTED_PLACEHOLDER));
    }

    /// Shared buffer the fmt subscriber writes log lines into.
    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_mirror_logs_each_assignment() {
        #[derive(Debug, Default)]
        struct Credentials {
            token: String,
            keys: Vec<String>,
            hosts: Vec<String>,
        }
        impl Mirror for Credentials {
            fn fields(&mut self) -> Vec<Field<'_>> {
                vec![
                    field!(self.token).rename("TOKEN").redacted(),
                    field!(self.keys).tag("rename(KEYS), redacted, array(;)"),
                    field!(self.hosts).rename("HOSTS").array(";"),
                ]
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let cfg = configurator("TOKEN=s3cr3t\nKEYS=key-a;key-b\nHOSTS=a;b");
        let credentials: Credentials =
            tracing::subscriber::with_default(subscriber, || cfg.bind()).unwrap();
        assert_eq!(credentials.token, "s3cr3t");

        let logs = captured.text();
        assert!(logs.contains(&format!("Setting variable TOKEN={}", REDACTED_PLACEHOLDER)));
        assert!(logs.contains(&format!("Setting variable KEYS={}", REDACTED_PLACEHOLDER)));
        assert!(logs.contains("Setting variable HOSTS=a;b"));
        for secret in ["s3cr3t", "key-a", "key-b"] {
            assert!(!logs.contains(secret));
        }
    }

    #[test]
    fn test_describe_does_not_assign() {
        let cfg = configurator("KAFKA_HOST=h\nTOKEN=secret");
        let mut broker = Broker::default();
        let reports = cfg.describe(&mut broker).unwrap();

        assert_eq!(broker.kafka_host, "");
        // cache is ignored
        assert_eq!(reports.len(), 5);
        assert_eq!(reports[0].origin, Some(ValueOrigin::File));
        assert_eq!(reports[1].origin, None);
        assert_eq!(reports[2].origin, Some(ValueOrigin::Default));
        assert_eq!(reports[2].value.as_deref(), Some("3"));
        assert_eq!(reports[4].value.as_deref(), Some(REDACTED_PLACEHOLDER));
    }

    #[test]
    fn test_custom_type_uses_adapter() {
        #[derive(Debug, PartialEq)]
        struct Level(u8);
        impl ConfigValue for Level {}

        #[derive(Debug, Default)]
        struct Logging {
            level: Option<Level>,
        }
        impl Mirror for Logging {
            fn fields(&mut self) -> Vec<Field<'_>> {
                vec![field!(self.level)]
            }
        }

        let cfg = configurator("LEVEL=debug");
        let err = cfg.bind::<Logging>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoAdapter);
        assert_eq!(err.field(), Some("level"));

        cfg.adapters()
            .register::<Level, _>(|_, raw, _| Ok(Level(raw.len() as u8)));
        let logging: Logging = cfg.bind().unwrap();
        assert_eq!(logging.level, Some(Level(5)));
    }
}
