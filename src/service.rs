//! Startup configuration of a broker-connected service.
//!
//! This is the structure the `check` command binds. It doubles as a worked
//! example of every directive and of an adapter-backed field.

use crate::config::{AdapterRegistry, ConfigValue, Field, Mirror};
use crate::field;
use tracing::Level;

impl ConfigValue for Level {}

/// Broker services a node may talk to.
pub mod broker_services {
    /// Bot
    pub const TEA: &str = "tea";
    /// Bot cluster coordinator
    pub const VANILLA: &str = "vanilla";
    /// Raid logs
    pub const MILK: &str = "milk";
    /// Premium management
    pub const SUGAR: &str = "sugar";
    /// Raid bans
    pub const COFFEE: &str = "coffee";
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Kafka bootstrap address
    pub kafka_host: String,
    pub kafka_use_tls: bool,
    /// Name this service registers under
    pub service_name: String,
    pub cluster_id: String,
    /// Services this node exchanges messages with
    pub broker_services: Vec<String>,
    /// Requests per second granted by the rate limiter
    pub ratelimit_per_second: f64,
    /// Secret for the management API
    pub api_token: Option<String>,
    pub log_level: Level,
    /// Populated at runtime, never from configuration
    pub instance_id: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            kafka_host: String::new(),
            kafka_use_tls: false,
            service_name: broker_services::VANILLA.to_string(),
            cluster_id: "0".to_string(),
            broker_services: Vec::new(),
            ratelimit_per_second: 50.0,
            api_token: None,
            log_level: Level::INFO,
            instance_id: None,
        }
    }
}

impl Mirror for ServiceConfig {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            field!(self.kafka_host).rename("KAFKA_HOST").required(),
            field!(self.kafka_use_tls).rename("KAFKA_USE_TLS"),
            field!(self.service_name).tag("rename(SERVICE_NAME), default(vanilla)"),
            field!(self.cluster_id).tag("rename(CLUSTER_ID) default(0)"),
            field!(self.broker_services).rename("BROKER_SERVICES").array(","),
            field!(self.ratelimit_per_second).rename("RATELIMIT_PER_SECOND"),
            field!(self.api_token).rename("API_TOKEN").redacted(),
            field!(self.log_level).rename("LOG_LEVEL"),
            field!(self.instance_id).ignore(),
        ]
    }
}

/// Register the adapters `ServiceConfig` needs.
pub fn register_adapters(registry: &AdapterRegistry) {
    registry.register::<Level, _>(|_, raw, _| Ok(raw.trim().parse::<Level>()?));
}
