//! Application configuration, read by the [Application](crate::application::Application) before
//! building the container.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `SCENEWIRE_` or the `scenewire.json` file, e.g.
//! `SCENEWIRE_LOOKUP_ORDER=persistent_first`.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use scenewire_di::policy::{DuplicatePolicy, HierarchyFallback, LookupOrder, ResolutionPolicy};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "SCENEWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "scenewire.json";

/// Framework configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApplicationConfig {
    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
    /// Policies used by the container.
    pub policy: ResolutionPolicy,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            policy: ResolutionPolicy::default(),
        }
    }
}

impl From<OptionalApplicationConfig> for ApplicationConfig {
    fn from(value: OptionalApplicationConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            policy: ResolutionPolicy {
                lookup_order: value
                    .lookup_order
                    .unwrap_or(default.policy.lookup_order),
                duplicate_policy: value
                    .duplicate_policy
                    .unwrap_or(default.policy.duplicate_policy),
                hierarchy_fallback: value
                    .hierarchy_fallback
                    .unwrap_or(default.policy.hierarchy_fallback),
            },
        }
    }
}

impl ApplicationConfig {
    /// Loads the config from the optional [CONFIG_FILE], overlaid by environment variables.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Self::init_from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX)),
        )
    }

    /// Loads the config from custom sources. Missing values fall back to defaults.
    pub fn init_from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .build()
            .and_then(|config| config.try_deserialize::<OptionalApplicationConfig>())
            .map(|config| config.into())
    }
}

#[derive(Deserialize)]
struct OptionalApplicationConfig {
    install_tracing_logger: Option<bool>,
    lookup_order: Option<LookupOrder>,
    duplicate_policy: Option<DuplicatePolicy>,
    hierarchy_fallback: Option<HierarchyFallback>,
}
