//! Core application functionality.

use crate::config::ApplicationConfig;
use config::ConfigError;
use derive_more::Constructor;
use scenewire_di::factory::{ContainerBuilder, ContainerState, InjectionReport};
use scenewire_di::{global, ContainerError};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
}

/// Main entrypoint for the host. Configures logging, installs the global container and injects
/// dependencies into all loaded scenes.
#[derive(Constructor)]
pub struct Application {
    config: ApplicationConfig,
}

impl Application {
    /// Creates the application with config loaded from the environment.
    pub fn from_environment() -> Result<Self, ApplicationError> {
        ApplicationConfig::init_from_environment()
            .map(Self::new)
            .map_err(ApplicationError::Config)
    }

    #[inline]
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Builds the container with the configured policy, installs it globally and runs the first
    /// scene sweep. If a container is already installed, it is kept and its scenes get swept
    /// again.
    pub fn run(&self, builder: ContainerBuilder) -> Result<InjectionReport, ApplicationError> {
        if self.config.install_tracing_logger {
            install_tracing_logger();
        }

        info!(policy = ?self.config.policy, "Starting application...");

        let container = builder.with_policy(self.config.policy).build();
        if !global::install(container)? {
            warn!("Reusing already installed container.");
        }

        let report = global::with_instance(|container| {
            if container.state() == ContainerState::Uninitialized {
                container.start()
            } else {
                container.inject_dependencies_at_scenes()
            }
        })??;

        info!(
            receivers = report.receivers,
            bound_fields = report.bound_fields,
            failures = report.failures.len(),
            rejected_registrations = report.rejected_registrations.len(),
            "Application started."
        );

        Ok(report)
    }
}

fn install_tracing_logger() {
    if tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .is_err()
    {
        debug!("Tracing subscriber already installed.");
    }
}
