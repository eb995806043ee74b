mod settings;

use std::path::Path;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{FailurePolicy, InspectorSettings, LogSettings, ServerSettings, Settings};

/// Loads the configuration from the default file and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(None)
}

/// Loads `config/default` (or `path` when given), then environment variables
/// such as `INSPECTOR_HOST` or `SERVER_PORT`, and merges the result with
/// default values.
///
/// Values that do not parse (a non-numeric port, an unknown policy, a zero
/// timeout) are rejected here so the broker never starts half-configured.
pub fn load_config_from(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name("config/default").required(false),
    };
    let builder = Config::builder()
        .add_source(file)
        .add_source(Environment::default().separator("_"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();
    let server = partial.server;
    let inspector = partial.inspector;

    let settings = Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        inspector: InspectorSettings {
            host: inspector
                .as_ref()
                .and_then(|i| i.host.clone())
                .unwrap_or(default.inspector.host),
            port: inspector
                .as_ref()
                .and_then(|i| i.port)
                .unwrap_or(default.inspector.port),
            timeout: inspector
                .as_ref()
                .and_then(|i| i.timeout)
                .unwrap_or(default.inspector.timeout),
            policy: inspector
                .as_ref()
                .and_then(|i| i.policy)
                .unwrap_or(default.inspector.policy),
        },
        log: LogSettings {
            level: partial
                .log
                .and_then(|l| l.level)
                .unwrap_or(default.log.level),
        },
    };

    if settings.inspector.timeout == 0 {
        return Err(ConfigError::Message(
            "inspector.timeout must be greater than zero".to_string(),
        ));
    }

    Ok(settings)
}
