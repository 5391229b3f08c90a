mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment as EnvSource, File};

pub use settings::{ApiSettings, Environment, RealtimeSettings, Settings};

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the API and realtime configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    dotenvy::dotenv().ok();

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(EnvSource::default().separator("_"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        api: ApiSettings {
            api_key: partial
                .api
                .as_ref()
                .and_then(|a| a.api_key.clone())
                .unwrap_or(default.api.api_key),
            app_id: partial
                .api
                .as_ref()
                .and_then(|a| a.app_id.clone())
                .unwrap_or(default.api.app_id),
            user_id: partial
                .api
                .as_ref()
                .and_then(|a| a.user_id.clone())
                .unwrap_or(default.api.user_id),
            domain: partial
                .api
                .as_ref()
                .and_then(|a| a.domain.clone())
                .unwrap_or(default.api.domain),
            environment: partial
                .api
                .as_ref()
                .and_then(|a| a.environment)
                .unwrap_or(default.api.environment),
            language: partial
                .api
                .as_ref()
                .and_then(|a| a.language.clone())
                .unwrap_or(default.api.language),
            request_timeout_secs: partial
                .api
                .as_ref()
                .and_then(|a| a.request_timeout_secs)
                .unwrap_or(default.api.request_timeout_secs),
        },
        realtime: RealtimeSettings {
            endpoint: partial
                .realtime
                .as_ref()
                .and_then(|r| r.endpoint.clone())
                .or(default.realtime.endpoint),
            keepalive_interval_ms: partial
                .realtime
                .as_ref()
                .and_then(|r| r.keepalive_interval_ms)
                .unwrap_or(default.realtime.keepalive_interval_ms),
            reconnect_delay_ms: partial
                .realtime
                .as_ref()
                .and_then(|r| r.reconnect_delay_ms)
                .unwrap_or(default.realtime.reconnect_delay_ms),
        },
    })
}
