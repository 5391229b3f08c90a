use serde::Deserialize;

/// Deployment environment of the backend the client talks to.
///
/// Selects the subdomain suffix used when building capability-area URLs,
/// e.g. `challenges-staging.<domain>` for [`Environment::Staging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    Development,
}

impl Environment {
    /// Suffix appended to every capability-area subdomain.
    pub fn subdomain_suffix(self) -> &'static str {
        match self {
            Environment::Production => "",
            Environment::Staging => "-staging",
            Environment::Development => "-dev",
        }
    }
}

/// Top-level configuration settings for the client.
///
/// Includes settings for both the HTTP API facade and the realtime link.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub realtime: RealtimeSettings,
}

/// Configuration settings for the API facade.
///
/// The API key and app id are issued by the backend; the user id is supplied
/// by the host application and stable across sessions.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub app_id: String,
    pub user_id: String,
    pub domain: String,
    pub environment: Environment,
    pub language: String,
    pub request_timeout_secs: u64,
}

/// Configuration settings for the realtime link.
///
/// `endpoint` overrides the URL derived from domain and environment.
#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeSettings {
    pub endpoint: Option<String>,
    pub keepalive_interval_ms: u64,
    pub reconnect_delay_ms: u64,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub api: Option<PartialApiSettings>,
    pub realtime: Option<PartialRealtimeSettings>,
}

/// Partial API settings.
///
/// Used when loading facade configuration from external sources with optional values.
#[derive(Debug, Deserialize)]
pub struct PartialApiSettings {
    pub api_key: Option<String>,
    pub app_id: Option<String>,
    pub user_id: Option<String>,
    pub domain: Option<String>,
    pub environment: Option<Environment>,
    pub language: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Partial realtime settings.
///
/// Used for link configuration from external sources with optional values.
#[derive(Debug, Deserialize)]
pub struct PartialRealtimeSettings {
    pub endpoint: Option<String>,
    pub keepalive_interval_ms: Option<u64>,
    pub reconnect_delay_ms: Option<u64>,
}

/// Provides default values for `Settings`.
///
/// Credentials default to empty strings and must be supplied by the host
/// application before connecting.
impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                api_key: String::new(),
                app_id: String::new(),
                user_id: String::new(),
                domain: "questline.gg".to_string(),
                environment: Environment::Production,
                language: "en".to_string(),
                request_timeout_secs: 10,
            },
            realtime: RealtimeSettings {
                endpoint: None,
                keepalive_interval_ms: 250,
                reconnect_delay_ms: 2000,
            },
        }
    }
}

impl Settings {
    /// URL of the realtime broker, honoring an explicit `endpoint` override.
    pub fn realtime_endpoint(&self) -> String {
        self.realtime.endpoint.clone().unwrap_or_else(|| {
            format!(
                "wss://realtime{}.{}",
                self.api.environment.subdomain_suffix(),
                self.api.domain
            )
        })
    }
}
