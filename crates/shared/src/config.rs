//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Exchange-rate provider configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Telegram Mini App configuration.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Text-completion (AI advice) configuration.
    #[serde(default)]
    pub ai: AiConfig,
    /// Per-user defaults.
    #[serde(default)]
    pub users: UsersConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Exchange-rate provider configuration.
///
/// A missing `api_key` is a supported configuration: every conversion then
/// degrades to parity.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Provider API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Provider base URL; requests go to `{base_url}/{api_key}/latest/{reference}`.
    #[serde(default = "default_rates_base_url")]
    pub base_url: String,
    /// Currency every cached value is expressed against.
    #[serde(default = "default_reference_currency")]
    pub reference_currency: String,
    /// Delay between background refreshes, in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Age after which a snapshot is considered stale, in seconds.
    #[serde(default = "default_freshness")]
    pub freshness_secs: u64,
    /// Timeout for one provider request, in seconds.
    #[serde(default = "default_rates_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_rates_base_url(),
            reference_currency: default_reference_currency(),
            refresh_interval_secs: default_refresh_interval(),
            freshness_secs: default_freshness(),
            request_timeout_secs: default_rates_timeout(),
        }
    }
}

impl RatesConfig {
    /// Returns the API key when one is configured and not blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }
}

fn default_rates_base_url() -> String {
    "https://v6.exchangerate-api.com/v6".to_string()
}

fn default_reference_currency() -> String {
    "USD".to_string()
}

fn default_refresh_interval() -> u64 {
    3600 // 1 hour
}

fn default_freshness() -> u64 {
    3600 // 1 hour
}

fn default_rates_timeout() -> u64 {
    5
}

/// Telegram Mini App configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token used to verify init data signatures.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Maximum accepted age of init data in seconds (0 disables the check).
    #[serde(default = "default_max_auth_age")]
    pub max_auth_age_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            max_auth_age_secs: default_max_auth_age(),
        }
    }
}

impl TelegramConfig {
    /// Returns the bot token when one is configured and not blank.
    #[must_use]
    pub fn bot_token(&self) -> Option<&str> {
        non_blank(self.bot_token.as_deref())
    }
}

fn default_max_auth_age() -> u64 {
    86400 // 1 day
}

/// Text-completion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key; AI endpoints answer 503 without it.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name.
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// REST API base URL.
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// Timeout for one completion request, in seconds.
    #[serde(default = "default_ai_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_ai_model(),
            base_url: default_ai_base_url(),
            request_timeout_secs: default_ai_timeout(),
        }
    }
}

impl AiConfig {
    /// Returns the API key when one is configured and not blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }
}

fn default_ai_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_timeout() -> u64 {
    30
}

/// Per-user defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// Base currency assigned to users without a settings row.
    #[serde(default = "default_base_currency")]
    pub default_base_currency: String,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            default_base_currency: default_base_currency(),
        }
    }
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SANA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("SANA__DATABASE__URL", Some("postgres://localhost/sana_test")),
                ("SANA__RATES__API_KEY", Some("secret-key")),
                ("SANA__SERVER__PORT", Some("9090")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/sana_test");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.rates.api_key(), Some("secret-key"));
                assert_eq!(config.rates.reference_currency, "USD");
                assert_eq!(config.rates.refresh_interval_secs, 3600);
                assert_eq!(config.rates.freshness_secs, 3600);
                assert_eq!(config.rates.request_timeout_secs, 5);
                assert_eq!(config.users.default_base_currency, "USD");
                assert_eq!(config.ai.model, "gemini-2.5-flash");
                assert!(config.telegram.bot_token().is_none());
            },
        );
    }

    #[test]
    fn test_blank_keys_are_treated_as_missing() {
        let rates = RatesConfig {
            api_key: Some("   ".to_string()),
            ..RatesConfig::default()
        };
        assert!(rates.api_key().is_none());

        let ai = AiConfig {
            api_key: Some(String::new()),
            ..AiConfig::default()
        };
        assert!(ai.api_key().is_none());
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_var_unset("SANA__DATABASE__URL", || {
            assert!(AppConfig::load().is_err());
        });
    }
}
