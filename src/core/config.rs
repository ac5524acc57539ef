use crate::core::types::NumericPolicy;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Production REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://ftx.com/api";

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub subaccount: Option<String>,
    pub base_url: Option<String>,
    pub numeric_policy: NumericPolicy,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 5)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("subaccount", &self.subaccount)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("numeric_policy", &self.numeric_policy)?;
        state.end()
    }
}

// Unknown keys are an error rather than silently ignored
impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct ExchangeConfigHelper {
            #[serde(default)]
            api_key: String,
            #[serde(default)]
            secret_key: String,
            #[serde(default)]
            subaccount: Option<String>,
            #[serde(default)]
            base_url: Option<String>,
            #[serde(default)]
            numeric_policy: NumericPolicy,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            subaccount: helper.subaccount,
            base_url: helper.base_url,
            numeric_policy: helper.numeric_policy,
        })
    }
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            subaccount: None,
            base_url: None,
            numeric_policy: NumericPolicy::default(),
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `FTX_API_KEY`)
    /// - `{PREFIX}_SECRET_KEY` (e.g., `FTX_SECRET_KEY`)
    /// - `{PREFIX}_SUBACCOUNT` (optional)
    /// - `{PREFIX}_BASE_URL` (optional)
    /// - `{PREFIX}_NUMERIC_POLICY` (optional, `float` or `decimal`)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let numeric_policy = match env::var(format!("{}_NUMERIC_POLICY", prefix)) {
            Ok(raw) => raw.parse().map_err(ConfigError::InvalidConfiguration)?,
            Err(_) => NumericPolicy::default(),
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            subaccount: env::var(format!("{}_SUBACCOUNT", prefix)).ok(),
            base_url: env::var(format!("{}_BASE_URL", prefix)).ok(),
            numeric_policy,
        })
    }

    /// Create configuration from a `.env` file and environment variables
    ///
    /// A missing file is not an error; the process environment is used as-is.
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Create configuration for public endpoints only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Exactly one of key and secret is set
    pub(crate) fn has_partial_credentials(&self) -> bool {
        self.api_key.expose_secret().is_empty() != self.secret_key.expose_secret().is_empty()
    }

    /// Route authenticated requests to a subaccount
    #[must_use]
    pub fn subaccount(mut self, subaccount: String) -> Self {
        self.subaccount = Some(subaccount);
        self
    }

    /// Set custom base URL
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub const fn numeric_policy(mut self, numeric_policy: NumericPolicy) -> Self {
        self.numeric_policy = numeric_policy;
        self
    }

    /// Base URL in effect, falling back to production
    pub fn resolved_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
