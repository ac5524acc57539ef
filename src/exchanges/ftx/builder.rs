use crate::core::config::{ConfigError, ExchangeConfig};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Clock, ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::core::types::NumericPolicy;
use crate::exchanges::ftx::{rest::FtxRest, signer::FtxSigner};
use std::sync::Arc;
use tracing::debug;

/// Builder for FTX REST clients
///
/// Credentials are optional; without them only `fetch` works and every
/// authenticated verb fails with a precondition error before any I/O.
pub struct FtxBuilder {
    config: ExchangeConfig,
    user_agent: Option<String>,
    clock: Option<Clock>,
}

impl Default for FtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FtxBuilder {
    pub fn new() -> Self {
        Self {
            config: ExchangeConfig::read_only(),
            user_agent: None,
            clock: None,
        }
    }

    /// Set the exchange configuration
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set API credentials, keeping the rest of the configuration
    pub fn with_credentials(mut self, api_key: String, secret_key: String) -> Self {
        let previous = self.config;
        self.config = ExchangeConfig {
            subaccount: previous.subaccount,
            base_url: previous.base_url,
            numeric_policy: previous.numeric_policy,
            ..ExchangeConfig::new(api_key, secret_key)
        };
        self
    }

    pub fn with_subaccount(mut self, subaccount: String) -> Self {
        self.config.subaccount = Some(subaccount);
        self
    }

    /// Override the production host
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.config.base_url = Some(base_url);
        self
    }

    pub fn with_numeric_policy(mut self, numeric_policy: NumericPolicy) -> Self {
        self.config.numeric_policy = numeric_policy;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Timestamp source for signed requests, wall clock by default
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<FtxRest<ReqwestRest>, ExchangeError> {
        if self.config.has_partial_credentials() {
            return Err(ConfigError::InvalidConfiguration(
                "API key and secret must be provided together".to_string(),
            )
            .into());
        }

        let mut rest_config =
            RestClientConfig::new(self.config.resolved_base_url().to_string(), "ftx".to_string())
                .with_numeric_policy(self.config.numeric_policy);
        if let Some(user_agent) = self.user_agent {
            rest_config = rest_config.with_user_agent(user_agent);
        }

        let mut rest_builder = RestClientBuilder::new(rest_config);

        if self.config.has_credentials() {
            let signer = Arc::new(FtxSigner::new(
                self.config.api_key().to_string(),
                self.config.secret_key().to_string(),
                self.config.subaccount.clone(),
            )?);
            rest_builder = rest_builder.with_signer(signer);
        }

        if let Some(clock) = self.clock {
            rest_builder = rest_builder.with_clock(clock);
        }

        let rest = rest_builder.build()?;
        debug!(
            base_url = %rest.config().base_url,
            authenticated = rest.has_signer(),
            "Built FTX REST client"
        );

        Ok(FtxRest::new(rest))
    }
}

/// Create an FTX REST client from a configuration
pub fn build_connector(config: ExchangeConfig) -> Result<FtxRest<ReqwestRest>, ExchangeError> {
    FtxBuilder::new().with_config(config).build()
}
