use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{system_clock, Clock, Signer};
use crate::core::types::NumericPolicy;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response, Url};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// A response whose body parsed as JSON
///
/// Parsing succeeded, so the status has not been judged yet: the exchange
/// reports failures inside the body even on non-2xx responses.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: Value,
}

/// REST client trait for making HTTP requests
///
/// Implementations own query encoding, signing and JSON parsing. Interpreting
/// the parsed body is left to the exchange layer.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make a GET request
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters as key-value pairs, in order
    /// * `authenticated` - Whether to sign the request
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError>;

    /// Make a POST request with a pre-serialized JSON body
    ///
    /// The body bytes are signed and sent unchanged.
    async fn post(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: &[u8],
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError>;

    /// Make a DELETE request, optionally carrying a pre-serialized JSON body
    async fn delete(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&[u8]>,
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// User agent string to include in requests
    pub user_agent: String,
    /// How numbers in response bodies are parsed
    pub numeric_policy: NumericPolicy,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `exchange_name` - Name of the exchange
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            user_agent: concat!("ftx-rest/", env!("CARGO_PKG_VERSION")).to_string(),
            numeric_policy: NumericPolicy::default(),
        }
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_numeric_policy(mut self, numeric_policy: NumericPolicy) -> Self {
        self.numeric_policy = numeric_policy;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Clock,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            clock: system_clock,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Replace the wall clock used to timestamp signed requests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Build the REST client
    ///
    /// No request timeout is configured; callers bound calls themselves.
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::Precondition(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            clock: self.clock,
        })
    }
}

/// Implementation of `RestClient` using reqwest
///
/// Cloning is cheap and clones share one connection pool.
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Clock,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

/// Encode query parameters as `application/x-www-form-urlencoded`, preserving order
///
/// No parameters encode to the empty string.
pub fn encode_query(params: &[(&str, &str)]) -> Result<String, ExchangeError> {
    serde_urlencoded::to_string(params)
        .map_err(|e| ExchangeError::Precondition(format!("Failed to encode query: {}", e)))
}

/// Join base URL, endpoint and an already encoded query string
pub fn build_url(base_url: &str, endpoint: &str, query_string: &str) -> String {
    let mut url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    if !query_string.is_empty() {
        url.push('?');
        url.push_str(query_string);
    }
    url
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    fn signed_headers(
        &self,
        method: &Method,
        endpoint: &str,
        query_string: &str,
        body: Option<&[u8]>,
    ) -> Result<HeaderMap, ExchangeError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ExchangeError::Precondition(format!(
                "{} {} requires API credentials",
                method, endpoint
            ))
        })?;

        let timestamp = (self.clock)()?;
        let pairs = signer.sign_request(method.as_str(), endpoint, query_string, body, timestamp)?;

        let mut headers = HeaderMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                ExchangeError::Precondition(format!("Invalid header name '{}': {}", key, e))
            })?;
            let value = HeaderValue::from_str(&value).map_err(|e| {
                ExchangeError::Precondition(format!("Invalid value for header '{}': {}", key, e))
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// Turn a response into parsed JSON, or a transport/protocol error
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(
        &self,
        method: &Method,
        endpoint: &str,
        response: Response,
    ) -> Result<RestResponse, ExchangeError> {
        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|source| ExchangeError::Network {
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                source,
            })?;

        trace!("Response body: {}", response_text);

        match self.config.numeric_policy.parse(&response_text) {
            Ok(body) => Ok(RestResponse {
                status: status.as_u16(),
                body,
            }),
            Err(e) if status.is_success() => {
                debug!(error = %e, "Response body is not JSON");
                Err(ExchangeError::Protocol {
                    method: method.to_string(),
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    message: format!("Failed to parse JSON response: {}", e),
                })
            }
            Err(_) => {
                debug!("Request failed with non-JSON body");
                Err(ExchangeError::Transport {
                    method: method.to_string(),
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    body: response_text,
                })
            }
        }
    }

    /// Make a request with the given parameters
    ///
    /// The encoded query string and body bytes handed to the signer are the
    /// exact ones put on the wire.
    #[instrument(skip(self, query_params, body), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&[u8]>,
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError> {
        let endpoint = endpoint.trim_start_matches('/');
        let query_string = encode_query(query_params)?;
        let url = build_url(&self.config.base_url, endpoint, &query_string);
        let url = Url::parse(&url)
            .map_err(|e| ExchangeError::Precondition(format!("Invalid URL '{}': {}", url, e)))?;

        let headers = if authenticated {
            self.signed_headers(&method, endpoint, &query_string, body)?
        } else {
            HeaderMap::new()
        };

        let mut request = self.client.request(method.clone(), url).headers(headers);

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        let response = request
            .send()
            .await
            .map_err(|source| ExchangeError::Network {
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                source,
            })?;

        self.handle_response(&method, endpoint, response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError> {
        self.make_request(Method::GET, endpoint, query_params, None, authenticated)
            .await
    }

    async fn post(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: &[u8],
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError> {
        self.make_request(Method::POST, endpoint, query_params, Some(body), authenticated)
            .await
    }

    async fn delete(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&[u8]>,
        authenticated: bool,
    ) -> Result<RestResponse, ExchangeError> {
        self.make_request(Method::DELETE, endpoint, query_params, body, authenticated)
            .await
    }
}
