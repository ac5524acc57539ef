use crate::core::errors::ExchangeError;
use crate::core::kernel::{RestClient, RestResponse};
use crate::exchanges::ftx::types::Envelope;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

/// FTX REST API client
///
/// Every verb returns the unwrapped `result` of the exchange envelope. Calls
/// are independent and may run concurrently on one client.
#[derive(Debug, Clone)]
pub struct FtxRest<R: RestClient> {
    rest_client: R,
}

impl<R: RestClient> FtxRest<R> {
    pub fn new(rest_client: R) -> Self {
        Self { rest_client }
    }

    pub fn rest_client(&self) -> &R {
        &self.rest_client
    }

    /// Unauthenticated GET
    #[instrument(skip(self, params), fields(exchange = "ftx", endpoint = %endpoint, param_count = params.len()))]
    pub async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ExchangeError> {
        self.call(Method::GET, endpoint, params, None, false)
            .await
            .map(|(_, result)| result)
    }

    /// Signed GET
    #[instrument(skip(self, params), fields(exchange = "ftx", endpoint = %endpoint, param_count = params.len()))]
    pub async fn fetch_authenticated(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ExchangeError> {
        self.call(Method::GET, endpoint, params, None, true)
            .await
            .map(|(_, result)| result)
    }

    /// Signed POST with a JSON body
    ///
    /// The body is serialized once, in its own key order, and those bytes are
    /// both signed and sent.
    #[instrument(skip(self, body, params), fields(exchange = "ftx", endpoint = %endpoint))]
    pub async fn post(
        &self,
        endpoint: &str,
        body: &Value,
        params: &[(&str, &str)],
    ) -> Result<Value, ExchangeError> {
        self.call(Method::POST, endpoint, params, Some(body), true)
            .await
            .map(|(_, result)| result)
    }

    /// Signed DELETE, with or without a JSON body
    #[instrument(skip(self, body, params), fields(exchange = "ftx", endpoint = %endpoint))]
    pub async fn delete(
        &self,
        endpoint: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Value, ExchangeError> {
        self.call(Method::DELETE, endpoint, params, body, true)
            .await
            .map(|(_, result)| result)
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let (status, result) = self.call(Method::GET, endpoint, params, None, false).await?;
        Self::deserialize_result(&Method::GET, endpoint, status, result)
    }

    pub async fn fetch_authenticated_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let (status, result) = self.call(Method::GET, endpoint, params, None, true).await?;
        Self::deserialize_result(&Method::GET, endpoint, status, result)
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
        params: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let (status, result) = self
            .call(Method::POST, endpoint, params, Some(body), true)
            .await?;
        Self::deserialize_result(&Method::POST, endpoint, status, result)
    }

    pub async fn delete_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let (status, result) = self
            .call(Method::DELETE, endpoint, params, body, true)
            .await?;
        Self::deserialize_result(&Method::DELETE, endpoint, status, result)
    }

    /// Issue a request and unwrap the envelope, keeping the HTTP status
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<(u16, Value), ExchangeError> {
        let body = body
            .map(|body| Self::serialize_body(&method, endpoint, body))
            .transpose()?;

        let response = match (&method, body.as_deref()) {
            (&Method::GET, None) => self.rest_client.get(endpoint, params, authenticated).await?,
            (&Method::POST, Some(body)) => {
                self.rest_client
                    .post(endpoint, params, body, authenticated)
                    .await?
            }
            (&Method::DELETE, body) => {
                self.rest_client
                    .delete(endpoint, params, body, authenticated)
                    .await?
            }
            (method, _) => {
                return Err(ExchangeError::Precondition(format!(
                    "{} {}: unsupported method and body combination",
                    method, endpoint
                )))
            }
        };

        Self::unwrap_envelope(&method, endpoint, response)
    }

    fn serialize_body(
        method: &Method,
        endpoint: &str,
        body: &Value,
    ) -> Result<Vec<u8>, ExchangeError> {
        serde_json::to_vec(body).map_err(|e| {
            ExchangeError::Precondition(format!(
                "{} {}: failed to serialize request body: {}",
                method, endpoint, e
            ))
        })
    }

    /// Application-level half of response handling
    fn unwrap_envelope(
        method: &Method,
        endpoint: &str,
        response: RestResponse,
    ) -> Result<(u16, Value), ExchangeError> {
        let endpoint = endpoint.trim_start_matches('/');

        match Envelope::from_value(response.body) {
            Ok(Envelope::Success(result)) => Ok((response.status, result)),
            Ok(Envelope::Failure(message)) => {
                debug!(status = response.status, error = %message, "Exchange rejected request");
                Err(ExchangeError::Application {
                    method: method.to_string(),
                    endpoint: endpoint.to_string(),
                    status: response.status,
                    message,
                })
            }
            Err(reason) => Err(ExchangeError::Protocol {
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                status: response.status,
                message: reason.to_string(),
            }),
        }
    }

    fn deserialize_result<T: DeserializeOwned>(
        method: &Method,
        endpoint: &str,
        status: u16,
        result: Value,
    ) -> Result<T, ExchangeError> {
        serde_json::from_value(result).map_err(|e| ExchangeError::Protocol {
            method: method.to_string(),
            endpoint: endpoint.trim_start_matches('/').to_string(),
            status,
            message: format!("Failed to deserialize result: {}", e),
        })
    }
}
