/// Transport kernel
///
/// Exchange-agnostic HTTP plumbing shared by the exchange layer:
///
/// - `RestClient` / `ReqwestRest`: query encoding, optional signing, HTTP
///   call and JSON parsing under the configured `NumericPolicy`. A body that
///   does not parse becomes a transport error (non-2xx) or a protocol error
///   (2xx); anything that parses is handed upward with its status.
/// - `Signer`: pluggable request authentication. The kernel reads the
///   timestamp once from its `Clock` and gives the signer the exact query
///   string and body bytes it is about to send.
///
/// # Example
/// ```rust,no_run
/// use ftx_rest::core::kernel::*;
/// use ftx_rest::exchanges::ftx::FtxSigner;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), ftx_rest::ExchangeError> {
/// let signer = Arc::new(FtxSigner::new("key".to_string(), "secret".to_string(), None)?);
/// let rest = RestClientBuilder::new(RestClientConfig::new(
///     "https://ftx.com/api".to_string(),
///     "ftx".to_string(),
/// ))
/// .with_signer(signer)
/// .build()?;
///
/// let response = rest.get("orders", &[("market", "BTC-PERP")], true).await?;
/// println!("{} {}", response.status, response.body);
/// # Ok(())
/// # }
/// ```
pub mod rest;
pub mod signer;

// Re-export key types for convenience
pub use rest::{
    build_url, encode_query, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
    RestResponse,
};
pub use signer::{hmac_sha256_hex, system_clock, Clock, SignatureResult, Signer};
