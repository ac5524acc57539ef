use crate::core::errors::ExchangeError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Ordered `(name, value)` header pairs produced by a signer
pub type SignatureResult = Result<Vec<(String, String)>, ExchangeError>;

/// Source of request timestamps in milliseconds since the Unix epoch
pub type Clock = fn() -> Result<u64, ExchangeError>;

/// Signer trait for request authentication
///
/// The transport reads the timestamp once and passes it here; implementations
/// must use that value both inside the signed payload and in any timestamp
/// header they emit.
pub trait Signer: Send + Sync {
    /// Sign a request and return the headers to attach
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, DELETE)
    /// * `endpoint` - API endpoint path, without query string
    /// * `query_string` - Encoded query string (without leading '?'), empty if none
    /// * `body` - Exact request body bytes, `None` when no body is sent
    /// * `timestamp` - Request timestamp in milliseconds
    fn sign_request(
        &self,
        method: &str,
        endpoint: &str,
        query_string: &str,
        body: Option<&[u8]>,
        timestamp: u64,
    ) -> SignatureResult;
}

/// Lowercase hex HMAC-SHA256 of `payload` keyed by `secret`
pub fn hmac_sha256_hex(secret: &[u8], payload: &[u8]) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ExchangeError::Precondition(format!("Invalid secret key: {}", e)))?;

    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Wall-clock [`Clock`]
pub fn system_clock() -> Result<u64, ExchangeError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| ExchangeError::Precondition(format!("Failed to get timestamp: {}", e)))
}
