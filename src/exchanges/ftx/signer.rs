use crate::core::errors::ExchangeError;
use crate::core::kernel::{hmac_sha256_hex, SignatureResult, Signer};

pub const KEY_HEADER: &str = "FTX-KEY";
pub const SIGN_HEADER: &str = "FTX-SIGN";
pub const TS_HEADER: &str = "FTX-TS";
pub const SUBACCOUNT_HEADER: &str = "FTX-SUBACCOUNT";

/// Signed paths are always rooted here, whatever host the request goes to
const SIGNED_PATH_PREFIX: &str = "/api/";

/// Build the bytes the exchange expects to be signed:
/// `timestamp || method || "/api/" || path [|| "?" || query] [|| body]`
pub fn signature_payload(
    timestamp: u64,
    method: &str,
    path: &str,
    query_string: &str,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut payload = format!(
        "{}{}{}{}",
        timestamp,
        method,
        SIGNED_PATH_PREFIX,
        path.trim_start_matches('/')
    )
    .into_bytes();

    if !query_string.is_empty() {
        payload.push(b'?');
        payload.extend_from_slice(query_string.as_bytes());
    }
    if let Some(body) = body {
        payload.extend_from_slice(body);
    }
    payload
}

/// Lowercase hex HMAC-SHA256 signature of a request
pub fn sign(
    path: &str,
    method: &str,
    query_string: &str,
    body: Option<&[u8]>,
    secret: &str,
    timestamp: u64,
) -> Result<String, ExchangeError> {
    if secret.is_empty() {
        return Err(ExchangeError::Precondition(
            "API secret is required to sign requests".to_string(),
        ));
    }

    let payload = signature_payload(timestamp, method, path, query_string, body);
    hmac_sha256_hex(secret.as_bytes(), &payload)
}

pub struct FtxSigner {
    api_key: String,
    secret_key: String,
    subaccount: Option<String>,
}

impl std::fmt::Debug for FtxSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtxSigner")
            .field("api_key", &"[REDACTED]")
            .field("subaccount", &self.subaccount)
            .finish_non_exhaustive()
    }
}

impl FtxSigner {
    pub fn new(
        api_key: String,
        secret_key: String,
        subaccount: Option<String>,
    ) -> Result<Self, ExchangeError> {
        if api_key.is_empty() || secret_key.is_empty() {
            return Err(ExchangeError::Precondition(
                "API key and secret are required to sign requests".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            secret_key,
            subaccount,
        })
    }
}

impl Signer for FtxSigner {
    fn sign_request(
        &self,
        method: &str,
        endpoint: &str,
        query_string: &str,
        body: Option<&[u8]>,
        timestamp: u64,
    ) -> SignatureResult {
        let signature = sign(
            endpoint,
            method,
            query_string,
            body,
            &self.secret_key,
            timestamp,
        )?;

        let mut headers = vec![
            (KEY_HEADER.to_string(), self.api_key.clone()),
            (SIGN_HEADER.to_string(), signature),
            (TS_HEADER.to_string(), timestamp.to_string()),
        ];
        if let Some(subaccount) = &self.subaccount {
            headers.push((SUBACCOUNT_HEADER.to_string(), subaccount.clone()));
        }

        Ok(headers)
    }
}
