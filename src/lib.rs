//! Async client for the FTX REST API
//!
//! Requests are signed with the exchange's HMAC-SHA256 scheme and every
//! response is unwrapped from the `{success, result | error}` envelope into
//! either the `result` value or a typed [`ExchangeError`].
//!
//! ```rust,no_run
//! use ftx_rest::{ExchangeConfig, FtxBuilder};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), ftx_rest::ExchangeError> {
//! let ftx = FtxBuilder::new()
//!     .with_config(ExchangeConfig::new("key".to_string(), "secret".to_string()))
//!     .build()?;
//!
//! let markets = ftx.fetch("markets", &[]).await?;
//! let orders = ftx.fetch_authenticated("orders", &[("market", "BTC-PERP")]).await?;
//! let placed = ftx
//!     .post("orders", &json!({"market": "BTC-PERP", "side": "buy", "size": 1}), &[])
//!     .await?;
//! # Ok(())
//! # }
//! ```
pub mod core;
pub mod exchanges;

pub use core::{
    config::ExchangeConfig,
    errors::{ErrorKind, ExchangeError},
    types::{to_decimal, NumericPolicy},
};
pub use exchanges::ftx::{FtxBuilder, FtxRest};
