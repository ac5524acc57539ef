pub mod builder;
pub mod rest;
pub mod signer;
pub mod types;

// Re-export main components
pub use builder::{build_connector, FtxBuilder};
pub use rest::FtxRest;
pub use signer::{
    sign, signature_payload, FtxSigner, KEY_HEADER, SIGN_HEADER, SUBACCOUNT_HEADER, TS_HEADER,
};
pub use types::Envelope;
