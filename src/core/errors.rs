use thiserror::Error;

/// Coarse classification of an [`ExchangeError`]
///
/// Callers branch on the kind instead of matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable response: a non-2xx status with an unparseable body, or no response at all
    Transport,
    /// A response arrived but its payload does not have the expected shape
    Protocol,
    /// The exchange answered with a well-formed `success: false` envelope
    Application,
    /// The request was rejected locally before any network I/O
    Precondition,
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("{method} {endpoint} failed with status {status}: {body}")]
    Transport {
        method: String,
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{method} {endpoint} request failed: {source}")]
    Network {
        method: String,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {endpoint} returned an unexpected payload (status {status}): {message}")]
    Protocol {
        method: String,
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("{method} {endpoint} rejected by exchange (status {status}): {message}")]
    Application {
        method: String,
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Invalid request: {0}")]
    Precondition(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::Network { .. } => ErrorKind::Transport,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Application { .. } => ErrorKind::Application,
            Self::Precondition(_) | Self::ConfigError(_) => ErrorKind::Precondition,
        }
    }

    /// HTTP status of the response that produced this error, if one was received
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. }
            | Self::Protocol { status, .. }
            | Self::Application { status, .. } => Some(*status),
            Self::Network { .. } | Self::Precondition(_) | Self::ConfigError(_) => None,
        }
    }

    /// Exchange-supplied error text of an application failure
    pub fn application_message(&self) -> Option<&str> {
        match self {
            Self::Application { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_application(&self) -> bool {
        self.kind() == ErrorKind::Application
    }
}
