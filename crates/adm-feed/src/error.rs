use std::fmt;

/// Errors surfaced by a [`crate::ListingSource`] or the admin API client.
///
/// Never partially applied: a fetch either yields a whole page or one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or transport failure (connect, timeout, body read).
    Transport(String),
    /// Non-2xx response, or a 2xx envelope with `success != true`.
    Api {
        status: Option<u16>,
        message: String,
    },
    /// The response payload could not be decoded.
    Decode(String),
    /// Client misconfiguration (bad base URL, TLS init failure).
    Config(String),
}

impl FetchError {
    /// Transport failures and 5xx responses are worth retrying on the next tick.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Api {
                status: Some(code), ..
            } => *code >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {msg}"),
            FetchError::Api {
                status: Some(c),
                message,
            } => write!(f, "admin api error status={c}: {message}"),
            FetchError::Api {
                status: None,
                message,
            } => write!(f, "admin api error: {message}"),
            FetchError::Decode(msg) => write!(f, "decode error: {msg}"),
            FetchError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}
