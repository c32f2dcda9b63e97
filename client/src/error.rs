use thiserror::Error;

/// Failure taxonomy for the client: transport, auth, local preconditions and
/// server-reported business errors are kept apart so callers can surface each
/// differently.
#[derive(Error, Debug)]
pub enum Error {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("local storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl Error {
    /// True for client-side precondition failures that never reached the
    /// network.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
