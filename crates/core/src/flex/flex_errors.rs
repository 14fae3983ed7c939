use thiserror::Error;

/// Machine-readable codes carried by [`FlexError`].
///
/// Numeric protocol codes from the reporting service are passed through
/// verbatim; these constants cover the locally assigned ones.
pub mod codes {
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const HTML_RESPONSE: &str = "HTML_RESPONSE";
    pub const UNEXPECTED_FORMAT: &str = "UNEXPECTED_FORMAT";
    pub const UNKNOWN: &str = "UNKNOWN";
}

/// Network or protocol failure against the Flex reporting service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FlexError {
    pub message: String,
    pub code: Option<String>,
}

impl FlexError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    pub fn token_expired() -> Self {
        Self::with_code("Flex token expired", codes::TOKEN_EXPIRED)
    }

    /// Whether the caller should be prompted to renew their access token.
    pub fn is_token_expired(&self) -> bool {
        self.code.as_deref() == Some(codes::TOKEN_EXPIRED)
            || self.message.to_lowercase().contains("expired")
    }
}

/// Structurally unparseable statement document.
///
/// Missing optional sections are not parse errors; they yield empty
/// collections instead.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed statement document: {0}")]
    Malformed(String),
}
