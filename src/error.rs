use std::io::Read;

use crate::algorithm::AlgorithmKind;

pub(crate) const MAX_ERROR_BODY_BYTES: u64 = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {kind} algorithm: {candidate:?}")]
    InvalidAlgorithm {
        kind: AlgorithmKind,
        candidate: String,
    },
    #[error("header algorithm {header} does not match signing algorithm {signing}")]
    AlgorithmMismatch { header: String, signing: String },
    #[error("missing configuration value: {0}")]
    MissingConfig(&'static str),
    #[error("invalid configuration value for {key}: {message}")]
    InvalidConfig { key: &'static str, message: String },
    #[error("signing failure: {0}")]
    SigningFailure(String),
    #[error("unexpected token response (status {status}): {body}")]
    UnexpectedTokenResponse { status: u16, body: String },
    #[error("token response parse failure: {0}")]
    ResponseParseFailure(#[from] serde_json::Error),
    #[error("token response did not contain an access token")]
    MissingAccessToken,
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_config(key: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            key,
            message: message.into(),
        }
    }

    /// Returns true for errors raised before any network call was attempted.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::InvalidAlgorithm { .. }
                | Error::AlgorithmMismatch { .. }
                | Error::MissingConfig(_)
                | Error::InvalidConfig { .. }
                | Error::SigningFailure(_)
        )
    }
}

/// Reads at most `limit` bytes of a response body, lossily decoded as UTF-8.
pub(crate) fn read_body_with_limit<R: Read>(reader: R, limit: u64) -> Result<String, Error> {
    let mut buf = Vec::new();
    reader.take(limit).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
