use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Serialize;

use super::signer::JwsSigner;
use crate::algorithm::SigningAlgorithm;
use crate::claims::{ClaimsSet, JoseHeader};
use crate::error::Error;

/// Produces JWS compact serializations (`header.payload.signature`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JwsEncoder {
    padded: bool,
}

impl JwsEncoder {
    /// Encoder emitting unpadded Base64URL segments (RFC 7515).
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps trailing `=` padding on every segment.
    pub fn padded(mut self, padded: bool) -> Self {
        self.padded = padded;
        self
    }

    pub fn encode_segment(&self, bytes: &[u8]) -> String {
        if self.padded {
            URL_SAFE.encode(bytes)
        } else {
            URL_SAFE_NO_PAD.encode(bytes)
        }
    }

    /// Returns `b64(header) "." b64(claims)`.
    pub fn signing_input(&self, header: &JoseHeader, claims: &ClaimsSet) -> Result<String, Error> {
        let header = self.encode_json(header)?;
        let claims = self.encode_json(claims)?;
        Ok(format!("{header}.{claims}"))
    }

    /// Serializes, signs and joins the assertion.
    ///
    /// Any signer error surfaces as [`Error::SigningFailure`].
    pub fn encode<S: JwsSigner + ?Sized>(
        &self,
        header: &JoseHeader,
        claims: &ClaimsSet,
        signer: &S,
        algorithm: SigningAlgorithm,
        certificate: &str,
    ) -> Result<String, Error> {
        let signing_input = self.signing_input(header, claims)?;
        let signature = signer
            .sign(algorithm, signing_input.as_bytes(), certificate)
            .map_err(|e| match e {
                Error::SigningFailure(_) => e,
                other => Error::SigningFailure(other.to_string()),
            })?;
        if signature.is_empty() {
            return Err(Error::SigningFailure(
                "signer returned an empty signature".to_string(),
            ));
        }
        let signature = self.encode_segment(&signature);
        Ok(format!("{signing_input}.{signature}"))
    }

    fn encode_json<T: Serialize>(&self, value: &T) -> Result<String, Error> {
        let json = serde_json::to_vec(value)
            .map_err(|e| Error::SigningFailure(format!("serialize jws segment: {e}")))?;
        Ok(self.encode_segment(&json))
    }
}
