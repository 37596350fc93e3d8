//! Signing algorithm tables for the JOSE header and the certificate signer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Header algorithm names accepted in the JOSE `alg` field.
pub const HEADER_ALGORITHM_NAMES: &[&str] = &["RS256", "RS384", "RS512", "ES256", "ES384", "ES512"];

/// Algorithm names accepted by the certificate signer.
pub const SIGNING_ALGORITHM_NAMES: &[&str] = &[
    "RSA-SHA256",
    "RSA-SHA384",
    "RSA-SHA512",
    "ECDSA-SHA256",
    "ECDSA-SHA384",
    "ECDSA-SHA512",
];

/// Which algorithm table a candidate name is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Header,
    Signing,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmKind::Header => f.write_str("header"),
            AlgorithmKind::Signing => f.write_str("signing"),
        }
    }
}

/// JOSE header `alg` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAlgorithm {
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
    ES512,
}

impl HeaderAlgorithm {
    pub const ALL: [HeaderAlgorithm; 6] = [
        HeaderAlgorithm::RS256,
        HeaderAlgorithm::RS384,
        HeaderAlgorithm::RS512,
        HeaderAlgorithm::ES256,
        HeaderAlgorithm::ES384,
        HeaderAlgorithm::ES512,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderAlgorithm::RS256 => "RS256",
            HeaderAlgorithm::RS384 => "RS384",
            HeaderAlgorithm::RS512 => "RS512",
            HeaderAlgorithm::ES256 => "ES256",
            HeaderAlgorithm::ES384 => "ES384",
            HeaderAlgorithm::ES512 => "ES512",
        }
    }

    /// Returns the signer algorithm of the same family and digest.
    pub fn signing_counterpart(&self) -> SigningAlgorithm {
        match self {
            HeaderAlgorithm::RS256 => SigningAlgorithm::RsaSha256,
            HeaderAlgorithm::RS384 => SigningAlgorithm::RsaSha384,
            HeaderAlgorithm::RS512 => SigningAlgorithm::RsaSha512,
            HeaderAlgorithm::ES256 => SigningAlgorithm::EcdsaSha256,
            HeaderAlgorithm::ES384 => SigningAlgorithm::EcdsaSha384,
            HeaderAlgorithm::ES512 => SigningAlgorithm::EcdsaSha512,
        }
    }
}

impl FromStr for HeaderAlgorithm {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = validate(AlgorithmKind::Header, value)?;
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == name)
            .ok_or_else(|| Error::InvalidAlgorithm {
                kind: AlgorithmKind::Header,
                candidate: value.to_string(),
            })
    }
}

impl fmt::Display for HeaderAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algorithm handed to the certificate signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    RsaSha256,
    RsaSha384,
    RsaSha512,
    EcdsaSha256,
    EcdsaSha384,
    EcdsaSha512,
}

impl SigningAlgorithm {
    pub const ALL: [SigningAlgorithm; 6] = [
        SigningAlgorithm::RsaSha256,
        SigningAlgorithm::RsaSha384,
        SigningAlgorithm::RsaSha512,
        SigningAlgorithm::EcdsaSha256,
        SigningAlgorithm::EcdsaSha384,
        SigningAlgorithm::EcdsaSha512,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::RsaSha256 => "RSA-SHA256",
            SigningAlgorithm::RsaSha384 => "RSA-SHA384",
            SigningAlgorithm::RsaSha512 => "RSA-SHA512",
            SigningAlgorithm::EcdsaSha256 => "ECDSA-SHA256",
            SigningAlgorithm::EcdsaSha384 => "ECDSA-SHA384",
            SigningAlgorithm::EcdsaSha512 => "ECDSA-SHA512",
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = validate(AlgorithmKind::Signing, value)?;
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == name)
            .ok_or_else(|| Error::InvalidAlgorithm {
                kind: AlgorithmKind::Signing,
                candidate: value.to_string(),
            })
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! serde_via_str {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_via_str!(HeaderAlgorithm);
serde_via_str!(SigningAlgorithm);

/// Checks `candidate` against the table for `kind` and returns the matching
/// table entry.
///
/// Surrounding whitespace is ignored; matching is otherwise exact.
pub fn validate(kind: AlgorithmKind, candidate: &str) -> Result<&'static str, Error> {
    let names = match kind {
        AlgorithmKind::Header => HEADER_ALGORITHM_NAMES,
        AlgorithmKind::Signing => SIGNING_ALGORITHM_NAMES,
    };
    let trimmed = candidate.trim();
    names
        .iter()
        .copied()
        .find(|name| !trimmed.is_empty() && *name == trimmed)
        .ok_or_else(|| Error::InvalidAlgorithm {
            kind,
            candidate: candidate.to_string(),
        })
}

/// Rejects header/signer pairs from different key families or digest sizes.
pub fn ensure_compatible(header: HeaderAlgorithm, signing: SigningAlgorithm) -> Result<(), Error> {
    if header.signing_counterpart() == signing {
        Ok(())
    } else {
        Err(Error::AlgorithmMismatch {
            header: header.as_str().to_string(),
            signing: signing.as_str().to_string(),
        })
    }
}
