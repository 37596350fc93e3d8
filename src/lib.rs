#![forbid(unsafe_code)]

mod algorithm;
mod claims;
mod client;
mod config;
mod error;
mod jws;
mod provider;
mod request;
mod response;
#[cfg(test)]
mod testutil;

pub use error::Error;

pub use algorithm::{
    ensure_compatible, validate, AlgorithmKind, HeaderAlgorithm, SigningAlgorithm,
    HEADER_ALGORITHM_NAMES, SIGNING_ALGORITHM_NAMES,
};

pub use config::{
    ConfigKey, IdentityDefaults, ProviderConfig, ProviderConfigBuilder, DEFAULT_GRANT_TYPE,
    DEFAULT_HEADER_TYPE,
};

pub use claims::{generate_jti, ClaimsSet, JoseHeader, ASSERTION_LIFETIME};

pub use jws::{JwsEncoder, JwsSigner, PemKeyStore};

pub use request::{parse_pairs, TokenRequest, CLIENT_ASSERTION_TYPE_JWT_BEARER, CONTENT_TYPE_FORM};

pub use response::TokenResponse;

pub use client::{
    HttpTransport, HttpTransportBuilder, TokenExchangeClient, TokenTransport, TransportResponse,
};

pub use provider::{JwtBearerProvider, LoginToken, RefreshResult, UserIdentity, REFRESH_MARKER};
