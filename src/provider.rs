//! Token acquisition pipeline and the caller-facing surfaces built on it.

use log::{debug, info};
use url::Url;

use crate::algorithm::ensure_compatible;
use crate::claims::{ClaimsSet, JoseHeader};
use crate::client::{HttpTransport, TokenExchangeClient, TokenTransport};
use crate::config::ProviderConfig;
use crate::error::Error;
use crate::jws::{JwsEncoder, JwsSigner};
use crate::request::TokenRequest;
use crate::response::TokenResponse;

/// Placeholder handed back where a refresh token would normally go. This
/// flow never issues refresh tokens; every refresh re-mints an assertion.
pub const REFRESH_MARKER: &str = "NotApplicable";

/// Result of the initial login callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginToken {
    pub provider_label: String,
    pub access_token: String,
    pub refresh_marker: String,
    pub state: String,
}

/// Result of a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshResult {
    pub access_token: String,
    pub token_type: String,
}

/// Identity reported for the authenticated system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub identifier: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub link: String,
    pub username: String,
    pub locale: String,
    pub provider: String,
}

/// JWT bearer token provider.
///
/// Holds only read-only configuration and the two collaborators, so one
/// instance can serve concurrent callers.
pub struct JwtBearerProvider<S, T> {
    config: ProviderConfig,
    signer: S,
    exchange: TokenExchangeClient<T>,
    encoder: JwsEncoder,
}

impl<S: JwsSigner> JwtBearerProvider<S, HttpTransport> {
    /// Creates a provider that talks to the token endpoint over `reqwest`.
    pub fn with_http(config: ProviderConfig, signer: S) -> Result<Self, Error> {
        Self::new(config, signer, HttpTransport::new()?)
    }
}

impl<S: JwsSigner, T: TokenTransport> JwtBearerProvider<S, T> {
    pub fn new(config: ProviderConfig, signer: S, transport: T) -> Result<Self, Error> {
        ensure_compatible(config.header_algorithm, config.signing_algorithm)?;
        let encoder = JwsEncoder::new().padded(config.padded_segments);
        Ok(Self {
            config,
            signer,
            exchange: TokenExchangeClient::new(transport),
            encoder,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.exchange.transport()
    }

    /// Signs a fresh assertion for `subject` (per-user mode only) and returns
    /// the compact JWS.
    pub fn mint_assertion(&self, subject: Option<&str>) -> Result<String, Error> {
        let header = JoseHeader::from_config(&self.config);
        let claims = ClaimsSet::from_config(&self.config, subject)?;
        debug!(
            "minting assertion jti={} sub={} exp={}",
            claims.jti, claims.sub, claims.exp
        );
        self.encoder.encode(
            &header,
            &claims,
            &self.signer,
            self.config.signing_algorithm,
            &self.config.certificate,
        )
    }

    /// Runs one full acquisition cycle: claims, signature, request, exchange,
    /// parse. The first failing stage aborts the cycle.
    pub fn retrieve_token(&self, subject: Option<&str>) -> Result<TokenResponse, Error> {
        let assertion = self.mint_assertion(subject)?;
        let request = TokenRequest::build(&self.config, &assertion);
        if self.config.log_requests {
            debug!("token request: {request:?}");
        }
        let body = self.exchange.send(&request)?;
        let response = TokenResponse::parse(&body)?;
        if self.config.log_responses {
            debug!(
                "token response: token_type={} expires_in={:?} scope={:?}",
                response.token_type, response.expires_in, response.scope
            );
        }
        info!(
            "{}: obtained {} access token",
            self.config.provider_name, response.token_type
        );
        Ok(response)
    }

    /// Starts a login. There is no remote consent page in this flow, so the
    /// caller is sent straight to `callback_url` with `state` attached.
    pub fn initiate(&self, callback_url: &str, state: &str) -> Result<Url, Error> {
        let mut url = Url::parse(callback_url)?;
        url.query_pairs_mut().append_pair("state", state);
        Ok(url)
    }

    /// Completes a login, echoing `state` unchanged.
    pub fn handle_callback(&self, state: &str, subject: Option<&str>) -> Result<LoginToken, Error> {
        let response = self.retrieve_token(subject)?;
        Ok(LoginToken {
            provider_label: self.config.provider_name.clone(),
            access_token: response.access_token,
            refresh_marker: REFRESH_MARKER.to_string(),
            state: state.to_string(),
        })
    }

    /// Obtains a new access token by signing a new assertion.
    pub fn refresh(&self, subject: Option<&str>) -> Result<RefreshResult, Error> {
        let response = self.retrieve_token(subject)?;
        Ok(RefreshResult {
            access_token: response.access_token,
            token_type: response.token_type,
        })
    }

    pub fn user_info(&self) -> UserIdentity {
        let identity = &self.config.identity;
        UserIdentity {
            identifier: identity.identifier.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            full_name: identity.full_name.clone(),
            email: identity.email.clone(),
            link: identity.link.clone(),
            username: identity.username.clone(),
            locale: identity.locale.clone(),
            provider: self.config.provider_name.clone(),
        }
    }
}
