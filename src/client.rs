use log::{debug, warn};
use reqwest::blocking::Client as HttpClient;
use reqwest::{Certificate, Identity, StatusCode};
use std::time::Duration;

use crate::error::{read_body_with_limit, Error, MAX_ERROR_BODY_BYTES};
use crate::request::TokenRequest;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body returned by a [`TokenTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a token request and hands back the raw response.
///
/// Implementations perform exactly one attempt; timeouts belong to the
/// transport.
pub trait TokenTransport: Send + Sync {
    fn execute(&self, request: &TokenRequest) -> Result<TransportResponse, Error>;
}

impl<T: TokenTransport + ?Sized> TokenTransport for std::sync::Arc<T> {
    fn execute(&self, request: &TokenRequest) -> Result<TransportResponse, Error> {
        (**self).execute(request)
    }
}

impl<T: TokenTransport + ?Sized> TokenTransport for Box<T> {
    fn execute(&self, request: &TokenRequest) -> Result<TransportResponse, Error> {
        (**self).execute(request)
    }
}

pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    identity: Option<Identity>,
    ca_certs: Vec<Certificate>,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            identity: None,
            ca_certs: Vec::new(),
        }
    }
}

impl HttpTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Removes the request timeout entirely.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn mtls_identity_from_pem(mut self, identity_pem: &[u8]) -> Result<Self, Error> {
        self.identity = Some(Identity::from_pem(identity_pem)?);
        Ok(self)
    }

    pub fn add_ca_cert_pem(mut self, ca_pem: &[u8]) -> Result<Self, Error> {
        self.ca_certs.push(Certificate::from_pem(ca_pem)?);
        Ok(self)
    }

    pub fn build(self) -> Result<HttpTransport, Error> {
        let mut builder = HttpClient::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(identity) = self.identity {
            builder = builder.identity(identity);
        }
        for cert in self.ca_certs {
            builder = builder.add_root_certificate(cert);
        }
        Ok(HttpTransport {
            http: builder.build()?,
        })
    }
}

/// Blocking `reqwest` transport. Redirects are not followed.
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    pub fn new() -> Result<Self, Error> {
        HttpTransportBuilder::new().build()
    }
}

impl TokenTransport for HttpTransport {
    fn execute(&self, request: &TokenRequest) -> Result<TransportResponse, Error> {
        let mut req = self
            .http
            .request(request.method.clone(), request.url.clone())
            .body(request.body.clone());
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        let resp = req.send()?;
        let status = resp.status();
        let body = if status == StatusCode::OK {
            resp.text()?
        } else {
            read_body_with_limit(resp, MAX_ERROR_BODY_BYTES)?
        };
        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Sends token requests and accepts only `200 OK` responses.
pub struct TokenExchangeClient<T> {
    transport: T,
}

impl<T: TokenTransport> TokenExchangeClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the raw body of a `200 OK` response.
    ///
    /// Any other status fails with [`Error::UnexpectedTokenResponse`] carrying
    /// the body. There is no retry.
    pub fn send(&self, request: &TokenRequest) -> Result<String, Error> {
        debug!("POST {}", request.url);
        let response = self.transport.execute(request)?;
        if response.status == StatusCode::OK.as_u16() {
            Ok(response.body)
        } else {
            warn!(
                "token endpoint {} answered status {}",
                request.url, response.status
            );
            Err(Error::UnexpectedTokenResponse {
                status: response.status,
                body: response.body,
            })
        }
    }
}
