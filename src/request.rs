use std::fmt;

use log::debug;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use url::form_urlencoded;
use url::Url;

use crate::config::ProviderConfig;

pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// HTTP request sent to the token endpoint.
#[derive(Clone)]
pub struct TokenRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TokenRequest {
    /// Builds the client-assertion token request for `assertion`.
    ///
    /// Body order: `grant_type`, `client_assertion_type`, `client_assertion`,
    /// then `scope` when enabled, then configured extra parameters.
    pub fn build(config: &ProviderConfig, assertion: &str) -> Self {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("grant_type", &config.grant_type);
        params.append_pair("client_assertion_type", CLIENT_ASSERTION_TYPE_JWT_BEARER);
        params.append_pair("client_assertion", assertion);
        if config.use_scope {
            if let Some(ref scope) = config.scope {
                params.append_pair("scope", scope);
            }
        }
        for (key, value) in parse_pairs(&config.additional_body_params) {
            params.append_pair(&key, &value);
        }

        let mut headers = vec![("Content-Type".to_string(), CONTENT_TYPE_FORM.to_string())];
        headers.extend(
            parse_pairs(&config.additional_headers)
                .into_iter()
                .filter(|(name, value)| usable_extra_header(name, value)),
        );

        Self {
            method: Method::POST,
            url: config.token_endpoint.clone(),
            headers,
            body: params.finish(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body with the `client_assertion` value masked, for logging.
    pub fn redacted_body(&self) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        for (key, value) in form_urlencoded::parse(self.body.as_bytes()) {
            if key == "client_assertion" {
                params.append_pair(&key, "<redacted>");
            } else {
                params.append_pair(&key, &value);
            }
        }
        params.finish()
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body", &self.redacted_body())
            .finish()
    }
}

/// Extra headers must be valid on the wire and may not override the fixed
/// `Content-Type`.
fn usable_extra_header(name: &str, value: &str) -> bool {
    let usable = match HeaderName::from_bytes(name.as_bytes()) {
        Ok(header) => header != CONTENT_TYPE && HeaderValue::from_str(value).is_ok(),
        Err(_) => false,
    };
    if !usable {
        debug!("skipping extra header {name:?}");
    }
    usable
}

/// Parses `key : value, key : value` lists.
///
/// Segments that do not split into exactly one key and one value on `:` are
/// skipped, as are segments with an empty key or value. Blank input yields
/// nothing.
pub fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|segment| {
            let parts: Vec<&str> = segment.split(':').collect();
            let [key, value] = parts.as_slice() else {
                return None;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
