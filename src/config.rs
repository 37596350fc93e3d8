//! Typed provider configuration.
//!
//! Values arrive as named strings from a configuration collaborator. They are
//! trimmed, validated and converted once here; the rest of the crate only sees
//! [`ProviderConfig`].

use std::collections::HashMap;

use log::debug;
use serde_json::Value;
use url::Url;

use crate::algorithm::{ensure_compatible, HeaderAlgorithm, SigningAlgorithm};
use crate::error::Error;

pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";
pub const DEFAULT_HEADER_TYPE: &str = "JWT";

const DEFAULT_IDENTITY_ID: &str = "jwt-bearer-client";
const DEFAULT_IDENTITY_FIRST_NAME: &str = "JWT";
const DEFAULT_IDENTITY_LAST_NAME: &str = "Bearer";
const DEFAULT_IDENTITY_FULL_NAME: &str = "JWT Bearer Client";
const DEFAULT_IDENTITY_USERNAME: &str = "jwt-bearer-client";
const DEFAULT_IDENTITY_LOCALE: &str = "en_US";

/// Every configuration key the provider reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ProviderName,
    GrantType,
    TokenEndpoint,
    AdditionalHeaders,
    AdditionalBodyParams,
    HeaderAlgorithm,
    HeaderType,
    KeyId,
    Subject,
    Issuer,
    Audience,
    Certificate,
    SigningAlgorithm,
    Scope,
    UseScope,
    PerUserMode,
    LogRequests,
    LogResponses,
    PaddedSegments,
    IdentityId,
    IdentityFirstName,
    IdentityLastName,
    IdentityFullName,
    IdentityEmail,
    IdentityUsername,
    IdentityLocale,
    IdentityLink,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 27] = [
        ConfigKey::ProviderName,
        ConfigKey::GrantType,
        ConfigKey::TokenEndpoint,
        ConfigKey::AdditionalHeaders,
        ConfigKey::AdditionalBodyParams,
        ConfigKey::HeaderAlgorithm,
        ConfigKey::HeaderType,
        ConfigKey::KeyId,
        ConfigKey::Subject,
        ConfigKey::Issuer,
        ConfigKey::Audience,
        ConfigKey::Certificate,
        ConfigKey::SigningAlgorithm,
        ConfigKey::Scope,
        ConfigKey::UseScope,
        ConfigKey::PerUserMode,
        ConfigKey::LogRequests,
        ConfigKey::LogResponses,
        ConfigKey::PaddedSegments,
        ConfigKey::IdentityId,
        ConfigKey::IdentityFirstName,
        ConfigKey::IdentityLastName,
        ConfigKey::IdentityFullName,
        ConfigKey::IdentityEmail,
        ConfigKey::IdentityUsername,
        ConfigKey::IdentityLocale,
        ConfigKey::IdentityLink,
    ];

    /// Name of the key in string-keyed configuration sources.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::ProviderName => "auth_provider_name",
            ConfigKey::GrantType => "grant_type",
            ConfigKey::TokenEndpoint => "token_endpoint",
            ConfigKey::AdditionalHeaders => "additional_headers",
            ConfigKey::AdditionalBodyParams => "additional_body_params",
            ConfigKey::HeaderAlgorithm => "jws_header_alg",
            ConfigKey::HeaderType => "jws_header_typ",
            ConfigKey::KeyId => "jws_key_id",
            ConfigKey::Subject => "jwt_subject",
            ConfigKey::Issuer => "jwt_issuer",
            ConfigKey::Audience => "jwt_audience",
            ConfigKey::Certificate => "signing_certificate",
            ConfigKey::SigningAlgorithm => "signing_algorithm",
            ConfigKey::Scope => "scope",
            ConfigKey::UseScope => "use_scope",
            ConfigKey::PerUserMode => "per_user_mode",
            ConfigKey::LogRequests => "log_requests",
            ConfigKey::LogResponses => "log_responses",
            ConfigKey::PaddedSegments => "padded_segments",
            ConfigKey::IdentityId => "identity_id",
            ConfigKey::IdentityFirstName => "identity_first_name",
            ConfigKey::IdentityLastName => "identity_last_name",
            ConfigKey::IdentityFullName => "identity_full_name",
            ConfigKey::IdentityEmail => "identity_email",
            ConfigKey::IdentityUsername => "identity_username",
            ConfigKey::IdentityLocale => "identity_locale",
            ConfigKey::IdentityLink => "identity_link",
        }
    }
}

/// Placeholder identity reported for the authenticated system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityDefaults {
    pub identifier: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub locale: String,
    pub link: String,
}

impl Default for IdentityDefaults {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_IDENTITY_ID.to_string(),
            first_name: DEFAULT_IDENTITY_FIRST_NAME.to_string(),
            last_name: DEFAULT_IDENTITY_LAST_NAME.to_string(),
            full_name: DEFAULT_IDENTITY_FULL_NAME.to_string(),
            email: String::new(),
            username: DEFAULT_IDENTITY_USERNAME.to_string(),
            locale: DEFAULT_IDENTITY_LOCALE.to_string(),
            link: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_name: String,
    pub grant_type: String,
    pub token_endpoint: Url,
    /// Raw `key : value, key : value` header list.
    pub additional_headers: String,
    /// Raw `key : value, key : value` body parameter list.
    pub additional_body_params: String,
    pub header_algorithm: HeaderAlgorithm,
    pub header_type: String,
    pub key_id: Option<String>,
    /// Configured `sub` claim. In per-user mode a caller-supplied subject wins.
    pub subject: Option<String>,
    pub issuer: String,
    pub audience: String,
    /// Name of the certificate the signer should use.
    pub certificate: String,
    pub signing_algorithm: SigningAlgorithm,
    pub scope: Option<String>,
    pub use_scope: bool,
    pub per_user: bool,
    pub log_requests: bool,
    pub log_responses: bool,
    /// Keep `=` padding on Base64URL segments instead of stripping it.
    pub padded_segments: bool,
    pub identity: IdentityDefaults,
}

impl ProviderConfig {
    /// Returns a builder seeded with the token endpoint.
    pub fn builder(token_endpoint: impl Into<String>) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(token_endpoint)
    }

    /// Loads configuration from any key lookup, validating every value once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(ConfigKey) -> Option<String>,
    {
        let get = |key: ConfigKey| -> Option<String> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: ConfigKey| get(key).ok_or(Error::MissingConfig(key.as_str()));
        let flag = |key: ConfigKey| parse_flag(key, get(key).as_deref());

        let endpoint = required(ConfigKey::TokenEndpoint)?;
        let token_endpoint = Url::parse(&endpoint).map_err(|e| {
            Error::invalid_config(ConfigKey::TokenEndpoint.as_str(), e.to_string())
        })?;
        if !matches!(token_endpoint.scheme(), "http" | "https") {
            return Err(Error::invalid_config(
                ConfigKey::TokenEndpoint.as_str(),
                format!("unsupported scheme {:?}", token_endpoint.scheme()),
            ));
        }

        let header_algorithm: HeaderAlgorithm = get(ConfigKey::HeaderAlgorithm)
            .unwrap_or_default()
            .parse()?;
        let signing_algorithm: SigningAlgorithm = get(ConfigKey::SigningAlgorithm)
            .unwrap_or_default()
            .parse()?;
        ensure_compatible(header_algorithm, signing_algorithm)?;

        let per_user = flag(ConfigKey::PerUserMode)?;
        let subject = get(ConfigKey::Subject);
        if subject.is_none() && !per_user {
            return Err(Error::MissingConfig(ConfigKey::Subject.as_str()));
        }

        let use_scope = flag(ConfigKey::UseScope)?;
        let scope = get(ConfigKey::Scope);
        if use_scope && scope.is_none() {
            return Err(Error::MissingConfig(ConfigKey::Scope.as_str()));
        }

        let defaults = IdentityDefaults::default();
        let identity = IdentityDefaults {
            identifier: get(ConfigKey::IdentityId).unwrap_or(defaults.identifier),
            first_name: get(ConfigKey::IdentityFirstName).unwrap_or(defaults.first_name),
            last_name: get(ConfigKey::IdentityLastName).unwrap_or(defaults.last_name),
            full_name: get(ConfigKey::IdentityFullName).unwrap_or(defaults.full_name),
            email: get(ConfigKey::IdentityEmail).unwrap_or(defaults.email),
            username: get(ConfigKey::IdentityUsername).unwrap_or(defaults.username),
            locale: get(ConfigKey::IdentityLocale).unwrap_or(defaults.locale),
            link: get(ConfigKey::IdentityLink).unwrap_or(defaults.link),
        };

        let config = Self {
            provider_name: required(ConfigKey::ProviderName)?,
            grant_type: get(ConfigKey::GrantType).unwrap_or_else(|| DEFAULT_GRANT_TYPE.to_string()),
            token_endpoint,
            additional_headers: get(ConfigKey::AdditionalHeaders).unwrap_or_default(),
            additional_body_params: get(ConfigKey::AdditionalBodyParams).unwrap_or_default(),
            header_algorithm,
            header_type: get(ConfigKey::HeaderType)
                .unwrap_or_else(|| DEFAULT_HEADER_TYPE.to_string()),
            key_id: get(ConfigKey::KeyId),
            subject,
            issuer: required(ConfigKey::Issuer)?,
            audience: required(ConfigKey::Audience)?,
            certificate: required(ConfigKey::Certificate)?,
            signing_algorithm,
            scope,
            use_scope,
            per_user,
            log_requests: flag(ConfigKey::LogRequests)?,
            log_responses: flag(ConfigKey::LogResponses)?,
            padded_segments: flag(ConfigKey::PaddedSegments)?,
            identity,
        };
        debug!(
            "loaded provider config {} (alg={}, signer={}, endpoint={})",
            config.provider_name,
            config.header_algorithm,
            config.signing_algorithm,
            config.token_endpoint
        );
        Ok(config)
    }

    /// Loads configuration from a map keyed by [`ConfigKey::as_str`] names.
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, Error> {
        Self::from_lookup(|key| values.get(key.as_str()).cloned())
    }

    /// Loads configuration from a flat JSON object of strings, booleans and numbers.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::invalid_config("json", e.to_string()))?;
        let Value::Object(object) = value else {
            return Err(Error::invalid_config("json", "expected a JSON object"));
        };
        let mut values = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let value = match value {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null => continue,
                other => {
                    return Err(Error::invalid_config(
                        "json",
                        format!("unsupported value for {key}: {other}"),
                    ))
                }
            };
            values.insert(key, value);
        }
        Self::from_map(&values)
    }

    /// Subject for the `sub` claim of one assertion.
    pub(crate) fn subject_for<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        let requested = requested.map(str::trim).filter(|s| !s.is_empty());
        if self.per_user {
            requested.or(self.subject.as_deref())
        } else {
            self.subject.as_deref()
        }
    }
}

fn parse_flag(key: ConfigKey, value: Option<&str>) -> Result<bool, Error> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(Error::invalid_config(
            key.as_str(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}

/// Builder for [`ProviderConfig`]; `build` runs the same validation as the
/// map-based loaders.
#[derive(Debug, Clone)]
pub struct ProviderConfigBuilder {
    values: HashMap<ConfigKey, String>,
}

impl ProviderConfigBuilder {
    pub fn new(token_endpoint: impl Into<String>) -> Self {
        let mut values = HashMap::new();
        values.insert(ConfigKey::TokenEndpoint, token_endpoint.into());
        Self { values }
    }

    /// Sets a raw value for any key.
    pub fn set(mut self, key: ConfigKey, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn provider_name(self, value: impl Into<String>) -> Self {
        self.set(ConfigKey::ProviderName, value)
    }

    pub fn grant_type(self, value: impl Into<String>) -> Self {
        self.set(ConfigKey::GrantType, value)
    }

    pub fn additional_headers(self, value: impl Into<String>) -> Self {
        self.set(ConfigKey::AdditionalHeaders, value)
    }

    pub fn additional_body_params(self, value: impl Into<String>) -> Self {
        self.set(ConfigKey::AdditionalBodyParams, value)
    }

    /// Sets the JOSE header `alg` and the signer algorithm.
    pub fn algorithms(self, header: impl Into<String>, signing: impl Into<String>) -> Self {
        self.set(ConfigKey::HeaderAlgorithm, header)
            .set(ConfigKey::SigningAlgorithm, signing)
    }

    pub fn header_type(self, value: impl Into<String>) -> Self {
        self.set(ConfigKey::HeaderType, value)
    }

    pub fn key_id(self, value: impl Into<String>) -> Self {
        self.set(ConfigKey::KeyId, value)
    }

    /// Sets the `iss`, `sub` and `aud` claims.
    pub fn claims(
        self,
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        self.set(ConfigKey::Issuer, issuer)
            .set(ConfigKey::Subject, subject)
            .set(ConfigKey::Audience, audience)
    }

    pub fn certificate(self, value: impl Into<String>) -> Self {
        self.set(ConfigKey::Certificate, value)
    }

    /// Sends `scope` with every token request.
    pub fn scope(self, value: impl Into<String>) -> Self {
        self.set(ConfigKey::Scope, value)
            .set(ConfigKey::UseScope, "true")
    }

    pub fn per_user(self, enabled: bool) -> Self {
        self.set(ConfigKey::PerUserMode, enabled.to_string())
    }

    pub fn log_requests(self, enabled: bool) -> Self {
        self.set(ConfigKey::LogRequests, enabled.to_string())
    }

    pub fn log_responses(self, enabled: bool) -> Self {
        self.set(ConfigKey::LogResponses, enabled.to_string())
    }

    pub fn padded_segments(self, enabled: bool) -> Self {
        self.set(ConfigKey::PaddedSegments, enabled.to_string())
    }

    pub fn build(self) -> Result<ProviderConfig, Error> {
        ProviderConfig::from_lookup(|key| self.values.get(&key).cloned())
    }
}
