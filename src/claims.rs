use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::algorithm::HeaderAlgorithm;
use crate::config::{ConfigKey, ProviderConfig};
use crate::error::Error;

/// Lifetime of every assertion (`exp` = now + this).
pub const ASSERTION_LIFETIME: Duration = Duration::from_secs(300);

/// JOSE header of the assertion. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoseHeader {
    pub alg: HeaderAlgorithm,
    pub typ: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// JWT claims of the assertion. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimsSet {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: i64,
    pub jti: String,
}

impl JoseHeader {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            alg: config.header_algorithm,
            typ: config.header_type.clone(),
            kid: config.key_id.clone(),
        }
    }
}

impl ClaimsSet {
    /// Builds claims expiring [`ASSERTION_LIFETIME`] from now with a fresh `jti`.
    ///
    /// `subject` only takes effect in per-user mode.
    pub fn from_config(config: &ProviderConfig, subject: Option<&str>) -> Result<Self, Error> {
        Self::from_config_at(config, subject, unix_time_now())
    }

    pub(crate) fn from_config_at(
        config: &ProviderConfig,
        subject: Option<&str>,
        now: i64,
    ) -> Result<Self, Error> {
        let sub = config
            .subject_for(subject)
            .ok_or(Error::MissingConfig(ConfigKey::Subject.as_str()))?;
        Ok(Self {
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            sub: sub.to_string(),
            exp: now + ASSERTION_LIFETIME.as_secs() as i64,
            jti: generate_jti(),
        })
    }
}

/// Returns 128 random bits from the OS generator, hex-encoded as
/// `8-4-4-4-12`.
pub fn generate_jti() -> String {
    let mut buf = [0u8; 16];
    OsRng.fill_bytes(&mut buf);
    let hex = hex::encode(buf);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

pub(crate) fn unix_time_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
