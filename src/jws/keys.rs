use crate::error::Error;
use p256::ecdsa::SigningKey as P256SigningKey;
use p384::ecdsa::SigningKey as P384SigningKey;
use p521::ecdsa::SigningKey as P521SigningKey;
use pem::parse_many;
use pkcs8::DecodePrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::RsaPrivateKey;

#[derive(Clone)]
pub(crate) enum PrivateKey {
    Rsa(RsaPrivateKey),
    P256(P256SigningKey),
    P384(P384SigningKey),
    P521(P521SigningKey),
}

impl PrivateKey {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            PrivateKey::Rsa(_) => "RSA",
            PrivateKey::P256(_) => "EC P-256",
            PrivateKey::P384(_) => "EC P-384",
            PrivateKey::P521(_) => "EC P-521",
        }
    }
}

/// Loads the first usable private key from a PEM bundle.
///
/// Accepts PKCS#1 RSA, SEC1 EC and PKCS#8 (RSA or EC) blocks; certificates
/// and other blocks in the bundle are skipped.
pub(crate) fn load_private_key(pem_bytes: &[u8]) -> Result<PrivateKey, Error> {
    let blocks = parse_many(pem_bytes)
        .map_err(|e| Error::SigningFailure(format!("pem parse error: {e}")))?;
    for block in blocks {
        match block.tag() {
            "RSA PRIVATE KEY" => {
                if let Ok(key) = parse_rsa_private_pkcs1(block.contents()) {
                    return Ok(key);
                }
            }
            "EC PRIVATE KEY" => {
                if let Ok(key) = parse_ec_private_sec1(block.contents()) {
                    return Ok(key);
                }
            }
            "PRIVATE KEY" => {
                if let Ok(key) = parse_rsa_private_pkcs8(block.contents()) {
                    return Ok(key);
                }
                if let Ok(key) = parse_ec_private_pkcs8(block.contents()) {
                    return Ok(key);
                }
            }
            _ => {}
        }
    }
    Err(Error::SigningFailure(
        "unsupported private key format".to_string(),
    ))
}

fn parse_rsa_private_pkcs1(der: &[u8]) -> Result<PrivateKey, Error> {
    let key = RsaPrivateKey::from_pkcs1_der(der)
        .map_err(|e| Error::SigningFailure(format!("rsa pkcs1 private key error: {e}")))?;
    Ok(PrivateKey::Rsa(key))
}

fn parse_rsa_private_pkcs8(der: &[u8]) -> Result<PrivateKey, Error> {
    let key = RsaPrivateKey::from_pkcs8_der(der)
        .map_err(|e| Error::SigningFailure(format!("rsa pkcs8 private key error: {e}")))?;
    Ok(PrivateKey::Rsa(key))
}

fn parse_ec_private_pkcs8(der: &[u8]) -> Result<PrivateKey, Error> {
    if let Ok(secret) = p256::SecretKey::from_pkcs8_der(der) {
        return Ok(PrivateKey::P256(P256SigningKey::from(secret)));
    }
    if let Ok(secret) = p384::SecretKey::from_pkcs8_der(der) {
        return Ok(PrivateKey::P384(P384SigningKey::from(secret)));
    }
    if let Ok(secret) = p521::SecretKey::from_pkcs8_der(der) {
        let key = P521SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| Error::SigningFailure(format!("p521 signing key error: {e}")))?;
        return Ok(PrivateKey::P521(key));
    }
    Err(Error::SigningFailure(
        "unsupported ec pkcs8 private key".to_string(),
    ))
}

fn parse_ec_private_sec1(der: &[u8]) -> Result<PrivateKey, Error> {
    if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
        return Ok(PrivateKey::P256(P256SigningKey::from(secret)));
    }
    if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
        return Ok(PrivateKey::P384(P384SigningKey::from(secret)));
    }
    if let Ok(secret) = p521::SecretKey::from_sec1_der(der) {
        let key = P521SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|e| Error::SigningFailure(format!("p521 signing key error: {e}")))?;
        return Ok(PrivateKey::P521(key));
    }
    Err(Error::SigningFailure(
        "unsupported ec sec1 private key".to_string(),
    ))
}
