use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use p256::ecdsa::Signature as P256Signature;
use p384::ecdsa::Signature as P384Signature;
use p521::ecdsa::Signature as P521Signature;
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use sha2::{Sha256, Sha384, Sha512};
use signature::SignatureEncoding;
use signature::Signer as SignatureSigner;

use super::keys::{load_private_key, PrivateKey};
use crate::algorithm::SigningAlgorithm;
use crate::error::Error;

/// Certificate-backed signing capability.
///
/// Implementations own the key material; the token pipeline only hands over
/// a validated algorithm, the JWS signing input and the configured
/// certificate name. Must be safe to call from several threads at once.
pub trait JwsSigner: Send + Sync {
    fn sign(
        &self,
        algorithm: SigningAlgorithm,
        signing_input: &[u8],
        certificate: &str,
    ) -> Result<Vec<u8>, Error>;
}

impl<T: JwsSigner + ?Sized> JwsSigner for Arc<T> {
    fn sign(
        &self,
        algorithm: SigningAlgorithm,
        signing_input: &[u8],
        certificate: &str,
    ) -> Result<Vec<u8>, Error> {
        (**self).sign(algorithm, signing_input, certificate)
    }
}

impl<T: JwsSigner + ?Sized> JwsSigner for Box<T> {
    fn sign(
        &self,
        algorithm: SigningAlgorithm,
        signing_input: &[u8],
        certificate: &str,
    ) -> Result<Vec<u8>, Error> {
        (**self).sign(algorithm, signing_input, certificate)
    }
}

/// In-process key store mapping certificate names to PEM private keys.
///
/// RSA keys sign with RSASSA-PKCS1-v1_5. EC keys produce the fixed-width
/// `r || s` signature JWS expects, and only sign with the digest that matches
/// their curve.
#[derive(Clone, Default)]
pub struct PemKeyStore {
    keys: HashMap<String, PrivateKey>,
}

impl PemKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the key found in `private_key_pem` under `certificate`.
    pub fn with_pem(
        mut self,
        certificate: impl Into<String>,
        private_key_pem: &[u8],
    ) -> Result<Self, Error> {
        self.insert_pem(certificate, private_key_pem)?;
        Ok(self)
    }

    /// Adds or replaces the key for `certificate`.
    pub fn insert_pem(
        &mut self,
        certificate: impl Into<String>,
        private_key_pem: &[u8],
    ) -> Result<(), Error> {
        let key = load_private_key(private_key_pem)?;
        self.insert_key(certificate.into(), key);
        Ok(())
    }

    pub(crate) fn insert_key(&mut self, certificate: String, key: PrivateKey) {
        debug!("registered {} key for certificate {certificate}", key.describe());
        self.keys.insert(certificate, key);
    }

    pub fn contains(&self, certificate: &str) -> bool {
        self.keys.contains_key(certificate)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl JwsSigner for PemKeyStore {
    fn sign(
        &self,
        algorithm: SigningAlgorithm,
        signing_input: &[u8],
        certificate: &str,
    ) -> Result<Vec<u8>, Error> {
        let key = self.keys.get(certificate).ok_or_else(|| {
            Error::SigningFailure(format!("no key registered for certificate {certificate:?}"))
        })?;
        sign_with_key(key, algorithm, signing_input).ok_or_else(|| {
            Error::SigningFailure(format!(
                "certificate {certificate:?} holds an {} key which cannot sign {algorithm}",
                key.describe()
            ))
        })
    }
}

fn sign_with_key(key: &PrivateKey, algorithm: SigningAlgorithm, input: &[u8]) -> Option<Vec<u8>> {
    let signature = match (key, algorithm) {
        (PrivateKey::Rsa(rsa_key), SigningAlgorithm::RsaSha256) => {
            RsaSigningKey::<Sha256>::new(rsa_key.clone()).sign(input).to_vec()
        }
        (PrivateKey::Rsa(rsa_key), SigningAlgorithm::RsaSha384) => {
            RsaSigningKey::<Sha384>::new(rsa_key.clone()).sign(input).to_vec()
        }
        (PrivateKey::Rsa(rsa_key), SigningAlgorithm::RsaSha512) => {
            RsaSigningKey::<Sha512>::new(rsa_key.clone()).sign(input).to_vec()
        }
        (PrivateKey::P256(signing_key), SigningAlgorithm::EcdsaSha256) => {
            let sig: P256Signature = signing_key.sign(input);
            sig.to_bytes().to_vec()
        }
        (PrivateKey::P384(signing_key), SigningAlgorithm::EcdsaSha384) => {
            let sig: P384Signature = signing_key.sign(input);
            sig.to_bytes().to_vec()
        }
        (PrivateKey::P521(signing_key), SigningAlgorithm::EcdsaSha512) => {
            let sig: P521Signature = signing_key.sign(input);
            sig.to_bytes().to_vec()
        }
        _ => return None,
    };
    Some(signature)
}
