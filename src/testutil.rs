use std::cell::RefCell;
use std::sync::{Mutex, Once, OnceLock};

use log::{LevelFilter, Log, Metadata, Record};

use rand::thread_rng;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::RsaPrivateKey;

use crate::client::{TokenTransport, TransportResponse};
use crate::config::ProviderConfig;
use crate::error::Error;
use crate::jws::PemKeyStore;
use crate::request::TokenRequest;

pub(crate) const TEST_CERTIFICATE: &str = "signing_cert";

pub(crate) fn rsa_private_key_pem() -> &'static str {
    static PEM: OnceLock<String> = OnceLock::new();
    PEM.get_or_init(|| {
        let mut rng = thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 2048).expect("private key");
        key.to_pkcs1_pem(LineEnding::LF)
            .expect("private key pem")
            .to_string()
    })
    .as_str()
}

pub(crate) fn rsa_key_store() -> PemKeyStore {
    PemKeyStore::new()
        .with_pem(TEST_CERTIFICATE, rsa_private_key_pem().as_bytes())
        .expect("key store")
}

pub(crate) fn provider_config() -> ProviderConfig {
    ProviderConfig::builder("https://localhost/oauth/token")
        .provider_name("Service Login")
        .algorithms("RS512", "RSA-SHA512")
        .key_id("kid-1")
        .claims("client-id", "svc@example.com", "https://localhost")
        .certificate(TEST_CERTIFICATE)
        .build()
        .expect("config")
}

/// Transport answering every request with one canned response.
pub(crate) struct ScriptedTransport {
    response: Option<TransportResponse>,
    requests: Mutex<Vec<TokenRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(status: u16, body: &str) -> Self {
        Self {
            response: Some(TransportResponse {
                status,
                body: body.to_string(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<TokenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl TokenTransport for ScriptedTransport {
    fn execute(&self, request: &TokenRequest) -> Result<TransportResponse, Error> {
        self.requests.lock().unwrap().push(request.clone());
        self.response.clone().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        })
    }
}

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Records messages logged on the thread that is currently capturing.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        CAPTURED.with(|captured| {
            if let Some(lines) = captured.borrow_mut().as_mut() {
                lines.push(record.args().to_string());
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Runs `f` and returns every message it logged on this thread.
pub(crate) fn capture_logs<F: FnOnce()>(f: F) -> Vec<String> {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("test logger");
        log::set_max_level(LevelFilter::Debug);
    });
    CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
    f();
    CAPTURED.with(|captured| captured.borrow_mut().take().unwrap_or_default())
}
