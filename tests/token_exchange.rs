mod common;

use std::time::Duration;

use common::{config_builder, json_response, key_store, private_key, serve_once};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use jwt_bearer_auth::{
    ConfigKey, Error, HttpTransport, JwtBearerProvider, PemKeyStore, ProviderConfig,
    CLIENT_ASSERTION_TYPE_JWT_BEARER,
};
use rsa::pkcs1::{EncodeRsaPublicKey, LineEnding};

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

fn http_provider(config: ProviderConfig) -> JwtBearerProvider<PemKeyStore, HttpTransport> {
    JwtBearerProvider::with_http(config, key_store()).expect("provider")
}

#[test]
fn callback_over_http_returns_token() {
    let (base_url, rx) = serve_once(json_response(
        "200 OK",
        r#"{"access_token":"access_token_value","token_type":"Bearer","expires_in":"1682439225"}"#,
    ));
    let provider = http_provider(config_builder(&base_url).build().expect("config"));

    let login = provider.handle_callback("state-123", None).expect("login");
    assert_eq!(login.access_token, "access_token_value");
    assert_eq!(login.state, "state-123");
    assert_eq!(login.provider_label, "Integration Login");

    let req = rx.recv_timeout(RECV_TIMEOUT).expect("request");
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/services/oauth2/token");
    assert_eq!(
        req.header_value("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(req.form_value("grant_type").as_deref(), Some("client_credentials"));
    assert_eq!(
        req.form_value("client_assertion_type").as_deref(),
        Some(CLIENT_ASSERTION_TYPE_JWT_BEARER)
    );

    let assertion = req.form_value("client_assertion").expect("assertion");
    let public_pem = private_key()
        .to_public_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("public pem");
    let key = DecodingKey::from_rsa_pem(public_pem.as_bytes()).expect("decoding key");
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["https://login.example.com"]);
    validation.set_issuer(&["client-id"]);
    let data = decode::<serde_json::Value>(&assertion, &key, &validation).expect("verified");
    assert_eq!(data.claims["sub"], "svc@example.com");
    assert_eq!(data.header.kid.as_deref(), Some("integration-kid"));
}

#[test]
fn extra_headers_and_params_reach_endpoint() {
    let (base_url, rx) = serve_once(json_response(
        "200 OK",
        r#"{"access_token":"t","token_type":"Bearer","expires_in":3600}"#,
    ));
    let config = config_builder(&base_url)
        .additional_headers("apiKey : X, apiId : Y")
        .additional_body_params("tenant : T&1")
        .scope("api")
        .build()
        .expect("config");
    let refreshed = http_provider(config).refresh(None).expect("refresh");
    assert_eq!(refreshed.access_token, "t");
    assert_eq!(refreshed.token_type, "Bearer");

    let req = rx.recv_timeout(RECV_TIMEOUT).expect("request");
    assert_eq!(req.header_value("apiKey"), Some("X"));
    assert_eq!(req.header_value("apiId"), Some("Y"));
    assert_eq!(req.form_value("scope").as_deref(), Some("api"));
    assert_eq!(req.form_value("tenant").as_deref(), Some("T&1"));
}

#[test]
fn unusable_extra_headers_do_not_abort_exchange() {
    let (base_url, rx) = serve_once(json_response(
        "200 OK",
        r#"{"access_token":"t","token_type":"Bearer"}"#,
    ));
    let config = config_builder(&base_url)
        .additional_headers("api key : X, Content-Type : text/plain, apiId : Y")
        .build()
        .expect("config");
    let refreshed = http_provider(config).refresh(None).expect("refresh");
    assert_eq!(refreshed.access_token, "t");

    let req = rx.recv_timeout(RECV_TIMEOUT).expect("request");
    assert_eq!(req.header_value("apiId"), Some("Y"));
    assert_eq!(req.header_value("api key"), None);
    let content_types: Vec<&str> = req
        .headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(content_types, vec!["application/x-www-form-urlencoded"]);
}

#[test]
fn unauthorized_response_carries_body() {
    let (base_url, rx) = serve_once(json_response(
        "401 Unauthorized",
        r#"{"error":"invalid_client","error_description":"bad assertion"}"#,
    ));
    let provider = http_provider(config_builder(&base_url).build().expect("config"));

    let err = provider.handle_callback("state", None).expect_err("401");
    match err {
        Error::UnexpectedTokenResponse { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid_client"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(rx.recv_timeout(RECV_TIMEOUT).is_ok());
}

#[test]
fn symmetric_algorithm_is_rejected_before_any_request() {
    let (base_url, rx) = serve_once(json_response("200 OK", r#"{"access_token":"t"}"#));
    let err = config_builder(&base_url)
        .set(ConfigKey::HeaderAlgorithm, "HS256")
        .build()
        .expect_err("HS256");
    assert!(matches!(err, Error::InvalidAlgorithm { .. }));
    assert!(err.is_local());
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn config_loads_from_json() {
    let json = r#"{
        "auth_provider_name": "Json Login",
        "token_endpoint": "https://login.example.com/token",
        "jws_header_alg": "ES256",
        "signing_algorithm": "ECDSA-SHA256",
        "jwt_issuer": "client-id",
        "jwt_subject": "svc",
        "jwt_audience": "https://login.example.com",
        "signing_certificate": "ec_cert",
        "padded_segments": true,
        "jws_key_id": null
    }"#;
    let config = ProviderConfig::from_json_str(json).expect("config");
    assert_eq!(config.provider_name, "Json Login");
    assert!(config.padded_segments);
    assert!(config.key_id.is_none());
    assert_eq!(config.grant_type, "client_credentials");
}
