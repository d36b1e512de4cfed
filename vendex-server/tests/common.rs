#![allow(unused)]

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, header},
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use vendex_core::auth::{
    AuthCrypto, AuthService, TokenCodec, ensure_default_roles,
};
use vendex_core::mailer::{EmailDetails, MailError, Mailer};
use vendex_core::store::{MemoryStore, RoleStore};
use vendex_server::{AppState, create_app, infra::config::Config};

/// Mailer stub that records every dispatched verification mail.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: RwLock<Vec<EmailDetails>>,
}

impl RecordingMailer {
    pub fn sent_count(&self) -> usize {
        self.sent.read().expect("lock poisoned").len()
    }

    pub fn last_link(&self) -> Option<String> {
        self.sent
            .read()
            .expect("lock poisoned")
            .last()
            .map(|details| details.link.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        details: EmailDetails,
        _template: &str,
    ) -> Result<(), MailError> {
        self.sent.write().expect("lock poisoned").push(details);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub mailer: Arc<RecordingMailer>,
}

fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: None,
        app_base_url: Url::parse("http://localhost:8080")
            .expect("static url parses"),
        auth_token_secret: STANDARD.encode("integration-test-secret"),
        auth_password_pepper: "integration-test-pepper".to_string(),
        auth_token_digest_key: "integration-test-hmac".to_string(),
        mail_gateway_url: None,
        mail_from: "no-reply@vendex.test".to_string(),
        cors_allowed_origins: vec![],
        dev_mode: true,
    }
}

/// Assemble the real application over the in-memory store and a recording
/// mailer, wired exactly as `main` wires the production resources.
pub async fn build_test_app() -> TestApp {
    let store = MemoryStore::new();
    let roles: Arc<dyn RoleStore> = Arc::new(store.clone());
    ensure_default_roles(roles.as_ref())
        .await
        .expect("failed to seed default roles");

    let config = Arc::new(test_config());
    let crypto = Arc::new(
        AuthCrypto::new("integration-test-pepper", "integration-test-hmac")
            .expect("failed to initialise AuthCrypto"),
    );
    let codec = Arc::new(
        TokenCodec::new(&config.auth_token_secret)
            .expect("failed to build token codec"),
    );
    let mailer = Arc::new(RecordingMailer::default());

    let auth_service = Arc::new(AuthService::new(
        Arc::new(store.clone()),
        roles,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        crypto,
        codec,
        mailer.clone(),
        config.app_base_url.clone(),
    ));

    let state = AppState::new(auth_service, Arc::clone(&config));

    TestApp {
        router: create_app(state),
        store,
        mailer,
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    body: &impl Serialize,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(body).expect("serialize request body"),
        ))
        .expect("build request")
}

pub fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("build request")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub async fn parse_json_response<T: DeserializeOwned>(response: Response) -> T {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse response json")
}

/// Pull the confirmation token out of the most recent verification link.
pub fn confirmation_token_from(mailer: &RecordingMailer) -> String {
    let link = mailer.last_link().expect("verification mail recorded");
    let url = Url::parse(&link).expect("verification link is a url");
    url.query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .expect("verification link carries a token")
}
