use anyhow::Context;
use std::env;
use url::Url;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Database settings
    pub database_url: Option<String>,

    /// Public base URL embedded in email verification links.
    pub app_base_url: Url,

    // Authentication secrets: base64 HS256 signing key, Argon2 pepper,
    // and the HMAC key for token digests at rest
    pub auth_token_secret: String,
    pub auth_password_pepper: String,
    pub auth_token_digest_key: String,

    // Mail gateway settings; without a gateway URL the server falls back
    // to the log-only mailer
    pub mail_gateway_url: Option<String>,
    pub mail_from: String,

    // CORS settings
    pub cors_allowed_origins: Vec<String>,

    // Development settings
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let server_host =
            env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port: u16 = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let app_base_url = env::var("APP_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{server_port}"));
        let app_base_url = Url::parse(&app_base_url).with_context(|| {
            format!("APP_BASE_URL is not a valid URL: {app_base_url}")
        })?;

        Ok(Self {
            server_host,
            server_port,

            database_url: env::var("DATABASE_URL").ok(),

            app_base_url,

            auth_token_secret: env::var("AUTH_TOKEN_SECRET").unwrap_or_else(
                |_| "Y2hhbmdlLW1lLXRva2VuLXNlY3JldA==".to_string(),
            ),
            auth_password_pepper: env::var("AUTH_PASSWORD_PEPPER")
                .unwrap_or_else(|_| "change-me-password-pepper".to_string()),
            auth_token_digest_key: env::var("AUTH_TOKEN_DIGEST_KEY")
                .unwrap_or_else(|_| "change-me-digest-key".to_string()),

            mail_gateway_url: env::var("MAIL_GATEWAY_URL").ok(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@vendex.io".to_string()),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| {
                    "http://localhost:3000,http://localhost:5173".to_string()
                })
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            dev_mode: env::var("DEV_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }
}
