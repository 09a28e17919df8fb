// src/config.rs

use dotenvy::dotenv;
use std::env;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    /// When unset the server falls back to the JSON file store.
    pub database_url: Option<String>,
    /// Snapshot path used by the local file store.
    pub data_file: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Code faculty members must present when registering an ADMIN account.
    pub faculty_code: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_base_url: Url,
    pub ai_model: String,
    pub ai_enabled: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok();

        let data_file =
            env::var("DATA_FILE").unwrap_or_else(|_| "data/campus_quiz.json".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let faculty_code =
            env::var("FACULTY_CODE").unwrap_or_else(|_| "AUS_FACULTY".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let ai_api_key = env::var("AI_API_KEY").ok();

        let ai_base_url = env::var("AI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string())
            .parse::<Url>()
            .expect("AI_BASE_URL must be a valid URL");

        let ai_model =
            env::var("AI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let ai_enabled = env::var("AI_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            database_url,
            data_file,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            faculty_code,
            admin_username,
            admin_password,
            ai_api_key,
            ai_base_url,
            ai_model,
            ai_enabled,
        }
    }
}
