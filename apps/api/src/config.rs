use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{LlmSettings, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

const DEFAULT_SIGNED_URL_SECS: u64 = 60 * 60;
const DEFAULT_PREVIEW_URL_SECS: u64 = 60;
const DEFAULT_PDF_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CHROMIUM_PATH: &str = "chromium";
const DEFAULT_BUCKET: &str = "resumes";

/// Legacy variable names still honoured when the primary name is unset.
const ALIASES: &[(&str, &str)] = &[
    ("S3_BUCKET", "SUPABASE_RESUME_BUCKET"),
    ("SIGNED_URL_EXPIRES", "SUPABASE_SIGNED_URL_EXPIRES"),
];

/// Application configuration loaded from environment variables.
///
/// Only `PORT` and `RUST_LOG` have hard defaults; every collaborator is
/// optional and the service degrades to in-memory storage / no AI / no PDF
/// when its settings are absent.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub frontend_origin: Option<String>,
    pub database_url: Option<String>,
    pub s3: Option<S3Config>,
    pub openai_api_key: Option<Secret>,
    pub llm: LlmSettings,
    pub generate_pdf: bool,
    pub chromium_path: String,
    pub pdf_timeout: Duration,
    /// Lifetime of URLs returned by the generation endpoint.
    pub signed_url_ttl: Duration,
    /// Lifetime of URLs issued by the retrieval endpoints.
    pub preview_url_ttl: Duration,
    pub jwt_secret: Option<Secret>,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: Secret,
}

/// Credential value that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get = |key: &str| {
            raw(key).or_else(|| {
                ALIASES
                    .iter()
                    .find(|(primary, _)| *primary == key)
                    .and_then(|(_, alias)| raw(alias))
            })
        };

        let s3 = match get("S3_BUCKET") {
            Some(bucket) => Some(S3Config {
                bucket,
                endpoint: get("S3_ENDPOINT"),
                region: get("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require(&get, "AWS_ACCESS_KEY_ID")?,
                secret_access_key: Secret::new(require(&get, "AWS_SECRET_ACCESS_KEY")?),
            }),
            None => None,
        };

        Ok(Config {
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            frontend_origin: get("FRONTEND_ORIGIN").filter(|o| o != "*"),
            database_url: get("DATABASE_URL"),
            s3,
            openai_api_key: get("OPENAI_API_KEY").map(Secret::new),
            llm: LlmSettings {
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens: parse_or(&get, "OPENAI_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
                temperature: parse_or(&get, "OPENAI_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            },
            generate_pdf: get("GENERATE_PDF").is_some_and(|v| parse_flag(&v)),
            chromium_path: get("CHROMIUM_PATH").unwrap_or_else(|| DEFAULT_CHROMIUM_PATH.to_string()),
            pdf_timeout: Duration::from_secs(parse_or(
                &get,
                "PDF_TIMEOUT_SECS",
                DEFAULT_PDF_TIMEOUT_SECS,
            )?),
            signed_url_ttl: Duration::from_secs(parse_or(
                &get,
                "SIGNED_URL_EXPIRES",
                DEFAULT_SIGNED_URL_SECS,
            )?),
            preview_url_ttl: Duration::from_secs(parse_or(
                &get,
                "PREVIEW_URL_EXPIRES",
                DEFAULT_PREVIEW_URL_SECS,
            )?),
            jwt_secret: get("JWT_SECRET").map(Secret::new),
        })
    }

    pub fn bucket_name(&self) -> &str {
        self.s3
            .as_ref()
            .map(|s| s.bucket.as_str())
            .unwrap_or(DEFAULT_BUCKET)
    }
}

fn require(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
