use std::env;
use std::str::FromStr;

use tracing::info;

use crate::error::RoamError;
use crate::types::{Coordinates, TRIVANDRUM};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://loremflickr.com/800/600";
pub const DEFAULT_COMMENT_UNLOCK_THRESHOLD: i64 = 5;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Generative service
    pub gemini_api_key: String,
    pub model: String,
    pub gemini_base_url: Option<String>,

    // Locale
    pub city_name: String,
    pub default_location: Coordinates,

    // Image search fallback
    pub image_base_url: String,

    // Community
    pub comment_unlock_threshold: i64,
}

impl Config {
    /// Load configuration for live upstream calls. `GEMINI_API_KEY` is required.
    pub fn from_env() -> Result<Self, RoamError> {
        let mut config = Self::offline_from_env()?;
        config.gemini_api_key = required_env("GEMINI_API_KEY")?;
        Ok(config)
    }

    /// Load everything except the API key (community board, local tooling).
    pub fn offline_from_env() -> Result<Self, RoamError> {
        let default_location = Coordinates::new(
            parse_env("ROAM_DEFAULT_LAT", TRIVANDRUM.latitude)?,
            parse_env("ROAM_DEFAULT_LNG", TRIVANDRUM.longitude)?,
        );
        if !default_location.is_valid() {
            return Err(RoamError::Config(format!(
                "ROAM_DEFAULT_LAT/ROAM_DEFAULT_LNG out of range: {}, {}",
                default_location.latitude, default_location.longitude
            )));
        }

        Ok(Self {
            gemini_api_key: String::new(),
            model: env::var("ROAM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            gemini_base_url: env::var("ROAM_GEMINI_BASE_URL").ok(),
            city_name: env::var("ROAM_CITY_NAME").unwrap_or_else(|_| "Trivandrum".to_string()),
            default_location,
            image_base_url: env::var("ROAM_IMAGE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_BASE_URL.to_string()),
            comment_unlock_threshold: parse_env(
                "ROAM_COMMENT_UNLOCK_THRESHOLD",
                DEFAULT_COMMENT_UNLOCK_THRESHOLD,
            )?,
        })
    }

    /// Defaults with a dummy key; never reads the environment.
    pub fn for_tests() -> Self {
        Self {
            gemini_api_key: "test-key".to_string(),
            model: DEFAULT_MODEL.to_string(),
            gemini_base_url: None,
            city_name: "Trivandrum".to_string(),
            default_location: TRIVANDRUM,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            comment_unlock_threshold: DEFAULT_COMMENT_UNLOCK_THRESHOLD,
        }
    }

    /// Log the effective configuration with the API key masked.
    pub fn log_redacted(&self) {
        info!(
            gemini_api_key = redact(&self.gemini_api_key),
            model = self.model.as_str(),
            gemini_base_url = self.gemini_base_url.as_deref().unwrap_or("default"),
            city = self.city_name.as_str(),
            lat = self.default_location.latitude,
            lng = self.default_location.longitude,
            image_base_url = self.image_base_url.as_str(),
            comment_unlock_threshold = self.comment_unlock_threshold,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> Result<String, RoamError> {
    env::var(key).map_err(|_| RoamError::Config(format!("{key} environment variable is required")))
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, RoamError> {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, RoamError> {
    raw.trim()
        .parse()
        .map_err(|_| RoamError::Config(format!("{key} must be a number, got '{raw}'")))
}

fn redact(secret: &str) -> String {
    match secret.len() {
        0 => "<unset>".to_string(),
        n if n <= 8 => "****".to_string(),
        _ => format!("{}****", secret.chars().take(4).collect::<String>()),
    }
}
