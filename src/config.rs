// src/config.rs
//! Runtime configuration, read from the environment once at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-generate-preview";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub video_model: String,
    pub temperature: f32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJobConfig {
    /// Wait between two status checks.
    pub poll_interval: Duration,
    /// Status checks allowed before the job is reported as timed out.
    pub max_polls: u32,
    /// Directory downloaded videos are written to.
    pub output_dir: PathBuf,
}

impl Default for VideoJobConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_polls: 60,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub video: VideoJobConfig,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let mut gemini = GeminiConfig::new(api_key);
        if let Some(base_url) = get("GEMINI_BASE_URL") {
            gemini.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("GEMINI_TEXT_MODEL") {
            gemini.text_model = model;
        }
        if let Some(model) = get("GEMINI_VIDEO_MODEL") {
            gemini.video_model = model;
        }
        gemini.temperature =
            parse_or("GENERATION_TEMPERATURE", get("GENERATION_TEMPERATURE"), gemini.temperature)?;

        let defaults = VideoJobConfig::default();
        let video = VideoJobConfig {
            poll_interval: Duration::from_secs(parse_or(
                "VIDEO_POLL_INTERVAL_SECS",
                get("VIDEO_POLL_INTERVAL_SECS"),
                defaults.poll_interval.as_secs(),
            )?),
            max_polls: parse_or("VIDEO_MAX_POLLS", get("VIDEO_MAX_POLLS"), defaults.max_polls)?,
            output_dir: get("OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
        };

        Ok(Self {
            gemini,
            video,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(config.gemini.api_key, "secret");
        assert_eq!(config.gemini.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gemini.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.video, VideoJobConfig::default());
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GEMINI_API_KEY")));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_BASE_URL", "http://localhost:9000/"),
            ("VIDEO_POLL_INTERVAL_SECS", "2"),
            ("VIDEO_MAX_POLLS", "5"),
            ("OUTPUT_DIR", "/tmp/videos"),
        ]))
        .unwrap();
        assert_eq!(config.gemini.base_url, "http://localhost:9000");
        assert_eq!(config.video.poll_interval, Duration::from_secs(2));
        assert_eq!(config.video.max_polls, 5);
        assert_eq!(config.video.output_dir, PathBuf::from("/tmp/videos"));

        let invalid = lookup(&[("GEMINI_API_KEY", "k"), ("VIDEO_MAX_POLLS", "lots")]);
        let err = Config::from_lookup(invalid)
            .unwrap_err();
        assert_eq!(err.to_string(), "VIDEO_MAX_POLLS has an invalid value 'lots'");
    }
}
