use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::CliError;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_IMAGE_QUALITY: &str = "standard";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const APP_DIR: &str = "script-review";

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_image_quality() -> String {
    DEFAULT_IMAGE_QUALITY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_quality")]
    pub image_quality: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            image_quality: default_image_quality(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub profile: String,
    pub profiles: HashMap<String, ProfileConfig>,
}

impl Default for CliConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("default".to_string(), ProfileConfig::default());
        Self {
            profile: "default".to_string(),
            profiles,
        }
    }
}

fn app_dir() -> Result<PathBuf, CliError> {
    let base = dirs::config_dir().ok_or_else(|| {
        CliError::Generic("Could not resolve config directory for this OS.".to_string())
    })?;
    Ok(base.join(APP_DIR))
}

pub fn config_path() -> Result<PathBuf, CliError> {
    Ok(app_dir()?.join("config.json"))
}

pub fn tui_log_path() -> Result<PathBuf, CliError> {
    Ok(app_dir()?.join("tui.log"))
}

pub fn load_config() -> Result<CliConfig, CliError> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }

    let text = fs::read_to_string(&path)?;
    parse_config(&text)
}

fn parse_config(text: &str) -> Result<CliConfig, CliError> {
    let mut config: CliConfig = serde_json::from_str(text)?;
    let profile = config.profile.clone();
    ensure_profile(&mut config, &profile);
    Ok(config)
}

pub fn save_config(config: &CliConfig) -> Result<PathBuf, CliError> {
    let path = config_path()?;
    let parent = path
        .parent()
        .ok_or_else(|| CliError::Generic("Invalid config path.".to_string()))?;
    fs::create_dir_all(parent)?;
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok(path)
}

pub fn active_profile_name(config: &CliConfig, profile_override: Option<&str>) -> String {
    profile_override
        .map(|s| s.to_string())
        .unwrap_or_else(|| config.profile.clone())
}

pub fn ensure_profile(config: &mut CliConfig, profile_name: &str) {
    if !config.profiles.contains_key(profile_name) {
        config
            .profiles
            .insert(profile_name.to_string(), ProfileConfig::default());
    }
}

pub fn profile_ref<'a>(config: &'a CliConfig, profile_name: &str) -> Option<&'a ProfileConfig> {
    config.profiles.get(profile_name)
}

pub fn profile_mut<'a>(
    config: &'a mut CliConfig,
    profile_name: &str,
) -> Option<&'a mut ProfileConfig> {
    config.profiles.get_mut(profile_name)
}

pub fn require_profile<'a>(
    config: &'a CliConfig,
    profile_name: &str,
) -> Result<&'a ProfileConfig, CliError> {
    profile_ref(config, profile_name)
        .ok_or_else(|| CliError::Usage(format!("Profile '{profile_name}' does not exist.")))
}

pub fn resolve_api_url(
    config: &CliConfig,
    profile_name: &str,
    api_override: Option<&str>,
) -> Result<String, CliError> {
    if let Some(url) = api_override {
        validate_url(url)?;
        return Ok(url.to_string());
    }

    let profile = require_profile(config, profile_name)?;
    validate_url(&profile.api_url)?;
    Ok(profile.api_url.clone())
}

pub fn resolve_api_key(config: &CliConfig, profile_name: &str) -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            return Some(key.trim().to_string());
        }
    }

    profile_ref(config, profile_name)
        .and_then(|p| p.api_key.clone())
        .filter(|k| !k.trim().is_empty())
}

pub fn validate_url(value: &str) -> Result<(), CliError> {
    let parsed = Url::parse(value)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(CliError::Usage(
            "API URL must use http:// or https://.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_profiles_pick_up_model_defaults() {
        let text = r#"{
            "profile": "work",
            "profiles": {
                "work": { "api_url": "https://proxy.example.com/v1", "api_key": "sk-test" }
            }
        }"#;
        let config = parse_config(text).unwrap();
        let profile = profile_ref(&config, "work").unwrap();
        assert_eq!(profile.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(profile.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(profile.image_quality, DEFAULT_IMAGE_QUALITY);
    }

    #[test]
    fn missing_active_profile_is_created() {
        let text = r#"{ "profile": "fresh", "profiles": {} }"#;
        let config = parse_config(text).unwrap();
        assert!(profile_ref(&config, "fresh").is_some());
    }

    #[test]
    fn override_wins_over_profile_url() {
        let config = CliConfig::default();
        let url = resolve_api_url(&config, "default", Some("http://localhost:8080/v1")).unwrap();
        assert_eq!(url, "http://localhost:8080/v1");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(CliError::Usage(_))
        ));
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn unknown_profile_is_a_usage_error() {
        let config = CliConfig::default();
        assert!(matches!(
            resolve_api_url(&config, "nope", None),
            Err(CliError::Usage(_))
        ));
    }
}
