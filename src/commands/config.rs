use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::app::Runtime;
use crate::config::{
    API_KEY_ENV, ProfileConfig, ensure_profile, profile_mut, save_config, validate_url,
};
use crate::errors::{CliError, redact_secret};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Initialize config file and profile
    Init {
        #[arg(long = "api-url")]
        api_url: Option<String>,
        #[arg(long = "api-key")]
        api_key: Option<String>,
    },
    /// Read a config key from the active profile
    Get {
        key: ConfigKey,
        #[arg(long)]
        show_key: bool,
    },
    /// Set a config key on the active profile
    Set { key: ConfigKey, value: String },
    /// List all profiles
    Profiles,
    /// Switch active profile
    Use { profile: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigKey {
    #[value(name = "apiUrl")]
    ApiUrl,
    #[value(name = "apiKey")]
    ApiKey,
    #[value(name = "chatModel")]
    ChatModel,
    #[value(name = "imageModel")]
    ImageModel,
    #[value(name = "imageQuality")]
    ImageQuality,
}

impl ConfigKey {
    fn name(self) -> &'static str {
        match self {
            ConfigKey::ApiUrl => "apiUrl",
            ConfigKey::ApiKey => "apiKey",
            ConfigKey::ChatModel => "chatModel",
            ConfigKey::ImageModel => "imageModel",
            ConfigKey::ImageQuality => "imageQuality",
        }
    }
}

pub async fn handle(runtime: &mut Runtime, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Init { api_url, api_key } => init(runtime, api_url, api_key).await,
        ConfigCommand::Get { key, show_key } => get(runtime, key, show_key).await,
        ConfigCommand::Set { key, value } => set(runtime, key, value).await,
        ConfigCommand::Profiles => profiles(runtime).await,
        ConfigCommand::Use { profile } => use_profile(runtime, profile).await,
    }
}

async fn init(
    runtime: &mut Runtime,
    api_url: Option<String>,
    api_key: Option<String>,
) -> Result<(), CliError> {
    let profile_name = runtime.active_profile();
    ensure_profile(&mut runtime.config, &profile_name);
    let interactive = !is_ci() && !runtime.output.json && !runtime.output.quiet;
    if let Some(profile) = profile_mut(&mut runtime.config, &profile_name) {
        if let Some(url) = api_url {
            validate_url(&url)?;
            profile.api_url = url;
        }

        if let Some(value) = api_key {
            profile.api_key = Some(value.trim().to_string());
        } else if interactive {
            let maybe_key = rpassword::prompt_password("API key (optional, Enter to skip): ")
                .map_err(|e| CliError::Generic(format!("Failed reading API key: {e}")))?;
            if !maybe_key.trim().is_empty() {
                profile.api_key = Some(maybe_key.trim().to_string());
            }
        }
    }

    runtime.config.profile = profile_name;
    let path = save_config(&runtime.config)?;
    runtime.config_path = path.clone();

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "path": path }))?;
    } else {
        runtime
            .output
            .print_human(&format!("Config initialized: {}", path.display()));
    }
    Ok(())
}

async fn get(runtime: &mut Runtime, key: ConfigKey, show_key: bool) -> Result<(), CliError> {
    let profile = runtime.profile().map_err(|_| {
        CliError::Usage(format!(
            "Profile '{}' not found. Run `scriptreview config init` first.",
            runtime.active_profile()
        ))
    })?;

    let value = match key {
        ConfigKey::ApiKey => runtime.resolved_api_key().map(|k| {
            if show_key { k } else { redact_secret(&k) }
        }),
        other => Some(read_value(profile, other)),
    };

    if runtime.output.json {
        runtime.output.print_json(&json!({
            "key": key.name(),
            "value": value
        }))?;
    } else if let Some(v) = value {
        runtime.output.print_human(&v);
    } else {
        runtime
            .output
            .print_human(&format!("(not set; export {API_KEY_ENV} or use `config set apiKey`)"));
    }

    Ok(())
}

fn read_value(profile: &ProfileConfig, key: ConfigKey) -> String {
    match key {
        ConfigKey::ApiUrl => profile.api_url.clone(),
        ConfigKey::ApiKey => profile.api_key.clone().unwrap_or_default(),
        ConfigKey::ChatModel => profile.chat_model.clone(),
        ConfigKey::ImageModel => profile.image_model.clone(),
        ConfigKey::ImageQuality => profile.image_quality.clone(),
    }
}

fn apply_value(profile: &mut ProfileConfig, key: ConfigKey, value: String) -> Result<(), CliError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(CliError::Usage(format!("{} cannot be empty.", key.name())));
    }

    match key {
        ConfigKey::ApiUrl => {
            validate_url(&value)?;
            profile.api_url = value;
        }
        ConfigKey::ApiKey => profile.api_key = Some(value),
        ConfigKey::ChatModel => profile.chat_model = value,
        ConfigKey::ImageModel => profile.image_model = value,
        ConfigKey::ImageQuality => profile.image_quality = value,
    }
    Ok(())
}

async fn set(runtime: &mut Runtime, key: ConfigKey, value: String) -> Result<(), CliError> {
    let profile_name = runtime.active_profile();
    ensure_profile(&mut runtime.config, &profile_name);
    let profile = profile_mut(&mut runtime.config, &profile_name).ok_or_else(|| {
        CliError::Generic(format!(
            "Failed to resolve profile '{profile_name}' while setting config."
        ))
    })?;
    apply_value(profile, key, value)?;

    let path = save_config(&runtime.config)?;
    runtime.config_path = path;

    if runtime.output.json {
        runtime.output.print_json(&json!({ "ok": true }))?;
    } else {
        runtime.output.print_human("Config updated.");
    }

    Ok(())
}

async fn profiles(runtime: &mut Runtime) -> Result<(), CliError> {
    let active = runtime.active_profile();
    let mut names: Vec<String> = runtime.config.profiles.keys().cloned().collect();
    names.sort();

    if runtime.output.json {
        let payload = names
            .iter()
            .map(|name| {
                let profile = runtime.config.profiles.get(name);
                json!({
                    "name": name,
                    "active": name == &active,
                    "apiUrl": profile.map(|p| p.api_url.clone()).unwrap_or_default(),
                    "chatModel": profile.map(|p| p.chat_model.clone()).unwrap_or_default(),
                    "imageModel": profile.map(|p| p.image_model.clone()).unwrap_or_default(),
                    "hasApiKey": profile
                        .and_then(|p| p.api_key.as_ref())
                        .map(|k| !k.is_empty())
                        .unwrap_or(false)
                })
            })
            .collect::<Vec<_>>();
        runtime.output.print_json(&json!({ "profiles": payload }))?;
        return Ok(());
    }

    for name in names {
        let marker = if name == active { "*" } else { " " };
        runtime.output.print_human(&format!("{marker} {name}"));
    }
    Ok(())
}

async fn use_profile(runtime: &mut Runtime, profile_name: String) -> Result<(), CliError> {
    ensure_profile(&mut runtime.config, &profile_name);
    runtime.config.profile = profile_name.clone();
    let path = save_config(&runtime.config)?;
    runtime.config_path = path;

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "profile": profile_name }))?;
    } else {
        runtime
            .output
            .print_human(&format!("Active profile: {profile_name}"));
    }

    Ok(())
}

fn is_ci() -> bool {
    std::env::var("CI")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_read_model_keys() {
        let mut profile = ProfileConfig::default();
        apply_value(&mut profile, ConfigKey::ChatModel, " gpt-4o ".to_string()).unwrap();
        apply_value(&mut profile, ConfigKey::ImageQuality, "hd".to_string()).unwrap();
        assert_eq!(read_value(&profile, ConfigKey::ChatModel), "gpt-4o");
        assert_eq!(read_value(&profile, ConfigKey::ImageQuality), "hd");
    }

    #[test]
    fn blank_values_are_rejected() {
        let mut profile = ProfileConfig::default();
        let err = apply_value(&mut profile, ConfigKey::ImageModel, "  ".to_string()).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn api_url_is_validated() {
        let mut profile = ProfileConfig::default();
        assert!(apply_value(&mut profile, ConfigKey::ApiUrl, "file:///etc".to_string()).is_err());
        apply_value(
            &mut profile,
            ConfigKey::ApiUrl,
            "http://localhost:11434/v1".to_string(),
        )
        .unwrap();
        assert_eq!(profile.api_url, "http://localhost:11434/v1");
    }
}
