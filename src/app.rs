use std::path::PathBuf;

use crate::api::ApiClient;
use crate::commentary::CommentaryRequester;
use crate::config::{
    CliConfig, ProfileConfig, active_profile_name, require_profile, resolve_api_key,
    resolve_api_url,
};
use crate::errors::CliError;
use crate::output::OutputMode;
use crate::sequence::{ImageSettings, VisualSequence};

#[derive(Debug, Clone)]
pub struct Runtime {
    pub output: OutputMode,
    pub config: CliConfig,
    pub config_path: PathBuf,
    pub profile_override: Option<String>,
    pub api_url_override: Option<String>,
    pub timeout_ms: u64,
}

impl Runtime {
    pub fn active_profile(&self) -> String {
        active_profile_name(&self.config, self.profile_override.as_deref())
    }

    pub fn profile(&self) -> Result<&ProfileConfig, CliError> {
        require_profile(&self.config, &self.active_profile())
    }

    pub fn resolved_api_url(&self) -> Result<String, CliError> {
        resolve_api_url(
            &self.config,
            &self.active_profile(),
            self.api_url_override.as_deref(),
        )
    }

    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(&self.config, &self.active_profile())
    }

    pub fn api_client(&self) -> Result<ApiClient, CliError> {
        ApiClient::new(
            self.resolved_api_url()?,
            self.resolved_api_key(),
            self.timeout_ms,
            self.output.debug,
        )
    }

    pub fn image_settings(&self) -> Result<ImageSettings, CliError> {
        let profile = self.profile()?;
        Ok(ImageSettings {
            model: profile.image_model.clone(),
            quality: profile.image_quality.clone(),
            ..ImageSettings::default()
        })
    }

    pub fn commentary(&self) -> Result<CommentaryRequester<ApiClient>, CliError> {
        let model = self.profile()?.chat_model.clone();
        Ok(CommentaryRequester::new(self.api_client()?, model))
    }

    pub fn visuals(&self) -> Result<VisualSequence<ApiClient>, CliError> {
        Ok(VisualSequence::new(self.api_client()?, self.image_settings()?))
    }
}
