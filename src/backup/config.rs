//! Startup configuration: raw values from the environment/CLI, optional YAML
//! settings, and the validated [`PipelineConfig`] built from both.

use crate::backup::archive::ArchiverConfig;
use crate::backup::deliver::telegram::DEFAULT_API_BASE_URL;
use crate::backup::encrypt::EncryptorConfig;
use crate::backup::redacted::RedactedString;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::validate::{validate_http_url, validate_not_blank_path, validate_writable_dir};
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use validator::Validate;

pub static BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub static GROUP_ID_VAR: &str = "TELEGRAM_GROUP_ID";
pub static PASSPHRASE_VAR: &str = "ENCRYPTION_PASS";
static DEFAULT_SOURCE_DIR_NAME: &str = ".ssh";

/// Unvalidated inputs as they arrive from flags and environment variables.
#[derive(Clone, Debug, Default, Builder)]
pub struct ConfigSource {
    #[builder(into)]
    pub bot_token: Option<String>,
    #[builder(into)]
    pub group_id: Option<String>,
    #[builder(into)]
    pub passphrase: Option<String>,
    #[builder(into)]
    pub source_dir: Option<PathBuf>,
    #[builder(into)]
    pub tmp_dir: Option<PathBuf>,
    #[builder(into)]
    pub settings_file: Option<PathBuf>,
    #[builder(into)]
    pub home_dir: Option<PathBuf>,
}

/// Non-secret settings loadable from a YAML file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    #[serde(default)]
    pub tmp_dir: Option<PathBuf>,
    #[serde(default)]
    pub archiver: ArchiverConfig,
    #[serde(default)]
    pub encryptor: EncryptorConfig,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl Settings {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::config(format!("cannot open settings file {:?}: {}", path, e)))?;
        serde_yml::from_reader(file)
            .map_err(|e| Error::config(format!("cannot parse settings file {:?}: {}", path, e)))
    }
}

/// Everything one run needs, resolved once at startup and immutable after.
#[derive(Clone, Debug, Validate, Builder, Getters)]
#[getset(get = "pub")]
pub struct PipelineConfig {
    #[validate(custom(function = validate_not_blank_path))]
    #[builder(into)]
    source_dir: PathBuf,
    #[validate(custom(function = validate_writable_dir))]
    #[builder(into)]
    tmp_dir: PathBuf,
    #[validate(nested)]
    #[builder(into)]
    passphrase: RedactedString,
    #[validate(nested)]
    #[builder(into)]
    bot_token: RedactedString,
    group_id: i64,
    #[validate(nested)]
    #[builder(default)]
    archiver: ArchiverConfig,
    #[validate(nested)]
    #[builder(default)]
    encryptor: EncryptorConfig,
    #[validate(custom(function = validate_http_url))]
    #[builder(default = DEFAULT_API_BASE_URL.to_owned(), into)]
    api_base_url: String,
}

fn required(value: Option<String>, var: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::config(format!("{} is not set", var))),
    }
}

impl PipelineConfig {
    /// Resolves and validates; flags/env win over the settings file.
    ///
    /// Fails with [`Error::Config`] before anything touches the disk
    /// beyond creating `tmp_dir`.
    pub fn resolve(source: ConfigSource) -> Result<Self> {
        let bot_token = required(source.bot_token, BOT_TOKEN_VAR)?;
        let group_id = required(source.group_id, GROUP_ID_VAR)?;
        let passphrase = required(source.passphrase, PASSPHRASE_VAR)?;
        let group_id = group_id.trim().parse::<i64>().map_err(|e| {
            Error::config(format!(
                "{} must be a signed 64-bit integer, got {:?}: {}",
                GROUP_ID_VAR, group_id, e
            ))
        })?;

        let settings = match &source.settings_file {
            Some(path) => Settings::from_yaml_file(path)?,
            None => Settings::default(),
        };

        let source_dir = source
            .source_dir
            .or(settings.source_dir)
            .or_else(|| source.home_dir.map(|home| home.join(DEFAULT_SOURCE_DIR_NAME)))
            .ok_or_else(|| {
                Error::config("no source directory given and home directory is unknown")
            })?;
        let tmp_dir = source
            .tmp_dir
            .or(settings.tmp_dir)
            .unwrap_or_else(std::env::temp_dir);

        let config = PipelineConfig::builder()
            .source_dir(source_dir)
            .tmp_dir(tmp_dir)
            .passphrase(passphrase)
            .bot_token(bot_token)
            .group_id(group_id)
            .archiver(settings.archiver)
            .encryptor(settings.encryptor)
            .api_base_url(
                settings
                    .api_base_url
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned()),
            )
            .build();
        config
            .validate()
            .map_err(|e| Error::config(e.to_string()))?;

        tracing::debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}
