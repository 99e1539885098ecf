//! Configuration discovery and resolution.
//!
//! Settings come from TOML files (global, then project, then an explicit
//! `--config` file) merged key by key, and are resolved into the
//! [`EffectiveConfig`] the sync engine consumes plus the [`RemoteConfig`]
//! used to open the object store.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DeployError;
use crate::fs::s3::S3Provider;

/// Project-level settings file, relative to the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".s3deploy.toml";

/// Template written by `s3deploy install`.
pub const CONFIG_TEMPLATE: &str = include_str!("template.toml");

/// Regions accepted for the AWS provider.
pub const AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ca-central-1",
    "ca-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-south-1",
    "eu-south-2",
    "eu-north-1",
    "il-central-1",
    "me-south-1",
    "me-central-1",
    "sa-east-1",
];

const DEFAULT_REGION: &str = "us-east-1";

/// What to do when a single file fails to read or upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Report the failure and keep syncing the remaining files.
    #[default]
    Continue,
    /// Stop the pass at the first failure.
    Abort,
}

/// Optional behaviors enabled through the `extras` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extras {
    pub replace_with_gzip: bool,
    pub delete_old_files: bool,
}

impl Extras {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut extras = Extras::default();
        for name in names {
            match name.as_ref() {
                "replace_with_gzip" => extras.replace_with_gzip = true,
                "delete_old_files" => extras.delete_old_files = true,
                other => tracing::warn!("Ignoring unknown extra: {}", other),
            }
        }
        extras
    }
}

/// Raw settings as found in one config file. Every key is optional so that
/// files can be layered.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub path: Option<String>,
    pub remote_path: Option<String>,
    pub aws_key: Option<String>,
    pub aws_secret: Option<String>,
    pub aws_bucket: Option<String>,
    pub aws_region: Option<String>,
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub skip_regex: Option<String>,
    pub cache_regex: Option<String>,
    pub html_charset: Option<String>,
    pub extras: Option<Vec<String>>,
    pub on_error: Option<ErrorPolicy>,
}

macro_rules! overlay {
    ($self:ident, $other:ident, $($field:ident),+ $(,)?) => {
        $(
            if $other.$field.is_some() {
                $self.$field = $other.$field;
            }
        )+
    };
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, DeployError> {
        toml::from_str(content).map_err(|e| {
            DeployError::config(format!("Invalid config file {}: {}", origin.display(), e))
        })
    }

    /// Load a settings file, returning `None` when it does not exist.
    pub fn load_file(path: &Path) -> Result<Option<Self>, DeployError> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| {
            DeployError::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content, path).map(Some)
    }

    /// Layer `other` on top of `self`. Keys absent from `other` keep their value.
    pub fn merge(&mut self, other: Settings) {
        overlay!(
            self, other, path, remote_path, aws_key, aws_secret, aws_bucket, aws_region, provider,
            endpoint, skip_regex, cache_regex, html_charset, extras, on_error,
        );
    }

    /// Read the global file, the project file and an optional explicit file,
    /// in that order of precedence (last wins).
    pub fn discover(explicit: Option<&Path>) -> Result<Self, DeployError> {
        let mut settings = Settings::default();

        for candidate in [global_config_path(), Some(PathBuf::from(PROJECT_CONFIG_FILE))]
            .into_iter()
            .flatten()
        {
            if let Some(layer) = Self::load_file(&candidate)? {
                tracing::debug!("Loaded settings from {}", candidate.display());
                settings.merge(layer);
            }
        }

        if let Some(path) = explicit {
            let layer = Self::load_file(path)?.ok_or_else(|| {
                DeployError::config(format!("Config file {} does not exist.", path.display()))
            })?;
            settings.merge(layer);
        }

        Ok(settings)
    }

    /// Validate and resolve into the sync and remote configurations.
    pub fn resolve(self) -> Result<DeployConfig, DeployError> {
        let (aws_key, aws_secret) = match (non_blank(self.aws_key), non_blank(self.aws_secret)) {
            (Some(key), Some(secret)) => (key, secret),
            _ => return Err(DeployError::config("No AWS credentials given.")),
        };
        let bucket =
            non_blank(self.aws_bucket).ok_or_else(|| DeployError::config("No bucket selected."))?;

        let provider = S3Provider::from_settings(self.provider.as_deref(), self.endpoint.as_deref())?;
        let region = resolve_region(self.aws_region.as_deref(), &provider)?;

        let sync = EffectiveConfig {
            root: PathBuf::from(self.path.unwrap_or_else(|| ".".to_string())),
            remote_prefix: self.remote_path.unwrap_or_default(),
            skip_pattern: non_blank(self.skip_regex),
            cache_pattern: non_blank(self.cache_regex),
            html_charset: non_blank(self.html_charset),
            extras: Extras::from_names(&self.extras.unwrap_or_default()),
            bucket: bucket.clone(),
            on_error: self.on_error.unwrap_or_default(),
        };

        let remote = RemoteConfig {
            bucket,
            region,
            provider,
            access_key: aws_key,
            secret_key: aws_secret,
        };

        Ok(DeployConfig { sync, remote })
    }
}

/// Settings the sync engine reads; never mutated during a pass.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub root: PathBuf,
    pub remote_prefix: String,
    pub skip_pattern: Option<String>,
    pub cache_pattern: Option<String>,
    pub html_charset: Option<String>,
    pub extras: Extras,
    pub bucket: String,
    pub on_error: ErrorPolicy,
}

impl EffectiveConfig {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            remote_prefix: String::new(),
            skip_pattern: None,
            cache_pattern: None,
            html_charset: None,
            extras: Extras::default(),
            bucket: bucket.into(),
            on_error: ErrorPolicy::Continue,
        }
    }
}

/// Connection settings for the object store.
#[derive(Clone)]
pub struct RemoteConfig {
    pub bucket: String,
    pub region: String,
    pub provider: S3Provider,
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("provider", &self.provider)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub sync: EffectiveConfig,
    pub remote: RemoteConfig,
}

/// `~/.s3deploy/s3deploy.toml`, when a home directory is known.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".s3deploy").join("s3deploy.toml"))
}

/// Whether any settings file exists in the default locations.
pub fn config_files_present() -> bool {
    global_config_path().is_some_and(|p| p.is_file()) || Path::new(PROJECT_CONFIG_FILE).is_file()
}

/// Write the template config to the project (or global) location.
pub fn install_template(global: bool) -> Result<PathBuf, DeployError> {
    let target = if global {
        global_config_path()
            .ok_or_else(|| DeployError::config("Cannot determine the home directory."))?
    } else {
        PathBuf::from(PROJECT_CONFIG_FILE)
    };
    install_template_at(&target)?;
    Ok(target)
}

pub fn install_template_at(target: &Path) -> Result<(), DeployError> {
    if target.exists() {
        return Err(DeployError::config("Configuration file already exist."));
    }
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| DeployError::from_io_error(e, "creating directory", parent))?;
    }
    fs::write(target, CONFIG_TEMPLATE)
        .map_err(|e| DeployError::from_io_error(e, "writing", target))
}

fn resolve_region(region: Option<&str>, provider: &S3Provider) -> Result<String, DeployError> {
    let region = match region.map(str::trim).filter(|r| !r.is_empty()) {
        Some(region) => region.to_lowercase(),
        None => return Ok(DEFAULT_REGION.to_string()),
    };

    if *provider == S3Provider::Aws && !AWS_REGIONS.contains(&region.as_str()) {
        return Err(DeployError::config(format!(
            "{} is not a valid region, please select from {} or leave it blank for US Standard.",
            region,
            AWS_REGIONS.join(", ")
        )));
    }

    Ok(region)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
