use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::template::Templates;

/// Config file name constant.
pub const CONFIG_FILE: &str = ".stolenbot.toml";

/// Env var that overrides `[auth] bearer_token`, so the secret can stay out
/// of the config file.
pub const BEARER_TOKEN_ENV: &str = "STOLENBOT_BEARER_TOKEN";

/// Find the config file in `dir`. Returns None if it does not exist.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILE);
    path.exists().then_some(path)
}

/// Top-level .stolenbot.toml config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub replies: RepliesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Hard message length limit imposed by the platform.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,
    #[serde(default = "default_stream_url")]
    pub stream_url: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            max_message_len: default_max_message_len(),
            rest_base_url: default_rest_base_url(),
            stream_url: default_stream_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_lookup_base_url")]
    pub base_url: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: default_lookup_base_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub bearer_token: String,
}

impl AuthConfig {
    /// Effective token: env var beats the config file. Errors when neither
    /// is set, since every platform call needs it.
    pub fn resolve_bearer_token(&self) -> anyhow::Result<String> {
        if let Ok(token) = std::env::var(BEARER_TOKEN_ENV) {
            if !token.is_empty() {
                return Ok(token);
            }
        }
        if self.bearer_token.is_empty() {
            return Err(ExitError::Credentials(format!(
                "no bearer token: set {BEARER_TOKEN_ENV} or [auth] bearer_token"
            ))
            .into());
        }
        Ok(self.bearer_token.clone())
    }
}

/// Overrides for the canned reply templates. Unset entries keep the
/// deployed defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepliesConfig {
    #[serde(default)]
    pub absent: Option<String>,
    #[serde(default)]
    pub not_found: Option<String>,
    #[serde(default)]
    pub close_many: Option<String>,
    #[serde(default)]
    pub multi_notice: Option<String>,
    #[serde(default)]
    pub too_many: Option<String>,
}

impl RepliesConfig {
    pub fn templates(&self) -> Templates {
        let defaults = Templates::default();
        Templates {
            absent: self.absent.clone().unwrap_or(defaults.absent),
            not_found: self.not_found.clone().unwrap_or(defaults.not_found),
            close_many: self.close_many.clone().unwrap_or(defaults.close_many),
            multi_notice: self.multi_notice.clone().unwrap_or(defaults.multi_notice),
            too_many: self.too_many.clone().unwrap_or(defaults.too_many),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse_toml(&contents)
    }

    /// Parse config from a TOML string.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| ExitError::Config(format!("invalid {CONFIG_FILE}: {e}")).into())
    }
}

/// Commented starter config written by `stolenbot init`.
pub fn starter_toml() -> String {
    format!(
        r#"# Stolenbot configuration
# The bearer token can live here or in the {BEARER_TOKEN_ENV} env var.

[platform]
max_message_len = {max}
rest_base_url = "{rest}"
stream_url = "{stream}"

[lookup]
base_url = "{lookup}"

[auth]
bearer_token = ""

# Reply templates accept {{{{ at }}}}, {{{{ serial }}}}, and {{{{ count }}}}
# placeholders. Omit entries to keep the stock wording.
[replies]
"#,
        max = default_max_message_len(),
        rest = default_rest_base_url(),
        stream = default_stream_url(),
        lookup = default_lookup_base_url(),
    )
}

// Default value functions for serde
fn default_max_message_len() -> usize {
    140
}
fn default_rest_base_url() -> String {
    "https://api.twitter.com/1.1".into()
}
fn default_stream_url() -> String {
    "https://userstream.twitter.com/1.1/user.json".into()
}
fn default_lookup_base_url() -> String {
    "https://bikeindex.org/api/v1".into()
}
