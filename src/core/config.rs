//! Configuration loading.
//!
//! `config.toml` carries one table per front end (`[terminal]` and
//! `[window]`). Every key is optional; unset keys fall back to the
//! front end's defaults when the file is resolved into a [`Profile`].

use directories::ProjectDirs;
use serde::Deserialize;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::relay::RelayPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Grok,
    Gemini,
    Cohere,
}

impl ProviderKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Grok => "Grok",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Cohere => "Cohere",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Grok => "XAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Cohere => "COHERE_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Grok => "grok-beta",
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::Cohere => "command-xlarge-nightly",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Grok => "https://api.x.ai/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::Cohere => "https://api.cohere.ai/v1",
        }
    }

    fn default_max_tokens(self) -> Option<u32> {
        match self {
            ProviderKind::Cohere => Some(1000),
            ProviderKind::Grok | ProviderKind::Gemini => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    Chained,
    Independent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Sqlite,
    Document,
    Memory,
}

/// Which front end a profile is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontend {
    Terminal,
    Window,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Per-request timeout in seconds. The HTTP client default applies when unset.
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub terminal: ProfileConfig,
    #[serde(default)]
    pub window: ProfileConfig,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProfileConfig {
    /// "chained" feeds each response into the next call, "independent" sends
    /// the user input to both providers
    pub mode: Option<RelayMode>,
    /// Number of A→B exchanges per message in chained mode
    pub iterations: Option<usize>,
    #[serde(default)]
    pub provider_a: ProviderOverrides,
    #[serde(default)]
    pub provider_b: ProviderOverrides,
    pub store: Option<StoreKind>,
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProviderOverrides {
    pub kind: Option<ProviderKind>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    /// Strip Markdown from this provider's responses
    pub format_markdown: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
    pub format_markdown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub path: PathBuf,
}

/// Fully resolved settings for one front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub policy: RelayPolicy,
    pub provider_a: ProviderSettings,
    pub provider_b: ProviderSettings,
    pub store: StoreSettings,
    pub request_timeout: Option<Duration>,
}

struct ProfileDefaults {
    mode: RelayMode,
    iterations: usize,
    provider_a: ProviderKind,
    provider_b: ProviderKind,
    format_markdown: bool,
    store: StoreKind,
    store_path: &'static str,
}

impl Frontend {
    fn defaults(self) -> ProfileDefaults {
        match self {
            Frontend::Terminal => ProfileDefaults {
                mode: RelayMode::Chained,
                iterations: 3,
                provider_a: ProviderKind::Grok,
                provider_b: ProviderKind::Gemini,
                format_markdown: true,
                store: StoreKind::Sqlite,
                store_path: "chatbot.sqlite",
            },
            Frontend::Window => ProfileDefaults {
                mode: RelayMode::Chained,
                iterations: 1,
                provider_a: ProviderKind::Cohere,
                provider_b: ProviderKind::Gemini,
                format_markdown: false,
                store: StoreKind::Document,
                store_path: "conversations.json",
            },
        }
    }
}

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// The platform has no usable home/config directory.
    NoConfigDir,
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "Failed to determine config directory"),
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::NoConfigDir => None,
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        let config_path = Self::get_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs =
            ProjectDirs::from("org", "chatrelay", "chatrelay").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Resolve the settings for `frontend`, filling gaps with its defaults.
    pub fn profile(&self, frontend: Frontend) -> Profile {
        let overrides = match frontend {
            Frontend::Terminal => &self.terminal,
            Frontend::Window => &self.window,
        };
        let defaults = frontend.defaults();

        let policy = match overrides.mode.unwrap_or(defaults.mode) {
            RelayMode::Independent => RelayPolicy::Independent,
            RelayMode::Chained => RelayPolicy::chained(
                overrides.iterations.unwrap_or(defaults.iterations),
            ),
        };

        Profile {
            policy,
            provider_a: overrides
                .provider_a
                .resolve(defaults.provider_a, defaults.format_markdown),
            provider_b: overrides
                .provider_b
                .resolve(defaults.provider_b, defaults.format_markdown),
            store: StoreSettings {
                kind: overrides.store.unwrap_or(defaults.store),
                path: overrides
                    .store_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(defaults.store_path)),
            },
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl ProviderOverrides {
    fn resolve(&self, default_kind: ProviderKind, default_format: bool) -> ProviderSettings {
        let kind = self.kind.unwrap_or(default_kind);
        ProviderSettings {
            kind,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| kind.default_base_url().to_string()),
            max_tokens: self.max_tokens.or(kind.default_max_tokens()),
            format_markdown: self.format_markdown.unwrap_or(default_format),
        }
    }
}
