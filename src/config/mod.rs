//! Configuration (layered: defaults < TOML file < environment).
//!
//! Nothing here is global. A [`MuseConfig`] is loaded once and handed to the
//! orchestrator, which passes the [`ArtistProfile`] and [`RuntimeSettings`]
//! down into every agent it builds.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MuseError;
use crate::util::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const CONFIG_FILE_NAME: &str = "muse.toml";

/// Who the assistant works for. Rendered into every persona prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtistProfile {
    pub artist_name: String,
    pub artist_email: String,
    pub timezone: String,
    pub payment_terms: String,
    pub social_platform: String,
}

impl Default for ArtistProfile {
    fn default() -> Self {
        Self {
            artist_name: "Artist".into(),
            artist_email: String::new(),
            timezone: "America/New_York".into(),
            payment_terms: "Due upon receipt".into(),
            social_platform: "instagram".into(),
        }
    }
}

/// How the tool calls of one model turn are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolExecutionMode {
    /// One at a time, in request order.
    #[default]
    Sequential,
    /// Concurrently; results still follow request order.
    Parallel,
}

/// Knobs for every [`crate::agent::AgentRuntime`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Maximum model round-trips per run.
    pub max_rounds: u32,
    pub max_tokens: u32,
    /// Upper bound for a single model round-trip.
    #[serde(rename = "round_timeout_secs", with = "opt_secs", skip_serializing_if = "Option::is_none")]
    pub round_timeout: Option<Duration>,
    pub tool_execution: ToolExecutionMode,
    pub retry: RetryPolicy,
    /// Keep at most this many turns of history. `None` keeps everything.
    pub max_history_messages: Option<usize>,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            max_tokens: 4096,
            round_timeout: None,
            tool_execution: ToolExecutionMode::Sequential,
            retry: RetryPolicy::default(),
            max_history_messages: None,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuseConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub classifier_max_tokens: u32,
    pub profile: ArtistProfile,
    pub runtime: RuntimeSettings,
}

impl Default for MuseConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.into(),
            classifier_max_tokens: 20,
            profile: ArtistProfile::default(),
            runtime: RuntimeSettings::default(),
        }
    }
}

impl fmt::Debug for MuseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MuseConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("classifier_max_tokens", &self.classifier_max_tokens)
            .field("profile", &self.profile)
            .field("runtime", &self.runtime)
            .finish()
    }
}

impl MuseConfig {
    /// Load from the process environment (after reading `.env` if present).
    pub fn from_env() -> Result<Self, MuseError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MuseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, MuseError> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| MuseError::Configuration(format!("invalid config file: {e}")))?;
        if config.runtime.max_rounds == 0 {
            return Err(MuseError::Configuration(
                "runtime.max_rounds must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, MuseError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MuseError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Full layering: defaults, then the file at `path` (or the default
    /// location if it exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, MuseError> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Platform config location, e.g. `~/.config/muse/muse.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "muse")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Overlay environment values. Unset or empty keys leave the current value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), MuseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = get("ANTHROPIC_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(model) = get("MUSE_MODEL") {
            self.model = model;
        }

        let profile = &mut self.profile;
        for (key, slot) in [
            ("ARTIST_NAME", &mut profile.artist_name),
            ("ARTIST_EMAIL", &mut profile.artist_email),
            ("DEFAULT_TIMEZONE", &mut profile.timezone),
            ("INVOICE_PAYMENT_TERMS", &mut profile.payment_terms),
            ("SOCIAL_PLATFORM", &mut profile.social_platform),
        ] {
            if let Some(value) = get(key) {
                *slot = value;
            }
        }

        if let Some(raw) = get("MUSE_MAX_ROUNDS") {
            let rounds: u32 = parse_number("MUSE_MAX_ROUNDS", &raw)?;
            if rounds == 0 {
                return Err(MuseError::Configuration(
                    "MUSE_MAX_ROUNDS must be at least 1".into(),
                ));
            }
            self.runtime.max_rounds = rounds;
        }
        if let Some(raw) = get("MUSE_ROUND_TIMEOUT_SECS") {
            let secs: u64 = parse_number("MUSE_ROUND_TIMEOUT_SECS", &raw)?;
            self.runtime.round_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(raw) = get("MUSE_PARALLEL_TOOLS") {
            self.runtime.tool_execution = if parse_flag("MUSE_PARALLEL_TOOLS", &raw)? {
                ToolExecutionMode::Parallel
            } else {
                ToolExecutionMode::Sequential
            };
        }
        if let Some(raw) = get("MUSE_MAX_HISTORY") {
            let max: usize = parse_number("MUSE_MAX_HISTORY", &raw)?;
            self.runtime.max_history_messages = (max > 0).then_some(max);
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, MuseError> {
    raw.trim()
        .parse()
        .map_err(|_| MuseError::Configuration(format!("{key} must be a non-negative integer, got '{raw}'")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, MuseError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MuseError::Configuration(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.filter(|s| *s > 0).map(Duration::from_secs))
    }
}
