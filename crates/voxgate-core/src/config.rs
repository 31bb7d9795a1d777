use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Environment variables checked, in order, for the OpenAI credential.
const OPENAI_KEY_VARS: &[&str] = &["OPENAI_API_KEY", "OPENAI_KEY"];
/// Environment variables checked, in order, for the Watson credential.
const WATSON_KEY_VARS: &[&str] = &["WATSON_API_KEY", "WATSON_APIKEY"];
/// Environment variables checked, in order, for the Watson service URL.
const WATSON_URL_VARS: &[&str] = &["WATSON_URL", "WATSON_SERVICE_URL"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing credential: set one of {0}")]
    MissingCredential(&'static str),
    #[error("missing Watson service URL: set one of {0}")]
    MissingServiceUrl(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Openai,
    Watson,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Openai => write!(f, "openai"),
            Self::Watson => write!(f, "watson"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub transcription: TranscriptionConfig,
    pub openai: OpenAiConfig,
    pub watson: WatsonConfig,
    pub refine: Option<RefineConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub provider: ProviderKind,
    /// Language code pinned on every outgoing provider request.
    pub language: String,
    pub max_upload_bytes: u64,
    pub min_upload_bytes: u64,
    pub request_timeout_secs: u64,
    /// Request detected-language and confidence detail from the provider.
    pub verbose: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatsonConfig {
    pub model: String,
    pub background_audio_suppression: f32,
    pub max_alternatives: u32,
}

/// Optional LLM post-correction stage; absent table disables it.
#[derive(Debug, Deserialize)]
pub struct RefineConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    pub model: String,
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist. Credentials are
    /// never read from the file; see [`Config::resolve_openai_key`] and
    /// [`Config::resolve_watson`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VOXGATE_BIND") {
            self.server.bind = v;
        }
        if let Ok(v) = std::env::var("VOXGATE_PORT")
            && let Ok(port) = v.parse()
        {
            self.server.port = port;
        }
        if let Ok(v) = std::env::var("VOXGATE_PROVIDER") {
            match v.as_str() {
                "openai" => self.transcription.provider = ProviderKind::Openai,
                "watson" => self.transcription.provider = ProviderKind::Watson,
                other => tracing::warn!("ignoring unknown VOXGATE_PROVIDER '{other}'"),
            }
        }
        if let Ok(v) = std::env::var("VOXGATE_LANGUAGE") {
            self.transcription.language = v;
        }
    }

    /// Resolve the OpenAI API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when no known variable is set.
    pub fn resolve_openai_key(&self) -> Result<String, ConfigError> {
        env_first(OPENAI_KEY_VARS)
            .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY, OPENAI_KEY"))
    }

    /// Resolve the Watson API key and service URL from the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when either the key or the service URL is
    /// missing from the environment.
    pub fn resolve_watson(&self) -> Result<(String, String), ConfigError> {
        let key = env_first(WATSON_KEY_VARS)
            .ok_or(ConfigError::MissingCredential("WATSON_API_KEY, WATSON_APIKEY"))?;
        let url = env_first(WATSON_URL_VARS)
            .ok_or(ConfigError::MissingServiceUrl("WATSON_URL, WATSON_SERVICE_URL"))?;
        Ok((key, url))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            transcription: TranscriptionConfig::default(),
            openai: OpenAiConfig::default(),
            watson: WatsonConfig::default(),
            refine: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Openai,
            language: "fr".into(),
            max_upload_bytes: 25 * 1024 * 1024,
            min_upload_bytes: 100,
            request_timeout_secs: 60,
            verbose: false,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: "whisper-1".into(),
        }
    }
}

impl Default for WatsonConfig {
    fn default() -> Self {
        Self {
            model: "fr-FR_BroadbandModel".into(),
            background_audio_suppression: 0.5,
            max_alternatives: 1,
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}

/// First non-empty value among the named environment variables.
fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
}
