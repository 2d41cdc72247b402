use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_PORT: u16 = 8000;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// A required setting is absent.
    Missing(&'static str),
    /// A setting could not be parsed.
    InvalidValue { key: &'static str, value: String },
    /// The Discord token is malformed.
    InvalidCredential(String),
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Missing(key) => write!(f, "{} not found", key),
            Self::InvalidValue { key, value } => write!(f, "invalid value for {}: '{}'", key, value),
            Self::InvalidCredential(msg) => write!(f, "invalid credential: {}", msg),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// What to do with the process when the Discord gateway fails for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log and exit with a non-zero status.
    #[default]
    Exit,
    /// Keep the liveness endpoint up, reporting "down".
    ServeDown,
    /// Keep the liveness endpoint up, still reporting "running".
    /// Keeps an uptime monitor quiet at the cost of an inaccurate signal.
    ServeReady,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exit" => Ok(Self::Exit),
            "serve-down" => Ok(Self::ServeDown),
            "serve-ready" => Ok(Self::ServeReady),
            _ => Err(ConfigError::InvalidValue {
                key: "ON_GATEWAY_FAILURE",
                value: s.to_string(),
            }),
        }
    }
}

/// On-disk form. Every field is optional; environment variables fill the gaps.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    discord_token: Option<String>,
    /// OpenRouter API key for the ask command
    openrouter_api_key: Option<String>,
    /// Port for the liveness endpoint
    port: Option<u16>,
    model: Option<String>,
    api_url: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    request_timeout_secs: Option<u64>,
    command_prefix: Option<String>,
    on_gateway_failure: Option<FailurePolicy>,
    /// Directory for the log file. Stdout only when unset.
    log_dir: Option<String>,
    register_slash_commands: Option<bool>,
}

pub struct Config {
    pub discord_token: String,
    /// `None` disables the ask command (it replies with a fixed error).
    pub openrouter_api_key: Option<String>,
    pub port: u16,
    pub model: String,
    pub api_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub command_prefix: String,
    pub on_gateway_failure: FailurePolicy,
    pub log_dir: Option<PathBuf>,
    pub register_slash_commands: bool,
}

impl Config {
    /// Build the config from process environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(ConfigFile::default(), |key| std::env::var(key).ok())
    }

    /// Load a JSON config file, then let environment variables override it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadFile { path: path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path, source: e })?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge a config file with an environment lookup and validate the result.
    pub fn resolve<F>(file: ConfigFile, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables count as unset
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let discord_token = env("DISCORD_TOKEN")
            .or(file.discord_token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        validate_discord_token(&discord_token)?;

        let openrouter_api_key = env("OPENROUTER_API_KEY")
            .or(file.openrouter_api_key)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let port = parse_env(&env, "PORT")?.or(file.port).unwrap_or(DEFAULT_PORT);
        let max_tokens = parse_env(&env, "OPENROUTER_MAX_TOKENS")?
            .or(file.max_tokens)
            .unwrap_or(1000);
        let temperature = parse_env(&env, "OPENROUTER_TEMPERATURE")?
            .or(file.temperature)
            .unwrap_or(0.7);
        let timeout_secs = parse_env(&env, "OPENROUTER_TIMEOUT_SECS")?
            .or(file.request_timeout_secs)
            .unwrap_or(30);
        let register_slash_commands = parse_env(&env, "REGISTER_SLASH_COMMANDS")?
            .or(file.register_slash_commands)
            .unwrap_or(true);

        let on_gateway_failure = match env("ON_GATEWAY_FAILURE") {
            Some(value) => value.parse()?,
            None => file.on_gateway_failure.unwrap_or_default(),
        };

        if max_tokens == 0 {
            return Err(ConfigError::Validation("max_tokens must be greater than zero".into()));
        }
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature must be between 0.0 and 2.0, got {temperature}"
            )));
        }
        if timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }

        let command_prefix = env("COMMAND_PREFIX")
            .or(file.command_prefix)
            .unwrap_or_else(|| "!".to_string());
        if command_prefix.trim().is_empty() {
            return Err(ConfigError::Validation("command_prefix must not be empty".into()));
        }

        Ok(Self {
            discord_token,
            openrouter_api_key,
            port,
            model: env("OPENROUTER_MODEL")
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_url: env("OPENROUTER_API_URL")
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            max_tokens,
            temperature,
            request_timeout: Duration::from_secs(timeout_secs),
            command_prefix: command_prefix.trim().to_string(),
            on_gateway_failure,
            log_dir: env("LOG_DIR").or(file.log_dir).map(PathBuf::from),
            register_slash_commands,
        })
    }
}

fn parse_env<T, F>(env: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match env(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(None),
    }
}

// Discord bot tokens are three base64 segments joined by dots: {user_id}.{timestamp}.{hmac}
fn validate_discord_token(token: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = token.split('.').collect();
    let well_formed = parts.len() == 3
        && parts.iter().all(|p| {
            !p.is_empty()
                && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=')
        });
    if well_formed {
        Ok(())
    } else {
        Err(ConfigError::InvalidCredential(
            "DISCORD_TOKEN appears invalid (expected format: <id>.<timestamp>.<hmac>)".into(),
        ))
    }
}
