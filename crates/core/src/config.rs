use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::negotiation::policy::{NegotiationPolicy, DEFAULT_BAND_PCT, DEFAULT_MAX_ROUNDS};

pub const DEFAULT_CONFIG_FILE: &str = "loadline.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub fmcsa: FmcsaConfig,
    pub negotiation: NegotiationConfig,
    pub sessions: SessionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
    /// Shared secret expected in the `x-api-key` header.
    pub api_key: SecretString,
}

#[derive(Clone, Debug)]
pub struct FmcsaConfig {
    pub base_url: String,
    pub web_key: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct NegotiationConfig {
    pub max_rounds: u32,
    pub band_pct: u32,
    pub lookup_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SessionsConfig {
    /// Zero disables idle eviction.
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub server_api_key: Option<String>,
    pub fmcsa_base_url: Option<String>,
    pub fmcsa_web_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://loadline.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 4000,
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
                api_key: String::new().into(),
            },
            fmcsa: FmcsaConfig {
                base_url: "https://mobile.fmcsa.dot.gov/qc/services".to_string(),
                web_key: String::new().into(),
                timeout_secs: 10,
            },
            negotiation: NegotiationConfig {
                max_rounds: DEFAULT_MAX_ROUNDS,
                band_pct: DEFAULT_BAND_PCT,
                lookup_timeout_secs: 5,
            },
            sessions: SessionsConfig { idle_ttl_secs: 3600, sweep_interval_secs: 60 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl NegotiationConfig {
    pub fn policy(&self) -> NegotiationPolicy {
        NegotiationPolicy { max_rounds: self.max_rounds, band_pct: self.band_pct }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

impl SessionsConfig {
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(api_key) = server.api_key {
                self.server.api_key = secret_value(api_key);
            }
        }

        if let Some(fmcsa) = patch.fmcsa {
            if let Some(base_url) = fmcsa.base_url {
                self.fmcsa.base_url = base_url;
            }
            if let Some(web_key) = fmcsa.web_key {
                self.fmcsa.web_key = secret_value(web_key);
            }
            if let Some(timeout_secs) = fmcsa.timeout_secs {
                self.fmcsa.timeout_secs = timeout_secs;
            }
        }

        if let Some(negotiation) = patch.negotiation {
            if let Some(max_rounds) = negotiation.max_rounds {
                self.negotiation.max_rounds = max_rounds;
            }
            if let Some(band_pct) = negotiation.band_pct {
                self.negotiation.band_pct = band_pct;
            }
            if let Some(lookup_timeout_secs) = negotiation.lookup_timeout_secs {
                self.negotiation.lookup_timeout_secs = lookup_timeout_secs;
            }
        }

        if let Some(sessions) = patch.sessions {
            if let Some(idle_ttl_secs) = sessions.idle_ttl_secs {
                self.sessions.idle_ttl_secs = idle_ttl_secs;
            }
            if let Some(sweep_interval_secs) = sessions.sweep_interval_secs {
                self.sessions.sweep_interval_secs = sweep_interval_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LOADLINE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("LOADLINE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("LOADLINE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("LOADLINE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("LOADLINE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LOADLINE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("LOADLINE_SERVER_PORT") {
            self.server.port = parse_u16("LOADLINE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("LOADLINE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("LOADLINE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("LOADLINE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("LOADLINE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("LOADLINE_SERVER_API_KEY") {
            self.server.api_key = secret_value(value);
        }

        if let Some(value) = read_env("LOADLINE_FMCSA_BASE_URL") {
            self.fmcsa.base_url = value;
        }
        if let Some(value) = read_env("LOADLINE_FMCSA_WEB_KEY") {
            self.fmcsa.web_key = secret_value(value);
        }
        if let Some(value) = read_env("LOADLINE_FMCSA_TIMEOUT_SECS") {
            self.fmcsa.timeout_secs = parse_u64("LOADLINE_FMCSA_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LOADLINE_NEGOTIATION_MAX_ROUNDS") {
            self.negotiation.max_rounds = parse_u32("LOADLINE_NEGOTIATION_MAX_ROUNDS", &value)?;
        }
        if let Some(value) = read_env("LOADLINE_NEGOTIATION_BAND_PCT") {
            self.negotiation.band_pct = parse_u32("LOADLINE_NEGOTIATION_BAND_PCT", &value)?;
        }
        if let Some(value) = read_env("LOADLINE_NEGOTIATION_LOOKUP_TIMEOUT_SECS") {
            self.negotiation.lookup_timeout_secs =
                parse_u64("LOADLINE_NEGOTIATION_LOOKUP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LOADLINE_SESSIONS_IDLE_TTL_SECS") {
            self.sessions.idle_ttl_secs = parse_u64("LOADLINE_SESSIONS_IDLE_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("LOADLINE_SESSIONS_SWEEP_INTERVAL_SECS") {
            self.sessions.sweep_interval_secs =
                parse_u64("LOADLINE_SESSIONS_SWEEP_INTERVAL_SECS", &value)?;
        }

        let log_level =
            read_env("LOADLINE_LOGGING_LEVEL").or_else(|| read_env("LOADLINE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LOADLINE_LOGGING_FORMAT").or_else(|| read_env("LOADLINE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(api_key) = overrides.server_api_key {
            self.server.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.fmcsa_base_url {
            self.fmcsa.base_url = base_url;
        }
        if let Some(web_key) = overrides.fmcsa_web_key {
            self.fmcsa.web_key = secret_value(web_key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_fmcsa(&self.fmcsa)?;
        validate_negotiation(&self.negotiation)?;
        validate_sessions(&self.sessions)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.health_check_port == server.port {
        return Err(ConfigError::Validation(
            "server.health_check_port must differ from server.port".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if server.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "server.api_key is required. Set LOADLINE_SERVER_API_KEY to the shared secret \
             the voice platform sends in the `x-api-key` header"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_fmcsa(fmcsa: &FmcsaConfig) -> Result<(), ConfigError> {
    if !fmcsa.base_url.starts_with("http://") && !fmcsa.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "fmcsa.base_url must start with http:// or https://".to_string(),
        ));
    }

    if fmcsa.web_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "fmcsa.web_key is required. Request a QCMobile web key at \
             https://mobile.fmcsa.dot.gov/QCDevsite/ and set LOADLINE_FMCSA_WEB_KEY"
                .to_string(),
        ));
    }

    if fmcsa.timeout_secs == 0 || fmcsa.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "fmcsa.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_negotiation(negotiation: &NegotiationConfig) -> Result<(), ConfigError> {
    if negotiation.max_rounds == 0 {
        return Err(ConfigError::Validation(
            "negotiation.max_rounds must be greater than zero".to_string(),
        ));
    }

    if negotiation.band_pct == 0 || negotiation.band_pct > 100 {
        return Err(ConfigError::Validation(
            "negotiation.band_pct must be in range 1..=100".to_string(),
        ));
    }

    if negotiation.lookup_timeout_secs == 0 || negotiation.lookup_timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "negotiation.lookup_timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_sessions(sessions: &SessionsConfig) -> Result<(), ConfigError> {
    if sessions.sweep_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "sessions.sweep_interval_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    fmcsa: Option<FmcsaPatch>,
    negotiation: Option<NegotiationPatch>,
    sessions: Option<SessionsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FmcsaPatch {
    base_url: Option<String>,
    web_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NegotiationPatch {
    max_rounds: Option<u32>,
    band_pct: Option<u32>,
    lookup_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionsPatch {
    idle_ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    const SECRET_VARS: [&str; 2] = ["LOADLINE_SERVER_API_KEY", "LOADLINE_FMCSA_WEB_KEY"];

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn set_required_secrets() {
        env::set_var("LOADLINE_SERVER_API_KEY", "api-key-from-env");
        env::set_var("LOADLINE_FMCSA_WEB_KEY", "web-key-from-env");
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_LOADLINE_API_KEY", "shared-secret");
        env::set_var("TEST_LOADLINE_WEB_KEY", "fmcsa-key");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("loadline.toml");
            fs::write(
                &path,
                r#"
[server]
api_key = "${TEST_LOADLINE_API_KEY}"

[fmcsa]
web_key = "${TEST_LOADLINE_WEB_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.server.api_key.expose_secret() == "shared-secret",
                "api key should be interpolated from environment",
            )?;
            ensure(
                config.fmcsa.web_key.expose_secret() == "fmcsa-key",
                "web key should be interpolated from environment",
            )?;
            ensure(config.server.port == 4000, "api port should default to 4000")?;
            Ok(())
        })();

        clear_vars(&["TEST_LOADLINE_API_KEY", "TEST_LOADLINE_WEB_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_LOADLINE_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("loadline.toml");
        fs::write(&path, "[server]\napi_key = \"${TEST_LOADLINE_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        let names_variable = matches!(
            error,
            ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_LOADLINE_UNSET"
        );
        ensure(names_variable, "interpolation failure should name the variable")
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_secrets();
        env::set_var("LOADLINE_LOG_LEVEL", "warn");
        env::set_var("LOADLINE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&SECRET_VARS);
        clear_vars(&["LOADLINE_LOG_LEVEL", "LOADLINE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_secrets();
        env::set_var("LOADLINE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("LOADLINE_NEGOTIATION_MAX_ROUNDS", "5");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("loadline.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[server]
api_key = "api-key-from-file"

[negotiation]
max_rounds = 2
band_pct = 15

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.server.api_key.expose_secret() == "api-key-from-env",
                "env api key should win over file and defaults",
            )?;
            ensure(config.negotiation.max_rounds == 5, "env max rounds should win over file")?;
            ensure(config.negotiation.band_pct == 15, "file band should win over default")?;
            Ok(())
        })();

        clear_vars(&SECRET_VARS);
        clear_vars(&["LOADLINE_DATABASE_URL", "LOADLINE_NEGOTIATION_MAX_ROUNDS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        clear_vars(&SECRET_VARS);
        env::set_var("LOADLINE_FMCSA_WEB_KEY", "web-key");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("server.api_key")
            );
            ensure(has_message, "validation failure should mention server.api_key")
        })();

        clear_vars(&SECRET_VARS);
        result
    }

    #[test]
    fn out_of_range_band_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_secrets();
        env::set_var("LOADLINE_NEGOTIATION_BAND_PCT", "150");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("band above 100 should be rejected".to_string()),
            Err(ConfigError::Validation(message)) if message.contains("band_pct") => Ok(()),
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(&SECRET_VARS);
        clear_vars(&["LOADLINE_NEGOTIATION_BAND_PCT"]);
        result
    }

    #[test]
    fn malformed_numeric_env_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_secrets();
        env::set_var("LOADLINE_SERVER_PORT", "forty");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) if key == "LOADLINE_SERVER_PORT" => {
                Ok(())
            }
            Ok(_) => Err("non-numeric port should be rejected".to_string()),
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(&SECRET_VARS);
        clear_vars(&["LOADLINE_SERVER_PORT"]);
        result
    }

    #[test]
    fn session_ttl_zero_disables_eviction() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_required_secrets();
        env::set_var("LOADLINE_SESSIONS_IDLE_TTL_SECS", "0");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(config.sessions.idle_ttl().is_none(), "zero ttl should disable eviction")?;
            ensure(
                config.negotiation.lookup_timeout() == Duration::from_secs(5),
                "lookup timeout should default to five seconds",
            )?;
            ensure(config.negotiation.policy().max_rounds == 3, "default max rounds is three")?;
            Ok(())
        })();

        clear_vars(&SECRET_VARS);
        clear_vars(&["LOADLINE_SESSIONS_IDLE_TTL_SECS"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LOADLINE_SERVER_API_KEY", "api-secret-value");
        env::set_var("LOADLINE_FMCSA_WEB_KEY", "web-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("api-secret-value"), "debug output should not contain api key")?;
            ensure(!debug.contains("web-secret-value"), "debug output should not contain web key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&SECRET_VARS);
        result
    }
}
