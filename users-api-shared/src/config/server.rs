use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;

/// Errors raised while resolving the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML configuration {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
    #[error("failed to parse JSON configuration {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported configuration format for {0}; use yaml or json")]
    UnsupportedFormat(PathBuf),
    #[error("invalid {key} value '{value}': {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Output format of the tracing subscriber.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err("expected 'text' or 'json'"),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// HTTP listener settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the HTTP server binds to on all interfaces.
    pub port: u16,

    /// Upper bound on reading a request's headers, in seconds.
    pub header_read_timeout_secs: u64,

    /// Header carrying the request correlation id.
    pub request_id_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            header_read_timeout_secs: 10,
            request_id_header: "x-request-id".to_string(),
        }
    }
}

/// PostgreSQL connection and pool settings.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,

    /// libpq-style ssl mode (`disable`, `prefer`, `require`, ...).
    pub ssl_mode: String,

    /// Maximum simultaneously open connections; also bounds the idle set.
    pub max_connections: u32,

    /// Connections are recycled after this many seconds.
    pub max_lifetime_secs: u64,

    /// Connections idle for longer than this many seconds are closed.
    pub idle_timeout_secs: u64,

    /// Bound on establishing and pinging the pool at startup.
    pub connect_timeout_secs: u64,

    /// Per-request deadline for the single statement a handler issues.
    pub request_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "container_postgresql".to_string(),
            port: 5432,
            user: "testuser".to_string(),
            password: "testpass".to_string(),
            name: "testdb".to_string(),
            ssl_mode: "disable".to_string(),
            max_connections: 10,
            max_lifetime_secs: 30 * 60,
            idle_timeout_secs: 10 * 60,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Logging settings consumed by the tracing subscriber.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// The main configuration structure for the users-api server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub db: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Generates a default configuration suitable for local or containerized use.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Precedence, lowest to highest: defaults, the optional file, environment
    /// variables (only for values the file left at their default), and finally
    /// `port_override`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, an
    /// environment variable holds an unparsable value, or validation fails.
    pub fn load_config(
        config_path: Option<PathBuf>,
        port_override: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => Self::with_defaults(),
        };

        config.apply_env_overrides()?;

        if let Some(port) = port_override {
            config.server.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => {
                serde_yml::from_str(&content).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let defaults = Self::with_defaults();

        if self.server.port == defaults.server.port {
            if let Some(port) = env_value("PORT") {
                self.server.port = parse_env("PORT", &port)?;
            }
        }
        if self.db.host == defaults.db.host {
            if let Some(host) = env_value("DB_HOST") {
                self.db.host = host;
            }
        }
        if self.db.port == defaults.db.port {
            if let Some(port) = env_value("DB_PORT") {
                self.db.port = parse_env("DB_PORT", &port)?;
            }
        }
        if self.db.user == defaults.db.user {
            if let Some(user) = env_value("DB_USER") {
                self.db.user = user;
            }
        }
        if self.db.password == defaults.db.password {
            if let Some(password) = env_value("DB_PASSWORD") {
                self.db.password = password;
            }
        }
        if self.db.name == defaults.db.name {
            if let Some(name) = env_value("DB_NAME") {
                self.db.name = name;
            }
        }
        if self.db.ssl_mode == defaults.db.ssl_mode {
            if let Some(ssl_mode) = env_value("DB_SSLMODE") {
                self.db.ssl_mode = ssl_mode;
            }
        }
        if self.logging.level == defaults.logging.level {
            if let Some(level) = env_value("LOG_LEVEL") {
                self.logging.level = level;
            }
        }
        if self.logging.format == defaults.logging.format {
            if let Some(format) = env_value("LOG_FORMAT") {
                self.logging.format = format.parse().map_err(|reason| ConfigError::InvalidEnv {
                    key: "LOG_FORMAT",
                    value: format,
                    reason,
                })?;
            }
        }

        Ok(())
    }

    /// Checks the resolved values for settings the server cannot run with.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid(
                "server port must be greater than 0".to_string(),
            ));
        }
        if self.db.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "db.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.db.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "db.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.db.host.trim().is_empty() || self.db.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "db.host and db.name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads an environment variable, treating an empty value as unset.
fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_env<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_string(),
        reason: "must be a valid number",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_KEYS: &[&str] = &[
        "PORT",
        "DB_HOST",
        "DB_PORT",
        "DB_USER",
        "DB_PASSWORD",
        "DB_NAME",
        "DB_SSLMODE",
        "LOG_LEVEL",
        "LOG_FORMAT",
    ];

    fn cleanup_env_vars() {
        for key in ENV_KEYS {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_config_with_defaults() {
        let config = Config::with_defaults();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.header_read_timeout_secs, 10);
        assert_eq!(config.db.host, "container_postgresql");
        assert_eq!(config.db.user, "testuser");
        assert_eq!(config.db.name, "testdb");
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.db.ssl_mode, "disable");
        assert_eq!(config.db.max_connections, 10);
        assert_eq!(config.db.max_lifetime(), Duration::from_secs(1800));
        assert_eq!(config.db.idle_timeout(), Duration::from_secs(600));
        assert_eq!(config.db.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        cleanup_env_vars();
        let config = Config::load_config(None, None).unwrap();
        assert_eq!(config, Config::with_defaults());
    }

    #[test]
    #[serial]
    fn test_load_config_with_environment_variables() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "9090");
            env::set_var("DB_HOST", "db.internal");
            env::set_var("DB_PORT", "6543");
            env::set_var("DB_USER", "svc");
            env::set_var("DB_PASSWORD", "secret");
            env::set_var("DB_NAME", "users");
            env::set_var("LOG_FORMAT", "json");
        }

        let config = Config::load_config(None, None).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.db.host, "db.internal");
        assert_eq!(config.db.port, 6543);
        assert_eq!(config.db.user, "svc");
        assert_eq!(config.db.password, "secret");
        assert_eq!(config.db.name, "users");
        assert_eq!(config.logging.format, LogFormat::Json);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_empty_environment_values_fall_back_to_defaults() {
        cleanup_env_vars();
        unsafe {
            env::set_var("DB_HOST", "");
            env::set_var("PORT", "");
        }

        let config = Config::load_config(None, None).unwrap();
        assert_eq!(config.db.host, "container_postgresql");
        assert_eq!(config.server.port, 3000);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_port_override_takes_precedence() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "5555");
        }

        let config = Config::load_config(None, Some(7777)).unwrap();
        assert_eq!(config.server.port, 7777);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_port_environment_is_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("DB_PORT", "not-a-port");
        }

        let err = Config::load_config(None, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "DB_PORT", .. }));
        assert!(err.to_string().contains("not-a-port"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_zero_port_override_is_rejected() {
        cleanup_env_vars();
        let err = Config::load_config(None, Some(0)).unwrap_err();
        assert!(err.to_string().contains("server port"));
    }

    #[test]
    #[serial]
    fn test_load_config_from_yaml_file() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("users.yaml");
        fs::write(
            &config_file,
            r"
server:
  port: 4000
db:
  host: yaml-host
  max_connections: 4
logging:
  level: debug
  format: json
",
        )
        .unwrap();

        let config = Config::load_config(Some(config_file), None).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.db.host, "yaml-host");
        assert_eq!(config.db.max_connections, 4);
        assert_eq!(config.db.name, "testdb");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_file_values_win_over_environment() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("users.json");
        fs::write(&config_file, r#"{"db": {"host": "json-host"}}"#).unwrap();
        unsafe {
            env::set_var("DB_HOST", "env-host");
            env::set_var("DB_NAME", "env-db");
        }

        let config = Config::load_config(Some(config_file), None).unwrap();

        assert_eq!(config.db.host, "json-host");
        assert_eq!(config.db.name, "env-db");

        cleanup_env_vars();
    }

    #[test]
    fn test_unsupported_file_extension() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("users.toml");
        fs::write(&config_file, "port = 1").unwrap();

        let err = Config::load_config(Some(config_file), None).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let mut config = Config::with_defaults();
        config.db.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_output_redacts_password() {
        let rendered = format!("{:?}", Config::with_defaults().db);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("testpass"));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" text ".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
