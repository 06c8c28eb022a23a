use std::env;
use std::num::ParseIntError;

/// Deployment environment, mirrors the original app's `ENV` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL used to format publisher start-stream links.
    pub base_link: String,
    /// HTTP listen port.
    pub port: u16,
    /// Application name, used only for logging/identification.
    pub app_name: String,
    /// Whether an embedder should run this process under a prefork
    /// supervisor. Not acted on by this crate directly (process management
    /// is routing/deployment territory, out of scope) but still validated
    /// so a bad value fails fast at startup rather than later.
    pub prefork: bool,
    /// Whether structured JSON logging is enabled.
    pub logger_enabled: bool,
    pub env: Environment,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidPort(String, ParseIntError),
    PortOutOfRange(u16),
    InvalidBool(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "{} is required", var),
            ConfigError::InvalidPort(var, err) => {
                write!(f, "{} must be a valid port number (got error: {})", var, err)
            }
            ConfigError::PortOutOfRange(port) => {
                write!(f, "PORT must be between 1 and 65535 (got {})", port)
            }
            ConfigError::InvalidBool(var, got) => {
                write!(f, "{} must be \"true\" or \"false\" (got '{}')", var, got)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_bool(var: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidBool(var.to_string(), raw)),
        },
    }
}

/// Validates environment variables and returns a Config object.
/// Returns an error if any required variable is missing or invalid.
pub fn validate_env() -> Result<Config, ConfigError> {
    // dotenvy failing to find a .env file is not an error; env vars may
    // already be set by the surrounding process/container.
    let _ = dotenvy::dotenv();

    let base_link =
        env::var("BASE_LINK").map_err(|_| ConfigError::MissingVariable("BASE_LINK".to_string()))?;

    let port_str = env::var("PORT").map_err(|_| ConfigError::MissingVariable("PORT".to_string()))?;
    let port: u16 = port_str
        .parse()
        .map_err(|e| ConfigError::InvalidPort("PORT".to_string(), e))?;
    if port == 0 {
        return Err(ConfigError::PortOutOfRange(port));
    }

    let app_name = env::var("APP_NAME").unwrap_or_else(|_| "livesfu".to_string());
    let prefork = parse_bool("PREFORK", false)?;
    let logger_enabled = parse_bool("LOGGER_ENABLED", true)?;
    let env = Environment::parse(&env::var("ENV").unwrap_or_else(|_| "development".to_string()));

    Ok(Config {
        base_link,
        port,
        app_name,
        prefork,
        logger_enabled,
        env,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    lazy_static::lazy_static! {
        static ref ENV_MUTEX: Mutex<()> = Mutex::new(());
    }

    struct EnvGuard<'a> {
        vars: Vec<String>,
        _guard: std::sync::MutexGuard<'a, ()>,
    }

    impl<'a> EnvGuard<'a> {
        fn new() -> Self {
            let guard = ENV_MUTEX.lock().unwrap();
            EnvGuard {
                vars: Vec::new(),
                _guard: guard,
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            env::set_var(key, value);
            self.vars.push(key.to_string());
        }

        fn unset(&mut self, key: &str) {
            env::remove_var(key);
            self.vars.push(key.to_string());
        }
    }

    impl<'a> Drop for EnvGuard<'a> {
        fn drop(&mut self) {
            for var in &self.vars {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_validate_env_valid_configuration() {
        let mut guard = EnvGuard::new();
        guard.set("BASE_LINK", "https://example.test");
        guard.set("PORT", "8080");

        let config = validate_env().expect("expected valid configuration");
        assert_eq!(config.port, 8080);
        assert_eq!(config.app_name, "livesfu");
        assert!(config.logger_enabled);
        assert_eq!(config.env, Environment::Development);
    }

    #[test]
    fn test_validate_env_missing_base_link() {
        let mut guard = EnvGuard::new();
        guard.unset("BASE_LINK");
        guard.set("PORT", "8080");

        let result = validate_env();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::MissingVariable(_)));
    }

    #[test]
    fn test_validate_env_invalid_port() {
        let mut guard = EnvGuard::new();
        guard.set("BASE_LINK", "https://example.test");
        guard.set("PORT", "not-a-number");

        let result = validate_env();
        assert!(matches!(result, Err(ConfigError::InvalidPort(_, _))));
    }

    #[test]
    fn test_validate_env_port_out_of_range() {
        let mut guard = EnvGuard::new();
        guard.set("BASE_LINK", "https://example.test");
        guard.set("PORT", "0");

        let result = validate_env();
        assert!(matches!(result, Err(ConfigError::PortOutOfRange(0))));
    }

    #[test]
    fn test_validate_env_production_flags() {
        let mut guard = EnvGuard::new();
        guard.set("BASE_LINK", "https://example.test");
        guard.set("PORT", "8080");
        guard.set("ENV", "production");
        guard.set("PREFORK", "true");
        guard.set("LOGGER_ENABLED", "false");

        let config = validate_env().expect("expected valid configuration");
        assert!(config.env.is_production());
        assert!(config.prefork);
        assert!(!config.logger_enabled);
    }

    #[test]
    fn test_validate_env_invalid_bool() {
        let mut guard = EnvGuard::new();
        guard.set("BASE_LINK", "https://example.test");
        guard.set("PORT", "8080");
        guard.set("PREFORK", "maybe");

        let result = validate_env();
        assert!(matches!(result, Err(ConfigError::InvalidBool(_, _))));
    }
}
