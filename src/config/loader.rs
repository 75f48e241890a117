//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: String, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value for {}: {:?}", var, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then process environment, then
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Override `config` from environment variables.
///
/// Each variable may instead name a file through `<VAR>_FILE`; the file
/// content (trimmed) wins over the plain variable.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| -> Option<String> {
        if let Some(file) = lookup(&format!("{}_FILE", var)) {
            match fs::read_to_string(&file) {
                Ok(content) => return Some(content.trim().to_string()),
                Err(e) => tracing::warn!(var = %var, file = %file, error = %e, "Cannot read secret file"),
            }
        }
        lookup(var)
    };

    if let Some(v) = get("TRANS_HOST") {
        config.trans.host = v;
    }
    if let Some(v) = get("TRANS_PORT") {
        config.trans.port = parse("TRANS_PORT", v)?;
    }
    if let Some(v) = get("TRANS_TIMEOUT") {
        config.trans.timeout_secs = parse("TRANS_TIMEOUT", v)?;
    }
    if let Some(v) = get("TRANS_RETRY") {
        config.trans.retry.interval_secs = parse("TRANS_RETRY", v)?;
    }
    if let Some(v) = get("TRANS_COMMANDS") {
        config.trans.allowed_commands = v;
    }

    let host = get("APP_HOST");
    let port = get("APP_PORT");
    if host.is_some() || port.is_some() {
        let (default_host, default_port) = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(h, p)| (h.to_string(), p.to_string()))
            .unwrap_or_else(|| ("0.0.0.0".to_string(), "8080".to_string()));
        let port = match port {
            Some(p) => parse::<u16>("APP_PORT", p)?.to_string(),
            None => default_port,
        };
        config.listener.bind_address = format!("{}:{}", host.unwrap_or(default_host), port);
    }
    if let Some(v) = get("APP_API_KEY") {
        config.auth.api_key = v;
    }

    if let Some(v) = get("LOGGER_LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = get("PROMETHEUS_ENABLED") {
        config.observability.metrics_enabled = parse("PROMETHEUS_ENABLED", v)?;
    }
    if let Some(v) = get("PROMETHEUS_PORT") {
        let port: u16 = parse("PROMETHEUS_PORT", v)?;
        let host = config
            .observability
            .metrics_address
            .rsplit_once(':')
            .map(|(h, _)| h.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.observability.metrics_address = format!("{}:{}", host, port);
    }

    Ok(())
}

fn parse<T: FromStr>(var: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var: var.to_string(),
        value,
    })
}
