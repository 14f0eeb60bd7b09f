//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deserialize configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(
            r#"
            [upstream]
            url = "http://grid:4444/wd/hub"

            [session]
            ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.url, "http://grid:4444/wd/hub");
        assert_eq!(config.session.ttl_secs, 60);
        // Untouched sections keep their defaults.
        assert_eq!(config.listener.bind_address, "0.0.0.0:8086");
        assert_eq!(config.upstream.request_timeout_secs, 300);
    }

    #[test]
    fn test_upstream_timeouts() {
        let config = parse_config(
            r#"
            [upstream]
            url = "http://grid:4444"
            connect_timeout_secs = 2
            request_timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.connect_timeout_secs, 2);
        assert_eq!(config.upstream.request_timeout().as_secs(), 30);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        // Misplaced key
        let result = parse_config("[session]\nrequest_timeout_secs = 30\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        // Unknown section
        let result = parse_config("[timeouts]\nrequest_secs = 30\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.upstream.url, "http://localhost:4444");
        assert_eq!(config.session.ttl_secs, 28_800);
    }

    #[test]
    fn test_load_rejects_invalid_upstream() {
        let path = std::env::temp_dir().join(format!(
            "webdriver-proxy-config-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[upstream]\nurl = \"::not a url::\"\n").unwrap();

        let result = load_config(&path);
        fs::remove_file(&path).unwrap_or_default();

        match result {
            Err(ConfigError::Validation(errors)) => {
                assert!(matches!(errors[0], ValidationError::InvalidUpstreamUrl { .. }));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
