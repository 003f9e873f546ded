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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "0.0.0.0:7000"

            [upstream]
            verify_certificates = false
            encoding_fallbacks = ["utf-8", "big5"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:7000");
        assert_eq!(config.listener.port_search_attempts, 1);
        assert!(!config.upstream.verify_certificates);
        assert_eq!(config.upstream.encoding_fallbacks, vec!["utf-8", "big5"]);
        assert_eq!(config.upstream.timeout_secs, 15);
        assert!(config.rewrite.inject_script);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse_config("[upstream]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("upstream.timeout_secs"));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_config("[listener"),
            Err(ConfigError::Parse(_))
        ));
    }
}
