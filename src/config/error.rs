//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("/site/cachet.toml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(io_err.to_string().contains("cachet.toml"));
        assert!(io_err.source().is_some());

        let validation_err = ConfigError::Validation("hash.length must be 4..=64".to_string());
        assert_eq!(
            validation_err.to_string(),
            "Config validation error: hash.length must be 4..=64"
        );
    }
}
