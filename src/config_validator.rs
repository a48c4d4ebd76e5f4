use crate::config::Config;
use crate::error::ReadexError;

/// Runtime modes the service understands.
const VALID_MODES: [&str; 4] = ["development", "staging", "production", "test"];

/// Validates configuration objects for consistency and correctness
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a whole configuration before the server starts
    pub fn validate(config: &Config) -> Result<(), ReadexError> {
        Self::validate_runtime_mode(&config.runtime_mode)?;
        Self::validate_api_base_url(&config.api_base_url)?;

        if config.data_dir.as_os_str().is_empty() {
            return Err(ReadexError::Configuration(
                "Data directory cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates the remote query API base URL
    pub fn validate_api_base_url(url: &str) -> Result<(), ReadexError> {
        if url.is_empty() {
            return Err(ReadexError::Configuration(
                "API base URL cannot be empty".to_string(),
            ));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ReadexError::Configuration(
                "API base URL must start with 'http://' or 'https://'".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates runtime mode name
    pub fn validate_runtime_mode(mode: &str) -> Result<(), ReadexError> {
        if !VALID_MODES.contains(&mode.to_lowercase().as_str()) {
            return Err(ReadexError::Configuration(format!(
                "Invalid runtime mode '{}'. Must be one of: {:?}",
                mode, VALID_MODES
            )));
        }

        Ok(())
    }
}
