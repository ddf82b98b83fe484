//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port non-zero)
//! - Check settings that depend on each other (file sink needs a file name)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConfigSnapshot → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ConfigSnapshot;

/// A single semantic problem in an otherwise well-formed file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a freshly deserialized snapshot.
pub fn validate_config(config: &ConfigSnapshot) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.system.port == 0 {
        errors.push(ValidationError::new("system.port", "must be between 1 and 65535"));
    }

    if config.zap.log_in_file && config.lumberjack.filename.trim().is_empty() {
        errors.push(ValidationError::new(
            "lumberjack.filename",
            "required when zap.log_in_file is enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
