//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ServerConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.hostname.is_empty() {
        errors.push(ValidationError {
            field: "hostname".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if config.graceful_exit_timeout_ms == 0 {
        errors.push(ValidationError {
            field: "graceful_exit_timeout_ms".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.body_limit_bytes == 0 {
        errors.push(ValidationError {
            field: "body_limit_bytes".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "request_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
