// Service Errors
// Configuration errors surfaced by catalog lookup, sweep construction and generation

use crate::config::{ParseError, ValidationError};
use crate::template::{Placeholder, TemplateError};

use thiserror::Error;

/// Static configuration mistakes. Always fatal; nothing here is retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown variant '{id}'{}", did_you_mean(.suggestion))]
    UnknownVariant {
        id: String,
        suggestion: Option<String>,
    },

    #[error("unknown scenario '{name}' (available: {})", .available.join(", "))]
    UnknownScenario {
        name: String,
        available: Vec<String>,
    },

    #[error("unknown profile '{name}' (available: {})", .available.join(", "))]
    UnknownProfile {
        name: String,
        available: Vec<String>,
    },

    #[error("scenario '{scenario}', {field} template: {source}")]
    Template {
        scenario: String,
        field: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("variant '{id}' has an empty executable")]
    EmptyExecutable { id: String },

    #[error("variant '{id}' declares a thread cap of 0")]
    ZeroThreadCap { id: String },

    #[error("variant '{id}' appears more than once in the sweep")]
    DuplicateVariant { id: String },

    #[error("value {value} appears more than once in the {axis} axis")]
    DuplicateAxisValue { axis: &'static str, value: u64 },

    #[error(
        "scenario '{scenario}' would write several runs to the same file: \
         the {axis} axis varies but the file name has no '{{{placeholder}}}'"
    )]
    CollidingOutputPaths {
        scenario: String,
        axis: &'static str,
        placeholder: Placeholder,
    },

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{} configuration error(s), first: {}", .errors.len(), first_error(.errors))]
    Invalid { errors: Vec<ValidationError> },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

fn first_error(errors: &[ValidationError]) -> String {
    errors.first().map(|e| e.to_string()).unwrap_or_default()
}

/// Result type for configuration and generation
pub type ConfigResult<T> = Result<T, ConfigError>;
