// Configuration module
// YAML loading, validation and compilation into the immutable catalog and scenario table

pub mod error;
pub mod models;
pub mod parser;

pub use error::{ParseError, ParseErrorKind, ParseResult, ValidationError};
pub use models::{BenchConfig, ConfigFile, ProfileConfig, ScenarioConfig, VariantConfig};
pub use parser::{ConfigParser, ConfigValidator, BUILTIN_CONFIG};
