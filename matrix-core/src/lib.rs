// Benchmark Matrix Library
// Expands a variant catalog and sweep axes into benchmark command lines

pub mod catalog;
pub mod config;
pub mod error;
pub mod matrix;
pub mod runners;
pub mod sweep;
pub mod template;

// Re-export commonly used types
pub use error::{ConfigError, ConfigResult};

// Re-export catalog and sweep types
pub use catalog::{ExecutableSpec, PartitionParam, VariantCatalog, VariantEntry, VariantId};
pub use sweep::{Profile, Scenario, ScenarioTable, SweepAxes, DEFAULT_PERF_FLAGS};

// Re-export template types
pub use template::{Bindings, Placeholder, Template, TemplateError};

// Re-export matrix types
pub use matrix::{Invocation, MatrixDriver, Sweep, SweepPoint};

// Re-export config types
pub use config::{
    BenchConfig, ConfigFile, ConfigParser, ConfigValidator, ParseError, ParseErrorKind,
    ValidationError,
};

// Re-export runner types
pub use runners::{
    progress_channel, ProgressReceiver, ProgressSender, RunEvent, RunRequest, RunSummary, Runner,
    RunnerError, Shell, ShellRunner,
};
