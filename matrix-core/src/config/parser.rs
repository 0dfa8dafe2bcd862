// Configuration Parser
// Loads the YAML configuration and validates it before anything is generated

use crate::config::error::{ParseError, ParseErrorKind, ParseResult, ValidationError};
use crate::config::models::{BenchConfig, ConfigFile, ProfileConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::template::{Placeholder, Template};

use std::fs;
use std::path::Path;
use tracing::debug;

/// Configuration shipped with the crate
pub const BUILTIN_CONFIG: &str = include_str!("../../config/default.yaml");

/// YAML configuration parser
pub struct ConfigParser;

impl ConfigParser {
    /// Parse configuration from a YAML string
    pub fn parse(content: &str) -> ParseResult<ConfigFile> {
        serde_yaml::from_str(content).map_err(|e| ParseError::from_yaml_error(&e, content))
    }

    /// Parse configuration from a file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<ConfigFile> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParseError::new(
                format!("failed to read '{}': {}", path.display(), e),
                0,
                0,
            )
            .with_kind(ParseErrorKind::IoError)
        })?;

        Self::parse(&content)
    }

    /// The built-in configuration document
    pub fn builtin() -> ParseResult<ConfigFile> {
        Self::parse(BUILTIN_CONFIG)
    }

    /// Parse, validate and compile: `path` if given, else the built-in document
    pub fn load(path: Option<&Path>) -> ConfigResult<BenchConfig> {
        let file = match path {
            Some(path) => Self::parse_file(path)?,
            None => Self::builtin()?,
        };

        ConfigValidator::validate(&file).map_err(|errors| ConfigError::Invalid { errors })?;
        let config = file.compile()?;

        debug!(
            variants = config.catalog.len(),
            scenarios = config.scenarios.len(),
            profiles = config.profiles.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}

/// Semantic checks over a parsed configuration file
pub struct ConfigValidator;

impl ConfigValidator {
    /// Collect every problem in one pass
    pub fn validate(file: &ConfigFile) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (id, variant) in &file.variants {
            let path = format!("variants.{}", id);

            if let Some(exe) = &variant.exe {
                if exe.trim().is_empty() {
                    errors.push(
                        ValidationError::new("executable is empty", format!("{}.exe", path))
                            .with_suggestion("remove 'exe' to use the variant name"),
                    );
                }
            }
            if let Some(flag) = &variant.partition_flag {
                if flag.trim().is_empty() || flag.starts_with('-') {
                    errors.push(
                        ValidationError::new(
                            "partition flag must be a bare name",
                            format!("{}.partition_flag", path),
                        )
                        .with_suggestion("write 'p' rather than '-p'; the dash is added when rendering"),
                    );
                }
            }
            if variant.max_threads == Some(0) {
                errors.push(ValidationError::new(
                    "thread cap must be at least 1",
                    format!("{}.max_threads", path),
                ));
            }
        }

        for (name, scenario) in &file.scenarios {
            let path = format!("scenarios.{}", name);

            if let Err(e) = Template::parse(&scenario.command) {
                errors.push(ValidationError::new(e.to_string(), format!("{}.command", path)));
            }

            match Template::parse(&scenario.filename) {
                Ok(template) if template.references(Placeholder::Filename) => {
                    errors.push(ValidationError::new(
                        "file-name template cannot reference '{filename}'",
                        format!("{}.filename", path),
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    errors.push(ValidationError::new(e.to_string(), format!("{}.filename", path)))
                }
            }
        }

        for (name, profile) in &file.profiles {
            Self::validate_profile(file, profile, &format!("profiles.{}", name), &mut errors);
        }

        if let Some(name) = &file.default_profile {
            if !file.profiles.contains_key(name) {
                errors.push(ValidationError::new(
                    format!("profile '{}' is not defined", name),
                    "default_profile",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_profile(
        file: &ConfigFile,
        profile: &ProfileConfig,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        if profile.threads.is_empty() {
            errors.push(ValidationError::new(
                "thread axis is empty",
                format!("{}.threads", path),
            ));
        }
        if profile.works.is_empty() {
            errors.push(
                ValidationError::new("work axis is empty", format!("{}.works", path))
                    .with_suggestion("list at least one work value, e.g. 'works: [0]'"),
            );
        }
        if profile.max_threads == Some(0) {
            errors.push(ValidationError::new(
                "thread cap must be at least 1",
                format!("{}.max_threads", path),
            ));
        }

        for (i, id) in profile.variants.iter().enumerate() {
            if !file.variants.contains_key(id) {
                errors.push(
                    ValidationError::new(
                        format!("unknown variant '{}'", id),
                        format!("{}.variants[{}]", path, i),
                    )
                    .with_suggestion("declare it under 'variants'"),
                );
            }
            if profile.variants[..i].contains(id) {
                errors.push(ValidationError::new(
                    format!("variant '{}' is listed twice", id),
                    format!("{}.variants[{}]", path, i),
                ));
            }
        }

        check_unique(&profile.threads, &format!("{}.threads", path), errors);
        check_unique(&profile.works, &format!("{}.works", path), errors);
        check_unique(&profile.partitions, &format!("{}.partitions", path), errors);
    }
}

fn check_unique<T: PartialEq + std::fmt::Display>(
    values: &[T],
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    for (i, value) in values.iter().enumerate() {
        if values[..i].contains(value) {
            errors.push(ValidationError::new(
                format!("value {} is listed twice", value),
                format!("{}[{}]", path, i),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatrixDriver;
    use crate::sweep::SweepAxes;

    use std::io::Write;

    const MINIMAL: &str = r#"
perf_flags: "-perf"
default_profile: tiny
variants:
  ms: {}
  scal2random:
    exe: dq-2random -nohw_random
    partition_flag: p
scenarios:
  prodcon:
    command: >-
      @../prodcon-{exe} -producers {thread} -consumers {thread}
      -c {work} {partition_flag} {partition} {perf} > {filename}
    filename: "@{directory}{variant}-t{thread}{partition_flag}{partition}-c{work}.txt"
profiles:
  tiny:
    variants: [ms, scal2random]
    threads: [1, 2]
    works: [0]
    partitions: [2]
"#;

    #[test]
    fn test_parse_minimal() {
        let file = ConfigParser::parse(MINIMAL).unwrap();
        assert_eq!(file.variants.len(), 2);
        assert_eq!(
            file.scenarios["prodcon"].command,
            "@../prodcon-{exe} -producers {thread} -consumers {thread} \
             -c {work} {partition_flag} {partition} {perf} > {filename}"
        );
        assert!(ConfigValidator::validate(&file).is_ok());
    }

    #[test]
    fn test_parse_unknown_field_with_suggestion() {
        let content = "variants:\n  fc:\n    maxThreads: 8\n";
        let err = ConfigParser::parse(content).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownField);
        assert!(err.message.contains("unknown field 'maxThreads'"));
        assert_eq!(err.suggestion.as_deref(), Some("did you mean 'max_threads'?"));
    }

    #[test]
    fn test_parse_missing_filename() {
        let content = "scenarios:\n  enq:\n    command: \"{exe}\"\n";
        let err = ConfigParser::parse(content).unwrap_err();
        assert!(err.message.contains("missing required field 'filename'"));
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_parse_file_missing() {
        let err = ConfigParser::parse_file("/nonexistent/qbench.yaml").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::IoError);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = ConfigParser::load(Some(file.path())).unwrap();
        let profile = config.select_profile(None).unwrap().unwrap();
        let scenario = config.scenarios.get("prodcon").unwrap();
        let axes = SweepAxes::from_profile(profile, "out");

        let sweep = MatrixDriver::generate(scenario, &config.catalog, &axes).unwrap();
        let invocations = sweep.invocations().unwrap();
        assert_eq!(invocations.len(), 4);
        assert_eq!(
            invocations[3].output_path.to_string_lossy(),
            "out/scal2random-t2-p2-c0.txt"
        );
    }

    #[test]
    fn test_validator_collects_all_errors() {
        let content = r#"
default_profile: missing
variants:
  ms:
    exe: "  "
  sq:
    partition_flag: "-k"
    max_threads: 0
scenarios:
  broken:
    command: "-t {threads}"
    filename: "{filename}.txt"
profiles:
  p:
    variants: [ms, wf, ms]
    threads: [1, 1]
"#;
        let file = ConfigParser::parse(content).unwrap();
        let errors = ConfigValidator::validate(&file).unwrap_err();
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();

        assert!(paths.contains(&"variants.ms.exe"));
        assert!(paths.contains(&"variants.sq.partition_flag"));
        assert!(paths.contains(&"variants.sq.max_threads"));
        assert!(paths.contains(&"scenarios.broken.command"));
        assert!(paths.contains(&"scenarios.broken.filename"));
        assert!(paths.contains(&"profiles.p.variants[1]"));
        assert!(paths.contains(&"profiles.p.variants[2]"));
        assert!(paths.contains(&"profiles.p.threads[1]"));
        assert!(paths.contains(&"profiles.p.works"));
        assert!(paths.contains(&"default_profile"));
    }

    #[test]
    fn test_validator_rejects_profile_without_works() {
        let content = r#"
variants:
  ms: {}
scenarios:
  prodcon:
    command: "@../prodcon-{exe} -t {thread} -c {work} > {filename}"
    filename: "@{directory}{variant}-t{thread}-c{work}.txt"
profiles:
  b6:
    variants: [ms]
    threads: [1, 2]
  b7:
    variants: [ms]
    threads: [1, 2]
    works: []
"#;
        let file = ConfigParser::parse(content).unwrap();
        let errors = ConfigValidator::validate(&file).unwrap_err();
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["profiles.b6.works", "profiles.b7.works"]);
        assert!(errors[0].suggestion.is_some());
    }

    #[test]
    fn test_builtin_is_valid() {
        let file = ConfigParser::builtin().unwrap();
        if let Err(errors) = ConfigValidator::validate(&file) {
            panic!("built-in configuration is invalid: {:?}", errors);
        }

        let config = file.compile().unwrap();
        for name in [
            "prodcon",
            "lcrq",
            "delay250",
            "delay2000",
            "enq",
            "infprod",
            "deq",
            "seqalt",
            "shortest-path",
        ] {
            assert!(config.scenarios.get(name).is_ok(), "missing scenario {name}");
        }
        assert_eq!(
            config.catalog.resolve_executable("scal1rr").unwrap().command_line(),
            "dq-partrr -partitions 1"
        );
        assert_eq!(config.catalog.resolve_partition_flag("rd").unwrap(), Some("quasi_factor"));
        assert_eq!(config.profile("b8").unwrap().max_threads, Some(80));
    }

    #[test]
    fn test_builtin_profiles_generate() {
        let config = ConfigParser::load(None).unwrap();
        let scenario = config.scenarios.get("prodcon").unwrap();

        for profile in config.profiles.values() {
            let axes = SweepAxes::from_profile(profile, "tmp");
            let sweep = MatrixDriver::generate(scenario, &config.catalog, &axes).unwrap();
            let invocations = sweep.invocations().unwrap();
            assert_eq!(invocations.len(), sweep.len());
        }
    }
}
