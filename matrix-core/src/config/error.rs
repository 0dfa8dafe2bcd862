// Configuration error types with helpful error messages
// Line/column info, a source excerpt and suggestions for common mistakes

use std::fmt;

/// Detailed parse error with location and context
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Line number (1-indexed, 0 when unknown)
    pub line: usize,
    /// Column number (1-indexed, 0 when unknown)
    pub column: usize,
    /// Surrounding context (a few lines around the error)
    pub context: String,
    /// Optional suggestion for fixing the error
    pub suggestion: Option<String>,
    /// The kind of error
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// YAML syntax error
    YamlSyntax,
    /// Wrong types or missing fields
    InvalidSchema,
    /// Field not part of the configuration schema
    UnknownField,
    /// File could not be read
    IoError,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            context: String::new(),
            suggestion: None,
            kind: ParseErrorKind::InvalidSchema,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Create context from source content
    pub fn with_source_context(mut self, source: &str, context_lines: usize) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        let start = self.line.saturating_sub(context_lines + 1);
        let end = (self.line + context_lines).min(lines.len());

        let mut context = String::new();
        for (i, line) in lines.iter().enumerate().take(end).skip(start) {
            let line_num = i + 1;
            let prefix = if line_num == self.line { ">" } else { " " };
            context.push_str(&format!("{} {:4} | {}\n", prefix, line_num, line));

            if line_num == self.line && self.column > 0 {
                let indicator = " ".repeat(self.column.saturating_sub(1)) + "^";
                context.push_str(&format!("       | {}\n", indicator));
            }
        }

        self.context = context;
        self
    }

    /// Create from serde_yaml error
    pub fn from_yaml_error(err: &serde_yaml::Error, source: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((0, 0));

        let raw = err.to_string();
        let kind = if raw.contains("unknown field") {
            ParseErrorKind::UnknownField
        } else if raw.contains("invalid type") || raw.contains("missing field") {
            ParseErrorKind::InvalidSchema
        } else {
            ParseErrorKind::YamlSyntax
        };

        let mut parsed = ParseError::new(format_yaml_error_message(&raw), line, column)
            .with_kind(kind)
            .with_source_context(source, 2);
        parsed.suggestion = suggest_fix(&raw, source, line);
        parsed
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if self.line > 0 {
            write!(f, " (line {}:{})", self.line, self.column)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            write!(f, "{}", self.context.trim_end())?;
        }

        if let Some(suggestion) = &self.suggestion {
            writeln!(f)?;
            write!(f, "help: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Rephrase the common serde_yaml messages
fn format_yaml_error_message(msg: &str) -> String {
    if msg.contains("missing field") {
        if let Some(field) = extract_between(msg, "missing field `", "`") {
            return format!("missing required field '{}'", field);
        }
    }

    if msg.contains("unknown field") {
        if let Some(field) = extract_between(msg, "unknown field `", "`") {
            if let Some(expected) = extract_expected_fields(msg) {
                return format!(
                    "unknown field '{}', expected one of: {}",
                    field,
                    expected.join(", ")
                );
            }
            return format!("unknown field '{}'", field);
        }
    }

    if msg.contains("invalid type") {
        if let (Some(expected), Some(found)) = (
            extract_between(msg, "expected ", " at"),
            extract_between(msg, "invalid type: ", ","),
        ) {
            return format!("expected {}, but found {}", expected, found);
        }
    }

    msg.to_string()
}

fn extract_between(msg: &str, prefix: &str, suffix: &str) -> Option<String> {
    let start = msg.find(prefix)? + prefix.len();
    let end = msg[start..].find(suffix)? + start;
    Some(msg[start..end].to_string())
}

fn extract_expected_fields(msg: &str) -> Option<Vec<String>> {
    let start = msg.find("expected one of ")? + "expected one of ".len();
    let fields_str = &msg[start..];
    let end = fields_str.find(" at").unwrap_or(fields_str.len());
    Some(
        fields_str[..end]
            .split(", ")
            .map(|s| s.trim_matches('`').to_string())
            .collect(),
    )
}

/// Suggest fixes for common configuration mistakes
fn suggest_fix(msg: &str, source: &str, line: usize) -> Option<String> {
    let raw_line = source.lines().nth(line.saturating_sub(1)).unwrap_or_default();
    let error_line = raw_line.trim_start();

    if msg.contains("missing field `filename`") {
        return Some(
            "every scenario needs both 'command' and 'filename' templates".to_string(),
        );
    }

    if raw_line.starts_with('\t') {
        return Some("YAML does not allow tabs for indentation. Use spaces.".to_string());
    }

    let typo_suggestions = [
        ("executable:", "exe"),
        ("partition:", "partition_flag"),
        ("partitionflag:", "partition_flag"),
        ("pparameter:", "partition_flag"),
        ("maxthreads:", "max_threads"),
        ("max_thread:", "max_threads"),
        ("template:", "command"),
        ("perfflags:", "perf_flags"),
        ("perfparam:", "perf_flags"),
        ("thread:", "threads"),
        ("work:", "works"),
    ];

    if msg.contains("unknown field") {
        let lower_line = error_line.to_lowercase();
        for (typo, correct) in typo_suggestions {
            if lower_line.starts_with(typo) {
                return Some(format!("did you mean '{}'?", correct));
            }
        }
    }

    None
}

/// Result type for configuration parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Semantic problem found by the configuration validator
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
    pub path: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error at '{}': {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
