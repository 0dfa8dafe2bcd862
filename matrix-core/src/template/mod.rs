// Template Module
// Placeholder templates for benchmark command lines and output file names

pub mod engine;
pub mod lexer;

pub use engine::{Bindings, Placeholder, Template};
pub use lexer::{tokenize, Segment, PREFIX_MARKER};

use thiserror::Error;

/// Errors raised while parsing or rendering a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{name}}}' at offset {offset}")]
    UnknownPlaceholder { name: String, offset: usize },

    #[error("unclosed placeholder starting at offset {offset}")]
    Unclosed { offset: usize },

    #[error("unmatched '}}' at offset {offset} (use '}}}}' for a literal brace)")]
    UnmatchedClose { offset: usize },

    #[error("placeholder '{{{0}}}' has no binding")]
    Unbound(Placeholder),
}

/// Parse and render in one step
pub fn render(template: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    Template::parse(template)?.render(bindings)
}
