// Template Lexer
// Splits a template string into literal text, placeholders and the prefix marker

use crate::template::engine::Placeholder;
use crate::template::TemplateError;

/// Character separating the discarded prefix from the real template body
pub const PREFIX_MARKER: char = '@';

/// A lexical piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text copied verbatim (escaped braces already collapsed)
    Text(String),
    /// Named placeholder: {name}
    Placeholder(Placeholder),
    /// Conditional prefix marker: @
    Marker,
}

/// Tokenize a template string.
///
/// `{{` and `}}` produce literal braces. Only the first `@` is the prefix
/// marker; any later `@` is ordinary text. A placeholder name must be one of the
/// known [`Placeholder`] names; anything else is rejected here so that a bad
/// template fails when the configuration is loaded, not halfway through a sweep.
pub fn tokenize(input: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = input.char_indices().peekable();
    let mut seen_marker = false;

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    text.push('{');
                    continue;
                }

                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(TemplateError::Unclosed { offset: pos });
                }

                let placeholder = Placeholder::from_name(name.trim()).ok_or_else(|| {
                    TemplateError::UnknownPlaceholder {
                        name: name.trim().to_string(),
                        offset: pos,
                    }
                })?;

                flush_text(&mut text, &mut segments);
                segments.push(Segment::Placeholder(placeholder));
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    text.push('}');
                } else {
                    return Err(TemplateError::UnmatchedClose { offset: pos });
                }
            }
            PREFIX_MARKER if !seen_marker => {
                seen_marker = true;
                flush_text(&mut text, &mut segments);
                segments.push(Segment::Marker);
            }
            _ => text.push(c),
        }
    }

    flush_text(&mut text, &mut segments);
    Ok(segments)
}

fn flush_text(text: &mut String, segments: &mut Vec<Segment>) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_text() {
        let segments = tokenize("-noset_rt_priority").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Text("-noset_rt_priority".to_string())]
        );
    }

    #[test]
    fn test_tokenize_placeholders_and_marker() {
        let segments = tokenize("{work}@-t{thread}").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Placeholder(Placeholder::Work),
                Segment::Marker,
                Segment::Text("-t".to_string()),
                Segment::Placeholder(Placeholder::Thread),
            ]
        );
    }

    #[test]
    fn test_tokenize_later_at_signs_are_text() {
        let segments = tokenize("@scp {filename} user@host:/r/").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Marker,
                Segment::Text("scp ".to_string()),
                Segment::Placeholder(Placeholder::Filename),
                Segment::Text(" user@host:/r/".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_trims_placeholder_name() {
        let segments = tokenize("{ variant }").unwrap();
        assert_eq!(segments, vec![Segment::Placeholder(Placeholder::Variant)]);
    }

    #[test]
    fn test_tokenize_escaped_braces() {
        let segments = tokenize("{{literal}} {exe}").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Text("{literal} ".to_string()),
                Segment::Placeholder(Placeholder::Exe),
            ]
        );
    }

    #[test]
    fn test_tokenize_unknown_placeholder() {
        let err = tokenize("-c {wrok}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder {
                name: "wrok".to_string(),
                offset: 3,
            }
        );
    }

    #[test]
    fn test_tokenize_unclosed_placeholder() {
        let err = tokenize("-t {thread").unwrap_err();
        assert_eq!(err, TemplateError::Unclosed { offset: 3 });
    }

    #[test]
    fn test_tokenize_unmatched_close() {
        let err = tokenize("-t thread}").unwrap_err();
        assert_eq!(err, TemplateError::UnmatchedClose { offset: 9 });
    }
}
