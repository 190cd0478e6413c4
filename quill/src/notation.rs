//! Cursor notation: text with caret and selection markers.
//!
//! # Syntax
//!
//! - `|` - caret
//! - `<||text|>` - selection with the caret (focus) at its start
//! - `<|text||>` - selection with the caret (focus) at its end
//!
//! `||` is a literal `|`. A backslash escapes `<`, `>`, `|` or `\`, so `\<|`
//! is a literal `<` followed by a caret. [`format`] only writes a backslash
//! where a marker would otherwise be misread. Offsets are char offsets.
//!
//! ```ignore
//! let p = notation::parse("hello <|world||>").unwrap();
//! assert_eq!(p.text, "hello world");
//! assert_eq!(p.selection, Some(Marked { range: 6..11, cursor_at_start: false }));
//! ```

use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// Text with all markers removed.
    pub text: String,
    pub cursor: Option<usize>,
    pub selection: Option<Marked>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marked {
    pub range: Range<usize>,
    /// True if the caret is at the start of the range.
    pub cursor_at_start: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Selection missing cursor marker (use <||text|> or <|text||>)")]
    SelectionMissingCursor,

    #[error("Cursor must be at selection boundary, not in middle")]
    CursorNotAtBoundary,

    #[error("Unclosed selection (missing |>)")]
    UnclosedSelection,

    #[error("Unexpected selection end |> without matching <|")]
    UnexpectedSelectionEnd,

    #[error("Selection has cursor at both start and end")]
    CursorAtBothEnds,

    #[error("More than one cursor or selection")]
    MultipleCursors,
}

pub fn parse(input: &str) -> Result<Parsed, ParseError> {
    let mut text = String::new();
    let mut cursor = None;
    let mut selection = None;
    let mut chars = input.chars().peekable();
    let mut offset = 0;

    // (start, cursor_at_start)
    let mut active: Option<(usize, bool)> = None;

    while let Some(ch) = chars.next() {
        match ch {
            '|' => match chars.peek() {
                Some('|') => {
                    chars.next();
                    if chars.next_if_eq(&'>').is_some() {
                        let (start, at_start) =
                            active.take().ok_or(ParseError::UnexpectedSelectionEnd)?;
                        if at_start {
                            return Err(ParseError::CursorAtBothEnds);
                        }
                        set_once(
                            &mut selection,
                            &cursor,
                            Marked {
                                range: start..offset,
                                cursor_at_start: false,
                            },
                        )?;
                    } else {
                        text.push('|');
                        offset += 1;
                    }
                },
                Some('>') => {
                    chars.next();
                    let (start, at_start) =
                        active.take().ok_or(ParseError::UnexpectedSelectionEnd)?;
                    if !at_start {
                        return Err(ParseError::SelectionMissingCursor);
                    }
                    set_once(
                        &mut selection,
                        &cursor,
                        Marked {
                            range: start..offset,
                            cursor_at_start: true,
                        },
                    )?;
                },
                _ => {
                    if active.is_some() {
                        return Err(ParseError::CursorNotAtBoundary);
                    }
                    if cursor.is_some() || selection.is_some() {
                        return Err(ParseError::MultipleCursors);
                    }
                    cursor = Some(offset);
                },
            },
            '\\' => {
                let escaped = chars
                    .next_if(|next| matches!(next, '<' | '>' | '|' | '\\'))
                    .unwrap_or('\\');
                text.push(escaped);
                offset += 1;
            },
            '<' if chars.peek() == Some(&'|') => {
                chars.next();
                if active.is_some() {
                    return Err(ParseError::UnclosedSelection);
                }
                let at_start = chars.next_if_eq(&'|').is_some();
                active = Some((offset, at_start));
            },
            _ => {
                text.push(ch);
                offset += 1;
            },
        }
    }

    if active.is_some() {
        return Err(ParseError::UnclosedSelection);
    }

    Ok(Parsed {
        text,
        cursor,
        selection,
    })
}

fn set_once(
    selection: &mut Option<Marked>,
    cursor: &Option<usize>,
    marked: Marked,
) -> Result<(), ParseError> {
    if selection.is_some() || cursor.is_some() {
        return Err(ParseError::MultipleCursors);
    }
    *selection = Some(marked);
    Ok(())
}

enum Token<'a> {
    Marker(&'a str),
    Char(char),
}

impl Token<'_> {
    fn ends_with_pipe(&self) -> bool {
        match self {
            Token::Marker(marker) => marker.ends_with('|'),
            Token::Char(ch) => *ch == '|',
        }
    }
}

/// Format text with markers. Inverse of [`parse`]; a selection takes precedence
/// over a bare cursor.
pub fn format(text: &str, cursor: Option<usize>, selection: Option<&Marked>) -> String {
    let mut markers: Vec<(usize, &str)> = Vec::new();
    match (selection, cursor) {
        (Some(marked), _) if marked.cursor_at_start => {
            markers.push((marked.range.start, "<||"));
            markers.push((marked.range.end, "|>"));
        },
        (Some(marked), _) => {
            markers.push((marked.range.start, "<|"));
            markers.push((marked.range.end, "||>"));
        },
        (None, Some(cursor)) => markers.push((cursor, "|")),
        (None, None) => {},
    }

    let mut tokens = Vec::with_capacity(text.len() + markers.len());
    let mut markers = markers.into_iter().peekable();
    for (offset, ch) in text.chars().enumerate() {
        while let Some((_, marker)) = markers.next_if(|(at, _)| *at <= offset) {
            tokens.push(Token::Marker(marker));
        }
        tokens.push(Token::Char(ch));
    }
    tokens.extend(markers.map(|(_, marker)| Token::Marker(marker)));

    // Whether a char needs escaping depends on what is written after it, so
    // pieces are produced back to front.
    let mut pieces = Vec::with_capacity(tokens.len());
    let mut next: Option<char> = None;
    for (i, token) in tokens.iter().enumerate().rev() {
        let after_pipe = i
            .checked_sub(1)
            .and_then(|prev| tokens.get(prev))
            .is_some_and(Token::ends_with_pipe);
        let piece = match *token {
            Token::Marker(marker) => marker.to_string(),
            Token::Char('|') if after_pipe => "\\|".to_string(),
            Token::Char('|') => "||".to_string(),
            Token::Char('>') if after_pipe => "\\>".to_string(),
            Token::Char('<') if next == Some('|') => "\\<".to_string(),
            Token::Char('\\') if matches!(next, Some('<' | '>' | '|' | '\\')) => {
                "\\\\".to_string()
            },
            Token::Char(ch) => ch.to_string(),
        };
        next = piece.chars().next();
        pieces.push(piece);
    }
    pieces.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cursor() {
        let p = parse("hel|lo").unwrap();
        assert_eq!(p.text, "hello");
        assert_eq!(p.cursor, Some(3));
        assert_eq!(p.selection, None);
    }

    #[test]
    fn parses_selections() {
        let p = parse("Hello <|World!||>").unwrap();
        assert_eq!(p.text, "Hello World!");
        assert_eq!(
            p.selection,
            Some(Marked {
                range: 6..12,
                cursor_at_start: false
            })
        );

        let p = parse("<||ab|>c").unwrap();
        assert_eq!(
            p.selection,
            Some(Marked {
                range: 0..2,
                cursor_at_start: true
            })
        );
    }

    #[test]
    fn escaped_pipe_is_text() {
        let p = parse("a||b|").unwrap();
        assert_eq!(p.text, "a|b");
        assert_eq!(p.cursor, Some(3));
    }

    #[test]
    fn offsets_are_chars() {
        let p = parse("€€|x").unwrap();
        assert_eq!(p.cursor, Some(2));
    }

    #[test]
    fn rejects_malformed_markers() {
        assert_eq!(parse("<|ab|>"), Err(ParseError::SelectionMissingCursor));
        assert_eq!(parse("<|a|b||>"), Err(ParseError::CursorNotAtBoundary));
        assert_eq!(parse("<|ab"), Err(ParseError::UnclosedSelection));
        assert_eq!(parse("ab|>"), Err(ParseError::UnexpectedSelectionEnd));
        assert_eq!(parse("<||ab||>"), Err(ParseError::CursorAtBothEnds));
        assert_eq!(parse("a|b|"), Err(ParseError::MultipleCursors));
    }

    #[test]
    fn backslash_escapes_markers() {
        let p = parse(r"a\<|b").unwrap();
        assert_eq!(p.text, "a<b");
        assert_eq!(p.cursor, Some(2));

        let p = parse(r"\|\>\\x\y").unwrap();
        assert_eq!(p.text, r"|>\x\y");
        assert_eq!(p.cursor, None);
    }

    #[test]
    fn pipes_inside_selections_are_text() {
        let p = parse("<|a||b||>").unwrap();
        assert_eq!(p.text, "a|b");
        assert_eq!(
            p.selection,
            Some(Marked {
                range: 0..3,
                cursor_at_start: false
            })
        );
    }

    #[test]
    fn format_escapes_text_that_looks_like_markers() {
        assert_eq!(format("a<|b", None, None), r"a\<||b");
        assert_eq!(format("a<|b", Some(2), None), r"a\<|\|b");
        assert_eq!(format("a<b", Some(1), None), "a|<b");

        let cases = [
            ("a<|b", None),
            ("a<|b", Some(1)),
            ("a<|b", Some(2)),
            ("|", Some(0)),
            ("|", Some(1)),
            ("x|>", Some(3)),
            ("|>", None),
            (r"\<", Some(2)),
            (r"a\b", Some(1)),
            (r"\\", Some(2)),
        ];
        for (text, cursor) in cases {
            let formatted = format(text, cursor, None);
            let p = parse(&formatted).unwrap();
            assert_eq!((p.text.as_str(), p.cursor), (text, cursor), "{formatted:?}");
        }

        for (text, range, cursor_at_start) in [
            ("a|b", 0..3, false),
            ("a|b", 0..3, true),
            ("|>", 0..2, false),
            ("x<", 1..2, false),
            ("<", 0..1, true),
        ] {
            let marked = Marked {
                range,
                cursor_at_start,
            };
            let formatted = format(text, None, Some(&marked));
            let p = parse(&formatted).unwrap();
            assert_eq!(p.text, text, "{formatted:?}");
            assert_eq!(p.selection, Some(marked), "{formatted:?}");
        }
    }

    #[test]
    fn format_inverts_parse() {
        for input in ["hel|lo", "|", "Hello <|World!||>", "<||ab|>c", "a||b|", "€€|x"] {
            let p = parse(input).unwrap();
            assert_eq!(format(&p.text, p.cursor, p.selection.as_ref()), input);
        }
    }
}
