//! Key notation parsing for vim-like key sequences.
//!
//! Plain characters are typed as-is. Special keys go in angle brackets,
//! optionally prefixed with modifiers:
//!
//! | Notation | Key |
//! |----------|-----|
//! | `<Left>` `<Right>` `<Home>` `<End>` | navigation |
//! | `<BS>` `<Del>` | deletion |
//! | `<Esc>` `<CR>` `<Space>` `<lt>` | escape, enter, space, literal `<` |
//! | `<C-x>` `<S-x>` `<A-x>` `<M-x>` | ctrl, shift, alt, meta (combinable: `<C-S-Left>`) |
//!
//! A `<` with no closing `>` is typed literally.

use crate::input::{InputEvent, Key, Modifiers};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyNotationError {
    #[error("unknown key <{0}>")]
    UnknownKey(String),
}

/// Parse a key sequence into key press events.
///
/// ```ignore
/// let events = parse_sequence("ab<C-Left><BS>")?;
/// assert_eq!(events.len(), 4);
/// ```
pub fn parse_sequence(input: &str) -> Result<Vec<InputEvent>, KeyNotationError> {
    let mut events = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '<' {
            events.push(InputEvent::key(Key::Char(ch)));
            continue;
        }

        let mut key_seq = String::new();
        let mut found_closing = false;
        while let Some(next_ch) = chars.next_if(|c| *c != '<') {
            if next_ch == '>' {
                found_closing = true;
                break;
            }
            key_seq.push(next_ch);
        }

        if !found_closing {
            events.push(InputEvent::key(Key::Char('<')));
            events.extend(key_seq.chars().map(|c| InputEvent::key(Key::Char(c))));
            continue;
        }

        events.push(parse_special_key(&key_seq)?);
    }

    Ok(events)
}

fn parse_special_key(seq: &str) -> Result<InputEvent, KeyNotationError> {
    let mut modifiers = Modifiers::NONE;
    let mut rest = seq;
    loop {
        let Some((prefix, tail)) = rest.split_once('-') else {
            break;
        };
        if tail.is_empty() {
            break;
        }
        match prefix {
            "C" | "c" => modifiers.ctrl = true,
            "S" | "s" => modifiers.shift = true,
            "A" | "a" => modifiers.alt = true,
            "M" | "m" | "D" | "d" => modifiers.meta = true,
            _ => break,
        }
        rest = tail;
    }

    let key = match rest.to_ascii_lowercase().as_str() {
        "left" => Key::ArrowLeft,
        "right" => Key::ArrowRight,
        "home" => Key::Home,
        "end" => Key::End,
        "bs" | "backspace" => Key::Backspace,
        "del" | "delete" => Key::Delete,
        "esc" | "escape" => Key::Escape,
        "cr" | "enter" | "return" => Key::Enter,
        "space" => Key::Char(' '),
        "lt" => Key::Char('<'),
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Key::Char(ch),
                _ => return Err(KeyNotationError::UnknownKey(seq.to_string())),
            }
        },
    };
    Ok(InputEvent::KeyPress(key, modifiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_chars_are_typed() {
        let events = parse_sequence("ab ").unwrap();
        assert_eq!(
            events,
            vec![
                InputEvent::key(Key::Char('a')),
                InputEvent::key(Key::Char('b')),
                InputEvent::key(Key::Char(' ')),
            ]
        );
    }

    #[test]
    fn special_keys_and_modifiers() {
        let events = parse_sequence("<Left><C-BS><C-S-Right><C-a><Esc>").unwrap();
        assert_eq!(
            events,
            vec![
                InputEvent::key(Key::ArrowLeft),
                InputEvent::KeyPress(Key::Backspace, Modifiers::ctrl()),
                InputEvent::KeyPress(
                    Key::ArrowRight,
                    Modifiers {
                        ctrl: true,
                        shift: true,
                        ..Modifiers::NONE
                    }
                ),
                InputEvent::KeyPress(Key::Char('a'), Modifiers::ctrl()),
                InputEvent::key(Key::Escape),
            ]
        );
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        let events = parse_sequence("<ab").unwrap();
        assert_eq!(
            events,
            vec![
                InputEvent::key(Key::Char('<')),
                InputEvent::key(Key::Char('a')),
                InputEvent::key(Key::Char('b')),
            ]
        );
    }

    #[test]
    fn dash_key_is_not_a_modifier() {
        assert_eq!(
            parse_sequence("<C-->").unwrap(),
            vec![InputEvent::KeyPress(Key::Char('-'), Modifiers::ctrl())]
        );
    }

    #[test]
    fn unknown_keys_are_errors() {
        assert_eq!(
            parse_sequence("<Nope>"),
            Err(KeyNotationError::UnknownKey("Nope".to_string()))
        );
    }
}
