//! Char-offset utilities for the logical string.
//!
//! Logical indices count `char`s, while [`String`] and [`regex`] speak in bytes.
//! Everything that crosses that boundary goes through here so the Rule Matcher,
//! the Display Map Builder and the field editor agree on one granularity.

use std::{borrow::Cow, ops::Range};

/// Number of chars in `s`, i.e. the largest valid cursor index.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the char at `index`, or `s.len()` when `index` is at or past the end.
pub fn byte_offset(s: &str, index: usize) -> usize {
    s.char_indices()
        .nth(index)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// Byte range for a char range, clamped to the string.
pub fn byte_range(s: &str, range: Range<usize>) -> Range<usize> {
    let start = byte_offset(s, range.start);
    let end = start + byte_offset(&s[start..], range.end.saturating_sub(range.start));
    start..end
}

/// Slice `s` by char range.
pub fn slice(s: &str, range: Range<usize>) -> &str {
    &s[byte_range(s, range)]
}

/// Replace the chars in `range` with `insert`, returning the char length of `insert`.
pub fn splice(s: &mut String, range: Range<usize>, insert: &str) -> usize {
    let bytes = byte_range(s, range);
    s.replace_range(bytes, insert);
    char_len(insert)
}

/// Maps byte offsets reported by pattern matching back to char offsets.
pub struct CharOffsets {
    /// Byte offset of every char start, plus `len` as a sentinel.
    starts: Vec<usize>,
}

impl CharOffsets {
    pub fn new(s: &str) -> Self {
        let mut starts: Vec<usize> = s.char_indices().map(|(byte, _)| byte).collect();
        starts.push(s.len());
        Self { starts }
    }

    /// Char index of a byte offset. Offsets inside a multi-byte char round down.
    pub fn to_char(&self, byte: usize) -> usize {
        match self.starts.binary_search(&byte) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        }
    }

    pub fn to_char_range(&self, bytes: Range<usize>) -> Range<usize> {
        self.to_char(bytes.start)..self.to_char(bytes.end)
    }
}

/// Filter a string to remove newlines (CR and LF), for single-line fields.
///
/// Returns a `Cow::Borrowed` if the string contains no newlines.
pub fn filter_single_line(s: &str) -> Cow<'_, str> {
    if !s.contains('\n') && !s.contains('\r') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| *c != '\n' && *c != '\r').collect())
}
