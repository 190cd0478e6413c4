//! Non-fatal conditions reported to the host.
//!
//! None of these abort an operation. Each is recovered locally (demotion,
//! ignoring a hit, clamping, skipping a rule) and then queued on the field so
//! the host can surface it however it likes.

use crate::display_map::FragmentId;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// A non-atomic rule rendered text that differs from its match. The match
    /// is shown as one atomic fragment for this generation.
    #[error("rule {rule} rendered {rendered:?} for {matched:?} at {range:?}, shown as atomic")]
    RuleMismatch {
        rule: usize,
        range: Range<usize>,
        matched: String,
        rendered: String,
    },

    /// A hit or position names a fragment that is not in the current display map.
    #[error("fragment {fragment} is not in the current display map, hit ignored")]
    UnresolvedHit { fragment: FragmentId },

    /// An index supplied by the host fell outside `0..=len`.
    #[error("index {index} is outside 0..={len}, clamped")]
    OutOfRangeIndex { index: usize, len: usize },

    /// A rule matched an empty span and was skipped for this text.
    #[error("rule {rule} matches an empty span, skipped")]
    EmptyPatternRule { rule: usize },
}
