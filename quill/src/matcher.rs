//! Rule matching.
//!
//! Every rule is scanned across the whole text, the candidates are merged and
//! sorted by `(start, order)`, and a single left-to-right sweep keeps a match
//! only if it starts at or after the end of the last kept one. Overlapping
//! losers are dropped whole, never truncated. The gaps become literal spans so
//! the output tiles `0..len` exactly once.

use crate::{
    diagnostic::Diagnostic,
    rule::{Decoration, RuleSet},
    text::{char_len, CharOffsets},
};
use std::ops::Range;

/// A kept rule match, in char offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub range: Range<usize>,
    pub text: String,
    /// Index of the rule in its [`RuleSet`].
    pub rule: usize,
    pub order: usize,
    /// What the rule draws for this match.
    pub decoration: Decoration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Span {
    /// Undecorated text.
    Literal(Range<usize>),
    Match(Match),
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        match self {
            Span::Literal(range) => range.clone(),
            Span::Match(m) => m.range.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Matches {
    pub spans: Vec<Span>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Apply `rules` to `text`, producing literal and matched spans covering the text once.
pub fn match_rules(text: &str, rules: &RuleSet) -> Matches {
    let mut out = Matches::default();
    if text.is_empty() {
        return out;
    }

    let offsets = CharOffsets::new(text);
    let mut candidates = Vec::new();
    for (rule_index, rule) in rules.iter().enumerate() {
        if rule.matches_empty() {
            out.diagnostics
                .push(Diagnostic::EmptyPatternRule { rule: rule_index });
            continue;
        }
        let order = rules.order_of(rule_index);
        candidates.extend(rule.find_all(text).into_iter().map(|found| Match {
            text: text[found.range.clone()].to_string(),
            range: offsets.to_char_range(found.range),
            rule: rule_index,
            order,
            decoration: found.decoration,
        }));
    }

    candidates.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(a.order.cmp(&b.order))
            .then(a.rule.cmp(&b.rule))
    });

    let mut last_end = 0;
    let mut kept = Vec::new();
    for candidate in candidates {
        if candidate.range.start >= last_end {
            last_end = candidate.range.end;
            kept.push(candidate);
        }
    }

    let mut covered = 0;
    for m in kept {
        if m.range.start > covered {
            out.spans.push(Span::Literal(covered..m.range.start));
        }
        covered = m.range.end;
        out.spans.push(Span::Match(m));
    }
    let len = char_len(text);
    if covered < len {
        out.spans.push(Span::Literal(covered..len));
    }

    tracing::trace!(
        spans = out.spans.len(),
        skipped = out.diagnostics.len(),
        "matched rules"
    );
    out
}
