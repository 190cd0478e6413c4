//! Display map: the addressable fragments handed to the rendering surface.
//!
//! Spans from the matcher expand into an ordered list of [`Fragment`]s that tile
//! the logical string with no gaps and no overlaps:
//!
//! ```text
//! text:      h e l l o _ w o r l d      rule: /hello/ atomic
//! spans:     [  Match  ][  Literal  ]
//! fragments: [ atomic  ][w][o][r][l][d]  (one id for "hello", one shared id
//!              0..5     5 6 7 8 9 10      for the six literal entries)
//! ```
//!
//! Literal text and non-atomic matches are split one entry per char, all entries
//! of a span sharing one [`FragmentId`]. Atomic matches are one entry covering the
//! whole match. A non-atomic rule whose rendered text differs from its match
//! cannot be addressed per char and is demoted to atomic, with a
//! [`Diagnostic::RuleMismatch`].
//!
//! Identifiers carry the generation of the map that produced them, so anything
//! captured before a rebuild is recognisably stale.

use crate::{
    diagnostic::Diagnostic,
    matcher::Span,
    position::{Position, Side},
    rule::RuleSet,
};
use compact_str::CompactString;
use std::{fmt, ops::Range};

/// Identifies one span's fragments within one display map generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId {
    pub generation: u64,
    pub span: u32,
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.generation, self.span)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentKind {
    /// Indivisible unit covering `length` logical chars. A caret attaches only to its edges.
    Atomic { length: usize },
    /// One char of a char-addressable span, at logical index `atomic_index`.
    NonAtomic { atomic_index: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub id: FragmentId,
    /// Logical start of the owning span.
    pub index: usize,
    pub kind: FragmentKind,
    /// Text the surface draws for this entry.
    pub text: CompactString,
    pub style: Option<CompactString>,
    /// Rule that decorated this entry, `None` for literal text.
    pub rule: Option<usize>,
}

impl Fragment {
    /// Logical chars covered by this entry.
    pub fn logical_range(&self) -> Range<usize> {
        match self.kind {
            FragmentKind::Atomic { length } => self.index..self.index + length,
            FragmentKind::NonAtomic { atomic_index } => atomic_index..atomic_index + 1,
        }
    }

    /// Offset of this entry within its span: `atomic_index - index`, 0 for atomic entries.
    pub fn sub_offset(&self) -> usize {
        match self.kind {
            FragmentKind::Atomic { .. } => 0,
            FragmentKind::NonAtomic { atomic_index } => atomic_index - self.index,
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, FragmentKind::Atomic { .. })
    }
}

/// Ordered fragments for one generation of the logical string and rule set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayMap {
    generation: u64,
    len: usize,
    fragments: Vec<Fragment>,
    /// Entry range of every span, indexed by [`FragmentId::span`].
    spans: Vec<Range<usize>>,
}

impl DisplayMap {
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            len: 0,
            fragments: Vec::new(),
            spans: Vec::new(),
        }
    }

    /// Expand matched spans of `text` into fragments.
    pub fn build(
        text: &str,
        spans: &[Span],
        rules: &RuleSet,
        generation: u64,
    ) -> (Self, Vec<Diagnostic>) {
        let chars: Vec<char> = text.chars().collect();
        let mut map = Self::empty(generation);
        let mut diagnostics = Vec::new();

        for (span_index, span) in spans.iter().enumerate() {
            let id = FragmentId {
                generation,
                span: span_index as u32,
            };
            let first = map.fragments.len();

            match span {
                Span::Literal(range) => {
                    map.push_chars(id, range.clone(), &chars, None, None);
                },
                Span::Match(m) => {
                    let Some(rule) = rules.get(m.rule) else {
                        map.push_chars(id, m.range.clone(), &chars, None, None);
                        map.spans.push(first..map.fragments.len());
                        continue;
                    };
                    let decoration = m.decoration.clone();
                    let demoted = !rule.is_atomic() && decoration.text != m.text;
                    if demoted {
                        diagnostics.push(Diagnostic::RuleMismatch {
                            rule: m.rule,
                            range: m.range.clone(),
                            matched: m.text.clone(),
                            rendered: decoration.text.to_string(),
                        });
                    }

                    if rule.is_atomic() || demoted {
                        map.fragments.push(Fragment {
                            id,
                            index: m.range.start,
                            kind: FragmentKind::Atomic {
                                length: m.range.len(),
                            },
                            text: decoration.text,
                            style: decoration.style,
                            rule: Some(m.rule),
                        });
                    } else {
                        map.push_chars(id, m.range.clone(), &chars, decoration.style, Some(m.rule));
                    }
                },
            }
            map.spans.push(first..map.fragments.len());
        }

        map.len = chars.len();
        tracing::trace!(
            generation,
            fragments = map.fragments.len(),
            spans = map.spans.len(),
            "built display map"
        );
        (map, diagnostics)
    }

    fn push_chars(
        &mut self,
        id: FragmentId,
        range: Range<usize>,
        chars: &[char],
        style: Option<CompactString>,
        rule: Option<usize>,
    ) {
        let index = range.start;
        for atomic_index in range {
            let ch = chars.get(atomic_index).copied().unwrap_or_default();
            let mut buf = [0; 4];
            self.fragments.push(Fragment {
                id,
                index,
                kind: FragmentKind::NonAtomic { atomic_index },
                text: CompactString::from(&*ch.encode_utf8(&mut buf)),
                style: style.clone(),
                rule,
            });
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Logical length of the string this map was built from.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// All entries sharing `id`, or `None` if `id` is not from this generation.
    pub fn entries(&self, id: FragmentId) -> Option<&[Fragment]> {
        if id.generation != self.generation {
            return None;
        }
        let range = self.spans.get(id.span as usize)?;
        self.fragments.get(range.clone())
    }

    pub fn contains(&self, id: FragmentId) -> bool {
        self.entries(id).is_some()
    }

    /// Entry covering the logical char at `index`.
    pub fn fragment_at(&self, index: usize) -> Option<&Fragment> {
        let i = self
            .fragments
            .partition_point(|f| f.logical_range().end <= index);
        self.fragments
            .get(i)
            .filter(|f| f.logical_range().contains(&index))
    }

    /// Nearest edge of the atomic entry with `index` strictly inside it, as the
    /// edge's logical index and side. Ties go to the left edge.
    pub fn snap(&self, index: usize) -> Option<(usize, Side)> {
        let range = self.fragment_at(index)?.logical_range();
        if range.start >= index {
            return None;
        }
        // Only atomic entries span more than one char.
        Some(if index - range.start <= range.end - index {
            (range.start, Side::Left)
        } else {
            (range.end, Side::Right)
        })
    }

    /// Place a caret at logical `index`.
    ///
    /// A boundary between two entries belongs to both; `side` picks the entry
    /// after it (`Left`) or before it (`Right`), falling back to whichever exists.
    /// An index inside an atomic entry snaps to the edge [`snap`](Self::snap) picks.
    /// Returns `None` for an empty map.
    pub fn position_at(&self, index: usize, side: Side) -> Option<Position> {
        let index = index.min(self.len);

        if let (Some(fragment), Some((_, edge))) = (self.fragment_at(index), self.snap(index)) {
            return Some(Position::on(fragment, edge));
        }

        let after = self.fragment_at(index);
        let before = index.checked_sub(1).and_then(|i| self.fragment_at(i));
        match (side, before, after) {
            (Side::Left, _, Some(after)) => Some(Position::on(after, Side::Left)),
            (Side::Left, Some(before), None) => Some(Position::on(before, Side::Right)),
            (Side::Right, Some(before), _) => Some(Position::on(before, Side::Right)),
            (Side::Right, None, Some(after)) => Some(Position::on(after, Side::Left)),
            (_, None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{matcher::match_rules, rule::Rule};

    fn build(text: &str, rules: &RuleSet) -> (DisplayMap, Vec<Diagnostic>) {
        let matches = match_rules(text, rules);
        DisplayMap::build(text, &matches.spans, rules, 1)
    }

    fn assert_tiles(map: &DisplayMap) {
        let mut expected = 0;
        for fragment in map.fragments() {
            let range = fragment.logical_range();
            assert_eq!(range.start, expected, "gap or overlap at {fragment:?}");
            expected = range.end;
        }
        assert_eq!(expected, map.len());
    }

    #[test]
    fn template_sees_surrounding_text() {
        let rules = RuleSet::new().with(Rule::regex(r"\Bb").unwrap().template("[$0]"));
        let (map, diagnostics) = build("ab", &rules);
        assert!(diagnostics.is_empty());
        let drawn: Vec<_> = map.fragments().iter().map(|f| f.text.as_str()).collect();
        assert_eq!(drawn, vec!["a", "[b]"]);
    }

    #[test]
    fn snap_picks_nearer_atomic_edge() {
        let rules = RuleSet::new().with(Rule::literal("hello"));
        let (map, _) = build("hello world", &rules);
        assert_eq!(map.snap(0), None);
        assert_eq!(map.snap(2), Some((0, Side::Left)));
        assert_eq!(map.snap(3), Some((5, Side::Right)));
        assert_eq!(map.snap(5), None);
        assert_eq!(map.snap(7), None);
    }

    #[test]
    fn literal_text_is_char_addressable() {
        let (map, diagnostics) = build("abc", &RuleSet::new());
        assert!(diagnostics.is_empty());
        assert_eq!(map.fragments().len(), 3);
        assert!(map.fragments().iter().all(|f| !f.is_atomic()));
        assert!(map.fragments().iter().all(|f| f.id == map.fragments()[0].id));
        assert_eq!(map.fragments()[2].sub_offset(), 2);
        assert_tiles(&map);
    }

    #[test]
    fn atomic_match_is_one_fragment() {
        let rules = RuleSet::new().with(Rule::regex("hello").unwrap());
        let (map, _) = build("hello world", &rules);

        let first = &map.fragments()[0];
        assert_eq!(first.kind, FragmentKind::Atomic { length: 5 });
        assert_eq!(first.logical_range(), 0..5);
        assert_eq!(map.fragments().len(), 7);
        assert_eq!(map.fragments()[1].logical_range(), 5..6);
        assert_tiles(&map);
    }

    #[test]
    fn non_atomic_match_shares_one_id() {
        let rules = RuleSet::new().with(Rule::literal("!").atomic(false).style("bang"));
        let (map, _) = build("a!b", &rules);

        assert_eq!(map.fragments().len(), 3);
        let bang = &map.fragments()[1];
        assert_eq!(bang.kind, FragmentKind::NonAtomic { atomic_index: 1 });
        assert_eq!(bang.style.as_deref(), Some("bang"));
        assert_eq!(bang.rule, Some(0));
        assert_ne!(bang.id, map.fragments()[0].id);
        assert_tiles(&map);
    }

    #[test]
    fn mismatched_render_is_demoted() {
        let rules = RuleSet::new().with(Rule::literal("->").atomic(false).replace("→"));
        let (map, diagnostics) = build("a->b", &rules);

        assert_eq!(map.fragments()[1].kind, FragmentKind::Atomic { length: 2 });
        assert_eq!(map.fragments()[1].text, "→");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::RuleMismatch {
                rule: 0,
                range: 1..3,
                matched: "->".to_string(),
                rendered: "→".to_string(),
            }]
        );
        assert_tiles(&map);
    }

    #[test]
    fn stale_ids_are_not_found() {
        let (map, _) = build("ab", &RuleSet::new());
        let id = map.fragments()[0].id;
        assert!(map.contains(id));
        assert!(!map.contains(FragmentId {
            generation: id.generation + 1,
            span: id.span,
        }));
        assert!(!map.contains(FragmentId {
            generation: id.generation,
            span: 9,
        }));
    }

    #[test]
    fn position_at_honours_side_on_boundaries() {
        let rules = RuleSet::new().with(Rule::literal("b"));
        let (map, _) = build("abc", &rules);
        let a = map.fragments()[0].id;
        let b = map.fragments()[1].id;

        assert_eq!(map.position_at(1, Side::Left), Some(Position::new(b, 0, Side::Left)));
        assert_eq!(map.position_at(1, Side::Right), Some(Position::new(a, 0, Side::Right)));
        assert_eq!(map.position_at(0, Side::Right), Some(Position::new(a, 0, Side::Left)));
        assert_eq!(map.position_at(3, Side::Left).map(|p| p.side), Some(Side::Right));
    }

    #[test]
    fn position_at_snaps_out_of_atomic() {
        let rules = RuleSet::new().with(Rule::regex("hello").unwrap());
        let (map, _) = build("hello world", &rules);
        let hello = map.fragments()[0].id;

        assert_eq!(map.position_at(2, Side::Right), Some(Position::new(hello, 0, Side::Left)));
        assert_eq!(map.position_at(3, Side::Left), Some(Position::new(hello, 0, Side::Right)));
    }

    #[test]
    fn empty_map_has_no_positions() {
        let (map, _) = build("", &RuleSet::new());
        assert!(map.is_empty());
        assert_eq!(map.position_at(0, Side::Left), None);
    }
}
