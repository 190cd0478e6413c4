//! Decoration rules.
//!
//! A [`Rule`] pairs a [`Pattern`] with a renderer that turns matched text into a
//! [`Decoration`]. Rules live in an ordered [`RuleSet`]; a rule's `order` breaks
//! ties when two rules match at the same start.

use crate::error::{Error, Result};
use compact_str::CompactString;
use regex::{Captures, Regex, RegexBuilder};
use std::{fmt, ops::Range, sync::Arc};

/// What a rule draws in place of the text it matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decoration {
    /// Text drawn by the surface.
    pub text: CompactString,
    /// Opaque style class, interpreted by the host.
    pub style: Option<CompactString>,
}

impl Decoration {
    pub fn new(text: impl Into<CompactString>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<CompactString>, style: impl Into<CompactString>) -> Self {
        Self {
            text: text.into(),
            style: Some(style.into()),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Pattern {
    /// Matched verbatim.
    Literal(CompactString),
    /// Matched as provided.
    Regex(Regex),
}

impl Pattern {
    /// Whether some text lets this pattern match a zero-length span. Decided
    /// from the pattern alone, so a rule is either always or never usable.
    pub fn can_match_empty(&self) -> bool {
        match self {
            Pattern::Literal(literal) => literal.is_empty(),
            Pattern::Regex(regex) => regex_syntax::parse(regex.as_str())
                .map_or(true, |hir| hir.properties().minimum_len() == Some(0)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Literal(literal) => literal,
            Pattern::Regex(regex) => regex.as_str(),
        }
    }
}

/// One occurrence of a rule in a text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Found {
    /// Byte range of the match.
    pub range: Range<usize>,
    pub decoration: Decoration,
}

type RenderFn = Arc<dyn Fn(&str) -> Decoration + Send + Sync>;

#[derive(Clone)]
enum Render {
    /// Draw the matched text itself.
    Identity,
    /// Draw fixed text.
    Constant(CompactString),
    /// Expand a regex replacement template (`$0`, `$1`, `$name`) against the match.
    Template(CompactString),
    Custom(RenderFn),
}

/// A pattern, a renderer and an atomicity flag describing one decoration.
#[derive(Clone)]
pub struct Rule {
    pattern: Pattern,
    render: Render,
    style: Option<CompactString>,
    atomic: bool,
    order: Option<usize>,
    matches_empty: bool,
}

impl Rule {
    /// Rule matching `text` verbatim. Atomic, drawing the matched text.
    pub fn literal(text: impl Into<CompactString>) -> Self {
        Self::new(Pattern::Literal(text.into()))
    }

    /// Rule matching `text` ignoring case.
    pub fn literal_ignore_case(text: &str) -> Result<Self> {
        let regex = RegexBuilder::new(&regex::escape(text))
            .case_insensitive(true)
            .build()
            .map_err(|source| Error::InvalidPattern {
                pattern: text.to_string(),
                source,
            })?;
        Ok(Self::new(Pattern::Regex(regex)))
    }

    /// Rule matching a regular expression.
    pub fn regex(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::new(Pattern::Regex(regex)))
    }

    pub fn new(pattern: Pattern) -> Self {
        Self {
            matches_empty: pattern.can_match_empty(),
            pattern,
            render: Render::Identity,
            style: None,
            atomic: true,
            order: None,
        }
    }

    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Style class applied to decorations that do not set their own.
    pub fn style(mut self, style: impl Into<CompactString>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Draw `text` in place of every match.
    pub fn replace(mut self, text: impl Into<CompactString>) -> Self {
        self.render = Render::Constant(text.into());
        self
    }

    /// Draw the expansion of a regex replacement template. For literal patterns
    /// the template is drawn as-is.
    pub fn template(mut self, template: impl Into<CompactString>) -> Self {
        self.render = Render::Template(template.into());
        self
    }

    pub fn render_with(mut self, render: impl Fn(&str) -> Decoration + Send + Sync + 'static) -> Self {
        self.render = Render::Custom(Arc::new(render));
        self
    }

    /// Pin the tie-break order instead of taking the declaration index.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    /// True if the pattern can match an empty span. Such a rule never decorates.
    pub fn matches_empty(&self) -> bool {
        self.matches_empty
    }

    /// Non-overlapping matches in `text`, left to right, each with its decoration.
    /// Empty if the rule can match an empty span.
    pub fn find_all(&self, text: &str) -> Vec<Found> {
        if self.matches_empty {
            return Vec::new();
        }
        match &self.pattern {
            Pattern::Literal(literal) => text
                .match_indices(literal.as_str())
                .map(|(start, matched)| Found {
                    range: start..start + matched.len(),
                    decoration: self.decorate(matched, None),
                })
                .collect(),
            Pattern::Regex(regex) => regex
                .captures_iter(text)
                .filter_map(|captures| {
                    let whole = captures.get(0)?;
                    Some(Found {
                        range: whole.range(),
                        decoration: self.decorate(whole.as_str(), Some(&captures)),
                    })
                })
                .collect(),
        }
    }

    fn decorate(&self, matched: &str, captures: Option<&Captures<'_>>) -> Decoration {
        let mut decoration = match &self.render {
            Render::Identity => Decoration::new(matched),
            Render::Constant(text) => Decoration::new(text.clone()),
            Render::Template(template) => match captures {
                Some(captures) => {
                    let mut expanded = String::new();
                    captures.expand(template.as_str(), &mut expanded);
                    Decoration::new(expanded)
                },
                None => Decoration::new(template.clone()),
            },
            Render::Custom(render) => render(matched),
        };
        if decoration.style.is_none() {
            decoration.style = self.style.clone();
        }
        decoration
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = match &self.render {
            Render::Identity => "identity",
            Render::Constant(_) => "constant",
            Render::Template(_) => "template",
            Render::Custom(_) => "custom",
        };
        f.debug_struct("Rule")
            .field("pattern", &self.pattern.as_str())
            .field("render", &render)
            .field("style", &self.style)
            .field("atomic", &self.atomic)
            .field("order", &self.order)
            .finish()
    }
}

/// Ordered list of rules.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn with(mut self, rule: Rule) -> Self {
        self.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Tie-break order of the rule at `index`: its pinned order, or its position.
    pub fn order_of(&self, index: usize) -> usize {
        self.rules
            .get(index)
            .and_then(|rule| rule.order)
            .unwrap_or(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(rule: &Rule, text: &str) -> Vec<Range<usize>> {
        rule.find_all(text).into_iter().map(|found| found.range).collect()
    }

    fn drawn(rule: &Rule, text: &str) -> Vec<String> {
        rule.find_all(text)
            .into_iter()
            .map(|found| found.decoration.text.to_string())
            .collect()
    }

    #[test]
    fn literal_matches_verbatim() {
        let rule = Rule::literal("ab");
        assert_eq!(ranges(&rule, "abAbab"), vec![0..2, 4..6]);
    }

    #[test]
    fn literal_ignore_case_matches_any_case() {
        let rule = Rule::literal_ignore_case("a.b").unwrap();
        assert_eq!(ranges(&rule, "A.B axb a.b"), vec![0..3, 8..11]);
    }

    #[test]
    fn empty_patterns_are_detected_up_front() {
        assert!(Rule::literal("").matches_empty());
        assert!(Rule::regex("x*").unwrap().matches_empty());
        assert!(Rule::regex(r"\b").unwrap().matches_empty());
        assert!(Rule::regex("a|").unwrap().matches_empty());
        assert!(!Rule::regex("a+").unwrap().matches_empty());
        assert!(!Rule::literal("a").matches_empty());
    }

    #[test]
    fn empty_pattern_rule_never_matches() {
        let rule = Rule::regex("a*").unwrap();
        assert!(rule.find_all("aaa").is_empty());
        assert!(rule.find_all("aab").is_empty());
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let err = Rule::regex("(").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn decorations_carry_rule_style() {
        let rule = Rule::literal("!").style("bang");
        let found = rule.find_all("a!");
        assert_eq!(found[0].decoration, Decoration::styled("!", "bang"));

        let rule = Rule::literal("!").replace("‼").style("bang");
        let found = rule.find_all("a!");
        assert_eq!(found[0].decoration, Decoration::styled("‼", "bang"));
    }

    #[test]
    fn template_expands_captures() {
        let rule = Rule::regex(r"@(\w+)").unwrap().template("<$1>");
        assert_eq!(drawn(&rule, "hi @lee and @kim"), vec!["<lee>", "<kim>"]);
    }

    #[test]
    fn template_uses_match_context() {
        // `\B` depends on the preceding `a`.
        let rule = Rule::regex(r"\Bb").unwrap().template("[$0]");
        assert_eq!(ranges(&rule, "ab"), vec![1..2]);
        assert_eq!(drawn(&rule, "ab"), vec!["[b]"]);
    }

    #[test]
    fn literal_template_is_drawn_as_is() {
        let rule = Rule::literal("->").template("$0");
        assert_eq!(drawn(&rule, "->"), vec!["$0"]);
    }

    #[test]
    fn custom_style_wins_over_rule_style() {
        let rule = Rule::literal("x")
            .style("rule")
            .render_with(|m| Decoration::styled(m.to_uppercase(), "custom"));
        assert_eq!(rule.find_all("x")[0].decoration, Decoration::styled("X", "custom"));
    }

    #[test]
    fn order_defaults_to_position() {
        let rules = RuleSet::new()
            .with(Rule::literal("a"))
            .with(Rule::literal("b").with_order(0))
            .with(Rule::literal("c"));
        assert_eq!(rules.order_of(0), 0);
        assert_eq!(rules.order_of(1), 0);
        assert_eq!(rules.order_of(2), 2);
    }
}
