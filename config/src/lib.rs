//! Field configuration loaded from TOML.
//!
//! A config file sets field options and declares decoration rules in order:
//!
//! ```toml
//! single_line = true
//!
//! [[rules]]
//! check = "\\?\\?"
//! regex = true
//! replace = "⁇"
//! ```
//!
//! [`Config::load_with_override`] reads the file given on the command line, or
//! falls back to the `config.toml` embedded in this crate.

use anyhow::{Context, Result};
use quill::{FieldOptions, Rule, RuleSet};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Strip CR and LF from inserted text.
    pub single_line: bool,
    /// Decoration rules, earlier rules winning ties.
    pub rules: Vec<RuleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            single_line: true,
            rules: Vec::new(),
        }
    }
}

/// One `[[rules]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Literal text, or a regular expression if `regex` is set.
    pub check: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(default = "default_atomic")]
    pub atomic: bool,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Style class handed to the host.
    #[serde(default)]
    pub style: Option<String>,
    /// Text drawn instead of the match. Regex rules expand `$0`, `$1`, ...
    #[serde(default)]
    pub replace: Option<String>,
    /// Tie-break order, defaulting to the position in the file.
    #[serde(default)]
    pub order: Option<usize>,
}

fn default_atomic() -> bool {
    true
}

impl RuleConfig {
    pub fn to_rule(&self) -> quill::Result<Rule> {
        let mut rule = match (self.regex, self.case_insensitive) {
            (true, false) => Rule::regex(&self.check)?,
            (true, true) => Rule::regex(&format!("(?i){}", self.check))?,
            (false, false) => Rule::literal(self.check.as_str()),
            (false, true) => Rule::literal_ignore_case(&self.check)?,
        };
        rule = rule.atomic(self.atomic);
        if let Some(style) = &self.style {
            rule = rule.style(style.as_str());
        }
        if let Some(replace) = &self.replace {
            rule = rule.template(replace.as_str());
        }
        if let Some(order) = self.order {
            rule = rule.with_order(order);
        }
        Ok(rule)
    }
}

impl Config {
    /// Read and deserialize a TOML config file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), rules = config.rules.len(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load the CLI override if given, otherwise the embedded defaults.
    pub fn load_with_override(cli_override: Option<&Path>) -> Result<Self> {
        match cli_override {
            Some(path) => Self::load(path),
            None => Self::load_embedded(),
        }
    }

    fn load_embedded() -> Result<Self> {
        let source = include_str!("../config.toml");
        Self::from_toml_str(source).context("Failed to parse embedded config.toml")
    }

    /// Build the rule set, failing on the first invalid pattern.
    pub fn rule_set(&self) -> Result<RuleSet> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                rule.to_rule()
                    .with_context(|| format!("Invalid rule {index} ({:?})", rule.check))
            })
            .collect()
    }

    pub fn field_options(&self) -> FieldOptions {
        FieldOptions {
            single_line: self.single_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill::{match_rules, Field, Span};
    use tempfile::tempdir;

    #[test]
    fn loads_empty_config() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_rules_in_order() {
        let config = Config::from_toml_str(
            r#"
            single_line = false

            [[rules]]
            check = "!"
            atomic = false
            style = "bang"

            [[rules]]
            check = "\\?\\?"
            regex = true
            replace = "⁇"
            "#,
        )
        .unwrap();

        assert!(!config.single_line);
        assert_eq!(config.rules.len(), 2);
        assert!(!config.rules[0].atomic);
        assert_eq!(config.rules[0].style.as_deref(), Some("bang"));
        assert!(config.rules[1].regex);
        assert!(config.rules[1].atomic);
        assert!(!config.field_options().single_line);
    }

    #[test]
    fn rule_set_decorates_text() {
        let config = Config::from_toml_str(
            r#"
            [[rules]]
            check = "\\?\\?"
            regex = true
            replace = "⁇"
            "#,
        )
        .unwrap();
        let field = Field::new("a??b", config.rule_set().unwrap());

        let fragment = &field.display_map().fragments()[1];
        assert!(fragment.is_atomic());
        assert_eq!(fragment.text, "⁇");
        assert_eq!(fragment.logical_range(), 1..3);
    }

    #[test]
    fn regex_replacements_expand_groups() {
        let config = Config::from_toml_str(
            r##"
            [[rules]]
            check = "#(\\d+)"
            regex = true
            replace = "issue $1"
            "##,
        )
        .unwrap();
        let field = Field::new("see #42", config.rule_set().unwrap());
        let last = field.display_map().fragments().last().unwrap();
        assert_eq!(last.text, "issue 42");
    }

    #[test]
    fn case_insensitive_literals() {
        let config = Config::from_toml_str(
            r#"
            [[rules]]
            check = "todo"
            case_insensitive = true
            "#,
        )
        .unwrap();
        let rules = config.rule_set().unwrap();
        let matched = match_rules("TODO and Todo", &rules)
            .spans
            .iter()
            .filter(|span| matches!(span, Span::Match(_)))
            .count();
        assert_eq!(matched, 2);
    }

    #[test]
    fn pinned_order_is_kept() {
        let config = Config::from_toml_str(
            r#"
            [[rules]]
            check = "ab"
            order = 5

            [[rules]]
            check = "a"
            order = 1
            "#,
        )
        .unwrap();
        let rules = config.rule_set().unwrap();
        assert_eq!(rules.order_of(0), 5);
        assert_eq!(rules.order_of(1), 1);
    }

    #[test]
    fn errors_on_invalid_regex() {
        let config = Config::from_toml_str(
            r#"
            [[rules]]
            check = "("
            regex = true
            "#,
        )
        .unwrap();
        let err = config.rule_set().unwrap_err();
        assert!(err.to_string().contains("Invalid rule 0"));
    }

    #[test]
    fn errors_on_unknown_fields() {
        let result = Config::from_toml_str("font_size = 12");
        assert!(result.is_err());

        let result = Config::from_toml_str("[[rules]]\ncheck = \"a\"\nreturn = \"b\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn errors_on_invalid_toml() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("config.toml");
        std::fs::write(&config_path, "invalid toml {{{{").unwrap();

        let result = Config::load(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse"));
    }

    #[test]
    fn errors_on_nonexistent_file() {
        let tmp_dir = tempdir().unwrap();
        let config_path = tmp_dir.path().join("nonexistent.toml");

        let result = Config::load(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }

    #[test]
    fn cli_override_takes_priority() {
        let tmp_dir = tempdir().unwrap();
        let cli_path = tmp_dir.path().join("cli.toml");
        std::fs::write(&cli_path, "single_line = false").unwrap();

        let config = Config::load_with_override(Some(&cli_path)).unwrap();
        assert!(!config.single_line);
    }

    #[test]
    fn embedded_config_is_valid() {
        let config = Config::load_with_override(None).unwrap();
        assert!(config.single_line);
        let rules = config.rule_set().unwrap();
        assert_eq!(rules.len(), config.rules.len());

        let mut field = Field::new("a -> @bob", rules);
        assert!(field.take_diagnostics().is_empty());
        assert_eq!(field.display_map().fragments()[2].text, "→");
    }
}
