use super::{CELL_WIDTH, LINE_HEIGHT};
use anyhow::{Context, Result};
use quill::{key_notation::parse_sequence, Field, MonospaceSurface};
use quill_config::Config;

/// Focus a field holding `text`, replay `keys` and return the final state in
/// cursor notation.
pub fn run(config: &Config, text: &str, keys: &str) -> Result<String> {
    let events =
        parse_sequence(keys).with_context(|| format!("Invalid key sequence: {keys}"))?;
    let mut field = Field::with_options(text, config.rule_set()?, config.field_options());
    field.focus();

    for event in &events {
        let surface = MonospaceSurface::layout(field.display_map(), CELL_WIDTH, LINE_HEIGHT);
        tracing::trace!(?event, "replay");
        field.handle(event, &surface);
    }

    let diagnostics = field.take_diagnostics();
    tracing::debug!(
        events = events.len(),
        diagnostics = diagnostics.len(),
        "replay finished"
    );
    Ok(format!("{}\n", field.to_notation()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(text: &str, keys: &str) -> String {
        run(&Config::default(), text, keys).unwrap()
    }

    #[test]
    fn types_at_the_end() {
        assert_eq!(replay("", "hello"), "hello|\n");
        assert_eq!(replay("ab", "c"), "abc|\n");
    }

    #[test]
    fn edits_by_word() {
        assert_eq!(replay("one two", "<C-BS>"), "one |\n");
        assert_eq!(replay("one two", "<C-Left><C-Left>x"), "x|one two\n");
    }

    #[test]
    fn selects_with_shift() {
        assert_eq!(replay("abcd", "<Home><S-Right><S-Right>"), "<|ab||>cd\n");
        assert_eq!(replay("abcd", "<S-Left><S-Left>"), "ab<||cd|>\n");
        assert_eq!(replay("abcd", "<C-a><BS>"), "|\n");
    }

    #[test]
    fn steps_over_atomic_decorations() {
        let config = Config::from_toml_str(
            r#"
            [[rules]]
            check = "->"
            replace = "→"
            "#,
        )
        .unwrap();
        assert_eq!(run(&config, "a->b", "<Left><Left>").unwrap(), "a|->b\n");
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = run(&Config::default(), "", "<Nope>").unwrap_err();
        assert!(err.to_string().contains("Invalid key sequence"));
    }
}
