use anyhow::Result;
use quill::{Field, FragmentKind};
use quill_config::Config;
use std::fmt::Write;

/// One line per fragment: id, logical range, kind, style and drawn text.
/// Diagnostics follow as `warning:` lines.
pub fn run(config: &Config, text: &str) -> Result<String> {
    let mut field = Field::with_options(text, config.rule_set()?, config.field_options());
    let mut out = String::new();

    for fragment in field.display_map().fragments() {
        let range = fragment.logical_range();
        let kind = match fragment.kind {
            FragmentKind::Atomic { .. } => "atomic",
            FragmentKind::NonAtomic { .. } => "char",
        };
        writeln!(
            out,
            "{}\t{}..{}\t{}\t{}\t{:?}",
            fragment.id,
            range.start,
            range.end,
            kind,
            fragment.style.as_deref().unwrap_or("-"),
            fragment.text.as_str(),
        )?;
    }
    for diagnostic in field.take_diagnostics() {
        writeln!(out, "warning: {diagnostic}")?;
    }
    Ok(out)
}
