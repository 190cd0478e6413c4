use crate::cli::{Cli, Command};
use anyhow::Result;
use quill_config::Config;

pub mod render;
pub mod replay;

/// Cell size of the headless surface used by the commands.
const CELL_WIDTH: f32 = 8.0;
const LINE_HEIGHT: f32 = 16.0;

/// Run the parsed command, returning what it prints.
pub fn run(cli: &Cli) -> Result<String> {
    let config = Config::load_with_override(cli.config.as_deref())?;
    match &cli.command {
        Command::Render { text } => render::run(&config, text),
        Command::Replay { text, keys } => replay::run(&config, text, keys),
    }
}
