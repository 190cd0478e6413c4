use clap::Parser;
use std::path::PathBuf;

/// Command-line interface configuration
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log file, or directory for the default log file name
    #[arg(long, global = true, env = "QUILL_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Field config (defaults to the built-in rules)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Print the display map built for TEXT
    Render {
        /// Logical text to decorate
        text: String,
    },
    /// Focus a field, replay KEYS and print the result in cursor notation
    Replay {
        /// Initial field text
        #[arg(short, long, default_value = "")]
        text: String,
        /// Keys such as `abc<C-Left><S-Right><BS>`
        keys: String,
    },
}
