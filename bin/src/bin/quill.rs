use clap::Parser;
use quill_bin::{cli::Cli, commands};
use quill_log::LogConfig;

fn main() {
    let cli = Cli::parse();

    let _log_guard = match quill_log::init(LogConfig {
        log_file_path: cli.log_file.clone(),
    }) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {e}");
            None
        },
    };

    match commands::run(&cli) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        },
    }
}
