//! Logging setup for quill with file output and optional stdout.
//!
//! Logs always go to a file at `warn` level (or finer if an env filter is set).
//! Stdout logging is enabled when `QUILL_LOG` or `RUST_LOG` is set, or in debug builds.
//!
//! ## Environment Variables
//!
//! 1. **`QUILL_LOG`** (highest priority) - quill-specific logging control
//! 2. **`RUST_LOG`** - Standard tracing environment variable
//! 3. **Default** - `warn` globally, `info` for quill crates
//!
//! ## Log File Location
//!
//! Default: `<data_local_dir>/quill/logs/quill-<pid>.log`
//! - macOS: `~/Library/Application Support/quill/logs/quill-12345.log`
//! - Linux: `~/.local/share/quill/logs/quill-12345.log`
//!
//! Override with `--log-file <path>`. A path with an extension names the file;
//! anything else is treated as a directory.

use std::{
    env,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Crates that `QUILL_LOG=<level>` applies to.
const CRATES: &[&str] = &["quill", "quill_config", "quill_bin"];

/// Returned from [`init`]; must be held alive to ensure log file flushing.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

#[derive(Debug, Default)]
pub struct LogConfig {
    pub log_file_path: Option<PathBuf>,
}

/// Initialize logging.
///
/// Filters follow the priority in the module docs: `QUILL_LOG` > `RUST_LOG` > defaults.
///
/// The returned [`LogGuard`] must be held for the lifetime of the program.
/// Dropping it flushes and stops the background file writer.
pub fn init(config: LogConfig) -> Result<LogGuard, BoxError> {
    let (log_dir, filename) = resolve_log_path(config.log_file_path);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(create_file_filter());

    let stdout_layer = stdout_enabled().then(|| fmt::layer().with_filter(create_filter()));

    Registry::default()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: log_dir.join(filename),
    })
}

/// Initialize logging for tests.
///
/// Stdout-only, captured by the test harness. Safe to call from every test.
pub fn test() {
    let _ = fmt()
        .with_env_filter(create_filter())
        .with_test_writer()
        .try_init();
}

fn stdout_enabled() -> bool {
    env::var("QUILL_LOG").is_ok() || env::var("RUST_LOG").is_ok() || cfg!(debug_assertions)
}

fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("quill-{}.log", std::process::id());

    if let Some(path) = override_path {
        if path.extension().is_none() {
            return (path, filename);
        }
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(filename);
        return (dir.to_path_buf(), name);
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("logs");
    (dir, filename)
}

/// File filter: the env filter if one is set, otherwise `warn`.
fn create_file_filter() -> EnvFilter {
    if env::var("QUILL_LOG").is_ok() || env::var("RUST_LOG").is_ok() {
        return create_filter();
    }
    EnvFilter::new("warn")
}

fn create_filter() -> EnvFilter {
    if let Ok(quill_log) = env::var("QUILL_LOG") {
        return expand_quill_log(&quill_log);
    }
    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }
    EnvFilter::new(filter_for_crates("info"))
}

/// `QUILL_LOG=debug` becomes `warn,quill=debug,quill_config=debug,...`.
/// Values with directive syntax are used as-is.
fn expand_quill_log(quill_log: &str) -> EnvFilter {
    if quill_log.contains(['=', ':', ',']) {
        return EnvFilter::new(quill_log);
    }
    EnvFilter::new(filter_for_crates(quill_log))
}

fn filter_for_crates(level: &str) -> String {
    let mut filter = String::from("warn");
    for name in CRATES {
        filter.push_str(&format!(",{name}={level}"));
    }
    filter
}
