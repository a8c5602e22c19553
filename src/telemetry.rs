//! Optional `tracing` subscriber setup for hosts and tools.
//!
//! The kernel only emits events; it never installs a subscriber itself.
//! Log level is controlled by `RUST_LOG`, falling back to the directive the
//! host passes in (e.g. `"info"` or `"gcode_kernel=debug"`).

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs a global fmt subscriber writing to stdout.
///
/// Returns an error if a global subscriber is already set, so calling it
/// more than once is harmless.
pub fn init_tracing(default_directive: &str) -> Result<(), InitError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .try_init()?;

    tracing::debug!("tracing initialised");
    Ok(())
}

/// Installs a global fmt subscriber writing to `dir/file_name` through a
/// non-blocking appender. The returned guard flushes on drop; keep it alive
/// for as long as logging is wanted.
pub fn init_file_tracing(
    dir: &Path,
    file_name: &str,
    default_directive: &str,
) -> Result<WorkerGuard, InitError> {
    // `rolling::never` panics when the directory is missing.
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()?;

    tracing::info!(log = %dir.join(file_name).display(), "file logging initialised");
    Ok(guard)
}
