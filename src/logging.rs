//! File logging. The TUI owns the terminal, so log records go to rotated
//! files under `<data_dir>/logs`.

use anyhow::{anyhow, Context, Result};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const LOG_FILE_BASENAME: &str = "freshcal";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 2 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGER: OnceLock<LoggerHandle> = OnceLock::new();

pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

/// Starts file logging once per process. Later calls are no-ops.
pub fn init(level: &str, dir: &Path) -> Result<()> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    fs::create_dir_all(dir).with_context(|| format!("creating log directory {:?}", dir))?;
    let handle = Logger::try_with_str(level)
        .map_err(|err| anyhow!("invalid log level `{}`: {}", level, err))?
        .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::Direct)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .context("starting logger")?;
    let _ = LOGGER.set(handle);
    info!(
        "event=app_start version={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        dir.display()
    );
    Ok(())
}

/// Like [`init`], but a failure only disables logging.
pub fn init_or_warn(level: &str, dir: &Path) {
    if let Err(err) = init(level, dir) {
        eprintln!("freshcal: logging disabled: {:#}", err);
    }
}
