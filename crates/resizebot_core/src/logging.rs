use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;

/// Set up `env_logger`. `RUST_LOG` is read first; an explicit `level`
/// replaces its default level. With `log_file` every record is appended to
/// that file instead of stderr.
pub fn init_logger(level: Option<LevelFilter>, log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("rustls", LevelFilter::Warn);

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            record.level(),
            record.args()
        )
    });

    if let Some(path) = log_file {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .context("failed to initialize logger")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    // The only test in this crate that installs a logger.
    #[test]
    fn records_are_appended_to_the_log_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("logs").join("error.log");
        fs::create_dir_all(temp.path().join("logs")).expect("mkdir");
        fs::write(&path, "earlier line\n").expect("seed log");

        init_logger(Some(LevelFilter::Debug), Some(&path)).expect("first logger");
        log::error!("upload of File:Marker.png failed");
        log::debug!("debug passes the filter");
        log::logger().flush();

        let content = fs::read_to_string(&path).expect("read log");
        assert!(content.starts_with("earlier line\n"));
        assert!(content.contains(" ERROR upload of File:Marker.png failed\n"));
        assert!(content.contains(" DEBUG debug passes the filter\n"));

        let error = init_logger(None, None).expect_err("second logger");
        assert!(error.to_string().contains("failed to initialize logger"));
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let temp = tempdir().expect("tempdir");
        let error = init_logger(None, Some(temp.path())).expect_err("directory is not a file");
        assert!(error.to_string().contains("failed to open log file"));
    }
}
