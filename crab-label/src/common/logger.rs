//! Logging setup
//!
//! - Console output, pretty or JSON
//! - Daily rotating application logs under `<log_dir>/app`, pruned by
//!   [`cleanup_old_logs`]
//! - Permanent audit logs under `<log_dir>/audit` (target `"audit"`)

use std::fs;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::{EnvFilter, Layer, filter, fmt, prelude::*};

/// Days an application log file is kept
pub const APP_LOG_RETENTION_DAYS: i64 = 14;

const AUDIT_TARGET: &str = "audit";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Delete rotated `app.YYYY-MM-DD` files older than `retention_days`
///
/// Returns the number of files removed. Audit logs are never touched.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> anyhow::Result<usize> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(retention_days);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // tracing-appender names files `app.YYYY-MM-DD`
        let stem = name.strip_suffix(".log").unwrap_or(name);
        if let Some(date_part) = stem.strip_prefix("app.").or_else(|| stem.strip_prefix("app-"))
            && let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(removed)
}

fn console_layer<S>(level: &str, json_format: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(EnvFilter::new(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(EnvFilter::new(level))
            .boxed()
    }
}

fn file_layer<S>(
    appender: RollingFileAppender,
    json_format: bool,
    keep: impl Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static,
) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let writer = std::sync::Mutex::new(appender);
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .with_filter(filter::filter_fn(keep))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter::filter_fn(keep))
            .boxed()
    }
}

/// Initialize logging to the console and, with `log_dir`, to rolling files
///
/// `LOG_LEVEL`-style filter strings are accepted (`info`, `crab_label=debug`).
/// A `RUST_LOG` environment variable overrides `level` for console and app
/// output; audit events are always recorded.
///
/// # Examples
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use crab_label::common::logger::init_logger_with_file;
///
/// init_logger_with_file("info", false, Some(std::path::Path::new("./work_dir/logs")))?;
/// # Ok(())
/// # }
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    let mut layers: Vec<BoxedLayer<Registry>> = vec![console_layer(&level, json_format)];

    if let Some(log_dir) = log_dir {
        let app_log_dir = log_dir.join("app");
        let audit_log_dir = log_dir.join("audit");
        fs::create_dir_all(&app_log_dir)?;
        fs::create_dir_all(&audit_log_dir)?;

        let app_filter = EnvFilter::new(&level);
        let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
        layers.push(
            file_layer::<Registry>(app_log, json_format, |meta| meta.target() != AUDIT_TARGET)
                .with_filter(app_filter)
                .boxed(),
        );

        let audit_log = RollingFileAppender::new(Rotation::DAILY, audit_log_dir, "audit");
        layers.push(file_layer(audit_log, json_format, |meta| {
            meta.target() == AUDIT_TARGET
        }));

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(periodic_cleanup(log_dir.to_path_buf()));
        }
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

/// Console-only logging
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        if let Err(e) = cleanup_old_logs(&log_dir, APP_LOG_RETENTION_DAYS) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
        sleep(Duration::from_secs(3600)).await;
    }
}

/// Record a label lifecycle event on the permanent audit stream
///
/// ```no_run
/// crab_label::audit_log!("commit", "AC151230007");
/// crab_label::audit_log!("reprint", "AC151230007", "copy 2");
/// ```
#[macro_export]
macro_rules! audit_log {
    ($action:expr, $resource:expr) => {
        tracing::info!(
            target: "audit",
            action = $action,
            resource = $resource,
            timestamp = chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
    ($action:expr, $resource:expr, $details:expr) => {
        tracing::info!(
            target: "audit",
            action = $action,
            resource = $resource,
            details = %$details,
            timestamp = chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"log").unwrap();
    }

    #[test]
    fn test_cleanup_removes_only_old_app_logs() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("app");
        let audit = tmp.path().join("audit");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&audit).unwrap();

        let today = chrono::Local::now().date_naive();
        let old = today - chrono::Duration::days(30);
        let old_name = format!("app.{}", old.format("%Y-%m-%d"));
        let fresh_name = format!("app.{}", today.format("%Y-%m-%d"));

        touch(&app, &old_name);
        touch(&app, &fresh_name);
        touch(&app, "notes.txt");
        touch(&audit, &format!("audit.{}", old.format("%Y-%m-%d")));

        let removed = cleanup_old_logs(tmp.path(), APP_LOG_RETENTION_DAYS).unwrap();
        assert_eq!(removed, 1);
        assert!(!app.join(old_name).exists());
        assert!(app.join(fresh_name).exists());
        assert!(app.join("notes.txt").exists());
        assert_eq!(fs::read_dir(&audit).unwrap().count(), 1);
    }

    #[test]
    fn test_cleanup_without_log_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(&tmp.path().join("missing"), 14).unwrap(), 0);
    }
}
