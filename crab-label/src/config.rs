use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;

/// Label station configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./work_dir | holds `label.redb` and `logs/` |
/// | LOG_LEVEL | info | tracing filter |
/// | LOG_JSON | false | JSON log output |
/// | LABEL_TIMEZONE | UTC | IANA zone that defines local midnight |
/// | PRINTER_ADDR | unset | `host:port` of a raw TCP label printer |
/// | PRINTER_DEVICE | unset | printer device file, e.g. `/dev/usb/lp0` |
/// | PRINTER_TIMEOUT_MS | 5000 | printer connect/write timeout |
/// | PAPER_WIDTH | 48 | characters per printed line |
/// | BARCODE_HEIGHT | 120 | bar length in printer dots |
/// | BARCODE_MODULE | 3 | narrow element width in printer dots |
///
/// ```ignore
/// WORK_DIR=/data/labels LABEL_TIMEZONE=America/Chicago PRINTER_ADDR=10.0.0.20:9100 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct LabelConfig {
    pub work_dir: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    pub timezone: Tz,
    /// Network printer; takes precedence over `printer_device`
    pub printer_addr: Option<String>,
    pub printer_device: Option<PathBuf>,
    pub printer_timeout_ms: u64,
    pub paper_width: usize,
    pub barcode_height: u16,
    pub barcode_module: u32,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LabelConfig {
    /// Load from the environment, reading a `.env` file first if present
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let timezone = match env_non_empty("LABEL_TIMEZONE") {
            Some(name) => name.parse().unwrap_or_else(|_| {
                tracing::warn!(timezone = %name, "Unknown LABEL_TIMEZONE, using UTC");
                Tz::UTC
            }),
            None => Tz::UTC,
        };

        Self {
            work_dir: env_non_empty("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./work_dir")),
            log_level: env_non_empty("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: env_parse("LOG_JSON").unwrap_or(false),
            timezone,
            printer_addr: env_non_empty("PRINTER_ADDR"),
            printer_device: env_non_empty("PRINTER_DEVICE").map(PathBuf::from),
            printer_timeout_ms: env_parse("PRINTER_TIMEOUT_MS").unwrap_or(5000),
            paper_width: env_parse("PAPER_WIDTH").unwrap_or(48),
            barcode_height: env_parse("BARCODE_HEIGHT").unwrap_or(120),
            barcode_module: env_parse("BARCODE_MODULE").unwrap_or(3),
        }
    }

    /// Environment config with a different work directory
    ///
    /// Mostly used by tests.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.work_dir.join("label.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.work_dir.join("logs")
    }

    pub fn printer_timeout(&self) -> Duration {
        Duration::from_millis(self.printer_timeout_ms)
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let config = LabelConfig::with_work_dir("/tmp/labels");
        assert_eq!(config.db_path(), PathBuf::from("/tmp/labels/label.redb"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/labels/logs"));
    }

    #[test]
    fn test_timeout_conversion() {
        let mut config = LabelConfig::with_work_dir("/tmp/labels");
        config.printer_timeout_ms = 250;
        assert_eq!(config.printer_timeout(), Duration::from_millis(250));
    }
}
