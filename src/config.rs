//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$SUBJSCAN_CONFIG` (environment variable)
//! 2. `~/.config/subjscan/config.toml` (Linux/macOS)
//!    `%APPDATA%\subjscan\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! CLI flags override individual fields after loading.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sources, normalization bounds, and commit cadence.
    pub scan: ScanConfig,
    /// Persistent store location.
    pub database: DatabaseConfig,
    /// Logging behavior.
    pub general: GeneralConfig,
}

/// Sources and scan tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory trees searched for `*.mbox`, `*.mbx`, `*.mbx.gz` files.
    pub mbox_dirs: Vec<PathBuf>,
    /// Single Maildir folders (one file per message, `cur` + `new`).
    pub maildirs: Vec<PathBuf>,
    /// Path to a notmuch index. Requires the `notmuch` cargo feature.
    pub notmuch: Option<PathBuf>,
    /// Flat directory trees of individual message files, no extension filter.
    pub corpus_dirs: Vec<PathBuf>,
    /// Legacy encoding the corpus files are decoded with (encoding_rs label).
    pub corpus_encoding: String,
    /// Inclusive lower bound of the plausible-date filter.
    pub min_date: NaiveDate,
    /// Inclusive upper bound of the plausible-date filter.
    pub max_date: NaiveDate,
    /// Commit (and log progress) after this many inserted records.
    pub commit_every: u64,
}

/// Persistent store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file holding the `email_stats` table.
    pub path: PathBuf,
}

/// Logging behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override directory for the log file.
    pub log_dir: Option<PathBuf>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mbox_dirs: Vec::new(),
            maildirs: Vec::new(),
            notmuch: None,
            corpus_dirs: Vec::new(),
            corpus_encoding: "windows-1252".to_string(),
            // Crude outlier filter bounds carried over from the original
            // dataset; deliberately configurable, deliberately not "fixed".
            min_date: NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid date"),
            max_date: NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"),
            commit_every: 1000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("emailsubjectlinelengths.db"),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

// ── Load / validate ─────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
/// An explicit `path` (from `--config`) must exist and parse.
pub fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        let contents = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        return toml::from_str(&contents)
            .map_err(|e| ScanError::Config(format!("{}: {e}", path.display())));
    }

    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return Ok(cfg);
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Ok(Config::default())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("SUBJSCAN_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("subjscan").join("config.toml"))
}

/// Return the directory used for the log file.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subjscan")
}

impl Config {
    /// Startup validation: at least one source, a known corpus encoding,
    /// ordered date bounds, and a usable notmuch configuration.
    pub fn validate(&self) -> Result<()> {
        let scan = &self.scan;
        if scan.mbox_dirs.is_empty()
            && scan.maildirs.is_empty()
            && scan.notmuch.is_none()
            && scan.corpus_dirs.is_empty()
        {
            return Err(ScanError::Config(
                "no mail sources configured (mbox_dirs, maildirs, notmuch, corpus_dirs)".into(),
            ));
        }
        if scan.min_date > scan.max_date {
            return Err(ScanError::Config(format!(
                "min_date {} is after max_date {}",
                scan.min_date, scan.max_date
            )));
        }
        if encoding_rs::Encoding::for_label(scan.corpus_encoding.as_bytes()).is_none() {
            return Err(ScanError::Config(format!(
                "unknown corpus_encoding '{}'",
                scan.corpus_encoding
            )));
        }
        if scan.commit_every == 0 {
            return Err(ScanError::Config("commit_every must be at least 1".into()));
        }
        #[cfg(not(feature = "notmuch"))]
        if scan.notmuch.is_some() {
            return Err(ScanError::Config(
                "a notmuch source is configured but this build lacks the 'notmuch' feature".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.scan.corpus_encoding, "windows-1252");
        assert_eq!(cfg.scan.commit_every, 1000);
        assert_eq!(cfg.scan.min_date.to_string(), "1990-01-01");
        assert_eq!(cfg.scan.max_date.to_string(), "2020-01-01");
        assert_eq!(
            cfg.database.path,
            PathBuf::from("emailsubjectlinelengths.db")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[scan]
mbox_dirs = ["/mail/archives"]
min_date = "1985-06-01"

[database]
path = "/tmp/stats.db"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.scan.mbox_dirs, vec![PathBuf::from("/mail/archives")]);
        assert_eq!(cfg.scan.min_date.to_string(), "1985-06-01");
        // Untouched fields keep their defaults
        assert_eq!(cfg.scan.max_date.to_string(), "2020-01-01");
        assert_eq!(cfg.scan.commit_every, 1000);
        assert_eq!(cfg.database.path, PathBuf::from("/tmp/stats.db"));
    }

    #[test]
    fn test_validate_requires_a_source() {
        let cfg = Config::default();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.scan.maildirs.push(PathBuf::from("/mail/inbox"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_encoding() {
        let mut cfg = Config::default();
        cfg.scan.corpus_dirs.push(PathBuf::from("/corpus"));
        cfg.scan.corpus_encoding = "no-such-charset".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut cfg = Config::default();
        cfg.scan.mbox_dirs.push(PathBuf::from("/mail"));
        cfg.scan.min_date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.scan.corpus_encoding, cfg.scan.corpus_encoding);
        assert_eq!(parsed.scan.min_date, cfg.scan.min_date);
        assert_eq!(parsed.database.path, cfg.database.path);
    }
}
