//! The scan driver: sources → composer → normalizer → sink.
//!
//! Strictly sequential and pull-based; the driver owns the only loop. A
//! record-level failure is logged and skipped, a structural failure ends
//! the run with the store at its last commit boundary.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::model::ScanSummary;
use crate::normalize::{normalize, DateBounds};
use crate::source::{build_sources, Compose};
use crate::store::StatsDb;

/// Run one full scan over every configured source.
///
/// Commits after every `scan.commit_every` records and once at end of
/// stream, logging count and the observed date range at each boundary.
/// `progress` (if given) is invoked at the same boundaries plus once at
/// the end, for display purposes.
pub fn run_scan(
    config: &Config,
    db: &mut StatsDb,
    progress: Option<&dyn Fn(&ScanSummary)>,
) -> Result<ScanSummary> {
    let sources = build_sources(config)?;
    db.ensure_schema()?;

    let bounds = DateBounds::new(config.scan.min_date, config.scan.max_date);
    let commit_every = config.scan.commit_every;
    let mut summary = ScanSummary::new();

    for item in Compose::new(sources) {
        let raw = match item {
            Ok(raw) => raw,
            Err(e) if e.is_record_level() => {
                warn!(error = %e, "Ignoring record-level error");
                summary.source_error();
                continue;
            }
            Err(e) => return Err(e),
        };

        match normalize(&raw, &bounds) {
            Ok(record) => {
                db.insert(&record)?;
                summary.record(record.date);
                if summary.recorded % commit_every == 0 {
                    info!(
                        "{} emails scanned, from {}. Committing.",
                        summary.recorded,
                        summary.date_range()
                    );
                    db.commit()?;
                    if let Some(cb) = progress {
                        cb(&summary);
                    }
                }
            }
            Err(skip) => {
                debug!(%skip, "Skipping record");
                summary.skip(&skip);
            }
        }
    }

    db.commit()?;
    if let Some(cb) = progress {
        cb(&summary);
    }
    info!(
        recorded = summary.recorded,
        skipped = summary.skipped(),
        range = %summary.date_range(),
        "Scan complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    fn base_config(db_dir: &Path) -> Config {
        let mut config = Config::default();
        config.database.path = db_dir.join("stats.db");
        config
    }

    #[test]
    fn test_scan_requires_some_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = base_config(dir.path());
        let mut db = StatsDb::open(&config.database.path).unwrap();
        assert!(run_scan(&config, &mut db, None).is_err());
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mail = dir.path().join("mail");
        std::fs::create_dir_all(&mail).unwrap();
        write(
            &mail.join("a.mbox"),
            "From x Mon Jan  5 10:00:00 2004\n\
             Message-ID: <a@x>\n\
             Subject: Hello\n\
             Date: Mon, 5 Jan 2004 10:00:00 +0000\n\
             \n\
             body\n",
        );

        let mut config = base_config(dir.path());
        config.scan.mbox_dirs.push(mail);

        let mut db = StatsDb::open(&config.database.path).unwrap();
        let first = run_scan(&config, &mut db, None).unwrap();
        assert_eq!(first.recorded, 1);
        assert_eq!(db.count().unwrap(), 1);

        // Overlapping rescan: the normalizer emits again, the sink ignores.
        let second = run_scan(&config, &mut db, None).unwrap();
        assert_eq!(second.recorded, 1);
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn test_skips_are_counted_by_reason() {
        let dir = tempfile::tempdir().unwrap();
        let mail = dir.path().join("mail");
        std::fs::create_dir_all(&mail).unwrap();
        write(
            &mail.join("mixed.mbox"),
            "From x Mon Jan  5 10:00:00 2004\n\
             Message-ID: <good@x>\n\
             Subject: Keep me\n\
             Date: Mon, 5 Jan 2004 10:00:00 +0000\n\
             \n\
             .\n\
             \n\
             From x Mon Jan  5 10:00:00 2004\n\
             Message-ID: <nodate@x>\n\
             Subject: No date header\n\
             \n\
             .\n\
             \n\
             From x Mon Jan  5 10:00:00 2004\n\
             Message-ID: <old@x>\n\
             Subject: Disco era\n\
             Date: Sun, 5 Jan 1975 10:00:00 +0000\n\
             \n\
             .\n",
        );

        let mut config = base_config(dir.path());
        config.scan.mbox_dirs.push(mail);

        let mut db = StatsDb::open(&config.database.path).unwrap();
        let summary = run_scan(&config, &mut db, None).unwrap();

        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.missing_header, 1);
        assert_eq!(summary.out_of_range, 1);
        assert_eq!(summary.bad_date, 0);
        assert_eq!(db.count().unwrap(), 1);
    }
}
