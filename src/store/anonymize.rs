//! Identifier anonymization: replace message-id keys with row numbers.
//!
//! The stats table is light on personal information, but message-ids leak
//! hostnames, clients, and timezones. This pass rewrites the primary key to
//! a dense sequential surrogate and vacuums the old data away. Destructive
//! and irreversible; running it twice re-derives fresh surrogates, so run
//! it once per dataset if stable keys matter.

use tracing::info;

use crate::error::Result;
use crate::store::StatsDb;

/// Rewrite `email_stats` with integer surrogate keys, preserving the
/// `(date, subject)` payload in the table's native row order. Returns the
/// row count of the rewritten table.
pub fn strip_ids(db: &mut StatsDb) -> Result<u64> {
    // Nothing staged may survive into the rewrite.
    db.commit()?;

    db.connection().execute_batch(
        "BEGIN;
         CREATE TABLE copy(id TEXT PRIMARY KEY, date TEXT, subject INT);
         INSERT INTO copy SELECT rowid, date, subject FROM email_stats;
         ALTER TABLE email_stats RENAME TO old_stats;
         ALTER TABLE copy RENAME TO email_stats;
         DROP TABLE old_stats;
         COMMIT;",
    )?;
    // VACUUM reclaims the dropped table's pages and must run outside a
    // transaction.
    db.connection().execute_batch("VACUUM")?;

    let rows = db.count()?;
    info!(rows, "Anonymized email_stats");
    Ok(rows)
}
