//! Per-day aggregates for the external analysis notebook.
//!
//! Deliberately no plotting here: this emits the grouped rows the
//! downstream scatter/bar chart is built from.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::store::StatsDb;

/// One day's aggregate of the stats table.
#[derive(Debug, Clone, Serialize)]
pub struct DailyStat {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Messages recorded on that day.
    pub messages: u64,
    /// Mean subject length in characters.
    pub avg_subject_chars: f64,
}

/// Group the table by day, oldest first.
pub fn daily_stats(db: &StatsDb) -> Result<Vec<DailyStat>> {
    let conn = db.connection();
    let mut stmt = conn.prepare(
        "SELECT date, COUNT(*), AVG(subject) FROM email_stats GROUP BY date ORDER BY date",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DailyStat {
            date: row.get(0)?,
            messages: row.get::<_, i64>(1)? as u64,
            avg_subject_chars: row.get::<_, f64>(2)?,
        })
    })?;

    let mut stats = Vec::new();
    for row in rows {
        stats.push(row?);
    }
    Ok(stats)
}

/// Render as `date,messages,avg_subject_chars` CSV.
pub fn write_csv(stats: &[DailyStat], out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "date,messages,avg_subject_chars")?;
    for day in stats {
        writeln!(
            out,
            "{},{},{:.2}",
            day.date, day.messages, day.avg_subject_chars
        )?;
    }
    Ok(())
}

/// Render as a JSON array.
pub fn write_json(stats: &[DailyStat], out: &mut impl Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, stats)?;
    writeln!(out)?;
    Ok(())
}
