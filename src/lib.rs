//! `subjscan` — subject-line length statistics from heterogeneous mail stores.
//!
//! This crate ingests email from mbox archive trees (gzipped or plain),
//! single Maildir folders, a notmuch index, and flat message-file corpora;
//! normalizes `(message-id, subject, date)` triples; and persists one row
//! per message into a SQLite table for offline trend analysis. Companion
//! passes anonymize the stored identifiers and emit per-day aggregates.

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod store;
