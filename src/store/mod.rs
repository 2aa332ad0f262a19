//! SQLite persistence: the stats sink and the anonymization pass.

pub mod anonymize;
pub mod sink;

pub use sink::StatsDb;
