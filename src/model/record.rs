//! The raw extraction unit and the normalized, persisted row.

use chrono::NaiveDate;

/// The three header fields pulled out of one message, exactly as the source
/// library returned them.
///
/// No format or uniqueness guarantees: any field may be absent or malformed.
/// A `RawHeaders` lives only until the normalizer has looked at it; it is
/// never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeaders {
    /// The `Message-ID` header value, angle brackets not guaranteed.
    pub message_id: Option<String>,

    /// The decoded `Subject` header value.
    pub subject: Option<String>,

    /// The `Date` header value, unparsed.
    pub date: Option<String>,
}

impl RawHeaders {
    /// Build a triple from three already-extracted header values.
    pub fn new(
        message_id: Option<String>,
        subject: Option<String>,
        date: Option<String>,
    ) -> Self {
        Self {
            message_id,
            subject,
            date,
        }
    }
}

/// One validated row, ready for the sink.
///
/// `id` always carries angle-bracket delimiters, `date` is truncated to day
/// granularity, and `subject_chars` counts characters (not bytes) of the
/// subject as provided. Rows are written once and never mutated afterwards
/// except by the anonymizer's table-wide rekeying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRecord {
    /// Normalized message identifier, `<...>`-wrapped.
    pub id: String,

    /// Calendar day the message was sent, naive local reading of the header.
    pub date: NaiveDate,

    /// Character count of the subject line.
    pub subject_chars: i64,
}

impl StatRecord {
    /// The `YYYY-MM-DD` rendering stored in the `date` column.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
