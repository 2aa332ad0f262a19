//! Indexed-database extractor: a capability seam over an externally
//! maintained mail index.
//!
//! The core only needs "given a path, an ordered batch of header triples
//! dated on or before now". The shipped implementation binds to notmuch
//! behind the `notmuch` cargo feature; builds without it reject a
//! configured index at startup instead of silently skipping it.

use std::path::Path;

use crate::error::Result;
use crate::model::RawHeaders;
use crate::source::HeaderStream;

/// Capability contract for a pre-built, queryable mail index.
///
/// The upper date bound is fixed when the implementation is constructed,
/// so one scan sees one consistent cutoff. Implementations return their
/// batch in the index's native result order.
pub trait MailIndex {
    /// All header triples for messages dated on or before the cutoff.
    fn headers(&self) -> Result<Vec<RawHeaders>>;
}

/// Open the notmuch index at `path` as a header stream.
///
/// The query result is materialized up front; everything downstream still
/// consumes it through the common stream contract.
#[cfg(feature = "notmuch")]
pub fn open_notmuch(path: &Path) -> Result<HeaderStream> {
    let index = notmuch_impl::Notmuch::open(path)?;
    let batch = index.headers()?;
    Ok(Box::new(batch.into_iter().map(Ok)))
}

/// Featureless builds refuse a configured index loudly.
#[cfg(not(feature = "notmuch"))]
pub fn open_notmuch(path: &Path) -> Result<HeaderStream> {
    Err(crate::error::ScanError::Config(format!(
        "notmuch index '{}' configured, but this binary was built without the 'notmuch' feature",
        path.display()
    )))
}

#[cfg(feature = "notmuch")]
mod notmuch_impl {
    use std::path::{Path, PathBuf};

    use chrono::Local;
    use tracing::debug;

    use super::MailIndex;
    use crate::error::{Result, ScanError};
    use crate::model::RawHeaders;

    /// The notmuch binding of the [`MailIndex`] capability.
    pub struct Notmuch {
        path: PathBuf,
        /// `date:..` upper bound, fixed at construction for the whole run.
        cutoff: String,
    }

    impl Notmuch {
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            if !path.is_dir() {
                return Err(ScanError::SourceNotFound(path.to_path_buf()));
            }
            Ok(Self {
                path: path.to_path_buf(),
                cutoff: Local::now().date_naive().to_string(),
            })
        }
    }

    impl MailIndex for Notmuch {
        fn headers(&self) -> Result<Vec<RawHeaders>> {
            let db = notmuch::Database::open(&self.path, notmuch::DatabaseMode::ReadOnly)
                .map_err(|e| ScanError::Index(e.to_string()))?;
            let query = db
                .create_query(&format!("date:..{}", self.cutoff))
                .map_err(|e| ScanError::Index(e.to_string()))?;
            let total = query
                .count_messages()
                .map_err(|e| ScanError::Index(e.to_string()))?;
            debug!(path = %self.path.display(), total, "Scanning notmuch index");

            let messages = query
                .search_messages()
                .map_err(|e| ScanError::Index(e.to_string()))?;

            let mut batch = Vec::with_capacity(total as usize);
            for message in messages {
                let mut id = message.id().to_string();
                // The index hands back bare ids; wrap here as well as in the
                // normalizer (accepted redundancy).
                if !id.starts_with('<') {
                    id = format!("<{id}>");
                }
                let subject = message
                    .header("subject")
                    .map_err(|e| ScanError::Index(e.to_string()))?
                    .map(|s| s.to_string());
                let date = message
                    .header("date")
                    .map_err(|e| ScanError::Index(e.to_string()))?
                    .map(|s| s.to_string());
                batch.push(RawHeaders::new(Some(id), subject, date));
            }
            Ok(batch)
        }
    }
}
