//! Flat-corpus extractor: a directory tree where every regular file is one
//! message, stored in a legacy single-byte encoding.

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use mail_parser::MessageParser;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, ScanError};
use crate::model::RawHeaders;

/// Lazy stream over every file below a corpus root.
///
/// The walk is bottom-up and applies no extension filter: every regular
/// file is read whole, decoded from the configured encoding to UTF-8, and
/// parsed as a single message. A file whose bytes are invalid under that
/// encoding (or that will not parse at all) is a record-level failure:
/// one skipped file, never an aborted walk.
pub struct FlatCorpus {
    walker: walkdir::IntoIter,
    encoding: &'static Encoding,
    parser: MessageParser,
}

impl FlatCorpus {
    /// Open the corpus root with the given encoding label.
    ///
    /// A missing root or unknown label is structural; `Config::validate`
    /// normally rejects bad labels before this point.
    pub fn open(root: impl AsRef<Path>, encoding_label: &str) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ScanError::SourceNotFound(root.to_path_buf()));
        }
        let encoding = Encoding::for_label(encoding_label.as_bytes()).ok_or_else(|| {
            ScanError::Config(format!("unknown corpus_encoding '{encoding_label}'"))
        })?;
        debug!(path = %root.display(), encoding = encoding.name(), "Scanning flat corpus");
        Ok(Self {
            walker: WalkDir::new(root).contents_first(true).into_iter(),
            encoding,
            parser: MessageParser::default(),
        })
    }

    fn extract(&self, path: &Path) -> Result<RawHeaders> {
        let bytes = std::fs::read(path).map_err(|e| ScanError::Message {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let (text, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            return Err(ScanError::Decode {
                path: path.to_path_buf(),
                encoding: self.encoding.name().to_string(),
            });
        }

        match self.parser.parse(text.as_bytes()) {
            Some(message) => Ok(super::headers_of(&message)),
            None => Err(ScanError::Message {
                path: path.to_path_buf(),
                reason: "not parseable as an email message".into(),
            }),
        }
    }
}

impl Iterator for FlatCorpus {
    type Item = Result<RawHeaders>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    return Some(self.extract(entry.path()));
                }
                // Unreadable entries below a verified root are skipped, the
                // walk itself keeps going.
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable corpus entry");
                    continue;
                }
            }
        }
    }
}
