//! Archive-directory extractor: walks a tree of (optionally gzipped)
//! mbox files and yields one raw header triple per contained message.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use mail_parser::mailbox::mbox::MessageIterator;
use mail_parser::MessageParser;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, ScanError};
use crate::model::RawHeaders;

/// File name suffixes recognized as archive mailboxes.
const ARCHIVE_SUFFIXES: [&str; 3] = [".mbox", ".mbx", ".mbx.gz"];

type BoxedMessages = MessageIterator<BufReader<Box<dyn Read>>>;

/// Lazy stream over every message in every archive-mailbox file below a
/// directory root.
///
/// Files are selected by suffix and visited in lexically sorted order
/// within each directory; the order in which directories themselves are
/// reached is the walker's and not part of the contract. A `.gz` suffix
/// switches the reader to transparent gzip decompression.
pub struct ArchiveDir {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, BoxedMessages)>,
    parser: MessageParser,
}

impl ArchiveDir {
    /// Collect the archive files below `root`.
    ///
    /// A missing root or a failed walk is structural and fails here, before
    /// any message is produced.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ScanError::SourceNotFound(root.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if ARCHIVE_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                files.push(entry.into_path());
            }
        }

        Ok(Self {
            files: files.into_iter(),
            current: None,
            parser: MessageParser::default(),
        })
    }

    fn open_file(path: &Path) -> Result<BoxedMessages> {
        let file = File::open(path).map_err(|e| ScanError::io(path, e))?;
        let reader: Box<dyn Read> = if path.to_string_lossy().ends_with(".gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(MessageIterator::new(BufReader::new(reader)))
    }
}

impl Iterator for ArchiveDir {
    type Item = Result<RawHeaders>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((path, messages)) = self.current.as_mut() {
                match messages.next() {
                    Some(Ok(raw)) => {
                        let triple = match self.parser.parse(raw.contents()) {
                            Some(message) => super::headers_of(&message),
                            // Nothing parseable in this chunk; the triple's
                            // absent fields make the normalizer drop it.
                            None => RawHeaders::default(),
                        };
                        return Some(Ok(triple));
                    }
                    Some(Err(e)) => {
                        // Corrupt framing or a failed read: report once and
                        // abandon the remainder of this file.
                        let path = path.clone();
                        self.current = None;
                        return Some(Err(ScanError::Message {
                            path,
                            reason: format!("{:?}", e),
                        }));
                    }
                    None => {
                        self.current = None;
                    }
                }
            } else {
                let path = self.files.next()?;
                debug!(path = %path.display(), "Scanning archive mailbox");
                match Self::open_file(&path) {
                    Ok(messages) => self.current = Some((path, messages)),
                    // Unopenable file: structural, terminates the run.
                    Err(e) => return Some(Err(e)),
                }
            }
        }
    }
}
