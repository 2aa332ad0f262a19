//! Single-folder Maildir extractor.
//!
//! One Maildir folder means one `cur`/`new` pair with one file per message.
//! Nested folders are deliberately not traversed; configure each folder of
//! interest separately.

use std::path::{Path, PathBuf};

use mail_parser::mailbox::maildir;
use mail_parser::MessageParser;
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::model::RawHeaders;

/// Lazy stream over the messages of one Maildir folder, in the store's
/// natural iteration order.
pub struct MaildirFolder {
    path: PathBuf,
    messages: maildir::MessageIterator,
    parser: MessageParser,
}

impl MaildirFolder {
    /// Open the folder. An unreadable folder is structural and fails here.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(ScanError::SourceNotFound(path.to_path_buf()));
        }
        debug!(path = %path.display(), "Scanning Maildir folder");
        let messages =
            maildir::MessageIterator::new(path).map_err(|e| ScanError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            messages,
            parser: MessageParser::default(),
        })
    }
}

impl Iterator for MaildirFolder {
    type Item = Result<RawHeaders>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.messages.next()? {
            Ok(message) => {
                let triple = match self.parser.parse(message.contents()) {
                    Some(parsed) => super::headers_of(&parsed),
                    None => RawHeaders::default(),
                };
                Some(Ok(triple))
            }
            // One unreadable message file; the folder itself stays usable.
            Err(e) => Some(Err(ScanError::Message {
                path: self.path.clone(),
                reason: e.to_string(),
            })),
        }
    }
}
