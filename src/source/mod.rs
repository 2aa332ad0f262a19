//! Header extraction sources and their composition.
//!
//! Every source presents the same contract: a lazy, finite, non-restartable
//! stream of [`RawHeaders`] triples. `Ok` items carry the three header
//! fields (each possibly absent); `Err` items are extraction failures, with
//! [`crate::error::ScanError::is_record_level`] deciding whether the
//! pipeline skips them or aborts.

pub mod archive;
pub mod corpus;
pub mod index;
pub mod maildir;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::model::RawHeaders;

/// Uniform pull-based stream of raw header triples.
pub type HeaderStream = Box<dyn Iterator<Item = Result<RawHeaders>>>;

/// Pull the three interesting headers out of a parsed message.
///
/// Header lookup (name casing included) is the parsing library's business;
/// absent headers become `None`, never an error. The raw `Date` value is
/// kept unparsed for the normalizer.
pub(crate) fn headers_of(message: &mail_parser::Message<'_>) -> RawHeaders {
    RawHeaders {
        message_id: message.message_id().map(str::to_string),
        subject: message.subject().map(str::to_string),
        date: message.header_raw("Date").map(|d| d.trim().to_string()),
    }
}

/// Concatenates source streams in a fixed order.
///
/// Each stream is drained fully before the next one is started; no
/// interleaving, deduplication, or buffering beyond the single in-flight
/// item.
pub struct Compose {
    streams: std::collections::VecDeque<HeaderStream>,
}

impl Compose {
    pub fn new(streams: Vec<HeaderStream>) -> Self {
        Self {
            streams: streams.into(),
        }
    }
}

impl Iterator for Compose {
    type Item = Result<RawHeaders>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let stream = self.streams.front_mut()?;
            match stream.next() {
                Some(item) => return Some(item),
                None => {
                    self.streams.pop_front();
                }
            }
        }
    }
}

/// Assemble the configured sources, in configuration order: archive
/// directories, Maildir folders, the notmuch index, flat corpora.
///
/// Structural problems (missing roots, unopenable folders, an unusable
/// index) surface here, before the first record flows.
pub fn build_sources(config: &Config) -> Result<Vec<HeaderStream>> {
    config.validate()?;

    let mut streams: Vec<HeaderStream> = Vec::new();

    for dir in &config.scan.mbox_dirs {
        info!(path = %dir.display(), "Adding mbox archive directory");
        streams.push(Box::new(archive::ArchiveDir::open(dir)?));
    }
    for dir in &config.scan.maildirs {
        info!(path = %dir.display(), "Adding Maildir folder");
        streams.push(Box::new(maildir::MaildirFolder::open(dir)?));
    }
    if let Some(path) = &config.scan.notmuch {
        streams.push(index::open_notmuch(path)?);
    }
    for dir in &config.scan.corpus_dirs {
        info!(path = %dir.display(), "Adding flat corpus directory");
        streams.push(Box::new(corpus::FlatCorpus::open(
            dir,
            &config.scan.corpus_encoding,
        )?));
    }

    Ok(streams)
}
