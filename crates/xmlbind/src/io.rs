//! Loading and saving documents on disk

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::xml::model::Fragment;
use crate::xml::parser::{ParseOptions, Parser};
use crate::xml::writer::WriteOptions;

/// Read a file, `None` when it does not exist
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io(path, &err)),
    }
}

impl Document {
    /// Load and parse a file; `Ok(None)` when the path does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        Self::load_with(path, ParseOptions::default())
    }

    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_with(path: impl AsRef<Path>, options: ParseOptions) -> Result<Option<Self>> {
        let Some(text) = read_optional(path.as_ref())? else {
            debug!("no such file");
            return Ok(None);
        };
        Self::parse_with(&text, options).map(Some)
    }

    /// Reconcile and write to `path`, creating missing parent directories
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with(path, WriteOptions::default())
    }

    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_with(&mut self, path: impl AsRef<Path>, options: WriteOptions) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_xml_with(options)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, &err))?;
        }
        fs::write(path, text.as_bytes()).map_err(|err| Error::io(path, &err))?;
        debug!(bytes = text.len(), "saved document");
        Ok(())
    }
}

/// Caller-owned cache of parsed files keyed by path
///
/// The cache holds parsed fragments, never documents: every [`LoadCache::load`]
/// builds a fresh [`Document`], so bindings made on one load are invisible to
/// the next. Entries stay until [`LoadCache::invalidate`] or
/// [`LoadCache::clear`]; the file is not re-read when it changes on disk.
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: RwLock<HashMap<PathBuf, Arc<Fragment>>>,
    options: ParseOptions,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            options,
        }
    }

    /// Document for `path`, parsed on first use; `Ok(None)` when the file does
    /// not exist (nothing is cached then)
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Option<Document>> {
        let path = path.as_ref();
        if let Some(fragment) = self.entries.read().get(path) {
            debug!(path = %path.display(), "load cache hit");
            return Ok(Some(Document::from_fragment(fragment)));
        }

        let Some(text) = read_optional(path)? else {
            return Ok(None);
        };
        let fragment = Arc::new(Parser::with_options(text.as_bytes(), self.options).parse()?);
        let doc = Document::from_fragment(&fragment);

        let mut entries = self.entries.write();
        entries.entry(path.to_path_buf()).or_insert(fragment);
        debug!(path = %path.display(), cached = entries.len(), "load cache miss");
        Ok(Some(doc))
    }

    /// Forget `path`; returns whether it was cached
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        self.entries.write().remove(path.as_ref()).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.read().contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
