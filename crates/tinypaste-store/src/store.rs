//! PasteStore — filesystem persistence for pastes and static assets.
//!
//! Provides create-once / read-many access to pastes keyed by generated
//! identifiers, and read access to the reserved static assets sharing the
//! same directory.

use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tinypaste_core::{IdSource, PasteConfig, RandomIdGenerator, is_safe_name};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::layout::{INCOMING_PREFIX, content_type_for, paste_file_name};

/// What a requested name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// A reserved name; serve the static asset.
    StaticAsset(String),
    /// Anything else; treat as a paste identifier.
    PasteLookup(String),
}

/// A static asset opened from the data directory, ready to stream.
#[derive(Debug)]
pub struct StaticAsset {
    pub file: File,
    /// `None` when the name carries no extension.
    pub content_type: Option<String>,
}

/// Thread-safe paste store rooted at a single directory.
pub struct PasteStore {
    root: PathBuf,
    reserved: HashSet<String>,
    ids: Arc<dyn IdSource>,
    max_attempts: u32,
}

impl PasteStore {
    /// Open the store described by `config`, creating its data directory if
    /// needed and seeding a fresh random identifier generator.
    ///
    /// The config is validated first; an invalid one is a `Validation` error.
    pub fn open(config: &PasteConfig) -> StoreResult<Self> {
        config
            .validate()
            .map_err(|e| StoreError::Validation(e.to_string()))?;
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            StoreError::storage(format!("create {}", config.data_dir.display()), e)
        })?;
        let ids = Arc::new(RandomIdGenerator::new(
            &config.id_alphabet,
            config.id_length,
        ));
        let store = Self::new(
            config.data_dir.clone(),
            config.static_files.iter().cloned(),
            ids,
            config.max_create_attempts,
        );
        debug!(root = ?store.root, "paste store opened");
        Ok(store)
    }

    /// Build a store over an existing directory with an injected id source.
    pub fn new(
        root: impl Into<PathBuf>,
        reserved: impl IntoIterator<Item = String>,
        ids: Arc<dyn IdSource>,
        max_attempts: u32,
    ) -> Self {
        Self {
            root: root.into(),
            reserved: reserved.into_iter().collect(),
            ids,
            max_attempts,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── Pastes ─────────────────────────────────────────────────────

    /// Persist `content` under a freshly generated identifier.
    ///
    /// The content is fully written before the identifier is claimed, so a
    /// failed create leaves nothing behind under any paste name.
    pub fn create(&self, content: &[u8]) -> StoreResult<String> {
        if content.is_empty() {
            return Err(StoreError::Validation("paste content is empty".into()));
        }

        let mut staged = tempfile::Builder::new()
            .prefix(INCOMING_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| StoreError::storage("create temporary file", e))?;
        staged
            .write_all(content)
            .map_err(|e| StoreError::storage("write paste content", e))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| StoreError::storage("sync paste content", e))?;

        for attempt in 1..=self.max_attempts {
            let id = self.ids.next_id();
            if self.reserved.contains(&id) {
                debug!(%id, attempt, "candidate shadows a reserved name, skipping");
                continue;
            }
            match self.publish(staged, &id) {
                Ok(()) => {
                    info!(%id, bytes = content.len(), attempt, "paste created");
                    return Ok(id);
                }
                Err(Publish::Taken(file)) => {
                    debug!(%id, attempt, "identifier collision, retrying");
                    staged = file;
                }
                Err(Publish::Failed(e)) => {
                    return Err(StoreError::storage(format!("publish paste {id}"), e));
                }
            }
        }

        Err(StoreError::Exhausted {
            attempts: self.max_attempts,
        })
    }

    /// Link the staged file into `{id}.paste` unless that name already exists.
    fn publish(&self, staged: NamedTempFile, id: &str) -> Result<(), Publish> {
        match staged.persist_noclobber(self.root.join(paste_file_name(id))) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Err(Publish::Taken(e.file)),
            Err(e) => Err(Publish::Failed(e.error)),
        }
    }

    /// Classify a requested name. Never touches storage.
    pub fn resolve(&self, name: &str) -> ResolvedTarget {
        if self.reserved.contains(name) {
            ResolvedTarget::StaticAsset(name.to_string())
        } else {
            ResolvedTarget::PasteLookup(name.to_string())
        }
    }

    /// Open a paste for reading. Existence is decided here; the caller
    /// streams the returned handle.
    pub fn read(&self, id: &str) -> StoreResult<File> {
        if !is_safe_name(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        open_file(&self.root.join(paste_file_name(id)), id)
    }

    // ── Static assets ──────────────────────────────────────────────

    /// Open a reserved static asset and infer its content type.
    pub fn read_static(&self, name: &str) -> StoreResult<StaticAsset> {
        if !self.reserved.contains(name) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let file = open_file(&self.root.join(name), name)?;
        Ok(StaticAsset {
            file,
            content_type: content_type_for(name),
        })
    }
}

enum Publish {
    Taken(NamedTempFile),
    Failed(std::io::Error),
}

/// Open `path` as a regular file. Only a missing entry is `NotFound`.
fn open_file(path: &Path, name: &str) -> StoreResult<File> {
    let context = || format!("open {}", path.display());
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
        _ => StoreError::storage(context(), e),
    })?;
    // Opening a directory succeeds on unix; reading it would not.
    let metadata = file
        .metadata()
        .map_err(|e| StoreError::storage(context(), e))?;
    if metadata.is_dir() {
        return Err(StoreError::storage(
            context(),
            std::io::Error::new(ErrorKind::IsADirectory, "entry is a directory"),
        ));
    }
    Ok(file)
}
