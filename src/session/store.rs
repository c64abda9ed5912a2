use super::document::DiagramDocument;
use super::options::{CompressionMode, SessionOptions};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use flate2::{Compression, bufread::GzDecoder, write::GzEncoder};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const CURRENT_VERSION: u32 = 1;

/// Somewhere a diagram can be saved to and restored from.
///
/// Implemented by [`SessionStore`]; the drawer's autosave only needs this
/// trait, so hosts can substitute their own backing store.
pub trait DiagramStore {
    fn save(&mut self, document: &DiagramDocument) -> Result<()>;

    /// Returns `Ok(None)` if nothing has been saved yet.
    fn load(&mut self) -> Result<Option<DiagramDocument>>;
}

/// Versioned on-disk wrapper around a document.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    last_modified: String,
    diagram: DiagramDocument,
}

/// Session files are wrapped; exported JSON is a bare document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Wrapped(SessionFile),
    Bare(DiagramDocument),
}

/// A document read from disk.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: DiagramDocument,
    pub compressed: bool,
    /// `last_modified` of a session file; `None` for bare documents
    pub last_modified: Option<String>,
}

/// File-backed [`DiagramStore`] with locking, optional gzip and a backup copy.
#[derive(Debug, Clone)]
pub struct SessionStore {
    options: SessionOptions,
}

impl SessionStore {
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

impl DiagramStore for SessionStore {
    fn save(&mut self, document: &DiagramDocument) -> Result<()> {
        save_document(document, &self.options)
    }

    fn load(&mut self) -> Result<Option<DiagramDocument>> {
        Ok(load_session(&self.options)?.map(|loaded| loaded.document))
    }
}

/// Persist the provided document to disk according to the configured options.
pub fn save_document(document: &DiagramDocument, options: &SessionOptions) -> Result<()> {
    fs::create_dir_all(&options.base_dir).with_context(|| {
        format!(
            "failed to create session directory {}",
            options.base_dir.display()
        )
    })?;

    let lock_path = options.lock_file_path();
    let lock_file = open_lock_file(&lock_path)?;
    lock_file
        .lock_exclusive()
        .with_context(|| format!("failed to lock session file {}", lock_path.display()))?;

    let result = save_document_inner(document, options);

    lock_file.unlock().unwrap_or_else(|err| {
        warn!(
            "failed to unlock session file {}: {}",
            lock_path.display(),
            err
        )
    });

    result
}

fn save_document_inner(document: &DiagramDocument, options: &SessionOptions) -> Result<()> {
    let session_path = options.session_file_path();
    let backup_path = options.backup_file_path();

    let file_payload = SessionFile {
        version: CURRENT_VERSION,
        last_modified: Utc::now().to_rfc3339(),
        diagram: document.clone(),
    };

    let mut json_bytes =
        serde_json::to_vec_pretty(&file_payload).context("failed to serialise diagram payload")?;

    if json_bytes.len() as u64 > options.max_file_size_bytes {
        bail!(
            "diagram data size {} bytes exceeds the configured limit of {} bytes",
            json_bytes.len(),
            options.max_file_size_bytes
        );
    }

    let should_compress = match options.compression {
        CompressionMode::Off => false,
        CompressionMode::On => true,
        CompressionMode::Auto => (json_bytes.len() as u64) >= options.auto_compress_threshold_bytes,
    };

    if should_compress {
        json_bytes = compress_bytes(&json_bytes)?;
    }

    let tmp_path = temp_path(&session_path);
    {
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .with_context(|| {
                format!(
                    "failed to open temporary session file {}",
                    tmp_path.display()
                )
            })?;
        tmp_file
            .write_all(&json_bytes)
            .context("failed to write diagram payload")?;
        tmp_file
            .sync_all()
            .context("failed to sync temporary session file")?;
    }

    if session_path.exists() {
        if options.backup_retention > 0 {
            if backup_path.exists() {
                fs::remove_file(&backup_path).ok();
            }
            fs::rename(&session_path, &backup_path).with_context(|| {
                format!(
                    "failed to rotate previous session file {} -> {}",
                    session_path.display(),
                    backup_path.display()
                )
            })?;
        } else {
            fs::remove_file(&session_path).ok();
        }
    }

    fs::rename(&tmp_path, &session_path).with_context(|| {
        format!(
            "failed to move temporary session file {} -> {}",
            tmp_path.display(),
            session_path.display()
        )
    })?;

    info!(
        "Diagram saved to {} ({} bytes, compression={})",
        session_path.display(),
        json_bytes.len(),
        should_compress
    );

    Ok(())
}

/// Attempt to load the saved diagram for `options`.
pub fn load_session(options: &SessionOptions) -> Result<Option<LoadedDocument>> {
    let session_path = options.session_file_path();
    if !session_path.exists() {
        debug!(
            "No session file present at {}, skipping load",
            session_path.display()
        );
        return Ok(None);
    }

    let lock_path = options.lock_file_path();
    let lock_file = open_lock_file(&lock_path)?;
    lock_file
        .lock_shared()
        .with_context(|| format!("failed to acquire shared lock {}", lock_path.display()))?;

    let result = read_document_file(&session_path, options.max_file_size_bytes);

    lock_file.unlock().unwrap_or_else(|err| {
        warn!(
            "failed to unlock session file {}: {}",
            lock_path.display(),
            err
        )
    });

    result.map(Some)
}

/// Reads a session file or an exported JSON document, gzip or plain.
///
/// # Errors
/// Fails if the file is larger than `max_bytes`, unreadable, or not a
/// diagram document.
pub fn read_document_file(path: &Path, max_bytes: u64) -> Result<LoadedDocument> {
    let metadata =
        fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    if metadata.len() > max_bytes {
        bail!(
            "{} is {} bytes which exceeds the limit of {} bytes",
            path.display(),
            metadata.len(),
            max_bytes
        );
    }

    let mut file_bytes = Vec::new();
    File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .read_to_end(&mut file_bytes)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let compressed = is_gzip(&file_bytes);
    let decompressed = if compressed {
        let mut decoder = GzDecoder::new(&file_bytes[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .context("failed to decompress diagram file")?;
        out
    } else {
        file_bytes
    };

    let stored: StoredDocument = serde_json::from_slice(&decompressed)
        .with_context(|| format!("failed to parse diagram json in {}", path.display()))?;

    Ok(match stored {
        StoredDocument::Wrapped(file) => {
            if file.version > CURRENT_VERSION {
                warn!(
                    "{} was written by a newer version ({}); reading what we understand",
                    path.display(),
                    file.version
                );
            }
            LoadedDocument {
                document: file.diagram,
                compressed,
                last_modified: Some(file.last_modified),
            }
        }
        StoredDocument::Bare(document) => LoadedDocument {
            document,
            compressed,
            last_modified: None,
        },
    })
}

fn open_lock_file(lock_path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .with_context(|| format!("failed to open session lock file {}", lock_path.display()))
}

fn compress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .context("failed to compress diagram payload")?;
    encoder
        .finish()
        .context("failed to finalise compressed diagram payload")
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() > 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

fn temp_path(target: &Path) -> PathBuf {
    let mut candidate = target.with_extension("json.tmp");
    let mut counter = 0u32;
    while candidate.exists() {
        counter += 1;
        candidate = target.with_extension(format!("json.tmp{}", counter));
    }
    candidate
}
