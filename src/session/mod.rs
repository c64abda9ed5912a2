//! Diagram persistence (save/restore) support.
//!
//! Converts the in-memory diagram into a serialised document, writes it to
//! disk with locking, optional compression, and backup rotation, and
//! rebuilds the model from a document by re-linking transitions to states
//! by id.

mod document;
mod options;
mod store;

pub use document::{
    DiagramDocument, LoadError, LoadReport, StateRecord, TransitionRecord, load_document,
};
pub use options::{
    CompressionMode, DEFAULT_AUTO_COMPRESS_THRESHOLD_BYTES, SessionOptions, options_from_config,
};
pub(crate) use options::expand_tilde;
pub use store::{
    DiagramStore, LoadedDocument, SessionStore, load_session, read_document_file, save_document,
};

#[cfg(test)]
mod tests;
