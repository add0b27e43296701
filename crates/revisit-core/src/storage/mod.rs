//! Note and tag storage.
//!
//! [`NoteStore`] is the narrow persistence contract the reconciler and any
//! dashboard depend on. Backends implement it; the core ships an in-memory
//! one and `revisit-sqlite` a durable one.

pub mod error;
pub mod memory;
pub mod note_store;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryNoteStore;
pub use note_store::{review_cutoff, NoteStore};
