//! Quorum-aware fan-out of metadata edit-log operations across a set of
//! heterogeneous journals (local directories, shared storage, remote log
//! services).
//!
//! The [`JournalSet`] drives every registered journal through a shared
//! segment lifecycle, isolates per-journal failures by disabling the
//! offender, and halts the caller with [`JournalError::QuorumLost`] before
//! data loss once too few journals remain writable. The read path picks the
//! best single journal ([`JournalSet::input_stream`]) or merges per-journal
//! segment listings into a gap-free manifest
//! ([`JournalSet::edit_log_manifest`]).
//!
//! The set is not internally synchronized: callers serialize mutating
//! operations, as a metadata server's edit-log lock already does.
#![deny(unreachable_pub)]
#![deny(unused_must_use)]
#![cfg_attr(docsrs, warn(missing_docs))]

pub mod config;
pub mod entry;
pub mod error;
mod executor;
pub mod health;
pub mod journal;
pub mod manifest;
mod selector;
pub mod set;
pub mod stream;

pub use config::JournalSetOptions;
pub use entry::JournalEntry;
pub use error::JournalError;
pub use health::QuorumStatus;
pub use journal::{
    EditLogInputStream, EditLogOutputStream, EditRecord, FileBackedJournal, JournalManager,
    NamespaceInfo, StorageHealthRegistry, StorageLocationType,
};
pub use manifest::{RemoteEditLog, RemoteEditLogManifest};
pub use set::JournalSet;
pub use stream::JournalSetOutputStream;
