//! Contracts implemented by the underlying journals the set fans out to.
//!
//! The set itself never touches bytes on disk or the wire; it drives these
//! traits through a shared lifecycle and isolates their failures.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::JournalError;
use crate::manifest::RemoteEditLog;

/// One record of the edit log, opaque to the fan-out layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub txid: u64,
    pub payload: Vec<u8>,
}

impl EditRecord {
    pub fn new(txid: u64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            txid,
            payload: payload.into(),
        }
    }
}

/// Namespace identity applied when a journal is formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub namespace_id: u64,
    pub cluster_id: String,
}

/// Storage placement classes understood by the health registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLocationType {
    Local,
    Shared,
    Remote,
}

/// Write surface of one open log segment on a single journal.
pub trait EditLogOutputStream: Send {
    fn write(&mut self, record: &EditRecord) -> Result<(), JournalError>;

    /// Writes the segment header.
    fn create(&mut self) -> Result<(), JournalError>;

    fn set_ready_to_flush(&mut self) -> Result<(), JournalError>;

    /// Durability barrier: the record batch marked ready must reach stable
    /// storage before this returns.
    fn flush_and_sync(&mut self) -> Result<(), JournalError>;

    fn flush(&mut self) -> Result<(), JournalError>;

    fn close(&mut self) -> Result<(), JournalError>;

    fn abort(&mut self) -> Result<(), JournalError>;

    fn should_force_sync(&self) -> bool;

    fn num_sync(&self) -> u64;

    fn total_sync_time_ms(&self) -> u64;
}

/// Read surface handed back by the input selector.
pub trait EditLogInputStream: Send + std::fmt::Debug {
    fn name(&self) -> &str;

    fn first_txid(&self) -> u64;
}

/// Extra surface offered only by journals backed by a storage directory.
pub trait FileBackedJournal {
    fn storage_directory(&self) -> &Path;

    /// Segment listing from `from_txid`, including in-progress segments.
    fn edit_log_manifest(&self, from_txid: u64) -> Result<Vec<RemoteEditLog>, JournalError>;
}

/// One independent durable copy of the edit log.
pub trait JournalManager: Send {
    fn start_log_segment(
        &mut self,
        txid: u64,
    ) -> Result<Box<dyn EditLogOutputStream>, JournalError>;

    fn finalize_log_segment(&mut self, first_txid: u64, last_txid: u64)
        -> Result<(), JournalError>;

    fn close(&mut self) -> Result<(), JournalError>;

    /// Number of contiguous transactions readable from `from_txid`. A journal
    /// that holds later transactions but cannot serve `from_txid` reports
    /// `Corruption` instead of a count.
    fn number_of_transactions(&self, from_txid: u64) -> Result<u64, JournalError>;

    fn input_stream(&self, from_txid: u64) -> Result<Box<dyn EditLogInputStream>, JournalError>;

    fn purge_logs_older_than(&mut self, min_txid_to_keep: u64) -> Result<(), JournalError>;

    fn recover_unfinalized_segments(&mut self) -> Result<(), JournalError>;

    fn format(&mut self, ns_info: &NamespaceInfo) -> Result<(), JournalError>;

    /// Stable identity used by `remove`: file journals report their directory
    /// path, remote journals their endpoint.
    fn locator(&self) -> &str;

    fn as_file_backed(&self) -> Option<&dyn FileBackedJournal> {
        None
    }
}

/// Health registry for the storage directories behind file journals.
///
/// Receives error notifications and the disabled-journal gauge; classifies
/// directories for the selector's local-preference tie-break.
pub trait StorageHealthRegistry: Send + Sync {
    fn report_directory_error(&self, dir: &Path);

    fn update_journal_metrics(&self, failed_journals: usize);

    fn is_preferred(&self, location: StorageLocationType, dir: &Path) -> bool;
}
