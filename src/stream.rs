//! Aggregate output stream: one write surface multiplexed onto the set.

use std::sync::Arc;

use crate::error::JournalError;
use crate::journal::EditRecord;
use crate::set::JournalSetInner;

/// Applies each stream operation to every journal currently writing.
///
/// In-memory operations run sequentially; the durability barriers run on the
/// worker pool so one slow journal's fsync does not serialize behind the
/// others. Either way a failed journal is disabled rather than failing the
/// operation, unless quorum is lost.
pub struct JournalSetOutputStream {
    inner: Arc<JournalSetInner>,
}

impl JournalSetOutputStream {
    pub(crate) fn new(inner: Arc<JournalSetInner>) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, record: &EditRecord) -> Result<(), JournalError> {
        self.inner.fan_out_sequential(
            |entry| match entry.stream_mut() {
                Some(stream) => stream.write(record),
                None => Ok(()),
            },
            "write op",
        )
    }

    pub fn create(&mut self) -> Result<(), JournalError> {
        self.inner.fan_out_sequential(
            |entry| match entry.stream_mut() {
                Some(stream) => stream.create(),
                None => Ok(()),
            },
            "create",
        )
    }

    /// Closes every open stream. Idempotent per journal.
    pub fn close(&mut self) -> Result<(), JournalError> {
        self.inner
            .fan_out_sequential(|entry| entry.close_stream(), "close")
    }

    pub fn abort(&mut self) -> Result<(), JournalError> {
        self.inner.fan_out_sequential(
            |entry| {
                entry.abort();
                Ok(())
            },
            "abort",
        )
    }

    pub fn set_ready_to_flush(&mut self) -> Result<(), JournalError> {
        self.inner.fan_out_sequential(
            |entry| match entry.stream_mut() {
                Some(stream) => stream.set_ready_to_flush(),
                None => Ok(()),
            },
            "set ready to flush",
        )
    }

    /// Durability barrier across the set; parallel so per-journal fsync
    /// latencies overlap.
    pub fn flush_and_sync(&mut self) -> Result<(), JournalError> {
        self.inner.fan_out_parallel(
            |entry| match entry.stream_mut() {
                Some(stream) => stream.flush_and_sync(),
                None => Ok(()),
            },
            "flush and sync",
        )
    }

    pub fn flush(&mut self) -> Result<(), JournalError> {
        self.inner.fan_out_parallel(
            |entry| match entry.stream_mut() {
                Some(stream) => stream.flush(),
                None => Ok(()),
            },
            "flush",
        )
    }

    /// True when any active journal wants a forced sync.
    pub fn should_force_sync(&self) -> bool {
        self.inner.snapshot().iter().any(|cell| {
            cell.lock()
                .stream()
                .map(|stream| stream.should_force_sync())
                .unwrap_or(false)
        })
    }

    /// Sync counter of the first active journal; the caller treats the value
    /// as representative of the set.
    pub fn num_sync(&self) -> u64 {
        for cell in self.inner.snapshot() {
            if let Some(stream) = cell.lock().stream() {
                return stream.num_sync();
            }
        }
        0
    }

    /// Space-separated cumulative sync times of the active journals.
    pub fn sync_times(&self) -> String {
        self.inner.sync_times()
    }
}
