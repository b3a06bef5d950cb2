//! Per-journal record pairing an underlying journal with its open stream.

use log::{error, info};
use std::fmt;

use crate::error::JournalError;
use crate::journal::{EditLogOutputStream, JournalManager};

/// Pairs one underlying journal with its currently open output stream and
/// the role flags fixed at registration.
///
/// A journal that fails an operation is disabled by the health arbiter: its
/// stream is aborted and dropped, and the latch only clears on the next
/// successful `start_log_segment`.
pub struct JournalEntry {
    journal: Box<dyn JournalManager>,
    stream: Option<Box<dyn EditLogOutputStream>>,
    disabled: bool,
    required: bool,
    shared: bool,
    remote: bool,
}

impl JournalEntry {
    pub fn new(journal: Box<dyn JournalManager>, required: bool, shared: bool, remote: bool) -> Self {
        Self {
            journal,
            stream: None,
            disabled: false,
            required,
            shared,
            remote,
        }
    }

    /// Opens a new segment at `txid` and clears the disabled latch.
    pub fn start_log_segment(&mut self, txid: u64) -> Result<(), JournalError> {
        if self.stream.is_some() {
            return Err(JournalError::StreamAlreadyOpen);
        }
        let stream = self.journal.start_log_segment(txid)?;
        if self.disabled {
            info!(
                "event=journal_restored journal={} txid={}",
                self.journal.locator(),
                txid
            );
        }
        self.disabled = false;
        self.stream = Some(stream);
        Ok(())
    }

    /// Closes the stream if one is open. On failure the stream is kept; the
    /// caller's error handling aborts it.
    pub fn close_stream(&mut self) -> Result<(), JournalError> {
        if let Some(stream) = self.stream.as_mut() {
            stream.close()?;
            self.stream = None;
        }
        Ok(())
    }

    /// Closes the stream and then the journal itself.
    pub fn close(&mut self) -> Result<(), JournalError> {
        self.close_stream()?;
        self.journal.close()
    }

    /// Aborts and drops the stream. Abort is best-effort: I/O failures are
    /// logged and swallowed, and the stream is released either way.
    pub fn abort(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            if let Err(err) = stream.abort() {
                error!(
                    "event=stream_abort_failed journal={} error={}",
                    self.journal.locator(),
                    err
                );
            }
        }
        self.stream = None;
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_resource_available(&self) -> bool {
        !self.disabled
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub(crate) fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Latches the disabled bit. The arbiter aborts the stream first, so a
    /// disabled entry never holds a stream.
    pub(crate) fn mark_disabled(&mut self) {
        debug_assert!(self.stream.is_none());
        self.disabled = true;
    }

    pub fn journal(&self) -> &dyn JournalManager {
        self.journal.as_ref()
    }

    pub(crate) fn journal_mut(&mut self) -> &mut dyn JournalManager {
        self.journal.as_mut()
    }

    pub(crate) fn stream(&self) -> Option<&dyn EditLogOutputStream> {
        self.stream.as_deref()
    }

    pub(crate) fn stream_mut(&mut self) -> Option<&mut Box<dyn EditLogOutputStream>> {
        self.stream.as_mut()
    }
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JournalEntry(journal={}, active={}, required={})",
            self.journal.locator(),
            self.is_active(),
            self.required
        )
    }
}
