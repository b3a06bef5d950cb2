//! The journal set facade: lifecycle, membership, and read-path wiring.

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::JournalSetOptions;
use crate::entry::JournalEntry;
use crate::error::JournalError;
use crate::executor::{self, EntryCell, WorkerPool};
use crate::journal::{EditLogInputStream, JournalManager, NamespaceInfo, StorageHealthRegistry};
use crate::manifest::{self, RemoteEditLogManifest};
use crate::selector;
use crate::stream::JournalSetOutputStream;

/// Fans out edit-log operations to every registered journal, tracks
/// per-journal health, and fails operations once too few journals survive.
///
/// None of the methods are internally synchronized against each other: the
/// metadata server serializes mutators, exactly as it serializes writes into
/// the aggregate output stream.
pub struct JournalSet {
    pub(crate) inner: Arc<JournalSetInner>,
}

pub(crate) struct JournalSetInner {
    pub(crate) journals: RwLock<Vec<EntryCell>>,
    pub(crate) min_journals: usize,
    pub(crate) min_nonlocal_journals: usize,
    pub(crate) force_check: AtomicBool,
    pub(crate) registry: Arc<dyn StorageHealthRegistry>,
    pub(crate) pool: WorkerPool,
}

impl JournalSet {
    /// `expected_journals` sizes the worker pool used by parallel fan-outs.
    pub fn new(
        options: JournalSetOptions,
        registry: Arc<dyn StorageHealthRegistry>,
        expected_journals: usize,
    ) -> Self {
        Self {
            inner: Arc::new(JournalSetInner {
                journals: RwLock::new(Vec::new()),
                min_journals: options.min_journals,
                min_nonlocal_journals: options.min_nonlocal_journals,
                force_check: AtomicBool::new(false),
                registry,
                pool: WorkerPool::new(expected_journals),
            }),
        }
    }

    /// Appends a journal with its role flags. Insertion order is preserved
    /// and is the order every sequential fan-out observes.
    pub fn add(&mut self, journal: Box<dyn JournalManager>, required: bool, shared: bool, remote: bool) {
        let entry = JournalEntry::new(journal, required, shared, remote);
        self.inner.journals.write().push(Arc::new(Mutex::new(entry)));
        self.inner.update_journal_metrics();
    }

    /// Removes the journal whose locator matches, aborting its stream first.
    /// Returns whether a journal was found.
    pub fn remove(&mut self, locator: &str) -> bool {
        let removed = {
            let mut journals = self.inner.journals.write();
            let index = journals
                .iter()
                .position(|cell| cell.lock().journal().locator() == locator);
            index.map(|index| journals.remove(index))
        };
        let found = match removed {
            Some(cell) => {
                cell.lock().abort();
                true
            }
            None => false,
        };
        self.inner.update_journal_metrics();
        found
    }

    pub fn is_empty(&self) -> bool {
        self.inner.journals.read().is_empty()
    }

    /// Locators of all registered journals, in insertion order.
    pub fn journal_locators(&self) -> Vec<String> {
        self.inner
            .snapshot()
            .iter()
            .map(|cell| cell.lock().journal().locator().to_string())
            .collect()
    }

    /// Opens a segment at `txid` on every journal and returns the aggregate
    /// stream multiplexing onto the set.
    pub fn start_log_segment(&mut self, txid: u64) -> Result<JournalSetOutputStream, JournalError> {
        self.inner.fan_out_parallel(
            move |entry| entry.start_log_segment(txid),
            &format!("starting log segment {txid}"),
        )?;
        Ok(JournalSetOutputStream::new(Arc::clone(&self.inner)))
    }

    /// Closes the open stream and finalizes the segment on every journal that
    /// is currently writing.
    pub fn finalize_log_segment(
        &mut self,
        first_txid: u64,
        last_txid: u64,
    ) -> Result<(), JournalError> {
        self.inner.fan_out_parallel(
            move |entry| {
                if entry.is_active() {
                    entry.close_stream()?;
                    entry.journal_mut().finalize_log_segment(first_txid, last_txid)?;
                }
                Ok(())
            },
            &format!("finalize log segment {first_txid}, {last_txid}"),
        )
    }

    /// Closes every journal, then shuts the worker pool down regardless of
    /// the outcome.
    pub fn close(&mut self) -> Result<(), JournalError> {
        let result = self
            .inner
            .fan_out_parallel(|entry| entry.close(), "close journal");
        self.inner.pool.shutdown();
        result
    }

    pub fn purge_logs_older_than(&mut self, min_txid_to_keep: u64) -> Result<(), JournalError> {
        self.inner.fan_out_parallel(
            move |entry| entry.journal_mut().purge_logs_older_than(min_txid_to_keep),
            &format!("purge logs older than {min_txid_to_keep}"),
        )
    }

    pub fn recover_unfinalized_segments(&mut self) -> Result<(), JournalError> {
        self.inner.fan_out_parallel(
            |entry| entry.journal_mut().recover_unfinalized_segments(),
            "recover unfinalized segments",
        )
    }

    /// Picks the single best journal to read from `from_txid`. `Ok(None)`
    /// means no journal has transactions there and none reported corruption.
    pub fn input_stream(
        &self,
        from_txid: u64,
    ) -> Result<Option<Box<dyn EditLogInputStream>>, JournalError> {
        selector::select_input_stream(
            &self.inner.snapshot(),
            self.inner.registry.as_ref(),
            from_txid,
        )
    }

    /// Largest contiguous transaction count any active journal can serve from
    /// `from_txid`.
    pub fn number_of_transactions(&self, from_txid: u64) -> Result<u64, JournalError> {
        let mut num = 0;
        for cell in self.inner.snapshot() {
            let entry = cell.lock();
            if entry.is_active() {
                num = num.max(entry.journal().number_of_transactions(from_txid)?);
            }
        }
        Ok(num)
    }

    /// Merged manifest of edit-log segments available from `from_txid`,
    /// drawn from the file-backed journals only.
    pub fn edit_log_manifest(&self, from_txid: u64) -> RemoteEditLogManifest {
        let mut all_logs = Vec::new();
        for cell in self.inner.snapshot() {
            let entry = cell.lock();
            if let Some(file) = entry.journal().as_file_backed() {
                match file.edit_log_manifest(from_txid) {
                    Ok(mut logs) => all_logs.append(&mut logs),
                    Err(err) => warn!(
                        "event=manifest_listing_failed journal={} error={}",
                        entry.journal().locator(),
                        err
                    ),
                }
            }
        }
        let manifest = manifest::build_manifest(all_logs, from_txid);
        debug!(
            "event=manifest_generated from={} segments={}",
            from_txid,
            manifest.logs.len()
        );
        manifest
    }

    pub fn is_shared_journal_available(&self) -> bool {
        self.inner.snapshot().iter().any(|cell| {
            let entry = cell.lock();
            entry.is_shared() && entry.is_resource_available()
        })
    }

    /// Formats every journal that is not file-backed. Errors propagate
    /// directly: this runs before the set is live, where silent degradation
    /// would format an incomplete set.
    pub fn format_non_file_journals(&mut self, ns_info: &NamespaceInfo) -> Result<(), JournalError> {
        for cell in self.inner.snapshot() {
            let mut entry = cell.lock();
            if entry.journal().as_file_backed().is_none() {
                entry.journal_mut().format(ns_info)?;
            }
        }
        Ok(())
    }

    /// Space-separated cumulative sync times of the active journals.
    pub fn sync_times(&self) -> String {
        self.inner.sync_times()
    }

    // The metadata server drives the following on the underlying journals
    // directly, never through the set.

    pub fn format(&mut self, _ns_info: &NamespaceInfo) -> Result<(), JournalError> {
        Err(JournalError::Unsupported("format"))
    }

    pub fn has_some_data(&self) -> Result<bool, JournalError> {
        Err(JournalError::Unsupported("has_some_data"))
    }

    pub fn is_segment_in_progress(&self, _start_txid: u64) -> Result<bool, JournalError> {
        Err(JournalError::Unsupported("is_segment_in_progress"))
    }

    pub fn validated_input_stream(
        &self,
        _from_txid: u64,
        _validate_in_progress_segments: bool,
    ) -> Result<Option<Box<dyn EditLogInputStream>>, JournalError> {
        Err(JournalError::Unsupported("validated_input_stream"))
    }
}

impl JournalSetInner {
    /// The live entry sequence at the start of a fan-out.
    pub(crate) fn snapshot(&self) -> Vec<EntryCell> {
        self.journals.read().iter().map(Arc::clone).collect()
    }

    pub(crate) fn fan_out_sequential<F>(&self, op: F, status: &str) -> Result<(), JournalError>
    where
        F: Fn(&mut JournalEntry) -> Result<(), JournalError>,
    {
        let entries = self.snapshot();
        let bad = executor::apply_sequential(&entries, op, status);
        self.disable_and_report_errors(bad, status)
    }

    pub(crate) fn fan_out_parallel<F>(&self, op: F, status: &str) -> Result<(), JournalError>
    where
        F: Fn(&mut JournalEntry) -> Result<(), JournalError> + Send + Sync + 'static,
    {
        let entries = self.snapshot();
        let bad = executor::apply_parallel(&self.pool, &entries, op, status)?;
        self.disable_and_report_errors(bad, status)
    }

    pub(crate) fn sync_times(&self) -> String {
        let mut buf = String::new();
        for cell in self.snapshot() {
            let entry = cell.lock();
            if let Some(stream) = entry.stream() {
                buf.push_str(&stream.total_sync_time_ms().to_string());
                buf.push(' ');
            }
        }
        buf
    }
}
