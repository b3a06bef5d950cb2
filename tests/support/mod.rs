//! Fake journals, streams, and a recording registry shared by the
//! integration suites.
#![allow(dead_code)]

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fanlog::{
    EditLogInputStream, EditLogOutputStream, EditRecord, FileBackedJournal, JournalError,
    JournalManager, NamespaceInfo, RemoteEditLog, StorageHealthRegistry, StorageLocationType,
};

pub fn io_error(detail: &str) -> JournalError {
    JournalError::Io(std::io::Error::new(std::io::ErrorKind::Other, detail.to_string()))
}

/// What a fake journal reports for `number_of_transactions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnCount {
    Count(u64),
    Corrupt,
    Unreadable,
}

impl Default for TxnCount {
    fn default() -> Self {
        TxnCount::Count(0)
    }
}

/// Observable state of one fake journal: what it saw, and which operations
/// it is told to fail.
#[derive(Default)]
pub struct JournalProbe {
    pub started_segments: Vec<u64>,
    pub finalized: Vec<(u64, u64)>,
    pub purged: Vec<u64>,
    pub recoveries: u32,
    pub formats: u32,
    pub journal_closed: bool,

    pub writes: Vec<u64>,
    pub creates: u32,
    pub ready_marks: u32,
    pub flushes: u32,
    pub syncs: u32,
    pub stream_closes: u32,
    pub stream_aborts: u32,

    pub fail_start_segment: bool,
    pub fail_finalize: bool,
    pub fail_write: bool,
    pub fail_flush: bool,
    pub fail_flush_and_sync: bool,
    pub fail_stream_close: bool,
    pub fail_purge: bool,
    pub fail_recover: bool,
    pub fail_journal_close: bool,
    pub fail_format: bool,
    pub fail_manifest: bool,

    pub txn_count: TxnCount,
    pub manifest_logs: Vec<RemoteEditLog>,
    pub num_sync: u64,
    pub total_sync_time_ms: u64,
    pub force_sync: bool,
}

pub type ProbeHandle = Arc<Mutex<JournalProbe>>;

pub struct FakeJournal {
    locator: String,
    dir: Option<PathBuf>,
    probe: ProbeHandle,
}

impl FakeJournal {
    pub fn new(locator: &str) -> (Box<dyn JournalManager>, ProbeHandle) {
        Self::build(locator, None)
    }

    pub fn file_backed(locator: &str, dir: &Path) -> (Box<dyn JournalManager>, ProbeHandle) {
        Self::build(locator, Some(dir.to_path_buf()))
    }

    fn build(locator: &str, dir: Option<PathBuf>) -> (Box<dyn JournalManager>, ProbeHandle) {
        let probe: ProbeHandle = Arc::new(Mutex::new(JournalProbe::default()));
        let journal = FakeJournal {
            locator: locator.to_string(),
            dir,
            probe: Arc::clone(&probe),
        };
        (Box::new(journal), probe)
    }
}

impl JournalManager for FakeJournal {
    fn start_log_segment(
        &mut self,
        txid: u64,
    ) -> Result<Box<dyn EditLogOutputStream>, JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_start_segment {
            return Err(io_error("cannot start segment"));
        }
        probe.started_segments.push(txid);
        Ok(Box::new(FakeStream {
            probe: Arc::clone(&self.probe),
        }))
    }

    fn finalize_log_segment(
        &mut self,
        first_txid: u64,
        last_txid: u64,
    ) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_finalize {
            return Err(io_error("cannot finalize"));
        }
        probe.finalized.push((first_txid, last_txid));
        Ok(())
    }

    fn close(&mut self) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_journal_close {
            return Err(io_error("cannot close"));
        }
        probe.journal_closed = true;
        Ok(())
    }

    fn number_of_transactions(&self, from_txid: u64) -> Result<u64, JournalError> {
        match self.probe.lock().txn_count {
            TxnCount::Count(count) => Ok(count),
            TxnCount::Corrupt => Err(JournalError::Corruption {
                from_txid,
                detail: "trailing garbage".to_string(),
            }),
            TxnCount::Unreadable => Err(io_error("cannot read")),
        }
    }

    fn input_stream(&self, from_txid: u64) -> Result<Box<dyn EditLogInputStream>, JournalError> {
        Ok(Box::new(FakeInputStream {
            name: self.locator.clone(),
            first_txid: from_txid,
        }))
    }

    fn purge_logs_older_than(&mut self, min_txid_to_keep: u64) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_purge {
            return Err(io_error("cannot purge"));
        }
        probe.purged.push(min_txid_to_keep);
        Ok(())
    }

    fn recover_unfinalized_segments(&mut self) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_recover {
            return Err(io_error("cannot recover"));
        }
        probe.recoveries += 1;
        Ok(())
    }

    fn format(&mut self, _ns_info: &NamespaceInfo) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_format {
            return Err(io_error("cannot format"));
        }
        probe.formats += 1;
        Ok(())
    }

    fn locator(&self) -> &str {
        &self.locator
    }

    fn as_file_backed(&self) -> Option<&dyn FileBackedJournal> {
        self.dir.as_ref().map(|_| self as &dyn FileBackedJournal)
    }
}

impl FileBackedJournal for FakeJournal {
    fn storage_directory(&self) -> &Path {
        self.dir.as_deref().expect("file-backed fake has a directory")
    }

    fn edit_log_manifest(&self, _from_txid: u64) -> Result<Vec<RemoteEditLog>, JournalError> {
        let probe = self.probe.lock();
        if probe.fail_manifest {
            return Err(io_error("cannot list segments"));
        }
        Ok(probe.manifest_logs.clone())
    }
}

struct FakeStream {
    probe: ProbeHandle,
}

impl EditLogOutputStream for FakeStream {
    fn write(&mut self, record: &EditRecord) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_write {
            return Err(io_error("write failed"));
        }
        probe.writes.push(record.txid);
        Ok(())
    }

    fn create(&mut self) -> Result<(), JournalError> {
        self.probe.lock().creates += 1;
        Ok(())
    }

    fn set_ready_to_flush(&mut self) -> Result<(), JournalError> {
        self.probe.lock().ready_marks += 1;
        Ok(())
    }

    fn flush_and_sync(&mut self) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_flush_and_sync {
            return Err(io_error("sync failed"));
        }
        probe.syncs += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_flush {
            return Err(io_error("flush failed"));
        }
        probe.flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), JournalError> {
        let mut probe = self.probe.lock();
        if probe.fail_stream_close {
            return Err(io_error("stream close failed"));
        }
        probe.stream_closes += 1;
        Ok(())
    }

    fn abort(&mut self) -> Result<(), JournalError> {
        self.probe.lock().stream_aborts += 1;
        Ok(())
    }

    fn should_force_sync(&self) -> bool {
        self.probe.lock().force_sync
    }

    fn num_sync(&self) -> u64 {
        self.probe.lock().num_sync
    }

    fn total_sync_time_ms(&self) -> u64 {
        self.probe.lock().total_sync_time_ms
    }
}

#[derive(Debug)]
pub struct FakeInputStream {
    name: String,
    first_txid: u64,
}

impl EditLogInputStream for FakeInputStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_txid(&self) -> u64 {
        self.first_txid
    }
}

/// Registry fake recording every notification it receives.
#[derive(Default)]
pub struct RecordingRegistry {
    pub dir_errors: Mutex<Vec<PathBuf>>,
    pub metric_updates: Mutex<Vec<usize>>,
    local_dirs: Mutex<Vec<PathBuf>>,
}

impl RecordingRegistry {
    pub fn mark_local(&self, dir: &Path) {
        self.local_dirs.lock().push(dir.to_path_buf());
    }
}

impl StorageHealthRegistry for RecordingRegistry {
    fn report_directory_error(&self, dir: &Path) {
        self.dir_errors.lock().push(dir.to_path_buf());
    }

    fn update_journal_metrics(&self, failed_journals: usize) {
        self.metric_updates.lock().push(failed_journals);
    }

    fn is_preferred(&self, location: StorageLocationType, dir: &Path) -> bool {
        matches!(location, StorageLocationType::Local)
            && self.local_dirs.lock().iter().any(|local| local == dir)
    }
}
