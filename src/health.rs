//! Health arbitration: disabling failed journals and enforcing quorum.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;

use crate::error::JournalError;
use crate::executor::EntryCell;
use crate::set::{JournalSet, JournalSetInner};

/// Point-in-time availability of the set, exported for telemetry and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumStatus {
    pub total: usize,
    pub active: usize,
    pub nonlocal_active: usize,
    pub disabled: usize,
    pub min_journals: usize,
    pub min_nonlocal_journals: usize,
}

impl JournalSet {
    pub fn quorum_status(&self) -> QuorumStatus {
        self.inner.quorum_status()
    }
}

impl JournalSetInner {
    /// Disables every journal in `bad`, notifies the storage registry, and
    /// re-evaluates quorum.
    ///
    /// A clean fan-out still re-checks when a previous operation latched
    /// `force_check`: the quorum loss it detected would otherwise stay
    /// invisible to callers whose own fan-outs succeed.
    pub(crate) fn disable_and_report_errors(
        &self,
        bad: Vec<EntryCell>,
        status: &str,
    ) -> Result<(), JournalError> {
        if bad.is_empty() {
            if self.force_check.swap(false, Ordering::SeqCst) {
                self.check_journals(status)?;
            }
            return Ok(());
        }

        for cell in &bad {
            let mut entry = cell.lock();
            error!("event=journal_disabled status=\"{}\" entry={}", status, entry);
            entry.abort();
            entry.mark_disabled();
            if let Some(file) = entry.journal().as_file_backed() {
                self.registry.report_directory_error(file.storage_directory());
            }
        }
        self.check_journals(status)?;
        Ok(())
    }

    /// Walks all entries and fails with `QuorumLost` when a required journal
    /// is disabled or the survivor counts drop below the configured minimums.
    pub(crate) fn check_journals(&self, status: &str) -> Result<usize, JournalError> {
        let mut required_lost = false;
        let mut active = 0usize;
        let mut nonlocal_active = 0usize;
        for cell in self.snapshot() {
            let entry = cell.lock();
            if entry.is_disabled() && entry.is_required() {
                required_lost = true;
            } else if entry.is_resource_available() {
                active += 1;
                if entry.is_remote() || entry.is_shared() {
                    nonlocal_active += 1;
                }
            }
        }
        self.update_journal_metrics();

        if required_lost || active < self.min_journals || nonlocal_active < self.min_nonlocal_journals
        {
            self.force_check.store(true, Ordering::SeqCst);
            error!(
                "event=journal_quorum_lost status=\"{}\" required_lost={} min={} active={} \
                 min_nonlocal={} nonlocal_active={}",
                status,
                required_lost,
                self.min_journals,
                active,
                self.min_nonlocal_journals,
                nonlocal_active
            );
            return Err(JournalError::QuorumLost {
                status: status.to_string(),
                min_journals: self.min_journals,
                active,
                min_nonlocal_journals: self.min_nonlocal_journals,
                nonlocal_active,
            });
        }
        Ok(active)
    }

    /// Publishes the disabled-journal count to the storage registry.
    pub(crate) fn update_journal_metrics(&self) {
        let failed = self
            .snapshot()
            .iter()
            .filter(|cell| cell.lock().is_disabled())
            .count();
        self.registry.update_journal_metrics(failed);
    }

    pub(crate) fn quorum_status(&self) -> QuorumStatus {
        let mut status = QuorumStatus {
            total: 0,
            active: 0,
            nonlocal_active: 0,
            disabled: 0,
            min_journals: self.min_journals,
            min_nonlocal_journals: self.min_nonlocal_journals,
        };
        for cell in self.snapshot() {
            let entry = cell.lock();
            status.total += 1;
            if entry.is_disabled() {
                status.disabled += 1;
            }
            if entry.is_resource_available() {
                status.active += 1;
                if entry.is_remote() || entry.is_shared() {
                    status.nonlocal_active += 1;
                }
            }
        }
        status
    }
}
