//! Segment descriptors and the gap-respecting manifest merge.

use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One segment of the edit log as advertised by a single journal.
///
/// Several journals may advertise the same segment with different extents
/// when one of them crashed mid-segment; the ordering below decides which
/// copy a manifest trusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEditLog {
    pub start_txid: u64,
    pub end_txid: u64,
    pub in_progress: bool,
}

impl RemoteEditLog {
    pub fn new(start_txid: u64, end_txid: u64, in_progress: bool) -> Self {
        Self {
            start_txid,
            end_txid,
            in_progress,
        }
    }
}

impl Ord for RemoteEditLog {
    /// Finalized segments outrank in-progress ones; within the same state the
    /// longer extent wins. `start_txid` breaks remaining ties stably.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .in_progress
            .cmp(&self.in_progress)
            .then(self.end_txid.cmp(&other.end_txid))
            .then(self.start_txid.cmp(&other.start_txid))
    }
}

impl PartialOrd for RemoteEditLog {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered, gap-free segment coverage starting at some transaction id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEditLogManifest {
    pub logs: Vec<RemoteEditLog>,
}

impl RemoteEditLogManifest {
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Merges segment listings from several journals into the longest gap-free
/// coverage starting at `from_txid`.
///
/// A gap invalidates everything accumulated before it: a consumer could not
/// replay across the hole, so the manifest restarts at the next known
/// segment.
pub(crate) fn build_manifest(all_logs: Vec<RemoteEditLog>, from_txid: u64) -> RemoteEditLogManifest {
    let mut by_start: BTreeMap<u64, Vec<RemoteEditLog>> = BTreeMap::new();
    for log in all_logs {
        by_start.entry(log.start_txid).or_default().push(log);
    }

    let mut logs: Vec<RemoteEditLog> = Vec::new();
    let mut cursor = from_txid;
    loop {
        match by_start.get(&cursor) {
            None => {
                // No segment starts exactly at the cursor. Resume at the next
                // known start, dropping whatever was collected before the gap.
                match by_start.range(cursor..).next().map(|(start, _)| *start) {
                    None => break,
                    Some(next_start) => {
                        debug!("event=manifest_gap at={cursor} resume={next_start}");
                        logs.clear();
                        cursor = next_start;
                    }
                }
            }
            Some(group) => match group.iter().copied().max() {
                None => break,
                Some(best) => {
                    logs.push(best);
                    cursor = best.end_txid + 1;
                }
            },
        }
    }
    RemoteEditLogManifest { logs }
}
