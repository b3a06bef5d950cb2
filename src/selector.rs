//! Picks the single best journal to read edits from.

use crate::error::JournalError;
use crate::executor::EntryCell;
use crate::journal::{EditLogInputStream, JournalManager, StorageHealthRegistry, StorageLocationType};

/// Selects the journal with the most contiguous transactions readable from
/// `from_txid` and opens its input stream.
///
/// A journal reporting corruption is remembered but skipped: it holds later
/// transactions it cannot serve from here, which only matters if nobody else
/// can serve them either. Any other read error skips the journal silently.
/// Equal positive counts prefer a journal on local storage.
pub(crate) fn select_input_stream(
    entries: &[EntryCell],
    registry: &dyn StorageHealthRegistry,
    from_txid: u64,
) -> Result<Option<Box<dyn EditLogInputStream>>, JournalError> {
    let mut best: Option<usize> = None;
    let mut best_count = 0u64;
    let mut best_local = false;
    let mut corruption: Option<JournalError> = None;

    for (index, cell) in entries.iter().enumerate() {
        let entry = cell.lock();
        let candidate = entry.journal();
        let count = match candidate.number_of_transactions(from_txid) {
            Ok(count) => count,
            Err(err) if err.is_corruption() => {
                corruption = Some(err);
                continue;
            }
            Err(_) => continue,
        };
        let local = is_local(candidate, registry);
        if count > best_count || (count > 0 && count == best_count && local && !best_local) {
            best = Some(index);
            best_count = count;
            best_local = local;
        }
    }

    match best {
        Some(index) => {
            let entry = entries[index].lock();
            Ok(Some(entry.journal().input_stream(from_txid)?))
        }
        None => match corruption {
            Some(source) => Err(JournalError::NoUsableLogs {
                from_txid,
                source: Box::new(source),
            }),
            None => Ok(None),
        },
    }
}

fn is_local(journal: &dyn JournalManager, registry: &dyn StorageHealthRegistry) -> bool {
    match journal.as_file_backed() {
        Some(file) => registry.is_preferred(StorageLocationType::Local, file.storage_directory()),
        None => false,
    }
}
