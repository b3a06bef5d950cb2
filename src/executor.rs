//! Fan-out of one operation across every journal entry, sequentially or on
//! the fixed worker pool.

use log::error;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::entry::JournalEntry;
use crate::error::JournalError;

/// Shared handle to one journal entry. The per-entry lock exists so pool
/// workers may touch disjoint entries during a single parallel fan-out; the
/// caller still serializes whole operations against each other.
pub(crate) type EntryCell = Arc<Mutex<JournalEntry>>;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool used by parallel fan-outs.
///
/// Sized once when the journal set is constructed. Tasks never outlive the
/// fan-out that submitted them: every submission is joined through a result
/// channel before the fan-out returns.
pub(crate) struct WorkerPool {
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl WorkerPool {
    pub(crate) fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Task>();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut workers = Vec::with_capacity(size);
        for _ in 0..size {
            let receiver = Arc::clone(&receiver);
            workers.push(thread::spawn(move || loop {
                let task = receiver.lock().recv();
                match task {
                    Ok(task) => task(),
                    Err(_) => break,
                }
            }));
        }
        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    pub(crate) fn submit(&self, task: Task) -> Result<(), JournalError> {
        match self.sender.lock().as_ref() {
            Some(sender) => sender
                .send(task)
                .map_err(|_| JournalError::InternalPool("worker pool channel closed".to_string())),
            None => Err(JournalError::InternalPool(
                "worker pool already shut down".to_string(),
            )),
        }
    }

    /// Stops accepting tasks and joins every worker. Idempotent.
    pub(crate) fn shutdown(&self) {
        self.sender.lock().take();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if handle.join().is_err() {
                error!("event=journal_worker_panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Applies `op` to every entry in insertion order, never short-circuiting.
/// Returns the entries whose application failed.
pub(crate) fn apply_sequential<F>(entries: &[EntryCell], op: F, status: &str) -> Vec<EntryCell>
where
    F: Fn(&mut JournalEntry) -> Result<(), JournalError>,
{
    let mut bad = Vec::new();
    for cell in entries {
        let mut entry = cell.lock();
        if let Err(err) = op(&mut entry) {
            error!(
                "event=journal_op_failed status=\"{}\" journal={} error={}",
                status,
                entry.journal().locator(),
                err
            );
            drop(entry);
            bad.push(Arc::clone(cell));
        }
    }
    bad
}

/// Applies `op` to every entry via the worker pool and joins all tasks.
///
/// Every entry is attempted exactly once; a lost worker or closed pool is an
/// `InternalPool` failure because it would break that property.
pub(crate) fn apply_parallel<F>(
    pool: &WorkerPool,
    entries: &[EntryCell],
    op: F,
    status: &str,
) -> Result<Vec<EntryCell>, JournalError>
where
    F: Fn(&mut JournalEntry) -> Result<(), JournalError> + Send + Sync + 'static,
{
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let op = Arc::new(op);
    let (results_tx, results_rx) = mpsc::channel::<(usize, Result<(), JournalError>)>();
    for (index, cell) in entries.iter().enumerate() {
        let cell = Arc::clone(cell);
        let op = Arc::clone(&op);
        let results_tx = results_tx.clone();
        pool.submit(Box::new(move || {
            let result = {
                let mut entry = cell.lock();
                op(&mut entry)
            };
            let _ = results_tx.send((index, result));
        }))?;
    }
    drop(results_tx);

    let mut bad = Vec::new();
    for _ in 0..entries.len() {
        let (index, result) = results_rx.recv().map_err(|_| {
            JournalError::InternalPool(format!("worker lost while {status}"))
        })?;
        if let Err(err) = result {
            let cell = &entries[index];
            error!(
                "event=journal_op_failed status=\"{}\" journal={} error={}",
                status,
                cell.lock().journal().locator(),
                err
            );
            bad.push(Arc::clone(cell));
        }
    }
    Ok(bad)
}
