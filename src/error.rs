use std::io;
use thiserror::Error;

/// Errors surfaced by the journal set and its collaborators.
///
/// Failures raised inside a fan-out are not returned directly: they disable
/// the offending journal and only escalate as `QuorumLost` when the surviving
/// set no longer satisfies the configured minimums.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("journal reports corruption reading from txid {from_txid}: {detail}")]
    Corruption { from_txid: u64, detail: String },

    #[error("no usable logs for txid {from_txid}")]
    NoUsableLogs {
        from_txid: u64,
        #[source]
        source: Box<JournalError>,
    },

    #[error("stream already open")]
    StreamAlreadyOpen,

    #[error(
        "{status} failed for too many journals: minimum {min_journals} current {active}, \
         non-local minimum {min_nonlocal_journals} current {nonlocal_active}"
    )]
    QuorumLost {
        status: String,
        min_journals: usize,
        active: usize,
        min_nonlocal_journals: usize,
        nonlocal_active: usize,
    },

    #[error("journal worker pool failure: {0}")]
    InternalPool(String),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl JournalError {
    pub fn is_corruption(&self) -> bool {
        matches!(self, JournalError::Corruption { .. })
    }

    pub fn is_quorum_lost(&self) -> bool {
        matches!(self, JournalError::QuorumLost { .. })
    }
}
