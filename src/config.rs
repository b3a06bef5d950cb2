/// Quorum thresholds consumed when the journal set is constructed.
///
/// `min_journals` bounds the total number of writable journals the metadata
/// server tolerates dropping to; `min_nonlocal_journals` additionally demands
/// that many of the survivors live on shared or remote storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalSetOptions {
    pub min_journals: usize,
    pub min_nonlocal_journals: usize,
}

impl Default for JournalSetOptions {
    fn default() -> Self {
        Self {
            min_journals: 1,
            min_nonlocal_journals: 0,
        }
    }
}

impl JournalSetOptions {
    pub fn with_min_journals(mut self, min_journals: usize) -> Self {
        self.min_journals = min_journals;
        self
    }

    pub fn with_min_nonlocal_journals(mut self, min_nonlocal_journals: usize) -> Self {
        self.min_nonlocal_journals = min_nonlocal_journals;
        self
    }
}
