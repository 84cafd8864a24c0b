//! Repository for the `history` section.

use seatplan_core::history::{HistoryConfig, HistoryEntry, HistoryLog};
use serde::Deserialize;

use super::{read_section, write_section};
use crate::error::StoreError;
use crate::store::{sections, SectionStore};

/// Stored shape of the log. Entries with an unrecognised `type` decode as
/// unknown actions and are skipped during undo/redo.
#[derive(Debug, Default, Deserialize)]
struct StoredHistory {
    #[serde(default)]
    entries: Vec<HistoryEntry>,
    #[serde(default)]
    current_index: Option<usize>,
}

pub struct HistoryRepo;

impl HistoryRepo {
    /// Load the log with the given capacity. The cursor is clamped and the
    /// oldest entries are evicted if the stored log is over capacity.
    pub fn load(store: &dyn SectionStore, config: HistoryConfig) -> Result<HistoryLog, StoreError> {
        let stored: StoredHistory = read_section(store, sections::HISTORY)?.unwrap_or_default();
        Ok(HistoryLog::from_parts(stored.entries, stored.current_index, config))
    }

    pub fn save(store: &mut dyn SectionStore, history: &HistoryLog) -> Result<(), StoreError> {
        write_section(store, sections::HISTORY, history)
    }
}
