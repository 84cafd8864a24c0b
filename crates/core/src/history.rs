//! Linear undo/redo log.
//!
//! Every state-changing command appends one [`HistoryEntry`] whose
//! [`HistoryAction`] carries enough data to reverse and replay it. The log
//! itself only moves the cursor; the effects are applied by a
//! [`HistoryTarget`].
//!
//! # Invariants
//!
//! 1. Entries at index `<= cursor` are applied, later entries are redoable.
//! 2. Appending prunes every entry after the cursor.
//! 3. `len() <= capacity` after any operation; eviction slides the cursor.
//!
//! ```text
//! record(e4) with cursor at e2
//! [e0, e1, e2, e3]      cursor = 2
//! [e0, e1, e2, e4]      cursor = 3   (e3 pruned)
//! ```

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constraint::Constraint;
use crate::error::CoreError;
use crate::preferences::SeatingPreferences;
use crate::seating::SeatingMap;
use crate::student::Student;
use crate::types::{DeskId, StudentId, Timestamp};

/// Default number of entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Entries listed in [`HistorySummary::recent`].
pub const RECENT_ENTRIES: usize = 5;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Payload of a history entry, tagged by `"type"` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryAction {
    StudentAdded {
        student: Student,
    },
    StudentRemoved {
        /// Position in the roster, so undo restores the original order.
        index: usize,
        student: Student,
        desk: Option<DeskId>,
    },
    StudentUpdated {
        before: Student,
        after: Student,
    },
    RosterCleared {
        students: Vec<Student>,
        previous_seating: SeatingMap,
    },
    StudentMoved {
        student: StudentId,
        desk: DeskId,
        /// Absent in entries written before snapshots were captured.
        #[serde(default)]
        previous_seating: Option<SeatingMap>,
    },
    DeskVacated {
        desk: DeskId,
        student: StudentId,
        previous_seating: SeatingMap,
    },
    SeatingGenerated {
        previous: SeatingMap,
        seating: SeatingMap,
    },
    SeatingCleared {
        previous: SeatingMap,
    },
    SeatingImported {
        previous: SeatingMap,
        seating: SeatingMap,
    },
    ConstraintAdded {
        constraint: Constraint,
    },
    ConstraintRemoved {
        index: usize,
        constraint: Constraint,
    },
    LayoutSwitched {
        from: String,
        to: String,
        previous_seating: SeatingMap,
        seating: SeatingMap,
    },
    PreferencesChanged {
        before: SeatingPreferences,
        after: SeatingPreferences,
    },
    /// A `type` this build does not know. Skipped on undo and redo.
    #[serde(other)]
    Unknown,
}

impl HistoryAction {
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryAction::StudentAdded { .. } => "student_added",
            HistoryAction::StudentRemoved { .. } => "student_removed",
            HistoryAction::StudentUpdated { .. } => "student_updated",
            HistoryAction::RosterCleared { .. } => "roster_cleared",
            HistoryAction::StudentMoved { .. } => "student_moved",
            HistoryAction::DeskVacated { .. } => "desk_vacated",
            HistoryAction::SeatingGenerated { .. } => "seating_generated",
            HistoryAction::SeatingCleared { .. } => "seating_cleared",
            HistoryAction::SeatingImported { .. } => "seating_imported",
            HistoryAction::ConstraintAdded { .. } => "constraint_added",
            HistoryAction::ConstraintRemoved { .. } => "constraint_removed",
            HistoryAction::LayoutSwitched { .. } => "layout_switched",
            HistoryAction::PreferencesChanged { .. } => "preferences_changed",
            HistoryAction::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: Timestamp,
    pub description: String,
    pub action: HistoryAction,
}

impl HistoryEntry {
    pub fn new(description: impl Into<String>, action: HistoryAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            description: description.into(),
            action,
        }
    }
}

/// Applies the inverse or forward effect of an action to some state.
pub trait HistoryTarget {
    fn apply_undo(&mut self, action: &HistoryAction) -> Result<(), CoreError>;
    fn apply_redo(&mut self, action: &HistoryAction) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of entries. Values below 1 are treated as 1.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Brief view of one entry for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub index: usize,
    pub kind: &'static str,
    pub description: String,
    pub timestamp: Timestamp,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub current_index: Option<usize>,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Up to [`RECENT_ENTRIES`] newest entries, newest first.
    pub recent: Vec<EntrySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    current_index: Option<usize>,
    #[serde(skip)]
    config: HistoryConfig,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryLog {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            current_index: None,
            config,
        }
    }

    /// Rebuild a log from persisted parts. An out-of-range cursor is clamped
    /// to the last entry and the capacity is enforced.
    pub fn from_parts(
        entries: Vec<HistoryEntry>,
        current_index: Option<usize>,
        config: HistoryConfig,
    ) -> Self {
        let mut log = Self {
            entries: entries.into(),
            current_index: None,
            config,
        };
        log.current_index = match current_index {
            Some(i) if i >= log.entries.len() => {
                tracing::warn!(cursor = i, len = log.entries.len(), "History cursor out of range, clamping");
                log.entries.len().checked_sub(1)
            }
            other => other,
        };
        log.enforce_capacity();
        log
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// Change the capacity, evicting the oldest entries if needed.
    pub fn set_config(&mut self, config: HistoryConfig) {
        self.config = config;
        self.enforce_capacity();
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn can_undo(&self) -> bool {
        self.current_index.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.next_index() < self.entries.len()
    }

    /// Build an entry and append it. See [`HistoryLog::add_entry`].
    pub fn record(&mut self, description: impl Into<String>, action: HistoryAction) -> &HistoryEntry {
        self.add_entry(HistoryEntry::new(description, action))
    }

    /// Append `entry`, pruning redoable entries and evicting the oldest ones
    /// beyond capacity.
    pub fn add_entry(&mut self, entry: HistoryEntry) -> &HistoryEntry {
        self.entries.truncate(self.next_index());
        tracing::debug!(kind = entry.action.kind(), description = %entry.description, "History entry added");
        self.entries.push_back(entry);
        self.current_index = Some(self.entries.len() - 1);
        self.enforce_capacity();
        &self.entries[self.entries.len() - 1]
    }

    /// Reverse the entry at the cursor and step back. Returns the undone
    /// entry, or `None` when nothing is applied.
    pub fn undo<T: HistoryTarget + ?Sized>(
        &mut self,
        target: &mut T,
    ) -> Result<Option<&HistoryEntry>, CoreError> {
        let Some(index) = self.current_index else {
            return Ok(None);
        };
        let entry = &self.entries[index];
        match &entry.action {
            HistoryAction::Unknown => {
                tracing::warn!(id = %entry.id, description = %entry.description, "Skipping undo of unknown history entry");
            }
            action => target.apply_undo(action)?,
        }
        self.current_index = index.checked_sub(1);
        Ok(self.entries.get(index))
    }

    /// Step forward and replay the entry now at the cursor. Returns the redone
    /// entry, or `None` when nothing is redoable.
    pub fn redo<T: HistoryTarget + ?Sized>(
        &mut self,
        target: &mut T,
    ) -> Result<Option<&HistoryEntry>, CoreError> {
        let index = self.next_index();
        let Some(entry) = self.entries.get(index) else {
            return Ok(None);
        };
        match &entry.action {
            HistoryAction::Unknown => {
                tracing::warn!(id = %entry.id, description = %entry.description, "Skipping redo of unknown history entry");
            }
            action => target.apply_redo(action)?,
        }
        self.current_index = Some(index);
        Ok(self.entries.get(index))
    }

    /// Undo or redo one step at a time until the cursor reaches `target`
    /// (`None` means "before the first entry"). Out-of-range targets are
    /// ignored. Returns the number of steps taken.
    pub fn jump_to<T: HistoryTarget + ?Sized>(
        &mut self,
        target: Option<usize>,
        state: &mut T,
    ) -> Result<usize, CoreError> {
        if matches!(target, Some(i) if i >= self.entries.len()) {
            tracing::debug!(?target, len = self.entries.len(), "Ignoring out-of-range history jump");
            return Ok(0);
        }
        let mut steps = 0;
        while self.current_index > target {
            self.undo(state)?;
            steps += 1;
        }
        while self.current_index < target {
            self.redo(state)?;
            steps += 1;
        }
        Ok(steps)
    }

    /// Drop every entry. State is left untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = None;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.current_index
            .and_then(|i| self.entries.get(i))
            .map(|e| e.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.entries
            .get(self.next_index())
            .map(|e| e.description.as_str())
    }

    pub fn summary(&self) -> HistorySummary {
        let recent = self
            .entries
            .iter()
            .enumerate()
            .rev()
            .take(RECENT_ENTRIES)
            .map(|(index, entry)| EntrySummary {
                index,
                kind: entry.action.kind(),
                description: entry.description.clone(),
                timestamp: entry.timestamp,
                applied: Some(index) <= self.current_index,
            })
            .collect();
        HistorySummary {
            total: self.entries.len(),
            current_index: self.current_index,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            recent,
        }
    }

    fn next_index(&self) -> usize {
        self.current_index.map_or(0, |i| i + 1)
    }

    fn enforce_capacity(&mut self) {
        let capacity = self.config.capacity.max(1);
        while self.entries.len() > capacity {
            if let Some(evicted) = self.entries.pop_front() {
                tracing::debug!(description = %evicted.description, "History entry evicted");
            }
            self.current_index = self.current_index.and_then(|i| i.checked_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Records which descriptions were undone and redone, via the seating
    /// payload's length as a marker.
    #[derive(Default)]
    struct Recorder {
        applied: Vec<usize>,
        fail_next: bool,
    }

    impl HistoryTarget for Recorder {
        fn apply_undo(&mut self, action: &HistoryAction) -> Result<(), CoreError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(CoreError::Internal("boom".into()));
            }
            if let HistoryAction::SeatingCleared { previous } = action {
                assert_eq!(self.applied.pop(), Some(previous.len()));
            }
            Ok(())
        }

        fn apply_redo(&mut self, action: &HistoryAction) -> Result<(), CoreError> {
            if let HistoryAction::SeatingCleared { previous } = action {
                self.applied.push(previous.len());
            }
            Ok(())
        }
    }

    fn marker(n: usize) -> HistoryAction {
        let seating = SeatingMap::from_pairs((0..n).map(|i| (format!("d-{i}"), Uuid::new_v4())));
        HistoryAction::SeatingCleared { previous: seating }
    }

    fn log_with(n: usize, capacity: usize) -> (HistoryLog, Recorder) {
        let mut log = HistoryLog::new(HistoryConfig { capacity });
        let mut recorder = Recorder::default();
        for i in 0..n {
            let action = marker(i);
            recorder.apply_redo(&action).unwrap();
            log.record(format!("step {i}"), action);
        }
        (log, recorder)
    }

    // -----------------------------------------------------------------------
    // Cursor movement
    // -----------------------------------------------------------------------

    #[test]
    fn undo_and_redo_walk_the_cursor() {
        let (mut log, mut rec) = log_with(3, 10);
        assert_eq!(log.current_index(), Some(2));
        assert!(!log.can_redo());

        let undone = log.undo(&mut rec).unwrap().unwrap();
        assert_eq!(undone.description, "step 2");
        assert_eq!(log.current_index(), Some(1));
        assert_eq!(log.redo_description(), Some("step 2"));

        let redone = log.redo(&mut rec).unwrap().unwrap();
        assert_eq!(redone.description, "step 2");
        assert_eq!(rec.applied, vec![0, 1, 2]);
    }

    #[test]
    fn undo_on_empty_and_redo_at_end_are_no_ops() {
        let mut log = HistoryLog::default();
        let mut rec = Recorder::default();
        assert_matches!(log.undo(&mut rec), Ok(None));
        assert_matches!(log.redo(&mut rec), Ok(None));

        let (mut log, mut rec) = log_with(1, 10);
        assert_matches!(log.redo(&mut rec), Ok(None));
        assert!(log.undo(&mut rec).unwrap().is_some());
        assert_eq!(log.current_index(), None);
        assert_matches!(log.undo(&mut rec), Ok(None));
    }

    #[test]
    fn recording_after_undo_prunes_redo_branch() {
        let (mut log, mut rec) = log_with(4, 10);
        log.undo(&mut rec).unwrap();
        log.undo(&mut rec).unwrap();
        assert_eq!(log.len(), 4);

        log.record("branch", marker(9));
        assert_eq!(log.len(), 3);
        assert_eq!(log.current_index(), Some(2));
        assert!(!log.can_redo());
        assert_eq!(log.undo_description(), Some("branch"));
    }

    #[test]
    fn capacity_evicts_oldest_and_slides_cursor() {
        let (log, _) = log_with(8, 5);
        assert_eq!(log.len(), 5);
        assert_eq!(log.current_index(), Some(4));
        assert_eq!(log.get(0).unwrap().description, "step 3");
    }

    #[test]
    fn failed_effect_leaves_cursor_in_place() {
        let (mut log, mut rec) = log_with(2, 10);
        rec.fail_next = true;
        assert!(log.undo(&mut rec).is_err());
        assert_eq!(log.current_index(), Some(1));
    }

    // -----------------------------------------------------------------------
    // Jumps
    // -----------------------------------------------------------------------

    #[test]
    fn jump_to_undoes_and_redoes_step_by_step() {
        let (mut log, mut rec) = log_with(5, 10);
        assert_eq!(log.jump_to(Some(1), &mut rec).unwrap(), 3);
        assert_eq!(log.current_index(), Some(1));
        assert_eq!(rec.applied, vec![0, 1]);

        assert_eq!(log.jump_to(None, &mut rec).unwrap(), 2);
        assert!(rec.applied.is_empty());

        assert_eq!(log.jump_to(Some(4), &mut rec).unwrap(), 5);
        assert_eq!(rec.applied, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn jump_out_of_range_is_ignored() {
        let (mut log, mut rec) = log_with(3, 10);
        assert_eq!(log.jump_to(Some(3), &mut rec).unwrap(), 0);
        assert_eq!(log.current_index(), Some(2));
    }

    // -----------------------------------------------------------------------
    // Unknown entries and persistence
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_type_deserializes_and_is_skipped() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "timestamp": Utc::now(),
            "description": "from a newer build",
            "action": { "type": "desk_painted", "colour": "red" }
        });
        let entry: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.action, HistoryAction::Unknown);

        let mut log = HistoryLog::default();
        log.add_entry(entry);
        let mut rec = Recorder {
            fail_next: true,
            ..Default::default()
        };
        // The target is never called, so the armed failure does not fire.
        assert!(log.undo(&mut rec).unwrap().is_some());
        assert_eq!(log.current_index(), None);
        assert!(log.redo(&mut rec).unwrap().is_some());
        assert_eq!(log.current_index(), Some(0));
    }

    #[test]
    fn action_serializes_with_type_tag() {
        let action = marker(0);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "seating_cleared");
        assert_eq!(action.kind(), "seating_cleared");
    }

    #[test]
    fn from_parts_clamps_cursor_and_capacity() {
        let entries: Vec<_> = (0..6).map(|i| HistoryEntry::new(format!("e{i}"), marker(0))).collect();
        let log = HistoryLog::from_parts(entries, Some(42), HistoryConfig { capacity: 4 });
        assert_eq!(log.len(), 4);
        assert_eq!(log.current_index(), Some(3));
    }

    #[test]
    fn summary_lists_recent_newest_first() {
        let (mut log, mut rec) = log_with(7, 10);
        log.undo(&mut rec).unwrap();
        let summary = log.summary();
        assert_eq!(summary.total, 7);
        assert_eq!(summary.current_index, Some(5));
        assert!(summary.can_undo && summary.can_redo);
        assert_eq!(summary.recent.len(), RECENT_ENTRIES);
        assert_eq!(summary.recent[0].description, "step 6");
        assert!(!summary.recent[0].applied);
        assert!(summary.recent[1].applied);
    }
}
