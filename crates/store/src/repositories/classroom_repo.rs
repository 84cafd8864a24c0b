//! Whole-classroom load and save across all sections.

use seatplan_core::history::HistoryConfig;
use seatplan_core::{Classroom, ClassroomState};

use super::{
    ConstraintRepo, HistoryRepo, LayoutRepo, PreferencesRepo, SeatingRepo, SettingsRepo,
    StudentRepo,
};
use crate::error::StoreError;
use crate::store::SectionStore;

/// Hydrates and persists a [`Classroom`]. Settings are not written here; use
/// [`SettingsRepo`] for those.
pub struct ClassroomRepo;

impl ClassroomRepo {
    /// Load every section into a classroom with the given history capacity.
    ///
    /// Missing sections load as defaults. Seating entries pointing at unknown
    /// students or desks are dropped with a warning.
    pub fn load(store: &dyn SectionStore, history: HistoryConfig) -> Result<Classroom, StoreError> {
        let settings = SettingsRepo::load(store)?;
        let state = ClassroomState {
            roster: StudentRepo::load(store)?,
            layouts: LayoutRepo::load(store, &settings.default_layout)?,
            constraints: ConstraintRepo::load(store)?,
            seating: SeatingRepo::load(store)?,
            preferences: PreferencesRepo::load(store)?,
        };
        let history = HistoryRepo::load(store, history)?;

        tracing::info!(
            students = state.roster.len(),
            seated = state.seating.len(),
            history = history.len(),
            "Loaded classroom"
        );
        Ok(Classroom::from_parts(state, history))
    }

    /// Write every section. Stops at the first failing section; sections
    /// written before it stay written.
    pub fn save(store: &mut dyn SectionStore, classroom: &Classroom) -> Result<(), StoreError> {
        StudentRepo::save(store, classroom.roster())?;
        LayoutRepo::save(store, classroom.layouts())?;
        ConstraintRepo::save(store, classroom.constraints())?;
        SeatingRepo::save(store, classroom.seating())?;
        PreferencesRepo::save(store, classroom.preferences())?;
        HistoryRepo::save(store, classroom.history())?;
        tracing::info!("Saved classroom");
        Ok(())
    }

    /// Like [`ClassroomRepo::save`] but logs the failure and reports it as
    /// `false` instead of returning it.
    pub fn save_reported(store: &mut dyn SectionStore, classroom: &Classroom) -> bool {
        match Self::save(store, classroom) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to save classroom");
                false
            }
        }
    }

    /// Remove everything, settings included.
    pub fn clear_all(store: &mut dyn SectionStore) -> Result<(), StoreError> {
        store.clear()?;
        tracing::info!("Cleared all stored data");
        Ok(())
    }
}
