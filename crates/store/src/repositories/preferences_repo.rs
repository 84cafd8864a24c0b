//! Repository for the `preferences` section (pair probabilities and section
//! weights).

use seatplan_core::preferences::SeatingPreferences;

use super::{read_section, write_section};
use crate::error::StoreError;
use crate::store::{sections, SectionStore};

pub struct PreferencesRepo;

impl PreferencesRepo {
    pub fn load(store: &dyn SectionStore) -> Result<SeatingPreferences, StoreError> {
        Ok(read_section(store, sections::PREFERENCES)?.unwrap_or_default())
    }

    pub fn save(
        store: &mut dyn SectionStore,
        preferences: &SeatingPreferences,
    ) -> Result<(), StoreError> {
        write_section(store, sections::PREFERENCES, preferences)
    }
}
