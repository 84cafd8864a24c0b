//! Repository for the `constraints` section.

use seatplan_core::constraint::ConstraintSet;

use super::{read_section, write_section};
use crate::error::StoreError;
use crate::store::{sections, SectionStore};

pub struct ConstraintRepo;

impl ConstraintRepo {
    pub fn load(store: &dyn SectionStore) -> Result<ConstraintSet, StoreError> {
        Ok(read_section(store, sections::CONSTRAINTS)?.unwrap_or_default())
    }

    pub fn save(store: &mut dyn SectionStore, constraints: &ConstraintSet) -> Result<(), StoreError> {
        write_section(store, sections::CONSTRAINTS, constraints)
    }
}
