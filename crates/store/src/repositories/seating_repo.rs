//! Repository for the `seating` section (desk id → student id).

use seatplan_core::seating::SeatingMap;

use super::{read_section, write_section};
use crate::error::StoreError;
use crate::store::{sections, SectionStore};

pub struct SeatingRepo;

impl SeatingRepo {
    pub fn load(store: &dyn SectionStore) -> Result<SeatingMap, StoreError> {
        Ok(read_section(store, sections::SEATING)?.unwrap_or_default())
    }

    pub fn save(store: &mut dyn SectionStore, seating: &SeatingMap) -> Result<(), StoreError> {
        write_section(store, sections::SEATING, seating)
    }
}
