//! Repository layer.
//!
//! Each repository is a zero-sized struct providing load/save methods that
//! accept a [`SectionStore`] as the first argument. A section that was never
//! saved loads as the type's default.

pub mod classroom_repo;
pub mod constraint_repo;
pub mod history_repo;
pub mod layout_repo;
pub mod preferences_repo;
pub mod seating_repo;
pub mod settings_repo;
pub mod student_repo;

pub use classroom_repo::ClassroomRepo;
pub use constraint_repo::ConstraintRepo;
pub use history_repo::HistoryRepo;
pub use layout_repo::LayoutRepo;
pub use preferences_repo::PreferencesRepo;
pub use seating_repo::SeatingRepo;
pub use settings_repo::{Settings, SettingsRepo, SettingsUpdate};
pub use student_repo::StudentRepo;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::store::SectionStore;

/// Decode a section, `None` if it is absent.
pub(crate) fn read_section<T: DeserializeOwned>(
    store: &dyn SectionStore,
    section: &str,
) -> Result<Option<T>, StoreError> {
    store
        .get_section(section)
        .map(|value| serde_json::from_value(value).map_err(|e| StoreError::serde(section, e)))
        .transpose()
}

pub(crate) fn write_section<T: Serialize + ?Sized>(
    store: &mut dyn SectionStore,
    section: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|e| StoreError::serde(section, e))?;
    store.save_section(section, value)
}
