//! Repository for the `settings` section.

use seatplan_core::history::{HistoryConfig, DEFAULT_HISTORY_CAPACITY};
use seatplan_core::layout::DEFAULT_LAYOUT_KEY;
use serde::{Deserialize, Serialize};

use super::{read_section, write_section};
use crate::error::StoreError;
use crate::store::{sections, SectionStore};

/// User settings that outlive a single session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Layout activated for a store that has no saved layouts yet. Either
    /// `default` or a template key.
    pub default_layout: String,
    pub max_history_items: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_layout: DEFAULT_LAYOUT_KEY.to_string(),
            max_history_items: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Settings {
    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            capacity: self.max_history_items.max(1),
        }
    }
}

/// Partial update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub default_layout: Option<String>,
    pub max_history_items: Option<usize>,
}

pub struct SettingsRepo;

impl SettingsRepo {
    pub fn load(store: &dyn SectionStore) -> Result<Settings, StoreError> {
        Ok(read_section(store, sections::SETTINGS)?.unwrap_or_default())
    }

    pub fn save(store: &mut dyn SectionStore, settings: &Settings) -> Result<(), StoreError> {
        write_section(store, sections::SETTINGS, settings)
    }

    /// Merge `update` into the stored settings, returning the result.
    pub fn update(
        store: &mut dyn SectionStore,
        update: &SettingsUpdate,
    ) -> Result<Settings, StoreError> {
        let mut settings = Self::load(store)?;
        if let Some(layout) = &update.default_layout {
            settings.default_layout = layout.clone();
        }
        if let Some(max) = update.max_history_items {
            settings.max_history_items = max.max(1);
        }
        Self::save(store, &settings)?;
        Ok(settings)
    }
}
