//! Repository for the `layouts` section (the whole layout catalog including
//! the active key).

use seatplan_core::layout::{LayoutCatalog, LayoutTemplate, DEFAULT_LAYOUT_KEY};

use super::{read_section, write_section};
use crate::error::StoreError;
use crate::store::{sections, SectionStore};

pub struct LayoutRepo;

impl LayoutRepo {
    /// The stored catalog, `None` if layouts were never saved.
    pub fn find(store: &dyn SectionStore) -> Result<Option<LayoutCatalog>, StoreError> {
        read_section(store, sections::LAYOUTS)
    }

    /// The stored catalog, or a fresh one with `default_layout` active.
    pub fn load(store: &dyn SectionStore, default_layout: &str) -> Result<LayoutCatalog, StoreError> {
        match Self::find(store)? {
            Some(catalog) => Ok(catalog),
            None => Self::initial(default_layout),
        }
    }

    /// A fresh catalog. A template key other than `default` is added from its
    /// template and activated; an unknown key falls back to the default.
    pub fn initial(default_layout: &str) -> Result<LayoutCatalog, StoreError> {
        let mut catalog = LayoutCatalog::new();
        if default_layout == DEFAULT_LAYOUT_KEY {
            return Ok(catalog);
        }
        match LayoutTemplate::ALL
            .into_iter()
            .find(|t| t.key() == default_layout)
        {
            Some(template) => {
                catalog.add_template(template)?;
                catalog.switch(template.key())?;
            }
            None => {
                tracing::warn!(layout = default_layout, "Unknown default layout in settings, using the default");
            }
        }
        Ok(catalog)
    }

    pub fn save(store: &mut dyn SectionStore, catalog: &LayoutCatalog) -> Result<(), StoreError> {
        write_section(store, sections::LAYOUTS, catalog)
    }
}
