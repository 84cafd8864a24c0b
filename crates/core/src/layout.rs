//! Desk layouts, layout templates, adjacency, and the layout catalog.
//!
//! Grid desks are identified as `"<section>-<index>"` where the index is a
//! layout-wide counter, so two desks are structurally adjacent when they share
//! a section and their indices differ by one. Freeform desks have no
//! structure and are adjacent by proximity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DeskId, SectionId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Horizontal distance between neighbouring grid columns, gap included.
pub const DESK_PITCH_X: f64 = 140.0;

/// Vertical distance between neighbouring grid rows, gap included.
pub const DESK_PITCH_Y: f64 = 80.0;

/// Radius used when looking for a free desk near a seated partner.
pub const PROXIMITY_RADIUS: f64 = 210.0;

/// Catalog key of the built-in layout. It can never be deleted.
pub const DEFAULT_LAYOUT_KEY: &str = "default";

/// Section assigned to freeform desks created without one.
pub const CUSTOM_SECTION: &str = "custom";

/// Maximum allowed length for a layout name or key.
pub const MAX_LAYOUT_NAME_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Desk
// ---------------------------------------------------------------------------

/// Where a desk sits: a cell of its section's grid, or a free canvas point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeskPosition {
    Grid { row: u32, col: u32 },
    Free { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desk {
    pub id: DeskId,
    pub section: SectionId,
    pub position: DeskPosition,
}

impl Desk {
    /// A grid desk with the conventional `"<section>-<index>"` id.
    pub fn grid(section: impl Into<SectionId>, index: u32, row: u32, col: u32) -> Self {
        let section = section.into();
        Self {
            id: format!("{section}-{index}"),
            section,
            position: DeskPosition::Grid { row, col },
        }
    }

    /// A freeform desk at canvas coordinates.
    pub fn free(id: impl Into<DeskId>, section: impl Into<SectionId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            section: section.into(),
            position: DeskPosition::Free { x, y },
        }
    }

    pub fn is_grid(&self) -> bool {
        matches!(self.position, DeskPosition::Grid { .. })
    }

    /// Canvas coordinates. Grid cells are scaled by the desk pitch.
    pub fn coordinates(&self) -> (f64, f64) {
        match self.position {
            DeskPosition::Grid { row, col } => {
                (f64::from(col) * DESK_PITCH_X, f64::from(row) * DESK_PITCH_Y)
            }
            DeskPosition::Free { x, y } => (x, y),
        }
    }

    /// Index parsed from a `"<section>-<index>"` id.
    pub fn index(&self) -> Option<u32> {
        self.id
            .strip_prefix(self.section.as_str())?
            .strip_prefix('-')?
            .parse()
            .ok()
    }

    pub fn distance_to(&self, other: &Desk) -> f64 {
        let (ax, ay) = self.coordinates();
        let (bx, by) = other.coordinates();
        (ax - bx).hypot(ay - by)
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// A complete arrangement of desks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,
    pub desks: Vec<Desk>,
    #[serde(default)]
    pub is_default: bool,
}

impl Layout {
    /// Build a layout, rejecting blank names, empty desk lists, and duplicate
    /// desk ids.
    pub fn new(name: impl Into<String>, desks: Vec<Desk>) -> Result<Self, CoreError> {
        let name = name.into();
        validate_layout_name(&name)?;
        if desks.is_empty() {
            return Err(CoreError::Validation(
                "A layout needs at least one desk".to_string(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for desk in &desks {
            if desk.id.trim().is_empty() {
                return Err(CoreError::Validation("Desk id must not be empty".to_string()));
            }
            if !seen.insert(desk.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate desk id '{}'",
                    desk.id
                )));
            }
        }
        Ok(Self {
            name,
            desks,
            is_default: false,
        })
    }

    /// A freeform layout from canvas points. Desk ids are `desk-<n>` and every
    /// desk belongs to [`CUSTOM_SECTION`].
    pub fn freeform(name: impl Into<String>, points: &[(f64, f64)]) -> Result<Self, CoreError> {
        let desks = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Desk::free(format!("desk-{i}"), CUSTOM_SECTION, x, y))
            .collect();
        Self::new(name, desks)
    }

    /// The built-in classroom: left 2x4, middle 3x3, right 2x4.
    pub fn standard() -> Self {
        let mut layout = LayoutTemplate::Standard.build();
        layout.name = "Standard classroom".to_string();
        layout.is_default = true;
        layout
    }

    pub fn desk(&self, id: &str) -> Option<&Desk> {
        self.desks.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.desk(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.desks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desks.is_empty()
    }

    pub fn desk_ids(&self) -> Vec<DeskId> {
        self.desks.iter().map(|d| d.id.clone()).collect()
    }

    /// Section names in order of first appearance.
    pub fn sections(&self) -> Vec<SectionId> {
        let mut sections: Vec<SectionId> = Vec::new();
        for desk in &self.desks {
            if !sections.contains(&desk.section) {
                sections.push(desk.section.clone());
            }
        }
        sections
    }

    /// Whether two desks count as "sitting together".
    ///
    /// Grid desks: same section and indices one apart. Anything else: within
    /// one desk pitch horizontally and vertically.
    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        match (self.desk(a), self.desk(b)) {
            (Some(a), Some(b)) => desks_adjacent(a, b),
            _ => false,
        }
    }

    /// Desks adjacent to `id`, in layout order.
    pub fn neighbors(&self, id: &str) -> Vec<&Desk> {
        let Some(desk) = self.desk(id) else {
            return Vec::new();
        };
        self.desks
            .iter()
            .filter(|other| other.id != desk.id && desks_adjacent(desk, other))
            .collect()
    }
}

fn desks_adjacent(a: &Desk, b: &Desk) -> bool {
    if a.is_grid() && b.is_grid() {
        if a.section != b.section {
            return false;
        }
        return match (a.index(), b.index()) {
            (Some(i), Some(j)) => i.abs_diff(j) == 1,
            _ => false,
        };
    }
    let (ax, ay) = a.coordinates();
    let (bx, by) = b.coordinates();
    let (dx, dy) = ((ax - bx).abs(), (ay - by).abs());
    dx <= DESK_PITCH_X && dy <= DESK_PITCH_Y && (dx > 0.0 || dy > 0.0)
}

/// Validate a layout name or catalog key.
pub fn validate_layout_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Layout name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_LAYOUT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Layout name must not exceed {MAX_LAYOUT_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// One rectangular block of desks in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionShape {
    pub id: &'static str,
    pub cols: u32,
    pub rows: u32,
    pub row_offset: u32,
    pub col_offset: u32,
}

const fn section(id: &'static str, cols: u32, rows: u32, row_offset: u32, col_offset: u32) -> SectionShape {
    SectionShape {
        id,
        cols,
        rows,
        row_offset,
        col_offset,
    }
}

/// Predefined grid arrangements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutTemplate {
    /// Rows facing the board: left 2x4, middle 3x3, right 2x4.
    Standard,
    /// Two long sides and a front block for discussion.
    UShape,
    /// Four 2x3 group tables.
    Groups,
    /// Five rows of five, presentation style.
    TheaterRows,
}

impl LayoutTemplate {
    pub const ALL: [LayoutTemplate; 4] = [
        LayoutTemplate::Standard,
        LayoutTemplate::UShape,
        LayoutTemplate::Groups,
        LayoutTemplate::TheaterRows,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LayoutTemplate::Standard => "standard",
            LayoutTemplate::UShape => "u-shape",
            LayoutTemplate::Groups => "groups",
            LayoutTemplate::TheaterRows => "rows",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LayoutTemplate::Standard => "Standard Classroom",
            LayoutTemplate::UShape => "U-Shape",
            LayoutTemplate::Groups => "Group Tables",
            LayoutTemplate::TheaterRows => "Theater Rows",
        }
    }

    pub fn sections(self) -> Vec<SectionShape> {
        match self {
            LayoutTemplate::Standard => vec![
                section("left", 2, 4, 0, 0),
                section("middle", 3, 3, 0, 3),
                section("right", 2, 4, 0, 7),
            ],
            LayoutTemplate::UShape => vec![
                section("left", 1, 6, 0, 0),
                section("middle", 4, 2, 0, 2),
                section("right", 1, 6, 0, 7),
            ],
            LayoutTemplate::Groups => vec![
                section("group-1", 2, 3, 0, 0),
                section("group-2", 2, 3, 0, 3),
                section("group-3", 2, 3, 0, 6),
                section("group-4", 2, 3, 0, 9),
            ],
            LayoutTemplate::TheaterRows => vec![
                section("row-1", 5, 1, 0, 0),
                section("row-2", 5, 1, 1, 0),
                section("row-3", 5, 1, 2, 0),
                section("row-4", 5, 1, 3, 0),
                section("row-5", 5, 1, 4, 0),
            ],
        }
    }

    /// Materialize the template. Each section numbers its desks from 0,
    /// row-major.
    pub fn build(self) -> Layout {
        let mut desks = Vec::new();
        for shape in self.sections() {
            let mut index = 0u32;
            for row in 0..shape.rows {
                for col in 0..shape.cols {
                    desks.push(Desk::grid(
                        shape.id,
                        index,
                        shape.row_offset + row,
                        shape.col_offset + col,
                    ));
                    index += 1;
                }
            }
        }
        Layout {
            name: self.display_name().to_string(),
            desks,
            is_default: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Named layouts with exactly one active at a time. The default layout always
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutCatalog {
    default: Layout,
    #[serde(default)]
    custom: BTreeMap<String, Layout>,
    active: String,
}

impl Default for LayoutCatalog {
    fn default() -> Self {
        Self {
            default: Layout::standard(),
            custom: BTreeMap::new(),
            active: DEFAULT_LAYOUT_KEY.to_string(),
        }
    }
}

impl LayoutCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_key(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> &Layout {
        self.get(&self.active).unwrap_or(&self.default)
    }

    pub fn get(&self, key: &str) -> Option<&Layout> {
        if key == DEFAULT_LAYOUT_KEY {
            Some(&self.default)
        } else {
            self.custom.get(key)
        }
    }

    /// All layouts, default first, then custom layouts by key.
    pub fn list(&self) -> Vec<(&str, &Layout)> {
        std::iter::once((DEFAULT_LAYOUT_KEY, &self.default))
            .chain(self.custom.iter().map(|(k, v)| (k.as_str(), v)))
            .collect()
    }

    /// Make `key` the active layout. Returns the previously active key.
    pub fn switch(&mut self, key: &str) -> Result<String, CoreError> {
        if self.get(key).is_none() {
            return Err(CoreError::not_found("layout", key));
        }
        Ok(std::mem::replace(&mut self.active, key.to_string()))
    }

    /// Store (or overwrite) a custom layout under `key`.
    pub fn save_custom(&mut self, key: &str, mut layout: Layout) -> Result<(), CoreError> {
        validate_layout_name(key)?;
        if key == DEFAULT_LAYOUT_KEY {
            return Err(CoreError::Validation(
                "The default layout cannot be overwritten".to_string(),
            ));
        }
        if layout.desks.is_empty() {
            return Err(CoreError::Validation(
                "A layout needs at least one desk".to_string(),
            ));
        }
        layout.is_default = false;
        self.custom.insert(key.to_string(), layout);
        Ok(())
    }

    /// Store a template under its key.
    pub fn add_template(&mut self, template: LayoutTemplate) -> Result<(), CoreError> {
        self.save_custom(template.key(), template.build())
    }

    /// Delete a custom layout. Deleting the active layout falls back to the
    /// default one.
    pub fn delete(&mut self, key: &str) -> Result<Layout, CoreError> {
        if key == DEFAULT_LAYOUT_KEY {
            return Err(CoreError::Validation(
                "The default layout cannot be deleted".to_string(),
            ));
        }
        let removed = self
            .custom
            .remove(key)
            .ok_or_else(|| CoreError::not_found("layout", key))?;
        if self.active == key {
            self.active = DEFAULT_LAYOUT_KEY.to_string();
        }
        Ok(removed)
    }
}
