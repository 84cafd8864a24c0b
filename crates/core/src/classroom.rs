//! The classroom context: all state plus the history log, mutated only
//! through [`Classroom::dispatch`].
//!
//! Every recorded command follows the same sequence: check inputs, mutate,
//! append one history entry. Unknown ids become [`Applied::NoOp`] rather than
//! errors.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constraint::{self, ConstraintSet, NewConstraint, Violation};
use crate::engine::{self, SeatingMode};
use crate::error::CoreError;
use crate::history::{HistoryAction, HistoryConfig, HistoryLog, HistoryTarget};
use crate::layout::{Layout, LayoutCatalog, LayoutTemplate};
use crate::preferences::{SeatingPreferences, SectionWeights};
use crate::roster::Roster;
use crate::seating::SeatingMap;
use crate::student::{NewStudent, Preferences, Student, StudentUpdate};
use crate::types::{ConstraintId, DeskId, StudentId};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything history entries act upon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassroomState {
    pub roster: Roster,
    pub layouts: LayoutCatalog,
    pub constraints: ConstraintSet,
    pub seating: SeatingMap,
    pub preferences: SeatingPreferences,
}

impl ClassroomState {
    /// History replay of a layout switch. A layout deleted since the entry
    /// was recorded is skipped so the cursor can still move past it.
    fn switch_layout_to(&mut self, key: &str, seating: &SeatingMap) {
        match self.layouts.switch(key) {
            Ok(_) => self.seating = seating.clone(),
            Err(_) => tracing::warn!(layout = key, "Layout no longer exists, skipping switch"),
        }
    }

    /// Drop seating entries pointing at students no longer on the roster or
    /// desks missing from the active layout. Returns how many were dropped.
    pub fn reconcile(&mut self) -> usize {
        let roster = &self.roster;
        let layout = self.layouts.active();
        let dropped = self
            .seating
            .retain(|desk| layout.contains(desk), |student| roster.contains(student));
        for (desk, student) in &dropped {
            tracing::warn!(%desk, %student, "Dropping orphaned seat assignment");
        }
        dropped.len()
    }

    fn student_name(&self, id: StudentId) -> String {
        self.roster.name_of(id).unwrap_or("unknown student").to_string()
    }

    fn require_student(&self, id: StudentId) -> Result<&Student, CoreError> {
        self.roster
            .get(id)
            .ok_or_else(|| CoreError::not_found("student", id))
    }
}

impl HistoryTarget for ClassroomState {
    fn apply_undo(&mut self, action: &HistoryAction) -> Result<(), CoreError> {
        match action {
            HistoryAction::StudentAdded { student } => {
                self.roster.remove(student.id)?;
                self.seating.remove(student.id);
            }
            HistoryAction::StudentRemoved {
                index,
                student,
                desk,
            } => {
                self.roster.restore(*index, student.clone())?;
                if let Some(desk) = desk {
                    self.seating.assign(student.id, desk.clone());
                }
            }
            HistoryAction::StudentUpdated { before, .. } => {
                self.roster.replace(before.clone())?;
            }
            HistoryAction::RosterCleared {
                students,
                previous_seating,
            } => {
                self.roster = Roster::from_students(students.clone())?;
                self.seating = previous_seating.clone();
            }
            HistoryAction::StudentMoved {
                student,
                previous_seating,
                ..
            } => match previous_seating {
                Some(previous) => self.seating = previous.clone(),
                None => {
                    self.seating.remove(*student);
                }
            },
            HistoryAction::DeskVacated {
                previous_seating, ..
            } => self.seating = previous_seating.clone(),
            HistoryAction::SeatingGenerated { previous, .. }
            | HistoryAction::SeatingCleared { previous }
            | HistoryAction::SeatingImported { previous, .. } => {
                self.seating = previous.clone();
            }
            HistoryAction::ConstraintAdded { constraint } => {
                self.constraints.remove(constraint.id)?;
            }
            HistoryAction::ConstraintRemoved { index, constraint } => {
                self.constraints.restore(*index, constraint.clone())?;
            }
            HistoryAction::LayoutSwitched {
                from,
                previous_seating,
                ..
            } => self.switch_layout_to(from, previous_seating),
            HistoryAction::PreferencesChanged { before, .. } => {
                self.preferences = before.clone();
            }
            HistoryAction::Unknown => {}
        }
        Ok(())
    }

    fn apply_redo(&mut self, action: &HistoryAction) -> Result<(), CoreError> {
        match action {
            HistoryAction::StudentAdded { student } => {
                self.roster.insert(student.clone())?;
            }
            HistoryAction::StudentRemoved { student, .. } => {
                self.roster.remove(student.id)?;
                self.seating.remove(student.id);
            }
            HistoryAction::StudentUpdated { after, .. } => {
                self.roster.replace(after.clone())?;
            }
            HistoryAction::RosterCleared { .. } => {
                self.roster.clear();
                self.seating.clear_all();
            }
            HistoryAction::StudentMoved { student, desk, .. } => {
                self.seating.assign(*student, desk.clone());
            }
            HistoryAction::DeskVacated { desk, .. } => {
                self.seating.clear(desk);
            }
            HistoryAction::SeatingGenerated { seating, .. }
            | HistoryAction::SeatingImported { seating, .. } => {
                self.seating = seating.clone();
            }
            HistoryAction::SeatingCleared { .. } => self.seating.clear_all(),
            HistoryAction::ConstraintAdded { constraint } => {
                self.constraints.restore(usize::MAX, constraint.clone())?;
            }
            HistoryAction::ConstraintRemoved { constraint, .. } => {
                self.constraints.remove(constraint.id)?;
            }
            HistoryAction::LayoutSwitched { to, seating, .. } => self.switch_layout_to(to, seating),
            HistoryAction::PreferencesChanged { after, .. } => {
                self.preferences = after.clone();
            }
            HistoryAction::Unknown => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Commands and outcomes
// ---------------------------------------------------------------------------

/// Every state change a front end can request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddStudent(NewStudent),
    UpdateStudent { id: StudentId, update: StudentUpdate },
    SetPreferences { id: StudentId, preferences: Preferences },
    RemoveStudent { id: StudentId },
    ClearRoster,

    AssignSeat { student: StudentId, desk: DeskId },
    ClearDesk { desk: DeskId },
    GenerateSeating,
    ClearSeating,
    ImportSeating(SeatingMap),

    AddConstraint(NewConstraint),
    RemoveConstraint { id: ConstraintId },

    SwitchLayout { key: String },
    SaveLayout { key: String, layout: Layout },
    AddTemplate(LayoutTemplate),
    DeleteLayout { key: String },

    SetPairProbability { a: StudentId, b: StudentId, probability: f64 },
    RemovePair { a: StudentId, b: StudentId },
    SetSectionWeights { student: StudentId, weights: SectionWeights },
    SetDefaultSectionWeights(SectionWeights),

    Undo,
    Redo,
    /// Move the history cursor; `None` is "before the first entry".
    JumpTo(Option<usize>),
    ClearHistory,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddStudent(_) => "add_student",
            Command::UpdateStudent { .. } => "update_student",
            Command::SetPreferences { .. } => "set_preferences",
            Command::RemoveStudent { .. } => "remove_student",
            Command::ClearRoster => "clear_roster",
            Command::AssignSeat { .. } => "assign_seat",
            Command::ClearDesk { .. } => "clear_desk",
            Command::GenerateSeating => "generate_seating",
            Command::ClearSeating => "clear_seating",
            Command::ImportSeating(_) => "import_seating",
            Command::AddConstraint(_) => "add_constraint",
            Command::RemoveConstraint { .. } => "remove_constraint",
            Command::SwitchLayout { .. } => "switch_layout",
            Command::SaveLayout { .. } => "save_layout",
            Command::AddTemplate(_) => "add_template",
            Command::DeleteLayout { .. } => "delete_layout",
            Command::SetPairProbability { .. } => "set_pair_probability",
            Command::RemovePair { .. } => "remove_pair",
            Command::SetSectionWeights { .. } => "set_section_weights",
            Command::SetDefaultSectionWeights(_) => "set_default_section_weights",
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::JumpTo(_) => "jump_to",
            Command::ClearHistory => "clear_history",
        }
    }
}

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// State changed and one history entry was appended.
    Recorded { description: String },
    /// A seating was generated and recorded.
    Generated {
        mode: SeatingMode,
        placed: usize,
        unseated: Vec<StudentId>,
    },
    /// Layout catalog edits, which are not part of the undo history.
    Unrecorded { description: String },
    Undone { description: Option<String> },
    Redone { description: Option<String> },
    Jumped { steps: usize },
    HistoryCleared,
    /// Nothing changed (unknown id, already in the requested state).
    NoOp { reason: String },
}

/// A desk whose occupant changed, with the new occupant if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeskUpdate {
    pub desk_id: DeskId,
    pub student_id: Option<StudentId>,
    /// Empty when the desk was vacated.
    pub student_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub applied: Applied,
    pub desk_updates: Vec<DeskUpdate>,
    pub roster_changed: bool,
}

impl DispatchOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self.applied, Applied::NoOp { .. })
    }
}

fn recorded(description: String) -> Applied {
    Applied::Recorded { description }
}

fn noop(reason: impl Into<String>) -> Applied {
    Applied::NoOp {
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Classroom
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classroom {
    state: ClassroomState,
    history: HistoryLog,
}

impl Classroom {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            state: ClassroomState::default(),
            history: HistoryLog::new(config),
        }
    }

    /// Assemble a classroom from loaded parts, dropping orphaned seats.
    pub fn from_parts(mut state: ClassroomState, history: HistoryLog) -> Self {
        let dropped = state.reconcile();
        if dropped > 0 {
            tracing::info!(dropped, "Reconciled seating on load");
        }
        Self { state, history }
    }

    pub fn into_parts(self) -> (ClassroomState, HistoryLog) {
        (self.state, self.history)
    }

    pub fn state(&self) -> &ClassroomState {
        &self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.state.roster
    }

    pub fn layouts(&self) -> &LayoutCatalog {
        &self.state.layouts
    }

    pub fn active_layout(&self) -> &Layout {
        self.state.layouts.active()
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.state.constraints
    }

    pub fn seating(&self) -> &SeatingMap {
        &self.state.seating
    }

    pub fn preferences(&self) -> &SeatingPreferences {
        &self.state.preferences
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Constraint violations of the current seating on the active layout.
    pub fn validate_seating(&self) -> Vec<Violation> {
        constraint::validate(
            &self.state.seating,
            &self.state.constraints,
            self.state.layouts.active(),
        )
    }

    /// Apply `command`. `rng` drives seating generation.
    ///
    /// Validation failures and [`CoreError::NothingToPlace`] are returned
    /// before any state changes. Unknown ids yield [`Applied::NoOp`].
    pub fn dispatch<R: Rng + ?Sized>(
        &mut self,
        command: Command,
        rng: &mut R,
    ) -> Result<DispatchOutcome, CoreError> {
        let name = command.name();
        let seating_before = self.state.seating.clone();
        let roster_before = self.state.roster.clone();

        let applied = match self.apply(command, rng) {
            Ok(applied) => applied,
            Err(CoreError::NotFound { entity, id }) => {
                tracing::debug!(command = name, entity, %id, "Command target not found");
                noop(format!("{entity} {id} not found"))
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "Command rejected");
                return Err(e);
            }
        };

        match &applied {
            Applied::NoOp { reason } => tracing::debug!(command = name, %reason, "Command was a no-op"),
            other => tracing::info!(command = name, outcome = ?other, "Command applied"),
        }

        Ok(DispatchOutcome {
            applied,
            desk_updates: self.desk_updates(&seating_before),
            roster_changed: roster_before != self.state.roster,
        })
    }

    fn desk_updates(&self, before: &SeatingMap) -> Vec<DeskUpdate> {
        self.state
            .seating
            .changed_desks(before)
            .into_iter()
            .map(|desk_id| {
                let student_id = self.state.seating.student_at(&desk_id);
                let student_name = student_id
                    .and_then(|id| self.state.roster.name_of(id))
                    .unwrap_or_default()
                    .to_string();
                DeskUpdate {
                    desk_id,
                    student_id,
                    student_name,
                }
            })
            .collect()
    }

    fn record(&mut self, description: String, action: HistoryAction) -> Applied {
        self.history.record(description.clone(), action);
        recorded(description)
    }

    fn apply<R: Rng + ?Sized>(&mut self, command: Command, rng: &mut R) -> Result<Applied, CoreError> {
        match command {
            Command::AddStudent(input) => self.add_student(input),
            Command::UpdateStudent { id, update } => self.update_student(id, update),
            Command::SetPreferences { id, preferences } => self.update_student(
                id,
                StudentUpdate {
                    preferences: Some(preferences),
                    ..Default::default()
                },
            ),
            Command::RemoveStudent { id } => self.remove_student(id),
            Command::ClearRoster => Ok(self.clear_roster()),

            Command::AssignSeat { student, desk } => self.assign_seat(student, desk),
            Command::ClearDesk { desk } => Ok(self.clear_desk(desk)),
            Command::GenerateSeating => self.generate(rng),
            Command::ClearSeating => Ok(self.clear_seating()),
            Command::ImportSeating(seating) => Ok(self.import_seating(seating)),

            Command::AddConstraint(input) => self.add_constraint(input),
            Command::RemoveConstraint { id } => self.remove_constraint(id),

            Command::SwitchLayout { key } => self.switch_layout(&key),
            Command::SaveLayout { key, layout } => self.save_layout(&key, layout),
            Command::AddTemplate(template) => self.save_layout(template.key(), template.build()),
            Command::DeleteLayout { key } => self.delete_layout(&key),

            Command::SetPairProbability { a, b, probability } => {
                self.set_pair_probability(a, b, probability)
            }
            Command::RemovePair { a, b } => Ok(self.remove_pair(a, b)),
            Command::SetSectionWeights { student, weights } => {
                self.state.require_student(student)?;
                let name = self.state.student_name(student);
                self.change_preferences(format!("Updated section weights for {name}"), |p| {
                    p.set_section_weights(student, weights)
                })
            }
            Command::SetDefaultSectionWeights(weights) => self
                .change_preferences("Updated default section weights".to_string(), |p| {
                    p.set_default_section_weights(weights)
                }),

            Command::Undo => {
                let entry = self.history.undo(&mut self.state)?;
                Ok(match entry {
                    Some(entry) => Applied::Undone {
                        description: Some(entry.description.clone()),
                    },
                    None => noop("nothing to undo"),
                })
            }
            Command::Redo => {
                let entry = self.history.redo(&mut self.state)?;
                Ok(match entry {
                    Some(entry) => Applied::Redone {
                        description: Some(entry.description.clone()),
                    },
                    None => noop("nothing to redo"),
                })
            }
            Command::JumpTo(target) => {
                let steps = self.history.jump_to(target, &mut self.state)?;
                Ok(if steps == 0 {
                    noop("already at that point in history")
                } else {
                    Applied::Jumped { steps }
                })
            }
            Command::ClearHistory => {
                self.history.clear();
                Ok(Applied::HistoryCleared)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    fn add_student(&mut self, input: NewStudent) -> Result<Applied, CoreError> {
        let student = self.state.roster.add(input)?;
        let description = format!("Added student {}", student.name);
        Ok(self.record(description, HistoryAction::StudentAdded { student }))
    }

    fn update_student(&mut self, id: StudentId, update: StudentUpdate) -> Result<Applied, CoreError> {
        let only_preferences = update.name.is_none()
            && update.attendance.is_none()
            && update.notes.is_none()
            && update.preferences.is_some();
        let (before, after) = self.state.roster.update(id, update)?;
        let description = if only_preferences {
            format!("Updated preferences for {}", after.name)
        } else {
            format!("Updated student {}", after.name)
        };
        Ok(self.record(description, HistoryAction::StudentUpdated { before, after }))
    }

    fn remove_student(&mut self, id: StudentId) -> Result<Applied, CoreError> {
        let desk = self.state.seating.desk_of(id).cloned();
        let (index, student) = self.state.roster.remove(id)?;
        self.state.seating.remove(id);
        let description = format!("Removed student {}", student.name);
        Ok(self.record(
            description,
            HistoryAction::StudentRemoved {
                index,
                student,
                desk,
            },
        ))
    }

    fn clear_roster(&mut self) -> Applied {
        if self.state.roster.is_empty() {
            return noop("roster is already empty");
        }
        let previous_seating = std::mem::take(&mut self.state.seating);
        let students = self.state.roster.clear();
        let description = format!("Removed all {} students", students.len());
        self.record(
            description,
            HistoryAction::RosterCleared {
                students,
                previous_seating,
            },
        )
    }

    // -----------------------------------------------------------------------
    // Seating
    // -----------------------------------------------------------------------

    fn assign_seat(&mut self, student: StudentId, desk: DeskId) -> Result<Applied, CoreError> {
        self.state.require_student(student)?;
        if !self.state.layouts.active().contains(&desk) {
            return Err(CoreError::not_found("desk", desk));
        }
        if self.state.seating.student_at(&desk) == Some(student) {
            return Ok(noop("student already sits there"));
        }
        let previous = self.state.seating.clone();
        self.state.seating.assign(student, desk.clone());
        let description = format!("Moved {} to {desk}", self.state.student_name(student));
        Ok(self.record(
            description,
            HistoryAction::StudentMoved {
                student,
                desk,
                previous_seating: Some(previous),
            },
        ))
    }

    fn clear_desk(&mut self, desk: DeskId) -> Applied {
        let Some(student) = self.state.seating.student_at(&desk) else {
            return noop(format!("desk {desk} is already empty"));
        };
        let previous_seating = self.state.seating.clone();
        self.state.seating.clear(&desk);
        let description = format!("Vacated {desk} ({})", self.state.student_name(student));
        self.record(
            description,
            HistoryAction::DeskVacated {
                desk,
                student,
                previous_seating,
            },
        )
    }

    fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Applied, CoreError> {
        let present = self.state.roster.present_students();
        let students = engine::apply_constraints(&present, &self.state.constraints);
        let students: Vec<&Student> = students.iter().collect();
        let generation = engine::generate(
            &students,
            self.state.layouts.active(),
            &self.state.preferences,
            rng,
        );
        if generation.nothing_to_place() {
            return Err(CoreError::NothingToPlace);
        }
        if !generation.unseated.is_empty() {
            tracing::info!(
                unseated = generation.unseated.len(),
                desks = self.state.layouts.active().len(),
                "Not enough desks for every present student"
            );
        }

        let previous = std::mem::replace(&mut self.state.seating, generation.seating.clone());
        let description = format!(
            "Generated seating for {} students",
            generation.placed()
        );
        self.history.record(
            description,
            HistoryAction::SeatingGenerated {
                previous,
                seating: generation.seating.clone(),
            },
        );
        Ok(Applied::Generated {
            mode: generation.mode,
            placed: generation.placed(),
            unseated: generation.unseated,
        })
    }

    fn clear_seating(&mut self) -> Applied {
        if self.state.seating.is_empty() {
            return noop("no seats are assigned");
        }
        let previous = std::mem::take(&mut self.state.seating);
        self.record(
            "Cleared all seats".to_string(),
            HistoryAction::SeatingCleared { previous },
        )
    }

    fn import_seating(&mut self, mut seating: SeatingMap) -> Applied {
        let roster = &self.state.roster;
        let layout = self.state.layouts.active();
        let dropped = seating.retain(|desk| layout.contains(desk), |student| roster.contains(student));
        if !dropped.is_empty() {
            tracing::warn!(dropped = dropped.len(), "Imported seating referenced unknown desks or students");
        }
        if seating == self.state.seating {
            return noop("imported seating matches the current one");
        }
        let previous = std::mem::replace(&mut self.state.seating, seating.clone());
        let description = format!("Imported seating for {} students", seating.len());
        self.record(
            description,
            HistoryAction::SeatingImported { previous, seating },
        )
    }

    // -----------------------------------------------------------------------
    // Constraints
    // -----------------------------------------------------------------------

    fn add_constraint(&mut self, input: NewConstraint) -> Result<Applied, CoreError> {
        self.state.require_student(input.student1)?;
        if let Some(other) = input.student2 {
            self.state.require_student(other)?;
        }
        let constraint = self.state.constraints.add(input)?;
        let description = match constraint.student2 {
            Some(other) => format!(
                "Added {} constraint for {} and {}",
                constraint.kind.as_str(),
                self.state.student_name(constraint.student1),
                self.state.student_name(other)
            ),
            None => format!(
                "Added {} constraint for {}",
                constraint.kind.as_str(),
                self.state.student_name(constraint.student1)
            ),
        };
        Ok(self.record(description, HistoryAction::ConstraintAdded { constraint }))
    }

    fn remove_constraint(&mut self, id: ConstraintId) -> Result<Applied, CoreError> {
        let (index, constraint) = self.state.constraints.remove(id)?;
        let description = format!("Removed {} constraint", constraint.kind.as_str());
        Ok(self.record(
            description,
            HistoryAction::ConstraintRemoved { index, constraint },
        ))
    }

    // -----------------------------------------------------------------------
    // Layouts
    // -----------------------------------------------------------------------

    fn switch_layout(&mut self, key: &str) -> Result<Applied, CoreError> {
        if self.state.layouts.active_key() == key {
            return Ok(noop(format!("layout {key} is already active")));
        }
        let previous_seating = self.state.seating.clone();
        let from = self.state.layouts.switch(key)?;

        let layout = self.state.layouts.active();
        let pruned = self.state.seating.retain(|desk| layout.contains(desk), |_| true);
        if !pruned.is_empty() {
            tracing::info!(pruned = pruned.len(), layout = key, "Vacated seats missing from the new layout");
        }
        let description = format!("Switched layout to {}", layout.name);
        let seating = self.state.seating.clone();
        Ok(self.record(
            description,
            HistoryAction::LayoutSwitched {
                from,
                to: key.to_string(),
                previous_seating,
                seating,
            },
        ))
    }

    fn save_layout(&mut self, key: &str, layout: Layout) -> Result<Applied, CoreError> {
        if self.state.layouts.active_key() == key {
            return Err(CoreError::Validation(format!(
                "Layout '{key}' is active; switch to another layout before replacing it"
            )));
        }
        let name = layout.name.clone();
        self.state.layouts.save_custom(key, layout)?;
        Ok(Applied::Unrecorded {
            description: format!("Saved layout {name} as {key}"),
        })
    }

    fn delete_layout(&mut self, key: &str) -> Result<Applied, CoreError> {
        if self.state.layouts.active_key() == key {
            return Err(CoreError::Validation(format!(
                "Layout '{key}' is active; switch to another layout before deleting it"
            )));
        }
        let removed = self.state.layouts.delete(key)?;
        Ok(Applied::Unrecorded {
            description: format!("Deleted layout {}", removed.name),
        })
    }

    // -----------------------------------------------------------------------
    // Seating preferences
    // -----------------------------------------------------------------------

    fn set_pair_probability(
        &mut self,
        a: StudentId,
        b: StudentId,
        probability: f64,
    ) -> Result<Applied, CoreError> {
        self.state.require_student(a)?;
        self.state.require_student(b)?;
        let description = format!(
            "Set pair probability for {} and {}",
            self.state.student_name(a),
            self.state.student_name(b)
        );
        self.change_preferences(description, |p| p.set_pair_probability(a, b, probability))
    }

    fn remove_pair(&mut self, a: StudentId, b: StudentId) -> Applied {
        let before = self.state.preferences.clone();
        if !self.state.preferences.remove_pair(a, b) {
            return noop("no such pair");
        }
        let description = format!(
            "Removed pair probability for {} and {}",
            self.state.student_name(a),
            self.state.student_name(b)
        );
        let after = self.state.preferences.clone();
        self.record(description, HistoryAction::PreferencesChanged { before, after })
    }

    fn change_preferences(
        &mut self,
        description: String,
        change: impl FnOnce(&mut SeatingPreferences) -> Result<(), CoreError>,
    ) -> Result<Applied, CoreError> {
        let mut after = self.state.preferences.clone();
        change(&mut after)?;
        if after == self.state.preferences {
            return Ok(noop("preferences unchanged"));
        }
        let before = std::mem::replace(&mut self.state.preferences, after.clone());
        Ok(self.record(description, HistoryAction::PreferencesChanged { before, after }))
    }
}
