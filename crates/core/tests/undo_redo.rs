//! Integration tests for the undo/redo history over full classroom sessions.
//!
//! Exercises command dispatch end to end:
//! - N undos followed by N redos restore identical state
//! - Redo branches are pruned by new commands
//! - The history cap bounds the log
//! - Persisted history with unknown entry types still navigates

use rand::rngs::StdRng;
use rand::SeedableRng;
use seatplan_core::constraint::NewConstraint;
use seatplan_core::history::{HistoryAction, HistoryEntry};
use seatplan_core::layout::LayoutTemplate;
use seatplan_core::student::{Attendance, NewStudent, StudentUpdate};
use seatplan_core::types::StudentId;
use seatplan_core::{Classroom, Command, HistoryConfig, HistoryLog};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dispatch(classroom: &mut Classroom, rng: &mut StdRng, command: Command) {
    classroom.dispatch(command, rng).unwrap();
}

fn add(classroom: &mut Classroom, rng: &mut StdRng, name: &str) -> StudentId {
    dispatch(classroom, rng, Command::AddStudent(NewStudent::named(name)));
    classroom.roster().get_by_name(name).unwrap().id
}

/// A session touching every recorded command kind.
fn busy_session(rng: &mut StdRng) -> Classroom {
    let mut c = Classroom::default();
    let ann = add(&mut c, rng, "Ann");
    let bob = add(&mut c, rng, "Bob");
    let cal = add(&mut c, rng, "Cal");
    let dee = add(&mut c, rng, "Dee");

    dispatch(&mut c, rng, Command::AddConstraint(NewConstraint::must_sit_together(ann, bob)));
    let apart = c.constraints().iter().count();
    dispatch(&mut c, rng, Command::AddConstraint(NewConstraint::cannot_sit_together(cal, dee)));
    dispatch(&mut c, rng, Command::GenerateSeating);
    dispatch(&mut c, rng, Command::AssignSeat { student: cal, desk: "middle-4".into() });
    dispatch(&mut c, rng, Command::ClearDesk { desk: "middle-4".into() });
    dispatch(
        &mut c,
        rng,
        Command::UpdateStudent {
            id: dee,
            update: StudentUpdate {
                attendance: Some(Attendance::Absent),
                notes: Some("field trip".into()),
                ..Default::default()
            },
        },
    );
    dispatch(&mut c, rng, Command::SetPairProbability { a: ann, b: cal, probability: 0.7 });
    dispatch(&mut c, rng, Command::AddTemplate(LayoutTemplate::TheaterRows));
    dispatch(&mut c, rng, Command::SwitchLayout { key: "rows".into() });
    dispatch(&mut c, rng, Command::GenerateSeating);
    let constraint = c.constraints().as_slice()[apart].id;
    dispatch(&mut c, rng, Command::RemoveConstraint { id: constraint });
    dispatch(&mut c, rng, Command::RemoveStudent { id: bob });
    dispatch(&mut c, rng, Command::ClearSeating);
    c
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn undo_everything_then_redo_everything_is_identity() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut c = busy_session(&mut rng);
    let final_state = c.state().clone();
    let n = c.history().len();
    assert!(n >= 15);

    for _ in 0..n {
        dispatch(&mut c, &mut rng, Command::Undo);
    }
    assert!(c.roster().is_empty());
    assert!(c.seating().is_empty());
    assert!(c.constraints().is_empty());
    assert_eq!(c.layouts().active_key(), "default");
    assert!(!c.history().can_undo());

    for _ in 0..n {
        dispatch(&mut c, &mut rng, Command::Redo);
    }
    assert_eq!(c.state(), &final_state);
}

#[test]
fn every_intermediate_state_is_reachable_by_jumping() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut c = Classroom::default();
    let mut snapshots = Vec::new();
    let ann = add(&mut c, &mut rng, "Ann");
    snapshots.push(c.state().clone());
    add(&mut c, &mut rng, "Bob");
    snapshots.push(c.state().clone());
    dispatch(&mut c, &mut rng, Command::AssignSeat { student: ann, desk: "right-7".into() });
    snapshots.push(c.state().clone());
    dispatch(&mut c, &mut rng, Command::GenerateSeating);
    snapshots.push(c.state().clone());

    for target in [1usize, 3, 0, 2] {
        dispatch(&mut c, &mut rng, Command::JumpTo(Some(target)));
        assert_eq!(c.state(), &snapshots[target], "state after jumping to {target}");
    }
}

#[test]
fn new_command_discards_the_redo_branch() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut c = Classroom::default();
    add(&mut c, &mut rng, "Ann");
    add(&mut c, &mut rng, "Bob");
    add(&mut c, &mut rng, "Cal");
    dispatch(&mut c, &mut rng, Command::Undo);
    dispatch(&mut c, &mut rng, Command::Undo);
    add(&mut c, &mut rng, "Dee");

    assert_eq!(c.history().len(), 2);
    assert_eq!(c.history().current_index(), Some(1));
    assert!(!c.history().can_redo());
    let names: Vec<_> = c.roster().students().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Dee"]);
}

#[test]
fn history_never_exceeds_its_cap() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut c = Classroom::new(HistoryConfig { capacity: 10 });
    for i in 0..25 {
        add(&mut c, &mut rng, &format!("Student {i}"));
        assert!(c.history().len() <= 10);
    }
    assert_eq!(c.history().current_index(), Some(9));
    assert_eq!(
        c.history().get(0).map(|e| e.description.as_str()),
        Some("Added student Student 15")
    );
}

// ---------------------------------------------------------------------------
// Persisted history
// ---------------------------------------------------------------------------

#[test]
fn unknown_entry_is_skipped_but_cursor_moves() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut c = Classroom::default();
    add(&mut c, &mut rng, "Ann");
    let (state, history) = c.into_parts();

    let mut entries: Vec<HistoryEntry> = history.entries().cloned().collect();
    entries.push(HistoryEntry::new("Painted the walls", HistoryAction::Unknown));
    let json = serde_json::to_string(&entries).unwrap();
    let entries: Vec<HistoryEntry> = serde_json::from_str(&json).unwrap();

    let log = HistoryLog::from_parts(entries, Some(1), HistoryConfig::default());
    let mut c = Classroom::from_parts(state, log);

    dispatch(&mut c, &mut rng, Command::Undo);
    assert_eq!(c.history().current_index(), Some(0));
    assert_eq!(c.roster().len(), 1);

    dispatch(&mut c, &mut rng, Command::Undo);
    assert!(c.roster().is_empty());
}
