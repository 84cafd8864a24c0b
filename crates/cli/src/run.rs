//! Subcommand execution. Every handler returns the text to print so the whole
//! front end can be driven from tests.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use seatplan_core::analytics;
use seatplan_core::constraint::{ConstraintKind, NewConstraint};
use seatplan_core::interchange::{self, Backup, ExportBundle, ImportData};
use seatplan_core::layout::Layout;
use seatplan_core::preferences::SectionWeights;
use seatplan_core::student::{NewStudent, Preferences, StudentUpdate};
use seatplan_core::types::StudentId;
use seatplan_core::{Applied, Classroom, Command, DispatchOutcome};
use seatplan_events::ClassroomEvent;
use seatplan_store::repositories::{SettingsRepo, SettingsUpdate};

use crate::args::{
    Commands, ConstraintCommand, ExportFormat, ExportTarget, ImportFormat, LayoutCommand,
    StudentCommand,
};
use crate::config::AppConfig;
use crate::session::Session;

/// Run one subcommand against the store named by `config`.
pub fn run(command: Commands, config: &AppConfig) -> Result<String> {
    let mut session = Session::open(config)?;
    match command {
        Commands::Student { command } => student(&mut session, command),
        Commands::Seat { student, desk } => {
            let student = student_id(session.classroom(), &student)?;
            execute(&mut session, Command::AssignSeat { student, desk })
        }
        Commands::Vacate { desk } => execute(&mut session, Command::ClearDesk { desk }),
        Commands::Generate => execute(&mut session, Command::GenerateSeating),
        Commands::ClearSeating => execute(&mut session, Command::ClearSeating),
        Commands::Chart => {
            let c = session.classroom();
            Ok(interchange::seating_to_text(c.seating(), c.roster(), c.active_layout()))
        }
        Commands::Constraint { command } => constraint(&mut session, command),
        Commands::Layout { command } => layout(&mut session, command),
        Commands::Pair {
            student,
            partner,
            probability,
        } => {
            let a = student_id(session.classroom(), &student)?;
            let b = student_id(session.classroom(), &partner)?;
            execute(&mut session, Command::SetPairProbability { a, b, probability })
        }
        Commands::Unpair { student, partner } => {
            let a = student_id(session.classroom(), &student)?;
            let b = student_id(session.classroom(), &partner)?;
            execute(&mut session, Command::RemovePair { a, b })
        }
        Commands::Weights { student, weights } => {
            let weights = parse_weights(&weights)?;
            let command = match student {
                Some(name) => Command::SetSectionWeights {
                    student: student_id(session.classroom(), &name)?,
                    weights,
                },
                None => Command::SetDefaultSectionWeights(weights),
            };
            execute(&mut session, command)
        }
        Commands::Undo => execute(&mut session, Command::Undo),
        Commands::Redo => execute(&mut session, Command::Redo),
        Commands::History => Ok(history(session.classroom())),
        Commands::Jump { position } => {
            let target = parse_position(&position)?;
            execute(&mut session, Command::JumpTo(target))
        }
        Commands::ClearHistory => execute(&mut session, Command::ClearHistory),
        Commands::Export {
            format,
            what,
            output,
        } => {
            let content = export(session.classroom(), format, what)?;
            match output {
                Some(path) => {
                    write_file(&path, &content)?;
                    Ok(format!("Exported to {}", path.display()))
                }
                None => Ok(content),
            }
        }
        Commands::Import { file, format } => {
            let content = read_file(&file)?;
            let data = parse_import(&content, format.unwrap_or_else(|| ImportFormat::from_path(&file)))?;
            let report = session.import(data)?;
            let mut out = format!(
                "Imported: {} added, {} updated, {} seated, {} preferences, {} constraints, {} skipped",
                report.added,
                report.updated,
                report.seated,
                report.preferences_set,
                report.constraints_added,
                report.skipped
            );
            append_events(&mut out, session.drain_events());
            Ok(out)
        }
        Commands::Backup { output } => {
            let json = Backup::capture(session.classroom()).to_json()?;
            write_file(&output, &json)?;
            Ok(format!("Backup written to {}", output.display()))
        }
        Commands::Restore { file } => {
            let backup = Backup::from_json(&read_file(&file)?)?;
            let history = session.classroom().history().config();
            session.replace(backup.restore(history))?;
            Ok(format!(
                "Restored {} students from {}",
                session.classroom().roster().len(),
                file.display()
            ))
        }
        Commands::Stats => Ok(stats(session.classroom())),
        Commands::Settings {
            default_layout,
            max_history,
        } => {
            let update = SettingsUpdate {
                default_layout,
                max_history_items: max_history,
            };
            let settings = if update.default_layout.is_none() && update.max_history_items.is_none() {
                SettingsRepo::load(session.store_mut())?
            } else {
                SettingsRepo::update(session.store_mut(), &update)?
            };
            Ok(format!(
                "default_layout = {}\nmax_history_items = {}",
                settings.default_layout, settings.max_history_items
            ))
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("Refusing to delete all data without --yes");
            }
            session.reset()?;
            Ok("All data deleted".to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch helpers
// ---------------------------------------------------------------------------

fn execute(session: &mut Session, command: Command) -> Result<String> {
    let outcome = session.execute(command)?;
    let mut out = describe(session.classroom(), &outcome);
    append_events(&mut out, session.drain_events());
    Ok(out)
}

fn describe(classroom: &Classroom, outcome: &DispatchOutcome) -> String {
    match &outcome.applied {
        Applied::Recorded { description } | Applied::Unrecorded { description } => description.clone(),
        Applied::Generated {
            mode,
            placed,
            unseated,
        } => {
            let mut line = format!("Generated seating ({mode:?}): {placed} placed");
            if !unseated.is_empty() {
                let names: Vec<_> = unseated
                    .iter()
                    .filter_map(|id| classroom.roster().name_of(*id))
                    .collect();
                let _ = write!(line, ", no desk for {}", names.join(", "));
            }
            line
        }
        Applied::Undone { description } => {
            format!("Undid: {}", description.as_deref().unwrap_or("unknown change"))
        }
        Applied::Redone { description } => {
            format!("Redid: {}", description.as_deref().unwrap_or("unknown change"))
        }
        Applied::Jumped { steps } => format!("Moved {steps} step(s) through the history"),
        Applied::HistoryCleared => "History cleared".to_string(),
        Applied::NoOp { reason } => format!("Nothing changed: {reason}"),
    }
}

fn append_events(out: &mut String, events: Vec<ClassroomEvent>) {
    for event in events {
        if let ClassroomEvent::DeskUpdated {
            desk_id,
            student_name,
            ..
        } = event
        {
            if student_name.is_empty() {
                let _ = write!(out, "\n  {desk_id}: empty");
            } else {
                let _ = write!(out, "\n  {desk_id}: {student_name}");
            }
        }
    }
}

fn student_id(classroom: &Classroom, name: &str) -> Result<StudentId> {
    classroom
        .roster()
        .get_by_name(name)
        .map(|s| s.id)
        .ok_or_else(|| anyhow!("No student named '{name}'"))
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

fn student(session: &mut Session, command: StudentCommand) -> Result<String> {
    match command {
        StudentCommand::Add {
            name,
            attendance,
            notes,
        } => {
            let mut input = NewStudent::named(name);
            if let Some(attendance) = attendance {
                input = input.with_attendance(attendance);
            }
            if let Some(notes) = notes {
                input = input.with_notes(notes);
            }
            execute(session, Command::AddStudent(input))
        }
        StudentCommand::Remove { name } => {
            let id = student_id(session.classroom(), &name)?;
            execute(session, Command::RemoveStudent { id })
        }
        StudentCommand::Rename { name, new_name } => update(
            session,
            &name,
            StudentUpdate {
                name: Some(new_name),
                ..Default::default()
            },
        ),
        StudentCommand::Mark { name, attendance } => update(
            session,
            &name,
            StudentUpdate {
                attendance: Some(attendance),
                ..Default::default()
            },
        ),
        StudentCommand::Note { name, notes } => update(
            session,
            &name,
            StudentUpdate {
                notes: Some(notes),
                ..Default::default()
            },
        ),
        StudentCommand::Prefer { name, partner } => {
            let partner = student_id(session.classroom(), &partner)?;
            edit_preferences(session, &name, |prefs| {
                prefs.avoid_partners.remove(&partner);
                prefs.preferred_partners.insert(partner);
            })
        }
        StudentCommand::Avoid { name, partner } => {
            let partner = student_id(session.classroom(), &partner)?;
            edit_preferences(session, &name, |prefs| {
                prefs.preferred_partners.remove(&partner);
                prefs.avoid_partners.insert(partner);
            })
        }
        StudentCommand::Section {
            name,
            section,
            weight,
        } => edit_preferences(session, &name, |prefs| {
            prefs.section_preference = section;
            if let Some(weight) = weight {
                prefs.section_weight = weight;
            }
        }),
        StudentCommand::List => Ok(roster_listing(session.classroom())),
        StudentCommand::Clear => execute(session, Command::ClearRoster),
    }
}

fn update(session: &mut Session, name: &str, update: StudentUpdate) -> Result<String> {
    let id = student_id(session.classroom(), name)?;
    execute(session, Command::UpdateStudent { id, update })
}

fn edit_preferences(
    session: &mut Session,
    name: &str,
    edit: impl FnOnce(&mut Preferences),
) -> Result<String> {
    let student = session
        .classroom()
        .roster()
        .get_by_name(name)
        .ok_or_else(|| anyhow!("No student named '{name}'"))?;
    let id = student.id;
    let mut preferences = student.preferences.clone();
    edit(&mut preferences);
    execute(session, Command::SetPreferences { id, preferences })
}

fn roster_listing(classroom: &Classroom) -> String {
    let roster = classroom.roster();
    if roster.is_empty() {
        return "No students".to_string();
    }
    let mut out = String::new();
    for (i, s) in roster.students().iter().enumerate() {
        let desk = classroom
            .seating()
            .desk_of(s.id)
            .map(String::as_str)
            .unwrap_or("-");
        let _ = write!(out, "{:>3}. {:<24} {:<8} {}", i + 1, s.name, s.attendance.as_str(), desk);
        if !s.notes.is_empty() {
            let _ = write!(out, "  ({})", s.notes);
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Constraints and layouts
// ---------------------------------------------------------------------------

fn constraint(session: &mut Session, command: ConstraintCommand) -> Result<String> {
    match command {
        ConstraintCommand::Add {
            kind,
            student,
            other,
        } => {
            let kind = ConstraintKind::from(kind);
            let student1 = student_id(session.classroom(), &student)?;
            let student2 = other
                .map(|name| student_id(session.classroom(), &name))
                .transpose()?;
            execute(
                session,
                Command::AddConstraint(NewConstraint {
                    kind,
                    student1,
                    student2,
                }),
            )
        }
        ConstraintCommand::Remove { number } => {
            let id = number
                .checked_sub(1)
                .and_then(|i| session.classroom().constraints().as_slice().get(i))
                .map(|c| c.id)
                .ok_or_else(|| anyhow!("No constraint number {number}"))?;
            execute(session, Command::RemoveConstraint { id })
        }
        ConstraintCommand::List => {
            let c = session.classroom();
            if c.constraints().is_empty() {
                return Ok("No constraints".to_string());
            }
            let name = |id: StudentId| c.roster().name_of(id).unwrap_or("(removed)").to_string();
            let lines: Vec<_> = c
                .constraints()
                .iter()
                .enumerate()
                .map(|(i, con)| match con.student2 {
                    Some(other) => format!(
                        "{:>3}. {} {} / {}",
                        i + 1,
                        con.kind.as_str(),
                        name(con.student1),
                        name(other)
                    ),
                    None => format!("{:>3}. {} {}", i + 1, con.kind.as_str(), name(con.student1)),
                })
                .collect();
            Ok(lines.join("\n"))
        }
        ConstraintCommand::Check => {
            let violations = session.classroom().validate_seating();
            if violations.is_empty() {
                return Ok("No constraint violations".to_string());
            }
            Ok(violations
                .iter()
                .map(|v| format!("{} ({} / {})", v.message, v.desks.0, v.desks.1))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

fn layout(session: &mut Session, command: LayoutCommand) -> Result<String> {
    match command {
        LayoutCommand::List => {
            let catalog = session.classroom().layouts();
            let lines: Vec<_> = catalog
                .list()
                .into_iter()
                .map(|(key, layout)| {
                    let marker = if key == catalog.active_key() { '*' } else { ' ' };
                    format!("{marker} {key:<12} {} ({} desks)", layout.name, layout.len())
                })
                .collect();
            Ok(lines.join("\n"))
        }
        LayoutCommand::Use { key } => execute(session, Command::SwitchLayout { key }),
        LayoutCommand::Template { template } => execute(session, Command::AddTemplate(template.into())),
        LayoutCommand::Save { key, name, points } => {
            let points = points
                .iter()
                .map(|p| parse_point(p))
                .collect::<Result<Vec<_>>>()?;
            let layout = Layout::freeform(name.unwrap_or_else(|| key.clone()), &points)?;
            execute(session, Command::SaveLayout { key, layout })
        }
        LayoutCommand::Delete { key } => execute(session, Command::DeleteLayout { key }),
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

fn history(classroom: &Classroom) -> String {
    let history = classroom.history();
    if history.is_empty() {
        return "No history".to_string();
    }
    let current = history.current_index();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  start",
        if current.is_none() { '>' } else { ' ' }
    );
    for (i, entry) in history.entries().enumerate() {
        let marker = if current == Some(i) { '>' } else { ' ' };
        let undone = if current.map_or(true, |c| i > c) { " (undone)" } else { "" };
        let _ = writeln!(
            out,
            "{marker}{:>3}  {}  {}{undone}",
            i,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.description
        );
    }
    out.trim_end().to_string()
}

fn stats(classroom: &Classroom) -> String {
    let s = analytics::analyze(classroom);
    let mut out = String::new();
    let _ = writeln!(out, "Students:       {}", s.total_students);
    let _ = writeln!(out, "Seated:         {}", s.seated_students);
    let _ = writeln!(
        out,
        "Attendance:     {} present, {} absent, {} late",
        s.attendance.present, s.attendance.absent, s.attendance.late
    );
    let _ = writeln!(
        out,
        "Desks:          {} ({} empty, {:.0}% used)",
        s.total_desks,
        s.empty_seats,
        s.occupancy() * 100.0
    );
    for section in &s.sections {
        let _ = writeln!(out, "  {:<12} {}/{}", section.section, section.occupied, section.desks);
    }
    if !s.unseated_present.is_empty() {
        let names: Vec<_> = s
            .unseated_present
            .iter()
            .filter_map(|id| classroom.roster().name_of(*id))
            .collect();
        let _ = writeln!(out, "Waiting:        {}", names.join(", "));
    }
    let _ = writeln!(out, "Violations:     {}", s.violations.len());
    out.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Interchange
// ---------------------------------------------------------------------------

fn export(classroom: &Classroom, format: ExportFormat, what: ExportTarget) -> Result<String> {
    let roster = classroom.roster();
    let seating = classroom.seating();
    let content = match (format, what) {
        (ExportFormat::Json, _) => ExportBundle::from_classroom(classroom).to_json()?,
        (ExportFormat::Csv, ExportTarget::Students) => interchange::students_to_csv(roster)?,
        (ExportFormat::Csv, ExportTarget::Seating) => interchange::seating_to_csv(seating, roster)?,
        (ExportFormat::Csv, ExportTarget::All) => format!(
            "{}\n{}",
            interchange::students_to_csv(roster)?,
            interchange::seating_to_csv(seating, roster)?
        ),
        (ExportFormat::Text, ExportTarget::Students) => interchange::students_to_text(roster),
        (ExportFormat::Text, ExportTarget::Seating) => {
            interchange::seating_to_text(seating, roster, classroom.active_layout())
        }
        (ExportFormat::Text, ExportTarget::All) => format!(
            "{}\n\n{}",
            interchange::students_to_text(roster),
            interchange::seating_to_text(seating, roster, classroom.active_layout())
        ),
    };
    Ok(content)
}

fn parse_import(content: &str, format: ImportFormat) -> Result<ImportData> {
    Ok(match format {
        ImportFormat::Json => interchange::parse_json(content)?,
        ImportFormat::Csv => interchange::parse_csv(content)?,
        ImportFormat::Text => interchange::parse_text(content),
    })
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

fn parse_weights(items: &[String]) -> Result<SectionWeights> {
    items
        .iter()
        .map(|item| {
            let (section, weight) = item
                .split_once('=')
                .ok_or_else(|| anyhow!("Expected section=weight, got '{item}'"))?;
            let weight: f64 = weight
                .trim()
                .parse()
                .with_context(|| format!("Invalid weight in '{item}'"))?;
            Ok((section.trim().to_string(), weight))
        })
        .collect()
}

fn parse_position(position: &str) -> Result<Option<usize>> {
    if position.eq_ignore_ascii_case("start") {
        return Ok(None);
    }
    position
        .parse::<usize>()
        .map(Some)
        .with_context(|| format!("Expected an entry number or 'start', got '{position}'"))
}

fn parse_point(point: &str) -> Result<(f64, f64)> {
    let (x, y) = point
        .split_once(',')
        .ok_or_else(|| anyhow!("Expected x,y, got '{point}'"))?;
    let x = x.trim().parse().with_context(|| format!("Invalid x in '{point}'"))?;
    let y = y.trim().parse().with_context(|| format!("Invalid y in '{point}'"))?;
    Ok((x, y))
}
