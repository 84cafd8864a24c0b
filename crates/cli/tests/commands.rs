//! End-to-end tests of the command-line front end against a JSON store in a
//! temporary directory. Every call is a separate "invocation" that reopens
//! the store.

use std::path::Path;

use clap::Parser;
use seatplan_cli::args::Cli;
use seatplan_cli::config::AppConfig;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config_in(dir: &TempDir) -> AppConfig {
    AppConfig {
        data_path: dir.path().join("class.json"),
        seed: Some(99),
        ..AppConfig::default()
    }
}

fn try_invoke(config: &AppConfig, args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("seatplan").chain(args.iter().copied()))?;
    seatplan_cli::run(cli.command, config)
}

fn invoke(config: &AppConfig, args: &[&str]) -> String {
    try_invoke(config, args).unwrap_or_else(|e| panic!("{args:?} failed: {e:#}"))
}

fn add_students(config: &AppConfig, names: &[&str]) {
    for name in names {
        invoke(config, &["student", "add", name]);
    }
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ---------------------------------------------------------------------------
// Roster and seating
// ---------------------------------------------------------------------------

#[test]
fn changes_persist_between_invocations() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    add_students(&config, &["Ann", "Bob"]);

    let out = invoke(&config, &["seat", "ann", "left-0"]);
    assert!(out.contains("left-0: Ann"), "{out}");

    let list = invoke(&config, &["student", "list"]);
    assert!(list.contains("Ann"));
    assert!(list.contains("left-0"));
    assert!(invoke(&config, &["chart"]).contains("left-0: Ann"));
}

#[test]
fn same_seed_generates_the_same_seating() {
    let lists: Vec<String> = (0..2)
        .map(|_| {
            let dir = TempDir::new().unwrap();
            let config = config_in(&dir);
            add_students(&config, &["Ann", "Bob", "Cal", "Dee", "Eve"]);
            let out = invoke(&config, &["generate"]);
            assert!(out.contains("5 placed"), "{out}");
            invoke(&config, &["student", "list"])
        })
        .collect();
    assert_eq!(lists[0], lists[1]);
}

#[test]
fn undo_and_redo_survive_reopening() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    add_students(&config, &["Ann", "Bob"]);

    assert!(invoke(&config, &["undo"]).contains("Undid: Added student Bob"));
    assert!(!invoke(&config, &["student", "list"]).contains("Bob"));

    invoke(&config, &["redo"]);
    assert!(invoke(&config, &["student", "list"]).contains("Bob"));

    invoke(&config, &["jump", "start"]);
    assert_eq!(invoke(&config, &["student", "list"]), "No students");
    let history = invoke(&config, &["history"]);
    assert!(history.starts_with(">  start"), "{history}");
    assert!(history.contains("(undone)"));
}

#[test]
fn constraints_are_listed_and_checked() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    add_students(&config, &["Ann", "Bob"]);
    invoke(&config, &["constraint", "add", "apart", "Ann", "Bob"]);
    invoke(&config, &["seat", "Ann", "left-0"]);
    invoke(&config, &["seat", "Bob", "left-1"]);

    let list = invoke(&config, &["constraint", "list"]);
    assert!(list.contains("cannot-sit-together Ann / Bob"), "{list}");
    assert_ne!(invoke(&config, &["constraint", "check"]), "No constraint violations");

    invoke(&config, &["constraint", "remove", "1"]);
    assert_eq!(invoke(&config, &["constraint", "list"]), "No constraints");
    assert!(try_invoke(&config, &["constraint", "remove", "1"]).is_err());
}

#[test]
fn layouts_can_be_added_and_switched() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    invoke(&config, &["layout", "template", "u-shape"]);
    invoke(&config, &["layout", "save", "lab", "--name", "Lab", "0,0", "140,0"]);
    invoke(&config, &["layout", "use", "lab"]);

    let list = invoke(&config, &["layout", "list"]);
    assert!(list.contains("* lab"), "{list}");
    assert!(list.contains("u-shape"));
    assert!(try_invoke(&config, &["layout", "delete", "lab"]).is_err());
}

// ---------------------------------------------------------------------------
// Interchange
// ---------------------------------------------------------------------------

#[test]
fn json_export_imports_into_a_fresh_store() {
    let source_dir = TempDir::new().unwrap();
    let source = config_in(&source_dir);
    add_students(&source, &["Ann", "Bob", "Cal"]);
    invoke(&source, &["student", "mark", "Cal", "absent"]);
    invoke(&source, &["seat", "Bob", "middle-4"]);
    let file = source_dir.path().join("export.json");
    invoke(&source, &["export", "json", "-o", path_arg(&file)]);

    let target_dir = TempDir::new().unwrap();
    let target = config_in(&target_dir);
    let out = invoke(&target, &["import", path_arg(&file)]);
    assert!(out.starts_with("Imported: 3 added, 0 updated, 1 seated"), "{out}");

    let list = invoke(&target, &["student", "list"]);
    assert!(list.contains("absent"));
    assert!(list.contains("middle-4"));
}

#[test]
fn text_import_reads_names() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let file = dir.path().join("names.txt");
    std::fs::write(&file, "1. Ann\n2. Bob\n\nCal\n").unwrap();
    let out = invoke(&config, &["import", path_arg(&file)]);
    assert!(out.starts_with("Imported: 3 added"), "{out}");
}

#[test]
fn backup_and_restore_replace_everything() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    add_students(&config, &["Ann"]);
    let backup = dir.path().join("backup.json");
    invoke(&config, &["backup", path_arg(&backup)]);

    add_students(&config, &["Bob"]);
    let out = invoke(&config, &["restore", path_arg(&backup)]);
    assert!(out.starts_with("Restored 1 students"), "{out}");
    assert!(!invoke(&config, &["student", "list"]).contains("Bob"));
}

// ---------------------------------------------------------------------------
// Settings and errors
// ---------------------------------------------------------------------------

#[test]
fn default_layout_setting_applies_to_a_fresh_classroom() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let out = invoke(&config, &["settings", "--default-layout", "groups"]);
    assert!(out.contains("default_layout = groups"));
    assert!(invoke(&config, &["layout", "list"]).contains("* groups"));
}

#[test]
fn user_errors_are_reported() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    add_students(&config, &["Ann"]);

    assert!(try_invoke(&config, &["seat", "Zed", "left-0"]).is_err());
    assert!(try_invoke(&config, &["student", "add", "ann"]).is_err());
    assert!(try_invoke(&config, &["reset"]).is_err());
    assert!(invoke(&config, &["seat", "Ann", "nowhere-1"]).starts_with("Nothing changed"));

    invoke(&config, &["reset", "--yes"]);
    assert_eq!(invoke(&config, &["student", "list"]), "No students");
}

#[test]
fn stats_summarise_the_classroom() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    add_students(&config, &["Ann", "Bob"]);
    invoke(&config, &["seat", "Ann", "left-0"]);
    let stats = invoke(&config, &["stats"]);
    assert!(stats.contains("Students:       2"), "{stats}");
    assert!(stats.contains("Waiting:        Bob"), "{stats}");
}
