//! Command-line grammar.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use seatplan_core::constraint::ConstraintKind;
use seatplan_core::layout::LayoutTemplate;
use seatplan_core::student::Attendance;

#[derive(Parser, Debug)]
#[command(name = "seatplan", author, version, about = "Plan who sits where in a classroom")]
pub struct Cli {
    /// JSON data file (overrides SEATPLAN_DATA)
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Fixed random seed (overrides SEATPLAN_SEED)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the roster
    Student {
        #[command(subcommand)]
        command: StudentCommand,
    },
    /// Put a student at a desk
    Seat { student: String, desk: String },
    /// Empty a desk
    Vacate { desk: String },
    /// Seat every present student automatically
    Generate,
    /// Remove all seat assignments
    ClearSeating,
    /// Print the seating chart of the active layout
    Chart,
    /// Manage seating constraints
    Constraint {
        #[command(subcommand)]
        command: ConstraintCommand,
    },
    /// Manage desk layouts
    Layout {
        #[command(subcommand)]
        command: LayoutCommand,
    },
    /// Set the probability that two students sit together
    Pair {
        student: String,
        partner: String,
        probability: f64,
    },
    /// Forget the probability configured for two students
    Unpair { student: String, partner: String },
    /// Set section weights, e.g. `left=2 middle=1`
    Weights {
        /// Student the weights apply to; the classroom default otherwise
        #[arg(long)]
        student: Option<String>,
        #[arg(required = true)]
        weights: Vec<String>,
    },
    /// Undo the last change
    Undo,
    /// Redo the last undone change
    Redo,
    /// List the change history
    History,
    /// Move to a point in the history: an entry number or `start`
    Jump { position: String },
    /// Forget the change history
    ClearHistory,
    /// Write students and seating to a file or stdout
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        #[arg(long, value_enum, default_value_t = ExportTarget::All)]
        what: ExportTarget,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge students, seating and constraints from a file
    Import {
        file: PathBuf,
        /// Defaults to the file extension
        #[arg(long, value_enum)]
        format: Option<ImportFormat>,
    },
    /// Save a full backup
    Backup { output: PathBuf },
    /// Replace everything with a backup
    Restore { file: PathBuf },
    /// Print seating statistics
    Stats,
    /// Show or change stored settings
    Settings {
        #[arg(long)]
        default_layout: Option<String>,
        #[arg(long)]
        max_history: Option<usize>,
    },
    /// Delete all stored data
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum StudentCommand {
    Add {
        name: String,
        #[arg(long)]
        attendance: Option<Attendance>,
        #[arg(long)]
        notes: Option<String>,
    },
    Remove { name: String },
    Rename { name: String, new_name: String },
    /// Set attendance: present, absent or late
    Mark { name: String, attendance: Attendance },
    Note { name: String, notes: String },
    /// Add a preferred partner
    Prefer { name: String, partner: String },
    /// Add a partner to keep apart from
    Avoid { name: String, partner: String },
    /// Set or clear the preferred section
    Section {
        name: String,
        section: Option<String>,
        #[arg(long)]
        weight: Option<f64>,
    },
    List,
    /// Remove every student
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConstraintCommand {
    Add {
        #[arg(value_enum)]
        kind: ConstraintKindArg,
        student: String,
        other: Option<String>,
    },
    /// Remove by the number shown in `constraint list`
    Remove { number: usize },
    List,
    /// Show constraints the current seating breaks
    Check,
}

#[derive(Subcommand, Debug)]
pub enum LayoutCommand {
    List,
    Use { key: String },
    /// Add a predefined layout
    Template {
        #[arg(value_enum)]
        template: TemplateArg,
    },
    /// Save a freeform layout from `x,y` desk positions
    Save {
        key: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(required = true)]
        points: Vec<String>,
    },
    Delete { key: String },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKindArg {
    Apart,
    Together,
    Area,
}

impl From<ConstraintKindArg> for ConstraintKind {
    fn from(arg: ConstraintKindArg) -> Self {
        match arg {
            ConstraintKindArg::Apart => ConstraintKind::CannotSitTogether,
            ConstraintKindArg::Together => ConstraintKind::MustSitTogether,
            ConstraintKindArg::Area => ConstraintKind::PreferredArea,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateArg {
    Standard,
    UShape,
    Groups,
    Rows,
}

impl From<TemplateArg> for LayoutTemplate {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Standard => LayoutTemplate::Standard,
            TemplateArg::UShape => LayoutTemplate::UShape,
            TemplateArg::Groups => LayoutTemplate::Groups,
            TemplateArg::Rows => LayoutTemplate::TheaterRows,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Text,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportTarget {
    Students,
    Seating,
    All,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
    Text,
}

impl ImportFormat {
    /// Guess from the file extension; anything unknown is plain text.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => ImportFormat::Json,
            Some("csv") => ImportFormat::Csv,
            _ => ImportFormat::Text,
        }
    }
}
