//! Seatplan domain core.
//!
//! Pure domain logic for classroom seating: the roster, desk layouts,
//! seating constraints, the seating engine, and the undo/redo history that
//! wraps every change. No I/O happens here; persistence lives in
//! `seatplan-store` and change notifications in `seatplan-events`.

pub mod analytics;
pub mod classroom;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod history;
pub mod interchange;
pub mod layout;
pub mod preferences;
pub mod roster;
pub mod seating;
pub mod student;
pub mod types;

pub use classroom::{Applied, Classroom, ClassroomState, Command, DeskUpdate, DispatchOutcome};
pub use error::CoreError;
pub use history::{HistoryConfig, HistoryLog};
