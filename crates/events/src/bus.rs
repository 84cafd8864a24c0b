//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans [`ClassroomEvent`]s out to any number of subscribers.
//! Sending never blocks and needs no runtime, so the bus can be driven from
//! the synchronous dispatch loop.

use seatplan_core::types::{DeskId, StudentId};
use seatplan_core::{Applied, Classroom, DispatchOutcome};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ClassroomEvent
// ---------------------------------------------------------------------------

/// A change a view of the classroom has to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassroomEvent {
    /// The occupant of a desk changed. `student_name` is empty and
    /// `student_id` is `None` when the desk was vacated.
    DeskUpdated {
        desk_id: DeskId,
        student_id: Option<StudentId>,
        student_name: String,
    },
    /// Students were added, removed or edited.
    RosterChanged,
    /// The undo/redo cursor or the log itself changed.
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
        undo_description: Option<String>,
        redo_description: Option<String>,
    },
}

impl ClassroomEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassroomEvent::DeskUpdated { .. } => "desk_updated",
            ClassroomEvent::RosterChanged => "roster_changed",
            ClassroomEvent::HistoryChanged { .. } => "history_changed",
        }
    }

    fn history_of(classroom: &Classroom) -> Self {
        let history = classroom.history();
        ClassroomEvent::HistoryChanged {
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            undo_description: history.undo_description().map(str::to_string),
            redo_description: history.redo_description().map(str::to_string),
        }
    }
}

/// Events describing one dispatch, in publish order: desk updates, then the
/// roster notice, then the history notice. A no-op yields nothing.
pub fn events_for(classroom: &Classroom, outcome: &DispatchOutcome) -> Vec<ClassroomEvent> {
    if outcome.is_noop() {
        return Vec::new();
    }

    let mut events: Vec<ClassroomEvent> = outcome
        .desk_updates
        .iter()
        .map(|u| ClassroomEvent::DeskUpdated {
            desk_id: u.desk_id.clone(),
            student_id: u.student_id,
            student_name: u.student_name.clone(),
        })
        .collect();

    if outcome.roster_changed {
        events.push(ClassroomEvent::RosterChanged);
    }
    if !matches!(outcome.applied, Applied::Unrecorded { .. }) {
        events.push(ClassroomEvent::history_of(classroom));
    }
    events
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

pub struct EventBus {
    sender: broadcast::Sender<ClassroomEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all current subscribers. Without subscribers the
    /// event is dropped.
    pub fn publish(&self, event: ClassroomEvent) {
        // A send error only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Publish everything a dispatch changed. Returns the number of events.
    pub fn publish_dispatch(&self, classroom: &Classroom, outcome: &DispatchOutcome) -> usize {
        let events = events_for(classroom, outcome);
        let count = events.len();
        for event in events {
            tracing::trace!(kind = event.kind(), "Publishing classroom event");
            self.publish(event);
        }
        count
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClassroomEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
