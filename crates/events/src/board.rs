//! A bus subscriber that keeps a desk → label map up to date, the way a
//! seating chart view would.

use std::collections::BTreeMap;

use seatplan_core::types::DeskId;
use seatplan_core::Classroom;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use crate::bus::{ClassroomEvent, EventBus};

pub struct DeskBoard {
    receiver: Receiver<ClassroomEvent>,
    labels: BTreeMap<DeskId, String>,
    roster_dirty: bool,
    needs_resync: bool,
}

impl DeskBoard {
    /// Subscribe to `bus` and take the initial labels from `classroom`.
    pub fn attach(bus: &EventBus, classroom: &Classroom) -> Self {
        let mut board = Self {
            receiver: bus.subscribe(),
            labels: BTreeMap::new(),
            roster_dirty: false,
            needs_resync: false,
        };
        board.resync(classroom);
        board
    }

    /// Rebuild every label from the classroom and clear the dirty flags.
    pub fn resync(&mut self, classroom: &Classroom) {
        self.labels = classroom
            .seating()
            .iter()
            .map(|(desk, student)| {
                let name = classroom.roster().name_of(*student).unwrap_or_default();
                (desk.clone(), name.to_string())
            })
            .collect();
        self.roster_dirty = false;
        self.needs_resync = false;
    }

    /// Drain pending events. Returns how many were applied.
    ///
    /// If the receiver fell behind the channel, some updates are lost and
    /// [`DeskBoard::needs_resync`] turns `true`.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    self.apply(event);
                    applied += 1;
                }
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Desk board lagged behind the event bus");
                    self.needs_resync = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        applied
    }

    fn apply(&mut self, event: ClassroomEvent) {
        match event {
            ClassroomEvent::DeskUpdated {
                desk_id,
                student_name,
                ..
            } => {
                if student_name.is_empty() {
                    self.labels.remove(&desk_id);
                } else {
                    self.labels.insert(desk_id, student_name);
                }
            }
            ClassroomEvent::RosterChanged => self.roster_dirty = true,
            ClassroomEvent::HistoryChanged { .. } => {}
        }
    }

    /// Label shown on `desk`, `None` for an empty desk.
    pub fn label(&self, desk: &str) -> Option<&str> {
        self.labels.get(desk).map(String::as_str)
    }

    pub fn occupied(&self) -> usize {
        self.labels.len()
    }

    /// A roster change arrived since the last resync. Renames do not move
    /// anyone, so desk labels may be stale until the next resync.
    pub fn roster_dirty(&self) -> bool {
        self.roster_dirty
    }

    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }
}
