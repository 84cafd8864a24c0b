//! Read-only statistics over a classroom.

use serde::Serialize;

use crate::classroom::Classroom;
use crate::constraint::Violation;
use crate::student::Attendance;
use crate::types::{SectionId, StudentId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceBreakdown {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionOccupancy {
    pub section: SectionId,
    pub desks: usize,
    pub occupied: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatingAnalytics {
    pub total_students: usize,
    pub seated_students: usize,
    /// Present students without a desk.
    pub unseated_present: Vec<StudentId>,
    pub total_desks: usize,
    /// Desks of the active layout nobody sits at.
    pub empty_seats: usize,
    pub attendance: AttendanceBreakdown,
    pub sections: Vec<SectionOccupancy>,
    pub violations: Vec<Violation>,
}

impl SeatingAnalytics {
    /// Share of desks in use, `0.0` for an empty layout.
    pub fn occupancy(&self) -> f64 {
        if self.total_desks == 0 {
            0.0
        } else {
            (self.total_desks - self.empty_seats) as f64 / self.total_desks as f64
        }
    }
}

pub fn analyze(classroom: &Classroom) -> SeatingAnalytics {
    let roster = classroom.roster();
    let seating = classroom.seating();
    let layout = classroom.active_layout();

    let mut attendance = AttendanceBreakdown::default();
    for student in roster.students() {
        match student.attendance {
            Attendance::Present => attendance.present += 1,
            Attendance::Absent => attendance.absent += 1,
            Attendance::Late => attendance.late += 1,
        }
    }

    let occupied = layout
        .desks
        .iter()
        .filter(|d| seating.student_at(&d.id).is_some())
        .count();

    let sections = layout
        .sections()
        .into_iter()
        .map(|section| {
            let desks: Vec<_> = layout.desks.iter().filter(|d| d.section == section).collect();
            let occupied = desks
                .iter()
                .filter(|d| seating.student_at(&d.id).is_some())
                .count();
            SectionOccupancy {
                section,
                desks: desks.len(),
                occupied,
            }
        })
        .collect();

    SeatingAnalytics {
        total_students: roster.len(),
        seated_students: roster
            .students()
            .iter()
            .filter(|s| seating.is_seated(s.id))
            .count(),
        unseated_present: roster
            .present_students()
            .iter()
            .filter(|s| !seating.is_seated(s.id))
            .map(|s| s.id)
            .collect(),
        total_desks: layout.len(),
        empty_seats: layout.len() - occupied,
        attendance,
        sections,
        violations: classroom.validate_seating(),
    }
}
