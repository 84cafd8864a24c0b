//! Seating generation.
//!
//! Three strategies share one entry point, [`generate`]:
//!
//! - **Uniform**: shuffle students and desks, pair them positionally.
//! - **Weighted**: greedy placement by priority, scoring every free desk by
//!   section preference and already-seated neighbours, then picking at random
//!   among the best few.
//! - **Pair probability**: weighted random section draw per student, with a
//!   configured chance of landing next to an already-seated partner.
//!
//! Every function takes the random source as a parameter so callers can seed
//! it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constraint::{ConstraintKind, ConstraintSet};
use crate::layout::{Desk, Layout, PROXIMITY_RADIUS};
use crate::preferences::SeatingPreferences;
use crate::seating::SeatingMap;
use crate::student::Student;
use crate::types::{SectionId, StudentId};

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

/// Multiplier applied to a student's section weight when the desk is in the
/// preferred section.
pub const SECTION_BONUS_FACTOR: f64 = 2.0;

/// Bonus per neighbouring desk occupied by a preferred partner.
pub const PREFERRED_NEIGHBOR_BONUS: f64 = 3.0;

/// Penalty per neighbouring desk occupied by an avoided partner.
pub const AVOIDED_NEIGHBOR_PENALTY: f64 = -5.0;

/// Bonus for a desk with a free neighbour while preferred partners are still
/// waiting to be placed.
pub const PARTNER_ROOM_BONUS: f64 = 2.0;

/// How many of the best-scoring desks are eligible for the final random pick.
pub const TOP_CANDIDATES: usize = 3;

/// Eligible desks must score within this distance of the best desk. Equals the
/// width of the random jitter, so unconstrained desks are never excluded.
pub const SCORE_WINDOW: f64 = 1.0;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatingMode {
    Uniform,
    Weighted,
    PairProbability,
}

impl SeatingMode {
    /// Pick the strategy for this set of students.
    ///
    /// Individual preferences win, then classroom pair/section configuration,
    /// then uniform shuffling.
    pub fn select(students: &[&Student], preferences: &SeatingPreferences) -> Self {
        if students.iter().any(|s| s.preferences.is_set()) {
            SeatingMode::Weighted
        } else if preferences.is_configured() {
            SeatingMode::PairProbability
        } else {
            SeatingMode::Uniform
        }
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub seating: SeatingMap,
    pub mode: SeatingMode,
    /// Students left without a desk because the pool ran out.
    pub unseated: Vec<StudentId>,
    requested: usize,
}

impl Generation {
    pub fn placed(&self) -> usize {
        self.seating.len()
    }

    /// `true` when there were no students to place at all.
    pub fn nothing_to_place(&self) -> bool {
        self.requested == 0
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Generate a seating for `students` over every desk of `layout`, choosing
/// the strategy with [`SeatingMode::select`].
pub fn generate<R: Rng + ?Sized>(
    students: &[&Student],
    layout: &Layout,
    preferences: &SeatingPreferences,
    rng: &mut R,
) -> Generation {
    let mode = SeatingMode::select(students, preferences);
    generate_with_mode(mode, students, layout, preferences, rng)
}

/// Generate with an explicit strategy.
pub fn generate_with_mode<R: Rng + ?Sized>(
    mode: SeatingMode,
    students: &[&Student],
    layout: &Layout,
    preferences: &SeatingPreferences,
    rng: &mut R,
) -> Generation {
    let (seating, unseated) = if students.is_empty() {
        (SeatingMap::new(), Vec::new())
    } else {
        match mode {
            SeatingMode::Uniform => uniform(students, layout, rng),
            SeatingMode::Weighted => weighted(students, layout, rng),
            SeatingMode::PairProbability => pair_probability(students, layout, preferences, rng),
        }
    };
    tracing::debug!(
        ?mode,
        requested = students.len(),
        placed = seating.len(),
        unseated = unseated.len(),
        "Generated seating"
    );
    Generation {
        seating,
        mode,
        unseated,
        requested: students.len(),
    }
}

/// Copy `students` with binary constraints folded into their partner
/// preferences: must-sit-together becomes a mutual preferred partner,
/// cannot-sit-together a mutual avoided one.
pub fn apply_constraints(students: &[&Student], constraints: &ConstraintSet) -> Vec<Student> {
    let mut folded: Vec<Student> = students.iter().map(|s| (*s).clone()).collect();
    for constraint in constraints.iter() {
        let Some(other) = constraint.student2 else {
            continue;
        };
        for (me, partner) in [(constraint.student1, other), (other, constraint.student1)] {
            let Some(student) = folded.iter_mut().find(|s| s.id == me) else {
                continue;
            };
            let prefs = &mut student.preferences;
            match constraint.kind {
                ConstraintKind::MustSitTogether if !prefs.avoid_partners.contains(&partner) => {
                    prefs.preferred_partners.insert(partner);
                }
                ConstraintKind::CannotSitTogether => {
                    prefs.preferred_partners.remove(&partner);
                    prefs.avoid_partners.insert(partner);
                }
                _ => {}
            }
        }
    }
    folded
}

// ---------------------------------------------------------------------------
// Uniform
// ---------------------------------------------------------------------------

fn uniform<R: Rng + ?Sized>(
    students: &[&Student],
    layout: &Layout,
    rng: &mut R,
) -> (SeatingMap, Vec<StudentId>) {
    let mut order: Vec<StudentId> = students.iter().map(|s| s.id).collect();
    let mut desks: Vec<&Desk> = layout.desks.iter().collect();
    order.shuffle(rng);
    desks.shuffle(rng);

    let placed = order.len().min(desks.len());
    let mut seating = SeatingMap::new();
    for (student, desk) in order.iter().zip(desks) {
        seating.assign(*student, desk.id.clone());
    }
    (seating, order[placed..].to_vec())
}

// ---------------------------------------------------------------------------
// Weighted
// ---------------------------------------------------------------------------

fn weighted<R: Rng + ?Sized>(
    students: &[&Student],
    layout: &Layout,
    rng: &mut R,
) -> (SeatingMap, Vec<StudentId>) {
    let mut order: Vec<&Student> = students.to_vec();
    // Stable: equal priorities keep roster order.
    order.sort_by(|a, b| b.preferences.priority().total_cmp(&a.preferences.priority()));

    let mut pool: Vec<&Desk> = layout.desks.iter().collect();
    let mut seating = SeatingMap::new();
    let mut unseated = Vec::new();

    for student in order {
        if pool.is_empty() {
            unseated.push(student.id);
            continue;
        }
        let waiting_partners = student
            .preferences
            .preferred_partners
            .iter()
            .any(|p| !seating.is_seated(*p) && students.iter().any(|s| s.id == *p));

        let mut scored: Vec<(f64, usize)> = pool
            .iter()
            .enumerate()
            .map(|(i, desk)| {
                let score = rng.random::<f64>()
                    + desk_score(student, desk, layout, &seating, waiting_partners);
                (score, i)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let eligible = eligible_candidates(&scored);
        let (_, chosen) = scored[rng.random_range(0..eligible)];

        let desk = pool.remove(chosen);
        seating.assign(student.id, desk.id.clone());
    }
    (seating, unseated)
}

/// How many of the best desks in `scored` (sorted descending, non-empty)
/// take part in the final uniform pick: up to [`TOP_CANDIDATES`], cut off at
/// [`SCORE_WINDOW`] below the best. Never less than one.
fn eligible_candidates(scored: &[(f64, usize)]) -> usize {
    let Some((best, _)) = scored.first() else {
        return 1;
    };
    scored
        .iter()
        .take(TOP_CANDIDATES)
        .take_while(|(score, _)| best - score <= SCORE_WINDOW)
        .count()
        .max(1)
}

/// Deterministic part of a desk's score for `student`.
fn desk_score(
    student: &Student,
    desk: &Desk,
    layout: &Layout,
    seating: &SeatingMap,
    waiting_partners: bool,
) -> f64 {
    let prefs = &student.preferences;
    let mut score = 0.0;

    if prefs.section_preference.as_deref() == Some(desk.section.as_str()) {
        score += prefs.section_weight * SECTION_BONUS_FACTOR;
    }

    let mut has_free_neighbor = false;
    for neighbor in layout.neighbors(&desk.id) {
        match seating.student_at(&neighbor.id) {
            Some(occupant) if prefs.preferred_partners.contains(&occupant) => {
                score += PREFERRED_NEIGHBOR_BONUS;
            }
            Some(occupant) if prefs.avoid_partners.contains(&occupant) => {
                score += AVOIDED_NEIGHBOR_PENALTY;
            }
            Some(_) => {}
            None => has_free_neighbor = true,
        }
    }
    if waiting_partners && has_free_neighbor {
        score += PARTNER_ROOM_BONUS;
    }
    score
}

// ---------------------------------------------------------------------------
// Pair probability
// ---------------------------------------------------------------------------

fn pair_probability<R: Rng + ?Sized>(
    students: &[&Student],
    layout: &Layout,
    preferences: &SeatingPreferences,
    rng: &mut R,
) -> (SeatingMap, Vec<StudentId>) {
    let sections = layout.sections();
    let mut free: Vec<&Desk> = layout.desks.iter().collect();
    let mut seating = SeatingMap::new();
    let mut unseated = Vec::new();

    for student in students {
        if free.is_empty() {
            unseated.push(student.id);
            continue;
        }
        let weights = preferences.weights_for(student.id, &sections);
        let available: Vec<(SectionId, f64)> = weights
            .into_iter()
            .filter(|(section, _)| free.iter().any(|d| &d.section == section))
            .collect();

        let chosen = match pick_section(&available, rng) {
            Some(section) => {
                let in_section: Vec<usize> = free
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| d.section == section)
                    .map(|(i, _)| i)
                    .collect();
                desk_near_partner(student.id, &in_section, &free, layout, &seating, preferences, rng)
                    .unwrap_or_else(|| in_section[rng.random_range(0..in_section.len())])
            }
            None => rng.random_range(0..free.len()),
        };

        let desk = free.remove(chosen);
        seating.assign(student.id, desk.id.clone());
    }
    (seating, unseated)
}

/// Cumulative-weight draw: take `r` in `[0, total)` and walk the sections
/// subtracting weights until the remainder drops to zero or below. Falls back
/// to the first section. `None` only when `sections` is empty.
pub fn pick_section<R: Rng + ?Sized>(sections: &[(SectionId, f64)], rng: &mut R) -> Option<SectionId> {
    let (first, _) = sections.first()?;
    let total: f64 = sections.iter().map(|(_, w)| w).sum();
    let mut remainder = rng.random::<f64>() * total;
    for (section, weight) in sections {
        remainder -= weight;
        if remainder <= 0.0 {
            return Some(section.clone());
        }
    }
    Some(first.clone())
}

/// For each configured pair whose partner is already seated, with the pair's
/// probability, return the closest candidate desk within
/// [`PROXIMITY_RADIUS`] of the partner.
fn desk_near_partner<R: Rng + ?Sized>(
    student: StudentId,
    candidates: &[usize],
    free: &[&Desk],
    layout: &Layout,
    seating: &SeatingMap,
    preferences: &SeatingPreferences,
    rng: &mut R,
) -> Option<usize> {
    for (partner, probability) in preferences.pairs_for(student) {
        let Some(partner_desk) = seating.desk_of(partner).and_then(|id| layout.desk(id)) else {
            continue;
        };
        if rng.random::<f64>() >= probability {
            continue;
        }
        let closest = candidates
            .iter()
            .map(|&i| (i, free[i].distance_to(partner_desk)))
            .filter(|(_, distance)| *distance < PROXIMITY_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((index, _)) = closest {
            return Some(index);
        }
    }
    None
}
