//! Property-style tests for seating generation across many seeds and all
//! layout templates.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use seatplan_core::engine::{self, SeatingMode};
use seatplan_core::layout::{Layout, LayoutTemplate};
use seatplan_core::preferences::SeatingPreferences;
use seatplan_core::roster::Roster;
use seatplan_core::student::{NewStudent, Preferences, Student};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn roster_of(n: usize) -> Roster {
    let mut roster = Roster::new();
    for i in 0..n {
        roster.add(NewStudent::named(format!("Student {i}"))).unwrap();
    }
    roster
}

/// Every third student prefers the next one and wants the middle section.
fn roster_with_preferences(n: usize) -> Roster {
    let plain = roster_of(n);
    let ids: Vec<_> = plain.students().iter().map(|s| s.id).collect();
    let mut roster = Roster::new();
    for (i, student) in plain.students().iter().enumerate() {
        let mut student: Student = student.clone();
        if i % 3 == 0 {
            let mut prefs = Preferences {
                section_preference: Some("middle".into()),
                ..Default::default()
            };
            if let Some(next) = ids.get(i + 1) {
                prefs.preferred_partners.insert(*next);
            }
            student.preferences = prefs;
        }
        roster.insert(student).unwrap();
    }
    roster
}

fn assert_valid(seating: &seatplan_core::seating::SeatingMap, layout: &Layout) {
    let students: BTreeSet<_> = seating.iter().map(|(_, s)| *s).collect();
    assert_eq!(students.len(), seating.len(), "student seated twice");
    for (desk, _) in seating.iter() {
        assert!(layout.contains(desk), "desk {desk} is not in the layout");
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn enough_desks_means_everyone_is_seated() {
    let plain = roster_of(20);
    let weighted = roster_with_preferences(20);
    let mut paired_prefs = SeatingPreferences::default();
    let ids: Vec<_> = plain.students().iter().map(|s| s.id).collect();
    paired_prefs.set_pair_probability(ids[0], ids[1], 0.9).unwrap();
    paired_prefs.set_pair_probability(ids[2], ids[3], 0.4).unwrap();

    for template in LayoutTemplate::ALL {
        let layout = template.build();
        for seed in 0..10 {
            let cases = [
                (&plain, SeatingPreferences::default(), SeatingMode::Uniform),
                (&weighted, SeatingPreferences::default(), SeatingMode::Weighted),
                (&plain, paired_prefs.clone(), SeatingMode::PairProbability),
            ];
            for (roster, prefs, expected) in cases {
                let mut rng = StdRng::seed_from_u64(seed);
                let result = engine::generate(&roster.present_students(), &layout, &prefs, &mut rng);
                assert_eq!(result.mode, expected);
                assert_eq!(result.placed(), 20, "{:?} on {}", expected, template.key());
                assert!(result.unseated.is_empty());
                assert_valid(&result.seating, &layout);
            }
        }
    }
}

#[test]
fn shortage_seats_exactly_the_desk_count() {
    let layout = Layout::freeform("Small lab", &[(0.0, 0.0), (140.0, 0.0), (0.0, 80.0), (500.0, 500.0)])
        .unwrap();
    let plain = roster_of(9);
    let weighted = roster_with_preferences(9);
    for seed in 0..20 {
        for roster in [&plain, &weighted] {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = engine::generate(
                &roster.present_students(),
                &layout,
                &SeatingPreferences::default(),
                &mut rng,
            );
            assert_eq!(result.placed(), 4);
            assert_eq!(result.unseated.len(), 5);
            assert_valid(&result.seating, &layout);
        }
    }
}

#[test]
fn uniform_generation_uses_every_desk_over_many_runs() {
    let roster = roster_of(3);
    let layout = Layout::standard();
    let mut used = BTreeSet::new();
    for seed in 0..300 {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = engine::generate(
            &roster.present_students(),
            &layout,
            &SeatingPreferences::default(),
            &mut rng,
        );
        used.extend(result.seating.iter().map(|(d, _)| d.clone()));
    }
    assert_eq!(used.len(), layout.len());
}
