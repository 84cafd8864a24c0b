//! Classroom-level seating preferences for the pair-probability engine path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{SectionId, StudentId};

/// Section name → relative weight. Weights are non-negative.
pub type SectionWeights = BTreeMap<SectionId, f64>;

/// Probability that two students are seated next to each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairProbability {
    pub student_a: StudentId,
    pub student_b: StudentId,
    pub probability: f64,
}

impl PairProbability {
    /// The other half of the pair, if `student` is in it.
    pub fn partner_of(&self, student: StudentId) -> Option<StudentId> {
        if self.student_a == student {
            Some(self.student_b)
        } else if self.student_b == student {
            Some(self.student_a)
        } else {
            None
        }
    }

    fn matches(&self, a: StudentId, b: StudentId) -> bool {
        (self.student_a == a && self.student_b == b) || (self.student_a == b && self.student_b == a)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatingPreferences {
    pub pair_probabilities: Vec<PairProbability>,
    /// A student's own weights restrict the draw to the sections listed.
    pub section_preferences: BTreeMap<StudentId, SectionWeights>,
    /// Weights for students without their own. Sections missing here weigh 1.0.
    pub default_section_weights: SectionWeights,
}

impl SeatingPreferences {
    /// Returns `true` if anything here would steer the pair-probability path.
    pub fn is_configured(&self) -> bool {
        !self.pair_probabilities.is_empty() || !self.section_preferences.is_empty()
    }

    /// Set the probability for a pair, clamped to `[0, 1]`. Replaces any
    /// existing entry for the same pair in either order.
    pub fn set_pair_probability(
        &mut self,
        a: StudentId,
        b: StudentId,
        probability: f64,
    ) -> Result<(), CoreError> {
        if a == b {
            return Err(CoreError::Validation(
                "A pair needs two different students".to_string(),
            ));
        }
        if probability.is_nan() {
            return Err(CoreError::Validation(
                "Pair probability must be a number".to_string(),
            ));
        }
        let probability = probability.clamp(0.0, 1.0);
        match self.pair_probabilities.iter_mut().find(|p| p.matches(a, b)) {
            Some(existing) => existing.probability = probability,
            None => self.pair_probabilities.push(PairProbability {
                student_a: a,
                student_b: b,
                probability,
            }),
        }
        Ok(())
    }

    pub fn remove_pair(&mut self, a: StudentId, b: StudentId) -> bool {
        let before = self.pair_probabilities.len();
        self.pair_probabilities.retain(|p| !p.matches(a, b));
        before != self.pair_probabilities.len()
    }

    /// Set a student's section weights. Negative weights clamp to zero.
    pub fn set_section_weights(
        &mut self,
        student: StudentId,
        weights: SectionWeights,
    ) -> Result<(), CoreError> {
        self.section_preferences
            .insert(student, sanitize_weights(weights)?);
        Ok(())
    }

    /// Replace the weights used by students without their own.
    pub fn set_default_section_weights(&mut self, weights: SectionWeights) -> Result<(), CoreError> {
        self.default_section_weights = sanitize_weights(weights)?;
        Ok(())
    }

    /// Pairs involving `student`, with the partner id and probability.
    pub fn pairs_for(&self, student: StudentId) -> impl Iterator<Item = (StudentId, f64)> + '_ {
        self.pair_probabilities
            .iter()
            .filter_map(move |p| p.partner_of(student).map(|other| (other, p.probability)))
    }

    /// Sections `student` may be drawn into, with their weights.
    ///
    /// A student with their own weights gets exactly the listed sections that
    /// exist in `sections`. Everyone else, including a student whose own
    /// sections are all missing from the layout, gets every section at its
    /// default weight.
    pub fn weights_for(&self, student: StudentId, sections: &[SectionId]) -> SectionWeights {
        if let Some(own) = self.section_preferences.get(&student) {
            let listed: SectionWeights = own
                .iter()
                .filter(|(section, _)| sections.contains(section))
                .map(|(section, weight)| (section.clone(), *weight))
                .collect();
            if !listed.is_empty() {
                return listed;
            }
        }
        sections
            .iter()
            .map(|section| {
                let weight = self.default_section_weights.get(section).copied().unwrap_or(1.0);
                (section.clone(), weight)
            })
            .collect()
    }
}

fn sanitize_weights(weights: SectionWeights) -> Result<SectionWeights, CoreError> {
    weights
        .into_iter()
        .map(|(section, weight)| {
            if weight.is_nan() {
                Err(CoreError::Validation(format!(
                    "Weight for section '{section}' must be a number"
                )))
            } else {
                Ok((section, weight.max(0.0)))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn pair_probability_is_clamped_and_unordered() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut prefs = SeatingPreferences::default();
        prefs.set_pair_probability(a, b, 1.7).unwrap();
        prefs.set_pair_probability(b, a, -0.2).unwrap();
        assert_eq!(prefs.pair_probabilities.len(), 1);
        assert_eq!(prefs.pair_probabilities[0].probability, 0.0);
        assert!(prefs.is_configured());
    }

    #[test]
    fn pair_with_self_is_rejected() {
        let a = Uuid::new_v4();
        let mut prefs = SeatingPreferences::default();
        assert!(prefs.set_pair_probability(a, a, 0.5).is_err());
    }

    #[test]
    fn pairs_for_reports_partner() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut prefs = SeatingPreferences::default();
        prefs.set_pair_probability(a, b, 0.3).unwrap();
        prefs.set_pair_probability(c, a, 0.6).unwrap();
        let pairs: Vec<_> = prefs.pairs_for(a).collect();
        assert_eq!(pairs, vec![(b, 0.3), (c, 0.6)]);
        assert!(prefs.remove_pair(b, a));
        assert!(!prefs.remove_pair(b, a));
    }

    fn standard_sections() -> Vec<SectionId> {
        vec!["left".to_string(), "middle".to_string(), "right".to_string()]
    }

    #[test]
    fn own_weights_restrict_the_draw_to_listed_sections() {
        let a = Uuid::new_v4();
        let mut prefs = SeatingPreferences::default();
        prefs.default_section_weights.insert("middle".into(), 4.0);
        prefs
            .set_section_weights(
                a,
                BTreeMap::from([("left".to_string(), 0.8), ("right".to_string(), -3.0)]),
            )
            .unwrap();

        let weights = prefs.weights_for(a, &standard_sections());
        assert_eq!(
            weights,
            BTreeMap::from([("left".to_string(), 0.8), ("right".to_string(), 0.0)])
        );
    }

    #[test]
    fn students_without_own_weights_use_defaults_then_one() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut prefs = SeatingPreferences::default();
        prefs.default_section_weights.insert("left".into(), 0.5);
        prefs
            .set_section_weights(a, BTreeMap::from([("right".to_string(), 2.0)]))
            .unwrap();

        let weights = prefs.weights_for(b, &standard_sections());
        assert_eq!(weights["left"], 0.5);
        assert_eq!(weights["middle"], 1.0);
        assert_eq!(weights["right"], 1.0);
    }

    #[test]
    fn own_weights_for_other_layouts_fall_back_to_defaults() {
        let a = Uuid::new_v4();
        let mut prefs = SeatingPreferences::default();
        prefs
            .set_section_weights(a, BTreeMap::from([("group-1".to_string(), 1.0)]))
            .unwrap();
        let weights = prefs.weights_for(a, &standard_sections());
        assert_eq!(weights.len(), 3);
        assert!(weights.values().all(|w| *w == 1.0));
    }
}
