//! The objective row: a lexicographic sum of per-[`Strength`]-level linear
//! terms, minimized one level at a time from `Fixed` down to `Low` so a
//! `High`-strength term is never traded off against a `Medium` one.

use std::collections::BTreeMap;

use crate::row::Row;
use crate::sparse_row::EPSILON;
use crate::variable::{Strength, MAX_STRENGTH};

/// `variable id -> per-strength-level coefficient`.
///
/// A `BTreeMap` rather than the array-backed [`crate::sparse_row::SparseRow`]
/// used for row bodies: the goal row is touched once per constraint and
/// scanned once per pivot, not hot enough to warrant the slot-recycling
/// machinery, and deterministic iteration order here is load-bearing for
/// scan-for-largest-coefficient ties.
#[derive(Debug, Clone, Default)]
pub struct GoalRow {
    terms: BTreeMap<u32, [f32; MAX_STRENGTH]>,
}

impl GoalRow {
    pub fn new() -> Self {
        Self { terms: BTreeMap::new() }
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    /// Add `multiplier * contribution` at `strength`'s level for `var`.
    pub(crate) fn add_contribution(&mut self, var: u32, strength: Strength, multiplier: f32) {
        if multiplier.abs() < EPSILON {
            return;
        }
        let entry = self.terms.entry(var).or_insert([0.0; MAX_STRENGTH]);
        entry[strength.level()] += multiplier;
        if entry.iter().all(|v| v.abs() < EPSILON) {
            self.terms.remove(&var);
        }
    }

    /// Fold `definition`'s body into every strength level this row carries
    /// for `var`, then drop `var` itself — used when a row newly keys a
    /// variable that the goal row still references.
    pub(crate) fn substitute(&mut self, var: u32, definition: &Row) {
        let Some(coeffs) = self.terms.remove(&var) else { return };
        for (level, &weight) in coeffs.iter().enumerate() {
            if weight.abs() < EPSILON {
                continue;
            }
            let strength = level_to_strength(level);
            for (id, value) in definition.body.iter() {
                self.add_contribution(id, strength, weight * value);
            }
            // The definition's constant doesn't affect the goal row: the
            // goal row has no constant term of its own (spec §4.5) — only
            // relative coefficients matter for choosing a pivot.
        }
    }

    pub(crate) fn coefficient(&self, var: u32, strength: Strength) -> f32 {
        self.terms.get(&var).map(|c| c[strength.level()]).unwrap_or(0.0)
    }

    /// A single scalar per variable for use in a ratio test, collapsing the
    /// strength vector to the value at its highest nonzero level. Ratio
    /// tests only ever compare rows already selected as candidates at a
    /// fixed strength tier, so this collapse doesn't lose the information
    /// that matters for that comparison.
    pub(crate) fn scalar_coeff(&self, var: u32) -> f32 {
        match self.terms.get(&var) {
            Some(coeffs) => coeffs
                .iter()
                .rev()
                .find(|v| v.abs() >= EPSILON)
                .copied()
                .unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// Find the entering variable for Phase II: the variable with the most
    /// negative coefficient at the highest strength level that still has
    /// any negative coefficient at all (spec §4.5 — minimize highest
    /// priority first, only move to a lower level once the row has no more
    /// improving moves at the level above).
    ///
    /// Each variable is judged by its *first* nonzero entry walking top-down
    /// from `Fixed` to `None` — a variable already positive at some higher
    /// level is excluded outright, even if a lower level would otherwise
    /// show it negative. A lower-priority level never gets to veto a higher
    /// one's verdict.
    pub(crate) fn find_pivot_candidate(&self) -> Option<u32> {
        // (first-nonzero-level, value-at-that-level) per variable.
        let settled = self.terms.iter().filter_map(|(&id, coeffs)| {
            let level = coeffs.iter().rposition(|v| v.abs() >= EPSILON)?;
            Some((id, level, coeffs[level]))
        });

        let mut best_per_level: [Option<(u32, f32)>; MAX_STRENGTH] = [None; MAX_STRENGTH];
        for (id, level, value) in settled {
            if value >= 0.0 {
                continue;
            }
            match best_per_level[level] {
                Some((_, best_value)) if value >= best_value => {}
                _ => best_per_level[level] = Some((id, value)),
            }
        }

        (0..MAX_STRENGTH).rev().find_map(|level| best_per_level[level]).map(|(id, _)| id)
    }

    pub(crate) fn is_optimal(&self) -> bool {
        self.find_pivot_candidate().is_none()
    }
}

fn level_to_strength(level: usize) -> Strength {
    match level {
        0 => Strength::None,
        1 => Strength::Low,
        2 => Strength::Medium,
        3 => Strength::High,
        4 => Strength::Highest,
        5 => Strength::Equality,
        6 => Strength::Fixed,
        _ => unreachable!("level out of range"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_contribution_prunes_zero_vector() {
        let mut goal = GoalRow::new();
        goal.add_contribution(3, Strength::Medium, 1.0);
        goal.add_contribution(3, Strength::Medium, -1.0);
        assert_eq!(goal.coefficient(3, Strength::Medium), 0.0);
        assert!(goal.terms.is_empty());
    }

    #[test]
    fn find_pivot_candidate_respects_level_priority() {
        let mut goal = GoalRow::new();
        goal.add_contribution(1, Strength::Low, -5.0);
        goal.add_contribution(2, Strength::High, -1.0);
        // High-level negative coefficient wins even though Low's is larger
        // in magnitude — higher strength always dominates.
        assert_eq!(goal.find_pivot_candidate(), Some(2));
    }

    #[test]
    fn find_pivot_candidate_picks_most_negative_within_level() {
        let mut goal = GoalRow::new();
        goal.add_contribution(1, Strength::Medium, -1.0);
        goal.add_contribution(2, Strength::Medium, -5.0);
        assert_eq!(goal.find_pivot_candidate(), Some(2));
    }

    #[test]
    fn find_pivot_candidate_excludes_variable_settled_positive_at_higher_level() {
        let mut goal = GoalRow::new();
        // Positive at High (settled, not improving) but negative at Medium —
        // the High verdict stands; Medium never gets a say for this variable.
        goal.add_contribution(1, Strength::High, 5.0);
        goal.add_contribution(1, Strength::Medium, -100.0);
        goal.add_contribution(2, Strength::Medium, -1.0);
        assert_eq!(goal.find_pivot_candidate(), Some(2));
    }

    #[test]
    fn is_optimal_when_no_negative_coefficients() {
        let mut goal = GoalRow::new();
        goal.add_contribution(1, Strength::Medium, 3.0);
        assert!(goal.is_optimal());
    }
}
