//! A single tableau row: `key_variable = constant + body`, where `body` is a
//! [`SparseRow`] of the other variables' coefficients. Also hosts the
//! equation-construction algebra (C7) that turns a high-level constraint
//! form into this `0 = constant + Σ coeff·var` normal form.

use crate::cache::Cache;
use crate::sparse_row::{SparseRow, EPSILON};
use crate::variable::NO_ROW;

/// One row of the tableau: `key = constant + Σ body[var] * var`.
#[derive(Debug, Clone)]
pub struct Row {
    /// The variable this row currently defines, or `None` for a row that
    /// hasn't been keyed yet (shouldn't persist once resident in a tableau).
    pub(crate) key_variable: Option<u32>,
    pub(crate) constant: f32,
    pub(crate) body: SparseRow,
}

impl Row {
    pub(crate) fn new() -> Self {
        Self {
            key_variable: None,
            constant: 0.0,
            body: SparseRow::new(),
        }
    }

    pub(crate) fn with_key(key: u32) -> Self {
        Self {
            key_variable: Some(key),
            constant: 0.0,
            body: SparseRow::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.body.is_empty() && self.constant.abs() < EPSILON
    }

    /// If the constant term is negative, flip every coefficient and the
    /// constant itself — valid since the row states `key = constant + body`
    /// and multiplying both sides by -1 preserves the equation, only
    /// changing which sign the key's value comes out with once substituted.
    ///
    /// Used by Phase I to get a row's constant non-negative before reading
    /// off `key`'s minimal feasible value.
    pub(crate) fn ensure_positive_constant(&mut self) {
        if self.constant < 0.0 {
            self.constant = -self.constant;
            self.body.invert();
        }
    }

    /// Substitute `var` out of this row's body using `definition`, which
    /// must define `var` (`definition.key_variable == Some(var)`). No-op if
    /// `var` doesn't appear here.
    pub(crate) fn substitute(&mut self, var: u32, definition: &Row) {
        debug_assert_eq!(definition.key_variable, Some(var));
        let coeff = self.body.get(var);
        if coeff == 0.0 {
            return;
        }
        self.body.remove(var);
        self.constant += coeff * definition.constant;
        self.body.add_scaled(&definition.body, coeff);
    }

    /// Pivot so that `entering` becomes this row's key instead of whatever
    /// currently keys it (`leaving`, already extracted into `self` by the
    /// caller as `key_variable`). `entering`'s coefficient must be nonzero.
    pub(crate) fn pivot(&mut self, entering: u32) {
        let coeff = self.body.get(entering);
        debug_assert!(coeff.abs() > EPSILON, "pivot on a (near) zero coefficient");
        let leaving = self.key_variable.take();
        self.body.remove(entering);
        if let Some(leaving) = leaving {
            self.body.put(leaving, -1.0);
        }
        self.body.divide_by(-coeff);
        self.constant /= -coeff;
        self.key_variable = Some(entering);
    }

    pub(crate) fn coefficient(&self, var: u32) -> f32 {
        self.body.get(var)
    }
}

/// Everything needed to fold a newly built row's key variable's strength
/// vector and `usage_in_row_count`/`client_equations` bookkeeping when the
/// row is handed to the tableau. Kept here (rather than in `tableau.rs`)
/// because it's pure row algebra with no pivot-selection policy attached.
pub(crate) fn register_body_usage(row: &Row, owning_row: i32, cache: &mut Cache) {
    for (id, _) in row.body.iter() {
        let var = cache.get_mut(id);
        var.usage_in_row_count += 1;
        var.add_client_equation(owning_row);
    }
}

pub(crate) fn unregister_body_usage(row: &Row, owning_row: i32, cache: &mut Cache) {
    for (id, _) in row.body.iter() {
        let var = cache.get_mut(id);
        var.usage_in_row_count = var.usage_in_row_count.saturating_sub(1);
        var.remove_client_equation(owning_row);
    }
}

// ---------------------------------------------------------------------
// C7: equation-construction façade. Each of these builds a detached Row in
// `0 = constant + Σ coeff·var` normal form (RHS - LHS), which `add_constraint`
// then keys and folds into the tableau. None of these touch the tableau
// directly; they're pure translations from the high-level constraint shape
// spec.md describes into raw row algebra, so the same `ensure_positive_constant`
// / `choose_subject` / `pivot` pipeline resolves all of them generically
// regardless of which side of the equation each variable started on.
// ---------------------------------------------------------------------

/// `a == constant`, i.e. `0 = constant - a`.
pub(crate) fn form_eq_const(a: u32, constant: f32) -> Row {
    let mut row = Row::new();
    row.constant = constant;
    row.body.put(a, -1.0);
    row
}

/// `a == b + margin`, i.e. `0 = margin + b - a`.
pub(crate) fn form_eq(a: u32, b: u32, margin: f32) -> Row {
    let mut row = Row::new();
    row.constant = margin;
    row.body.put(b, 1.0);
    row.body.put(a, -1.0);
    if a == b {
        // degenerate a == a (+ margin): collapses to the constant alone.
        row.body.remove(a);
    }
    row
}

/// `a <= b + margin`, transformed with a slack `s >= 0` into
/// `0 = margin + b - a - s`.
pub(crate) fn form_le(a: u32, b: u32, margin: f32, slack: u32) -> Row {
    let mut row = form_eq(a, b, margin);
    row.body.put(slack, -1.0);
    row
}

/// `a >= b + margin`, transformed with a slack `s >= 0` into
/// `0 = margin + b - a + s`.
pub(crate) fn form_ge(a: u32, b: u32, margin: f32, slack: u32) -> Row {
    let mut row = form_eq(a, b, margin);
    row.body.put(slack, 1.0);
    row
}

/// `(1 - bias)*(a - b - marginA) = bias*(c - d - marginB)`, expanded to
/// `0 = [bias*marginB - (1-bias)*marginA] + (1-bias)*a - (1-bias)*b - bias*c + bias*d`.
///
/// `bias == 0.5` recovers simple midpoint centering (`a - b == c - d`); other
/// values bias the shared point toward one pair over the other.
pub(crate) fn form_centering(
    a: u32,
    b: u32,
    margin_a: f32,
    bias: f32,
    c: u32,
    d: u32,
    margin_b: f32,
) -> Row {
    let mut row = Row::new();
    let one_minus_bias = 1.0 - bias;
    row.constant = bias * margin_b - one_minus_bias * margin_a;
    row.body.put(a, one_minus_bias);
    row.body.add_scaled(&single(b, 1.0), -one_minus_bias);
    row.body.add_scaled(&single(c, 1.0), -bias);
    row.body.add_scaled(&single(d, 1.0), bias);
    row
}

/// `a - b == (percent/100) * (c - b)`: `a` sits `percent` percent of the way
/// from `b` to `c`. Expands to `0 = a + (p-1)*b - p*c`.
pub(crate) fn form_percent(a: u32, b: u32, c: u32, percent: i32) -> Row {
    let p = percent as f32 / 100.0;
    // a - b - p*(c - b) = 0  =>  a - b - p*c + p*b = 0  =>  a + (p-1)*b - p*c = 0
    let mut row = Row::new();
    row.body.put(a, 1.0);
    row.body.add_scaled(&single(b, 1.0), p - 1.0);
    row.body.add_scaled(&single(c, 1.0), -p);
    row
}

/// `a - b == ratio * (c - d)`, expanded to `0 = b - a + ratio*c - ratio*d`.
pub(crate) fn form_ratio(a: u32, b: u32, c: u32, d: u32, ratio: f32) -> Row {
    let mut row = Row::new();
    row.body.put(b, 1.0);
    row.body.add_scaled(&single(a, 1.0), -1.0);
    row.body.add_scaled(&single(c, 1.0), ratio);
    row.body.add_scaled(&single(d, 1.0), -ratio);
    row
}

fn single(var: u32, value: f32) -> SparseRow {
    let mut row = SparseRow::new();
    row.put(var, value);
    row
}

/// Pick which variable in `row`'s body becomes the key once the row is
/// admitted to the tableau (spec §4.4 `choose_subject`).
///
/// Preference order, scanning the whole body rather than stopping at the
/// first hit (an earlier variable can look fine but still lose to a later
/// one ranked higher):
/// (a) a not-yet-keyed unrestricted variable with a negative coefficient;
/// (b) failing that, any not-yet-keyed unrestricted variable;
/// (c) failing that, a restricted (slack/error) variable with a negative
///     coefficient, only when the row's constant is non-negative (keeps the
///     row feasible without a pivot);
/// (d) among tied restricted candidates, prefer a "new" one
///     (`usage_in_row_count <= 1`, i.e. not yet shared by another row) and,
///     among those, the smaller coefficient magnitude.
/// `None` if nothing qualifies — the caller must introduce an artificial
/// variable and run `enforce_bfs`.
pub(crate) fn choose_subject(row: &Row, cache: &Cache) -> Option<u32> {
    let mut negative_unrestricted: Option<u32> = None;
    let mut any_unrestricted: Option<u32> = None;
    let mut restricted_candidate: Option<(u32, f32, bool)> = None;

    for (id, coeff) in row.body.iter() {
        let var = cache.get(id);
        if !var.is_restricted() && var.definition_row_index == NO_ROW {
            if coeff < -EPSILON && negative_unrestricted.is_none() {
                negative_unrestricted = Some(id);
            }
            if any_unrestricted.is_none() {
                any_unrestricted = Some(id);
            }
            continue;
        }
        if var.is_restricted() && coeff < -EPSILON {
            let is_new = var.usage_in_row_count <= 1;
            let take = match restricted_candidate {
                None => true,
                Some((_, best_coeff, best_is_new)) => match (is_new, best_is_new) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => coeff.abs() < best_coeff.abs(),
                },
            };
            if take {
                restricted_candidate = Some((id, coeff, is_new));
            }
        }
    }

    if let Some(id) = negative_unrestricted {
        return Some(id);
    }
    if let Some(id) = any_unrestricted {
        return Some(id);
    }
    if row.constant >= 0.0 {
        restricted_candidate.map(|(id, _, _)| id)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::variable::VariableType;

    #[test]
    fn ensure_positive_constant_flips_sign() {
        let mut row = Row::new();
        row.constant = -2.0;
        row.body.put(5, 3.0);
        row.ensure_positive_constant();
        assert_eq!(row.constant, 2.0);
        assert_eq!(row.body.get(5), -3.0);
    }

    #[test]
    fn substitute_folds_definition_in() {
        // row: x = 1 + 2*y ; definition: y = 3 + 1*z
        let mut row = Row::with_key(100);
        row.constant = 1.0;
        row.body.put(7, 2.0);
        let mut def = Row::with_key(7);
        def.constant = 3.0;
        def.body.put(9, 1.0);

        row.substitute(7, &def);
        // x = 1 + 2*(3 + 1*z) = 7 + 2*z
        assert_eq!(row.constant, 7.0);
        assert_eq!(row.body.get(9), 2.0);
        assert!(!row.body.contains(7));
    }

    #[test]
    fn pivot_swaps_key_and_normalizes() {
        // row keyed by 1: 1 = 4 + 2*e  (entering e)
        let mut row = Row::with_key(1);
        row.constant = 4.0;
        row.body.put(2, 2.0);
        row.pivot(2);
        // solving for e: e = -2 - 0.5*1
        assert_eq!(row.key_variable, Some(2));
        assert_eq!(row.constant, -2.0);
        assert_eq!(row.body.get(1), -0.5);
    }

    #[test]
    fn form_eq_const_matches_algebra() {
        let row = form_eq_const(4, 10.0);
        assert_eq!(row.constant, 10.0);
        assert_eq!(row.body.get(4), -1.0);
    }

    #[test]
    fn form_centering_midpoint_case() {
        // bias 0.5, no margins: 0.5*a - 0.5*b - 0.5*c + 0.5*d = 0 => a - b == c - d
        let row = form_centering(1, 2, 0.0, 0.5, 3, 4, 0.0);
        assert_eq!(row.constant, 0.0);
        assert_eq!(row.body.get(1), 0.5);
        assert_eq!(row.body.get(2), -0.5);
        assert_eq!(row.body.get(3), -0.5);
        assert_eq!(row.body.get(4), 0.5);
    }

    #[test]
    fn choose_subject_prefers_unrestricted() {
        let mut cache = Cache::new();
        let a = cache.acquire(VariableType::Unrestricted);
        let s = cache.acquire(VariableType::Slack);
        let mut row = Row::new();
        row.constant = 1.0;
        row.body.put(a, 1.0);
        row.body.put(s, -1.0);
        assert_eq!(choose_subject(&row, &cache), Some(a));
    }

    #[test]
    fn choose_subject_falls_back_to_restricted() {
        let mut cache = Cache::new();
        let s = cache.acquire(VariableType::Slack);
        let mut row = Row::new();
        row.constant = 1.0;
        row.body.put(s, -1.0);
        assert_eq!(choose_subject(&row, &cache), Some(s));
    }

    #[test]
    fn choose_subject_none_when_negative_constant_only_restricted() {
        let mut cache = Cache::new();
        let s = cache.acquire(VariableType::Slack);
        let mut row = Row::new();
        row.constant = -1.0;
        row.body.put(s, -1.0);
        assert_eq!(choose_subject(&row, &cache), None);
    }

    #[test]
    fn choose_subject_prefers_negative_coefficient_unrestricted() {
        let mut cache = Cache::new();
        let a = cache.acquire(VariableType::Unrestricted);
        let b = cache.acquire(VariableType::Unrestricted);
        let mut row = Row::new();
        row.constant = 1.0;
        row.body.put(a, 1.0);
        row.body.put(b, -1.0);
        // Both unrestricted and unkeyed; `b`'s negative coefficient wins even
        // though `a` comes first in ascending-id order.
        assert_eq!(choose_subject(&row, &cache), Some(b));
    }

    #[test]
    fn choose_subject_restricted_tie_break_prefers_new_variable() {
        let mut cache = Cache::new();
        let stale = cache.acquire(VariableType::Slack);
        let fresh = cache.acquire(VariableType::Slack);
        cache.get_mut(stale).usage_in_row_count = 3;
        cache.get_mut(fresh).usage_in_row_count = 1;
        let mut row = Row::new();
        row.constant = 1.0;
        row.body.put(stale, -1.0);
        row.body.put(fresh, -1.0);
        assert_eq!(choose_subject(&row, &cache), Some(fresh));
    }

    #[test]
    fn choose_subject_restricted_tie_break_prefers_smaller_coefficient() {
        let mut cache = Cache::new();
        let small = cache.acquire(VariableType::Slack);
        let large = cache.acquire(VariableType::Slack);
        let mut row = Row::new();
        row.constant = 1.0;
        row.body.put(small, -1.0);
        row.body.put(large, -5.0);
        assert_eq!(choose_subject(&row, &cache), Some(small));
    }
}
