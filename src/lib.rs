//! A Cassowary-style incremental linear constraint solver for 2D layout.
//!
//! [`System`] is the entry point: create variables, add constraints between
//! them (equalities, inequalities, centering, percent/ratio relationships),
//! then call [`System::minimize`] to drive the tableau to a basic feasible,
//! priority-weighted-error-minimizing solution and read values back out with
//! [`System::value_for`].

mod cache;
mod equations;
mod error;
mod goal_row;
mod row;
mod sparse_row;
mod tableau;
mod variable;

pub use error::{Phase, SolverError};
pub use tableau::SolverConfig;
pub use variable::{Strength, VarId};

use std::collections::HashMap;

use tableau::Tableau;

/// Opaque handle a client associates with an object variable. The solver
/// never interprets this value — it only stores and hands it back via
/// [`System::value_for_object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorHandle(pub u64);

/// A constraint system: a variable pool plus the tableau solving over it.
#[derive(Debug)]
pub struct System {
    tableau: Tableau,
    anchors: HashMap<u64, u32>,
}

impl System {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            tableau: Tableau::with_config(config),
            anchors: HashMap::new(),
        }
    }

    /// Drop every variable and constraint, returning the system to the
    /// state `new()` produces. Existing `VarId`/`AnchorHandle` values become
    /// invalid — using one after `reset` returns `UnknownVariable`.
    pub fn reset(&mut self) {
        self.tableau.reset();
        self.anchors.clear();
    }

    /// Get or create the object variable bound to `anchor`. Calling this
    /// again with the same handle returns the same `VarId`.
    pub fn create_object_variable(&mut self, anchor: AnchorHandle) -> VarId {
        if let Some(&id) = self.anchors.get(&anchor.0) {
            return VarId(id);
        }
        let id = self.tableau.create_variable(variable::VariableType::Unrestricted);
        self.anchors.insert(anchor.0, id);
        VarId(id)
    }

    /// Create a standalone unrestricted variable with no anchor binding.
    pub fn create_variable(&mut self) -> VarId {
        VarId(self.tableau.create_variable(variable::VariableType::Unrestricted))
    }

    /// Create an error (deviation) variable at `strength`, for building a
    /// soft constraint by hand. Most callers should instead pass
    /// `with_error: true` to one of the `add_constraint_*` methods.
    pub fn create_error_variable(&mut self, strength: Strength) -> VarId {
        VarId(self.tableau.create_error_variable(strength))
    }

    /// Create a slack variable for building an inequality by hand. Most
    /// callers should use `add_constraint_le`/`add_constraint_ge` instead.
    pub fn create_slack_variable(&mut self) -> VarId {
        VarId(self.tableau.create_variable(variable::VariableType::Slack))
    }

    /// `a == constant`, always required.
    pub fn add_constraint_eq_const(&mut self, a: VarId, constant: f32) -> Result<(), SolverError> {
        equations::eq_const(&mut self.tableau, a, constant)
    }

    /// `a == b + margin`.
    pub fn add_constraint_eq(
        &mut self,
        a: VarId,
        b: VarId,
        margin: f32,
        with_error: bool,
        strength: Strength,
    ) -> Result<(), SolverError> {
        equations::eq(&mut self.tableau, a, b, margin, with_error, strength)
    }

    /// `a <= b + margin`.
    pub fn add_constraint_le(
        &mut self,
        a: VarId,
        b: VarId,
        margin: f32,
        with_error: bool,
        strength: Strength,
    ) -> Result<(), SolverError> {
        equations::le(&mut self.tableau, a, b, margin, with_error, strength)
    }

    /// `a >= b + margin`.
    pub fn add_constraint_ge(
        &mut self,
        a: VarId,
        b: VarId,
        margin: f32,
        with_error: bool,
        strength: Strength,
    ) -> Result<(), SolverError> {
        equations::ge(&mut self.tableau, a, b, margin, with_error, strength)
    }

    /// `(1 - bias)*(a - b - margin_a) == bias*(c - d - margin_b)`: the
    /// shared point between `(a, b)` and `(c, d)` is biased toward the
    /// second pair as `bias` grows past 0.5.
    #[allow(clippy::too_many_arguments)]
    pub fn add_constraint_centering(
        &mut self,
        a: VarId,
        b: VarId,
        margin_a: f32,
        bias: f32,
        c: VarId,
        d: VarId,
        margin_b: f32,
        with_error: bool,
        strength: Strength,
    ) -> Result<(), SolverError> {
        equations::centering(&mut self.tableau, a, b, margin_a, bias, c, d, margin_b, with_error, strength)
    }

    /// `a` sits `percent` percent of the way from `b` to `c`.
    pub fn add_constraint_percent(
        &mut self,
        a: VarId,
        b: VarId,
        c: VarId,
        percent: i32,
        with_error: bool,
    ) -> Result<(), SolverError> {
        equations::percent(&mut self.tableau, a, b, c, percent, with_error)
    }

    /// `a - b == ratio * (c - d)`.
    pub fn add_constraint_ratio(
        &mut self,
        a: VarId,
        b: VarId,
        c: VarId,
        d: VarId,
        ratio: f32,
        with_error: bool,
    ) -> Result<(), SolverError> {
        equations::ratio(&mut self.tableau, a, b, c, d, ratio, with_error)
    }

    /// Run Phase I (feasibility) then Phase II (priority minimization).
    ///
    /// Values are populated from the tableau's final state even on an
    /// `Err` result — see [`SolverError`].
    pub fn minimize(&mut self) -> Result<(), SolverError> {
        self.tableau.minimize()
    }

    /// Current value of `var`. Returns `0.0` for a variable that was never
    /// admitted into a row and never solved (i.e. stayed non-basic at its
    /// implicit default).
    pub fn value_for(&self, var: VarId) -> f32 {
        self.tableau.value_for(var.raw())
    }

    /// Current value of the object variable bound to `anchor`, rounded to
    /// the nearest integer pixel. Returns `0` if `anchor` was never bound.
    pub fn value_for_object(&self, anchor: AnchorHandle) -> i32 {
        match self.anchors.get(&anchor.0) {
            Some(&id) => self.tableau.value_for(id).round() as i32,
            None => 0,
        }
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_binding_is_stable() {
        let mut sys = System::new();
        let handle = AnchorHandle(7);
        let a = sys.create_object_variable(handle);
        let b = sys.create_object_variable(handle);
        assert_eq!(a, b);
    }

    #[test]
    fn end_to_end_equal_chain() {
        let mut sys = System::new();
        let left = sys.create_variable();
        let right = sys.create_variable();
        sys.add_constraint_eq_const(left, 0.0).unwrap();
        sys.add_constraint_eq(right, left, 100.0, false, Strength::Fixed).unwrap();
        sys.minimize().unwrap();
        assert!((sys.value_for(left) - 0.0).abs() < 1e-3);
        assert!((sys.value_for(right) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn end_to_end_centering() {
        // Xl ---- Xm ---- Xr, Xm centered, with Xl=0 Xr=100.
        let mut sys = System::new();
        let xl = sys.create_variable();
        let xm = sys.create_variable();
        let xr = sys.create_variable();
        sys.add_constraint_eq_const(xl, 0.0).unwrap();
        sys.add_constraint_eq_const(xr, 100.0).unwrap();
        sys.add_constraint_centering(xm, xl, 0.0, 0.5, xr, xm, 0.0, false, Strength::Fixed)
            .unwrap();
        sys.minimize().unwrap();
        assert!((sys.value_for(xm) - 50.0).abs() < 1e-2);
    }

    #[test]
    fn unknown_variable_after_reset() {
        let mut sys = System::new();
        let a = sys.create_variable();
        sys.reset();
        let result = sys.add_constraint_eq_const(a, 1.0);
        assert!(matches!(result, Err(SolverError::UnknownVariable(_))));
    }

    #[test]
    fn value_for_object_unbound_anchor_is_zero() {
        let sys = System::new();
        assert_eq!(sys.value_for_object(AnchorHandle(123)), 0);
    }
}
