//! `VarId`-level constraint API (C7, continued): translates [`System`]'s
//! public constraint calls into raw-id [`Row`] construction plus the
//! `UnknownVariable` validation spec.md's error-handling section reserves
//! for the public boundary — internal row algebra trusts its ids completely
//! (`debug_assert!` only) since every internal caller already owns a
//! `Cache`-checked id.

use crate::error::SolverError;
use crate::row::{self, Row};
use crate::tableau::Tableau;
use crate::variable::{Strength, VarId, VariableType};

pub(crate) fn check(tableau: &Tableau, var: VarId) -> Result<u32, SolverError> {
    let id = var.raw();
    if tableau.contains(id) {
        Ok(id)
    } else {
        Err(SolverError::UnknownVariable(id))
    }
}

/// Matches `System::add_constraint_eq_const` — always a required equality;
/// there's no soft/weighted form for pinning a variable to a literal
/// constant in the external interface (spec.md §6).
pub(crate) fn eq_const(tableau: &mut Tableau, a: VarId, constant: f32) -> Result<(), SolverError> {
    let a = check(tableau, a)?;
    tableau.add_constraint(row::form_eq_const(a, constant))
}

pub(crate) fn eq(
    tableau: &mut Tableau,
    a: VarId,
    b: VarId,
    margin: f32,
    with_error: bool,
    strength: Strength,
) -> Result<(), SolverError> {
    let a = check(tableau, a)?;
    let b = check(tableau, b)?;
    let mut row = row::form_eq(a, b, margin);
    if with_error {
        attach_error_pair(tableau, &mut row, strength);
    }
    tableau.add_constraint(row)
}

pub(crate) fn le(
    tableau: &mut Tableau,
    a: VarId,
    b: VarId,
    margin: f32,
    with_error: bool,
    strength: Strength,
) -> Result<(), SolverError> {
    let a = check(tableau, a)?;
    let b = check(tableau, b)?;
    let slack = tableau.create_variable(VariableType::Slack);
    let mut row = row::form_le(a, b, margin, slack);
    if with_error {
        attach_error_pair(tableau, &mut row, strength);
    }
    tableau.add_constraint(row)
}

pub(crate) fn ge(
    tableau: &mut Tableau,
    a: VarId,
    b: VarId,
    margin: f32,
    with_error: bool,
    strength: Strength,
) -> Result<(), SolverError> {
    let a = check(tableau, a)?;
    let b = check(tableau, b)?;
    let slack = tableau.create_variable(VariableType::Slack);
    let mut row = row::form_ge(a, b, margin, slack);
    if with_error {
        attach_error_pair(tableau, &mut row, strength);
    }
    tableau.add_constraint(row)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn centering(
    tableau: &mut Tableau,
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
    let a = check(tableau, a)?;
    let b = check(tableau, b)?;
    let c = check(tableau, c)?;
    let d = check(tableau, d)?;
    let mut row = row::form_centering(a, b, margin_a, bias, c, d, margin_b);
    if with_error {
        attach_error_pair(tableau, &mut row, strength);
    }
    tableau.add_constraint(row)
}

pub(crate) fn percent(
    tableau: &mut Tableau,
    a: VarId,
    b: VarId,
    c: VarId,
    percent: i32,
    with_error: bool,
) -> Result<(), SolverError> {
    let a = check(tableau, a)?;
    let b = check(tableau, b)?;
    let c = check(tableau, c)?;
    let mut row = row::form_percent(a, b, c, percent);
    if with_error {
        attach_error_pair(tableau, &mut row, Strength::Medium);
    }
    tableau.add_constraint(row)
}

pub(crate) fn ratio(
    tableau: &mut Tableau,
    a: VarId,
    b: VarId,
    c: VarId,
    d: VarId,
    ratio: f32,
    with_error: bool,
) -> Result<(), SolverError> {
    let a = check(tableau, a)?;
    let b = check(tableau, b)?;
    let c = check(tableau, c)?;
    let d = check(tableau, d)?;
    let mut row = row::form_ratio(a, b, c, d, ratio);
    if with_error {
        attach_error_pair(tableau, &mut row, Strength::Medium);
    }
    tableau.add_constraint(row)
}

/// Turn a hard equation into a soft one: introduce a plus/minus error pair
/// at `strength` and fold both into the row body, so the goal row can trade
/// this constraint off against others at the same priority instead of
/// requiring it exactly.
fn attach_error_pair(tableau: &mut Tableau, row: &mut Row, strength: Strength) {
    let plus = tableau.create_error_variable(strength);
    let minus = tableau.create_error_variable(strength);
    row.body.put(plus, 1.0);
    row.body.put(minus, -1.0);
}
