//! Solver variables: typed unknowns with a strength, a home row, and the
//! back-references needed to substitute them out of the tableau cheaply.

use smallvec::SmallVec;

/// Number of distinct priority levels a goal row tracks.
///
/// Ordered weakest-to-strongest so that `Strength as usize` is directly
/// usable as an index into a `strength_vector`, and "walk from highest to
/// lowest level" (spec §4.5) is simply iterating the vector in reverse.
pub const MAX_STRENGTH: usize = 7;

/// Priority of a constraint (and of the error variables it introduces).
///
/// `Fixed` and `Equality` are treated as "required" throughout the solver;
/// everything below them is a soft goal minimized lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Strength {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Highest = 4,
    Equality = 5,
    Fixed = 6,
}

impl Strength {
    /// Index into a `[f32; MAX_STRENGTH]` strength vector.
    pub fn level(self) -> usize {
        self as usize
    }

    /// Constraints at this strength or above are never traded off against
    /// each other during Phase I/II tie-breaking — they're the closest
    /// thing this solver has to "required".
    pub(crate) fn is_strong(self) -> bool {
        self >= Strength::Equality
    }
}

impl Default for Strength {
    fn default() -> Self {
        Strength::Low
    }
}

/// What a variable is for, which determines whether it's restricted to
/// non-negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// May take any real value (layout positions, sizes before solving).
    Unrestricted,
    /// Reserved for column 0, the constant column.
    Constant,
    /// Inequality transformer; restricted to `>= 0`.
    Slack,
    /// Soft-equality deviation; restricted to `>= 0`.
    Error,
    /// A pooled, not-currently-in-use slot.
    Unknown,
}

impl VariableType {
    pub(crate) fn is_restricted(self) -> bool {
        matches!(self, VariableType::Slack | VariableType::Error)
    }
}

/// Row index meaning "this variable is not currently the key of any row",
/// and (reused, in a different context) "this row is not yet resident in
/// the tableau" when passed as an `owning_row` parameter during detached
/// row construction.
pub(crate) const NO_ROW: i32 = -1;

/// A single unknown in the system.
///
/// Identified by `id`: column 0 is reserved for the constant column, so
/// valid ids for actual variables start at 1. Owned exclusively by the
/// [`crate::cache::Cache`]; rows only ever hold a variable's `id`.
#[derive(Debug, Clone)]
pub struct Variable {
    pub(crate) id: u32,
    pub(crate) kind: VariableType,
    pub(crate) strength: Strength,
    /// Filled in by `compute_values` at the end of `minimize`.
    pub computed_value: f32,
    /// Index into the tableau's row list if this variable is a key,
    /// `NO_ROW` otherwise.
    pub(crate) definition_row_index: i32,
    /// Number of distinct rows whose body references this variable with a
    /// nonzero coefficient (excludes the row this variable itself keys).
    pub(crate) usage_in_row_count: u32,
    /// Rows that reference this variable in their body, for substitution.
    pub(crate) client_equations: SmallVec<[i32; 4]>,
}

impl Variable {
    pub(crate) fn fresh(id: u32, kind: VariableType) -> Self {
        Self {
            id,
            kind,
            strength: Strength::default(),
            computed_value: 0.0,
            definition_row_index: NO_ROW,
            usage_in_row_count: 0,
            client_equations: SmallVec::new(),
        }
    }

    /// Reset to a pristine state before being handed back out by the pool.
    pub(crate) fn reset(&mut self) {
        self.kind = VariableType::Unknown;
        self.strength = Strength::Low;
        self.computed_value = 0.0;
        self.definition_row_index = NO_ROW;
        self.usage_in_row_count = 0;
        self.client_equations.clear();
    }

    /// Idempotent: adding a row that's already registered is a no-op.
    pub(crate) fn add_client_equation(&mut self, row: i32) {
        if row == NO_ROW {
            return;
        }
        if !self.client_equations.contains(&row) {
            self.client_equations.push(row);
        }
    }

    /// Tolerates an absent row (silent no-op), matching §4.2.
    pub(crate) fn remove_client_equation(&mut self, row: i32) {
        self.client_equations.retain(|&r| r != row);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> VariableType {
        self.kind
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub(crate) fn is_restricted(&self) -> bool {
        self.kind.is_restricted()
    }
}

/// Opaque handle to a variable, returned across the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub(crate) u32);

impl VarId {
    pub(crate) fn raw(self) -> u32 {
        self.0
    }
}
