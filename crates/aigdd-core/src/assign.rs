use crate::aig::{Lit, Var};

/// Per-variable reduction state.
///
/// `Free` keeps the variable's own identity; the two constant states are
/// terminal, they never chain through another substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Free,
    False,
    True,
}

/// Dense assignment vector over variables `1..=max_var`.
///
/// Two instances drive the search: the stable vector holds the last
/// verified-good state, the candidate vector is rebuilt per probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentVec {
    // Slot 0 stays Free so the constants always resolve to themselves.
    slots: Vec<Assignment>,
}

impl AssignmentVec {
    pub fn all_free(max_var: Var) -> Self {
        Self {
            slots: vec![Assignment::Free; max_var as usize + 1],
        }
    }

    pub fn max_var(&self) -> Var {
        self.slots.len() as Var - 1
    }

    pub fn get(&self, var: Var) -> Assignment {
        self.slots[var as usize]
    }

    pub fn set(&mut self, var: Var, assignment: Assignment) {
        debug_assert!(var >= 1, "variable 0 is not assignable");
        self.slots[var as usize] = assignment;
    }

    /// One-level substitution of a literal under this vector.
    pub fn resolve(&self, lit: Lit) -> Lit {
        match self.get(lit.var()) {
            Assignment::Free => lit,
            Assignment::False => Lit::FALSE.xor_sign(lit.is_negated()),
            Assignment::True => Lit::TRUE.xor_sign(lit.is_negated()),
        }
    }

    /// Number of variables no longer Free.
    pub fn bound_count(&self) -> u32 {
        self.slots[1..]
            .iter()
            .filter(|slot| **slot != Assignment::Free)
            .count() as u32
    }

    pub fn free_count(&self) -> u32 {
        self.max_var() - self.bound_count()
    }
}
