use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Variable index. Variable 0 is reserved for the constants.
pub type Var = u32;

/// A literal encodes a variable index and a polarity bit: `var * 2 + sign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(u32);

impl Lit {
    /// Constant false, literal 0.
    pub const FALSE: Lit = Lit(0);
    /// Constant true, literal 1.
    pub const TRUE: Lit = Lit(1);

    pub fn new(var: Var, negated: bool) -> Lit {
        Lit(var * 2 + negated as u32)
    }

    pub fn from_raw(raw: u32) -> Lit {
        Lit(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn var(self) -> Var {
        self.0 >> 1
    }

    pub fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    /// Flips the polarity when `negated` is true, keeps it otherwise.
    pub fn xor_sign(self, negated: bool) -> Lit {
        Lit(self.0 ^ negated as u32)
    }

    pub fn is_constant(self) -> bool {
        self.var() == 0
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub lit: Lit,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Latch {
    pub lit: Lit,
    pub next: Lit,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AndGate {
    pub lhs: Lit,
    pub rhs0: Lit,
    pub rhs1: Lit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub lit: Lit,
    pub name: Option<String>,
}

/// Violation of the structural circuit invariants.
///
/// Raised by the codec on malformed files; when raised on a projected
/// circuit it indicates an internal bug in the substitution logic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("literal {0} is defined more than once")]
    Redefined(Lit),
    #[error("definition literal {0} is negated")]
    NegatedDefinition(Lit),
    #[error("variable 0 cannot be defined")]
    ConstantDefinition,
    #[error("literal {0} exceeds maximum variable {1}")]
    OutOfRange(Lit, Var),
    #[error("literal {0} references an undefined variable")]
    Undefined(Lit),
}

/// An and-inverter graph, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aig {
    /// Largest variable index in use.
    pub max_var: Var,
    pub inputs: Vec<Input>,
    pub latches: Vec<Latch>,
    pub ands: Vec<AndGate>,
    pub outputs: Vec<Output>,
    /// Trailing comment lines, preserved verbatim by the codec.
    pub comments: Vec<String>,
}

impl Aig {
    /// Iterates over every definition literal: inputs, latches, gate outputs.
    fn definitions(&self) -> impl Iterator<Item = Lit> + '_ {
        self.inputs
            .iter()
            .map(|input| input.lit)
            .chain(self.latches.iter().map(|latch| latch.lit))
            .chain(self.ands.iter().map(|and| and.lhs))
    }

    /// Iterates over every literal referenced by the graph.
    fn references(&self) -> impl Iterator<Item = Lit> + '_ {
        self.latches
            .iter()
            .map(|latch| latch.next)
            .chain(self.ands.iter().flat_map(|and| [and.rhs0, and.rhs1]))
            .chain(self.outputs.iter().map(|output| output.lit))
    }

    /// Recomputes `max_var` from the literals actually mentioned.
    pub fn recompute_max_var(&mut self) {
        self.max_var = self
            .definitions()
            .chain(self.references())
            .map(Lit::var)
            .max()
            .unwrap_or(0);
    }

    /// Verifies the structural invariants: definition literals are positive,
    /// unnegated, in range and unique; every reference resolves to a defined
    /// variable or a constant.
    pub fn check(&self) -> Result<(), StructureError> {
        let mut defined = vec![false; self.max_var as usize + 1];
        for lit in self.definitions() {
            if lit.is_negated() {
                return Err(StructureError::NegatedDefinition(lit));
            }
            if lit.is_constant() {
                return Err(StructureError::ConstantDefinition);
            }
            if lit.var() > self.max_var {
                return Err(StructureError::OutOfRange(lit, self.max_var));
            }
            let slot = &mut defined[lit.var() as usize];
            if *slot {
                return Err(StructureError::Redefined(lit));
            }
            *slot = true;
        }
        for lit in self.references() {
            if lit.var() > self.max_var {
                return Err(StructureError::OutOfRange(lit, self.max_var));
            }
            if !lit.is_constant() && !defined[lit.var() as usize] {
                return Err(StructureError::Undefined(lit));
            }
        }
        Ok(())
    }
}
