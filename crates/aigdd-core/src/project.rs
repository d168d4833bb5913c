use crate::aig::{Aig, AndGate, Input, Latch, Output, StructureError};
use crate::assign::{Assignment, AssignmentVec};

/// Rewrites a circuit under an assignment vector.
///
/// A declaration is retained only while its own variable is Free; consumers
/// of a dropped variable see the substituted constant through their rewritten
/// operand literals. Outputs are always retained and may legally resolve to
/// a constant. One-level substitution is sufficient because the constant
/// states are terminal.
pub fn project(aig: &Aig, assign: &AssignmentVec) -> Result<Aig, StructureError> {
    let mut reduced = Aig::default();

    for input in &aig.inputs {
        if assign.get(input.lit.var()) == Assignment::Free {
            reduced.inputs.push(Input {
                lit: input.lit,
                name: input.name.clone(),
            });
        }
    }
    for latch in &aig.latches {
        if assign.get(latch.lit.var()) == Assignment::Free {
            reduced.latches.push(Latch {
                lit: latch.lit,
                next: assign.resolve(latch.next),
                name: latch.name.clone(),
            });
        }
    }
    for and in &aig.ands {
        if assign.get(and.lhs.var()) == Assignment::Free {
            reduced.ands.push(AndGate {
                lhs: and.lhs,
                rhs0: assign.resolve(and.rhs0),
                rhs1: assign.resolve(and.rhs1),
            });
        }
    }
    for output in &aig.outputs {
        reduced.outputs.push(Output {
            lit: assign.resolve(output.lit),
            name: output.name.clone(),
        });
    }

    reduced.recompute_max_var();
    // Substitution only removes declarations; a violation here is a bug.
    reduced.check()?;
    Ok(reduced)
}
