pub mod aig;
pub mod assign;
pub mod codec;
pub mod oracle;
pub mod project;
pub mod reduce;

pub use aig::{Aig, AndGate, Input, Latch, Lit, Output, StructureError, Var};
pub use assign::{Assignment, AssignmentVec};
pub use codec::ParseError;
pub use oracle::{CommandOracle, ExitCode, Oracle, OracleError, Verdict};
pub use project::project;
pub use reduce::{reduce, ReduceError, ReduceStats, Reduction};
