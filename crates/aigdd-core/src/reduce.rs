//! Hierarchical partition-and-probe minimization.
//!
//! The stable assignment vector always reproduces the baseline signature
//! when projected; candidates are verified against the oracle before any
//! state is committed. Chunk order is observable: each chunk's candidate is
//! built from the stable vector as updated by earlier chunks of the same
//! pass, ascending, with the false trial before the true trial.

use crate::aig::{Aig, StructureError, Var};
use crate::assign::{Assignment, AssignmentVec};
use crate::codec;
use crate::oracle::{ExitCode, Oracle, OracleError, Verdict};
use crate::project::project;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("cannot write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("oracle timed out on the unmodified source circuit, no signature to preserve")]
    BaselineTimeout,
    #[error("rewriting the unmodified circuit changed the oracle result ({got:?} instead of exit {expected}); codec or oracle is inconsistent")]
    BaselineInconsistency { expected: ExitCode, got: Verdict },
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Counters accumulated over one reduction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceStats {
    /// Exit code of the oracle on the untouched source circuit.
    pub baseline: ExitCode,
    /// Candidate probes performed by the engine.
    pub probes: u64,
    /// Total oracle invocations, including the baseline and the
    /// baseline-consistency check.
    pub oracle_calls: u64,
    /// Chunk trials whose candidate was committed into the stable vector.
    pub commits: u64,
    /// Variables whose final state is not Free.
    pub eliminated: u32,
    /// Variables still Free at the end of the run.
    pub remaining: u32,
}

/// Result of a completed run: the final stable vector and its counters.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub assignment: AssignmentVec,
    pub stats: ReduceStats,
}

struct Reducer<'a, O> {
    src: &'a Aig,
    dst: &'a Path,
    oracle: O,
    baseline: ExitCode,
    stable: AssignmentVec,
    probes: u64,
    oracle_calls: u64,
    commits: u64,
}

/// Shrinks `src` to a minimal variant that still makes the oracle return
/// the baseline exit code, writing the result to `dst_path`.
///
/// The baseline is resolved on `src_path`, the untouched source file; every
/// probe overwrites `dst_path` with a fresh projection. On success the last
/// write to `dst_path` is the minimized circuit.
pub fn reduce<O: Oracle>(
    src: &Aig,
    src_path: &Path,
    dst_path: &Path,
    mut oracle: O,
) -> Result<Reduction, ReduceError> {
    let baseline = match oracle.run(src_path)? {
        Verdict::Exit(code) => code,
        Verdict::TimedOut => return Err(ReduceError::BaselineTimeout),
    };
    info!("oracle exits with {baseline} on '{}'", src_path.display());

    let mut reducer = Reducer {
        src,
        dst: dst_path,
        oracle,
        baseline,
        stable: AssignmentVec::all_free(src.max_var),
        probes: 0,
        oracle_calls: 1,
        commits: 0,
    };
    reducer.ensure_consistent_baseline()?;
    reducer.run_passes()?;

    let stable = reducer.stable.clone();
    reducer.write_projection(&stable)?;
    let eliminated = stable.bound_count();
    info!("changed {eliminated}");

    Ok(Reduction {
        stats: ReduceStats {
            baseline,
            probes: reducer.probes,
            oracle_calls: reducer.oracle_calls,
            commits: reducer.commits,
            eliminated,
            remaining: stable.free_count(),
        },
        assignment: stable,
    })
}

impl<O: Oracle> Reducer<'_, O> {
    fn write_projection(&mut self, assign: &AssignmentVec) -> Result<(), ReduceError> {
        let reduced = project(self.src, assign)?;
        fs::write(self.dst, codec::write(&reduced)).map_err(|source| ReduceError::Io {
            path: self.dst.to_path_buf(),
            source,
        })
    }

    /// Projects and probes one candidate. True means the oracle reproduced
    /// the baseline exactly; a timed-out run never does.
    fn probe(&mut self, candidate: &AssignmentVec) -> Result<bool, ReduceError> {
        self.write_projection(candidate)?;
        let verdict = self.oracle.run(self.dst)?;
        self.probes += 1;
        self.oracle_calls += 1;
        Ok(verdict == Verdict::Exit(self.baseline))
    }

    /// Rewriting the unmodified circuit must reproduce the baseline, or the
    /// codec round trip or the oracle itself is broken.
    fn ensure_consistent_baseline(&mut self) -> Result<(), ReduceError> {
        let all_free = self.stable.clone();
        self.write_projection(&all_free)?;
        let verdict = self.oracle.run(self.dst)?;
        self.oracle_calls += 1;
        if verdict != Verdict::Exit(self.baseline) {
            return Err(ReduceError::BaselineInconsistency {
                expected: self.baseline,
                got: verdict,
            });
        }
        Ok(())
    }

    /// One descending sweep of chunk widths, no return to coarse widths.
    fn run_passes(&mut self) -> Result<(), ReduceError> {
        let max_var = self.src.max_var;
        let mut delta = max_var;
        while delta > 0 {
            info!("pass with chunk width {delta}");
            let mut lo: Var = 1;
            while lo <= max_var {
                let hi = lo.saturating_add(delta - 1).min(max_var);
                self.try_chunk(lo, hi)?;
                lo = lo.saturating_add(delta);
            }
            delta /= 2;
        }
        Ok(())
    }

    fn try_chunk(&mut self, lo: Var, hi: Var) -> Result<(), ReduceError> {
        let width = hi - lo + 1;

        // Force-to-false trial. Zero is always favored, so a variable
        // previously committed to True is re-tried as False here.
        let mut candidate = self.stable.clone();
        let mut changed = 0u32;
        for var in lo..=hi {
            if self.stable.get(var) != Assignment::False {
                changed += 1;
            }
            candidate.set(var, Assignment::False);
        }
        if changed == 0 {
            debug!("[{lo},{hi}] stabilized to 0");
            return Ok(());
        }
        if self.probe(&candidate)? {
            debug!("[{lo},{hi}] set to 0 ({changed} out of {width})");
            self.stable = candidate;
            self.commits += 1;
            return Ok(());
        }
        debug!("[{lo},{hi}] can not be set to 0 ({changed} out of {width})");

        // Force-to-true trial. False is sticky: a variable already at False
        // stays there and contributes nothing to the changed count.
        let mut candidate = self.stable.clone();
        let mut changed = 0u32;
        for var in lo..=hi {
            if self.stable.get(var) == Assignment::Free {
                candidate.set(var, Assignment::True);
                changed += 1;
            }
        }
        if changed == 0 {
            return Ok(());
        }
        if self.probe(&candidate)? {
            debug!("[{lo},{hi}] set to 1 ({changed} out of {width})");
            self.stable = candidate;
            self.commits += 1;
        } else {
            debug!("[{lo},{hi}] can neither be set to 1 ({changed} out of {width})");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn four_input_chain() -> Aig {
        // Inputs 2, 4, 6, 8; outputs observe variables 1 and 2.
        codec::parse(b"aag 4 4 0 2 0\n2\n4\n6\n8\n2\n4\n").expect("parse")
    }

    fn reducer<'a, O: Oracle>(src: &'a Aig, dst: &'a Path, oracle: O) -> Reducer<'a, O> {
        Reducer {
            src,
            dst,
            oracle,
            baseline: 0,
            stable: AssignmentVec::all_free(src.max_var),
            probes: 0,
            oracle_calls: 0,
            commits: 0,
        }
    }

    #[test]
    fn rejected_trials_leave_stable_untouched() {
        let src = four_input_chain();
        let dir = tempfile::tempdir().expect("tempdir");
        let dst = dir.path().join("candidate.aag");
        let reject = |_: &Path| -> Result<Verdict, OracleError> { Ok(Verdict::Exit(1)) };
        let mut reducer = reducer(&src, &dst, reject);

        reducer.try_chunk(1, 4).expect("try_chunk");
        assert_eq!(reducer.stable, AssignmentVec::all_free(4));
        assert_eq!(reducer.probes, 2);
        assert_eq!(reducer.commits, 0);
    }

    #[test]
    fn sticky_false_is_excluded_from_the_true_trial() {
        let src = four_input_chain();
        let dir = tempfile::tempdir().expect("tempdir");
        let dst = dir.path().join("candidate.aag");

        let seen: RefCell<Vec<Vec<u8>>> = RefCell::new(Vec::new());
        let record = |path: &Path| -> Result<Verdict, OracleError> {
            seen.borrow_mut().push(fs::read(path).expect("read candidate"));
            Ok(Verdict::Exit(1))
        };
        let mut reducer = reducer(&src, &dst, record);
        reducer.stable.set(1, Assignment::False);

        reducer.try_chunk(1, 4).expect("try_chunk");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        let true_trial = codec::parse(&seen[1]).expect("parse true trial");
        // Variable 1 stays at constant false while variable 2 is raised to
        // constant true.
        assert_eq!(true_trial.outputs[0].lit, crate::aig::Lit::FALSE);
        assert_eq!(true_trial.outputs[1].lit, crate::aig::Lit::TRUE);
    }

    #[test]
    fn fully_stabilized_chunk_probes_nothing() {
        let src = four_input_chain();
        let dir = tempfile::tempdir().expect("tempdir");
        let dst = dir.path().join("candidate.aag");
        let panic_on_call = |_: &Path| -> Result<Verdict, OracleError> {
            panic!("no probe expected for a fully stabilized chunk")
        };
        let mut reducer = reducer(&src, &dst, panic_on_call);
        for var in 1..=4 {
            reducer.stable.set(var, Assignment::False);
        }

        reducer.try_chunk(1, 4).expect("try_chunk");
        assert_eq!(reducer.probes, 0);
    }
}
