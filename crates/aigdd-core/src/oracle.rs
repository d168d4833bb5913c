use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

pub type ExitCode = i32;

/// Outcome of one oracle invocation.
///
/// A timed-out run carries no failure signature; it can never match the
/// baseline and therefore counts as an ordinary probe mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Exit(ExitCode),
    TimedOut,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to start oracle '{program}': {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to wait for oracle: {0}")]
    Wait(#[from] std::io::Error),
}

/// The external differential-test executable, abstracted for the engine.
///
/// Implementations must behave as a deterministic function of the file
/// content at `path`; repeat invocations on byte-identical files are
/// expected to return identical verdicts.
pub trait Oracle {
    fn run(&mut self, path: &Path) -> Result<Verdict, OracleError>;
}

impl<F> Oracle for F
where
    F: FnMut(&Path) -> Result<Verdict, OracleError>,
{
    fn run(&mut self, path: &Path) -> Result<Verdict, OracleError> {
        self(path)
    }
}

/// Runs an oracle executable with the circuit path as its single argument.
///
/// The child's exit code is the only signal consumed; stdout and stderr are
/// discarded. The wait is blocking unless a timeout is configured.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl CommandOracle {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Oracle for CommandOracle {
    fn run(&mut self, path: &Path) -> Result<Verdict, OracleError> {
        let mut child = Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OracleError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    child.kill().ok();
                    let _ = child.wait();
                    return Ok(Verdict::TimedOut);
                }
            },
            None => child.wait()?,
        };
        Ok(Verdict::Exit(exit_code(status)))
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> ExitCode {
    status.code().unwrap_or(1)
}
