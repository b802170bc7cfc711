// The synchronization tool under test.
//
// `SyncTool` is the seam between the harness and the tool. `CommandTool`
// drives a real executable through its `prepare` / `update` subcommands
// using argument arrays (no shell), capturing the exit status and stderr.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Where the tool should fetch the prepared original from during `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A local file path (`update -file`).
    File(PathBuf),
    /// An HTTP URL served by a static responder (`update -url`).
    Url(String),
}

/// Which tool operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOp {
    Prepare,
    Update,
}

impl fmt::Display for ToolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => f.write_str("prepare"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// A tool run that finished unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{op} failed ({status}){}", stderr_suffix(.stderr))]
pub struct ToolFailure {
    /// The operation that failed.
    pub op: ToolOp,
    /// Human-readable exit status (`exit code 1`, `signal 9`, ...).
    pub status: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Errors from invoking the tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The tool ran and reported failure.
    #[error(transparent)]
    Failed(#[from] ToolFailure),
    /// The tool could not be started at all.
    #[error("cannot run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Operations the harness needs from a delta-synchronization tool.
pub trait SyncTool {
    /// Precompute whatever index/signature the tool needs for `path`.
    fn prepare(&self, path: &Path) -> Result<(), ToolError>;

    /// Reconstruct `reference` next to `target`, writing `<target>.updated`.
    fn update(&self, reference: &Reference, target: &Path) -> Result<(), ToolError>;
}

impl<T: SyncTool + ?Sized> SyncTool for &T {
    fn prepare(&self, path: &Path) -> Result<(), ToolError> {
        (**self).prepare(path)
    }

    fn update(&self, reference: &Reference, target: &Path) -> Result<(), ToolError> {
        (**self).update(reference, target)
    }
}

/// Runs an external executable as the sync tool.
#[derive(Debug, Clone)]
pub struct CommandTool {
    program: PathBuf,
}

impl CommandTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, op: ToolOp, command: &mut Command) -> Result<(), ToolError> {
        log::trace!("running {:?}", command);
        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if output.status.success() {
            return Ok(());
        }
        Err(ToolFailure {
            op,
            status: describe_status(output.status),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into())
    }
}

impl SyncTool for CommandTool {
    fn prepare(&self, path: &Path) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("prepare").arg(path);
        self.run(ToolOp::Prepare, &mut cmd)
    }

    fn update(&self, reference: &Reference, target: &Path) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("update");
        match reference {
            Reference::File(path) => cmd.arg("-file").arg(path),
            Reference::Url(url) => cmd.arg("-url").arg(url),
        };
        cmd.arg(target);
        self.run(ToolOp::Update, &mut cmd)
    }
}

fn describe_status(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("signal {signal}");
        }
    }
    status.to_string()
}
