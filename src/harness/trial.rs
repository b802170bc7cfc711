// One trial: persist an original/modified pair, run the tool, verify.
//
//   GENERATE -> PERSIST -> PREPARE -> UPDATE -> VERIFY -> {PASS, FAIL}
//
// The reconstruction is compared against the *original*, which is the
// reference copy the tool synchronizes from.

use std::fmt;
use std::path::PathBuf;

use rand::Rng;

use crate::io::{self, IoError};
use crate::synth::{GenConfig, generate_variant};

use super::tool::{Reference, SyncTool, ToolError, ToolFailure};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default port of the static responder serving the work directory.
pub const DEFAULT_PORT: u16 = 8001;
/// Default host of the static responder.
pub const DEFAULT_HOST: &str = "localhost";
/// Default file name of the original artifact.
pub const DEFAULT_SRC_NAME: &str = "fuzz_src.dat";
/// Default file name of the modified artifact.
pub const DEFAULT_DST_NAME: &str = "fuzz_dst.dat";
/// Default number of variants tried against each original.
pub const DEFAULT_TRIALS_PER_CASE: usize = 10;

/// How `update` references the prepared original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Pass the original's local path (`update -file`).
    File,
    /// Pass an HTTP URL to the original (`update -url`).
    #[default]
    Url,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Url => f.write_str("url"),
        }
    }
}

/// Harness configuration, fixed for a whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// File or URL references during `update`.
    pub mode: UpdateMode,
    /// Host of the static responder (URL mode).
    pub host: String,
    /// Port of the static responder (URL mode).
    pub port: u16,
    /// Directory holding the artifacts; also the responder's root.
    pub work_dir: PathBuf,
    /// File name of the original artifact.
    pub src_name: String,
    /// File name of the modified artifact.
    pub dst_name: String,
    /// Variants tried against each original.
    pub trials_per_case: usize,
    /// Stop the session when prepare/update fails, not only on mismatches.
    pub halt_on_tool_failure: bool,
    /// Test-case generation tuning.
    pub generation: GenConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: UpdateMode::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            work_dir: PathBuf::from("."),
            src_name: DEFAULT_SRC_NAME.to_string(),
            dst_name: DEFAULT_DST_NAME.to_string(),
            trials_per_case: DEFAULT_TRIALS_PER_CASE,
            halt_on_tool_failure: true,
            generation: GenConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn src_path(&self) -> PathBuf {
        self.work_dir.join(&self.src_name)
    }

    pub fn dst_path(&self) -> PathBuf {
        self.work_dir.join(&self.dst_name)
    }

    /// Reference handed to `update` for the current mode.
    pub fn reference(&self) -> Reference {
        match self.mode {
            UpdateMode::File => Reference::File(self.src_path()),
            UpdateMode::Url => Reference::Url(format!(
                "http://{}:{}/{}",
                self.host, self.port, self.src_name
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// The reconstruction did not match the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Length of the original.
    pub expected_len: u64,
    /// Length of the reconstruction, `None` if the tool wrote nothing.
    pub actual_len: Option<u64>,
    /// First differing offset (absent when no output was written).
    pub first_difference: Option<u64>,
    /// SHA-256 of the original (if `file-io` feature is enabled).
    pub expected_sha256: Option<[u8; 32]>,
    /// SHA-256 of the reconstruction (if `file-io` feature is enabled).
    pub actual_sha256: Option<[u8; 32]>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.actual_len, self.first_difference) {
            (None, _) => write!(
                f,
                "no reconstruction written (expected {} bytes)",
                self.expected_len
            ),
            (Some(actual), Some(offset)) => write!(
                f,
                "reconstruction differs at offset {offset} (expected {} bytes, got {actual})",
                self.expected_len
            ),
            (Some(actual), None) => write!(
                f,
                "reconstruction differs (expected {} bytes, got {actual})",
                self.expected_len
            ),
        }
    }
}

/// Result of a single trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// The reconstruction is byte-identical to the original.
    Pass,
    /// `prepare` or `update` reported failure.
    ToolFailed(ToolFailure),
    /// `update` succeeded but produced the wrong bytes.
    Mismatch(Mismatch),
}

impl TrialOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Conditions that stop the harness itself (as opposed to failing a trial).
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Runs trials of a [`SyncTool`] against generated buffers.
pub struct Harness<T> {
    tool: T,
    config: HarnessConfig,
}

impl<T: SyncTool> Harness<T> {
    pub fn new(tool: T, config: HarnessConfig) -> Self {
        Self { tool, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Generate a variant of `original` and run it as one trial.
    pub fn run_trial<R: Rng>(
        &self,
        rng: &mut R,
        original: &[u8],
    ) -> Result<TrialOutcome, HarnessError> {
        let modified = generate_variant(rng, original, &self.config.generation);
        self.run_pair(original, &modified)
    }

    /// Run one trial with an explicit modified buffer.
    ///
    /// Tool failures become [`TrialOutcome::ToolFailed`]; only artifact I/O
    /// errors and an unstartable tool are returned as errors.
    pub fn run_pair(&self, original: &[u8], modified: &[u8]) -> Result<TrialOutcome, HarnessError> {
        let src = self.config.src_path();
        let dst = self.config.dst_path();
        let updated = io::updated_path(&dst);

        let src_stats = io::write_artifact(&src, original)?;
        io::write_artifact(&dst, modified)?;
        // A stale reconstruction must not pass for a fresh one.
        io::remove_artifact(&updated)?;
        log::debug!(
            "trial: original {} bytes, modified {} bytes",
            original.len(),
            modified.len()
        );

        if let Some(failure) = tool_failure(self.tool.prepare(&src))? {
            return Ok(TrialOutcome::ToolFailed(failure));
        }
        let reference = self.config.reference();
        if let Some(failure) = tool_failure(self.tool.update(&reference, &dst))? {
            return Ok(TrialOutcome::ToolFailed(failure));
        }

        let got = io::read_artifact(&updated)?;
        Ok(verify(original, src_stats.sha256, got.as_deref()))
    }
}

fn tool_failure(result: Result<(), ToolError>) -> Result<Option<ToolFailure>, HarnessError> {
    match result {
        Ok(()) => Ok(None),
        Err(ToolError::Failed(failure)) => Ok(Some(failure)),
        Err(e) => Err(e.into()),
    }
}

fn verify(original: &[u8], original_sha256: Option<[u8; 32]>, got: Option<&[u8]>) -> TrialOutcome {
    let expected_len = original.len() as u64;
    match got {
        Some(got) if got == original => TrialOutcome::Pass,
        Some(got) => TrialOutcome::Mismatch(Mismatch {
            expected_len,
            actual_len: Some(got.len() as u64),
            first_difference: io::first_difference(original, got),
            expected_sha256: original_sha256,
            actual_sha256: io::sha256(got),
        }),
        None => TrialOutcome::Mismatch(Mismatch {
            expected_len,
            actual_len: None,
            first_difference: None,
            expected_sha256: original_sha256,
            actual_sha256: None,
        }),
    }
}
