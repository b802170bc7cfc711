// The fuzz loop.
//
// A session draws a seed per case; the case RNG generates the original and
// then the variants of its trials in order, so `(case_seed, trial)` pins down
// one trial exactly. The session halts at the first mismatch, leaving the
// artifacts of the failing trial on disk.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::synth::{GenConfig, generate_original, generate_variant};

use super::tool::SyncTool;
use super::trial::{Harness, HarnessError, TrialOutcome};

// ---------------------------------------------------------------------------
// Case
// ---------------------------------------------------------------------------

/// One generated original and the deterministic stream of its variants.
pub struct Case {
    seed: u64,
    rng: StdRng,
    original: Vec<u8>,
    next_trial: usize,
    generation: GenConfig,
}

impl Case {
    /// Regenerate the case identified by `seed`.
    pub fn from_seed(seed: u64, generation: &GenConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let original = generate_original(&mut rng, generation);
        Self {
            seed,
            rng,
            original,
            next_trial: 0,
            generation: generation.clone(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn original(&self) -> &[u8] {
        &self.original
    }

    /// Index the next call to [`Case::next_variant`] will produce.
    pub fn next_trial(&self) -> usize {
        self.next_trial
    }

    /// Produce the variant for the next trial.
    pub fn next_variant(&mut self) -> Vec<u8> {
        self.next_trial += 1;
        generate_variant(&mut self.rng, &self.original, &self.generation)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Why and where a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    /// Seed of the case containing the failing trial.
    pub case_seed: u64,
    /// Index of the failing trial within its case.
    pub trial: usize,
    /// Length of the original.
    pub original_len: usize,
    /// Length of the modified buffer.
    pub modified_len: usize,
    /// The failing outcome (never [`TrialOutcome::Pass`]).
    pub outcome: TrialOutcome,
}

/// Counters for a session so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Seed the session RNG was built from.
    pub seed: u64,
    /// Originals generated.
    pub cases: u64,
    /// Trials completed.
    pub trials: u64,
    /// Trials that passed.
    pub passes: u64,
    /// Trials whose prepare/update failed.
    pub tool_failures: u64,
    /// Set once the session stopped on a failing trial.
    pub halt: Option<Halt>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Drives a [`Harness`] over an unbounded stream of generated cases.
pub struct Session<T> {
    harness: Harness<T>,
    rng: StdRng,
    report: SessionReport,
}

impl<T: SyncTool> Session<T> {
    pub fn new(harness: Harness<T>, seed: u64) -> Self {
        Self {
            harness,
            rng: StdRng::seed_from_u64(seed),
            report: SessionReport {
                seed,
                ..SessionReport::default()
            },
        }
    }

    pub fn harness(&self) -> &Harness<T> {
        &self.harness
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Run cases until a trial halts the session or `max_cases` cases have run
    /// (never, if `None`).
    pub fn run(&mut self, max_cases: Option<u64>) -> Result<&SessionReport, HarnessError> {
        log::info!("session seed {}", self.report.seed);
        while self.report.halt.is_none() && max_cases.is_none_or(|max| self.report.cases < max) {
            self.run_case()?;
        }
        Ok(&self.report)
    }

    /// Generate one original and run its trials. Returns `true` if the session halted.
    pub fn run_case(&mut self) -> Result<bool, HarnessError> {
        if self.report.halt.is_some() {
            return Ok(true);
        }
        let case_seed: u64 = self.rng.random();
        let mut case = Case::from_seed(case_seed, &self.harness.config().generation);
        self.report.cases += 1;
        log::debug!(
            "case {} (seed {case_seed}): original {} bytes",
            self.report.cases,
            case.original().len()
        );

        for _ in 0..self.harness.config().trials_per_case {
            let trial = case.next_trial();
            let modified = case.next_variant();
            let outcome = self.harness.run_pair(case.original(), &modified)?;
            self.report.trials += 1;

            let halt = match &outcome {
                TrialOutcome::Pass => {
                    self.report.passes += 1;
                    false
                }
                TrialOutcome::ToolFailed(failure) => {
                    self.report.tool_failures += 1;
                    log::warn!("case seed {case_seed} trial {trial}: {failure}");
                    self.harness.config().halt_on_tool_failure
                }
                TrialOutcome::Mismatch(mismatch) => {
                    log::error!("case seed {case_seed} trial {trial}: {mismatch}");
                    true
                }
            };
            if halt {
                self.report.halt = Some(Halt {
                    case_seed,
                    trial,
                    original_len: case.original().len(),
                    modified_len: modified.len(),
                    outcome,
                });
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Re-run trial `trial` of the case generated from `case_seed`.
pub fn replay<T: SyncTool>(
    harness: &Harness<T>,
    case_seed: u64,
    trial: usize,
) -> Result<TrialOutcome, HarnessError> {
    let mut case = Case::from_seed(case_seed, &harness.config().generation);
    let mut modified = case.next_variant();
    while case.next_trial() <= trial {
        modified = case.next_variant();
    }
    log::info!(
        "replaying case seed {case_seed} trial {trial}: original {} bytes, modified {} bytes",
        case.original().len(),
        modified.len()
    );
    harness.run_pair(case.original(), &modified)
}
