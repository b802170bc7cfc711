// Command-line front end for deltafuzz.
//
// `run` is the fuzz loop, `replay` re-runs one recorded trial, `generate`
// writes test buffers without touching the tool, `config` prints defaults.

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::harness::{
    self, CommandTool, Harness, HarnessConfig, Session, SessionReport, TrialOutcome, UpdateMode,
};
use crate::io;
use crate::synth::{GenConfig, generate_original_sized, generate_variant};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_TOOL: &str = "tdmsync";
const DEFAULT_MIN_SIZE_LOG2: f64 = 8.0; // 256 B
const DEFAULT_MAX_SIZE_LOG2: f64 = 22.0; // 4 MiB

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_HALTED: i32 = 2;

// ---------------------------------------------------------------------------
// Size parsing
// ---------------------------------------------------------------------------

// Buffers are held in memory whole; anything past 4 GiB is a typo, not a test.
const MAX_SIZE_LOG2_LIMIT: f64 = 32.0;
const MAX_BUFFER_SIZE: u64 = 1 << 32;

/// Parse a buffer size in bytes; `K`, `M` and `G` are binary multiples.
fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let (digits, shift) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 10),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 20),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 30),
        _ => (s, 0),
    };
    let count: u64 = digits
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    let bytes = count
        .checked_shl(shift)
        .filter(|&b| b >> shift == count && b <= MAX_BUFFER_SIZE)
        .ok_or_else(|| format!("size '{s}' exceeds {MAX_BUFFER_SIZE} bytes"))?;
    usize::try_from(bytes).map_err(|_| format!("size '{s}' exceeds addressable memory"))
}

fn parse_size_log2(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid exponent '{s}': {e}"))?;
    if !(0.0..=MAX_SIZE_LOG2_LIMIT).contains(&v) {
        return Err(format!("exponent must be within 0..={MAX_SIZE_LOG2_LIMIT}"));
    }
    Ok(v)
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Differential fuzz harness for delta-synchronization tools.
#[derive(Parser, Debug)]
#[command(
    name = "deltafuzz",
    version,
    about = "Differential fuzz harness for delta-synchronization tools",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Quiet mode (only errors are logged).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print the session report as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Fuzz the tool until a trial fails.
    Run(RunArgs),
    /// Re-run a single recorded trial.
    Replay(ReplayArgs),
    /// Write a generated original (and optionally a variant) to disk.
    Generate(GenerateArgs),
    /// Print build/configuration defaults.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    File,
    Url,
}

impl From<ModeArg> for UpdateMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::File => UpdateMode::File,
            ModeArg::Url => UpdateMode::Url,
        }
    }
}

#[derive(Args, Debug)]
struct GenerationArgs {
    /// Lower bound of log2(original size).
    #[arg(long = "min-size-log2", value_parser = parse_size_log2, default_value_t = DEFAULT_MIN_SIZE_LOG2)]
    min_size_log2: f64,

    /// Upper bound of log2(original size).
    #[arg(long = "max-size-log2", value_parser = parse_size_log2, default_value_t = DEFAULT_MAX_SIZE_LOG2)]
    max_size_log2: f64,
}

#[derive(Args, Debug)]
struct HarnessArgs {
    /// Sync tool executable.
    #[arg(long, value_hint = ValueHint::CommandName, default_value = DEFAULT_TOOL)]
    tool: PathBuf,

    /// How `update` references the original.
    #[arg(long, value_enum, default_value_t = ModeArg::Url)]
    mode: ModeArg,

    /// Host of the static file responder (url mode).
    #[arg(long, default_value = harness::trial::DEFAULT_HOST)]
    host: String,

    /// Port of the static file responder (url mode).
    #[arg(long, short = 'p', default_value_t = harness::trial::DEFAULT_PORT)]
    port: u16,

    /// Directory for the artifacts (the responder's root in url mode).
    #[arg(long = "work-dir", value_hint = ValueHint::DirPath, default_value = ".")]
    work_dir: PathBuf,

    /// Variants tried against each original.
    #[arg(long, default_value_t = harness::trial::DEFAULT_TRIALS_PER_CASE)]
    trials: usize,

    /// Keep fuzzing when prepare/update fails; only mismatches halt.
    #[arg(long = "continue-on-tool-failure")]
    continue_on_tool_failure: bool,

    #[command(flatten)]
    generation: GenerationArgs,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Session seed (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many originals.
    #[arg(long = "max-cases")]
    max_cases: Option<u64>,

    #[command(flatten)]
    harness: HarnessArgs,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Case seed reported by a halted session.
    #[arg(long = "case-seed")]
    case_seed: u64,

    /// Trial index within the case.
    #[arg(long, default_value_t = 0)]
    trial: usize,

    #[command(flatten)]
    harness: HarnessArgs,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Case seed.
    #[arg(long)]
    seed: u64,

    /// Exact original size (supports K/M/G suffix).
    #[arg(long, value_parser = parse_buffer_size)]
    size: Option<usize>,

    /// Also write one variant of the original here.
    #[arg(long, value_hint = ValueHint::FilePath)]
    variant: Option<PathBuf>,

    #[command(flatten)]
    generation: GenerationArgs,

    /// Output file for the original.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

fn generation_config(args: &GenerationArgs) -> GenConfig {
    GenConfig {
        min_size_log2: args.min_size_log2,
        max_size_log2: args.max_size_log2.max(args.min_size_log2),
        ..GenConfig::default()
    }
}

fn harness_config(args: &HarnessArgs) -> HarnessConfig {
    HarnessConfig {
        mode: args.mode.into(),
        host: args.host.clone(),
        port: args.port,
        work_dir: args.work_dir.clone(),
        trials_per_case: args.trials,
        halt_on_tool_failure: !args.continue_on_tool_failure,
        generation: generation_config(&args.generation),
        ..HarnessConfig::default()
    }
}

fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("deltafuzz".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        match &cli.command {
            Cmd::Run(run) => {
                let _ = harness_config(&run.harness);
            }
            Cmd::Replay(replay) => {
                let _ = harness_config(&replay.harness);
            }
            Cmd::Generate(generate) => {
                let _ = generation_config(&generate.generation);
            }
            Cmd::Config => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

fn outcome_label(outcome: &TrialOutcome) -> &'static str {
    match outcome {
        TrialOutcome::Pass => "pass",
        TrialOutcome::ToolFailed(_) => "tool-failure",
        TrialOutcome::Mismatch(_) => "mismatch",
    }
}

fn report_json(report: &SessionReport) -> serde_json::Value {
    let halt = report.halt.as_ref().map(|h| {
        let mut value = serde_json::json!({
            "case_seed": h.case_seed,
            "trial": h.trial,
            "original_len": h.original_len,
            "modified_len": h.modified_len,
            "outcome": outcome_label(&h.outcome),
            "detail": describe_outcome(&h.outcome),
        });
        if let TrialOutcome::Mismatch(m) = &h.outcome {
            value["first_difference"] = serde_json::json!(m.first_difference);
            value["expected_sha256"] = serde_json::json!(m.expected_sha256.map(|d| io::hex(&d)));
            value["actual_sha256"] = serde_json::json!(m.actual_sha256.map(|d| io::hex(&d)));
        }
        value
    });
    serde_json::json!({
        "seed": report.seed,
        "cases": report.cases,
        "trials": report.trials,
        "passes": report.passes,
        "tool_failures": report.tool_failures,
        "halt": halt,
    })
}

fn describe_outcome(outcome: &TrialOutcome) -> String {
    match outcome {
        TrialOutcome::Pass => "pass".to_string(),
        TrialOutcome::ToolFailed(failure) => failure.to_string(),
        TrialOutcome::Mismatch(mismatch) => mismatch.to_string(),
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("deltafuzz: json error: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Run command
// ---------------------------------------------------------------------------

fn cmd_run(args: &RunArgs, json_output: bool) -> i32 {
    let config = harness_config(&args.harness);
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let work_dir = config.work_dir.clone();
    let harness = Harness::new(CommandTool::new(&args.harness.tool), config);
    let mut session = Session::new(harness, seed);

    if let Err(e) = session.run(args.max_cases).map(|_| ()) {
        eprintln!("deltafuzz: {e} (session seed {seed})");
        if json_output {
            print_json(&report_json(session.report()));
        }
        return EXIT_ERROR;
    }
    let report = session.report();

    if json_output {
        print_json(&report_json(report));
    }

    match &report.halt {
        Some(halt) => {
            eprintln!(
                "deltafuzz: halted at case seed {} trial {}: {}",
                halt.case_seed,
                halt.trial,
                describe_outcome(&halt.outcome)
            );
            eprintln!(
                "deltafuzz: artifacts left in {}; replay with `deltafuzz replay --case-seed {} --trial {}`",
                work_dir.display(),
                halt.case_seed,
                halt.trial
            );
            EXIT_HALTED
        }
        None => {
            log::info!(
                "session seed {}: {} cases, {} trials, {} passed",
                report.seed,
                report.cases,
                report.trials,
                report.passes
            );
            EXIT_OK
        }
    }
}

// ---------------------------------------------------------------------------
// Replay command
// ---------------------------------------------------------------------------

fn cmd_replay(args: &ReplayArgs, json_output: bool) -> i32 {
    let config = harness_config(&args.harness);
    let harness = Harness::new(CommandTool::new(&args.harness.tool), config);

    let outcome = match harness::replay(&harness, args.case_seed, args.trial) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("deltafuzz: {e}");
            return EXIT_ERROR;
        }
    };

    if json_output {
        print_json(&serde_json::json!({
            "case_seed": args.case_seed,
            "trial": args.trial,
            "outcome": outcome_label(&outcome),
            "detail": describe_outcome(&outcome),
        }));
    }

    if outcome.is_pass() {
        EXIT_OK
    } else {
        eprintln!(
            "deltafuzz: case seed {} trial {}: {}",
            args.case_seed,
            args.trial,
            describe_outcome(&outcome)
        );
        EXIT_HALTED
    }
}

// ---------------------------------------------------------------------------
// Generate command
// ---------------------------------------------------------------------------

// Without --size the original matches what `run` generates for case seed
// `--seed`, and the variant matches its trial 0.
fn cmd_generate(args: &GenerateArgs, json_output: bool) -> i32 {
    let generation = generation_config(&args.generation);

    let (original, variant) = match args.size {
        Some(size) => {
            let mut rng = StdRng::seed_from_u64(args.seed);
            let original = generate_original_sized(&mut rng, size);
            let variant = args
                .variant
                .as_ref()
                .map(|_| generate_variant(&mut rng, &original, &generation));
            (original, variant)
        }
        None => {
            let mut case = harness::Case::from_seed(args.seed, &generation);
            let variant = args.variant.as_ref().map(|_| case.next_variant());
            (case.original().to_vec(), variant)
        }
    };

    let original_stats = match io::write_artifact(&args.output, &original) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("deltafuzz: {e}");
            return EXIT_ERROR;
        }
    };
    let variant_stats = match (&args.variant, &variant) {
        (Some(path), Some(data)) => match io::write_artifact(path, data) {
            Ok(stats) => Some(stats),
            Err(e) => {
                eprintln!("deltafuzz: {e}");
                return EXIT_ERROR;
            }
        },
        _ => None,
    };

    log::info!(
        "generated {} bytes to {}",
        original_stats.size,
        original_stats.path.display()
    );

    if json_output {
        let entry = |stats: &io::ArtifactStats| {
            serde_json::json!({
                "path": stats.path.display().to_string(),
                "size": stats.size,
                "sha256": stats.sha256.map(|d| io::hex(&d)),
            })
        };
        print_json(&serde_json::json!({
            "seed": args.seed,
            "original": entry(&original_stats),
            "variant": variant_stats.as_ref().map(entry),
        }));
    }

    EXIT_OK
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("deltafuzz version {version}");

    let file_io = cfg!(feature = "file-io") as u8;
    let generation = GenConfig::default();
    let harness = HarnessConfig::default();

    eprintln!("FILE_IO={file_io}");
    eprintln!("DEFAULT_TOOL={DEFAULT_TOOL}");
    eprintln!("DEFAULT_MODE={}", harness.mode);
    eprintln!("DEFAULT_HOST={}", harness.host);
    eprintln!("DEFAULT_PORT={}", harness.port);
    eprintln!("DEFAULT_SRC_NAME={}", harness.src_name);
    eprintln!("DEFAULT_DST_NAME={}", harness.dst_name);
    eprintln!("DEFAULT_TRIALS_PER_CASE={}", harness.trials_per_case);
    eprintln!("DEFAULT_MIN_SIZE_LOG2={}", generation.min_size_log2);
    eprintln!("DEFAULT_MAX_SIZE_LOG2={}", generation.max_size_log2);
    eprintln!("MAX_VARIANT_ROUNDS={}", generation.max_variant_rounds);

    EXIT_OK
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.quiet, cli.verbose)),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();

    let exit_code = match &cli.command {
        Cmd::Run(args) => cmd_run(args, cli.json_output),
        Cmd::Replay(args) => cmd_replay(args, cli.json_output),
        Cmd::Generate(args) => cmd_generate(args, cli.json_output),
        Cmd::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv: Vec<String> = std::iter::once("deltafuzz".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        Cli::try_parse_from(argv).expect("cli parse failed")
    }

    #[test]
    fn buffer_size_is_capped() {
        assert_eq!(parse_buffer_size("4K").unwrap(), 4096);
        assert_eq!(parse_buffer_size(" 300 ").unwrap(), 300);
        assert!(parse_buffer_size("5G").is_err());
        assert!(parse_buffer_size("1.5M").is_err());
        assert!(parse_buffer_size("18446744073709551615K").is_err());
        assert!(parse_buffer_size("").is_err());
    }

    #[test]
    fn parse_size_log2_bounds() {
        assert_eq!(parse_size_log2("12").unwrap(), 12.0);
        assert!(parse_size_log2("-1").is_err());
        assert_eq!(parse_size_log2("32").unwrap(), 32.0);
        assert!(parse_size_log2("33").is_err());
        let err = Cli::try_parse_from(["deltafuzz", "run", "--min-size-log2", "40"]);
        assert!(err.is_err());
        assert!(parse_size_log2("abc").is_err());
    }

    #[test]
    fn run_defaults_match_harness_defaults() {
        let cli = parse(&["run"]);
        let Cmd::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.seed, None);
        assert_eq!(args.max_cases, None);
        assert_eq!(args.harness.tool, PathBuf::from("tdmsync"));
        let config = harness_config(&args.harness);
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn run_flags_map_to_config() {
        let cli = parse(&[
            "run",
            "--seed",
            "7",
            "--max-cases",
            "3",
            "--tool",
            "./mytool",
            "--mode",
            "file",
            "--port",
            "9001",
            "--host",
            "127.0.0.1",
            "--work-dir",
            "/tmp/fz",
            "--trials",
            "4",
            "--continue-on-tool-failure",
            "--min-size-log2",
            "10",
            "--max-size-log2",
            "12",
        ]);
        let Cmd::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.max_cases, Some(3));
        assert_eq!(args.harness.tool, PathBuf::from("./mytool"));
        let config = harness_config(&args.harness);
        assert_eq!(config.mode, UpdateMode::File);
        assert_eq!(config.port, 9001);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.work_dir, PathBuf::from("/tmp/fz"));
        assert_eq!(config.trials_per_case, 4);
        assert!(!config.halt_on_tool_failure);
        assert_eq!(config.generation.min_size_log2, 10.0);
        assert_eq!(config.generation.max_size_log2, 12.0);
    }

    #[test]
    fn inverted_size_band_collapses() {
        let cli = parse(&["run", "--min-size-log2", "12", "--max-size-log2", "9"]);
        let Cmd::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = harness_config(&args.harness);
        assert_eq!(config.generation.max_size_log2, 12.0);
    }

    #[test]
    fn replay_and_generate_parse() {
        let Cmd::Replay(replay) = parse(&["replay", "--case-seed", "99", "--trial", "3"]).command
        else {
            panic!("expected replay");
        };
        assert_eq!(replay.case_seed, 99);
        assert_eq!(replay.trial, 3);

        let Cmd::Generate(generate) = parse(&[
            "generate",
            "--seed",
            "1",
            "--size",
            "4K",
            "--variant",
            "v.dat",
            "o.dat",
        ])
        .command
        else {
            panic!("expected generate");
        };
        assert_eq!(generate.size, Some(4096));
        assert_eq!(generate.variant, Some(PathBuf::from("v.dat")));
        assert_eq!(generate.output, PathBuf::from("o.dat"));
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(log_filter(true, 0), "error");
        assert_eq!(log_filter(false, 0), "warn");
        assert_eq!(log_filter(false, 1), "info");
        assert_eq!(log_filter(false, 5), "debug");
        let cli = parse(&["-vv", "config"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Cmd::Config));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let argv = ["deltafuzz", "-q", "-v", "config"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn report_json_shape() {
        let report = SessionReport {
            seed: 5,
            cases: 2,
            trials: 20,
            passes: 20,
            ..SessionReport::default()
        };
        let value = report_json(&report);
        assert_eq!(value["seed"], 5);
        assert_eq!(value["trials"], 20);
        assert!(value["halt"].is_null());
    }

    #[test]
    fn fuzz_parse_never_panics_on_junk() {
        fuzz_try_parse_args(&["run".into(), "--port".into(), "99999".into()]);
        fuzz_try_parse_args(&["generate".into()]);
        fuzz_try_parse_args(&[]);
    }
}
