#![no_main]
use libfuzzer_sys::fuzz_target;

const SUBCOMMANDS: [&str; 4] = ["run", "replay", "generate", "config"];

// The first byte picks a subcommand so the argument tokens reach its flags
// (`--size`, `--min-size-log2`, `--case-seed`, ...) instead of stopping at
// the top-level parser.
fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let subcommand = SUBCOMMANDS[usize::from(selector) % SUBCOMMANDS.len()];
    let text = String::from_utf8_lossy(rest);
    let args: Vec<String> = std::iter::once(subcommand.to_string())
        .chain(text.split_whitespace().take(32).map(str::to_string))
        .collect();
    deltafuzz::cli::fuzz_try_parse_args(&args);
});
