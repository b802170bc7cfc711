fn main() {
    #[cfg(feature = "cli")]
    deltafuzz::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("deltafuzz: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
