use tracing_subscriber::EnvFilter;

/// Log filter from `GOLOC_LOG`, then `RUST_LOG`, else `warn`. Output goes to
/// stderr so stdout stays clean for `--json`.
pub fn init() {
    let filter = ["GOLOC_LOG", "RUST_LOG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
