use log::LevelFilter;

/// Installs `env_logger` at `info`, or `debug` when `verbose` is set.
/// `RUST_LOG` still overrides both.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
