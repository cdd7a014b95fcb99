//! Logger setup shared by both binaries

use log::LevelFilter;

/// Initialize `env_logger`.
///
/// `RUST_LOG` is honoured when set. Otherwise output starts at `info` and
/// [`set_verbose`] can raise it to `debug` once the options are resolved.
pub fn init() {
    let explicit = std::env::var_os("RUST_LOG").is_some();
    let env = env_logger::Env::default().default_filter_or("debug");
    env_logger::Builder::from_env(env)
        .format_target(false)
        .init();

    if !explicit {
        log::set_max_level(LevelFilter::Info);
    }
}

/// Raise the log level to `debug`
pub fn set_verbose(verbose: bool) {
    if verbose && log::max_level() < LevelFilter::Debug {
        log::set_max_level(LevelFilter::Debug);
    }
}
