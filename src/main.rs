use log::LevelFilter;
use sharpc::driver::cli::Cli;
use sharpc::driver::Driver;
use sharpc::host;
use std::process::exit;

/// The main entry point for the application.
///
/// Collects the raw arguments, runs the driver and exits with its status.
fn main() {
    init_logging();

    let args = Cli::collect(std::env::args_os().skip(1)).into_args();
    let mut driver = Driver::new();
    let status = driver.run(args, host::collaborators());
    exit(status.code());
}

/// `RUST_LOG` picks the filter. Without it only warnings show until
/// `--mcs-debug` raises the level.
fn init_logging() {
    let explicit = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .format_timestamp(None)
        .init();
    if !explicit {
        log::set_max_level(LevelFilter::Warn);
    }
}
