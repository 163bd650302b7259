use std::process::ExitCode;

use anyhow::Result;

mod cli;

fn setup_logs(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse_ordered();
    setup_logs(cli.verbose);

    cli::execute(&cli)
}
