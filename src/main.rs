use rescale::RescaleError;
use rescale::cli::Args;
use std::error::Error;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    let args = match Args::parse_from_args(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => return report(&e),
    };

    init_tracing(&args);
    info!(
        "{} v{} for {} data types",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        args.sample_type
    );

    match args
        .into_config()
        .and_then(|(config, inputs)| rescale::run(&config, &inputs))
    {
        Ok(summary) => {
            info!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

/// Log to stderr; `RESCALE_LOG` overrides the level picked by -q / -v
fn init_tracing(args: &Args) {
    let level = if args.quiet {
        "warn"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_env("RESCALE_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Print `e` where the user expects it and pick its exit code
fn report(e: &RescaleError) -> ExitCode {
    if e.is_help() {
        print!("{e}");
    } else if let RescaleError::InvalidArguments(clap_error) = e {
        let _ = clap_error.print();
    } else {
        eprintln!("Error: {}", error_chain(e));
    }
    ExitCode::from(e.exit_code())
}

fn error_chain(e: &dyn Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}
