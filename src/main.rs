use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use swerve_drivetrain_config::config::ChassisParams;

/// Assemble the swerve drivetrain configuration and print it as JSON
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON file overriding the compiled-in chassis parameters
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let params = match &args.params {
        Some(path) => ChassisParams::load(path)?,
        None => {
            info!("Using compiled-in chassis parameters");
            ChassisParams::default()
        }
    };

    let drivetrain = params.build_drivetrain()?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&drivetrain)?
    } else {
        serde_json::to_string(&drivetrain)?
    };
    println!("{}", json);
    Ok(())
}

fn main() {
    // Setup logging (set RUST_LOG=info or debug); stdout carries the JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }
}
