use clap::Parser;
use tracing_subscriber::EnvFilter;

use canopy_trainer::{TrainConfig, render_summary, run_training};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = TrainConfig::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error during training: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(run_training(&config)) {
        Ok(report) => println!("{}", render_summary(&report)),
        Err(e) => {
            eprintln!("Error during training: {e:#}");
            std::process::exit(1);
        }
    }
}
