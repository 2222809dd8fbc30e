mod runner;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use minigolf_physics::config::PhysicsConfig;

use runner::{levels_from, parse_args, run};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            eprintln!(
                "usage: minigolf-sim [--level=ID] [--shots=angle:power,...] [--dt=S] \
                 [--max-ticks=N] [--levels=path.json] [--difficulty]"
            );
            return ExitCode::from(2);
        },
    };

    let config = PhysicsConfig::load();
    let summary =
        levels_from(args.levels_path.as_deref()).and_then(|levels| run(&args, config, levels));

    match summary {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to encode summary");
                ExitCode::FAILURE
            },
        },
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}
