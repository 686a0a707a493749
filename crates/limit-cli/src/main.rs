use std::{io, process, str::FromStr};

use clap::Parser;
use log::{debug, error, info, LevelFilter};

use limit_cli::{Args, Status};

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(args:?; "Parsed arguments");

    let stdout = io::stdout();
    let stderr = io::stderr();
    match limit_cli::run(&args, &mut stdout.lock(), &mut stderr.lock()) {
        Ok(Status::Clean) => info!("Completed successfully"),
        Ok(Status::Failed(errors)) => {
            info!(errors = errors; "Completed with errors");
            process::exit(1);
        }
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            process::exit(2);
        }
    }
}
