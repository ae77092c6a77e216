// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use clap::Parser;

use posture_monitor::cli::args::{Cli, Commands};
use posture_monitor::cli::logging::set_verbose;
use posture_monitor::cli::run::run_monitor;
use posture_monitor::error;

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => {
            set_verbose(args.verbose);
            if let Err(e) = run_monitor(args) {
                error!("{e}");
                process::exit(1);
            }
        }
    }
}
