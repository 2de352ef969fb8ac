//! native-ctl - Inspect and constrain the OS resource controls of a process

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use console::style;
use logging::Verbosity;
use native_access::{NativeAccess, SystemLibraryProvider};

fn main() {
    let cli = Cli::parse();

    logging::init_logger(Verbosity::from_flags(cli.verbose, cli.quiet));

    let mut access = match NativeAccess::new(&SystemLibraryProvider) {
        Ok(access) => access,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Check { json } => commands::check(&access, json),
        Commands::Limits { json } => commands::limits(&access, json),
        Commands::Mlock { lock } => commands::mlock(&mut access, lock),
        Commands::Preallocate { path, size } => commands::preallocate(&access, &path, &size),
        Commands::Sandbox => commands::sandbox(&mut access),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}
