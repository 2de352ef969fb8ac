use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "native-ctl")]
#[command(version, about = "Inspect and constrain this process's OS resource controls", long_about = None)]
#[command(after_help = "EXAMPLES:
    native-ctl check
    native-ctl limits --json
    native-ctl mlock --lock
    native-ctl preallocate /var/lib/data/segment 64M
    native-ctl sandbox
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the detected OS variant and its constants
    Check {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show process resource limits
    Limits {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how to grant the memory-lock privilege
    Mlock {
        /// Also try to lock this process's memory
        #[arg(long)]
        lock: bool,
    },

    /// Reserve disk space for a file (creating it if needed)
    Preallocate {
        /// File to grow
        path: PathBuf,

        /// Target size (4096, 100K, 64M, 1G)
        size: String,
    },

    /// Install the exec sandbox, then check thread and process creation fail
    Sandbox,
}
