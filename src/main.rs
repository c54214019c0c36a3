mod assemble;
mod commands;
mod config;
mod fingerprint;
mod http;
mod ingest;
mod render;
mod source;
mod store;
mod tracker;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Workout-of-the-day Atom feed generator
#[derive(Parser)]
struct Args {
    /// Path to the sqlite store
    #[arg(long, global = true, default_value = "wods.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the upstream schedule and reconcile it into the store
    Sync,
    /// Emit the Atom feed from the store
    Render {
        /// Write the feed here instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Sync => commands::sync::cmd_sync(&args.db),
        Command::Render { ref output } => commands::render::cmd_render(&args.db, output.as_deref()),
    }
}
