//! CLI frontend for inspecting AutoDM worlds.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dm",
    about = "AutoDM — inspect narrative worlds built from quest, character and node sources",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log loader and engine activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that loads a world.
#[derive(Args)]
struct WorldArgs {
    /// World directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Directory levels searched below each source directory
    #[arg(long, default_value_t = dm_dsl::loader::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Cap on rule passes per character evaluation
    #[arg(long, default_value_t = dm_core::config::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Hour the world clock starts at
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    hour: i64,

    /// Advance a quest before querying, as NAME=VALUE (repeatable)
    #[arg(short, long = "quest", value_parser = commands::parse_quest_step)]
    quests: Vec<(String, i64)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a world and report diagnostics
    Check {
        #[command(flatten)]
        world: WorldArgs,
    },

    /// Print the generic parse tree of one source file
    Tree {
        /// Source file to parse
        file: PathBuf,

        /// Print as JSON instead of re-serialized source
        #[arg(long)]
        json: bool,
    },

    /// Describe a node and the characters currently in it
    Look {
        /// Node name
        node: String,

        #[command(flatten)]
        world: WorldArgs,
    },

    /// Show the current state of every quest line
    Quests {
        #[command(flatten)]
        world: WorldArgs,
    },

    /// Resolve a world attribute (hour, day, weekday, or a quest name)
    Attr {
        /// Attribute name
        name: String,

        #[command(flatten)]
        world: WorldArgs,
    },
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { world } => commands::check::run(&world),
        Commands::Tree { file, json } => commands::tree::run(&file, json),
        Commands::Look { node, world } => commands::look::run(&world, &node),
        Commands::Quests { world } => commands::quests::run(&world),
        Commands::Attr { name, world } => commands::attr::run(&world, &name),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
