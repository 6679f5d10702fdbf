//! Defines the CLI application

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[clap(version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Config file location
    #[clap(short, long, global = true, default_value = "./libsql-migrate.toml")]
    pub config: PathBuf,

    /// Database address, overrides the one in the config file
    #[clap(short, long, global = true)]
    pub database: Option<String>,

    /// Migrations directory path, overrides the one in the config file
    #[clap(short, long, global = true)]
    pub path: Option<PathBuf>,

    /// Set migration table name
    #[clap(long, global = true)]
    pub table_name: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(flatten)]
    Database(DbCommand),

    /// Create a set of timestamped up/down migrations titled NAME
    Create(CreateArgs),
}

/// Commands run against the database
#[derive(Subcommand)]
pub enum DbCommand {
    /// Apply all or N up migrations
    Up {
        /// Number of migrations to apply
        count: Option<u64>,
    },

    /// Revert N down migrations, one when N is omitted, or all of them with --all
    Down(DownArgs),

    /// Migrate up or down to the given version
    Goto {
        #[clap(value_name = "VERSION")]
        target: u64,
    },

    /// Set the version without running migrations, -1 resets it to no version
    Force {
        #[clap(value_name = "VERSION", allow_negative_numbers = true)]
        target: i64,
    },

    /// Print the current migration version
    Version,

    /// Drop everything inside the database
    Drop {
        /// Do not ask for confirmation
        #[clap(short, long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct DownArgs {
    /// Number of migrations to revert, defaults to 1
    #[clap(conflicts_with = "all")]
    pub count: Option<u64>,

    /// Revert every migration
    #[clap(short, long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CreateArgs {
    pub name: String,

    /// File extension
    #[clap(long, default_value = "sql")]
    pub ext: String,

    /// Use sequential numbers instead of timestamps
    #[clap(long)]
    pub seq: bool,

    /// Number of digits of sequential versions
    #[clap(long, default_value_t = 6)]
    pub digits: usize,
}
