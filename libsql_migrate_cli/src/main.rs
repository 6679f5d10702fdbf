//! Main entry point for the libsql-migrate cli tool

mod cli;
mod create;
mod migrate;

use anyhow::Error;
use clap::Parser;
use env_logger::{Builder, Target};
use log::LevelFilter;

use cli::{Cli, Command};

fn main() -> Result<(), Error> {
    human_panic::setup_panic!();

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Cli::parse();
    match args.command {
        Command::Create(create_args) => create::handle_create_command(&args.global, create_args)?,
        Command::Database(command) => migrate::handle_migration_command(&args.global, command)?,
    }
    Ok(())
}
