use std::io::{self, Write};

use anyhow::{bail, Context};
use libsql_migrate_core::{
    config::Config, LibsqlDriver, Migrations, Migrator, Report, SchemaState,
};
use tokio::runtime::Builder;

use crate::cli::{DbCommand, DownArgs, GlobalArgs};

pub fn handle_migration_command(global: &GlobalArgs, command: DbCommand) -> anyhow::Result<()> {
    let config = config(global)?;

    if let DbCommand::Drop { force: false } = command {
        if !confirm_drop()? {
            log::info!("aborted dropping the database");
            return Ok(());
        }
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Can't start tokio runtime")?;

    runtime.block_on(run(&config, command))
}

/// Loads the config file when present and applies the command line overrides on top of it
pub fn config(global: &GlobalArgs) -> anyhow::Result<Config> {
    let mut config = match (&global.database, global.config.exists()) {
        (Some(database), false) => Config::new(database),
        (database, _) => {
            let config = Config::from_file_location(&global.config).with_context(|| {
                format!(
                    "could not parse the config file {}",
                    global.config.display()
                )
            })?;
            match database {
                Some(database) => config.set_database(database),
                None => config,
            }
        }
    };

    if let Some(path) = &global.path {
        config = config.set_path(path);
    }
    if let Some(table_name) = &global.table_name {
        config = config.set_migrations_table(table_name);
    }
    Ok(config)
}

async fn run(config: &Config, command: DbCommand) -> anyhow::Result<()> {
    // only moving commands read the migration files
    let migrations = match command {
        DbCommand::Up { .. } | DbCommand::Down(_) | DbCommand::Goto { .. } => {
            let migrations_path = config.migrations_path();
            Migrations::from_dir(&migrations_path).with_context(|| {
                format!(
                    "could not read migrations from {}",
                    migrations_path.display()
                )
            })?
        }
        DbCommand::Force { .. } | DbCommand::Version | DbCommand::Drop { .. } => Migrations::new(),
    };

    let address = config.address()?;
    let driver = LibsqlDriver::open(&address)
        .await
        .with_context(|| format!("could not open database {}", config.database()))?;
    let mut migrator = Migrator::new(migrations, driver);

    match command {
        DbCommand::Up { count: None } => print_report(migrator.up().await?),
        DbCommand::Up { count: Some(count) } => {
            print_report(migrator.steps(signed(count)?).await?)
        }
        DbCommand::Down(DownArgs { count: None, all }) => {
            if !all {
                print_report(migrator.steps(-1).await?)
            } else {
                print_report(migrator.down().await?)
            }
        }
        DbCommand::Down(DownArgs {
            count: Some(count), ..
        }) => print_report(migrator.steps(-signed(count)?).await?),
        DbCommand::Goto { target } => print_report(migrator.goto(target).await?),
        DbCommand::Force { target } => {
            let version = match target {
                -1 => None,
                target if target < -1 => bail!("version must be -1 or greater, got {}", target),
                target => Some(target.unsigned_abs()),
            };
            migrator.force(version).await?;
        }
        DbCommand::Version => match fmt_state(migrator.version().await?) {
            Some(state) => println!("{}", state),
            None => bail!("no migration has been applied"),
        },
        DbCommand::Drop { .. } => {
            migrator.drop_all().await?;
            log::info!("dropped everything in {}", config.database());
        }
    }
    Ok(())
}

// None when the database has never been migrated
fn fmt_state(state: SchemaState) -> Option<String> {
    match (state.version, state.dirty) {
        (Some(version), false) => Some(version.to_string()),
        (Some(version), true) => Some(format!("{} (dirty)", version)),
        (None, true) => Some("nil (dirty)".into()),
        (None, false) => None,
    }
}

fn signed(count: u64) -> anyhow::Result<i64> {
    i64::try_from(count).with_context(|| format!("{} is too many steps", count))
}

fn print_report(report: Report) {
    for step in report.steps() {
        println!("{}", step);
    }
}

fn confirm_drop() -> anyhow::Result<bool> {
    print!("Are you sure you want to drop the entire database schema? [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
