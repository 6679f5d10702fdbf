use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use libsql_migrate_core::{config::DEFAULT_MIGRATIONS_PATH, Migrations};
use time::{macros::format_description, OffsetDateTime};

use crate::cli::{CreateArgs, GlobalArgs};

pub fn handle_create_command(global: &GlobalArgs, args: CreateArgs) -> anyhow::Result<()> {
    let dir = migrations_dir(global)?;
    let name = sanitize_name(&args.name);
    if name.is_empty() {
        bail!("migration name {:?} has no usable characters", args.name);
    }
    let ext = args.ext.trim_start_matches('.');

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create migrations directory at {}", dir.display()))?;

    let version = if args.seq {
        next_sequence(&dir, args.digits)?
    } else {
        timestamp()?
    };

    for direction in ["up", "down"] {
        let path = dir.join(format!("{}_{}.{}.{}", version, name, direction, ext));
        create_migration_file(&path)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn migrations_dir(global: &GlobalArgs) -> anyhow::Result<PathBuf> {
    if let Some(path) = &global.path {
        return Ok(path.clone());
    }
    if global.config.exists() {
        return Ok(crate::migrate::config(global)?.migrations_path());
    }
    Ok(PathBuf::from(DEFAULT_MIGRATIONS_PATH))
}

fn timestamp() -> anyhow::Result<String> {
    let format = format_description!("[year][month][day][hour][minute][second]");
    OffsetDateTime::now_utc()
        .format(&format)
        .context("could not format the migration timestamp")
}

fn next_sequence(dir: &Path, digits: usize) -> anyhow::Result<String> {
    let migrations = Migrations::from_dir(dir)?;
    let next = migrations.last().map_or(1, |last| last + 1);
    let version = format!("{:0width$}", next, width = digits);
    if version.len() > digits {
        bail!(
            "next sequence number {} does not fit in {} digits",
            next,
            digits
        );
    }
    Ok(version)
}

fn sanitize_name(name: &str) -> String {
    let lowercase = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>()
        .to_lowercase();

    let mut result = String::with_capacity(lowercase.len());
    let mut last_was_underscore = false;
    for c in lowercase.chars() {
        if c != '_' || !last_was_underscore {
            result.push(c);
        }
        last_was_underscore = c == '_';
    }

    result.trim_matches('_').to_string()
}

fn create_migration_file(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        bail!("Migration file already exists at {}", path.display());
    }
    fs::write(path, "")
        .with_context(|| format!("Failed to create migration file at {}", path.display()))
}
