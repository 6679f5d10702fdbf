use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Error, Kind};

/// Regex matching migration file names: `{version}_{title}.{up|down}.{ext}`.
pub const MIGRATION_FILE_REGEX: &str = r"^([0-9]+)_(.*)\.(down|up)\.(.*)$";

fn file_match_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // safe to unwrap, the expression is a constant
    RE.get_or_init(|| Regex::new(MIGRATION_FILE_REGEX).unwrap())
}

/// Whether a migration moves the schema forward or backwards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self {
            Direction::Up => "up",
            Direction::Down => "down",
        };
        write!(f, "{}", direction)
    }
}

/// Returns true when `file_name` follows the migration naming convention.
pub fn is_migration_file(file_name: &str) -> bool {
    file_match_re().is_match(file_name)
}

/// Parse a migration file name into its version, identifier and direction.
pub fn parse_migration_name(file_name: &str) -> Result<(u64, String, Direction), Error> {
    let captures = file_match_re()
        .captures(file_name)
        .ok_or_else(|| Error::new(Kind::InvalidName(file_name.into()), None))?;

    let version = captures[1]
        .parse::<u64>()
        .map_err(|_| Error::new(Kind::InvalidVersion(file_name.into()), None))?;
    let identifier = captures[2].to_string();
    let direction = match &captures[3] {
        "up" => Direction::Up,
        "down" => Direction::Down,
        _ => unreachable!(),
    };

    Ok((version, identifier, direction))
}

/// A single migration file: the body to run for one version in one direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Migration {
    version: u64,
    identifier: String,
    direction: Direction,
    sql: String,
}

impl Migration {
    /// Create a migration from its file name, which must be named in the format
    /// `{1}_{2}.up.{3}` or `{1}_{2}.down.{3}` where `{1}` is the version, `{2}` the title
    /// and `{3}` the extension.
    pub fn from_file_name(file_name: &str, sql: &str) -> Result<Migration, Error> {
        let (version, identifier, direction) = parse_migration_name(file_name)?;
        Ok(Migration {
            version,
            identifier,
            direction,
            sql: sql.to_string(),
        })
    }

    /// Get the Migration version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get the title part of the file name
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Get the SQL body of the migration
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}/{} {}", self.version, self.direction, self.identifier)
    }
}
