use crate::address::ParseBoolError;
use crate::migration::Direction;
use crate::migrator::{fmt_version, Report, Step};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error as TError;

/// An Error occurred during a migration cycle
#[derive(Debug)]
pub struct Error {
    kind: Box<Kind>,
    report: Option<Report>,
}

impl Error {
    /// Instantiate a new Error
    pub(crate) fn new(kind: Kind, report: Option<Report>) -> Error {
        Error {
            kind: Box::new(kind),
            report,
        }
    }

    /// Return the Report of the migration cycle if any
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Return the kind of error occurred
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub(crate) fn with_report(self, steps: &[Step]) -> Error {
        Error {
            report: Some(Report::new(steps.to_vec())),
            ..self
        }
    }
}

impl From<Kind> for Error {
    fn from(kind: Kind) -> Error {
        Error::new(kind, None)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

/// Enum listing possible errors from libsql-migrate.
#[derive(Debug, TError)]
pub enum Kind {
    /// An Error from an invalid file name migration
    #[error("migration file {0} must be named in the format {{version}}_{{title}}.up.{{ext}} or {{version}}_{{title}}.down.{{ext}}")]
    InvalidName(String),
    /// An Error from an invalid version on a file name migration
    #[error("migration version in {0} must be a valid unsigned integer")]
    InvalidVersion(String),
    /// An Error from two files providing the same version and direction
    #[error("duplicate {1} migration file for version {0}")]
    DuplicateMigration(u64, Direction),
    /// An Error from an invalid migrations path location
    #[error("invalid migrations path {0}, {1}")]
    InvalidMigrationPath(PathBuf, #[source] std::io::Error),
    /// An Error from an invalid migration file (not UTF-8 etc)
    #[error("invalid migration file at path {0}, {1}")]
    InvalidMigrationFile(PathBuf, #[source] std::io::Error),
    /// The migration source does not contain any migration
    #[error("no migrations found")]
    NoMigrations,
    /// An Error parsing the configuration file
    #[error("Error parsing config: {0}")]
    ConfigError(String),
    /// An Error from a database address that can't be understood
    #[error("invalid database address {0}")]
    InvalidAddress(String),
    /// An Error from a driver option that failed to parse
    #[error("{name}: {source}")]
    InvalidOption {
        name: String,
        #[source]
        source: ParseBoolError,
    },
    /// An Error from an underlying database connection Error
    #[error("`{0}`, `{1}`")]
    Connection(String, #[source] Box<dyn std::error::Error + Sync + Send>),
    /// An Error from a migration body the database rejected
    #[error("{source} in query `{query}`")]
    Execution {
        query: String,
        #[source]
        source: Box<dyn std::error::Error + Sync + Send>,
    },
    /// The driver lock is already taken
    #[error("can't acquire lock")]
    Locked,
    /// The driver lock was released without being taken
    #[error("can't unlock, as not currently locked")]
    NotLocked,
    /// A previous migration failed half way, the schema must be fixed and forced
    #[error("dirty database version {}, fix and force version", dirty_version(.0))]
    Dirty(Option<u64>),
    /// The requested or current version has no migration in the source
    #[error("no migration found for version {0}")]
    UnknownVersion(u64),
    /// Fewer migrations than requested were available
    #[error("limit {0} short")]
    ShortLimit(u64),
}

fn dirty_version(version: &Option<u64>) -> String {
    fmt_version(*version)
}

// Helper trait for adding custom messages and applied migrations to Connection error's.
pub trait WrapMigrationError<T, E> {
    fn migration_err(self, msg: &str, report: Option<&[Step]>) -> Result<T, Error>;
}

impl<T, E> WrapMigrationError<T, E> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn migration_err(self, msg: &str, applied_steps: Option<&[Step]>) -> Result<T, Error> {
        match self {
            Ok(report) => Ok(report),
            Err(err) => Err(Error {
                kind: Box::new(Kind::Connection(msg.into(), Box::new(err))),
                report: applied_steps.map(|steps| Report::new(steps.to_vec())),
            }),
        }
    }
}
