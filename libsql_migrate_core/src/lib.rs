pub mod address;
pub mod config;
pub mod driver;
pub mod error;
mod migration;
mod migrator;
mod source;

pub use crate::address::Address;
pub use crate::driver::libsql::{Config as DriverConfig, LibsqlDriver, DEFAULT_MIGRATIONS_TABLE};
pub use crate::driver::{Driver, SchemaState};
pub use crate::error::Error;
pub use crate::migration::{
    is_migration_file, parse_migration_name, Direction, Migration, MIGRATION_FILE_REGEX,
};
pub use crate::migrator::{Migrator, Report, Step};
pub use crate::source::{find_migration_files, Migrations};

pub use libsql;
