pub mod libsql;

use crate::Error;
use async_trait::async_trait;

/// Version recorded in the migrations table.
///
/// `version` is `None` when no migration was ever applied. `dirty` is set while a
/// migration is running and stays set if it fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchemaState {
    pub version: Option<u64>,
    pub dirty: bool,
}

/// The operations a database must provide to be migrated.
#[async_trait]
pub trait Driver: Send {
    /// Take the exclusive migration lock. Fails with `Kind::Locked` if already held.
    async fn lock(&mut self) -> Result<(), Error>;

    /// Release the migration lock. Fails with `Kind::NotLocked` if not held.
    async fn unlock(&mut self) -> Result<(), Error>;

    /// Execute a migration body.
    async fn run(&mut self, sql: &str) -> Result<(), Error>;

    /// Replace the recorded version.
    async fn set_version(&mut self, version: Option<u64>, dirty: bool) -> Result<(), Error>;

    /// Read the recorded version.
    async fn version(&mut self) -> Result<SchemaState, Error>;

    /// Drop everything in the database.
    async fn drop_all(&mut self) -> Result<(), Error>;
}
