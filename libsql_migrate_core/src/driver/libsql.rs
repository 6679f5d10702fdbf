use crate::address::{Address, Location};
use crate::driver::{Driver, SchemaState};
use crate::error::{Error, Kind, WrapMigrationError};
use ::libsql::{Builder, Connection, Database};
use async_trait::async_trait;

pub const DEFAULT_MIGRATIONS_TABLE: &str = "schema_migrations";

/// Environment variable read for the remote auth token when the address has none
pub const AUTH_TOKEN_ENV: &str = "LIBSQL_AUTH_TOKEN";

// stored in place of a version when the table is marked dirty before any version exists
const NIL_VERSION: i64 = -1;

/// Driver configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Name of the table tracking the applied version
    pub migrations_table: String,
    /// Run migration bodies as-is instead of wrapping each in a transaction
    pub no_tx_wrap: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            migrations_table: DEFAULT_MIGRATIONS_TABLE.into(),
            no_tx_wrap: false,
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn set_migrations_table<S: AsRef<str>>(self, migrations_table: S) -> Config {
        Config {
            migrations_table: migrations_table.as_ref().to_string(),
            ..self
        }
    }

    /// Set true when migrations manage their own transactions.
    /// SQLite does not nest transactions, so a migration containing `BEGIN` fails when wrapped.
    pub fn set_no_tx_wrap(self, no_tx_wrap: bool) -> Config {
        Config { no_tx_wrap, ..self }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn execution_error(query: &str, err: ::libsql::Error) -> Error {
    Error::new(
        Kind::Execution {
            query: query.into(),
            source: Box::new(err),
        },
        None,
    )
}

/// Migration driver backed by a libsql connection
pub struct LibsqlDriver {
    // kept alive for drivers opened from an address
    database: Option<Database>,
    conn: Connection,
    config: Config,
    locked: bool,
}

impl LibsqlDriver {
    /// Open the database named by a `libsql://` address.
    pub async fn open(address: &str) -> Result<LibsqlDriver, Error> {
        let address = Address::parse(address)?;

        let database = match address.location() {
            Location::File(path) => {
                log::debug!("opening local database {}", path.display());
                Builder::new_local(path).build().await
            }
            Location::Memory => Builder::new_local(":memory:").build().await,
            Location::Remote { url, auth_token } => {
                log::debug!("opening remote database {}", url);
                let auth_token = auth_token
                    .clone()
                    .or_else(|| std::env::var(AUTH_TOKEN_ENV).ok())
                    .unwrap_or_default();
                Builder::new_remote(url.clone(), auth_token).build().await
            }
        }
        .migration_err("could not open database", None)?;

        let conn = database
            .connect()
            .migration_err("could not connect to database", None)?;

        let mut config = Config::default();
        if let Some(migrations_table) = address.migrations_table() {
            config = config.set_migrations_table(migrations_table);
        }
        if let Some(no_tx_wrap) = address.no_tx_wrap() {
            config = config.set_no_tx_wrap(no_tx_wrap);
        }

        let mut driver = LibsqlDriver::with_instance(conn, config).await?;
        driver.database = Some(database);
        Ok(driver)
    }

    /// Wrap an already open connection.
    /// An empty `migrations_table` falls back to [`DEFAULT_MIGRATIONS_TABLE`].
    pub async fn with_instance(conn: Connection, mut config: Config) -> Result<LibsqlDriver, Error> {
        conn.query("SELECT 1", ())
            .await
            .migration_err("could not reach database", None)?;

        if config.migrations_table.is_empty() {
            config.migrations_table = DEFAULT_MIGRATIONS_TABLE.into();
        }

        let driver = LibsqlDriver {
            database: None,
            conn,
            config,
            locked: false,
        };
        driver.ensure_version_table().await?;
        Ok(driver)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn table(&self) -> String {
        quote_ident(&self.config.migrations_table)
    }

    async fn ensure_version_table(&self) -> Result<(), Error> {
        let query = format!(
            "CREATE TABLE IF NOT EXISTS {table} (version INTEGER, dirty INTEGER);
            CREATE UNIQUE INDEX IF NOT EXISTS {index} ON {table} (version);",
            table = self.table(),
            index = quote_ident(&format!("{}_version_unique", self.config.migrations_table)),
        );
        self.conn
            .execute_batch(&query)
            .await
            .map_err(|err| execution_error(&query, err))?;
        Ok(())
    }
}

#[async_trait]
impl Driver for LibsqlDriver {
    async fn lock(&mut self) -> Result<(), Error> {
        if self.locked {
            return Err(Kind::Locked.into());
        }
        self.locked = true;
        Ok(())
    }

    async fn unlock(&mut self) -> Result<(), Error> {
        if !self.locked {
            return Err(Kind::NotLocked.into());
        }
        self.locked = false;
        Ok(())
    }

    async fn run(&mut self, sql: &str) -> Result<(), Error> {
        if self.config.no_tx_wrap {
            self.conn
                .execute_batch(sql)
                .await
                .map_err(|err| execution_error(sql, err))?;
            return Ok(());
        }

        let transaction = self
            .conn
            .transaction()
            .await
            .migration_err("transaction start failed", None)?;
        if let Err(err) = transaction.execute_batch(sql).await {
            if let Err(rollback_err) = transaction.rollback().await {
                log::error!("failed to rollback transaction: {}", rollback_err);
            }
            return Err(execution_error(sql, err));
        }
        transaction
            .commit()
            .await
            .migration_err("failed to commit transaction", None)?;
        Ok(())
    }

    async fn set_version(&mut self, version: Option<u64>, dirty: bool) -> Result<(), Error> {
        let table = self.table();
        let transaction = self
            .conn
            .transaction()
            .await
            .migration_err("transaction start failed", None)?;

        transaction
            .execute(&format!("DELETE FROM {}", table), ())
            .await
            .migration_err("failed to clear schema version", None)?;

        // a dirty nil version is kept so a failed first down migration stays visible
        if version.is_some() || dirty {
            let version = match version {
                Some(version) => i64::try_from(version)
                    .migration_err("version does not fit in a 64 bit integer", None)?,
                None => NIL_VERSION,
            };
            transaction
                .execute(
                    &format!("INSERT INTO {} (version, dirty) VALUES (?, ?)", table),
                    [version, dirty as i64],
                )
                .await
                .migration_err("failed to record schema version", None)?;
        }

        transaction
            .commit()
            .await
            .migration_err("failed to commit transaction", None)?;
        Ok(())
    }

    async fn version(&mut self) -> Result<SchemaState, Error> {
        let query = format!("SELECT version, dirty FROM {} LIMIT 1", self.table());
        let mut rows = self
            .conn
            .query(&query, ())
            .await
            .migration_err("error getting schema version", None)?;

        match rows
            .next()
            .await
            .migration_err("error getting schema version", None)?
        {
            None => Ok(SchemaState::default()),
            Some(row) => {
                let version: i64 = row
                    .get(0)
                    .migration_err("error reading schema version", None)?;
                let dirty: i64 = row
                    .get(1)
                    .migration_err("error reading schema version", None)?;
                Ok(SchemaState {
                    version: u64::try_from(version).ok(),
                    dirty: dirty != 0,
                })
            }
        }
    }

    async fn drop_all(&mut self) -> Result<(), Error> {
        let tables = {
            let mut rows = self
                .conn
                .query(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND substr(name, 1, 7) != 'sqlite_'",
                    (),
                )
                .await
                .migration_err("error listing tables", None)?;
            let mut tables: Vec<String> = Vec::new();
            while let Some(row) = rows
                .next()
                .await
                .migration_err("error listing tables", None)?
            {
                tables.push(row.get::<String>(0).migration_err("error listing tables", None)?);
            }
            tables
        };

        if !tables.is_empty() {
            for table in tables.iter() {
                log::info!("dropping table {}", table);
                let query = format!("DROP TABLE {}", quote_ident(table));
                self.conn
                    .execute(&query, ())
                    .await
                    .map_err(|err| execution_error(&query, err))?;
            }
            self.conn
                .execute_batch("VACUUM")
                .await
                .map_err(|err| execution_error("VACUUM", err))?;
        }

        self.ensure_version_table().await
    }
}
