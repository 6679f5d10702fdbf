/*!
SQL schema migrations for [`libsql`](https://crates.io/crates/libsql) databases.

`libsql-migrate` runs plain SQL migrations against local files, in-memory databases or
remote libsql servers, keeping track of the applied version in a migrations table.
Migrations can be loaded from a directory at runtime, embedded in your binary with
[`embed_migrations!`], or run via `libsql-migrate-cli`.

## Usage

- Migrations are pairs of files named `{1}_{2}.up.sql` and `{1}_{2}.down.sql` where `{1}` represents the
  version and `{2}` the title. Either direction may be missing.
- Databases are opened from an address such as `libsql://file:/path/to/app.db`. The options
  `x-migrations-table=<name>` and `x-no-tx-wrap=<bool>` can be given as query parameters.
- By default every migration runs inside its own transaction. Migrations that manage their own
  transactions need `x-no-tx-wrap=true`, as SQLite does not nest transactions.

### Example
```rust,no_run
use libsql_migrate::{LibsqlDriver, Migrator};

mod embedded {
    use libsql_migrate::embed_migrations;
    embed_migrations!("./tests/migrations");
}

# async fn run() -> Result<(), libsql_migrate::Error> {
let driver = LibsqlDriver::open("libsql://file:/tmp/app.db?x-migrations-table=my_migrations").await?;
let mut migrator = Migrator::new(embedded::migrations::source(), driver);
migrator.up().await?;
# Ok(())
# }
```
*/

pub use libsql_migrate_core::config;
pub use libsql_migrate_core::error;
pub use libsql_migrate_core::{
    find_migration_files, libsql, parse_migration_name, Address, Direction, Driver, DriverConfig,
    Error, LibsqlDriver, Migration, Migrations, Migrator, Report, SchemaState, Step,
    DEFAULT_MIGRATIONS_TABLE,
};
pub use libsql_migrate_macros::embed_migrations;
