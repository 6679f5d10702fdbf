use crate::address::{Address, Location, MIGRATIONS_TABLE_OPTION, NO_TX_WRAP_OPTION, SCHEME};
use crate::error::Kind;
use crate::Error;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::form_urlencoded;

pub const DEFAULT_MIGRATIONS_PATH: &str = "./migrations";

// config file used by the cli, and by libraries preferring a file over building addresses by hand
// Config can either be instanced with [`Config::new`] or retrieved from a config file with [`Config::from_file_location`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    main: Main,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Main {
    database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    migrations_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    no_tx_wrap: Option<bool>,
}

impl Config {
    /// create a new config instance
    pub fn new(database: &str) -> Config {
        Config {
            main: Main {
                database: database.into(),
                path: None,
                migrations_table: None,
                no_tx_wrap: None,
            },
        }
    }

    /// create a new Config instance from a config file located on the file system
    pub fn from_file_location<T: AsRef<Path>>(location: T) -> Result<Config, Error> {
        let file = std::fs::read_to_string(&location).map_err(|err| {
            Error::new(
                Kind::ConfigError(format!("could not open config file, {}", err)),
                None,
            )
        })?;

        let mut config: Config = toml::from_str(&file).map_err(|err| {
            Error::new(
                Kind::ConfigError(format!("could not parse config file, {}", err)),
                None,
            )
        })?;

        let config_dir = match location.as_ref().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let config_dir = fs::canonicalize(&config_dir).map_err(|err| {
            Error::new(
                Kind::ConfigError(format!("invalid config file location, {}", err)),
                None,
            )
        })?;

        //replace relative paths with paths relative to the config file
        if let Location::File(db_path) = Address::parse(&config.main.database)?.location() {
            if db_path.is_relative() {
                let query = config
                    .main
                    .database
                    .split_once('?')
                    .map(|(_, query)| format!("?{}", query))
                    .unwrap_or_default();
                config.main.database = format!(
                    "{}file:{}{}",
                    SCHEME,
                    config_dir.join(db_path).display(),
                    query
                );
            }
        }

        if let Some(path) = config.main.path.as_ref().filter(|path| path.is_relative()) {
            config.main.path = Some(config_dir.join(path));
        }

        Ok(config)
    }

    pub fn database(&self) -> &str {
        &self.main.database
    }

    /// Directory holding the migration files
    pub fn migrations_path(&self) -> PathBuf {
        self.main
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATIONS_PATH))
    }

    pub fn migrations_table(&self) -> Option<&str> {
        self.main.migrations_table.as_deref()
    }

    pub fn no_tx_wrap(&self) -> Option<bool> {
        self.main.no_tx_wrap
    }

    /// The database address with the file options added as `x-` parameters.
    /// Options already present in the address take precedence.
    pub fn address(&self) -> Result<String, Error> {
        let address = Address::parse(&self.main.database)?;
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut extended = false;

        if let (Some(table), None) = (&self.main.migrations_table, address.migrations_table()) {
            serializer.append_pair(MIGRATIONS_TABLE_OPTION, table);
            extended = true;
        }
        if let (Some(no_tx_wrap), None) = (self.main.no_tx_wrap, address.no_tx_wrap()) {
            serializer.append_pair(NO_TX_WRAP_OPTION, &no_tx_wrap.to_string());
            extended = true;
        }

        if !extended {
            return Ok(self.main.database.clone());
        }
        let separator = if self.main.database.contains('?') {
            '&'
        } else {
            '?'
        };
        Ok(format!(
            "{}{}{}",
            self.main.database,
            separator,
            serializer.finish()
        ))
    }

    pub fn set_database(self, database: &str) -> Config {
        Config {
            main: Main {
                database: database.into(),
                ..self.main
            },
        }
    }

    pub fn set_path<P: AsRef<Path>>(self, path: P) -> Config {
        Config {
            main: Main {
                path: Some(path.as_ref().to_path_buf()),
                ..self.main
            },
        }
    }

    pub fn set_migrations_table(self, migrations_table: &str) -> Config {
        Config {
            main: Main {
                migrations_table: Some(migrations_table.into()),
                ..self.main
            },
        }
    }

    pub fn set_no_tx_wrap(self, no_tx_wrap: bool) -> Config {
        Config {
            main: Main {
                no_tx_wrap: Some(no_tx_wrap),
                ..self.main
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Kind};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn returns_config_error_from_invalid_config_location() {
        let config = Config::from_file_location("invalid_path").unwrap_err();
        match config.kind() {
            Kind::ConfigError(msg) => assert!(msg.contains("could not open config file")),
            _ => panic!("test failed"),
        }
    }

    #[test]
    fn returns_config_error_from_invalid_toml_file() {
        let config = "[<$%
                     database = \"libsql://:memory:\" \n";

        let mut config_file = tempfile::NamedTempFile::new_in(".").unwrap();
        config_file.write_all(config.as_bytes()).unwrap();
        let config = Config::from_file_location(config_file.path()).unwrap_err();
        match config.kind() {
            Kind::ConfigError(msg) => assert!(msg.contains("could not parse config file")),
            _ => panic!("test failed"),
        }
    }

    #[test]
    fn returns_config_error_from_missing_database() {
        let config = "[main] \n
                     path = \"./migrations\" \n";

        let mut config_file = tempfile::NamedTempFile::new_in(".").unwrap();
        config_file.write_all(config.as_bytes()).unwrap();
        let config = Config::from_file_location(config_file.path()).unwrap_err();
        assert!(matches!(config.kind(), Kind::ConfigError(_)));
    }

    #[test]
    fn builds_paths_relative_to_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = "[main] \n
                     database = \"libsql://file:app.db?x-no-tx-wrap=true\" \n
                     path = \"db/migrations\" \n";
        let config_path = dir.path().join("libsql-migrate.toml");
        std::fs::write(&config_path, config).unwrap();

        let config = Config::from_file_location(&config_path).unwrap();
        let dir = dir.path().canonicalize().unwrap();
        assert_eq!(
            format!("libsql://file:{}?x-no-tx-wrap=true", dir.join("app.db").display()),
            config.database()
        );
        assert_eq!(dir.join("db/migrations"), config.migrations_path());
    }

    #[test]
    fn address_appends_options_not_in_url() {
        let config = Config::new("libsql://file:/tmp/app.db")
            .set_migrations_table("my_migration_table")
            .set_no_tx_wrap(true);
        assert_eq!(
            "libsql://file:/tmp/app.db?x-migrations-table=my_migration_table&x-no-tx-wrap=true",
            config.address().unwrap()
        );

        let config = Config::new("libsql://file:/tmp/app.db?x-no-tx-wrap=false").set_no_tx_wrap(true);
        assert_eq!(
            "libsql://file:/tmp/app.db?x-no-tx-wrap=false",
            config.address().unwrap()
        );
    }

    #[test]
    fn defaults_migrations_path() {
        let config = Config::new("libsql://:memory:");
        assert_eq!(PathBuf::from("./migrations"), config.migrations_path());
        assert_eq!(None, config.migrations_table());
    }

    #[test]
    fn serializes_to_toml() {
        let config = Config::new("libsql://:memory:").set_migrations_table("history");
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, parsed);
    }
}
