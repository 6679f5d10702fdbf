//! Parsing of `libsql://` database addresses.
//!
//! An address names where the database lives and can carry driver options as
//! `x-` prefixed query parameters:
//!
//! ```text
//! libsql://file:/var/lib/app.db?x-no-tx-wrap=true&x-migrations-table=my_migrations
//! libsql://:memory:
//! libsql://my-db.turso.io?authToken=...
//! ```

use crate::error::{Error, Kind};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::form_urlencoded;

pub const SCHEME: &str = "libsql://";
pub const MIGRATIONS_TABLE_OPTION: &str = "x-migrations-table";
pub const NO_TX_WRAP_OPTION: &str = "x-no-tx-wrap";
pub const AUTH_TOKEN_PARAM: &str = "authToken";

const FILE_PREFIX: &str = "file:";
const MEMORY: &str = ":memory:";

/// Error returned when an option value is not a boolean.
///
/// Accepted values are `1`, `t`, `T`, `TRUE`, `true`, `True`, `0`, `f`, `F`,
/// `FALSE`, `false` and `False`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseBoolError {
    value: String,
}

impl fmt::Display for ParseBoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parsing {:?}: invalid syntax", self.value)
    }
}

impl std::error::Error for ParseBoolError {}

pub fn parse_bool(value: &str) -> Result<bool, ParseBoolError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ParseBoolError {
            value: value.to_string(),
        }),
    }
}

/// Where the database lives
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Memory,
    Remote {
        url: String,
        auth_token: Option<String>,
    },
}

/// A parsed `libsql://` address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    location: Location,
    migrations_table: Option<String>,
    no_tx_wrap: Option<bool>,
}

impl Address {
    pub fn parse(address: &str) -> Result<Address, Error> {
        let rest = address
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::new(Kind::InvalidAddress(address.into()), None))?;

        let (target, query) = match rest.split_once('?') {
            Some((target, query)) => (target, query),
            None => (rest, ""),
        };

        let mut migrations_table = None;
        let mut no_tx_wrap = None;
        let mut auth_token = None;
        let mut extra = Vec::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                MIGRATIONS_TABLE_OPTION => {
                    if !value.is_empty() {
                        migrations_table = Some(value.into_owned());
                    }
                }
                NO_TX_WRAP_OPTION => {
                    if !value.is_empty() {
                        let parsed = parse_bool(&value).map_err(|source| {
                            Error::new(
                                Kind::InvalidOption {
                                    name: NO_TX_WRAP_OPTION.into(),
                                    source,
                                },
                                None,
                            )
                        })?;
                        no_tx_wrap = Some(parsed);
                    }
                }
                AUTH_TOKEN_PARAM => auth_token = Some(value.into_owned()),
                key if key.starts_with("x-") => {
                    log::warn!("ignoring unknown option {} in database address", key)
                }
                key => extra.push(key.to_string()),
            }
        }

        let location = if target == MEMORY {
            Location::Memory
        } else if let Some(path) = target.strip_prefix(FILE_PREFIX) {
            if path.is_empty() {
                return Err(Error::new(Kind::InvalidAddress(address.into()), None));
            }
            Location::File(PathBuf::from(path))
        } else if target.starts_with('/') || target.starts_with("./") || target.starts_with("../")
        {
            Location::File(PathBuf::from(target))
        } else if !target.is_empty() {
            Location::Remote {
                url: format!("{}{}", SCHEME, target),
                auth_token,
            }
        } else {
            return Err(Error::new(Kind::InvalidAddress(address.into()), None));
        };

        if !matches!(location, Location::Remote { .. }) {
            for key in extra {
                log::warn!("ignoring parameter {} for local database", key);
            }
        }

        Ok(Address {
            location,
            migrations_table,
            no_tx_wrap,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Value of `x-migrations-table`, if given
    pub fn migrations_table(&self) -> Option<&str> {
        self.migrations_table.as_deref()
    }

    /// Value of `x-no-tx-wrap`, if given
    pub fn no_tx_wrap(&self) -> Option<bool> {
        self.no_tx_wrap
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Address, Error> {
        Address::parse(s)
    }
}
