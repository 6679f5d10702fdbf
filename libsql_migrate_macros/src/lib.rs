//! Contains libsql-migrate macros
//!
//! used to embed migration files
extern crate proc_macro;

use libsql_migrate_core::{find_migration_files, Migrations};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use quote::ToTokens;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use syn::{parse_macro_input, LitStr};

fn crate_root() -> PathBuf {
    let crate_root = env::var("CARGO_MANIFEST_DIR")
        .expect("CARGO_MANIFEST_DIR environment variable not present");
    PathBuf::from(crate_root)
}

fn migration_fn_quoted<T: ToTokens>(_migrations: Vec<T>) -> TokenStream2 {
    let result = quote! {
        use libsql_migrate::Migrations;
        pub fn source() -> Migrations {
            let files: &[(&str, &str)] = &[#(#_migrations),*];
            Migrations::from_embedded(files).unwrap()
        }
    };
    result
}

/// embeds migration files and inserts a function called `source` that when called returns the
/// [Migrations](../libsql_migrate/struct.Migrations.html) collected from them
///
/// when called without arguments `embed_migrations` searches for migration files on a directory called `migrations` at the root level of your crate.
/// if you want to specify another directory call `embed_migrations` with its location relative to the root level of your crate.
///
/// To be a valid migration file, it has to be named in the format `{1}_{2}.up.{3}` or `{1}_{2}.down.{3}` where `{1}` represents
/// the migration version, `{2}` the title and `{3}` the extension.
/// Names are checked while compiling, so a malformed or duplicated migration fails the build.
#[proc_macro]
pub fn embed_migrations(input: TokenStream) -> TokenStream {
    let location = if input.is_empty() {
        crate_root().join("migrations")
    } else {
        let location: LitStr = parse_macro_input!(input);
        crate_root().join(location.value())
    };

    let migration_file_paths: Vec<PathBuf> = find_migration_files(&location)
        .expect("error getting migration files")
        .collect();

    let mut _migrations = Vec::new();
    let mut files = Vec::new();
    for path in migration_file_paths.iter() {
        let sql = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("could not read migration {} content", path.display()));
        //safe to call unwrap as find_migration_files only returns file paths
        let filename = Path::new(path)
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap()
            .to_string();
        let path = path.display().to_string();
        _migrations.push(quote! {(#filename, include_str!(#path))});
        files.push((filename, sql));
    }

    let files: Vec<(&str, &str)> = files
        .iter()
        .map(|(name, sql)| (name.as_str(), sql.as_str()))
        .collect();
    if let Err(err) = Migrations::from_embedded(&files) {
        panic!("invalid migrations in {}: {}", location.display(), err);
    }

    let fnq = migration_fn_quoted(_migrations);
    (quote! {
        pub mod migrations {
            #fnq
        }
    })
    .into()
}
