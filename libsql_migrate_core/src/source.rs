use crate::error::{Error, Kind};
use crate::migration::{is_migration_file, Direction, Migration};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// find migration files on file system recursively across directories given a location
pub fn find_migration_files(
    location: impl AsRef<Path>,
) -> Result<impl Iterator<Item = PathBuf>, Error> {
    let location: &Path = location.as_ref();
    let location = location.canonicalize().map_err(|err| {
        Error::new(
            Kind::InvalidMigrationPath(location.to_path_buf(), err),
            None,
        )
    })?;

    let file_paths = WalkDir::new(location)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|entry| match entry.file_name().and_then(OsStr::to_str) {
            Some(file_name) if is_migration_file(file_name) => true,
            Some(file_name) => {
                log::warn!(
                    "File \"{}\" does not adhere to the migration naming convention. Migrations must be named in the format {{1}}_{{2}}.up.{{3}} or {{1}}_{{2}}.down.{{3}}, where {{1}} represents the migration version, {{2}} the title and {{3}} the extension.",
                    file_name
                );
                false
            }
            None => false,
        });

    Ok(file_paths)
}

#[derive(Clone, Debug, Default)]
struct Pair {
    up: Option<Migration>,
    down: Option<Migration>,
}

/// Ordered collection of migrations, indexed by version.
///
/// Every version holds an optional up and an optional down migration. A missing
/// direction is valid: moving across such a version only updates the schema version.
#[derive(Clone, Debug, Default)]
pub struct Migrations {
    versions: BTreeMap<u64, Pair>,
}

impl Migrations {
    pub fn new() -> Migrations {
        Migrations::default()
    }

    /// Load every migration file found under `location`.
    pub fn from_dir(location: impl AsRef<Path>) -> Result<Migrations, Error> {
        let mut migrations = Migrations::new();
        for path in find_migration_files(location)? {
            let sql = std::fs::read_to_string(&path)
                .map_err(|err| Error::new(Kind::InvalidMigrationFile(path.clone(), err), None))?;

            // safe to unwrap, find_migration_files only returns utf-8 file names
            let file_name = path.file_name().and_then(OsStr::to_str).unwrap();
            log::debug!("found migration file {}", path.display());
            migrations.insert(Migration::from_file_name(file_name, &sql)?)?;
        }
        Ok(migrations)
    }

    /// Build the collection from `(file_name, sql)` pairs, as produced by `embed_migrations!`.
    pub fn from_embedded(files: &[(&str, &str)]) -> Result<Migrations, Error> {
        let mut migrations = Migrations::new();
        for (file_name, sql) in files {
            migrations.insert(Migration::from_file_name(file_name, sql)?)?;
        }
        Ok(migrations)
    }

    /// Add a migration, failing if its version already has a file for the same direction.
    pub fn insert(&mut self, migration: Migration) -> Result<(), Error> {
        let version = migration.version();
        let direction = migration.direction();
        let pair = self.versions.entry(version).or_default();
        let slot = match direction {
            Direction::Up => &mut pair.up,
            Direction::Down => &mut pair.down,
        };
        if slot.is_some() {
            return Err(Error::new(
                Kind::DuplicateMigration(version, direction),
                None,
            ));
        }
        *slot = Some(migration);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// All known versions in ascending order
    pub fn versions(&self) -> impl Iterator<Item = u64> + '_ {
        self.versions.keys().copied()
    }

    pub fn contains(&self, version: u64) -> bool {
        self.versions.contains_key(&version)
    }

    pub fn first(&self) -> Option<u64> {
        self.versions.keys().next().copied()
    }

    pub fn last(&self) -> Option<u64> {
        self.versions.keys().next_back().copied()
    }

    /// The version immediately before `version`
    pub fn prev(&self, version: u64) -> Option<u64> {
        self.versions
            .range(..version)
            .next_back()
            .map(|(version, _)| *version)
    }

    /// The version immediately after `version`
    pub fn next(&self, version: u64) -> Option<u64> {
        self.versions
            .range((Bound::Excluded(version), Bound::Unbounded))
            .next()
            .map(|(version, _)| *version)
    }

    pub fn read_up(&self, version: u64) -> Option<&Migration> {
        self.versions.get(&version).and_then(|pair| pair.up.as_ref())
    }

    pub fn read_down(&self, version: u64) -> Option<&Migration> {
        self.versions
            .get(&version)
            .and_then(|pair| pair.down.as_ref())
    }
}
