use crate::driver::{Driver, SchemaState};
use crate::error::{Error, Kind};
use crate::migration::Direction;
use crate::source::Migrations;
use std::fmt;

/// One version change performed during a migration cycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    version: u64,
    direction: Direction,
    identifier: String,
    target: Option<u64>,
}

impl Step {
    /// Version of the migration that was run
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Title of the migration file, empty when the version had no file for this direction
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Schema version recorded after the step
    pub fn target(&self) -> Option<u64> {
        self.target
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.version, self.direction, self.identifier)
    }
}

/// Struct that represents the report of the migration cycle.
/// A `Report` is returned by the moving operations of [`Migrator`].
/// If there is an [`Error`] during a migration, you can access the `Report`
/// with the steps applied before the failure through [`Error::report`].
#[derive(Clone, Debug, Default)]
pub struct Report {
    steps: Vec<Step>,
}

impl Report {
    /// Instantiate a new Report
    pub(crate) fn new(steps: Vec<Step>) -> Report {
        Report { steps }
    }

    /// Retrieves the list of steps applied in the migration cycle
    pub fn steps(&self) -> &Vec<Step> {
        &self.steps
    }

    /// True when nothing was applied
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Struct that represents the entrypoint to run migrations: a set of
/// [`Migrations`] applied through a [`Driver`].
///
/// Every moving operation takes the driver lock for its duration and
/// records each version change in two writes: the target version marked
/// dirty, then the migration body, then the target version clean. A failing
/// body leaves the database dirty, and further moves are refused until the
/// version is forced.
pub struct Migrator<D> {
    migrations: Migrations,
    driver: D,
}

impl<D> Migrator<D>
where
    D: Driver,
{
    pub fn new(migrations: Migrations, driver: D) -> Migrator<D> {
        Migrator { migrations, driver }
    }

    /// Get the gathered migrations.
    pub fn migrations(&self) -> &Migrations {
        &self.migrations
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Apply every pending up migration
    pub async fn up(&mut self) -> Result<Report, Error> {
        self.driver.lock().await?;
        let result = self.move_up(None).await;
        self.release(result).await
    }

    /// Apply every down migration, leaving the database without a version
    pub async fn down(&mut self) -> Result<Report, Error> {
        self.driver.lock().await?;
        let result = self.move_down(None).await;
        self.release(result).await
    }

    /// Move `n` versions up when positive or down when negative.
    /// When fewer versions are available, those are applied and `Kind::ShortLimit`
    /// is returned with the number of missing steps.
    pub async fn steps(&mut self, n: i64) -> Result<Report, Error> {
        self.driver.lock().await?;
        let result = if n >= 0 {
            self.move_up(Some(n.unsigned_abs())).await
        } else {
            self.move_down(Some(n.unsigned_abs())).await
        };
        self.release(result).await
    }

    /// Move up or down until `version` is reached. `version` must exist in the migrations.
    pub async fn goto(&mut self, version: u64) -> Result<Report, Error> {
        self.driver.lock().await?;
        let result = self.move_to(version).await;
        self.release(result).await
    }

    /// Record `version` as current and clean without running any migration.
    /// `None` resets the database to no version.
    pub async fn force(&mut self, version: Option<u64>) -> Result<(), Error> {
        self.driver.lock().await?;
        log::info!("forcing version {}", fmt_version(version));
        let result = self.driver.set_version(version, false).await;
        self.release(result).await
    }

    /// Queries the database for the current version
    pub async fn version(&mut self) -> Result<SchemaState, Error> {
        self.driver.version().await
    }

    /// Drop everything in the database
    pub async fn drop_all(&mut self) -> Result<(), Error> {
        self.driver.lock().await?;
        let result = self.driver.drop_all().await;
        self.release(result).await
    }

    async fn release<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        let unlocked = self.driver.unlock().await;
        match (result, unlocked) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(unlock_err)) => {
                log::error!("failed to release migration lock: {}", unlock_err);
                Err(err)
            }
        }
    }

    // current clean version, verified against the known migrations
    async fn current_version(&mut self) -> Result<Option<u64>, Error> {
        if self.migrations.is_empty() {
            return Err(Kind::NoMigrations.into());
        }

        let state = self.driver.version().await?;
        if state.dirty {
            return Err(Kind::Dirty(state.version).into());
        }
        match state.version {
            Some(version) if !self.migrations.contains(version) => {
                Err(Kind::UnknownVersion(version).into())
            }
            version => {
                log::info!("current version: {}", fmt_version(version));
                Ok(version)
            }
        }
    }

    async fn move_up(&mut self, limit: Option<u64>) -> Result<Report, Error> {
        let mut current = self.current_version().await?;
        let mut steps = Vec::new();

        while limit.map_or(true, |limit| (steps.len() as u64) < limit) {
            let next = match current {
                None => self.migrations.first(),
                Some(version) => self.migrations.next(version),
            };
            let Some(next) = next else {
                break;
            };
            let step = self
                .apply(next, Direction::Up, Some(next))
                .await
                .map_err(|err| err.with_report(&steps))?;
            steps.push(step);
            current = Some(next);
        }

        finish(steps, limit)
    }

    async fn move_down(&mut self, limit: Option<u64>) -> Result<Report, Error> {
        let mut current = self.current_version().await?;
        let mut steps = Vec::new();

        while limit.map_or(true, |limit| (steps.len() as u64) < limit) {
            let Some(version) = current else {
                break;
            };
            let prev = self.migrations.prev(version);
            let step = self
                .apply(version, Direction::Down, prev)
                .await
                .map_err(|err| err.with_report(&steps))?;
            steps.push(step);
            current = prev;
        }

        finish(steps, limit)
    }

    async fn move_to(&mut self, target: u64) -> Result<Report, Error> {
        if !self.migrations.contains(target) {
            return Err(Kind::UnknownVersion(target).into());
        }

        let mut current = self.current_version().await?;
        let mut steps = Vec::new();

        loop {
            let step = match current {
                Some(version) if version == target => break,
                Some(version) if version > target => {
                    let prev = self.migrations.prev(version);
                    let step = self.apply(version, Direction::Down, prev).await;
                    current = prev;
                    step
                }
                _ => {
                    // target is known and above current, so a next version exists
                    let Some(next) = current
                        .map_or_else(|| self.migrations.first(), |v| self.migrations.next(v))
                    else {
                        break;
                    };
                    current = Some(next);
                    self.apply(next, Direction::Up, Some(next)).await
                }
            };
            let step = step.map_err(|err| err.with_report(&steps))?;
            steps.push(step);
        }

        finish(steps, None)
    }

    async fn apply(
        &mut self,
        version: u64,
        direction: Direction,
        target: Option<u64>,
    ) -> Result<Step, Error> {
        let migration = match direction {
            Direction::Up => self.migrations.read_up(version),
            Direction::Down => self.migrations.read_down(version),
        };
        let identifier = migration
            .map(|migration| migration.identifier().to_string())
            .unwrap_or_default();

        log::info!("applying migration: {}/{} {}", version, direction, identifier);

        self.driver.set_version(target, true).await?;
        match migration {
            Some(migration) if !migration.sql().trim().is_empty() => {
                self.driver.run(migration.sql()).await?;
            }
            Some(_) => log::debug!("migration {}/{} is empty", version, direction),
            None => log::debug!(
                "no {} migration for version {}, only updating the version",
                direction,
                version
            ),
        }
        self.driver.set_version(target, false).await?;

        Ok(Step {
            version,
            direction,
            identifier,
            target,
        })
    }
}

fn finish(steps: Vec<Step>, limit: Option<u64>) -> Result<Report, Error> {
    if steps.is_empty() && limit.is_none() {
        log::info!("no change");
    }
    if let Some(limit) = limit {
        let applied = steps.len() as u64;
        if applied < limit {
            return Err(Error::new(
                Kind::ShortLimit(limit - applied),
                Some(Report::new(steps)),
            ));
        }
    }
    Ok(Report::new(steps))
}

pub(crate) fn fmt_version(version: Option<u64>) -> String {
    match version {
        Some(version) => version.to_string(),
        None => "nil".into(),
    }
}
