//! Static factory locator

use tracing::debug;

use super::{slot_index, MigrationLocator};
use crate::error::Result;
use crate::migration::{Migration, Version};

/// Zero-argument constructor for one migration
pub type MigrationFactory = Box<dyn Fn() -> Box<dyn Migration>>;

/// Locator backed by an ordered list of factories
///
/// The factory at index `i` produces the migration for version `i + 1`.
///
/// ```rust
/// use sqlshift::database::{DatabaseConn, SharedConn};
/// use sqlshift::{FactoryLocator, Migration, MigrationLocator, SqlMigration};
///
/// let conn = DatabaseConn::open_in_memory()?.into_shared();
/// let c = SharedConn::clone(&conn);
/// let locator = FactoryLocator::new().with(move || {
///     Box::new(SqlMigration::new(
///         SharedConn::clone(&c),
///         "CREATE TABLE users (id INTEGER);",
///         "DROP TABLE users;",
///     )) as Box<dyn Migration>
/// });
/// assert_eq!(locator.latest_version(), 1);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Default)]
pub struct FactoryLocator {
    factories: Vec<MigrationFactory>,
    instances: Vec<Option<Box<dyn Migration>>>,
}

impl FactoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a locator from an already ordered list of factories
    pub fn from_factories(factories: Vec<MigrationFactory>) -> Self {
        let instances = factories.iter().map(|_| None).collect();
        Self {
            factories,
            instances,
        }
    }

    /// Append the factory for the next version
    pub fn push<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Migration> + 'static,
    {
        self.factories.push(Box::new(factory));
        self.instances.push(None);
    }

    /// Builder form of [`push`](Self::push)
    pub fn with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Migration> + 'static,
    {
        self.push(factory);
        self
    }
}

impl MigrationLocator for FactoryLocator {
    fn get(&mut self, version: Version) -> Result<&dyn Migration> {
        let index = slot_index(version, self.factories.len())?;
        let factories = &self.factories;
        let migration = self.instances[index].get_or_insert_with(|| {
            debug!("Instantiating migration {}", version);
            (factories[index])()
        });
        Ok(&**migration)
    }

    fn latest_version(&self) -> Version {
        self.factories.len() as Version
    }
}
