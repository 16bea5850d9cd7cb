//! Migration locators
//!
//! A locator resolves a version number to its migration. Two strategies are
//! provided behind the same [`MigrationLocator`] trait:
//!
//! - [`FactoryLocator`]: an ordered list of zero-argument factories
//! - [`GlobLocator`]: `V<version>*.sql` artifacts discovered in a directory
//!
//! Both cache instances for their own lifetime and reject versions outside
//! `1..=latest_version()` with [`MigrationError::NotFound`], so the migrator
//! does not care which one it is given.

mod factory;
mod glob;

pub use factory::{FactoryLocator, MigrationFactory};
pub use glob::{GlobLocator, DEFAULT_ARTIFACT_EXTENSION, DEFAULT_ARTIFACT_PREFIX};

use crate::error::{MigrationError, Result};
use crate::migration::{Migration, Version};

/// Resolves versions to migrations
pub trait MigrationLocator {
    /// Return the migration for `version`, instantiating it on first use
    ///
    /// Repeated calls with the same version return the same instance.
    fn get(&mut self, version: Version) -> Result<&dyn Migration>;

    /// Highest version this locator knows about; 0 when it knows none
    fn latest_version(&self) -> Version;
}

impl<L: MigrationLocator + ?Sized> MigrationLocator for Box<L> {
    fn get(&mut self, version: Version) -> Result<&dyn Migration> {
        (**self).get(version)
    }

    fn latest_version(&self) -> Version {
        (**self).latest_version()
    }
}

/// Map a 1-based version onto a cache slot, rejecting anything out of range
pub(crate) fn slot_index(version: Version, known: usize) -> Result<usize> {
    let index = (version as usize)
        .checked_sub(1)
        .ok_or(MigrationError::NotFound(version))?;
    if index < known {
        Ok(index)
    } else {
        Err(MigrationError::NotFound(version))
    }
}
