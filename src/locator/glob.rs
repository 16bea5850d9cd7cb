//! Directory discovery locator
//!
//! Discovers `V<version>[description].sql` artifacts in a directory at
//! construction time and loads each one as a [`SqlMigration`] on first use.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{slot_index, MigrationLocator};
use crate::database::SharedConn;
use crate::error::{MigrationError, Result};
use crate::migration::{Migration, SqlMigration, Version};

pub const DEFAULT_ARTIFACT_PREFIX: &str = "V";
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "sql";

/// Locator over versioned SQL artifacts in one directory
///
/// Artifacts are taken in filename order and must be numbered 1, 2, 3, ...
/// without gaps, so zero-padded names (`V001__create_users.sql`) are the
/// expected convention.
pub struct GlobLocator {
    conn: SharedConn,
    directory: PathBuf,
    artifacts: Vec<PathBuf>,
    instances: Vec<Option<Box<dyn Migration>>>,
}

impl GlobLocator {
    /// Discover `V*.sql` artifacts in `directory`
    pub fn new(conn: SharedConn, directory: impl AsRef<Path>) -> Result<Self> {
        Self::with_convention(
            conn,
            directory,
            DEFAULT_ARTIFACT_PREFIX,
            DEFAULT_ARTIFACT_EXTENSION,
        )
    }

    /// Discover `<prefix><version>*.<extension>` artifacts in `directory`
    pub fn with_convention(
        conn: SharedConn,
        directory: impl AsRef<Path>,
        prefix: &str,
        extension: &str,
    ) -> Result<Self> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(MigrationError::Configuration(format!(
                "Invalid migration directory [{}].",
                directory.display()
            )));
        }
        let directory = directory.canonicalize()?;

        let suffix = format!(".{}", extension);
        let mut found: Vec<(String, Version, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&directory)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(&suffix) {
                continue;
            }
            if let Some(version) = artifact_version(name, prefix)? {
                found.push((name.to_string(), version, path.clone()));
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));

        let mut artifacts = Vec::with_capacity(found.len());
        for (index, (name, version, path)) in found.into_iter().enumerate() {
            let expected = index as Version + 1;
            if version != expected {
                return Err(MigrationError::Configuration(format!(
                    "Migration artifact {} in [{}] does not match expected version {}.",
                    name,
                    directory.display(),
                    expected
                )));
            }
            artifacts.push(path);
        }

        debug!(
            "Discovered {} migration artifacts in {}",
            artifacts.len(),
            directory.display()
        );

        let instances = artifacts.iter().map(|_| None).collect();
        Ok(Self {
            conn,
            directory,
            artifacts,
            instances,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Discovered artifact paths; index `i` holds version `i + 1`
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }
}

impl MigrationLocator for GlobLocator {
    fn get(&mut self, version: Version) -> Result<&dyn Migration> {
        let index = slot_index(version, self.artifacts.len())?;
        if self.instances[index].is_none() {
            let migration =
                SqlMigration::from_file(SharedConn::clone(&self.conn), &self.artifacts[index])?;
            self.instances[index] = Some(Box::new(migration));
        }
        self.instances[index]
            .as_deref()
            .ok_or(MigrationError::NotFound(version))
    }

    fn latest_version(&self) -> Version {
        self.artifacts.len() as Version
    }
}

/// Parse the version out of `<prefix><digits>...`
///
/// Names without the prefix and digits are not artifacts. A number too large
/// for a [`Version`] is an error rather than a skipped file.
fn artifact_version(name: &str, prefix: &str) -> Result<Option<Version>> {
    let Some(rest) = name.strip_prefix(prefix) else {
        return Ok(None);
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Ok(None);
    }
    digits.parse().map(Some).map_err(|_| {
        MigrationError::Configuration(format!(
            "Migration artifact {} has an out of range version {}.",
            name, digits
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseConn;
    use std::fs;
    use tempfile::TempDir;

    fn shared() -> SharedConn {
        DatabaseConn::open_in_memory().unwrap().into_shared()
    }

    fn write_version(dir: &Path, name: &str, table: &str) {
        fs::write(
            dir.join(name),
            format!(
                "-- migrate:up\nCREATE TABLE {table} (name VARCHAR(50));\n\n-- migrate:down\nDROP TABLE {table};\n"
            ),
        )
        .unwrap();
    }

    fn version_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_version(dir.path(), "V001.sql", "v1table");
        write_version(dir.path(), "V002__second.sql", "v2table");
        write_version(dir.path(), "V003.sql", "v3table");
        fs::write(dir.path().join("README.md"), "not a migration").unwrap();
        fs::write(dir.path().join("Vnotes.sql"), "-- no version").unwrap();
        fs::create_dir(dir.path().join("V004.sql")).unwrap();
        dir
    }

    #[test]
    fn test_constructor_validates_directory() {
        let result = GlobLocator::new(shared(), "/nonexistent/sqlshift/migrations");
        match result {
            Err(MigrationError::Configuration(message)) => assert_eq!(
                message,
                "Invalid migration directory [/nonexistent/sqlshift/migrations]."
            ),
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_discovers_artifacts_in_order() {
        let dir = version_dir();
        let locator = GlobLocator::new(shared(), dir.path()).unwrap();

        assert_eq!(locator.latest_version(), 3);
        let names: Vec<_> = locator
            .artifacts()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["V001.sql", "V002__second.sql", "V003.sql"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut locator = GlobLocator::new(shared(), dir.path()).unwrap();
        assert_eq!(locator.latest_version(), 0);
        assert!(matches!(locator.get(1), Err(MigrationError::NotFound(1))));
    }

    #[test]
    fn test_rejects_version_gaps() {
        let dir = tempfile::tempdir().unwrap();
        write_version(dir.path(), "V001.sql", "v1table");
        write_version(dir.path(), "V003.sql", "v3table");

        assert!(matches!(
            GlobLocator::new(shared(), dir.path()),
            Err(MigrationError::Configuration(_))
        ));
    }

    #[test]
    fn test_get_validates_version() {
        let dir = version_dir();
        let mut locator = GlobLocator::new(shared(), dir.path()).unwrap();

        assert!(matches!(locator.get(5), Err(MigrationError::NotFound(5))));
        assert!(matches!(locator.get(0), Err(MigrationError::NotFound(0))));
    }

    #[test]
    fn test_get_returns_migration() {
        let dir = version_dir();
        let conn = shared();
        let mut locator = GlobLocator::new(SharedConn::clone(&conn), dir.path()).unwrap();

        locator.get(2).unwrap().up().unwrap();
        assert!(conn.table_exists("v2table").unwrap());

        locator.get(2).unwrap().down().unwrap();
        assert!(!conn.table_exists("v2table").unwrap());
    }

    #[test]
    fn test_get_memoizes_instances() {
        let dir = version_dir();
        let mut locator = GlobLocator::new(shared(), dir.path()).unwrap();

        let first = locator.get(1).unwrap() as *const dyn Migration as *const ();
        // a cached instance survives its artifact being removed
        fs::remove_file(dir.path().join("V001.sql")).unwrap();
        let second = locator.get(1).unwrap() as *const dyn Migration as *const ();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_artifact_fails_on_get() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("V001.sql"), "CREATE TABLE t (id INT);").unwrap();

        let mut locator = GlobLocator::new(shared(), dir.path()).unwrap();
        assert_eq!(locator.latest_version(), 1);
        assert!(matches!(
            locator.get(1),
            Err(MigrationError::Artifact { .. })
        ));
    }

    #[test]
    fn test_custom_convention() {
        let dir = tempfile::tempdir().unwrap();
        write_version(dir.path(), "m01_users.up", "users");
        write_version(dir.path(), "V001.sql", "ignored");

        let locator = GlobLocator::with_convention(shared(), dir.path(), "m", "up").unwrap();
        assert_eq!(locator.latest_version(), 1);
    }

    #[test]
    fn test_artifact_version() {
        assert_eq!(artifact_version("V001.sql", "V").unwrap(), Some(1));
        assert_eq!(artifact_version("V12__add_index.sql", "V").unwrap(), Some(12));
        assert_eq!(artifact_version("Vx.sql", "V").unwrap(), None);
        assert_eq!(artifact_version("001.sql", "V").unwrap(), None);
        assert!(matches!(
            artifact_version("V99999999999.sql", "V"),
            Err(MigrationError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_version() {
        let dir = tempfile::tempdir().unwrap();
        write_version(dir.path(), "V001.sql", "v1table");
        write_version(dir.path(), "V99999999999.sql", "huge");

        match GlobLocator::new(shared(), dir.path()) {
            Err(MigrationError::Configuration(message)) => {
                assert!(message.contains("V99999999999.sql"))
            }
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_directory_is_canonical() {
        let dir = version_dir();
        let locator = GlobLocator::new(shared(), dir.path()).unwrap();
        assert_eq!(
            locator.directory(),
            dir.path().canonicalize().unwrap().as_path()
        );
    }
}
