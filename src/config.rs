use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;

use crate::database::{VersionTable, DEFAULT_VERSION_COLUMN, DEFAULT_VERSION_TABLE};

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sqlshift.toml";

pub struct SqlshiftConfig {
    /// Path to the SQLite database to migrate
    pub database_path: String,

    /// Directory holding the `V<version>*.sql` artifacts
    pub migrations_dir: String,

    /// Table holding the current version
    pub version_table: String,

    /// Column holding the current version
    pub version_column: String,
}

const EMPTY_CONFIG: &str = r#"### sqlshift configuration file

### SQLite database to migrate
# database_path = "sqlshift.sqlite3"

### directory holding V<version>.sql migration files
# migrations_dir = "migrations"

### version record location
# version_table = "schema_migration"
# version_column = "version"
"#;

impl Default for SqlshiftConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlshift.sqlite3".to_string(),
            migrations_dir: "migrations".to_string(),
            version_table: DEFAULT_VERSION_TABLE.to_string(),
            version_column: DEFAULT_VERSION_COLUMN.to_string(),
        }
    }
}

impl SqlshiftConfig {
    /// Load configuration from a TOML file and `SQLSHIFT_*` environment variables
    ///
    /// With no explicit path, `sqlshift.toml` in the working directory is used
    /// if present. An explicit path that does not exist is created from a
    /// commented template.
    pub fn new(path: &Option<String>) -> Result<SqlshiftConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    builder = builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE));
                }
            }
        }

        // E.g., `SQLSHIFT_DATABASE_PATH=app.db sqlshift migrate` overrides the database
        builder = builder.add_source(config::Environment::with_prefix("SQLSHIFT"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config)
    }

    fn from_map(config: &HashMap<String, String>) -> Result<SqlshiftConfig> {
        let defaults = SqlshiftConfig::default();
        let get = |key: &str, default: String| config.get(key).cloned().unwrap_or(default);

        let loaded = SqlshiftConfig {
            database_path: expand_home(&get("database_path", defaults.database_path))?,
            migrations_dir: expand_home(&get("migrations_dir", defaults.migrations_dir))?,
            version_table: get("version_table", defaults.version_table),
            version_column: get("version_column", defaults.version_column),
        };

        // reject bad identifiers before any database is opened
        loaded.version_table()?;
        Ok(loaded)
    }

    /// Version record location described by this configuration
    pub fn version_table(&self) -> Result<VersionTable> {
        VersionTable::new(&self.version_table, &self.version_column)
            .map_err(|e| anyhow!("Invalid version table configuration: {}", e))
    }

    /// Commented configuration template, as written for a missing config file
    pub fn template() -> &'static str {
        EMPTY_CONFIG
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Database Path:      {}", self.database_path),
            format!("Migrations Dir:     {}", self.migrations_dir),
            format!(
                "Version Record:     {}.{}",
                self.version_table, self.version_column
            ),
        ];

        if !Path::new(&self.migrations_dir).is_dir() {
            lines.push("Migrations Dir is missing".to_string());
        }

        lines.join("\n")
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> Result<String> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
            let home_str = home
                .to_str()
                .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?;
            Ok(format!("{}/{}", home_str.trim_end_matches('/'), rest))
        }
        None => Ok(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = SqlshiftConfig::from_map(&HashMap::new()).unwrap();
        assert_eq!(config.database_path, "sqlshift.sqlite3");
        assert_eq!(config.migrations_dir, "migrations");
        assert_eq!(config.version_table, "schema_migration");
        assert_eq!(config.version_column, "version");
    }

    #[test]
    fn test_overrides() {
        let config = SqlshiftConfig::from_map(&map(&[
            ("database_path", "/tmp/app.db"),
            ("version_table", "app_meta"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, "/tmp/app.db");
        assert_eq!(config.version_table().unwrap().table(), "app_meta");
    }

    #[test]
    fn test_rejects_invalid_version_table() {
        let result = SqlshiftConfig::from_map(&map(&[("version_column", "bad name")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path").unwrap(), "/abs/path");
        assert_eq!(expand_home("relative").unwrap(), "relative");
        if let Some(home) = dirs::home_dir() {
            let expanded = expand_home("~/db.sqlite3").unwrap();
            assert!(expanded.starts_with(home.to_str().unwrap().trim_end_matches('/')));
            assert!(expanded.ends_with("/db.sqlite3"));
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "database_path = \"/var/lib/app.db\"\nmigrations_dir = \"db/migrations\"\n",
        )
        .unwrap();

        let config = SqlshiftConfig::new(&Some(path.to_str().unwrap().to_string())).unwrap();
        assert_eq!(config.database_path, "/var/lib/app.db");
        assert_eq!(config.migrations_dir, "db/migrations");
    }

    #[test]
    fn test_missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.toml");

        let config = SqlshiftConfig::new(&Some(path.to_str().unwrap().to_string())).unwrap();
        assert!(path.exists());
        assert_eq!(config.migrations_dir, "migrations");
    }
}
