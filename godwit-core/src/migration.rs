//! On-disk migration store.
//!
//! A migration is a `<version-id>-<slug>.json` file holding `{"up": [...],
//! "down": [...]}`. The version id is everything before the first hyphen
//! and orders migrations lexicographically; enumeration is sorted so
//! discovery is deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as Json;
use tracing::debug;

use crate::command::Command;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: String,
    /// The slug between the version id and the extension.
    pub name: String,
    pub up: Vec<Command>,
    pub down: Vec<Command>,
}

#[derive(Debug, Clone)]
pub struct MigrationStore {
    dir: PathBuf,
}

impl MigrationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All migrations on disk, in version order.
    pub fn list(&self) -> Result<Vec<Migration>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        paths.sort();

        let mut migrations = Vec::new();
        for path in paths {
            migrations.push(parse_migration_file(&path)?);
        }
        Ok(migrations)
    }

    /// Write a fresh migration skeleton named `<timestamp>-<name>.json`.
    pub fn create(&self, name: &str) -> Result<PathBuf> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            debug!(dir = %self.dir.display(), "created migration directory");
        }
        let version = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        let slug = name.trim().replace(char::is_whitespace, "-");
        let path = self.dir.join(format!("{version}-{slug}.json"));
        fs::write(&path, "{\n  \"up\": [],\n  \"down\": []\n}\n")?;
        Ok(path)
    }
}

fn parse_migration_file(path: &Path) -> Result<Migration> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Validation(format!("bad migration filename: {}", path.display())))?;
    let (version, name) = match stem.split_once('-') {
        Some((version, name)) => (version.to_string(), name.to_string()),
        None => (stem.to_string(), String::new()),
    };

    let text = fs::read_to_string(path)?;
    let root: Json = serde_json::from_str(&text)?;
    let map = root.as_object().ok_or_else(|| {
        Error::Validation(format!("{}: migration must be a map with up and down", path.display()))
    })?;

    let up = parse_program(map.get("up"))?;
    let down = parse_program(map.get("down"))?;
    Ok(Migration { version, name, up, down })
}

/// Parse an up/down program: a list of command maps, or a single command
/// map treated as a singleton list.
pub fn parse_program(value: Option<&Json>) -> Result<Vec<Command>> {
    match value {
        None | Some(Json::Null) => Ok(Vec::new()),
        Some(Json::Array(items)) => items.iter().map(Command::from_value).collect(),
        Some(single @ Json::Object(_)) => Ok(vec![Command::from_value(single)?]),
        Some(_) => Err(Error::Validation(
            "up/down must be a map or list of maps".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_migration(dir: &Path, filename: &str, body: &Json) {
        fs::write(dir.join(filename), serde_json::to_string_pretty(body).unwrap()).unwrap();
    }

    #[test]
    fn test_list_sorted_by_version() {
        let tmp = tempfile::tempdir().unwrap();
        let body = json!({"up": [], "down": []});
        write_migration(tmp.path(), "20240102000000-second.json", &body);
        write_migration(tmp.path(), "20240101000000-first.json", &body);

        let store = MigrationStore::new(tmp.path());
        let migrations = store.list().unwrap();
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].version, "20240101000000");
        assert_eq!(migrations[0].name, "first");
        assert_eq!(migrations[1].version, "20240102000000");
    }

    #[test]
    fn test_single_map_program() {
        let tmp = tempfile::tempdir().unwrap();
        write_migration(
            tmp.path(),
            "20240101000000-one.json",
            &json!({
                "up": {"drop-table": {"table": "foo"}},
                "down": []
            }),
        );
        let migrations = MigrationStore::new(tmp.path()).list().unwrap();
        assert_eq!(migrations[0].up.len(), 1);
        assert_eq!(migrations[0].up[0].kind(), "drop-table");
    }

    #[test]
    fn test_bad_program_shape() {
        let tmp = tempfile::tempdir().unwrap();
        write_migration(
            tmp.path(),
            "20240101000000-bad.json",
            &json!({"up": "DROP TABLE foo", "down": []}),
        );
        let err = MigrationStore::new(tmp.path()).list().unwrap_err();
        assert!(err.to_string().contains("must be a map or list of maps"));
    }

    #[test]
    fn test_unknown_command_key() {
        let tmp = tempfile::tempdir().unwrap();
        write_migration(
            tmp.path(),
            "20240101000000-bad.json",
            &json!({"up": [{"rename-table": {"table": "foo"}}], "down": []}),
        );
        let err = MigrationStore::new(tmp.path()).list().unwrap_err();
        assert!(err.to_string().contains("don't know how to process"));
    }

    #[test]
    fn test_create_skeleton() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MigrationStore::new(tmp.path().join("migrations"));
        let path = store.create("add users table").unwrap();
        assert!(path.exists());
        let filename = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(filename.ends_with("-add-users-table.json"));
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].up.is_empty());
        assert!(listed[0].down.is_empty());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let store = MigrationStore::new("/nonexistent/godwit-migrations");
        assert!(store.list().unwrap().is_empty());
    }
}
