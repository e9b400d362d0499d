//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the directory that marks a cellar project
const CELLAR_DIR: &str = ".cellar";

/// Represents a cellar project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .cellar/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(CELLAR_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Use `--project` if given, otherwise discover from the current directory
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ProjectError> {
        match explicit {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(CELLAR_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_skeleton(root)
    }

    /// Re-create config even if .cellar/ exists; the database is left intact
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_skeleton(root)
    }

    fn write_skeleton(root: PathBuf) -> Result<Self, ProjectError> {
        let cellar_dir = root.join(CELLAR_DIR);
        std::fs::create_dir_all(&cellar_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(cellar_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Cellar Project Configuration

# Ounces in one standard tin, used when syncing quantities from tins
# oz_per_tin: 1.75

# Grams in one standard tin
# grams_per_tin: 50

# Default date format for imports
# (MM/YY, YY/MM, MM/DD/YY, DD/MM/YY, YY/MM/DD, "Month D, YYYY", "D Month, YYYY")
# date_format: MM/DD/YY

# Default output format (auto, tsv, csv, json, md, id)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .cellar directory path
    pub fn cellar_dir(&self) -> PathBuf {
        self.root.join(CELLAR_DIR)
    }

    /// Path of the project database
    pub fn database_path(&self) -> PathBuf {
        self.cellar_dir().join("cellar.db")
    }

    /// Path of the project configuration file
    pub fn config_path(&self) -> PathBuf {
        self.cellar_dir().join("config.yaml")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a cellar project (searched from {searched_from:?}). Run 'cellar init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("cellar project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.cellar_dir().is_dir());
        assert!(project.config_path().exists());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_init_force_keeps_existing_dir() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        std::fs::write(project.database_path(), b"").unwrap();

        let again = Project::init_force(tmp.path()).unwrap();
        assert!(again.database_path().exists());
    }

    #[test]
    fn test_project_discover_finds_cellar_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_cellar_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}
