//! Project discovery and structure
//!
//! A project is a directory holding `.cotizador/config.yaml`, usually next
//! to the catalog and a folder of quote payloads.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::template::{TemplateContext, TemplateGenerator};

/// Name of the project marker directory
pub const PROJECT_DIR: &str = ".cotizador";

/// Directory for quote payloads
pub const QUOTES_DIR: &str = "cotizaciones";

/// Represents a cotizador project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .cotizador/)
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
            if current.join(PROJECT_DIR).is_dir() {
                tracing::debug!(root = %current.display(), "project found");
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create the project structure and its config file
    ///
    /// Fails if `.cotizador/` already exists unless `force` is set, in which
    /// case the config is rewritten.
    pub fn init_with(
        path: &Path,
        force: bool,
        ctx: &TemplateContext,
    ) -> Result<Self, ProjectError> {
        std::fs::create_dir_all(path).map_err(|e| ProjectError::IoError(e.to_string()))?;
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let project_dir = root.join(PROJECT_DIR);
        if project_dir.exists() && !force {
            return Err(ProjectError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&project_dir)
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::create_dir_all(root.join(QUOTES_DIR))
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let generator =
            TemplateGenerator::new().map_err(|e| ProjectError::Template(e.to_string()))?;
        let config = generator
            .generate_config(ctx)
            .map_err(|e| ProjectError::Template(e.to_string()))?;
        std::fs::write(project_dir.join("config.yaml"), config)
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    pub fn init(path: &Path, force: bool) -> Result<Self, ProjectError> {
        Self::init_with(path, force, &TemplateContext::default())
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .cotizador configuration directory
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_dir().join("config.yaml")
    }

    pub fn quotes_dir(&self) -> PathBuf {
        self.root.join(QUOTES_DIR)
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a cotizador project (searched from {searched_from:?}). Run 'cotizador init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("cotizador project already exists at {0:?} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    IoError(String),
}
