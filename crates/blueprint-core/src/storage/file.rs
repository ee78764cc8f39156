//! JSON-file project service for native platforms.

use super::{BoxFuture, ProjectError, ProjectPayload, ProjectResult, ProjectService, SaveRequest};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each project as `<id>.json` in a directory.
pub struct FileProjectService {
    base_path: PathBuf,
}

impl FileProjectService {
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> ProjectResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                ProjectError::Io(format!("Failed to create project directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Project directory under the user's local data dir
    /// (`~/.local/share/blueprint/projects` on Linux).
    pub fn default_location() -> ProjectResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| ProjectError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("blueprint").join("projects"))
    }

    fn project_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Ids of every stored project.
    pub fn list(&self) -> ProjectResult<Vec<String>> {
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| ProjectError::Io(format!("Failed to read directory: {}", e)))?;
        let mut ids: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl ProjectService for FileProjectService {
    fn load(&self, id: &str) -> BoxFuture<'_, ProjectResult<ProjectPayload>> {
        let path = self.project_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(ProjectError::NotFound(id));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| ProjectError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
            serde_json::from_str(&json).map_err(|e| {
                ProjectError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn save(&self, id: &str, request: &SaveRequest) -> BoxFuture<'_, ProjectResult<()>> {
        let path = self.project_path(id);
        let json = request.to_json();
        Box::pin(async move {
            let json = json?;
            fs::write(&path, json)
                .map_err(|e| ProjectError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            log::debug!("Saved project to {}", path.display());
            Ok(())
        })
    }
}
