//! In-memory project service.

use super::{BoxFuture, ProjectError, ProjectPayload, ProjectResult, ProjectService, SaveRequest};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory project store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryProjectService {
    projects: RwLock<HashMap<String, ProjectPayload>>,
}

impl MemoryProjectService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored project directly.
    pub fn insert(&self, id: &str, payload: ProjectPayload) {
        if let Ok(mut projects) = self.projects.write() {
            projects.insert(id.to_string(), payload);
        }
    }

    pub fn get(&self, id: &str) -> Option<ProjectPayload> {
        self.projects.read().ok()?.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.projects.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProjectService for MemoryProjectService {
    fn load(&self, id: &str) -> BoxFuture<'_, ProjectResult<ProjectPayload>> {
        let id = id.to_string();
        Box::pin(async move {
            let projects = self
                .projects
                .read()
                .map_err(|e| ProjectError::Other(format!("Lock error: {}", e)))?;
            projects.get(&id).cloned().ok_or(ProjectError::NotFound(id))
        })
    }

    fn save(&self, id: &str, request: &SaveRequest) -> BoxFuture<'_, ProjectResult<()>> {
        let id = id.to_string();
        let payload = ProjectPayload::from(request.clone());
        Box::pin(async move {
            let mut projects = self
                .projects
                .write()
                .map_err(|e| ProjectError::Other(format!("Lock error: {}", e)))?;
            projects.insert(id, payload);
            Ok(())
        })
    }
}
