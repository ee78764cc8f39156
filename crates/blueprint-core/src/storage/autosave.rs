//! Periodic autosave with an in-flight guard.
//!
//! The saver never holds the canvas across an await: a save is split into
//! [`AutoSaver::begin_save`], which snapshots the scene and marks a save in
//! flight, and [`AutoSaver::finish_save`], which records the outcome. Edits
//! made while the save is running bump the canvas revision, so the project
//! stays `Unsaved` once the older snapshot lands.

use super::{ProjectResult, ProjectService, SaveRequest};
use crate::canvas::Canvas;
use crate::settings::{DEFAULT_AUTOSAVE_INTERVAL_SECS, EditorSettings};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Persistence status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Saved,
    Saving,
    Unsaved,
}

/// A save that has been started but not finished.
pub struct PendingSave<S: ProjectService + ?Sized> {
    service: Arc<S>,
    project_id: String,
    revision: u64,
    request: SaveRequest,
}

impl<S: ProjectService + ?Sized> PendingSave<S> {
    /// Revision of the canvas captured by this save.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn request(&self) -> &SaveRequest {
        &self.request
    }

    /// Send the snapshot to the service.
    pub async fn run(self) -> SaveOutcome {
        let result = self.service.save(&self.project_id, &self.request).await;
        SaveOutcome {
            revision: self.revision,
            result,
        }
    }
}

/// Result of a finished save, to hand back to [`AutoSaver::finish_save`].
#[derive(Debug)]
pub struct SaveOutcome {
    pub revision: u64,
    pub result: ProjectResult<()>,
}

/// Saves the canvas to a project service when it has unsaved changes.
pub struct AutoSaver<S: ProjectService + ?Sized> {
    service: Arc<S>,
    project_id: String,
    interval: Duration,
    last_tick: Option<Instant>,
    /// Canvas revision known to be persisted.
    saved_revision: u64,
    in_flight: bool,
    last_error: Option<String>,
}

impl<S: ProjectService + ?Sized> AutoSaver<S> {
    /// The canvas is assumed to match storage at `saved_revision`.
    pub fn new(service: Arc<S>, project_id: impl Into<String>, saved_revision: u64) -> Self {
        Self {
            service,
            project_id: project_id.into(),
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_tick: None,
            saved_revision,
            in_flight: false,
            last_error: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Take the autosave interval from editor settings.
    pub fn apply_settings(&mut self, settings: &EditorSettings) {
        self.interval = Duration::from_secs(settings.autosave_interval_secs);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Message from the most recent failed save, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight
    }

    pub fn state(&self, canvas: &Canvas) -> SaveState {
        if self.in_flight {
            SaveState::Saving
        } else if canvas.revision() != self.saved_revision {
            SaveState::Unsaved
        } else {
            SaveState::Saved
        }
    }

    /// Whether the autosave interval has elapsed since the last tick.
    pub fn is_due(&self) -> bool {
        self.last_tick.is_none_or(|last| last.elapsed() >= self.interval)
    }

    /// Start a save if one is needed and none is in flight.
    pub fn begin_save(&mut self, canvas: &Canvas) -> Option<PendingSave<S>> {
        if self.in_flight || canvas.revision() == self.saved_revision {
            return None;
        }
        self.in_flight = true;
        log::debug!("Saving project {} at revision {}", self.project_id, canvas.revision());
        Some(PendingSave {
            service: Arc::clone(&self.service),
            project_id: self.project_id.clone(),
            revision: canvas.revision(),
            request: canvas.save_request(),
        })
    }

    /// Record the outcome of a save started with [`Self::begin_save`].
    pub fn finish_save(&mut self, outcome: SaveOutcome) -> ProjectResult<()> {
        self.in_flight = false;
        match outcome.result {
            Ok(()) => {
                self.saved_revision = outcome.revision;
                self.last_error = None;
                log::info!("Saved project {}", self.project_id);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to save project {}: {}", self.project_id, e);
                self.last_error = Some(format!("Failed to save project: {}", e));
                Err(e)
            }
        }
    }

    /// Save right away if there are unsaved changes. Returns whether a save
    /// ran.
    pub async fn save_now(&mut self, canvas: &Canvas) -> ProjectResult<bool> {
        let Some(pending) = self.begin_save(canvas) else {
            return Ok(false);
        };
        let outcome = pending.run().await;
        self.finish_save(outcome)?;
        Ok(true)
    }

    /// Periodic hook: saves when the interval has elapsed and the canvas is
    /// `Unsaved`. Failures are reported, never retried before the next tick.
    pub async fn tick(&mut self, canvas: &Canvas) -> ProjectResult<bool> {
        if !self.is_due() {
            return Ok(false);
        }
        self.last_tick = Some(Instant::now());
        self.save_now(canvas).await
    }

    /// Mark the canvas as matching storage, e.g. after loading.
    pub fn mark_saved(&mut self, canvas: &Canvas) {
        self.saved_revision = canvas.revision();
    }
}
