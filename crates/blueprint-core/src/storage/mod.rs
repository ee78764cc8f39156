//! Project persistence boundary.
//!
//! The engine talks to persistence only through [`ProjectService`]: one
//! call to load a project's stored scene, one to save the current one.
//! Payloads use the JSON wire shape of the project service, where every
//! load field is optional and only present fields are applied.

mod autosave;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use autosave::{AutoSaver, PendingSave, SaveOutcome, SaveState};
pub use memory::MemoryProjectService;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileProjectService;

use crate::canvas::Canvas;
use crate::layers::Layer;
use crate::shapes::{Shape, Stroke};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Project service error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for ProjectError {
    fn from(err: serde_json::Error) -> Self {
        ProjectError::Serialization(err.to_string())
    }
}

/// Result type for persistence operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Scene data and drawing defaults of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Stroke>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erasers: Option<Vec<Stroke>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shapes: Option<Vec<Shape>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

/// A project as returned by the load call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPayload {
    #[serde(default, alias = "projectName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ProjectData>,
}

impl ProjectPayload {
    pub fn from_json(json: &str) -> ProjectResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Body of the save call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub project_name: String,
    pub layers: Vec<Layer>,
    pub data: ProjectData,
}

impl SaveRequest {
    pub fn to_json(&self) -> ProjectResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<SaveRequest> for ProjectPayload {
    fn from(request: SaveRequest) -> Self {
        Self {
            name: Some(request.project_name),
            layers: Some(request.layers),
            data: Some(request.data),
        }
    }
}

/// Backend that stores projects.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait ProjectService: Send + Sync {
    /// Load the stored project with this id.
    fn load(&self, id: &str) -> BoxFuture<'_, ProjectResult<ProjectPayload>>;

    /// Store the project under this id.
    fn save(&self, id: &str, request: &SaveRequest) -> BoxFuture<'_, ProjectResult<()>>;
}

/// Backend that stores projects (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait ProjectService {
    /// Load the stored project with this id.
    fn load(&self, id: &str) -> BoxFuture<'_, ProjectResult<ProjectPayload>>;

    /// Store the project under this id.
    fn save(&self, id: &str, request: &SaveRequest) -> BoxFuture<'_, ProjectResult<()>>;
}

/// Load project `id` from `service` into the canvas.
pub async fn open_project<S: ProjectService + ?Sized>(
    service: &S,
    id: &str,
    canvas: &mut Canvas,
) -> ProjectResult<()> {
    let payload = service.load(id).await?;
    canvas.load_project(payload);
    canvas.scene.id = id.to_string();
    Ok(())
}

/// Minimal executor for driving futures in tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerId;
    use crate::shapes::{EntityId, Rectangle, ShapeKind};
    use kurbo::Point;

    #[test]
    fn test_payload_fields_are_optional() {
        let payload = ProjectPayload::from_json("{}").unwrap();
        assert_eq!(payload, ProjectPayload::default());

        let payload = ProjectPayload::from_json(r#"{"data":{"units":"m"}}"#).unwrap();
        let data = payload.data.unwrap();
        assert_eq!(data.units.as_deref(), Some("m"));
        assert!(data.strokes.is_none());
    }

    #[test]
    fn test_save_request_wire_names() {
        let request = SaveRequest {
            project_name: "Flat".to_string(),
            layers: vec![Layer::default()],
            data: ProjectData {
                draw_color: Some("#ff0000".to_string()),
                grid_size: Some(20.0),
                ..ProjectData::default()
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["projectName"], "Flat");
        assert_eq!(json["data"]["drawColor"], "#ff0000");
        assert_eq!(json["data"]["gridSize"], 20.0);
        assert!(json["data"].get("material").is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut canvas = Canvas::new();
        canvas.settings.grid_size = 50.0;
        canvas.settings.units = "m".to_string();
        canvas.settings.draw_color = "#3366ff".to_string();
        canvas.settings.thickness = 4.0;
        canvas.settings.material = Some("brick".to_string());

        canvas
            .commit_shape(ShapeKind::Rect(Rectangle::new(5.0, 5.0, 20.0, 10.0)))
            .unwrap();
        let wall = canvas.new_stroke(vec![Point::new(0.0, 0.0), Point::new(0.0, 50.0)], true);
        assert!(canvas.commit_stroke(wall));

        let upstairs = canvas.add_layer(Some("Upstairs"));
        assert!(canvas.set_active_layer(upstairs));
        canvas
            .commit_shape(ShapeKind::Rect(Rectangle::new(100.0, 0.0, 30.0, 30.0)))
            .unwrap();
        let mut eraser = canvas.new_stroke(vec![Point::new(1.0, 1.0), Point::new(9.0, 9.0)], false);
        eraser.is_eraser = true;
        assert!(canvas.scene.add_eraser(eraser));
        assert!(canvas.set_active_layer(LayerId(1)));
        canvas.set_project_name("Cabin");

        let json = canvas.save_request().to_json().unwrap();
        let payload = ProjectPayload::from_json(&json).unwrap();
        let mut restored = Canvas::new();
        restored.load_project(payload);

        assert_eq!(restored.scene.state(), canvas.scene.state());
        assert_eq!(restored.scene.layers().len(), 2);
        assert_eq!(restored.scene.state().erasers.len(), 1);
        assert_eq!(restored.scene.active_layer(), LayerId(1));

        assert_eq!(restored.settings.grid_size, 50.0);
        assert_eq!(restored.settings.units, "m");
        assert_eq!(restored.settings.draw_color, "#3366ff");
        assert_eq!(restored.settings.thickness, 4.0);
        assert_eq!(restored.settings.material.as_deref(), Some("brick"));
    }

    #[test]
    fn test_open_project() {
        let service = MemoryProjectService::new();
        service.insert(
            "p1",
            ProjectPayload::from_json(r#"{"name":"Stored","data":{"shapes":[{"id":3,"type":"circle","x":0,"y":0,"radius":5,"layer_id":1}]}}"#)
                .unwrap(),
        );
        let mut canvas = Canvas::new();
        block_on(open_project(&service, "p1", &mut canvas)).unwrap();
        assert_eq!(canvas.scene.project_name(), "Stored");
        assert_eq!(canvas.scene.id, "p1");
        assert!(canvas.scene.get(EntityId(3)).is_some());

        let missing = block_on(open_project(&service, "nope", &mut canvas));
        assert!(matches!(missing, Err(ProjectError::NotFound(_))));
    }
}
