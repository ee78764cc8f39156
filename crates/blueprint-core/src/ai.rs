//! AI draft previews.
//!
//! An AI service proposes strokes and shapes as loose JSON. Each proposed
//! entity is validated on its own; invalid ones are logged and dropped
//! while the rest of the batch becomes the preview. The preview stays out
//! of the scene until confirmed, which commits it as one undoable step
//! with fresh ids.

use crate::canvas::Canvas;
use crate::layers::LayerId;
use crate::selection::Selection;
use crate::shapes::{
    Circle, DEFAULT_COLOR, EntityId, Oval, Polygon, Rectangle, Shape, ShapeKind, Stroke, Triangle,
};
use crate::storage::{BoxFuture, ProjectData};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Body of the AI draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiDrawRequest {
    pub prompt: String,
    pub project_data: ProjectData,
}

/// Proposed entities, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiDrawData {
    #[serde(default)]
    pub strokes: Vec<Value>,
    #[serde(default)]
    pub shapes: Vec<Value>,
}

/// Reply of the AI draw call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiDrawResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AiDrawData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Transport-level AI failures.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Request(String),
    #[error("AI response could not be parsed: {0}")]
    Parse(String),
}

/// Why a proposed entity was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("entity is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("field `{0}` must be a number")]
    NotANumber(&'static str),
    #[error("field `{0}` must be a string")]
    NotAString(&'static str),
    #[error("field `{0}` must be an array of numbers")]
    NotANumberArray(&'static str),
    #[error("unknown shape type `{0}`")]
    UnknownType(String),
    #[error("invalid point count {count} for {what}")]
    PointCount { what: &'static str, count: usize },
}

/// Service that turns a prompt into proposed entities.
#[cfg(not(target_arch = "wasm32"))]
pub trait AiService: Send + Sync {
    fn draw(&self, request: &AiDrawRequest) -> BoxFuture<'_, Result<AiDrawResponse, AiError>>;
}

/// Service that turns a prompt into proposed entities (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait AiService {
    fn draw(&self, request: &AiDrawRequest) -> BoxFuture<'_, Result<AiDrawResponse, AiError>>;
}

type Object = Map<String, Value>;

fn object(value: &Value) -> Result<&Object, ValidationError> {
    value.as_object().ok_or(ValidationError::NotAnObject)
}

fn number(obj: &Object, field: &'static str) -> Result<f64, ValidationError> {
    let value = obj.get(field).ok_or(ValidationError::Missing(field))?;
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or(ValidationError::NotANumber(field))
}

fn optional_number(obj: &Object, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => number(obj, field).map(Some),
    }
}

fn string(obj: &Object, field: &'static str) -> Result<String, ValidationError> {
    let value = obj.get(field).ok_or(ValidationError::Missing(field))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or(ValidationError::NotAString(field))
}

fn points(obj: &Object, field: &'static str) -> Result<Vec<Point>, ValidationError> {
    let array = obj
        .get(field)
        .ok_or(ValidationError::Missing(field))?
        .as_array()
        .ok_or(ValidationError::NotANumberArray(field))?;
    let coords = array
        .iter()
        .map(|v| v.as_f64().filter(|n| n.is_finite()))
        .collect::<Option<Vec<f64>>>()
        .ok_or(ValidationError::NotANumberArray(field))?;
    if coords.len() % 2 != 0 {
        return Err(ValidationError::PointCount {
            what: "a flat point array",
            count: coords.len(),
        });
    }
    Ok(coords.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect())
}

fn flag(obj: &Object, field: &str) -> bool {
    obj.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn entity_id(n: f64) -> EntityId {
    EntityId(n.max(0.0) as u64)
}

fn layer_id(n: f64) -> LayerId {
    LayerId(n.max(0.0) as u64)
}

/// Validate a proposed stroke: numeric `id`, `layer_id`, `thickness`,
/// string `color` and a flat `points` array.
pub fn validate_stroke(value: &Value) -> Result<Stroke, ValidationError> {
    let obj = object(value)?;
    let id = number(obj, "id")?;
    let layer = number(obj, "layer_id")?;
    let thickness = number(obj, "thickness")?;
    let color = string(obj, "color")?;
    let pts = points(obj, "points")?;

    let is_wall = flag(obj, "isWall");
    let valid_count = if is_wall { pts.len() == 2 } else { pts.len() >= 2 };
    if !valid_count {
        return Err(ValidationError::PointCount {
            what: if is_wall { "a wall" } else { "a stroke" },
            count: pts.len(),
        });
    }

    let mut stroke = Stroke::freehand(entity_id(id), layer_id(layer), pts, &color, thickness);
    stroke.is_wall = is_wall;
    stroke.is_eraser = flag(obj, "isEraser");
    stroke.material = obj.get("material").and_then(Value::as_str).map(str::to_string);
    stroke.x = optional_number(obj, "x")?.unwrap_or(0.0);
    stroke.y = optional_number(obj, "y")?.unwrap_or(0.0);
    Ok(stroke)
}

/// Validate a proposed shape: numeric `id` and `layer_id`, a known `type`
/// and that variant's numeric fields.
pub fn validate_shape(value: &Value) -> Result<Shape, ValidationError> {
    let obj = object(value)?;
    let id = number(obj, "id")?;
    let layer = number(obj, "layer_id")?;
    let kind_name = string(obj, "type")?;
    let x = number(obj, "x")?;
    let y = number(obj, "y")?;

    let kind = match kind_name.as_str() {
        "rect" => ShapeKind::Rect(Rectangle::new(
            x,
            y,
            number(obj, "width")?,
            number(obj, "height")?,
        )),
        "circle" => ShapeKind::Circle(Circle::new(x, y, number(obj, "radius")?)),
        "oval" => ShapeKind::Oval(Oval::new(
            x,
            y,
            number(obj, "radiusX")?,
            number(obj, "radiusY")?,
        )),
        "triangle" => {
            let pts = points(obj, "points")?;
            let [a, b, c] = <[Point; 3]>::try_from(pts.as_slice()).map_err(|_| {
                ValidationError::PointCount {
                    what: "a triangle",
                    count: pts.len(),
                }
            })?;
            ShapeKind::Triangle(Triangle::new(x, y, [a, b, c]))
        }
        "polygon" => {
            let pts = points(obj, "points")?;
            if pts.len() < 3 {
                return Err(ValidationError::PointCount {
                    what: "a polygon",
                    count: pts.len(),
                });
            }
            let closed = obj.get("closed").and_then(Value::as_bool).unwrap_or(true);
            ShapeKind::Polygon(Polygon::new(x, y, pts, closed))
        }
        _ => return Err(ValidationError::UnknownType(kind_name)),
    };

    let color = obj
        .get("color")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_COLOR);
    let mut shape = Shape::new(entity_id(id), kind, color, layer_id(layer));
    shape.rotation = optional_number(obj, "rotation")?.unwrap_or(0.0);
    Ok(shape)
}

/// Validated entities awaiting confirmation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewSet {
    pub strokes: Vec<Stroke>,
    pub shapes: Vec<Shape>,
}

impl PreviewSet {
    /// Validate every proposed entity, skipping the invalid ones.
    pub fn from_data(data: &AiDrawData) -> Self {
        let mut preview = Self::default();
        for (i, value) in data.strokes.iter().enumerate() {
            match validate_stroke(value) {
                Ok(stroke) => preview.strokes.push(stroke),
                Err(e) => log::warn!("Skipping proposed stroke #{}: {}", i, e),
            }
        }
        for (i, value) in data.shapes.iter().enumerate() {
            match validate_shape(value) {
                Ok(shape) => preview.shapes.push(shape),
                Err(e) => log::warn!("Skipping proposed shape #{}: {}", i, e),
            }
        }
        preview
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strokes.len() + self.shapes.len()
    }
}

/// Drives AI draw requests and holds the resulting preview.
#[derive(Debug, Clone, Default)]
pub struct AiAssistant {
    in_flight: bool,
    preview: Option<PreviewSet>,
    last_error: Option<String>,
}

impl AiAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn preview(&self) -> Option<&PreviewSet> {
        self.preview.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Build a request for `prompt`, or `None` while another is outstanding.
    pub fn begin(&mut self, prompt: &str, canvas: &Canvas) -> Option<AiDrawRequest> {
        if self.in_flight {
            log::debug!("AI request already in flight");
            return None;
        }
        self.in_flight = true;
        self.last_error = None;
        Some(AiDrawRequest {
            prompt: prompt.to_string(),
            project_data: canvas.save_request().data,
        })
    }

    /// Store the reply as the preview. A late reply still replaces the
    /// current preview.
    pub fn complete(&mut self, result: Result<AiDrawResponse, AiError>) {
        self.in_flight = false;
        match result {
            Ok(response) if response.success => {
                let preview = PreviewSet::from_data(&response.data.unwrap_or_default());
                log::info!("AI proposed {} entities", preview.len());
                self.preview = Some(preview);
            }
            Ok(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| "AI request was not successful".to_string());
                log::warn!("AI draw rejected: {}", message);
                self.last_error = Some(message);
            }
            Err(e) => {
                log::error!("{}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Send `prompt` to `service` and store the reply. Returns false when
    /// another request is outstanding.
    pub async fn request<S: AiService + ?Sized>(&mut self, service: &S, prompt: &str, canvas: &Canvas) -> bool {
        let Some(request) = self.begin(prompt, canvas) else {
            return false;
        };
        let result = service.draw(&request).await;
        self.complete(result);
        true
    }

    /// Commit the preview as one undoable step. Ids are regenerated and
    /// entities on unknown layers move to the active layer. The committed
    /// entities become the selection.
    pub fn confirm(&mut self, canvas: &mut Canvas) -> Vec<EntityId> {
        let Some(preview) = self.preview.take() else {
            return Vec::new();
        };
        if preview.is_empty() {
            return Vec::new();
        }

        canvas.record("AI draw");
        let active = canvas.scene.active_layer();
        let mut added = Vec::with_capacity(preview.len());
        for mut stroke in preview.strokes {
            stroke.id = canvas.scene.allocate_id();
            if !canvas.scene.has_layer(stroke.layer_id) {
                stroke.layer_id = active;
            }
            let id = stroke.id;
            if canvas.scene.add_stroke(stroke) {
                added.push(id);
            }
        }
        for mut shape in preview.shapes {
            shape.id = canvas.scene.allocate_id();
            if !canvas.scene.has_layer(shape.layer_id) {
                shape.layer_id = active;
            }
            let id = shape.id;
            if canvas.scene.add_shape(shape) {
                added.push(id);
            }
        }
        canvas.selection = Selection::from_ids(added.iter().copied());
        log::info!("Committed {} AI entities", added.len());
        added
    }

    /// Drop the preview without touching history.
    pub fn discard(&mut self) {
        self.preview = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;
    use serde_json::json;

    struct CannedService(AiDrawResponse);

    impl AiService for CannedService {
        fn draw(&self, _request: &AiDrawRequest) -> BoxFuture<'_, Result<AiDrawResponse, AiError>> {
            let response = self.0.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    fn proposal() -> AiDrawData {
        AiDrawData {
            strokes: vec![
                json!({"id": 1, "layer_id": 1, "thickness": 3, "color": "#111111", "points": [0, 0, 100, 0], "isWall": true}),
                json!({"id": 2, "layer_id": 1, "color": "#111111", "points": [0, 0, 1, 1]}),
            ],
            shapes: vec![
                json!({"id": 1, "layer_id": 99, "type": "rect", "x": 10, "y": 10, "width": 20, "height": 5}),
                json!({"id": 2, "layer_id": 1, "type": "hexagon", "x": 0, "y": 0}),
                json!({"id": 3, "layer_id": 1, "type": "circle", "x": 0, "y": 0, "radius": "big"}),
            ],
        }
    }

    #[test]
    fn test_validate_stroke() {
        let stroke = validate_stroke(&proposal().strokes[0]).unwrap();
        assert!(stroke.is_wall);
        assert_eq!(stroke.points, vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert_eq!(
            validate_stroke(&proposal().strokes[1]),
            Err(ValidationError::Missing("thickness"))
        );
        let odd = json!({"id": 1, "layer_id": 1, "thickness": 1, "color": "#000", "points": [0, 0, 1]});
        assert!(matches!(validate_stroke(&odd), Err(ValidationError::PointCount { .. })));
        let wall = json!({"id": 1, "layer_id": 1, "thickness": 1, "color": "#000", "points": [0, 0, 1, 1, 2, 2], "isWall": true});
        assert!(matches!(validate_stroke(&wall), Err(ValidationError::PointCount { .. })));
        assert_eq!(validate_stroke(&json!([1, 2])), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn test_validate_shape_variants() {
        let tri = json!({"id": 5, "layer_id": 1, "type": "triangle", "x": 0, "y": 0, "points": [0, 0, 10, 0, 5, 8]});
        assert!(matches!(validate_shape(&tri).unwrap().kind, ShapeKind::Triangle(_)));
        let bad_tri = json!({"id": 5, "layer_id": 1, "type": "triangle", "x": 0, "y": 0, "points": [0, 0, 10, 0]});
        assert!(matches!(validate_shape(&bad_tri), Err(ValidationError::PointCount { .. })));
        let oval = json!({"id": 5, "layer_id": 1, "type": "oval", "x": 0, "y": 0, "radiusX": 4, "radiusY": 2});
        assert_eq!(validate_shape(&oval).unwrap().color, DEFAULT_COLOR);
        assert_eq!(
            validate_shape(&proposal().shapes[1]),
            Err(ValidationError::UnknownType("hexagon".to_string()))
        );
        assert_eq!(
            validate_shape(&proposal().shapes[2]),
            Err(ValidationError::NotANumber("radius"))
        );
    }

    #[test]
    fn test_preview_skips_invalid_items() {
        let preview = PreviewSet::from_data(&proposal());
        assert_eq!(preview.strokes.len(), 1);
        assert_eq!(preview.shapes.len(), 1);
    }

    #[test]
    fn test_confirm_commits_with_fresh_ids() {
        let mut canvas = Canvas::new();
        let existing = canvas.commit_shape(ShapeKind::Circle(Circle::new(0.0, 0.0, 1.0))).unwrap();
        let mut assistant = AiAssistant::new();
        let service = CannedService(AiDrawResponse {
            success: true,
            data: Some(proposal()),
            error: None,
        });

        assert!(block_on(assistant.request(&service, "add a wall", &canvas)));
        assert_eq!(assistant.preview().map(PreviewSet::len), Some(2));
        // Preview does not touch the scene
        assert_eq!(canvas.scene.shapes().len(), 1);

        let undo_len = canvas.history.undo_len();
        let added = assistant.confirm(&mut canvas);
        assert_eq!(added.len(), 2);
        assert!(!added.contains(&existing));
        assert!(assistant.preview().is_none());
        assert_eq!(canvas.history.undo_len(), undo_len + 1);
        assert_eq!(canvas.selection.len(), 2);
        // Unknown layer 99 falls back to the active layer
        assert!(canvas.scene.shapes().iter().all(|s| s.layer_id == canvas.scene.active_layer()));
        assert!(canvas.scene.invariant_violations().is_empty());

        assert!(canvas.undo());
        assert_eq!(canvas.scene.shapes().len(), 1);
        assert!(canvas.scene.strokes().is_empty());
    }

    #[test]
    fn test_discard_leaves_history_alone() {
        let mut canvas = Canvas::new();
        let mut assistant = AiAssistant::new();
        assistant.begin("x", &canvas).unwrap();
        assistant.complete(Ok(AiDrawResponse {
            success: true,
            data: Some(proposal()),
            error: None,
        }));
        assistant.discard();
        assert!(assistant.confirm(&mut canvas).is_empty());
        assert!(!canvas.history.can_undo());
    }

    #[test]
    fn test_single_request_in_flight() {
        let canvas = Canvas::new();
        let mut assistant = AiAssistant::new();
        let request = assistant.begin("kitchen", &canvas).unwrap();
        assert_eq!(request.prompt, "kitchen");
        assert!(assistant.is_busy());
        assert!(assistant.begin("again", &canvas).is_none());

        assistant.complete(Ok(AiDrawResponse {
            success: false,
            data: None,
            error: Some("quota exceeded".to_string()),
        }));
        assert!(!assistant.is_busy());
        assert_eq!(assistant.last_error(), Some("quota exceeded"));
        assert!(assistant.preview().is_none());

        assistant.begin("third", &canvas).unwrap();
        assistant.complete(Err(AiError::Request("timeout".to_string())));
        assert!(assistant.last_error().unwrap().contains("timeout"));
    }

    #[test]
    fn test_request_wire_shape() {
        let canvas = Canvas::new();
        let request = AiDrawRequest {
            prompt: "porch".to_string(),
            project_data: canvas.save_request().data,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["prompt"], "porch");
        assert_eq!(json["projectData"]["units"], "cm");

        let response: AiDrawResponse =
            serde_json::from_value(json!({"success": false, "error": "nope"})).unwrap();
        assert_eq!(response.error.as_deref(), Some("nope"));
    }
}
