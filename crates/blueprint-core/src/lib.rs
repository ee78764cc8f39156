//! Blueprint Core Library
//!
//! Scene model and interactive geometry engine for the Blueprint floorplan
//! editor: strokes, walls and shapes on layers, with hit-testing, snapping,
//! grouping, undo/redo, room detection and transform baking.

pub mod ai;
pub mod camera;
pub mod canvas;
pub mod clipboard;
pub mod event_handler;
pub mod geometry;
pub mod grouping;
pub mod history;
pub mod input;
pub mod layers;
pub mod rooms;
pub mod scene;
pub mod selection;
pub mod settings;
pub mod shapes;
pub mod shortcuts;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod transform;

pub use ai::{AiAssistant, AiService, PreviewSet, ValidationError};
pub use camera::Camera;
pub use canvas::Canvas;
pub use event_handler::EventHandler;
pub use history::History;
pub use input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use layers::{Layer, LayerId};
pub use rooms::{Room, detect_rooms};
pub use scene::{EntityRef, Scene, SceneState};
pub use selection::{Corner, Handle, HandleKind, Selection};
pub use settings::EditorSettings;
pub use shapes::{EntityId, Shape, ShapeKind, Stroke};
pub use shortcuts::{EditorAction, ShortcutRegistry};
pub use snap::{GRID_SIZE, SnapGuide, SnapMode, snap_to_grid};
pub use storage::{AutoSaver, ProjectError, ProjectService, SaveState};
pub use tools::{InteractionState, ToolKind};
pub use transform::NodeTransform;
