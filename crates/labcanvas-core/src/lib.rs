//! LabCanvas Core Library
//!
//! Platform-agnostic core of the LabCanvas protocol diagram editor: the
//! shape model, the pointer interaction state machine, protocol step
//! numbering and the protocol interchange format.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod drop;
pub mod editor;
pub mod extract;
pub mod graph;
pub mod input;
pub mod interaction;
pub mod protocol;
pub mod selection;
pub mod shapes;
pub mod shortcuts;
pub mod snap;
pub mod storage;
pub mod text_edit;
pub mod tools;

pub use camera::Camera;
pub use canvas::{ShapeStore, StoreError};
pub use config::{ConfigError, EditorConfig};
pub use drop::{DROP_MIME, DropPayload, parse_drop};
pub use editor::{DropOutcome, EditorSession};
pub use extract::{JsonExtractor, ProtocolExtractor};
pub use graph::{ProtocolGraph, StepNumbering};
pub use input::{EditorEvent, Key, Modifiers, MouseButton};
pub use interaction::{Interaction, InteractionMode};
pub use protocol::{ProtocolDocument, ProtocolError, SCHEMA_VERSION};
pub use selection::{HandleKind, Selection};
pub use shapes::{GroupId, Shape, ShapeId, ShapeKind};
pub use shortcuts::{EditorCommand, ShortcutRegistry};
pub use snap::{GRID_SIZE, snap_point, snap_to_grid};
pub use storage::{MemoryStorage, Storage, StorageError};
pub use tools::{ToolKind, ToolManager};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
