//! Editing session: the state a diagram editor operates on, and the event
//! dispatch that drives it.

use crate::camera::{Camera, ZOOM_STEP};
use crate::canvas::ShapeStore;
use crate::config::EditorConfig;
use crate::drop::parse_drop;
use crate::extract::ProtocolExtractor;
use crate::graph::{StepNumbering, step_numbers};
use crate::input::{EditorEvent, Key, Modifiers};
use crate::interaction::{Interaction, InteractionMode};
use crate::protocol::{self, ImportLayout, ProtocolDocument, ProtocolError};
use crate::selection::Selection;
use crate::shapes::{
    AssetRef, GroupId, ProtocolNode, Shape, ShapeId, ShapeKind, ShapeStyle, UnitOperation,
};
use crate::shortcuts::{EditorCommand, ShortcutRegistry};
use crate::storage::{Storage, StorageResult};
use crate::text_edit::{EditOutcome, TextEdit};
use crate::tools::{ToolKind, ToolManager};
use chrono::Utc;
use kurbo::{Point, Size, Vec2};
use peniko::Color;

/// Operation metadata key recording which palette item created a node.
pub const TEMPLATE_ID_KEY: &str = "templateId";

/// What a palette drop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// A new shape was placed.
    Created(ShapeId),
    /// The entity was linked into an existing protocol node.
    Linked { node_id: ShapeId, object_id: String },
}

/// A single editing session over one diagram.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub config: EditorConfig,
    pub store: ShapeStore,
    pub selection: Selection,
    pub camera: Camera,
    pub tools: ToolManager,
    pub snap_to_grid: bool,
    pub(crate) interaction: Interaction,
    text_edit: Option<TextEdit>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            camera: Camera::with_limits(config.min_zoom, config.max_zoom),
            snap_to_grid: config.snap_to_grid,
            config,
            store: ShapeStore::new(),
            selection: Selection::new(),
            tools: ToolManager::new(),
            interaction: Interaction::None,
            text_edit: None,
        }
    }

    /// Start a session from a loaded shape list.
    pub fn with_shapes(config: EditorConfig, shapes: Vec<Shape>) -> Self {
        let mut session = Self::new(config);
        session.store = ShapeStore::from_shapes(shapes);
        session
    }

    pub fn mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
    }

    /// Consume an event and return the next session state.
    pub fn transition(mut self, event: EditorEvent) -> Self {
        self.handle_event(event);
        self
    }

    /// Apply one input event.
    pub fn handle_event(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.on_pointer_down(position, button, modifiers),
            EditorEvent::PointerMove { position, .. } => self.on_pointer_move(position),
            EditorEvent::PointerUp { position, .. } => self.on_pointer_up(position),
            EditorEvent::DoubleClick { position } => self.on_double_click(position),
            EditorEvent::Wheel { delta, modifiers } => self.on_wheel(delta, modifiers),
            EditorEvent::Key { key, modifiers } => self.on_key(key, modifiers),
            EditorEvent::EditText(text) => {
                if let Some(edit) = &mut self.text_edit {
                    edit.set_text(text);
                }
            }
            EditorEvent::Blur => self.commit_text_edit(),
        }
    }

    fn on_wheel(&mut self, delta: Vec2, modifiers: Modifiers) {
        if modifiers.command() {
            let factor = if delta.y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
            self.camera.zoom_by(factor);
        } else {
            self.camera.pan(-delta);
        }
    }

    fn on_key(&mut self, key: Key, modifiers: Modifiers) {
        if let Some(edit) = &mut self.text_edit {
            match edit.handle_key(key, modifiers) {
                EditOutcome::Continue => {}
                EditOutcome::Commit => self.commit_text_edit(),
                EditOutcome::Cancel => {
                    log::debug!("Discarded text edit of {}", edit.shape_id);
                    self.text_edit = None;
                }
            }
            return;
        }
        if let Some(command) = ShortcutRegistry::resolve(key, modifiers) {
            self.execute(command);
        }
    }

    fn on_double_click(&mut self, screen: Point) {
        self.commit_text_edit();
        let pos = self.camera.screen_to_world(screen);
        let Some(id) = self.store.shape_at_point(pos, self.hit_tolerance()) else { return };
        let Some(shape) = self.store.get_shape(&id) else { return };
        if shape.locked {
            return;
        }
        self.text_edit = Some(TextEdit::new(id.clone(), shape.label()));
        self.selection.set([id]);
    }

    /// Write the open text edit back to its shape.
    pub fn commit_text_edit(&mut self) {
        if let Some(edit) = self.text_edit.take() {
            self.set_text(&edit.shape_id, edit.buffer);
        }
    }

    /// Set a shape's label text. Locked shapes are left unchanged.
    pub fn set_text(&mut self, id: &ShapeId, text: String) -> bool {
        match self.store.get_shape_mut(id) {
            Some(shape) if !shape.locked => {
                shape.set_label(text);
                true
            }
            _ => false,
        }
    }

    /// Run a keyboard command.
    pub fn execute(&mut self, command: EditorCommand) {
        match command {
            EditorCommand::Delete => {
                self.delete_selected();
            }
            EditorCommand::Group => {
                self.group_selected();
            }
            EditorCommand::Ungroup => self.ungroup_selected(),
            EditorCommand::Duplicate => {
                self.duplicate_selected();
            }
            EditorCommand::BringToFront => self.bring_to_front(),
            EditorCommand::SendToBack => self.send_to_back(),
            EditorCommand::BringForward => self.bring_forward(),
            EditorCommand::SendBackward => self.send_backward(),
            EditorCommand::SelectAll => self.select_all(),
            EditorCommand::ToggleLock => self.toggle_lock(),
            EditorCommand::ClearSelection => self.selection.clear(),
            EditorCommand::Nudge { direction, large } => {
                let step = if large {
                    self.config.nudge_step_large
                } else {
                    self.config.nudge_step
                };
                self.nudge(direction * step);
            }
        }
    }

    /// Selected ids whose shapes are unlocked, in selection order.
    fn unlocked_selection(&self) -> Vec<ShapeId> {
        self.selection
            .ids()
            .iter()
            .filter(|id| self.store.get_shape(id).is_some_and(|s| !s.locked))
            .cloned()
            .collect()
    }

    pub(crate) fn rebind_connectors(&mut self, ids: &[ShapeId]) {
        for id in ids {
            self.store.rebind_connector(id);
        }
    }

    /// Move the unlocked selection by `delta`.
    pub fn nudge(&mut self, delta: Vec2) {
        self.translate_selection(delta);
        let moved = self.selection.ids().to_vec();
        self.rebind_connectors(&moved);
    }

    /// Remove the unlocked selected shapes. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.unlocked_selection();
        for id in &ids {
            self.store.remove_shape(id);
        }
        self.selection.retain_existing(&self.store);
        if !ids.is_empty() {
            log::debug!("Deleted {} shape(s)", ids.len());
        }
        ids.len()
    }

    /// Give the unlocked selected shapes a shared new group id.
    /// Needs at least two.
    pub fn group_selected(&mut self) -> Option<GroupId> {
        let ids = self.unlocked_selection();
        if ids.len() < 2 {
            return None;
        }
        let group_id = GroupId::new();
        for id in &ids {
            if let Some(shape) = self.store.get_shape_mut(id) {
                shape.group_id = Some(group_id.clone());
            }
        }
        log::debug!("Grouped {} shapes as {}", ids.len(), group_id);
        Some(group_id)
    }

    /// Clear the group id of the unlocked selected shapes.
    pub fn ungroup_selected(&mut self) {
        for id in self.unlocked_selection() {
            if let Some(shape) = self.store.get_shape_mut(&id) {
                shape.group_id = None;
            }
        }
    }

    /// Clone the selected shapes with fresh ids, offset, ungrouped and
    /// unlocked. The copies become the selection.
    pub fn duplicate_selected(&mut self) -> Vec<ShapeId> {
        let offset = Vec2::new(self.config.duplicate_offset, self.config.duplicate_offset);
        let copies: Vec<Shape> = self
            .store
            .iter()
            .filter(|s| self.selection.contains(s.id()))
            .map(|s| {
                let mut copy = s.clone();
                copy.regenerate_id();
                copy.translate(offset);
                copy.group_id = None;
                copy.locked = false;
                if let Some(node) = copy.as_protocol_node_mut() {
                    node.operation.id = None;
                }
                copy
            })
            .collect();

        let mut ids = Vec::with_capacity(copies.len());
        for copy in copies {
            let id = copy.id().clone();
            if let Err(e) = self.store.add_shape(copy) {
                log::warn!("Skipping duplicate: {}", e);
                continue;
            }
            ids.push(id);
        }
        self.rebind_connectors(&ids);
        self.selection.set(ids.iter().cloned());
        ids
    }

    pub fn bring_to_front(&mut self) {
        self.store.bring_to_front(self.selection.ids());
    }

    pub fn send_to_back(&mut self) {
        self.store.send_to_back(self.selection.ids());
    }

    /// Raise each selected shape one layer, front-most first.
    pub fn bring_forward(&mut self) {
        let mut ids = self.selection.ids().to_vec();
        ids.sort_by_key(|id| std::cmp::Reverse(self.store.index_of(id)));
        for id in &ids {
            self.store.bring_forward(id);
        }
    }

    /// Lower each selected shape one layer, back-most first.
    pub fn send_backward(&mut self) {
        let mut ids = self.selection.ids().to_vec();
        ids.sort_by_key(|id| self.store.index_of(id));
        for id in &ids {
            self.store.send_backward(id);
        }
    }

    pub fn select_all(&mut self) {
        self.selection.set(self.store.ids());
    }

    /// Lock the selection, or unlock it when every selected shape is
    /// already locked.
    pub fn toggle_lock(&mut self) {
        let lock = !self.unlocked_selection().is_empty();
        for id in self.selection.ids() {
            if let Some(shape) = self.store.get_shape_mut(id) {
                shape.locked = lock;
            }
        }
    }

    /// Apply a style change to every unlocked selected shape.
    pub fn update_style(&mut self, mut update: impl FnMut(&mut ShapeStyle)) {
        for id in self.unlocked_selection() {
            if let Some(shape) = self.store.get_shape_mut(&id) {
                update(&mut shape.style);
            }
        }
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.update_style(|style| style.set_stroke(color));
    }

    /// Set or clear the fill of the unlocked selection.
    pub fn set_fill_color(&mut self, color: Option<Color>) {
        self.update_style(|style| style.set_fill(color));
    }

    /// Display step numbers of the protocol nodes.
    pub fn step_numbers(&self) -> StepNumbering {
        step_numbers(self.store.shapes())
    }

    /// Export the diagram's protocol.
    pub fn export_protocol(&self, name: &str) -> Result<ProtocolDocument, ProtocolError> {
        protocol::export_protocol(self.store.shapes(), name, Utc::now())
    }

    fn import_layout(&self) -> ImportLayout {
        ImportLayout {
            node_size: Size::new(self.config.node_width, self.config.node_height),
            ..ImportLayout::default()
        }
    }

    /// Replace the diagram with an imported protocol and clear the
    /// selection. On error nothing changes. Returns the number of shapes.
    pub fn import_protocol(&mut self, doc: &ProtocolDocument) -> Result<usize, ProtocolError> {
        let shapes = protocol::import_protocol(doc, self.import_layout())?;
        let count = shapes.len();
        self.store.replace_all(shapes);
        self.selection.clear();
        self.text_edit = None;
        self.interaction = Interaction::None;
        Ok(count)
    }

    /// Parse and import a protocol document.
    pub fn import_json(&mut self, json: &str) -> Result<usize, ProtocolError> {
        let doc = protocol::parse_document(json)?;
        self.import_protocol(&doc)
    }

    /// Run an extraction service and import its result.
    pub async fn import_extracted(
        &mut self,
        extractor: &dyn ProtocolExtractor,
        file: &[u8],
        file_name: &str,
        context: Option<&str>,
    ) -> Result<usize, ProtocolError> {
        let doc = extractor
            .extract(file, file_name, context)
            .await
            .map_err(ProtocolError::Extraction)?;
        self.import_protocol(&doc)
    }

    /// Persist the current shape list. The session is not modified.
    pub async fn save_to(
        &self,
        storage: &dyn Storage,
        id: Option<&str>,
    ) -> StorageResult<String> {
        let result = storage.save(id, self.store.shapes()).await;
        match &result {
            Ok(id) => log::info!("Saved diagram {} ({} shapes)", id, self.store.len()),
            Err(e) => log::warn!("Save failed: {}", e),
        }
        result
    }

    /// Handle a palette drop at a screen position. Malformed payloads are
    /// ignored.
    pub fn drop_item(&mut self, tag: &str, raw: &str, screen: Point) -> Option<DropOutcome> {
        let payload = parse_drop(tag, raw)?;
        let pos = self.camera.screen_to_world(screen);

        let Some(asset_type) = payload.kind.asset_type() else {
            let op_type = payload.operation_type.as_deref().unwrap_or("generic");
            let mut operation = UnitOperation::new(op_type, payload.label());
            operation
                .metadata
                .insert(TEMPLATE_ID_KEY.to_string(), payload.id.clone().into());
            let origin = self.snapped(pos);
            let shape = Shape::new(
                ShapeKind::ProtocolNode(ProtocolNode::new(operation)),
                origin.x,
                origin.y,
                self.config.node_width,
                self.config.node_height,
            );
            return self.place_dropped(shape);
        };

        if let Some(node_id) = self.store.node_at(pos).map(|n| n.id().clone()) {
            let node = self.store.get_shape_mut(&node_id)?;
            if node.locked {
                log::debug!("Ignoring drop on locked node {}", node_id);
                return None;
            }
            node.as_protocol_node_mut()?.operation.link_object(&payload.id);
            return Some(DropOutcome::Linked {
                node_id,
                object_id: payload.id,
            });
        }

        let origin = self.snapped(pos);
        let mut shape = Shape::new(
            ShapeKind::Asset(AssetRef::linked_to(asset_type, payload.id.clone())),
            origin.x,
            origin.y,
            self.config.asset_size,
            self.config.asset_size,
        );
        shape.text = payload.label().to_string();
        self.place_dropped(shape)
    }

    fn place_dropped(&mut self, shape: Shape) -> Option<DropOutcome> {
        let id = shape.id().clone();
        if let Err(e) = self.store.add_shape(shape) {
            log::warn!("Could not place dropped item: {}", e);
            return None;
        }
        self.selection.set([id.clone()]);
        Some(DropOutcome::Created(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drop::DROP_MIME;
    use crate::extract::JsonExtractor;
    use crate::input::MouseButton;
    use crate::selection::HandleKind;
    use crate::shapes::{Connector, ConnectorKind, SerializableColor};
    use crate::storage::{MemoryStorage, block_on};
    use kurbo::Rect;

    fn session_with(shapes: Vec<Shape>) -> EditorSession {
        EditorSession::with_shapes(EditorConfig::default(), shapes)
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::new(ShapeKind::Rect, x, y, w, h)
    }

    fn node(label: &str, x: f64, y: f64) -> Shape {
        Shape::new(
            ShapeKind::ProtocolNode(ProtocolNode::new(UnitOperation::new("step", label))),
            x,
            y,
            200.0,
            100.0,
        )
    }

    fn drag(session: EditorSession, from: Point, to: Point) -> EditorSession {
        session
            .transition(EditorEvent::left_down(from))
            .transition(EditorEvent::moved(to))
            .transition(EditorEvent::left_up(to))
    }

    fn position(session: &EditorSession, id: &ShapeId) -> Point {
        session.store.get_shape(id).unwrap().position()
    }

    #[test]
    fn test_draw_up_left_normalizes() {
        let mut session = EditorSession::default();
        session.set_tool(ToolKind::Rect);
        let session = session
            .transition(EditorEvent::left_down(Point::new(10.0, 10.0)))
            .transition(EditorEvent::moved(Point::new(-5.0, -5.0)));
        assert_eq!(session.mode(), InteractionMode::Drawing);

        let session = session.transition(EditorEvent::left_up(Point::new(-5.0, -5.0)));
        assert_eq!(session.mode(), InteractionMode::None);
        assert_eq!(session.tools.current_tool, ToolKind::Select);

        let shape = &session.store.shapes()[0];
        assert!((shape.width + 15.0).abs() < f64::EPSILON);
        assert!((shape.height + 15.0).abs() < f64::EPSILON);
        assert_eq!(shape.bounds(), Rect::new(-5.0, -5.0, 10.0, 10.0));
        assert_eq!(session.selection.ids(), &[shape.id().clone()]);
    }

    #[test]
    fn test_drawing_with_snap() {
        let mut session = EditorSession::default();
        session.snap_to_grid = true;
        session.set_tool(ToolKind::Rect);
        let session = drag(session, Point::new(12.0, 9.0), Point::new(57.0, 33.0));
        assert_eq!(session.store.shapes()[0].bounds(), Rect::new(20.0, 0.0, 60.0, 40.0));
    }

    #[test]
    fn test_drawn_arrow_binds_nodes() {
        let a = node("A", 0.0, 0.0);
        let b = node("B", 400.0, 0.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let mut session = session_with(vec![a, b]);
        session.set_tool(ToolKind::Arrow);
        let session = drag(session, Point::new(100.0, 50.0), Point::new(500.0, 50.0));

        let numbering = session.step_numbers();
        assert_eq!(numbering.step(&a_id), Some(1));
        assert_eq!(numbering.step(&b_id), Some(2));

        let doc = session.export_protocol("AB").unwrap();
        assert_eq!(doc.connections.len(), 1);
        assert_eq!(doc.connections[0].from, format!("op-{}", a_id));
    }

    #[test]
    fn test_move_selected_shapes() {
        let a = rect(0.0, 0.0, 50.0, 50.0);
        let b = rect(100.0, 0.0, 50.0, 50.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let mut session = session_with(vec![a, b]);
        session.selection.set([a_id.clone(), b_id.clone()]);

        let session = session
            .transition(EditorEvent::left_down(Point::new(10.0, 10.0)))
            .transition(EditorEvent::moved(Point::new(20.0, 15.0)));
        assert_eq!(session.mode(), InteractionMode::Moving);
        let session = session
            .transition(EditorEvent::moved(Point::new(40.0, 30.0)))
            .transition(EditorEvent::left_up(Point::new(40.0, 30.0)));

        assert_eq!(position(&session, &a_id), Point::new(30.0, 20.0));
        assert_eq!(position(&session, &b_id), Point::new(130.0, 20.0));
    }

    #[test]
    fn test_drag_skips_locked_members_of_selection() {
        let free = rect(0.0, 0.0, 50.0, 50.0);
        let mut pinned = rect(100.0, 0.0, 50.0, 50.0);
        pinned.locked = true;
        let (free_id, pinned_id) = (free.id().clone(), pinned.id().clone());
        let mut session = session_with(vec![free, pinned]);
        session.selection.set([free_id.clone(), pinned_id.clone()]);

        let session = drag(session, Point::new(10.0, 10.0), Point::new(40.0, 25.0));
        assert_eq!(position(&session, &free_id), Point::new(30.0, 15.0));
        assert_eq!(position(&session, &pinned_id), Point::new(100.0, 0.0));
        assert_eq!(session.selection.ids(), &[free_id, pinned_id]);
    }

    #[test]
    fn test_move_with_snap_keeps_selection_on_grid() {
        let a = rect(20.0, 20.0, 40.0, 40.0);
        let b = rect(100.0, 20.0, 40.0, 40.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let mut session = session_with(vec![a, b]);
        session.snap_to_grid = true;
        session.selection.set([a_id.clone(), b_id.clone()]);

        // Grab a at offset (5, 5) and drag so its origin lands near (47, 33).
        let session = drag(session, Point::new(25.0, 25.0), Point::new(52.0, 38.0));
        assert_eq!(position(&session, &a_id), Point::new(40.0, 40.0));
        assert_eq!(position(&session, &b_id), Point::new(120.0, 40.0));
    }

    #[test]
    fn test_click_resolves_group() {
        let group = GroupId::new();
        let mut a = rect(0.0, 0.0, 50.0, 50.0);
        let mut b = rect(100.0, 0.0, 50.0, 50.0);
        a.group_id = Some(group.clone());
        b.group_id = Some(group);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let session = session_with(vec![a, b, rect(300.0, 0.0, 10.0, 10.0)]);

        let session = drag(session, Point::new(10.0, 10.0), Point::new(20.0, 10.0));
        assert_eq!(session.selection.ids(), &[a_id, b_id.clone()]);
        assert!((position(&session, &b_id).x - 110.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shift_click_toggles() {
        let a = rect(0.0, 0.0, 50.0, 50.0);
        let b = rect(100.0, 0.0, 50.0, 50.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let mut session = session_with(vec![a, b]);
        session.selection.set([a_id.clone()]);

        let session = session
            .transition(EditorEvent::shift_down(Point::new(110.0, 10.0)))
            .transition(EditorEvent::left_up(Point::new(110.0, 10.0)));
        assert_eq!(session.selection.ids(), &[a_id, b_id.clone()]);

        let session = session.transition(EditorEvent::shift_down(Point::new(10.0, 10.0)));
        assert_eq!(session.mode(), InteractionMode::None);
        assert_eq!(session.selection.ids(), &[b_id]);
    }

    #[test]
    fn test_locked_shape_is_immutable() {
        let mut locked = rect(0.0, 0.0, 50.0, 50.0);
        locked.locked = true;
        let other = rect(100.0, 0.0, 50.0, 50.0);
        let (locked_id, other_id) = (locked.id().clone(), other.id().clone());
        let before = locked.clone();
        let mut session = session_with(vec![locked, other]);
        session.selection.set([other_id.clone()]);

        // Clicking a locked shape selects only it and starts no move.
        let mut session = drag(session, Point::new(10.0, 10.0), Point::new(80.0, 80.0));
        assert_eq!(session.selection.ids(), &[locked_id.clone()]);

        session.selection.set([locked_id.clone(), other_id.clone()]);
        session.nudge(Vec2::new(5.0, 5.0));
        assert_eq!(session.group_selected(), None);
        session.update_style(|style| style.stroke_width = 9.0);
        session.set_stroke_color(Color::from_rgba8(255, 0, 0, 255));
        assert!(!session.set_text(&locked_id, "changed".to_string()));
        assert_eq!(session.delete_selected(), 1);

        assert_eq!(session.store.get_shape(&locked_id), Some(&before));
        assert!(session.store.get_shape(&other_id).is_none());
        assert_eq!(session.selection.ids(), &[locked_id]);
    }

    #[test]
    fn test_color_commands_update_selection() {
        let a = rect(0.0, 0.0, 50.0, 50.0);
        let b = rect(100.0, 0.0, 50.0, 50.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let mut session = session_with(vec![a, b]);
        session.selection.set([a_id.clone()]);

        session.set_stroke_color(Color::from_rgba8(0, 128, 255, 255));
        session.set_fill_color(Some(Color::from_rgba8(250, 250, 210, 255)));

        let style = &session.store.get_shape(&a_id).unwrap().style;
        assert_eq!(style.stroke_color, SerializableColor::new(0, 128, 255, 255));
        assert_eq!(style.fill_color, Some(SerializableColor::new(250, 250, 210, 255)));
        assert_eq!(session.store.get_shape(&b_id).unwrap().style, ShapeStyle::default());

        session.set_fill_color(None);
        assert!(session.store.get_shape(&a_id).unwrap().style.fill_color.is_none());
    }

    #[test]
    fn test_resize_handle() {
        let shape = rect(0.0, 0.0, 100.0, 100.0);
        let id = shape.id().clone();
        let mut session = session_with(vec![shape]);
        session.selection.set([id.clone()]);

        let session = session
            .transition(EditorEvent::left_down(Point::new(100.0, 100.0)))
            .transition(EditorEvent::moved(Point::new(160.0, 130.0)));
        assert!(matches!(
            session.interaction(),
            Interaction::Resizing(state) if state.handle == HandleKind::Se
        ));
        let session = session.transition(EditorEvent::left_up(Point::new(160.0, 130.0)));
        let bounds = session.store.get_shape(&id).unwrap().bounds();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 160.0, 130.0));
    }

    #[test]
    fn test_marquee_selects_overlapping() {
        let inside = rect(10.0, 10.0, 20.0, 20.0);
        let edge = rect(100.0, 100.0, 30.0, 30.0);
        let negative = rect(150.0, 50.0, -60.0, 10.0);
        let outside = rect(101.0, 0.0, 30.0, 30.0);
        let expected: Vec<ShapeId> = [&inside, &edge, &negative]
            .iter()
            .map(|s| s.id().clone())
            .collect();
        let mut session = session_with(vec![inside, edge, negative, outside]);
        session.camera.offset = Vec2::new(500.0, 500.0);

        // Screen (500, 500) is canvas (0, 0) once the camera is panned.
        let session = session
            .transition(EditorEvent::left_down(Point::new(500.0, 500.0)))
            .transition(EditorEvent::moved(Point::new(550.0, 550.0)));
        assert_eq!(session.mode(), InteractionMode::SelectingArea);
        let marquee = session.interaction().marquee();
        assert_eq!(marquee, Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let session = session.transition(EditorEvent::left_up(Point::new(600.0, 600.0)));
        assert_eq!(session.selection.ids(), expected.as_slice());
    }

    #[test]
    fn test_pan_and_zoom() {
        let mut session = EditorSession::default();
        session.set_tool(ToolKind::Hand);
        let session = drag(session, Point::new(10.0, 10.0), Point::new(40.0, 30.0));
        assert_eq!(session.camera.offset, Vec2::new(30.0, 20.0));
        assert_eq!(session.tools.current_tool, ToolKind::Hand);

        let session = session
            .transition(EditorEvent::PointerDown {
                position: Point::ZERO,
                button: MouseButton::Middle,
                modifiers: Modifiers::NONE,
            })
            .transition(EditorEvent::moved(Point::new(-30.0, -20.0)))
            .transition(EditorEvent::PointerUp {
                position: Point::new(-30.0, -20.0),
                button: MouseButton::Middle,
            });
        assert_eq!(session.camera.offset, Vec2::ZERO);

        let session = session.transition(EditorEvent::Wheel {
            delta: Vec2::new(0.0, -1.0),
            modifiers: Modifiers::CTRL,
        });
        assert!((session.camera.zoom - ZOOM_STEP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_keyboard_commands() {
        let a = rect(0.0, 0.0, 50.0, 50.0);
        let b = rect(100.0, 0.0, 50.0, 50.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let session = session_with(vec![a, b])
            .transition(EditorEvent::key_with(Key::Character('a'), Modifiers::CTRL))
            .transition(EditorEvent::key_with(Key::ArrowRight, Modifiers::SHIFT))
            .transition(EditorEvent::key(Key::ArrowDown))
            .transition(EditorEvent::key_with(Key::Character('g'), Modifiers::CTRL));

        let a = session.store.get_shape(&a_id).unwrap();
        let b = session.store.get_shape(&b_id).unwrap();
        assert_eq!(a.position(), Point::new(10.0, 1.0));
        assert!(a.group_id.is_some());
        assert_eq!(a.group_id, b.group_id);

        let session = session.transition(EditorEvent::key(Key::Delete));
        assert!(session.store.is_empty());
        assert!(session.selection.is_empty());
    }

    #[test]
    fn test_duplicate() {
        let mut original = node("A", 0.0, 0.0);
        original.group_id = Some(GroupId::new());
        if let Some(n) = original.as_protocol_node_mut() {
            n.operation.id = Some("op-a".to_string());
        }
        let id = original.id().clone();
        let mut session = session_with(vec![original]);
        session.selection.set([id.clone()]);

        let copies = session.duplicate_selected();
        assert_eq!(copies.len(), 1);
        assert_eq!(session.selection.ids(), copies.as_slice());
        let copy = session.store.get_shape(&copies[0]).unwrap();
        assert_ne!(copy.id(), &id);
        assert_eq!(copy.position(), Point::new(20.0, 20.0));
        assert!(copy.group_id.is_none());
        assert!(copy.as_protocol_node().unwrap().operation.id.is_none());
    }

    #[test]
    fn test_z_order_commands() {
        let shapes: Vec<Shape> = (0..3).map(|i| rect(i as f64, 0.0, 1.0, 1.0)).collect();
        let ids: Vec<ShapeId> = shapes.iter().map(|s| s.id().clone()).collect();
        let order = |idx: [usize; 3]| idx.map(|i| ids[i].clone()).to_vec();
        let mut session = session_with(shapes);

        session.selection.set([ids[0].clone(), ids[1].clone()]);
        session.bring_forward();
        assert_eq!(session.store.ids(), order([2, 0, 1]));
        session.send_to_back();
        assert_eq!(session.store.ids(), order([0, 1, 2]));
        session.bring_to_front();
        assert_eq!(session.store.ids(), order([2, 0, 1]));
    }

    #[test]
    fn test_text_edit_commit_and_cancel() {
        let shape = rect(0.0, 0.0, 100.0, 100.0);
        let id = shape.id().clone();
        let double_click = EditorEvent::DoubleClick {
            position: Point::new(50.0, 50.0),
        };
        let text_of = |session: &EditorSession| session.store.get_shape(&id).unwrap().text.clone();

        let session = session_with(vec![shape])
            .transition(double_click.clone())
            .transition(EditorEvent::key(Key::Character('H')))
            .transition(EditorEvent::key(Key::Character('i')));
        assert_eq!(session.text_edit().map(|e| e.buffer.as_str()), Some("Hi"));

        // Delete is typed into the editor, not run as a command.
        let session = session
            .transition(EditorEvent::key(Key::Delete))
            .transition(EditorEvent::key(Key::Enter));
        assert!(session.text_edit().is_none());
        assert_eq!(text_of(&session), "Hi");

        let session = session
            .transition(double_click.clone())
            .transition(EditorEvent::EditText("Other".to_string()))
            .transition(EditorEvent::key(Key::Escape));
        assert_eq!(text_of(&session), "Hi");

        let session = session
            .transition(double_click)
            .transition(EditorEvent::EditText("Blurred".to_string()))
            .transition(EditorEvent::Blur);
        assert_eq!(text_of(&session), "Blurred");
    }

    #[test]
    fn test_import_replaces_store_and_clears_selection() {
        let old = rect(0.0, 0.0, 10.0, 10.0);
        let old_id = old.id().clone();
        let mut session = session_with(vec![old]);
        session.selection.set([old_id.clone()]);

        let json = r#"{
            "nodes": [
                {"id": "a", "type": "mix", "label": "Mix"},
                {"id": "b", "type": "spin", "label": "Spin"}
            ],
            "connections": [{"from": "a", "to": "b"}]
        }"#;
        let count = session.import_json(json).unwrap();
        assert_eq!(count, 3);
        assert!(session.selection.is_empty());
        assert!(!session.store.contains(&old_id));
    }

    #[test]
    fn test_failed_import_leaves_store_untouched() {
        let old = rect(0.0, 0.0, 10.0, 10.0);
        let mut session = session_with(vec![old.clone()]);
        session.selection.set([old.id().clone()]);

        assert!(matches!(session.import_json("{"), Err(ProtocolError::Parse(_))));
        assert!(matches!(
            session.import_json(r#"{"nodes":[]}"#),
            Err(ProtocolError::EmptyDocument)
        ));
        assert_eq!(session.store.shapes(), &[old.clone()]);
        assert_eq!(session.selection.ids(), &[old.id().clone()]);
    }

    #[test]
    fn test_import_extracted() {
        let mut session = EditorSession::default();
        let bytes = br#"{"nodes":[{"id":"a","type":"mix","label":"Mix"}]}"#;
        let imported = session.import_extracted(&JsonExtractor, bytes, "p.json", None);
        assert_eq!(block_on(imported).unwrap(), 1);

        let err = block_on(session.import_extracted(&JsonExtractor, b"{", "p.json", None));
        assert!(matches!(err, Err(ProtocolError::Extraction(_))));
        assert_eq!(session.store.len(), 1);
    }

    #[test]
    fn test_save_does_not_mutate() {
        let session = session_with(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let before = session.store.clone();
        let storage = MemoryStorage::new();

        let id = block_on(session.save_to(&storage, None)).unwrap();
        assert_eq!(block_on(storage.load(&id)).unwrap(), before.shapes().to_vec());
        assert_eq!(session.store, before);
    }

    #[test]
    fn test_drop_protocol_and_assets() {
        let mut session = EditorSession::default();
        let created = session
            .drop_item(
                DROP_MIME,
                r#"{"kind":"protocol","id":"tpl-1","name":"Centrifuge","operationType":"centrifuge"}"#,
                Point::new(10.0, 10.0),
            )
            .unwrap();
        let DropOutcome::Created(node_id) = created else {
            panic!("expected a new node");
        };
        let node = session.store.get_shape(&node_id).unwrap();
        assert_eq!(node.label(), "Centrifuge");
        assert_eq!(node.as_protocol_node().unwrap().operation.op_type, "centrifuge");

        let linked = session.drop_item(
            DROP_MIME,
            r#"{"kind":"inventory","id":"inv-9","name":"Buffer"}"#,
            Point::new(50.0, 50.0),
        );
        assert_eq!(
            linked,
            Some(DropOutcome::Linked {
                node_id: node_id.clone(),
                object_id: "inv-9".to_string()
            })
        );
        let node = session.store.get_shape(&node_id).unwrap();
        let objects = &node.as_protocol_node().unwrap().operation.objects;
        assert_eq!(objects, &vec!["inv-9".to_string()]);

        let placed = session.drop_item(
            DROP_MIME,
            r#"{"kind":"equipment","id":"eq-1","name":"Shaker"}"#,
            Point::new(900.0, 900.0),
        );
        let Some(DropOutcome::Created(asset_id)) = placed else {
            panic!("expected an asset shape");
        };
        let asset = session.store.get_shape(&asset_id).unwrap();
        assert_eq!(asset.as_asset().unwrap().linked_entity_id.as_deref(), Some("eq-1"));
        assert_eq!(asset.text, "Shaker");
    }

    #[test]
    fn test_protocol_drop_defaults_operation_type() {
        let mut session = EditorSession::default();
        let Some(DropOutcome::Created(id)) =
            session.drop_item(DROP_MIME, r#"{"kind":"protocol","id":"p"}"#, Point::ZERO)
        else {
            panic!("expected a new node");
        };
        let shape = session.store.get_shape(&id).unwrap();
        let op = &shape.as_protocol_node().unwrap().operation;
        assert_eq!(op.op_type, "generic");
        assert_eq!(op.label, "p");
    }

    #[test]
    fn test_malformed_drop_creates_nothing() {
        let mut session = EditorSession::default();
        assert!(session.drop_item(DROP_MIME, "garbage", Point::ZERO).is_none());
        let wrong_tag = r#"{"kind":"asset","id":"a"}"#;
        assert!(session.drop_item("text/plain", wrong_tag, Point::ZERO).is_none());
        assert!(session.store.is_empty());
    }

    #[test]
    fn test_connector_endpoint_resize_rebinds() {
        let a = node("A", 0.0, 0.0);
        let b = node("B", 400.0, 0.0);
        let c = node("C", 400.0, 300.0);
        let (a_id, c_id) = (a.id().clone(), c.id().clone());
        let mut arrow = Shape::new(
            ShapeKind::Arrow(Connector::new(ConnectorKind::Arrow)),
            0.0,
            0.0,
            0.0,
            0.0,
        );
        arrow.set_endpoints(Point::new(100.0, 50.0), Point::new(500.0, 50.0));
        let arrow_id = arrow.id().clone();
        let mut session = session_with(vec![a, b, c, arrow]);
        session.selection.set([arrow_id.clone()]);

        let session = drag(session, Point::new(500.0, 50.0), Point::new(500.0, 350.0));
        let connector = session.store.get_shape(&arrow_id).unwrap().connector().unwrap();
        assert_eq!(connector.edge(), Some((&a_id, &c_id)));
    }
}
