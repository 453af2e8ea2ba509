//! Pointer interaction state machine.
//!
//! One interaction is active at a time. Every pointer-up returns to
//! [`Interaction::None`].

use crate::editor::EditorSession;
use crate::input::{Modifiers, MouseButton};
use crate::selection::{ResizeState, hit_test_handles, resolve_group};
use crate::shapes::ShapeId;
use crate::snap::snap_point;
use crate::tools::ToolKind;
use kurbo::{Point, Rect, Vec2};

/// Discriminant of the active interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionMode {
    None,
    Drawing,
    Moving,
    Resizing,
    Panning,
    SelectingArea,
}

/// The active pointer interaction and the data it carries between events.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interaction {
    #[default]
    None,
    /// A freshly created shape follows the pointer from `anchor`.
    Drawing { shape_id: ShapeId, anchor: Point },
    /// The selection is dragged. `lead` is the clicked shape; `grab_offset`
    /// is the pointer's offset from its origin at grab time.
    Moving {
        lead: ShapeId,
        grab_offset: Vec2,
        last: Point,
    },
    Resizing(ResizeState),
    /// Camera pan; `last` is in screen coordinates.
    Panning { last: Point },
    /// Marquee selection in canvas coordinates.
    SelectingArea { anchor: Point, current: Point },
}

impl Interaction {
    pub fn mode(&self) -> InteractionMode {
        match self {
            Interaction::None => InteractionMode::None,
            Interaction::Drawing { .. } => InteractionMode::Drawing,
            Interaction::Moving { .. } => InteractionMode::Moving,
            Interaction::Resizing(_) => InteractionMode::Resizing,
            Interaction::Panning { .. } => InteractionMode::Panning,
            Interaction::SelectingArea { .. } => InteractionMode::SelectingArea,
        }
    }

    /// The marquee rectangle while selecting an area.
    pub fn marquee(&self) -> Option<Rect> {
        match self {
            Interaction::SelectingArea { anchor, current } => {
                Some(Rect::from_points(*anchor, *current))
            }
            _ => None,
        }
    }
}

impl EditorSession {
    pub(crate) fn snapped(&self, point: Point) -> Point {
        snap_point(point, self.snap_to_grid, self.config.grid_size)
    }

    /// Hit radius in canvas units for the current zoom.
    pub(crate) fn hit_tolerance(&self) -> f64 {
        self.config.hit_tolerance / self.camera.zoom
    }

    pub(crate) fn on_pointer_down(
        &mut self,
        screen: Point,
        button: MouseButton,
        modifiers: Modifiers,
    ) {
        self.commit_text_edit();

        if button == MouseButton::Middle || self.tools.current_tool == ToolKind::Hand {
            self.set_interaction(Interaction::Panning { last: screen });
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        let pos = self.camera.screen_to_world(screen);
        if self.tools.current_tool.is_drawing() {
            self.begin_drawing(pos);
            return;
        }

        if let Some(state) = self.grabbed_handle(pos) {
            self.set_interaction(Interaction::Resizing(state));
            return;
        }

        let Some(hit) = self.store.shape_at_point(pos, self.hit_tolerance()) else {
            if !modifiers.shift {
                self.selection.clear();
            }
            self.set_interaction(Interaction::SelectingArea {
                anchor: pos,
                current: pos,
            });
            return;
        };

        let Some(shape) = self.store.get_shape(&hit) else { return };
        if shape.locked {
            self.selection.set([hit]);
            return;
        }
        let origin = shape.position();

        let targets = resolve_group(&self.store, &hit);
        if modifiers.shift {
            if !self.selection.toggle(&hit, &targets) {
                return;
            }
        } else if !self.selection.contains(&hit) {
            self.selection.set(targets);
        }

        self.set_interaction(Interaction::Moving {
            lead: hit,
            grab_offset: pos - origin,
            last: pos,
        });
    }

    fn begin_drawing(&mut self, pos: Point) {
        let anchor = self.snapped(pos);
        let Some(shape) = self.tools.create_shape(anchor) else { return };
        let shape_id = shape.id().clone();
        if let Err(e) = self.store.add_shape(shape) {
            log::warn!("Could not add new shape: {}", e);
            return;
        }
        self.selection.set([shape_id.clone()]);
        self.set_interaction(Interaction::Drawing { shape_id, anchor });
    }

    /// A resize handle of the single selected, unlocked shape under `pos`.
    fn grabbed_handle(&self, pos: Point) -> Option<ResizeState> {
        let shape = self.store.get_shape(self.selection.single()?)?;
        if shape.locked {
            return None;
        }
        let handle = hit_test_handles(shape, pos, self.hit_tolerance())?;
        Some(ResizeState::begin(shape, handle))
    }

    pub(crate) fn on_pointer_move(&mut self, screen: Point) {
        let pos = self.camera.screen_to_world(screen);
        match std::mem::take(&mut self.interaction) {
            Interaction::None => {}
            Interaction::Drawing { shape_id, anchor } => {
                let current = self.snapped(pos);
                if let Some(shape) = self.store.get_shape_mut(&shape_id) {
                    shape.width = current.x - anchor.x;
                    shape.height = current.y - anchor.y;
                }
                self.interaction = Interaction::Drawing { shape_id, anchor };
            }
            Interaction::Moving {
                lead,
                grab_offset,
                last,
            } => {
                let delta = if self.snap_to_grid {
                    let lead_origin = self.store.get_shape(&lead).map(|s| s.position());
                    lead_origin.map(|origin| self.snapped(pos - grab_offset) - origin)
                } else {
                    Some(pos - last)
                };
                if let Some(delta) = delta {
                    self.translate_selection(delta);
                }
                self.interaction = Interaction::Moving {
                    lead,
                    grab_offset,
                    last: pos,
                };
            }
            Interaction::Resizing(state) => {
                let target = self.snapped(pos);
                if let Some(shape) = self.store.get_shape_mut(&state.shape_id) {
                    state.apply(shape, target);
                }
                self.interaction = Interaction::Resizing(state);
            }
            Interaction::Panning { last } => {
                self.camera.pan(screen - last);
                self.interaction = Interaction::Panning { last: screen };
            }
            Interaction::SelectingArea { anchor, .. } => {
                self.interaction = Interaction::SelectingArea { anchor, current: pos };
            }
        }
    }

    pub(crate) fn on_pointer_up(&mut self, screen: Point) {
        let pos = self.camera.screen_to_world(screen);
        match self.interaction.clone() {
            Interaction::None | Interaction::Panning { .. } => {}
            Interaction::Drawing { shape_id, .. } => {
                self.store.rebind_connector(&shape_id);
                if let Some(shape) = self.store.get_shape(&shape_id) {
                    log::debug!(
                        "Drew {} {} ({:.0}x{:.0})",
                        shape.kind.type_name(),
                        shape_id,
                        shape.width,
                        shape.height
                    );
                }
                if self.tools.current_tool.is_one_shot() {
                    self.tools.set_tool(ToolKind::Select);
                }
            }
            Interaction::Moving { .. } => {
                let moved = self.selection.ids().to_vec();
                self.rebind_connectors(&moved);
            }
            Interaction::Resizing(state) => {
                self.store.rebind_connector(&state.shape_id);
            }
            Interaction::SelectingArea { anchor, .. } => {
                let hits = self.store.shapes_in_rect(Rect::from_points(anchor, pos));
                self.selection.extend(hits);
            }
        }
        self.set_interaction(Interaction::None);
    }

    /// Translate every unlocked selected shape.
    pub(crate) fn translate_selection(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        for id in self.selection.ids() {
            if let Some(shape) = self.store.get_shape_mut(id) {
                if !shape.locked {
                    shape.translate(delta);
                }
            }
        }
    }

    fn set_interaction(&mut self, interaction: Interaction) {
        if interaction.mode() != self.interaction.mode() {
            log::debug!(
                "Interaction: {:?} -> {:?}",
                self.interaction.mode(),
                interaction.mode()
            );
        }
        self.interaction = interaction;
    }
}
