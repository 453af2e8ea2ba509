//! Selection and manipulation handle system.

use crate::canvas::ShapeStore;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// The ordered set of selected shape ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ShapeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ShapeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// The single selected id, if exactly one shape is selected.
    pub fn single(&self) -> Option<&ShapeId> {
        match self.ids.as_slice() {
            [id] => Some(id),
            _ => None,
        }
    }

    /// Replace the selection.
    pub fn set(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        self.ids.clear();
        self.extend(ids);
    }

    /// Add ids not already selected.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = ShapeId>) {
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn remove(&mut self, ids: &[ShapeId]) {
        self.ids.retain(|id| !ids.contains(id));
    }

    /// Shift-click semantics over a resolved target set: remove the targets
    /// when the clicked shape is already selected, otherwise add them.
    /// Returns true when the targets end up selected.
    pub fn toggle(&mut self, clicked: &ShapeId, targets: &[ShapeId]) -> bool {
        if self.contains(clicked) {
            self.remove(targets);
            false
        } else {
            self.extend(targets.iter().cloned());
            true
        }
    }

    /// Drop ids that no longer exist in the store.
    pub fn retain_existing(&mut self, store: &ShapeStore) {
        self.ids.retain(|id| store.contains(id));
    }
}

/// Expand a shape id to every member of its group.
pub fn resolve_group(store: &ShapeStore, id: &ShapeId) -> Vec<ShapeId> {
    match store.get_shape(id).and_then(|s| s.group_id.as_ref()) {
        Some(group_id) => store.group_members(group_id),
        None => vec![id.clone()],
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    Nw,
    Ne,
    Sw,
    Se,
    /// Connector start point.
    Start,
    /// Connector end point.
    End,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Get the selection handles for a shape.
pub fn get_handles(shape: &Shape) -> Vec<Handle> {
    if shape.is_connector() {
        return vec![
            Handle::new(shape.start(), HandleKind::Start),
            Handle::new(shape.end(), HandleKind::End),
        ];
    }
    corner_handles(shape.bounds())
}

fn corner_handles(bounds: Rect) -> Vec<Handle> {
    vec![
        Handle::new(Point::new(bounds.x0, bounds.y0), HandleKind::Nw),
        Handle::new(Point::new(bounds.x1, bounds.y0), HandleKind::Ne),
        Handle::new(Point::new(bounds.x0, bounds.y1), HandleKind::Sw),
        Handle::new(Point::new(bounds.x1, bounds.y1), HandleKind::Se),
    ]
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(shape: &Shape, point: Point, tolerance: f64) -> Option<HandleKind> {
    get_handles(shape)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// State of an active resize on a single shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    pub shape_id: ShapeId,
    pub handle: HandleKind,
    /// The point that stays put: the opposite corner, or the other
    /// connector endpoint.
    pub anchor: Point,
}

impl ResizeState {
    /// Capture the fixed anchor for a handle grab.
    pub fn begin(shape: &Shape, handle: HandleKind) -> Self {
        let bounds = shape.bounds();
        let anchor = match handle {
            HandleKind::Nw => Point::new(bounds.x1, bounds.y1),
            HandleKind::Ne => Point::new(bounds.x0, bounds.y1),
            HandleKind::Sw => Point::new(bounds.x1, bounds.y0),
            HandleKind::Se => Point::new(bounds.x0, bounds.y0),
            HandleKind::Start => shape.end(),
            HandleKind::End => shape.start(),
        };
        Self {
            shape_id: shape.id().clone(),
            handle,
            anchor,
        }
    }

    /// Move the grabbed handle to `point`. Locked shapes are left alone.
    pub fn apply(&self, shape: &mut Shape, point: Point) {
        if shape.locked {
            return;
        }
        match self.handle {
            HandleKind::Start => shape.set_endpoints(point, self.anchor),
            HandleKind::End => shape.set_endpoints(self.anchor, point),
            HandleKind::Nw | HandleKind::Ne | HandleKind::Sw | HandleKind::Se => {
                let rect = Rect::from_points(self.anchor, point);
                shape.x = rect.x0;
                shape.y = rect.y0;
                shape.width = rect.width();
                shape.height = rect.height();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Connector, ConnectorKind, GroupId, ShapeKind};

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::new(ShapeKind::Rect, x, y, w, h)
    }

    #[test]
    fn test_rectangle_handles() {
        let handles = get_handles(&rect(0.0, 0.0, 100.0, 50.0));
        assert_eq!(handles.len(), 4);
        assert_eq!(handles[3].kind, HandleKind::Se);
        assert_eq!(handles[3].position, Point::new(100.0, 50.0));
    }

    #[test]
    fn test_connector_handles() {
        let line = Shape::new(
            ShapeKind::Line(Connector::new(ConnectorKind::Line)),
            10.0,
            10.0,
            90.0,
            -10.0,
        );
        let end = hit_test_handles(&line, Point::new(101.0, 1.0), 4.0);
        let start = hit_test_handles(&line, Point::new(10.0, 10.0), 4.0);
        assert_eq!(end, Some(HandleKind::End));
        assert_eq!(start, Some(HandleKind::Start));
        assert_eq!(hit_test_handles(&line, Point::new(50.0, 50.0), 4.0), None);
    }

    #[test]
    fn test_corner_resize_keeps_opposite_fixed() {
        let mut shape = rect(0.0, 0.0, 100.0, 100.0);
        let state = ResizeState::begin(&shape, HandleKind::Se);
        state.apply(&mut shape, Point::new(150.0, 120.0));
        assert_eq!(shape.bounds(), Rect::new(0.0, 0.0, 150.0, 120.0));

        // Dragging past the anchor flips without moving it.
        state.apply(&mut shape, Point::new(-20.0, -10.0));
        assert_eq!(shape.bounds(), Rect::new(-20.0, -10.0, 0.0, 0.0));
        assert!(shape.width >= 0.0 && shape.height >= 0.0);
    }

    #[test]
    fn test_nw_resize() {
        let mut shape = rect(10.0, 10.0, 100.0, 100.0);
        let state = ResizeState::begin(&shape, HandleKind::Nw);
        state.apply(&mut shape, Point::new(50.0, 60.0));
        assert_eq!(shape.bounds(), Rect::new(50.0, 60.0, 110.0, 110.0));
    }

    #[test]
    fn test_resize_locked_is_noop() {
        let mut shape = rect(0.0, 0.0, 100.0, 100.0);
        shape.locked = true;
        let before = shape.clone();
        let state = ResizeState::begin(&shape, HandleKind::Se);
        state.apply(&mut shape, Point::new(300.0, 300.0));
        assert_eq!(shape, before);
    }

    #[test]
    fn test_toggle_semantics() {
        let a = ShapeId::new();
        let b = ShapeId::new();
        let mut selection = Selection::new();
        selection.set([a.clone()]);
        assert!(selection.toggle(&b, &[b.clone()]));
        assert_eq!(selection.ids(), &[a.clone(), b.clone()]);
        assert!(!selection.toggle(&a, &[a.clone()]));
        assert_eq!(selection.ids(), &[b]);
    }

    #[test]
    fn test_resolve_group() {
        let group = GroupId::new();
        let mut a = rect(0.0, 0.0, 10.0, 10.0);
        let mut b = rect(20.0, 0.0, 10.0, 10.0);
        let c = rect(40.0, 0.0, 10.0, 10.0);
        a.group_id = Some(group.clone());
        b.group_id = Some(group);
        let (a_id, b_id, c_id) = (a.id().clone(), b.id().clone(), c.id().clone());
        let store = ShapeStore::from_shapes(vec![a, b, c]);

        assert_eq!(resolve_group(&store, &b_id), vec![a_id, b_id]);
        assert_eq!(resolve_group(&store, &c_id), vec![c_id]);
    }

    #[test]
    fn test_retain_existing_drops_removed_ids() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(20.0, 0.0, 10.0, 10.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        let mut store = ShapeStore::from_shapes(vec![a, b]);
        let mut selection = Selection::new();
        selection.set([a_id.clone(), b_id.clone()]);

        store.remove_shape(&a_id);
        selection.retain_existing(&store);
        assert_eq!(selection.ids(), &[b_id]);
    }
}
