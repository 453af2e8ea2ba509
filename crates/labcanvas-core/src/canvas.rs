//! Shape store: the ordered shape list of a diagram.
//!
//! Store order is paint order: index 0 is painted first (bottom), the last
//! shape is painted last (top).

use crate::shapes::{GroupId, Shape, ShapeId, rect_contains_closed};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised when mutating the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Shape id already present: {0}")]
    DuplicateId(ShapeId),
}

/// An ordered, id-unique collection of shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeStore {
    shapes: Vec<Shape>,
}

impl ShapeStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a loaded shape list. Later duplicates of an id
    /// are dropped.
    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(shapes.len());
        for shape in shapes {
            if seen.insert(shape.id().clone()) {
                kept.push(shape);
            } else {
                log::warn!("Dropping shape with duplicate id {}", shape.id());
            }
        }
        Self { shapes: kept }
    }

    /// Add a shape on top of the paint order.
    pub fn add_shape(&mut self, shape: Shape) -> Result<(), StoreError> {
        if self.contains(shape.id()) {
            return Err(StoreError::DuplicateId(shape.id().clone()));
        }
        self.shapes.push(shape);
        Ok(())
    }

    /// Remove a shape from the store.
    pub fn remove_shape(&mut self, id: &ShapeId) -> Option<Shape> {
        let index = self.index_of(id)?;
        Some(self.shapes.remove(index))
    }

    /// Replace every shape at once.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) {
        *self = Self::from_shapes(shapes);
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id() == id)
    }

    pub fn get_shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn get_shape_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    /// Shapes in paint order (back to front).
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    pub fn ids(&self) -> Vec<ShapeId> {
        self.shapes.iter().map(|s| s.id().clone()).collect()
    }

    pub fn into_shapes(self) -> Vec<Shape> {
        self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Move the given shapes to the top of the paint order, keeping their
    /// relative order.
    pub fn bring_to_front(&mut self, ids: &[ShapeId]) {
        let (mut moved, rest): (Vec<Shape>, Vec<Shape>) =
            self.shapes.drain(..).partition(|s| ids.contains(s.id()));
        self.shapes = rest;
        self.shapes.append(&mut moved);
    }

    /// Move the given shapes to the bottom of the paint order, keeping
    /// their relative order.
    pub fn send_to_back(&mut self, ids: &[ShapeId]) {
        let (mut moved, mut rest): (Vec<Shape>, Vec<Shape>) =
            self.shapes.drain(..).partition(|s| ids.contains(s.id()));
        moved.append(&mut rest);
        self.shapes = moved;
    }

    /// Move a shape one layer forward (towards front).
    /// Returns true if the shape was moved, false if already at front.
    pub fn bring_forward(&mut self, id: &ShapeId) -> bool {
        if let Some(pos) = self.index_of(id) {
            if pos + 1 < self.shapes.len() {
                self.shapes.swap(pos, pos + 1);
                return true;
            }
        }
        false
    }

    /// Move a shape one layer backward (towards back).
    /// Returns true if the shape was moved, false if already at back.
    pub fn send_backward(&mut self, id: &ShapeId) -> bool {
        if let Some(pos) = self.index_of(id) {
            if pos > 0 {
                self.shapes.swap(pos, pos - 1);
                return true;
            }
        }
        false
    }

    /// Get the bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .map(Shape::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Topmost shape hit at a canvas point.
    pub fn shape_at_point(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.hit_test(point, tolerance))
            .map(|s| s.id().clone())
    }

    /// Shapes whose normalized bounds overlap `rect` (edges inclusive),
    /// in paint order.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        self.shapes
            .iter()
            .filter(|s| s.intersects_rect(rect))
            .map(|s| s.id().clone())
            .collect()
    }

    /// Topmost protocol node whose normalized bounds contain `point`.
    ///
    /// This is the single query used for connector binding, export edge
    /// derivation and drop targeting.
    pub fn node_at(&self, point: Point) -> Option<&Shape> {
        node_at(&self.shapes, point)
    }

    /// Ids of every shape sharing `group_id`, in paint order.
    pub fn group_members(&self, group_id: &GroupId) -> Vec<ShapeId> {
        self.shapes
            .iter()
            .filter(|s| s.group_id.as_ref() == Some(group_id))
            .map(|s| s.id().clone())
            .collect()
    }

    /// Re-resolve a connector's node binding from its endpoint geometry.
    pub fn rebind_connector(&mut self, id: &ShapeId) {
        let Some(shape) = self.get_shape(id) else { return };
        if !shape.is_connector() {
            return;
        }
        let from = self.node_at(shape.start()).map(|n| n.id().clone());
        let to = self.node_at(shape.end()).map(|n| n.id().clone());
        if let Some(connector) = self.get_shape_mut(id).and_then(Shape::connector_mut) {
            connector.from_node_id = from;
            connector.to_node_id = to;
        }
    }

    /// Serialize the shape list to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a shape list from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let shapes: Vec<Shape> = serde_json::from_str(json)?;
        Ok(Self::from_shapes(shapes))
    }
}

/// Topmost protocol node in `shapes` whose normalized bounds contain `point`.
pub fn node_at(shapes: &[Shape], point: Point) -> Option<&Shape> {
    shapes
        .iter()
        .rev()
        .filter(|s| s.is_protocol_node())
        .find(|s| rect_contains_closed(s.bounds(), point))
}
