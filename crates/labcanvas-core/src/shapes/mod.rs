//! Shape definitions for the diagram canvas.
//!
//! Every shape shares a geometry/style base ([`Shape`]) and carries a
//! [`ShapeKind`] variant holding only the data meaningful to its type.

mod asset;
mod connector;
mod protocol;

pub use asset::{AssetRef, AssetType, LinkedEntity};
pub use connector::{Connector, ConnectorKind, EndMarker};
pub use protocol::{ParameterValue, ProtocolNode, UnitOperation};

use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for shapes.
///
/// Ids are opaque strings. Fresh ones are UUID v4, but stored diagrams may
/// carry any unique string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Mint a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier shared by shapes that move and select together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke style for outlines and connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Horizontal text alignment inside a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical text alignment inside a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Stroke width.
    pub stroke_width: f64,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

fn default_font_size() -> f64 {
    14.0
}

impl ShapeStyle {
    /// Set the stroke color from a peniko Color.
    pub fn set_stroke(&mut self, color: Color) {
        self.stroke_color = color.into();
    }

    /// Set the fill color from a peniko Color.
    pub fn set_fill(&mut self, color: Option<Color>) {
        self.fill_color = color.map(|c| c.into());
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            fill_color: None,
            stroke_width: 2.0,
            line_style: LineStyle::default(),
            text_align: TextAlign::default(),
            vertical_align: VerticalAlign::default(),
            font_size: default_font_size(),
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

/// Type-specific data of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    Rect,
    Circle,
    Triangle,
    Diamond,
    Hexagon,
    Star,
    Text,
    Line(Connector),
    Arrow(Connector),
    Elbow(Connector),
    Curve(Connector),
    Asset(AssetRef),
    ProtocolNode(ProtocolNode),
}

impl ShapeKind {
    /// Stable type name used in logs and the wire format.
    pub fn type_name(&self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Circle => "circle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Hexagon => "hexagon",
            ShapeKind::Star => "star",
            ShapeKind::Text => "text",
            ShapeKind::Line(_) => "line",
            ShapeKind::Arrow(_) => "arrow",
            ShapeKind::Elbow(_) => "elbow",
            ShapeKind::Curve(_) => "curve",
            ShapeKind::Asset(_) => "asset",
            ShapeKind::ProtocolNode(_) => "protocol_node",
        }
    }

    /// Build a connector variant of the given kind.
    pub fn connector(kind: ConnectorKind, connector: Connector) -> Self {
        match kind {
            ConnectorKind::Line => ShapeKind::Line(connector),
            ConnectorKind::Arrow => ShapeKind::Arrow(connector),
            ConnectorKind::Elbow => ShapeKind::Elbow(connector),
            ConnectorKind::Curve => ShapeKind::Curve(connector),
        }
    }
}

/// A single diagram primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub(crate) id: ShapeId,
    pub x: f64,
    pub y: f64,
    /// May be negative while a drag has not been normalized.
    pub width: f64,
    /// May be negative while a drag has not been normalized.
    pub height: f64,
    #[serde(default)]
    pub style: ShapeStyle,
    /// Free text shown inside the shape.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a new shape with a fresh id.
    pub fn new(kind: ShapeKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::with_id(ShapeId::new(), kind, x, y, width, height)
    }

    /// Create a shape with a specific id (for storage and import).
    pub fn with_id(id: ShapeId, kind: ShapeKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            style: ShapeStyle::default(),
            text: String::new(),
            locked: false,
            group_id: None,
            kind,
        }
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    /// Replace the id with a fresh unique one (used when duplicating).
    pub fn regenerate_id(&mut self) {
        self.id = ShapeId::new();
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Bounds with non-negative width and height.
    pub fn bounds(&self) -> Rect {
        let (x0, w) = normalize_span(self.x, self.width);
        let (y0, h) = normalize_span(self.y, self.height);
        Rect::new(x0, y0, x0 + w, y0 + h)
    }

    /// Rewrite the geometry so width and height are non-negative.
    pub fn normalize(&mut self) {
        let bounds = self.bounds();
        self.x = bounds.x0;
        self.y = bounds.y0;
        self.width = bounds.width();
        self.height = bounds.height();
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// First endpoint of a connector; the origin for other shapes.
    pub fn start(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Second endpoint of a connector; the far corner for other shapes.
    pub fn end(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Set both connector endpoints at once.
    pub fn set_endpoints(&mut self, start: Point, end: Point) {
        self.x = start.x;
        self.y = start.y;
        self.width = end.x - start.x;
        self.height = end.y - start.y;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn is_connector(&self) -> bool {
        self.connector().is_some()
    }

    pub fn connector(&self) -> Option<&Connector> {
        match &self.kind {
            ShapeKind::Line(c)
            | ShapeKind::Arrow(c)
            | ShapeKind::Elbow(c)
            | ShapeKind::Curve(c) => Some(c),
            _ => None,
        }
    }

    pub fn connector_mut(&mut self) -> Option<&mut Connector> {
        match &mut self.kind {
            ShapeKind::Line(c)
            | ShapeKind::Arrow(c)
            | ShapeKind::Elbow(c)
            | ShapeKind::Curve(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_protocol_node(&self) -> bool {
        matches!(self.kind, ShapeKind::ProtocolNode(_))
    }

    pub fn as_protocol_node(&self) -> Option<&ProtocolNode> {
        match &self.kind {
            ShapeKind::ProtocolNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_protocol_node_mut(&mut self) -> Option<&mut ProtocolNode> {
        match &mut self.kind {
            ShapeKind::ProtocolNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&AssetRef> {
        match &self.kind {
            ShapeKind::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    /// Text shown for the shape. Protocol nodes display their operation label.
    pub fn label(&self) -> &str {
        match &self.kind {
            ShapeKind::ProtocolNode(node) => &node.operation.label,
            _ => &self.text,
        }
    }

    /// Set the displayed text, routing protocol nodes to their operation label.
    pub fn set_label(&mut self, text: String) {
        match &mut self.kind {
            ShapeKind::ProtocolNode(node) => node.operation.label = text,
            _ => self.text = text,
        }
    }

    /// Check if a point (in canvas coordinates) hits this shape.
    ///
    /// Connectors are hit along their segment; everything else by its
    /// normalized bounds inflated by `tolerance`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.is_connector() {
            let reach = tolerance + self.style.stroke_width / 2.0;
            return point_to_segment_dist(point, self.start(), self.end()) <= reach;
        }
        rect_contains_closed(self.bounds().inflate(tolerance, tolerance), point)
    }

    /// Closed-interval overlap between the normalized bounds and `rect`.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        rects_overlap_closed(self.bounds(), rect)
    }
}

/// Normalize an (origin, extent) pair so the extent is non-negative.
pub fn normalize_span(origin: f64, extent: f64) -> (f64, f64) {
    if extent < 0.0 {
        (origin + extent, -extent)
    } else {
        (origin, extent)
    }
}

/// Point-in-rect test that includes the boundary on every side.
pub fn rect_contains_closed(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Rect overlap test where touching edges count as overlapping.
pub fn rects_overlap_closed(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}
