//! Tool system for the diagram editor.

use crate::shapes::{
    AssetRef, Connector, ConnectorKind, ProtocolNode, Shape, ShapeKind, ShapeStyle, UnitOperation,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Hand,
    Rect,
    Circle,
    Triangle,
    Diamond,
    Hexagon,
    Star,
    Text,
    Line,
    Arrow,
    Elbow,
    Curve,
    Asset,
    ProtocolNode,
}

impl ToolKind {
    /// Whether the tool draws a new shape on pointer-down.
    pub fn is_drawing(self) -> bool {
        !matches!(self, ToolKind::Select | ToolKind::Hand)
    }

    /// Drawing tools revert to select after one shape; hand stays active.
    pub fn is_one_shot(self) -> bool {
        self.is_drawing()
    }

    /// The shape variant this tool draws.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        let kind = match self {
            ToolKind::Select | ToolKind::Hand => return None,
            ToolKind::Rect => ShapeKind::Rect,
            ToolKind::Circle => ShapeKind::Circle,
            ToolKind::Triangle => ShapeKind::Triangle,
            ToolKind::Diamond => ShapeKind::Diamond,
            ToolKind::Hexagon => ShapeKind::Hexagon,
            ToolKind::Star => ShapeKind::Star,
            ToolKind::Text => ShapeKind::Text,
            ToolKind::Line => connector(ConnectorKind::Line),
            ToolKind::Arrow => connector(ConnectorKind::Arrow),
            ToolKind::Elbow => connector(ConnectorKind::Elbow),
            ToolKind::Curve => connector(ConnectorKind::Curve),
            ToolKind::Asset => ShapeKind::Asset(AssetRef::default()),
            ToolKind::ProtocolNode => {
                let operation = UnitOperation::new("generic", "New step");
                ShapeKind::ProtocolNode(ProtocolNode::new(operation))
            }
        };
        Some(kind)
    }
}

fn connector(kind: ConnectorKind) -> ShapeKind {
    ShapeKind::connector(kind, Connector::new(kind))
}

/// Manages the current tool and the style applied to new shapes.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current style to apply to new shapes.
    pub current_style: ShapeStyle,
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool != self.current_tool {
            log::debug!("Tool changed: {:?} -> {:?}", self.current_tool, tool);
        }
        self.current_tool = tool;
    }

    /// Create a zero-size shape for the current tool at `point`.
    pub fn create_shape(&self, point: Point) -> Option<Shape> {
        let kind = self.current_tool.shape_kind()?;
        let mut shape = Shape::new(kind, point.x, point.y, 0.0, 0.0);
        shape.style = self.current_style.clone();
        Some(shape)
    }
}
