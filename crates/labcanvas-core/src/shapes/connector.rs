//! Connector shapes (line, arrow, elbow, curve).

use super::ShapeId;
use serde::{Deserialize, Serialize};

/// The routing flavour of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Line,
    Arrow,
    Elbow,
    Curve,
}

/// Decoration drawn at a connector endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndMarker {
    #[default]
    None,
    Circle,
    Arrow,
}

/// Connector payload. Geometry lives on the shape: the endpoints are
/// `(x, y)` and `(x + width, y + height)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    #[serde(default)]
    pub start_marker: EndMarker,
    #[serde(default)]
    pub end_marker: EndMarker,
    /// Protocol node the start point was resolved to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_node_id: Option<ShapeId>,
    /// Protocol node the end point was resolved to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_node_id: Option<ShapeId>,
}

impl Connector {
    /// Create an unbound connector with the default markers for its kind.
    pub fn new(kind: ConnectorKind) -> Self {
        let end_marker = match kind {
            ConnectorKind::Arrow => EndMarker::Arrow,
            _ => EndMarker::None,
        };
        Self {
            start_marker: EndMarker::None,
            end_marker,
            from_node_id: None,
            to_node_id: None,
        }
    }

    /// Create a connector already bound to two nodes.
    pub fn between(kind: ConnectorKind, from: ShapeId, to: ShapeId) -> Self {
        Self {
            from_node_id: Some(from),
            to_node_id: Some(to),
            ..Self::new(kind)
        }
    }

    /// The bound edge, if both ends resolved to distinct nodes.
    pub fn edge(&self) -> Option<(&ShapeId, &ShapeId)> {
        match (&self.from_node_id, &self.to_node_id) {
            (Some(from), Some(to)) if from != to => Some((from, to)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_has_end_marker() {
        assert_eq!(Connector::new(ConnectorKind::Arrow).end_marker, EndMarker::Arrow);
        assert_eq!(Connector::new(ConnectorKind::Line).end_marker, EndMarker::None);
    }

    #[test]
    fn test_self_loop_is_not_an_edge() {
        let id = ShapeId::new();
        let connector = Connector::between(ConnectorKind::Arrow, id.clone(), id);
        assert!(connector.edge().is_none());
    }
}
