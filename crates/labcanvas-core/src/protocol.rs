//! Protocol interchange document: export from and import into a shape list.
//!
//! Export reads protocol nodes and derives connections from connector
//! geometry. Import rebuilds protocol nodes and one bound arrow per
//! connection. Decorative shapes never take part.

use crate::canvas::node_at;
use crate::shapes::{
    Connector, ConnectorKind, ProtocolNode, Shape, ShapeId, ShapeKind, UnitOperation,
};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Version written into exported documents.
pub const SCHEMA_VERSION: &str = "1.0";

/// Operation metadata key carrying a node's parallel group through export.
pub const PARALLEL_GROUP_KEY: &str = "parallelGroupId";

/// Errors from protocol export and import.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Nothing to export: the diagram has no protocol steps")]
    NoProtocolNodes,
    #[error("Protocol document contains no nodes")]
    EmptyDocument,
    #[error("Failed to parse protocol document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Protocol extraction failed: {0}")]
    Extraction(String),
}

/// Document header.
///
/// `exported_at` is kept as written: exports use RFC 3339, but documents from
/// other producers may carry any ISO 8601 form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMetadata {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub name: String,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl ProtocolMetadata {
    /// The export timestamp, if it parses. Timestamps without an offset are
    /// read as UTC.
    pub fn exported_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.exported_at.as_deref()?;
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl Default for ProtocolMetadata {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            exported_at: None,
            name: String::new(),
        }
    }
}

/// A unit operation plus the geometry of the node that carried it.
///
/// Geometry is optional on input; documents produced by extraction usually
/// have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    #[serde(flatten)]
    pub operation: UnitOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A directed edge between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

/// The versioned interchange document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProtocolDocument {
    #[serde(default)]
    pub metadata: ProtocolMetadata,
    #[serde(default)]
    pub nodes: Vec<ExportNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl ProtocolDocument {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse a document from JSON text.
pub fn parse_document(json: &str) -> Result<ProtocolDocument, ProtocolError> {
    Ok(serde_json::from_str(json)?)
}

/// Geometry defaults applied to imported nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportLayout {
    /// Size used when a node has no width/height.
    pub node_size: Size,
    /// Vertical gap between nodes laid out in a column.
    pub spacing: f64,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            node_size: Size::new(200.0, 100.0),
            spacing: 50.0,
        }
    }
}

fn export_id(shape: &Shape, operation: &UnitOperation) -> String {
    operation
        .id
        .clone()
        .unwrap_or_else(|| format!("op-{}", shape.id()))
}

/// Export the protocol nodes and derived connections of a shape list.
pub fn export_protocol(
    shapes: &[Shape],
    name: &str,
    exported_at: DateTime<Utc>,
) -> Result<ProtocolDocument, ProtocolError> {
    let mut ids: HashMap<&ShapeId, String> = HashMap::new();
    let mut nodes = Vec::new();

    for shape in shapes {
        let Some(node) = shape.as_protocol_node() else { continue };
        let mut operation = node.operation.clone();
        let id = export_id(shape, &operation);
        operation.id = Some(id.clone());
        if let Some(group) = &node.parallel_group_id {
            operation
                .metadata
                .insert(PARALLEL_GROUP_KEY.to_string(), Value::String(group.clone()));
        }

        let bounds = shape.bounds();
        nodes.push(ExportNode {
            operation,
            x: Some(bounds.x0),
            y: Some(bounds.y0),
            width: Some(bounds.width()),
            height: Some(bounds.height()),
        });
        ids.insert(shape.id(), id);
    }

    if nodes.is_empty() {
        return Err(ProtocolError::NoProtocolNodes);
    }

    let connections: Vec<Connection> = shapes
        .iter()
        .filter(|s| s.is_connector())
        .filter_map(|s| {
            let from = node_at(shapes, s.start())?.id();
            let to = node_at(shapes, s.end())?.id();
            if from == to {
                return None;
            }
            Some(Connection {
                from: ids.get(from)?.clone(),
                to: ids.get(to)?.clone(),
            })
        })
        .collect();

    log::info!(
        "Exported protocol '{}': {} nodes, {} connections",
        name,
        nodes.len(),
        connections.len()
    );

    Ok(ProtocolDocument {
        metadata: ProtocolMetadata {
            schema_version: SCHEMA_VERSION.to_string(),
            exported_at: Some(exported_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            name: name.to_string(),
        },
        nodes,
        connections,
    })
}

/// Rebuild a shape list from a document.
///
/// The result is meant to replace the whole store. Nothing is returned on
/// error.
pub fn import_protocol(
    doc: &ProtocolDocument,
    layout: ImportLayout,
) -> Result<Vec<Shape>, ProtocolError> {
    if doc.nodes.is_empty() {
        return Err(ProtocolError::EmptyDocument);
    }
    if doc.metadata.schema_version != SCHEMA_VERSION {
        log::warn!(
            "Importing protocol with schema version {} (expected {})",
            doc.metadata.schema_version,
            SCHEMA_VERSION
        );
    }

    let mut shapes = Vec::with_capacity(doc.nodes.len() + doc.connections.len());
    let mut placed: HashMap<&str, (ShapeId, Point)> = HashMap::new();

    for (i, node) in doc.nodes.iter().enumerate() {
        let width = node.width.unwrap_or(layout.node_size.width);
        let height = node.height.unwrap_or(layout.node_size.height);
        let x = node.x.unwrap_or(0.0);
        let y = node
            .y
            .unwrap_or(i as f64 * (layout.node_size.height + layout.spacing));

        let mut operation = node.operation.clone();
        let parallel_group_id = match operation.metadata.remove(PARALLEL_GROUP_KEY) {
            Some(Value::String(group)) => Some(group),
            Some(other) => {
                operation.metadata.insert(PARALLEL_GROUP_KEY.to_string(), other);
                None
            }
            None => None,
        };
        let protocol_node = ProtocolNode {
            operation,
            parallel_group_id,
        };

        let shape = Shape::new(ShapeKind::ProtocolNode(protocol_node), x, y, width, height);
        if let Some(id) = node.operation.id.as_deref() {
            placed.insert(id, (shape.id().clone(), shape.center()));
        }
        shapes.push(shape);
    }

    for connection in &doc.connections {
        let (Some((from, start)), Some((to, end))) = (
            placed.get(connection.from.as_str()),
            placed.get(connection.to.as_str()),
        ) else {
            log::warn!(
                "Skipping connection {} -> {}: unknown node id",
                connection.from,
                connection.to
            );
            continue;
        };
        let mut arrow = Shape::new(
            ShapeKind::Arrow(Connector::between(
                ConnectorKind::Arrow,
                from.clone(),
                to.clone(),
            )),
            0.0,
            0.0,
            0.0,
            0.0,
        );
        arrow.set_endpoints(*start, *end);
        shapes.push(arrow);
    }

    log::info!(
        "Imported protocol '{}': {} nodes, {} connections",
        doc.metadata.name,
        doc.nodes.len(),
        shapes.len() - doc.nodes.len()
    );
    Ok(shapes)
}
