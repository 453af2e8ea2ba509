//! Palette drag-and-drop payloads.

use crate::shapes::AssetType;
use serde::Deserialize;

/// Transfer tag under which palette items are carried.
pub const DROP_MIME: &str = "application/x-labcanvas-item";

/// Kind of palette item being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropKind {
    Asset,
    Inventory,
    Equipment,
    Project,
    Person,
    Protocol,
}

impl DropKind {
    /// Asset type for entity drops; `None` for protocol steps.
    pub fn asset_type(self) -> Option<AssetType> {
        match self {
            DropKind::Asset => Some(AssetType::Generic),
            DropKind::Inventory => Some(AssetType::Inventory),
            DropKind::Equipment => Some(AssetType::Equipment),
            DropKind::Project => Some(AssetType::Project),
            DropKind::Person => Some(AssetType::Person),
            DropKind::Protocol => None,
        }
    }
}

/// A palette item dropped on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPayload {
    pub kind: DropKind,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub operation_type: Option<String>,
}

impl DropPayload {
    /// Display label: the item's name, falling back to its id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Decode a drop. Anything not under [`DROP_MIME`] or not a valid payload
/// yields `None`.
pub fn parse_drop(tag: &str, raw: &str) -> Option<DropPayload> {
    if tag != DROP_MIME {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::debug!("Ignoring malformed drop payload: {}", e);
            None
        }
    }
}
