//! Asset shapes referencing external domain entities.

use serde::{Deserialize, Serialize};

/// Category of a placed asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    #[default]
    Generic,
    Inventory,
    Equipment,
    Project,
    Person,
}

impl AssetType {
    /// Entity type name used when linking to the owning service.
    pub fn entity_type(self) -> &'static str {
        match self {
            AssetType::Generic => "asset",
            AssetType::Inventory => "inventory",
            AssetType::Equipment => "equipment",
            AssetType::Project => "project",
            AssetType::Person => "person",
        }
    }
}

/// Reference to an entity owned by another part of the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedEntity<'a> {
    pub entity_type: &'a str,
    pub entity_id: &'a str,
}

/// Payload of an `asset` shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    #[serde(default)]
    pub asset_type: AssetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_entity_id: Option<String>,
}

impl AssetRef {
    pub fn linked_to(asset_type: AssetType, entity_id: impl Into<String>) -> Self {
        Self {
            asset_type,
            linked_entity_type: Some(asset_type.entity_type().to_string()),
            linked_entity_id: Some(entity_id.into()),
        }
    }

    /// The linked entity, when both halves of the reference are present.
    pub fn linked(&self) -> Option<LinkedEntity<'_>> {
        match (&self.linked_entity_type, &self.linked_entity_id) {
            (Some(entity_type), Some(entity_id)) => Some(LinkedEntity { entity_type, entity_id }),
            _ => None,
        }
    }
}
