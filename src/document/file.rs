//! Document File Schema
//!
//! On-disk form of a document: a versioned JSON envelope around the nested
//! layer tree. The arena representation never hits the disk — files store
//! the tree as nested records and the arena is rebuilt on load. Unknown
//! fields are preserved so files written by newer versions keep loading.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document::{Bounds, ColorInfo, Document, NodeId, NodeKind};
use crate::error::{Result, RigprepError};

/// Current document schema version.
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// Rigprep version writing the file.
pub const RIGPREP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serialized document envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFile {
    /// Schema version for forward compatibility checks.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Timestamp of the save that produced this file.
    pub saved_at: DateTime<Utc>,

    /// Rigprep version that last wrote this file.
    pub rigprep_version: String,

    /// Color metadata of the session.
    #[serde(default)]
    pub color: ColorInfo,

    /// Raster resolution in pixels per inch.
    #[serde(default = "default_resolution")]
    pub resolution: u32,

    /// Ordered top-level layer tree, bottom-most first.
    pub layers: Vec<NodeFile>,

    /// SHA-256 over the serialized layer tree, for integrity checks.
    #[serde(default)]
    pub content_digest: String,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

fn default_schema_version() -> String {
    CURRENT_SCHEMA_VERSION.to_string()
}

fn default_resolution() -> u32 {
    300
}

/// Serialized node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFile {
    pub name: String,
    pub kind: NodeKind,

    #[serde(default = "default_visible")]
    pub visible: bool,

    #[serde(default)]
    pub bounds: Bounds,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeFile>,
}

fn default_visible() -> bool {
    true
}

fn digest_of(layers: &[NodeFile]) -> Result<String> {
    let content = serde_json::to_vec(layers)?;
    let hash = Sha256::digest(&content);
    Ok(format!("{:x}", hash))
}

impl DocumentFile {
    /// Snapshots a document into its on-disk form, stamped with the
    /// current time and version.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let mut layers = Vec::with_capacity(doc.top_level().len());
        for id in doc.top_level() {
            layers.push(NodeFile::from_node(doc, *id)?);
        }
        let content_digest = digest_of(&layers)?;
        Ok(Self {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            rigprep_version: RIGPREP_VERSION.to_string(),
            color: doc.color().clone(),
            resolution: doc.resolution(),
            layers,
            content_digest,
            unknown_fields: HashMap::new(),
        })
    }

    /// Snapshots a single subtree as a one-layer document, sized metadata
    /// taken from the source session. Used by per-node export.
    pub fn from_subtree(doc: &Document, root: NodeId) -> Result<Self> {
        let layers = vec![NodeFile::from_node(doc, root)?];
        let content_digest = digest_of(&layers)?;
        Ok(Self {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            rigprep_version: RIGPREP_VERSION.to_string(),
            color: doc.color().clone(),
            resolution: doc.resolution(),
            layers,
            content_digest,
            unknown_fields: HashMap::new(),
        })
    }

    /// Whether the stored digest still matches the layer tree.
    ///
    /// Files from other writers may omit the digest; an empty field is
    /// treated as matching.
    pub fn digest_matches(&self) -> Result<bool> {
        if self.content_digest.is_empty() {
            return Ok(true);
        }
        Ok(self.content_digest == digest_of(&self.layers)?)
    }

    /// Rebuilds the arena document described by this file.
    ///
    /// Fails on a schema version from a different major line.
    pub fn into_document(self) -> Result<Document> {
        let major = self.schema_version.split('.').next().unwrap_or("");
        if major != "1" {
            return Err(RigprepError::UnsupportedSchema {
                version: self.schema_version,
            });
        }

        let mut doc = Document::with_color(self.color, self.resolution);
        for layer in &self.layers {
            let id = layer.build_into(&mut doc)?;
            doc.append_top_level(id)?;
        }
        doc.set_modified(false);
        Ok(doc)
    }
}

impl NodeFile {
    pub(crate) fn from_node(doc: &Document, id: NodeId) -> Result<Self> {
        let node = doc.node(id)?;
        let mut children = Vec::with_capacity(node.children().len());
        for child in node.children() {
            children.push(NodeFile::from_node(doc, *child)?);
        }
        Ok(Self {
            name: node.name().to_string(),
            kind: node.kind(),
            visible: node.is_visible(),
            bounds: node.bounds(),
            children,
        })
    }

    pub(crate) fn build_into(&self, doc: &mut Document) -> Result<NodeId> {
        let id = match self.kind {
            NodeKind::Group => doc.create_group(&self.name),
            NodeKind::Paint => doc.create_paint_layer(&self.name, self.bounds),
        };
        doc.set_visible(id, self.visible)?;
        doc.set_bounds(id, self.bounds)?;
        for child in &self.children {
            let child_id = child.build_into(doc)?;
            doc.append_child(id, child_id)?;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::Bounds;

    fn sample_document() -> Document {
        let mut doc = Document::new();
        let face = doc.create_group("Face");
        doc.append_top_level(face).unwrap();
        let eyes = doc.create_group("Eyes");
        doc.append_child(face, eyes).unwrap();
        let left = doc.create_paint_layer("Left", Bounds::new(10, 10, 32, 32));
        doc.append_child(eyes, left).unwrap();
        let bg = doc.create_paint_layer("Background", Bounds::new(0, 0, 512, 512));
        doc.set_visible(bg, false).unwrap();
        doc.append_top_level(bg).unwrap();
        doc
    }

    #[test]
    fn test_round_trip_preserves_tree() {
        let doc = sample_document();
        let file = DocumentFile::from_document(&doc).unwrap();

        let rebuilt = file.clone().into_document().unwrap();
        let rebuilt_file = DocumentFile::from_document(&rebuilt).unwrap();

        assert_eq!(file.layers, rebuilt_file.layers);
        assert_eq!(file.color, rebuilt_file.color);
        assert!(!rebuilt.is_modified());
    }

    #[test]
    fn test_unknown_fields_survive_reserialization() {
        let json = serde_json::json!({
            "schema_version": "1.1",
            "saved_at": "2026-01-15T10:00:00Z",
            "rigprep_version": "9.9.9",
            "layers": [{ "name": "Face", "kind": "group" }],
            "future_feature": { "enabled": true },
        });
        let file: DocumentFile = serde_json::from_value(json).unwrap();
        assert!(file.unknown_fields.contains_key("future_feature"));

        let doc = file.into_document().unwrap();
        assert_eq!(doc.top_level().len(), 1);
    }

    #[test]
    fn test_foreign_major_version_rejected() {
        let json = serde_json::json!({
            "schema_version": "2.0",
            "saved_at": "2026-01-15T10:00:00Z",
            "rigprep_version": "9.9.9",
            "layers": [],
        });
        let file: DocumentFile = serde_json::from_value(json).unwrap();
        assert!(matches!(
            file.into_document(),
            Err(RigprepError::UnsupportedSchema { .. })
        ));
    }

    #[test]
    fn test_visibility_defaults_to_true() {
        let json = serde_json::json!({
            "saved_at": "2026-01-15T10:00:00Z",
            "rigprep_version": "0.1.0",
            "layers": [{ "name": "Face", "kind": "group" }],
        });
        let file: DocumentFile = serde_json::from_value(json).unwrap();
        assert!(file.layers[0].visible);
        assert_eq!(file.schema_version, CURRENT_SCHEMA_VERSION);
    }
}
