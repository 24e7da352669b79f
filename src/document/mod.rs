//! Document model
//!
//! An editing session's layer tree, held as an arena of nodes indexed by
//! stable [`NodeId`] handles. Child lists and parent back-references are
//! plain IDs; ownership stays with the arena. The host editor is the only
//! writer during an export run — the flattening pipeline reads the tree
//! through shared references and issues mutation requests to the host.

pub mod file;
pub mod node;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RigprepError};

pub use file::DocumentFile;
pub use node::{Bounds, Node, NodeId, NodeKind};

/// Color metadata carried by a document and inherited by side documents
/// created during export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorInfo {
    pub model: String,
    pub depth: String,
    pub profile: String,
}

impl Default for ColorInfo {
    fn default() -> Self {
        Self {
            model: "RGBA".to_string(),
            depth: "U8".to_string(),
            profile: "sRGB-elle-V2-srgbtrc.icc".to_string(),
        }
    }
}

/// Where a node sits: directly under the document root, or inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    TopLevel(usize),
    Child(NodeId, usize),
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The active editing session
///
/// Holds the node arena, the ordered top-level sequence, the optional
/// backing file path, and the modified flag. Any tree mutation sets the
/// modified flag; saving clears it.
#[derive(Debug, Clone)]
pub struct Document {
    file_path: Option<PathBuf>,
    modified: bool,
    color: ColorInfo,
    resolution: u32,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    top_level: Vec<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document with default color metadata.
    pub fn new() -> Self {
        Self {
            file_path: None,
            modified: false,
            color: ColorInfo::default(),
            resolution: 300,
            slots: Vec::new(),
            free_slots: Vec::new(),
            top_level: Vec::new(),
        }
    }

    pub fn with_color(color: ColorInfo, resolution: u32) -> Self {
        Self {
            color,
            resolution,
            ..Self::new()
        }
    }

    // === Session metadata ===

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub(crate) fn set_file_path(&mut self, path: PathBuf) {
        self.file_path = Some(path);
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn color(&self) -> &ColorInfo {
        &self.color
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    // === Node allocation ===

    /// Creates a detached group node.
    pub fn create_group(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(Node::new(name, NodeKind::Group))
    }

    /// Creates a detached paint layer.
    pub fn create_paint_layer(&mut self, name: impl Into<String>, bounds: Bounds) -> NodeId {
        let mut node = Node::new(name, NodeKind::Paint);
        node.bounds = bounds;
        self.alloc(node)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.modified = true;
        if let Some(slot) = self.free_slots.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.node = Some(node);
            NodeId {
                slot,
                generation: entry.generation,
            }
        } else {
            let slot = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                slot,
                generation: 0,
            }
        }
    }

    /// Whether the handle refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slots
            .get(id.slot as usize)
            .map(|s| s.generation == id.generation && s.node.is_some())
            .unwrap_or(false)
    }

    /// Resolves a handle, rejecting stale ones.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.slots
            .get(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
            .ok_or(RigprepError::StaleNode {
                slot: id.slot,
                generation: id.generation,
            })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        if !self.is_alive(id) {
            return Err(RigprepError::StaleNode {
                slot: id.slot,
                generation: id.generation,
            });
        }
        self.modified = true;
        self.slots[id.slot as usize]
            .node
            .as_mut()
            .ok_or(RigprepError::StaleNode {
                slot: id.slot,
                generation: id.generation,
            })
    }

    // === Topology ===

    /// Ordered top-level handles, bottom-most first.
    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    /// Lazy scanner over visible top-level nodes in native order.
    ///
    /// No side effects; the first pipeline pass and the exporter both walk
    /// this sequence.
    pub fn visible_top_level(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.top_level
            .iter()
            .copied()
            .filter(|id| self.node(*id).map(|n| n.visible).unwrap_or(false))
    }

    /// Appends a detached node at the end of the top-level sequence.
    pub fn append_top_level(&mut self, id: NodeId) -> Result<()> {
        self.ensure_detached(id)?;
        self.top_level.push(id);
        self.modified = true;
        Ok(())
    }

    /// Inserts a detached node into the top-level sequence at `index`.
    pub fn insert_top_level_at(&mut self, index: usize, id: NodeId) -> Result<()> {
        self.ensure_detached(id)?;
        if index > self.top_level.len() {
            return Err(RigprepError::InvalidTreeOp {
                reason: format!("top-level index {index} out of range"),
            });
        }
        self.top_level.insert(index, id);
        self.modified = true;
        Ok(())
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.node(parent)?.children.len();
        self.insert_child_at(parent, index, child)
    }

    /// Inserts a detached node into `parent`'s child list at `index`.
    pub fn insert_child_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.ensure_detached(child)?;
        if !self.node(parent)?.is_group() {
            return Err(RigprepError::InvalidTreeOp {
                reason: "cannot attach children to a paint layer".to_string(),
            });
        }
        {
            let p = self.node_mut(parent)?;
            if index > p.children.len() {
                return Err(RigprepError::InvalidTreeOp {
                    reason: format!("child index {index} out of range"),
                });
            }
            p.children.insert(index, child);
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlinks a node from its parent or from the top-level sequence.
    ///
    /// The node and its subtree stay alive, ready to be re-attached.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        match self.placement(id)? {
            Placement::TopLevel(index) => {
                self.top_level.remove(index);
            }
            Placement::Child(parent, index) => {
                self.node_mut(parent)?.children.remove(index);
                self.node_mut(id)?.parent = None;
            }
        }
        self.modified = true;
        Ok(())
    }

    /// Detaches a node and destroys it together with every descendant.
    ///
    /// All handles into the subtree become stale.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        let mut worklist = vec![id];
        while let Some(current) = worklist.pop() {
            worklist.extend(self.node(current)?.children.iter().copied());
            let slot = &mut self.slots[current.slot as usize];
            slot.node = None;
            slot.generation += 1;
            self.free_slots.push(current.slot);
        }
        self.modified = true;
        Ok(())
    }

    /// Reports where a node sits in its parent's (or the root's) ordering.
    pub fn placement(&self, id: NodeId) -> Result<Placement> {
        match self.node(id)?.parent {
            Some(parent) => {
                let index = self
                    .node(parent)?
                    .children
                    .iter()
                    .position(|c| *c == id)
                    .ok_or(RigprepError::InvalidTreeOp {
                        reason: "node missing from its parent's child list".to_string(),
                    })?;
                Ok(Placement::Child(parent, index))
            }
            None => {
                let index = self.top_level.iter().position(|c| *c == id).ok_or(
                    RigprepError::InvalidTreeOp {
                        reason: "detached node has no placement".to_string(),
                    },
                )?;
                Ok(Placement::TopLevel(index))
            }
        }
    }

    // === Node attribute mutation ===

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_bounds(&mut self, id: NodeId, bounds: Bounds) -> Result<()> {
        self.node_mut(id)?.bounds = bounds;
        Ok(())
    }

    // === Queries ===

    /// Union of the bounding boxes of `id`'s direct children.
    pub fn union_of_child_bounds(&self, id: NodeId) -> Result<Bounds> {
        let mut union = Bounds::default();
        for child in self.node(id)?.children.iter() {
            union = union.union(&self.node(*child)?.bounds);
        }
        Ok(union)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// First name shared by two visible top-level nodes, if any.
    pub fn duplicate_visible_top_level_name(&self) -> Option<String> {
        let mut seen = HashSet::new();
        for id in self.visible_top_level() {
            let name = self.node(id).ok()?.name.clone();
            if !seen.insert(name.clone()) {
                return Some(name);
            }
        }
        None
    }

    fn ensure_detached(&self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if node.parent.is_some() || self.top_level.contains(&id) {
            return Err(RigprepError::InvalidTreeOp {
                reason: "node is already attached".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_group() -> (Document, NodeId) {
        let mut doc = Document::new();
        let group = doc.create_group("Face");
        doc.append_top_level(group).unwrap();
        (doc, group)
    }

    #[test]
    fn test_create_and_attach() {
        let (mut doc, group) = doc_with_group();
        let layer = doc.create_paint_layer("lineart", Bounds::new(0, 0, 64, 64));
        doc.append_child(group, layer).unwrap();

        assert_eq!(doc.node(layer).unwrap().parent(), Some(group));
        assert_eq!(doc.node(group).unwrap().children(), &[layer]);
        assert_eq!(doc.placement(layer).unwrap(), Placement::Child(group, 0));
    }

    #[test]
    fn test_stale_handle_rejected_after_remove() {
        let (mut doc, group) = doc_with_group();
        let layer = doc.create_paint_layer("lineart", Bounds::default());
        doc.append_child(group, layer).unwrap();

        doc.remove_subtree(layer).unwrap();
        assert!(!doc.is_alive(layer));
        assert!(matches!(
            doc.node(layer),
            Err(RigprepError::StaleNode { .. })
        ));
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut doc = Document::new();
        let a = doc.create_group("a");
        doc.append_top_level(a).unwrap();
        doc.remove_subtree(a).unwrap();

        let b = doc.create_group("b");
        assert_eq!(a.slot, b.slot);
        assert_ne!(a.generation, b.generation);
        assert!(!doc.is_alive(a));
        assert!(doc.is_alive(b));
    }

    #[test]
    fn test_remove_subtree_destroys_descendants() {
        let (mut doc, group) = doc_with_group();
        let inner = doc.create_group("inner");
        doc.append_child(group, inner).unwrap();
        let leaf = doc.create_paint_layer("leaf", Bounds::default());
        doc.append_child(inner, leaf).unwrap();

        doc.remove_subtree(group).unwrap();
        assert!(!doc.is_alive(group));
        assert!(!doc.is_alive(inner));
        assert!(!doc.is_alive(leaf));
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn test_visible_top_level_keeps_native_order() {
        let mut doc = Document::new();
        let a = doc.create_group("a");
        let b = doc.create_group("b");
        let c = doc.create_group("c");
        for id in [a, b, c] {
            doc.append_top_level(id).unwrap();
        }
        doc.set_visible(b, false).unwrap();

        let visible: Vec<_> = doc.visible_top_level().collect();
        assert_eq!(visible, vec![a, c]);
    }

    #[test]
    fn test_duplicate_name_detection_skips_hidden() {
        let mut doc = Document::new();
        let a = doc.create_group("Face");
        let b = doc.create_group("Face");
        doc.append_top_level(a).unwrap();
        doc.append_top_level(b).unwrap();

        assert_eq!(
            doc.duplicate_visible_top_level_name(),
            Some("Face".to_string())
        );

        doc.set_visible(b, false).unwrap();
        assert_eq!(doc.duplicate_visible_top_level_name(), None);
    }

    #[test]
    fn test_attach_to_paint_layer_refused() {
        let mut doc = Document::new();
        let layer = doc.create_paint_layer("flat", Bounds::default());
        doc.append_top_level(layer).unwrap();
        let other = doc.create_paint_layer("other", Bounds::default());

        assert!(matches!(
            doc.append_child(layer, other),
            Err(RigprepError::InvalidTreeOp { .. })
        ));
    }

    #[test]
    fn test_mutation_sets_modified_flag() {
        let (mut doc, group) = doc_with_group();
        doc.set_modified(false);
        assert!(!doc.is_modified());

        doc.set_name(group, "Head").unwrap();
        assert!(doc.is_modified());
    }
}
