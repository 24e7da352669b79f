//! In-memory editor
//!
//! Reference [`EditorHost`] implementation. It owns the document arena and
//! performs the editing actions with the observable semantics of the real
//! host: quick-grouping wraps the active node in place, merging flattens a
//! group into a paint layer named with the `" Merged"` suffix, and saving
//! writes the versioned JSON document format. No rendering happens here —
//! export writes the host's native serialized form of the node.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::document::file::NodeFile;
use crate::document::{Bounds, Document, DocumentFile, NodeId, Placement};
use crate::error::{Result, RigprepError};
use crate::host::{EditorHost, ExportStrategy, HostAction, MERGED_SUFFIX};

/// Host-assigned name for freshly created quick groups, numbered per
/// session like the real editor does.
const QUICK_GROUP_PREFIX: &str = "Group";

fn read_document_from_disk(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path)?;
    let file: DocumentFile =
        serde_json::from_str(&raw).map_err(|_| RigprepError::InvalidDocument {
            path: path.display().to_string(),
        })?;
    if !file.digest_matches()? {
        warn!("Content digest mismatch in {}", path.display());
    }
    let mut document = file.into_document()?;
    document.set_file_path(path.to_path_buf());
    Ok(document)
}

/// In-memory editing session implementing [`EditorHost`].
#[derive(Debug)]
pub struct InMemoryEditor {
    document: Document,
    active: Option<NodeId>,
    quick_group_counter: u32,
}

impl InMemoryEditor {
    /// Wraps an existing document into an editing session.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            active: None,
            quick_group_counter: 0,
        }
    }

    /// Opens a document file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let document = read_document_from_disk(path)?;
        info!("Opened document: {}", path.display());
        Ok(Self::new(document))
    }

    /// Mutable access to the session's document, for building trees in
    /// front of a run. Mutations mark the document modified.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn backing_path(&self) -> Result<PathBuf> {
        self.document
            .file_path()
            .map(Path::to_path_buf)
            .ok_or(RigprepError::MissingBackingFile)
    }

    fn write_document(&self, path: &Path) -> Result<()> {
        let file = DocumentFile::from_document(&self.document)?;
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn active_or_err(&self) -> Result<NodeId> {
        self.active.ok_or(RigprepError::NoActiveNode)
    }

    /// Wraps the active node in a new group occupying its old position.
    fn create_quick_group(&mut self) -> Result<()> {
        let target = self.active_or_err()?;
        let placement = self.document.placement(target)?;

        self.quick_group_counter += 1;
        let group = self
            .document
            .create_group(format!("{} {}", QUICK_GROUP_PREFIX, self.quick_group_counter));

        self.document.detach(target)?;
        match placement {
            Placement::TopLevel(index) => self.document.insert_top_level_at(index, group)?,
            Placement::Child(parent, index) => {
                self.document.insert_child_at(parent, index, group)?
            }
        }
        self.document.append_child(group, target)?;

        debug!(
            "create_quick_group: wrapped '{}' in '{}'",
            self.document.node(target)?.name(),
            self.document.node(group)?.name()
        );
        Ok(())
    }

    /// Flattens the active group into a single paint layer at the same
    /// position, named `<group name> Merged`, bounds the union of the
    /// merged children.
    fn merge_layer(&mut self) -> Result<()> {
        let target = self.active_or_err()?;
        let node = self.document.node(target)?;
        if !node.is_group() {
            return Err(RigprepError::HostRefused {
                reason: format!("merge_layer requires a group node, got '{}'", node.name()),
            });
        }
        let name = node.name().to_string();
        let visible = node.is_visible();

        let placement = self.document.placement(target)?;
        let bounds = self.document.union_of_child_bounds(target)?;

        let merged = self
            .document
            .create_paint_layer(format!("{name}{MERGED_SUFFIX}"), bounds);
        self.document.set_visible(merged, visible)?;

        self.document.remove_subtree(target)?;
        match placement {
            Placement::TopLevel(index) => self.document.insert_top_level_at(index, merged)?,
            Placement::Child(parent, index) => {
                self.document.insert_child_at(parent, index, merged)?
            }
        }

        // The merge result becomes the active node, as in the host.
        self.active = Some(merged);

        debug!("merge_layer: '{name}' -> '{name}{MERGED_SUFFIX}'");
        Ok(())
    }

    /// Side-document export: create a document sized to the node's bounds
    /// with the session's color metadata, copy the node's content into it,
    /// drop the seed background layer, save, close.
    fn export_via_side_document(&mut self, id: NodeId, dest: &Path) -> Result<()> {
        let node = self.document.node(id)?;
        let name = node.name().to_string();
        let bounds = node.bounds();

        let snapshot = NodeFile::from_node(&self.document, id)?;

        let mut side =
            Document::with_color(self.document.color().clone(), self.document.resolution());
        let seed = side.create_paint_layer(
            "Background",
            Bounds::new(0, 0, bounds.width, bounds.height),
        );
        side.append_top_level(seed)?;

        let pasted = snapshot.build_into(&mut side)?;
        side.append_top_level(pasted)?;
        side.remove_subtree(seed)?;
        side.set_modified(false);

        let file = DocumentFile::from_document(&side)?;
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(dest, json).map_err(|e| RigprepError::ExportFailed {
            layer: name,
            reason: e.to_string(),
        })?;
        // Dropping `side` closes the side document.
        Ok(())
    }

    /// Direct export: the host serializes the node subtree straight to
    /// the destination path.
    fn export_direct(&mut self, id: NodeId, dest: &Path) -> Result<()> {
        let name = self.document.node(id)?.name().to_string();
        let file = DocumentFile::from_subtree(&self.document, id)?;
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(dest, json).map_err(|e| RigprepError::ExportFailed {
            layer: name,
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

impl EditorHost for InMemoryEditor {
    fn document(&self) -> &Document {
        &self.document
    }

    fn active_node(&self) -> Option<NodeId> {
        self.active
    }

    fn set_active_node(&mut self, id: NodeId) -> Result<()> {
        if !self.document.is_alive(id) {
            return Err(RigprepError::StaleNode {
                slot: id.slot,
                generation: id.generation,
            });
        }
        self.active = Some(id);
        Ok(())
    }

    fn trigger(&mut self, action: HostAction) -> Result<()> {
        debug!("trigger: {}", action.action_id());
        match action {
            HostAction::CreateQuickGroup => self.create_quick_group(),
            HostAction::MergeLayer => self.merge_layer(),
        }
    }

    fn wait_for_done(&mut self) -> Result<()> {
        // This host performs actions synchronously; by the time trigger
        // returns there is nothing left in flight.
        Ok(())
    }

    fn rename_node(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.document.set_name(id, name)
    }

    fn save_document(&mut self) -> Result<()> {
        let path = self.backing_path()?;
        self.write_document(&path)?;
        self.document.set_modified(false);
        info!("Saved document: {}", path.display());
        Ok(())
    }

    fn save_document_as(&mut self, path: &Path) -> Result<()> {
        self.write_document(path)?;
        self.document.set_file_path(path.to_path_buf());
        self.document.set_modified(false);
        info!("Saved document: {}", path.display());
        Ok(())
    }

    fn export_node(&mut self, id: NodeId, dest: &Path, strategy: ExportStrategy) -> Result<()> {
        match strategy {
            ExportStrategy::SideDocument => self.export_via_side_document(id, dest)?,
            ExportStrategy::DirectNodeSave => self.export_direct(id, dest)?,
        }
        info!("Saving {}", dest.display());
        Ok(())
    }

    fn reload_document(&mut self) -> Result<()> {
        let path = self.backing_path()?;
        // Clear the flag before reopening so no save/discard confirmation
        // can interpose on the dirty session being thrown away.
        self.document.set_modified(false);

        self.document = read_document_from_disk(&path)?;
        self.active = None;

        info!("Reloaded document from disk; flattening edits discarded");
        Ok(())
    }
}
