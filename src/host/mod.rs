//! Host editor interface
//!
//! Everything the flattening pipeline consumes from the editing engine
//! behind it: tree accessors, active-node selection, named action triggers,
//! and document lifecycle. Every method blocks until the host has finished
//! the request — the pipeline is strictly synchronous and assumes exclusive
//! access to the single active document.

use std::path::Path;

use crate::document::{Document, NodeId};
use crate::error::Result;

/// Named editing actions triggered on the host's current active node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    /// Wrap the active node in a newly created group at the same position.
    CreateQuickGroup,
    /// Flatten the active group into a single paint layer; the host names
    /// the result `<group name> Merged`.
    MergeLayer,
}

impl HostAction {
    /// The host-side action identifier, used in logs.
    pub fn action_id(&self) -> &'static str {
        match self {
            HostAction::CreateQuickGroup => "create_quick_group",
            HostAction::MergeLayer => "merge_layer",
        }
    }
}

/// How a node is materialized into a standalone file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportStrategy {
    /// Copy the node's rendered content into a freshly created side
    /// document sized to its bounds, save that, close it.
    #[default]
    SideDocument,
    /// Ask the host to save the node directly.
    DirectNodeSave,
}

/// Suffix the host appends to every [`HostAction::MergeLayer`] result.
/// Fixed host behavior; the normalizer strips it afterwards.
pub const MERGED_SUFFIX: &str = " Merged";

/// Host editing engine seen by the pipeline.
pub trait EditorHost {
    /// Read access to the active document tree.
    fn document(&self) -> &Document;

    /// Currently selected node, if any.
    fn active_node(&self) -> Option<NodeId>;

    /// Select the node subsequent actions apply to.
    fn set_active_node(&mut self, id: NodeId) -> Result<()>;

    /// Trigger a named editing action on the active node.
    fn trigger(&mut self, action: HostAction) -> Result<()>;

    /// Block until the host has completed the last triggered action.
    fn wait_for_done(&mut self) -> Result<()>;

    /// Request a node rename.
    fn rename_node(&mut self, id: NodeId, name: &str) -> Result<()>;

    /// Save the document to its backing file, clearing the modified flag.
    fn save_document(&mut self) -> Result<()>;

    /// Save the document to `path` and adopt it as the backing file.
    fn save_document_as(&mut self, path: &Path) -> Result<()>;

    /// Materialize a node as a standalone file at `dest`.
    fn export_node(&mut self, id: NodeId, dest: &Path, strategy: ExportStrategy) -> Result<()>;

    /// Discard the in-memory tree and re-read the backing file.
    ///
    /// Clears the modified flag before reopening so no save/discard
    /// confirmation can interpose.
    fn reload_document(&mut self) -> Result<()>;
}
