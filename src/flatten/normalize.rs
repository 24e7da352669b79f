//! Name normalization
//!
//! The host's merge action tags every result with the `" Merged"` suffix.
//! This pass walks the collapsed tree down to true leaves and renames each
//! tagged leaf back to its original name. Running it again on an already
//! clean tree changes nothing.

use log::debug;

use crate::document::{Document, NodeId};
use crate::error::Result;
use crate::host::{EditorHost, MERGED_SUFFIX};

/// Collects every true leaf (node with no children) under the visible
/// top-level nodes, in document order.
pub fn collect_leaves(doc: &Document) -> Result<Vec<NodeId>> {
    let mut leaves = Vec::new();
    let mut worklist: Vec<NodeId> = doc.visible_top_level().collect();
    worklist.reverse();

    while let Some(current) = worklist.pop() {
        let node = doc.node(current)?;
        if node.is_leaf() {
            leaves.push(current);
        } else {
            worklist.extend(node.children().iter().rev().copied());
        }
    }
    Ok(leaves)
}

/// The name with one trailing `" Merged"` removed, if it carried one.
pub fn stripped_name(name: &str) -> Option<&str> {
    name.strip_suffix(MERGED_SUFFIX)
}

/// Rename pass: strips the merge suffix from every tagged leaf.
///
/// Returns the number of renames issued.
pub fn normalize_names<H: EditorHost>(host: &mut H) -> Result<usize> {
    let leaves = collect_leaves(host.document())?;
    let mut renamed = 0;
    for leaf in leaves {
        let name = host.document().node(leaf)?.name().to_string();
        if let Some(stripped) = stripped_name(&name) {
            host.rename_node(leaf, stripped)?;
            debug!("normalized '{name}' -> '{stripped}'");
            renamed += 1;
        }
    }
    Ok(renamed)
}
