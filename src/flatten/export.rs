//! Per-node export
//!
//! Materializes each visible top-level node as a standalone file next to
//! the source document, one file per node, named after the node. The host
//! is asked to block on every export before the next one starts.

use std::path::{Path, PathBuf};

use log::info;

use crate::document::{Document, NodeId};
use crate::error::{Result, RigprepError};
use crate::host::{EditorHost, ExportStrategy};

/// File extension of exported node documents.
pub const EXPORT_EXTENSION: &str = "psd";

/// Destination path for a node: `<directory of source document>/<name>.psd`.
pub fn export_destination(doc: &Document, id: NodeId) -> Result<PathBuf> {
    let dir = doc
        .file_path()
        .and_then(Path::parent)
        .ok_or(RigprepError::MissingBackingFile)?;
    let name = doc.node(id)?.name();
    Ok(dir.join(format!("{name}.{EXPORT_EXTENSION}")))
}

/// Exports every visible top-level node, in native order.
///
/// Returns the written paths.
pub fn export_top_level<H: EditorHost>(
    host: &mut H,
    strategy: ExportStrategy,
) -> Result<Vec<PathBuf>> {
    let nodes: Vec<NodeId> = host.document().visible_top_level().collect();
    let mut written = Vec::with_capacity(nodes.len());

    for id in nodes {
        let dest = export_destination(host.document(), id)?;
        host.export_node(id, &dest, strategy)?;
        host.wait_for_done()?;
        written.push(dest);
    }

    info!("Exported {} top-level node(s)", written.len());
    Ok(written)
}
