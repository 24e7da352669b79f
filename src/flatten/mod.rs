//! Layer Flattener
//!
//! The full export flow: preflight checks, the two collapsing passes, name
//! normalization, per-node export, and the closing reload that throws the
//! destructive edits away. Four full tree traversals per run — merging
//! while still walking made the host's active-node resolution ambiguous,
//! so every pass re-walks from the top.

pub mod collapse;
pub mod export;
pub mod normalize;

use std::path::PathBuf;

use log::info;

use crate::document::Document;
use crate::error::{Result, RigprepError};
use crate::host::{EditorHost, ExportStrategy};

pub use collapse::{collect_flatten_leaves, merge_flatten_leaves, wrap_flatten_leaves};
pub use export::{export_destination, export_top_level, EXPORT_EXTENSION};
pub use normalize::{collect_leaves, normalize_names, stripped_name};

/// Options for an export run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenOptions {
    pub strategy: ExportStrategy,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Flattening leaves wrapped in same-named groups.
    pub wrapped: usize,
    /// Groups merged into paint layers.
    pub merged: usize,
    /// Leaves whose merge suffix was stripped.
    pub renamed: usize,
    /// Files written, one per visible top-level node.
    pub files: Vec<PathBuf>,
}

/// Preflight checks, run before any tree mutation.
///
/// Each failure is terminal for the invocation: there is nothing to roll
/// back yet, so the run just stops with the dialog message.
pub fn preflight(doc: &Document) -> Result<()> {
    if doc.file_path().is_none() {
        return Err(RigprepError::MissingBackingFile);
    }
    if doc.is_modified() {
        return Err(RigprepError::UnsavedChanges);
    }
    if let Some(name) = doc.duplicate_visible_top_level_name() {
        return Err(RigprepError::DuplicateTopLevelNames { name });
    }
    Ok(())
}

/// Runs the whole flow against a host session.
///
/// On success the session's document has been reloaded from disk and is
/// identical to its last saved state; the exported files sit next to it.
/// On any error past preflight the document is left partially modified —
/// recoverable only by reloading.
pub fn run_export<H: EditorHost>(host: &mut H, options: FlattenOptions) -> Result<ExportReport> {
    preflight(host.document())?;

    info!("Starting flatten-and-export run");
    let wrapped = collapse::wrap_flatten_leaves(host)?;
    let merged = collapse::merge_flatten_leaves(host)?;
    let renamed = normalize::normalize_names(host)?;
    let files = export::export_top_level(host, options.strategy)?;

    host.reload_document()?;

    info!(
        "Run complete: {} wrapped, {} merged, {} renamed, {} file(s) written",
        wrapped,
        merged,
        renamed,
        files.len()
    );
    Ok(ExportReport {
        wrapped,
        merged,
        renamed,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Bounds;
    use crate::editor::InMemoryEditor;

    #[test]
    fn test_preflight_rejects_modified_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        let layer = doc.create_paint_layer("Face", Bounds::default());
        doc.append_top_level(layer).unwrap();

        let mut editor = InMemoryEditor::new(doc);
        editor
            .save_document_as(&dir.path().join("model.json"))
            .unwrap();
        assert!(preflight(editor.document()).is_ok());

        editor.document_mut().set_name(layer, "Head").unwrap();
        assert!(matches!(
            preflight(editor.document()),
            Err(RigprepError::UnsavedChanges)
        ));
    }

    #[test]
    fn test_preflight_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        for _ in 0..2 {
            let layer = doc.create_paint_layer("Face", Bounds::default());
            doc.append_top_level(layer).unwrap();
        }
        let mut editor = InMemoryEditor::new(doc);
        editor
            .save_document_as(&dir.path().join("model.json"))
            .unwrap();

        let err = preflight(editor.document()).unwrap_err();
        assert!(matches!(
            err,
            RigprepError::DuplicateTopLevelNames { ref name } if name == "Face"
        ));
    }

    #[test]
    fn test_preflight_rejects_never_saved_document() {
        let doc = Document::new();
        assert!(matches!(
            preflight(&doc),
            Err(RigprepError::MissingBackingFile)
        ));
    }
}
