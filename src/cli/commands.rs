//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::document::{Document, NodeId};
use crate::editor::InMemoryEditor;
use crate::error::{Result, RigprepError};
use crate::flatten::{self, FlattenOptions};
use crate::host::{EditorHost, ExportStrategy};

/// Flatten and export every visible top-level node of a document.
pub fn export(path: &Path, strategy: ExportStrategy) -> Result<()> {
    info!("Exporting document: {}", path.display());

    let mut editor = InMemoryEditor::open(path)?;
    let report = flatten::run_export(&mut editor, FlattenOptions { strategy })
        .map_err(show_dialog_on_abort)?;

    println!(
        "Flattened {} group(s) ({} wrapped, {} renamed).",
        report.merged, report.wrapped, report.renamed
    );
    for file in &report.files {
        println!("Exported: {}", file.display());
    }
    println!("Document reloaded; flattening changes discarded.");

    Ok(())
}

/// Run the preflight checks only.
pub fn check(path: &Path) -> Result<()> {
    info!("Checking document: {}", path.display());

    let editor = InMemoryEditor::open(path)?;
    flatten::preflight(editor.document()).map_err(show_dialog_on_abort)?;

    let count = editor.document().visible_top_level().count();
    println!("Preflight passed: {} visible top-level node(s).", count);

    Ok(())
}

/// Print the document's layer tree.
pub fn inspect(path: &Path) -> Result<()> {
    let editor = InMemoryEditor::open(path)?;
    let doc = editor.document();

    println!("Document: {}", path.display());
    println!(
        "Color: {} {} ({}), {} ppi",
        doc.color().model,
        doc.color().depth,
        doc.color().profile,
        doc.resolution()
    );
    println!("{:-<60}", "");
    for id in doc.top_level() {
        print_subtree(doc, *id, 0)?;
    }

    Ok(())
}

fn print_subtree(doc: &Document, id: NodeId, depth: usize) -> Result<()> {
    let node = doc.node(id)?;
    let kind = if node.is_group() { "group" } else { "paint" };
    let hidden = if node.is_visible() { "" } else { " (hidden)" };
    let b = node.bounds();
    println!(
        "{:indent$}{} [{}] {}x{}+{}+{}{}",
        "",
        node.name(),
        kind,
        b.width,
        b.height,
        b.x,
        b.y,
        hidden,
        indent = depth * 2
    );
    for child in node.children() {
        print_subtree(doc, *child, depth + 1)?;
    }
    Ok(())
}

/// The two preflight aborts surface as the modal dialog the add-on always
/// showed; everything else passes through untouched.
fn show_dialog_on_abort(err: RigprepError) -> RigprepError {
    if err.is_user_abort() {
        eprintln!("{:-<60}", "");
        eprintln!("Operation Failed");
        eprintln!("{}", err.dialog_message());
        eprintln!("{:-<60}", "");
    }
    err
}
