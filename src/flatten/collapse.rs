//! Group collapsing passes
//!
//! Every nested group is reduced to a single flattening point: the
//! leaf-most subgroups are wrapped in a same-named quick group, then
//! merged bottom-up. Wrapping and merging run as two separate full
//! traversals — interleaving them destabilizes the host's active-node
//! resolution mid-walk.

use log::debug;

use crate::document::{Document, NodeId};
use crate::error::{Result, RigprepError};
use crate::host::{EditorHost, HostAction};

/// Collects the flattening leaves under `root` in document order.
///
/// A flattening leaf is a group with no group-typed children; non-group
/// children are ignored during the descent, and a non-group `root` yields
/// nothing. Read-only worklist walk — the side effects happen in the apply
/// passes below.
pub fn collect_flatten_leaves(doc: &Document, root: NodeId) -> Result<Vec<NodeId>> {
    let mut leaves = Vec::new();
    if !doc.node(root)?.is_group() {
        return Ok(leaves);
    }

    let mut worklist = vec![root];
    while let Some(current) = worklist.pop() {
        let mut group_children = Vec::new();
        for child in doc.node(current)?.children() {
            if doc.node(*child)?.is_group() {
                group_children.push(*child);
            }
        }
        if group_children.is_empty() {
            leaves.push(current);
        } else {
            // Reversed so siblings come back off the stack in native order.
            worklist.extend(group_children.into_iter().rev());
        }
    }
    Ok(leaves)
}

/// Wrap pass: puts every flattening leaf into a freshly created group
/// carrying the leaf's own name, so the hierarchy and naming survive the
/// merge that follows.
pub fn wrap_flatten_leaves<H: EditorHost>(host: &mut H) -> Result<usize> {
    let roots: Vec<NodeId> = host.document().visible_top_level().collect();
    let mut wrapped = 0;
    for root in roots {
        for leaf in collect_flatten_leaves(host.document(), root)? {
            let name = host.document().node(leaf)?.name().to_string();

            host.set_active_node(leaf)?;
            host.trigger(HostAction::CreateQuickGroup)?;
            host.wait_for_done()?;

            // The host names the wrapper itself; take over the leaf's name.
            let wrapper = host
                .document()
                .node(leaf)?
                .parent()
                .ok_or(RigprepError::NoParent)?;
            host.rename_node(wrapper, &name)?;

            debug!("wrapped flattening leaf '{name}'");
            wrapped += 1;
        }
    }
    Ok(wrapped)
}

/// Merge pass: re-collects the flattening leaves (the wrap pass changed
/// the topology) and merges each one into a single paint layer.
pub fn merge_flatten_leaves<H: EditorHost>(host: &mut H) -> Result<usize> {
    let roots: Vec<NodeId> = host.document().visible_top_level().collect();
    let mut merged = 0;
    for root in roots {
        for leaf in collect_flatten_leaves(host.document(), root)? {
            host.set_active_node(leaf)?;
            host.trigger(HostAction::MergeLayer)?;
            host.wait_for_done()?;
            merged += 1;
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Bounds, NodeKind};
    use crate::editor::InMemoryEditor;

    /// Face > { Eyes > { Left > paint, Right > paint }, Mouth > paint }
    fn face_document() -> (Document, NodeId) {
        let mut doc = Document::new();
        let face = doc.create_group("Face");
        doc.append_top_level(face).unwrap();

        let eyes = doc.create_group("Eyes");
        doc.append_child(face, eyes).unwrap();
        for side in ["Left", "Right"] {
            let group = doc.create_group(side);
            doc.append_child(eyes, group).unwrap();
            let paint = doc.create_paint_layer("iris", Bounds::new(0, 0, 16, 16));
            doc.append_child(group, paint).unwrap();
        }

        let mouth = doc.create_group("Mouth");
        doc.append_child(face, mouth).unwrap();
        let paint = doc.create_paint_layer("lips", Bounds::new(0, 20, 16, 8));
        doc.append_child(mouth, paint).unwrap();

        (doc, face)
    }

    #[test]
    fn test_collect_finds_leaf_groups_in_document_order() {
        let (doc, face) = face_document();
        let leaves = collect_flatten_leaves(&doc, face).unwrap();
        let names: Vec<_> = leaves
            .iter()
            .map(|id| doc.node(*id).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["Left", "Right", "Mouth"]);
    }

    #[test]
    fn test_collect_ignores_paint_root() {
        let mut doc = Document::new();
        let layer = doc.create_paint_layer("flat", Bounds::default());
        doc.append_top_level(layer).unwrap();
        assert!(collect_flatten_leaves(&doc, layer).unwrap().is_empty());
    }

    #[test]
    fn test_collect_treats_leaf_root_as_flattening_leaf() {
        let mut doc = Document::new();
        let group = doc.create_group("Hair");
        doc.append_top_level(group).unwrap();
        let paint = doc.create_paint_layer("strands", Bounds::default());
        doc.append_child(group, paint).unwrap();

        assert_eq!(collect_flatten_leaves(&doc, group).unwrap(), vec![group]);
    }

    #[test]
    fn test_wrap_pass_preserves_names_and_hierarchy() {
        let (doc, _) = face_document();
        let mut editor = InMemoryEditor::new(doc);

        let wrapped = wrap_flatten_leaves(&mut editor).unwrap();
        assert_eq!(wrapped, 3);

        // Every former leaf group now sits inside a wrapper of its own name.
        let doc = editor.document();
        let face = doc.top_level()[0];
        let eyes = doc.node(face).unwrap().children()[0];
        for (index, expected) in [(0, "Left"), (1, "Right")] {
            let wrapper = doc.node(eyes).unwrap().children()[index];
            let wrapper_node = doc.node(wrapper).unwrap();
            assert_eq!(wrapper_node.name(), expected);
            assert!(wrapper_node.is_group());
            let inner = doc.node(wrapper_node.children()[0]).unwrap();
            assert_eq!(inner.name(), expected);
        }
    }

    #[test]
    fn test_merge_pass_flattens_wrapped_leaves() {
        let (doc, _) = face_document();
        let mut editor = InMemoryEditor::new(doc);

        wrap_flatten_leaves(&mut editor).unwrap();
        let merged = merge_flatten_leaves(&mut editor).unwrap();
        assert_eq!(merged, 3);

        let doc = editor.document();
        let face = doc.top_level()[0];
        let eyes = doc.node(face).unwrap().children()[0];
        let left_wrapper = doc.node(eyes).unwrap().children()[0];
        let left_wrapper_node = doc.node(left_wrapper).unwrap();
        assert_eq!(left_wrapper_node.name(), "Left");

        let merged_layer = doc.node(left_wrapper_node.children()[0]).unwrap();
        assert_eq!(merged_layer.kind(), NodeKind::Paint);
        assert_eq!(merged_layer.name(), "Left Merged");
    }

    #[test]
    fn test_hidden_top_level_nodes_left_untouched() {
        let (mut doc, face) = face_document();
        doc.set_visible(face, false).unwrap();
        let mut editor = InMemoryEditor::new(doc);

        assert_eq!(wrap_flatten_leaves(&mut editor).unwrap(), 0);
        assert_eq!(merge_flatten_leaves(&mut editor).unwrap(), 0);
    }
}
