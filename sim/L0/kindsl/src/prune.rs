//! Removal of dummy links and fixed joints.
//!
//! A dummy link carries no mass and is attached through a fixed joint (the
//! root, having no joint, only needs to be massless). Such links typically
//! exist in URDF models only to name a frame. Pruning removes them, keeping
//! their frames as named frames of the parent link and, optionally, adding
//! their inertia to the parent.

use tracing::{debug, info, warn};

use crate::converter::ConvertOptions;
use crate::frame::Frame;
use crate::tree::{JointId, JointKind, KinematicTree, LinkId};

/// Whether a link is massless and rigidly attached to its parent.
///
/// The root has no parent joint; only its mass is checked.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_dummy(tree: &KinematicTree, id: LinkId) -> bool {
    let Some(link) = tree.link(id) else {
        return false;
    };
    if link.inertia.mass != 0.0 {
        return false;
    }
    link.parent_joint
        .and_then(|j| tree.joint(j))
        .is_none_or(|j| j.kind == JointKind::Fixed)
}

/// Replace a dummy root by its only child, as long as possible.
///
/// Stops at a root with no children. A dummy root with several children, or
/// with a single non-fixed child joint, cannot be removed: its child joints
/// are protected from leaf pruning and a warning is logged.
///
/// Returns the number of removed root links.
pub fn collapse_dummy_root(tree: &mut KinematicTree) -> usize {
    let mut removed = 0;

    while is_dummy(tree, tree.root()) {
        let root_id = tree.root();
        let Some(root) = tree.link(root_id) else {
            break;
        };
        let root_name = root.name.clone();

        let (child_id, joint_id) = match root.children.as_slice() {
            [] => break,
            [single] => *single,
            many => {
                warn!(
                    link = %root_name,
                    children = many.len(),
                    "dummy root link with multiple children, cannot collapse"
                );
                let joints: Vec<JointId> = many.iter().map(|(_, j)| *j).collect();
                for j in joints {
                    if let Some(joint) = tree.joint_mut(j) {
                        joint.protected = true;
                    }
                }
                break;
            }
        };

        let Some(joint) = tree.joint_mut(joint_id) else {
            break;
        };
        if joint.kind != JointKind::Fixed {
            warn!(
                link = %root_name,
                joint = %joint.name,
                "dummy root link supporting a non-fixed joint"
            );
            joint.protected = true;
            break;
        }

        let joint_name = joint.name.clone();
        tree.remove_joint(joint_id);
        tree.remove_link(root_id);
        tree.set_root(child_id);
        let child_name = tree.link(child_id).map(|l| l.name.clone()).unwrap_or_default();
        info!(
            "deleting dummy pair '{root_name}'-'{joint_name}', root replaced with '{child_name}'"
        );
        removed += 1;
    }

    tree.recompute_leaves();
    removed
}

/// One pass of fixed-leaf elimination.
///
/// Every current leaf attached by an unprotected fixed joint is removed. Its
/// frames move to the parent when `migrate_frames` is set, and its inertia is
/// added to the parent when `lump_inertia` is set. Returns whether anything
/// was removed.
pub fn prune_fixed_leaves(tree: &mut KinematicTree, options: &ConvertOptions) -> bool {
    let mut doomed: Vec<(LinkId, JointId)> = Vec::new();

    for leaf_id in tree.leaves().to_vec() {
        let Some(leaf) = tree.link(leaf_id) else {
            continue;
        };
        let (Some(parent_id), Some(joint_id)) = (leaf.parent, leaf.parent_joint) else {
            continue;
        };
        let Some(joint) = tree.joint(joint_id) else {
            continue;
        };
        if joint.kind != JointKind::Fixed || joint.protected {
            continue;
        }

        debug!(
            link = %leaf.name,
            joint = %joint.name,
            "collapsing leaf link"
        );

        let joint_frame = joint.frame;
        let leaf_name = leaf.name.clone();
        let leaf_inertia = leaf.inertia;
        let migrated: Vec<(String, Frame)> = if options.migrate_frames {
            leaf.frames
                .iter()
                .map(|(name, f)| (name.to_string(), joint_frame.compose(f)))
                .collect()
        } else {
            Vec::new()
        };

        let Some(parent) = tree.link_mut(parent_id) else {
            continue;
        };

        if options.migrate_frames {
            // The leaf link frame coincides with its joint frame
            parent.frames.insert(leaf_name, joint_frame);
            for (name, frame) in migrated {
                parent.frames.insert(name, frame);
            }
        }

        if options.lump_inertia && !leaf_inertia.is_massless() {
            let r = joint_frame.rotation();
            // Parent origin seen from the leaf frame
            let tr = -(r.transpose() * joint_frame.translation());
            let moved = leaf_inertia.roto_translate(&tr, r);
            parent.inertia = parent.inertia.combine(&moved);
        }

        doomed.push((leaf_id, joint_id));
    }

    for &(link, joint) in &doomed {
        tree.remove_link(link);
        tree.remove_joint(joint);
    }
    tree.recompute_leaves();

    !doomed.is_empty()
}

/// Collapse the dummy root, then prune fixed leaves until nothing changes.
pub fn prune(tree: &mut KinematicTree, options: &ConvertOptions) {
    collapse_dummy_root(tree);
    let mut passes = 0;
    while prune_fixed_leaves(tree, options) {
        passes += 1;
    }
    debug!(passes, links = tree.link_count(), "pruning done");
}
