//! The converted kinematic tree.
//!
//! Links and joints live in arenas owned by [`KinematicTree`] and refer to
//! each other through [`LinkId`] and [`JointId`]. Removing an entity leaves a
//! tombstone so that ids handed out earlier stay valid (they simply resolve
//! to `None`).

use nalgebra::Matrix3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::{Frame, FrameMap};
use crate::inertia::InertiaParams;

/// Identifier of a link within a [`KinematicTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkId(pub usize);

impl LinkId {
    /// Get the raw index.
    #[must_use]
    pub const fn raw(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

/// Identifier of a joint within a [`KinematicTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointId(pub usize);

impl JointId {
    /// Get the raw index.
    #[must_use]
    pub const fn raw(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Joint({})", self.0)
    }
}

/// Kind of a converted joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointKind {
    /// Rotation about the local Z axis.
    Revolute,
    /// Translation along the local Z axis.
    Prismatic,
    /// No motion.
    Fixed,
}

impl JointKind {
    /// Lowercase name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revolute => "revolute",
            Self::Prismatic => "prismatic",
            Self::Fixed => "fixed",
        }
    }
}

/// A rigid body of the converted tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Link {
    /// Identifier-safe name.
    pub name: String,
    /// Inertia in link coordinates.
    pub inertia: InertiaParams,
    /// User frames attached to the link.
    pub frames: FrameMap,
    /// Parent link, `None` for the root.
    pub parent: Option<LinkId>,
    /// Joint connecting this link to its parent.
    pub parent_joint: Option<JointId>,
    /// Children with their connecting joints, in source order.
    pub children: Vec<(LinkId, JointId)>,
    /// Rotation from the URDF link frame to this link frame.
    pub convention_offset: Matrix3<f64>,
}

impl Link {
    /// Create a massless, unattached link.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inertia: InertiaParams::default(),
            frames: FrameMap::new(),
            parent: None,
            parent_joint: None,
            children: Vec::new(),
            convention_offset: Matrix3::identity(),
        }
    }

    /// Whether the link has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A joint of the converted tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Joint {
    /// Identifier-safe name.
    pub name: String,
    /// Joint kind.
    pub kind: JointKind,
    /// Link the joint is attached to.
    pub predecessor: LinkId,
    /// Link moved by the joint.
    pub successor: LinkId,
    /// Joint frame in predecessor coordinates.
    pub frame: Frame,
    /// Set when pruning must leave this joint alone.
    pub protected: bool,
}

impl Joint {
    /// Create a joint with an identity frame.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: JointKind,
        predecessor: LinkId,
        successor: LinkId,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            predecessor,
            successor,
            frame: Frame::default(),
            protected: false,
        }
    }

    /// Set the joint frame.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }
}

/// A rooted tree of links connected by joints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KinematicTree {
    robot_name: String,
    links: Vec<Option<Link>>,
    joints: Vec<Option<Joint>>,
    root: LinkId,
    leaves: Vec<LinkId>,
}

impl KinematicTree {
    /// Assemble a tree from fully wired links and joints.
    ///
    /// The ids stored in the links and joints are indices into the given
    /// vectors.
    #[must_use]
    pub fn from_parts(
        robot_name: impl Into<String>,
        links: Vec<Link>,
        joints: Vec<Joint>,
        root: LinkId,
    ) -> Self {
        let mut tree = Self {
            robot_name: robot_name.into(),
            links: links.into_iter().map(Some).collect(),
            joints: joints.into_iter().map(Some).collect(),
            root,
            leaves: Vec::new(),
        };
        tree.recompute_leaves();
        tree
    }

    /// Robot name.
    #[must_use]
    pub fn robot_name(&self) -> &str {
        &self.robot_name
    }

    /// Root link id.
    #[must_use]
    pub fn root(&self) -> LinkId {
        self.root
    }

    /// Root link.
    #[must_use]
    pub fn root_link(&self) -> Option<&Link> {
        self.link(self.root)
    }

    /// Links without children, in source order.
    #[must_use]
    pub fn leaves(&self) -> &[LinkId] {
        &self.leaves
    }

    /// Look up a live link.
    #[must_use]
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0).and_then(Option::as_ref)
    }

    /// Look up a live link mutably.
    pub fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Look up a live joint.
    #[must_use]
    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.0).and_then(Option::as_ref)
    }

    /// Look up a live joint mutably.
    pub fn joint_mut(&mut self, id: JointId) -> Option<&mut Joint> {
        self.joints.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Find a live link by name.
    #[must_use]
    pub fn find_link(&self, name: &str) -> Option<LinkId> {
        self.links().find(|(_, l)| l.name == name).map(|(id, _)| id)
    }

    /// Find a live joint by name.
    #[must_use]
    pub fn find_joint(&self, name: &str) -> Option<JointId> {
        self.joints().find(|(_, j)| j.name == name).map(|(id, _)| id)
    }

    /// Live links in source order.
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.as_ref().map(|l| (LinkId(i), l)))
    }

    /// Live joints in source order.
    pub fn joints(&self) -> impl Iterator<Item = (JointId, &Joint)> {
        self.joints
            .iter()
            .enumerate()
            .filter_map(|(i, j)| j.as_ref().map(|j| (JointId(i), j)))
    }

    /// Number of live links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links().count()
    }

    /// Number of live joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints().count()
    }

    /// Sum of the masses of all live links.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.links().map(|(_, l)| l.inertia.mass).sum()
    }

    /// Non-root links in depth-first pre-order, children in stored order.
    #[must_use]
    pub fn depth_first(&self) -> Vec<LinkId> {
        let mut order = Vec::new();
        let mut stack: Vec<LinkId> = Vec::new();
        if let Some(root) = self.root_link() {
            stack.extend(root.children.iter().rev().map(|(c, _)| *c));
        }
        while let Some(id) = stack.pop() {
            if let Some(link) = self.link(id) {
                order.push(id);
                stack.extend(link.children.iter().rev().map(|(c, _)| *c));
            }
        }
        order
    }

    /// Make `id` the root, clearing its parent references.
    pub(crate) fn set_root(&mut self, id: LinkId) {
        if let Some(link) = self.link_mut(id) {
            link.parent = None;
            link.parent_joint = None;
        }
        self.root = id;
    }

    /// Tombstone a link. Its parent's child list is updated.
    pub(crate) fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        let link = self.links.get_mut(id.0)?.take()?;
        if let Some(parent) = link.parent.and_then(|p| self.link_mut(p)) {
            parent.children.retain(|(c, _)| *c != id);
        }
        Some(link)
    }

    /// Tombstone a joint.
    pub(crate) fn remove_joint(&mut self, id: JointId) -> Option<Joint> {
        self.joints.get_mut(id.0)?.take()
    }

    /// Rebuild the leaf list from the live links.
    pub(crate) fn recompute_leaves(&mut self) {
        self.leaves = self
            .links()
            .filter(|(_, l)| l.is_leaf())
            .map(|(id, _)| id)
            .collect();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    /// base -> a -> b, base -> c
    fn sample_tree() -> KinematicTree {
        let mut links: Vec<Link> = ["base", "a", "b", "c"].iter().map(|n| Link::new(*n)).collect();
        let joints = vec![
            Joint::new("j_a", JointKind::Revolute, LinkId(0), LinkId(1)),
            Joint::new("j_b", JointKind::Fixed, LinkId(1), LinkId(2)),
            Joint::new("j_c", JointKind::Prismatic, LinkId(0), LinkId(3)),
        ];
        for (i, j) in joints.iter().enumerate() {
            links[j.successor.0].parent = Some(j.predecessor);
            links[j.successor.0].parent_joint = Some(JointId(i));
            links[j.predecessor.0].children.push((j.successor, JointId(i)));
        }
        KinematicTree::from_parts("sample", links, joints, LinkId(0))
    }

    #[test]
    fn test_accessors() {
        let tree = sample_tree();
        assert_eq!(tree.robot_name(), "sample");
        assert_eq!(tree.root(), LinkId(0));
        assert_eq!(tree.root_link().unwrap().name, "base");
        assert_eq!(tree.link_count(), 4);
        assert_eq!(tree.joint_count(), 3);
        assert_eq!(tree.find_link("b"), Some(LinkId(2)));
        assert_eq!(tree.find_joint("j_c"), Some(JointId(2)));
        assert!(tree.find_link("zzz").is_none());
    }

    #[test]
    fn test_leaves_in_source_order() {
        let tree = sample_tree();
        assert_eq!(tree.leaves(), &[LinkId(2), LinkId(3)]);
    }

    #[test]
    fn test_depth_first_order() {
        let tree = sample_tree();
        assert_eq!(tree.depth_first(), vec![LinkId(1), LinkId(2), LinkId(3)]);
    }

    #[test]
    fn test_remove_leaves_tombstone() {
        let mut tree = sample_tree();
        let removed = tree.remove_link(LinkId(2)).unwrap();
        assert_eq!(removed.name, "b");
        tree.remove_joint(JointId(1)).unwrap();
        tree.recompute_leaves();

        assert!(tree.link(LinkId(2)).is_none());
        assert!(tree.joint(JointId(1)).is_none());
        assert!(tree.link(LinkId(1)).unwrap().children.is_empty());
        assert_eq!(tree.leaves(), &[LinkId(1), LinkId(3)]);
        // Ids of survivors are unchanged
        assert_eq!(tree.find_link("c"), Some(LinkId(3)));
        assert!(tree.remove_link(LinkId(2)).is_none());
    }

    #[test]
    fn test_set_root_clears_parent() {
        let mut tree = sample_tree();
        tree.remove_link(LinkId(0));
        tree.set_root(LinkId(1));
        let root = tree.root_link().unwrap();
        assert_eq!(root.name, "a");
        assert!(root.parent.is_none());
        assert!(root.parent_joint.is_none());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(LinkId(3).to_string(), "Link(3)");
        assert_eq!(JointId(7).raw(), 7);
    }
}
