//! URDF to Kinematics-DSL conversion.
//!
//! Builds a [`KinematicTree`] from a parsed [`UrdfRobot`]:
//!
//! 1. one link per URDF link, with an identifier-safe name;
//! 2. one joint per URDF joint, in document order, with its frame aligned so
//!    that the motion axis is the local Z axis (see [`crate::alignment`]);
//! 3. the root is the first link without a parent;
//! 4. the inertia of every link is expressed in the new link frame, about
//!    the link origin;
//! 5. optionally, dummy links and fixed joints are pruned
//!    (see [`crate::prune`]).
//!
//! ## URDF → Kinematics-DSL Mapping
//!
//! | URDF | Kinematics-DSL |
//! |------|----------------|
//! | `revolute`, `continuous` | `r_joint` |
//! | `prismatic` | `p_joint` |
//! | `fixed` | `r_joint`, or pruned |
//! | `floating`, `planar` | rejected |

use std::collections::{HashMap, HashSet};

use nalgebra::Vector3;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::alignment::align_joint;
use crate::error::{Result, UrdfError};
use crate::inertia::InertiaParams;
use crate::parser::parse_urdf_str;
use crate::prune::prune;
use crate::tree::{Joint, JointId, JointKind, KinematicTree, Link, LinkId};
use crate::types::{UrdfJoint, UrdfJointType, UrdfRobot, safe_normalize_axis};
use crate::writer::KindslWriter;

/// Options controlling the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConvertOptions {
    /// Remove dummy links and fixed joints.
    pub prune_fixed_joints: bool,
    /// Keep the frames of pruned links as named frames of their parent.
    pub migrate_frames: bool,
    /// Add the inertia of pruned links to their parent.
    pub lump_inertia: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            prune_fixed_joints: false,
            migrate_frames: true,
            lump_inertia: true,
        }
    }
}

impl ConvertOptions {
    /// Enable or disable pruning of fixed joints.
    #[must_use]
    pub const fn with_prune_fixed_joints(mut self, prune: bool) -> Self {
        self.prune_fixed_joints = prune;
        self
    }

    /// Enable or disable frame migration during pruning.
    #[must_use]
    pub const fn with_migrate_frames(mut self, migrate: bool) -> Self {
        self.migrate_frames = migrate;
        self
    }

    /// Enable or disable inertia lumping during pruning.
    #[must_use]
    pub const fn with_lump_inertia(mut self, lump: bool) -> Self {
        self.lump_inertia = lump;
        self
    }
}

/// Convert URDF XML to a Kinematics-DSL document with default formatting.
///
/// # Example
///
/// ```
/// use sim_kindsl::{urdf_to_kindsl, ConvertOptions};
///
/// let urdf = r#"
///     <robot name="arm">
///         <link name="base"/>
///         <link name="upper">
///             <inertial>
///                 <mass value="2.0"/>
///                 <inertia ixx="1" iyy="1" izz="1"/>
///             </inertial>
///         </link>
///         <joint name="shoulder" type="revolute">
///             <parent link="base"/>
///             <child link="upper"/>
///             <axis xyz="0 0 1"/>
///         </joint>
///     </robot>
/// "#;
///
/// let doc = urdf_to_kindsl(urdf, &ConvertOptions::default()).unwrap();
/// assert!(doc.starts_with("Robot arm"));
/// assert!(doc.contains("r_joint shoulder {"));
/// ```
pub fn urdf_to_kindsl(urdf_xml: &str, options: &ConvertOptions) -> Result<String> {
    let robot = parse_urdf_str(urdf_xml)?;
    let tree = convert(&robot, options)?;
    Ok(KindslWriter::default().write_model(&tree))
}

/// Convert a parsed `UrdfRobot` to a kinematic tree.
pub fn convert(robot: &UrdfRobot, options: &ConvertOptions) -> Result<KinematicTree> {
    let mut converter = Converter::new(robot);
    converter.build_links()?;
    converter.build_joints()?;
    let root = converter.find_root()?;
    converter.check_loops()?;
    converter.convert_inertia();

    let Converter { links, joints, .. } = converter;
    let mut tree = KinematicTree::from_parts(robot.name.clone(), links, joints, root);

    if options.prune_fixed_joints {
        prune(&mut tree, options);
    }

    debug!(
        robot = %robot.name,
        links = tree.link_count(),
        joints = tree.joint_count(),
        "conversion done"
    );
    Ok(tree)
}

/// Turn a URDF name into a valid identifier.
///
/// `-` becomes `__`, any other character that is not alphanumeric or `_`
/// becomes `_`, and a leading digit is prefixed with `_`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    if name.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        out.push('_');
    }
    for c in name.chars() {
        match c {
            '-' => out.push_str("__"),
            c if c.is_ascii_alphanumeric() || c == '_' => out.push(c),
            _ => out.push('_'),
        }
    }
    out
}

fn joint_kind(joint: &UrdfJoint) -> Result<JointKind> {
    match joint.joint_type {
        UrdfJointType::Revolute | UrdfJointType::Continuous => Ok(JointKind::Revolute),
        UrdfJointType::Prismatic => Ok(JointKind::Prismatic),
        UrdfJointType::Fixed => Ok(JointKind::Fixed),
        UrdfJointType::Floating | UrdfJointType::Planar => Err(UrdfError::Unsupported(format!(
            "{} joint '{}'",
            joint.joint_type.as_str(),
            joint.name
        ))),
    }
}

/// Internal converter state.
struct Converter<'a> {
    robot: &'a UrdfRobot,
    /// Map from URDF link name to link id
    link_ids: HashMap<&'a str, LinkId>,
    links: Vec<Link>,
    joints: Vec<Joint>,
}

impl<'a> Converter<'a> {
    fn new(robot: &'a UrdfRobot) -> Self {
        Self {
            robot,
            link_ids: HashMap::new(),
            links: Vec::with_capacity(robot.links.len()),
            joints: Vec::with_capacity(robot.joints.len()),
        }
    }

    fn build_links(&mut self) -> Result<()> {
        let robot = self.robot;
        let mut seen = HashSet::new();
        for urdf_link in &robot.links {
            let name = sanitize_name(&urdf_link.name);
            if !seen.insert(name.clone()) {
                return Err(UrdfError::DuplicateLink(urdf_link.name.clone()));
            }
            self.link_ids
                .insert(urdf_link.name.as_str(), LinkId(self.links.len()));
            self.links.push(Link::new(name));
        }
        Ok(())
    }

    fn build_joints(&mut self) -> Result<()> {
        let robot = self.robot;
        let mut seen = HashSet::new();
        for urdf_joint in &robot.joints {
            let name = sanitize_name(&urdf_joint.name);
            if !seen.insert(name.clone()) {
                return Err(UrdfError::DuplicateJoint(urdf_joint.name.clone()));
            }
            let kind = joint_kind(urdf_joint)?;

            let context = format!("joint '{}'", urdf_joint.name);
            let predecessor = *self
                .link_ids
                .get(urdf_joint.parent.as_str())
                .ok_or_else(|| UrdfError::undefined_link(&urdf_joint.parent, &context))?;
            let successor = *self
                .link_ids
                .get(urdf_joint.child.as_str())
                .ok_or_else(|| UrdfError::undefined_link(&urdf_joint.child, &context))?;

            if predecessor == successor {
                return Err(UrdfError::KinematicLoop(format!(
                    "{context} connects link '{}' to itself",
                    urdf_joint.parent
                )));
            }
            if let Some(first) = self.links[successor.0].parent_joint {
                return Err(UrdfError::multiple_parents(
                    &urdf_joint.child,
                    &robot.joints[first.0].name,
                    &urdf_joint.name,
                ));
            }

            let aligned = align_joint(
                &urdf_joint.name,
                kind,
                &urdf_joint.origin,
                &safe_normalize_axis(urdf_joint.axis),
                &self.links[predecessor.0].convention_offset,
            );

            let id = JointId(self.joints.len());
            self.joints.push(
                Joint::new(name, kind, predecessor, successor).with_frame(aligned.frame),
            );

            let child = &mut self.links[successor.0];
            child.parent = Some(predecessor);
            child.parent_joint = Some(id);
            child.convention_offset = aligned.successor_offset;
            self.links[predecessor.0].children.push((successor, id));
        }
        Ok(())
    }

    fn find_root(&self) -> Result<LinkId> {
        let mut orphans = self
            .links
            .iter()
            .enumerate()
            .filter(|(_, l)| l.parent.is_none())
            .map(|(i, _)| LinkId(i));

        let root = orphans.next().ok_or(UrdfError::NoRootLink)?;
        let extra = orphans.count();
        if extra > 0 {
            warn!(
                root = %self.links[root.0].name,
                count = extra + 1,
                "found several links without parent, only one expected; using the first"
            );
        }
        Ok(root)
    }

    /// Every parent chain must end at a parentless link.
    fn check_loops(&self) -> Result<()> {
        for (i, link) in self.links.iter().enumerate() {
            let mut current = link.parent;
            let mut steps = 0;
            while let Some(p) = current {
                steps += 1;
                if steps > self.links.len() {
                    return Err(UrdfError::KinematicLoop(format!(
                        "link '{}' is part of a cycle",
                        self.robot.links[i].name
                    )));
                }
                current = self.links[p.0].parent;
            }
        }
        Ok(())
    }

    fn convert_inertia(&mut self) {
        for (link, urdf_link) in self.links.iter_mut().zip(&self.robot.links) {
            let Some(inertial) = &urdf_link.inertial else {
                continue;
            };
            if inertial.origin.rpy != Vector3::zeros() {
                warn!(
                    link = %urdf_link.name,
                    "rpy of the inertial origin is not supported, ignoring it"
                );
            }
            let tr = -inertial.origin.xyz;
            link.inertia =
                InertiaParams::from_urdf(inertial).roto_translate(&tr, &link.convention_offset);
        }
    }
}
