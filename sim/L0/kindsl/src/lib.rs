//! URDF to Kinematics-DSL robot model conversion.
//!
//! This crate reads [URDF](http://wiki.ros.org/urdf) robot descriptions and
//! converts them into the Kinematics-DSL format, where every joint moves
//! along (or about) the Z axis of its own frame and every frame is given by
//! intrinsic XYZ rotations.
//!
//! # Features
//!
//! - Parse URDF XML from files or strings
//! - Align each joint frame with its motion axis
//! - Express link inertia in the new link frames
//! - Optionally prune massless links attached by fixed joints, keeping their
//!   frames and lumping their inertia into the parent
//! - Write the Kinematics-DSL document with configurable number formatting
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use sim_kindsl::{convert, parse_urdf_str, ConvertOptions, KindslWriter};
//!
//! let urdf = r#"
//!     <robot name="pendulum">
//!         <link name="world"/>
//!         <link name="base">
//!             <inertial>
//!                 <mass value="1.0"/>
//!                 <inertia ixx="0.1" iyy="0.1" izz="0.1"/>
//!             </inertial>
//!         </link>
//!         <link name="bob">
//!             <inertial>
//!                 <origin xyz="0 0 -0.5"/>
//!                 <mass value="0.5"/>
//!                 <inertia ixx="0.01" iyy="0.01" izz="0.01"/>
//!             </inertial>
//!         </link>
//!         <joint name="anchor" type="fixed">
//!             <parent link="world"/>
//!             <child link="base"/>
//!         </joint>
//!         <joint name="swing" type="continuous">
//!             <parent link="base"/>
//!             <child link="bob"/>
//!             <axis xyz="0 1 0"/>
//!         </joint>
//!     </robot>
//! "#;
//!
//! let robot = parse_urdf_str(urdf).expect("should parse");
//! let options = ConvertOptions::default().with_prune_fixed_joints(true);
//! let tree = convert(&robot, &options).expect("should convert");
//!
//! // The massless "world" link is gone
//! assert_eq!(tree.root_link().map(|l| l.name.as_str()), Some("base"));
//!
//! let doc = KindslWriter::default().write_model(&tree);
//! assert!(doc.contains("RobotBase base {"));
//! assert!(doc.contains("r_joint swing {"));
//! ```
//!
//! # Supported URDF Elements
//!
//! - `<link name="...">` with `<inertial>` (origin, mass, inertia)
//! - `<joint>` of type `revolute`, `continuous`, `prismatic`, `fixed`, with
//!   `<parent>`, `<child>`, `<origin>` and `<axis>`
//!
//! Visual, collision, limit and dynamics data have no counterpart in the
//! output and are skipped.
//!
//! # Limitations
//!
//! - `floating` and `planar` joints are rejected
//! - Kinematic loops are not supported (tree structures only)
//! - Only the first root is used when several links have no parent
//! - A rotated inertial frame (`rpy` on the inertial origin) is ignored

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::should_implement_trait,
    clippy::items_after_statements,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::many_single_char_names,
    clippy::option_if_let_else
)]

pub mod alignment;
mod converter;
mod error;
pub mod frame;
pub mod inertia;
mod origin;
mod parser;
pub mod prune;
pub mod rotation;
pub mod tree;
mod types;
mod writer;

// Re-export main types
pub use alignment::{JointAlignment, align_joint};
pub use converter::{ConvertOptions, convert, sanitize_name, urdf_to_kindsl};
pub use error::{Result, UrdfError};
pub use frame::{Frame, FrameMap};
pub use inertia::InertiaParams;
pub use origin::link_origin;
pub use parser::{parse_urdf_file, parse_urdf_str};
pub use tree::{Joint, JointId, JointKind, KinematicTree, Link, LinkId};
pub use types::{
    UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointType, UrdfLink, UrdfOrigin, UrdfRobot,
};
pub use writer::{KindslWriter, NumFormatter};
