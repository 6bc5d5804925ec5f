//! Kinematics-DSL document writer.
//!
//! The layout is:
//!
//! ```text
//! Robot <name>
//! {
//!
//! RobotBase <root> [floating] {
//!     inertia_properties { ... }
//!     children { <child> via <joint> }
//!     frames { ... }
//! }
//!
//! link <name> {
//!     id = <n>
//!     ...
//! }
//!
//! r_joint <name> {
//!     ref_frame { ... }
//! }
//!
//! }
//! ```
//!
//! Links are written depth-first from the root, joints in source order.

use std::f64::consts::{FRAC_PI_2, PI};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::inertia::InertiaParams;
use crate::rotation::intrinsic_xyz_angles;
use crate::tree::{JointKind, KinematicTree, Link};

/// Convention-offset angles above this magnitude get an explicit
/// `urdf_<link>` frame.
const OFFSET_FRAME_EPS: f64 = 1e-5;

/// Round to `digits` decimals, correctly rounded from the binary value.
fn round_decimal(value: f64, digits: u32) -> f64 {
    format!("{value:.prec$}", prec = digits as usize)
        .parse()
        .unwrap_or(value)
}

/// Pretty printer for real numbers.
///
/// Numbers are rounded to `digits` decimals and printed with at most
/// `digits` significant digits, without trailing zeros. Angles that match
/// `PI` or `PI/2` up to `pi_digits` decimals are printed symbolically.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NumFormatter {
    digits: u32,
    pi_digits: u32,
}

impl Default for NumFormatter {
    fn default() -> Self {
        Self::new(6, 5)
    }
}

impl NumFormatter {
    /// Create a formatter.
    #[must_use]
    pub const fn new(digits: u32, pi_digits: u32) -> Self {
        Self { digits, pi_digits }
    }

    /// Format a plain number.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn format(&self, value: f64) -> String {
        // Adding zero turns -0.0 into 0.0
        let value = round_decimal(value, self.digits) + 0.0;
        if value == 0.0 {
            return "0.0".to_string();
        }

        let precision = self.digits.max(1) as usize;
        let scientific = format!("{:.*e}", precision - 1, value);
        let exponent: i64 = scientific
            .rsplit('e')
            .next()
            .and_then(|e| e.parse().ok())
            .unwrap_or(0);

        if exponent < -4 || exponent >= precision as i64 - 1 {
            // Would need an exponent: fall back to fixed notation
            return format!("{:.*}", self.digits as usize, value);
        }

        let decimals = (precision as i64 - 1 - exponent) as usize;
        let mut out = format!("{value:.decimals$}");
        if out.contains('.') {
            let trimmed = out.trim_end_matches('0').len();
            out.truncate(trimmed);
            if out.ends_with('.') {
                out.push('0');
            }
        } else {
            out.push_str(".0");
        }
        out
    }

    /// Format an angle in radians.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn format_angle(&self, value: f64) -> String {
        let rounded = round_decimal(value, self.pi_digits);
        let sign = if rounded < 0.0 { "-" } else { "" };
        if rounded.abs() == round_decimal(PI, self.pi_digits) {
            return format!("{sign}PI");
        }
        if rounded.abs() == round_decimal(FRAC_PI_2, self.pi_digits) {
            return format!("{sign}PI/2.0");
        }
        self.format(value)
    }
}

/// Serializer of a [`KinematicTree`] into a Kinematics-DSL document.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KindslWriter {
    formatter: NumFormatter,
    floating: bool,
}

impl KindslWriter {
    /// Create a writer with default formatting and a fixed base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom number formatter.
    #[must_use]
    pub const fn with_formatter(mut self, formatter: NumFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Declare the robot base as floating.
    #[must_use]
    pub const fn with_floating(mut self, floating: bool) -> Self {
        self.floating = floating;
        self
    }

    /// Render the whole document.
    #[must_use]
    pub fn write_model(&self, tree: &KinematicTree) -> String {
        let mut out = Output::new(&self.formatter);
        out.write_line(&format!("Robot {}\n{{\n", tree.robot_name()));

        if let Some(base) = tree.root_link() {
            if self.floating {
                out.block_start(&format!("RobotBase {} floating", base.name));
            } else {
                out.block_start(&format!("RobotBase {}", base.name));
            }
            out.link_body(tree, base);
            out.block_end();
            out.write_line("\n");
        }

        for (n, id) in tree.depth_first().into_iter().enumerate() {
            let Some(link) = tree.link(id) else {
                continue;
            };
            out.block_start(&format!("link {}", link.name));
            out.write_line(&format!("id = {}", n + 1));
            out.link_body(tree, link);
            out.block_end();
            out.write_line("\n");
        }

        for (_, joint) in tree.joints() {
            let keyword = match joint.kind {
                JointKind::Prismatic => "p_joint",
                JointKind::Revolute | JointKind::Fixed => "r_joint",
            };
            out.block_start(&format!("{keyword} {}", joint.name));
            out.block_start("ref_frame");
            out.frame(&joint.frame);
            out.block_end();
            out.block_end();
            out.write_line("");
        }

        out.write_line("}\n");
        out.output
    }
}

/// Output buffer with indentation.
struct Output<'a> {
    formatter: &'a NumFormatter,
    output: String,
    indent: usize,
}

impl<'a> Output<'a> {
    fn new(formatter: &'a NumFormatter) -> Self {
        Self {
            formatter,
            output: String::with_capacity(4096),
            indent: 0,
        }
    }

    fn write_line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    fn block_start(&mut self, name: &str) {
        self.write_line(&format!("{name} {{"));
        self.indent += 1;
    }

    fn block_end(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.write_line("}");
    }

    fn vec3(&self, prefix: &str, v: [f64; 3], angles: bool) -> String {
        let f = |x: f64| {
            if angles {
                self.formatter.format_angle(x)
            } else {
                self.formatter.format(x)
            }
        };
        format!("{prefix}({}, {}, {})", f(v[0]), f(v[1]), f(v[2]))
    }

    fn frame_values(&mut self, translation: [f64; 3], angles: [f64; 3]) {
        let t = self.vec3("translation = ", translation, false);
        let r = self.vec3("rotation    = ", angles, true);
        self.write_line(&t);
        self.write_line(&r);
    }

    fn frame(&mut self, frame: &Frame) {
        self.frame_values((*frame.translation()).into(), (*frame.angles()).into());
    }

    fn link_body(&mut self, tree: &KinematicTree, link: &Link) {
        self.inertia(&link.inertia);
        self.children(tree, link);
        self.user_frames(link);
    }

    fn inertia(&mut self, params: &InertiaParams) {
        self.block_start("inertia_properties");
        let mass = self.formatter.format(params.mass);
        self.write_line(&format!("mass = {mass}"));
        let com = self.vec3("CoM = ", params.com.into(), false);
        self.write_line(&com);
        for (label, value) in [
            ("Ix", params.ix),
            ("Iy", params.iy),
            ("Iz", params.iz),
            ("Ixy", params.ixy),
            ("Ixz", params.ixz),
            ("Iyz", params.iyz),
        ] {
            let value = self.formatter.format(value);
            self.write_line(&format!("{label:<3} = {value}"));
        }
        self.block_end();
    }

    fn children(&mut self, tree: &KinematicTree, link: &Link) {
        self.block_start("children");
        for &(child, joint) in &link.children {
            if let (Some(c), Some(j)) = (tree.link(child), tree.joint(joint)) {
                self.write_line(&format!("{} via {}", c.name, j.name));
            }
        }
        self.block_end();
    }

    fn user_frames(&mut self, link: &Link) {
        let offset = intrinsic_xyz_angles(&link.convention_offset);
        let needs_offset_frame = offset.iter().any(|a| a.abs() > OFFSET_FRAME_EPS);
        if !needs_offset_frame && link.frames.is_empty() {
            return;
        }

        self.block_start("frames");
        for (name, frame) in link.frames.iter() {
            self.block_start(name);
            self.frame(frame);
            self.block_end();
        }
        if needs_offset_frame {
            self.block_start(&format!("urdf_{}", link.name));
            self.frame_values([0.0; 3], offset.into());
            self.block_end();
        }
        self.block_end();
    }
}
