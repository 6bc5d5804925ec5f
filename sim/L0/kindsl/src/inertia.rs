//! Inertia parameters in the Kinematics-DSL representation.
//!
//! The tensor is stored as six scalars `(Ix, Iy, Iz, Ixy, Ixz, Iyz)` where the
//! products of inertia carry the opposite sign of the tensor entries:
//! `tensor[i][j] = -Iij` for `i != j`. Parameters are always expressed in the
//! local frame of the owning link, with the moments taken about the link
//! origin (not about the center of mass).

use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::UrdfInertial;

/// Mass, center of mass and inertia moments of a link.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InertiaParams {
    /// Mass in kg.
    pub mass: f64,
    /// Center of mass in link coordinates.
    pub com: Vector3<f64>,
    /// Moment of inertia about X.
    pub ix: f64,
    /// Moment of inertia about Y.
    pub iy: f64,
    /// Moment of inertia about Z.
    pub iz: f64,
    /// Product of inertia XY (negated tensor entry).
    pub ixy: f64,
    /// Product of inertia XZ (negated tensor entry).
    pub ixz: f64,
    /// Product of inertia YZ (negated tensor entry).
    pub iyz: f64,
}

impl Default for InertiaParams {
    fn default() -> Self {
        Self {
            mass: 0.0,
            com: Vector3::zeros(),
            ix: 0.0,
            iy: 0.0,
            iz: 0.0,
            ixy: 0.0,
            ixz: 0.0,
            iyz: 0.0,
        }
    }
}

/// Cross-product matrix: `[v]x` such that `[v]x w = v x w`.
#[inline]
fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

impl InertiaParams {
    /// Create from mass, center of mass and the six moments.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mass: f64,
        com: Vector3<f64>,
        ix: f64,
        iy: f64,
        iz: f64,
        ixy: f64,
        ixz: f64,
        iyz: f64,
    ) -> Self {
        Self {
            mass,
            com,
            ix,
            iy,
            iz,
            ixy,
            ixz,
            iyz,
        }
    }

    /// Create from mass, center of mass and a (symmetric) tensor.
    #[must_use]
    pub fn from_tensor(mass: f64, com: Vector3<f64>, tensor: &Matrix3<f64>) -> Self {
        Self {
            mass,
            com,
            ix: tensor[(0, 0)],
            iy: tensor[(1, 1)],
            iz: tensor[(2, 2)],
            ixy: -tensor[(0, 1)],
            ixz: -tensor[(0, 2)],
            iyz: -tensor[(1, 2)],
        }
    }

    /// Raw URDF inertial data, before any change of frame.
    ///
    /// The moments are about the center of mass, which is not yet accounted
    /// for: the center of mass is left at the origin and the displacement
    /// must be applied with [`InertiaParams::roto_translate`].
    #[must_use]
    pub fn from_urdf(inertial: &UrdfInertial) -> Self {
        Self::from_tensor(inertial.mass, Vector3::zeros(), &inertial.inertia.to_matrix())
    }

    /// The symmetric inertia tensor.
    #[must_use]
    pub fn tensor(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ix, -self.ixy, -self.ixz, -self.ixy, self.iy, -self.iyz, -self.ixz, -self.iyz,
            self.iz,
        )
    }

    /// Whether the link carries no mass.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_massless(&self) -> bool {
        self.mass == 0.0
    }

    /// Express the parameters in another frame.
    ///
    /// `tr` is the origin of the new frame in current coordinates and
    /// `rotation` is `new_R_current`. The moments are first moved from the
    /// current origin to `tr` with the parallel-axis theorem, then rotated.
    #[must_use]
    pub fn roto_translate(&self, tr: &Vector3<f64>, rotation: &Matrix3<f64>) -> Self {
        let com = self.com;
        let vec = com - tr;

        let com_x = skew(&com);
        let vec_x = skew(&vec);

        let tensor = self.tensor()
            - (com_x * com_x.transpose() - vec_x * vec_x.transpose()) * self.mass;
        let rotated = rotation * tensor * rotation.transpose();

        Self::from_tensor(self.mass, rotation * vec, &rotated)
    }

    /// Sum of two sets of parameters expressed in the same frame.
    ///
    /// Masses and moments add; the center of mass is the mass-weighted
    /// average. When the total mass is zero the receiver's center of mass is
    /// kept.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn combine(&self, other: &Self) -> Self {
        let mass = self.mass + other.mass;
        let com = if mass == 0.0 {
            self.com
        } else {
            (self.com * self.mass + other.com * other.mass) / mass
        };
        Self {
            mass,
            com,
            ix: self.ix + other.ix,
            iy: self.iy + other.iy,
            iz: self.iz + other.iz,
            ixy: self.ixy + other.ixy,
            ixz: self.ixz + other.ixz,
            iyz: self.iyz + other.iyz,
        }
    }
}
