//! Property-based tests for the conversion engine.
//!
//! Run with: cargo test -p sim-kindsl -- proptest

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;
use proptest::prelude::*;
use sim_kindsl::prune::prune;
use sim_kindsl::rotation::{intrinsic_xyz, intrinsic_xyz_angles};
use sim_kindsl::{
    ConvertOptions, InertiaParams, KinematicTree, UrdfInertia, UrdfInertial, UrdfJoint,
    UrdfJointType, UrdfLink, UrdfOrigin, UrdfRobot, convert,
};

// =============================================================================
// Strategies
// =============================================================================

fn arb_angles() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-PI..PI)
}

fn arb_vector(range: f64) -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(-range..range).prop_map(|[x, y, z]| Vector3::new(x, y, z))
}

fn arb_inertia() -> impl Strategy<Value = InertiaParams> {
    (
        0.0..10.0f64,
        arb_vector(1.0),
        prop::array::uniform3(0.1..2.0f64),
        prop::array::uniform3(-0.05..0.05f64),
    )
        .prop_map(|(mass, com, [ix, iy, iz], [ixy, ixz, iyz])| {
            InertiaParams::new(mass, com, ix, iy, iz, ixy, ixz, iyz)
        })
}

fn arb_joint_type() -> impl Strategy<Value = UrdfJointType> {
    prop_oneof![
        Just(UrdfJointType::Fixed),
        Just(UrdfJointType::Fixed),
        Just(UrdfJointType::Revolute),
        Just(UrdfJointType::Continuous),
        Just(UrdfJointType::Prismatic),
    ]
}

fn arb_mass() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.1..5.0f64]
}

fn arb_origin() -> impl Strategy<Value = UrdfOrigin> {
    (arb_vector(1.0), arb_angles())
        .prop_map(|(xyz, [r, p, y])| UrdfOrigin::new(xyz, Vector3::new(r, p, y)))
}

/// A random tree: link `i > 0` hangs from a link with a smaller index.
fn arb_robot(max_links: usize) -> impl Strategy<Value = UrdfRobot> {
    (1..=max_links).prop_flat_map(|n| {
        let links = prop::collection::vec((arb_mass(), arb_origin()), n);
        let joints = prop::collection::vec(
            (any::<prop::sample::Index>(), arb_joint_type(), arb_origin(), arb_vector(1.0)),
            n - 1,
        );
        (links, joints).prop_map(|(links, joints)| {
            let mut robot = UrdfRobot::new("random");
            for (i, (mass, com)) in links.into_iter().enumerate() {
                let mut link = UrdfLink::new(format!("l{i}"));
                if mass > 0.0 {
                    link = link.with_inertial(
                        UrdfInertial::with_mass(mass)
                            .with_origin(UrdfOrigin::new(com.xyz, Vector3::zeros()))
                            .with_inertia(UrdfInertia::diagonal(0.1, 0.2, 0.3)),
                    );
                }
                robot = robot.with_link(link);
            }
            for (i, (parent, joint_type, origin, axis)) in joints.into_iter().enumerate() {
                let child = i + 1;
                let parent = parent.index(child);
                robot = robot.with_joint(
                    UrdfJoint::new(
                        format!("j{child}"),
                        joint_type,
                        format!("l{parent}"),
                        format!("l{child}"),
                    )
                    .with_origin(origin)
                    .with_axis(axis),
                );
            }
            robot
        })
    })
}

fn assert_tree_consistent(tree: &KinematicTree) -> Result<(), TestCaseError> {
    let root = tree.root_link().ok_or_else(|| TestCaseError::fail("no root"))?;
    prop_assert!(root.parent.is_none());
    prop_assert!(root.parent_joint.is_none());

    for (id, link) in tree.links() {
        if id == tree.root() {
            continue;
        }
        let parent = link.parent.and_then(|p| tree.link(p));
        let joint = link.parent_joint.and_then(|j| tree.joint(j));
        prop_assert!(parent.is_some(), "link {} lost its parent", link.name);
        prop_assert!(joint.is_some(), "link {} lost its joint", link.name);
        let parent = parent.ok_or_else(|| TestCaseError::fail("parent"))?;
        prop_assert!(parent.children.iter().any(|(c, _)| *c == id));
    }
    for id in tree.leaves() {
        prop_assert!(tree.link(*id).is_some_and(|l| l.children.is_empty()));
    }
    Ok(())
}

// =============================================================================
// Property Tests: Rotation Algebra
// =============================================================================

proptest! {
    /// Extracted angles rebuild the same matrix.
    #[test]
    fn angles_rebuild_matrix([rx, ry, rz] in arb_angles()) {
        let r = intrinsic_xyz(rx, ry, rz);
        let a = intrinsic_xyz_angles(&r);
        let rebuilt = intrinsic_xyz(a.x, a.y, a.z);
        prop_assert!((rebuilt - r).amax() < 1e-6);
    }

    /// The same holds at gimbal lock, where rz is folded into rx.
    #[test]
    fn angles_rebuild_matrix_at_singularity(rx in -PI..PI, rz in -PI..PI, up in any::<bool>()) {
        let ry = if up { FRAC_PI_2 } else { -FRAC_PI_2 };
        let r = intrinsic_xyz(rx, ry, rz);
        let a = intrinsic_xyz_angles(&r);
        prop_assert_eq!(a.y, ry);
        prop_assert_eq!(a.z, 0.0);
        let rebuilt = intrinsic_xyz(a.x, a.y, a.z);
        prop_assert!((rebuilt - r).amax() < 1e-9);
    }
}

// =============================================================================
// Property Tests: Inertia Transport
// =============================================================================

proptest! {
    /// Transport keeps the mass and the inverse transport restores the tensor.
    #[test]
    fn transport_is_invertible(
        inertia in arb_inertia(),
        tr in arb_vector(2.0),
        [rx, ry, rz] in arb_angles(),
    ) {
        let r = intrinsic_xyz(rx, ry, rz);
        let moved = inertia.roto_translate(&tr, &r);
        prop_assert_eq!(moved.mass, inertia.mass);

        let back = moved.roto_translate(&(-(r * tr)), &r.transpose());
        prop_assert!((back.tensor() - inertia.tensor()).amax() < 1e-9);
        prop_assert!((back.com - inertia.com).amax() < 1e-9);
    }

    /// A pure rotation keeps the trace of the tensor.
    #[test]
    fn rotation_keeps_trace(inertia in arb_inertia(), [rx, ry, rz] in arb_angles()) {
        let r = intrinsic_xyz(rx, ry, rz);
        let centered = InertiaParams { com: Vector3::zeros(), ..inertia };
        let moved = centered.roto_translate(&Vector3::zeros(), &r);
        prop_assert!((moved.tensor().trace() - centered.tensor().trace()).abs() < 1e-9);
        prop_assert!((moved.tensor() - moved.tensor().transpose()).amax() < 1e-12);
    }
}

// =============================================================================
// Property Tests: Conversion and Pruning
// =============================================================================

proptest! {
    /// Every joint frame puts its Z axis on the URDF joint axis.
    #[test]
    fn joint_z_matches_urdf_axis(robot in arb_robot(6)) {
        let tree = convert(&robot, &ConvertOptions::default()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        for (id, joint) in tree.joints() {
            if joint.kind == sim_kindsl::JointKind::Fixed {
                continue;
            }
            let urdf = &robot.joints[id.raw()];
            let parent = tree.link(joint.predecessor).ok_or_else(|| TestCaseError::fail("parent"))?;
            let expected = parent.convention_offset * urdf.origin.rotation_matrix() * urdf.axis;
            let z = joint.frame.rotation().column(2).into_owned();
            prop_assert!((z - expected).amax() < 1e-4, "joint {}: {:?} vs {:?}", joint.name, z, expected);
        }
    }

    /// Pruning with lumping keeps the total mass.
    #[test]
    fn pruning_conserves_mass(robot in arb_robot(8)) {
        let plain = convert(&robot, &ConvertOptions::default()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let options = ConvertOptions::default().with_prune_fixed_joints(true);
        let pruned = convert(&robot, &options).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert!(pruned.link_count() <= plain.link_count());
        prop_assert!((pruned.total_mass() - plain.total_mass()).abs() < 1e-9);
        assert_tree_consistent(&pruned)?;
    }

    /// Pruning again changes nothing.
    #[test]
    fn pruning_is_idempotent(robot in arb_robot(8)) {
        let options = ConvertOptions::default().with_prune_fixed_joints(true);
        let pruned = convert(&robot, &options).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let mut again = pruned.clone();
        prune(&mut again, &options);
        prop_assert_eq!(again, pruned);
    }

    /// No unprotected fixed leaf survives pruning.
    #[test]
    fn pruning_leaves_no_fixed_leaf(robot in arb_robot(8)) {
        let options = ConvertOptions::default().with_prune_fixed_joints(true);
        let pruned = convert(&robot, &options).map_err(|e| TestCaseError::fail(e.to_string()))?;
        for id in pruned.leaves() {
            let joint = pruned
                .link(*id)
                .and_then(|l| l.parent_joint)
                .and_then(|j| pruned.joint(j));
            if let Some(joint) = joint {
                prop_assert!(joint.kind != sim_kindsl::JointKind::Fixed || joint.protected);
            }
        }
    }

    /// A chain of massless links on fixed joints collapses onto the massive tip.
    #[test]
    fn dummy_chain_collapses(n in 0usize..6, origins in prop::collection::vec(arb_origin(), 6)) {
        let mut robot = UrdfRobot::new("chain");
        for i in 0..n {
            robot = robot.with_link(UrdfLink::new(format!("dummy{i}")));
        }
        robot = robot.with_link(UrdfLink::new("body").with_inertial(
            UrdfInertial::with_mass(3.0).with_inertia(UrdfInertia::diagonal(1.0, 2.0, 3.0)),
        ));
        for i in 0..n {
            let child = if i + 1 == n { "body".to_string() } else { format!("dummy{}", i + 1) };
            robot = robot.with_joint(
                UrdfJoint::new(format!("f{i}"), UrdfJointType::Fixed, format!("dummy{i}"), child)
                    .with_origin(origins[i]),
            );
        }

        let options = ConvertOptions::default().with_prune_fixed_joints(true);
        let tree = convert(&robot, &options).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(tree.link_count(), 1);
        prop_assert_eq!(tree.joint_count(), 0);
        let root = tree.root_link().ok_or_else(|| TestCaseError::fail("no root"))?;
        prop_assert_eq!(root.name.as_str(), "body");
        prop_assert_eq!(root.inertia.mass, 3.0);
    }
}
