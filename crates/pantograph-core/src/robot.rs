// Caller-owned robot state

use crate::linkage::{JointAngles, KinematicsError, Linkage, Point};

/// Mutable state of one robot instance.
///
/// The joint and cartesian positions are never mutated independently: every
/// write to one re-derives the other through the linkage, so the pair stays
/// consistent at all times.
#[derive(Clone, Copy, Debug)]
pub struct Robot {
    linkage: Linkage,
    joint_position: JointAngles,
    cartesian_position: Point,
    drawing: bool,
    calibrated: bool,
}

impl Robot {
    pub fn new(linkage: Linkage, initial_joint_position: JointAngles) -> Self {
        let cartesian_position = linkage.forward_kinematics(initial_joint_position);
        Self {
            linkage,
            joint_position: initial_joint_position,
            cartesian_position,
            drawing: false,
            calibrated: false,
        }
    }

    pub fn linkage(&self) -> &Linkage {
        &self.linkage
    }

    pub fn joint_position(&self) -> JointAngles {
        self.joint_position
    }

    pub fn cartesian_position(&self) -> Point {
        self.cartesian_position
    }

    /// Command the motors; the cartesian position follows through the
    /// forward transform.
    pub fn set_joint_position(&mut self, joints: JointAngles) {
        self.joint_position = joints;
        self.cartesian_position = self.linkage.forward_kinematics(joints);
    }

    /// Command the end effector; the joint angles follow through the
    /// inverse transform.
    ///
    /// Unreachable targets propagate NaN into the joint angles — gate with
    /// [`Robot::in_workspace`] first, or use
    /// [`Robot::try_set_cartesian_position`].
    pub fn set_cartesian_position(&mut self, position: Point) {
        self.cartesian_position = position;
        self.joint_position = self.linkage.inverse_kinematics(position);
    }

    /// Workspace-gated variant of [`Robot::set_cartesian_position`]; state
    /// is left untouched on error.
    pub fn try_set_cartesian_position(&mut self, position: Point) -> Result<(), KinematicsError> {
        let joints = self.linkage.try_inverse(position)?;
        self.cartesian_position = position;
        self.joint_position = joints;
        Ok(())
    }

    pub fn in_workspace(&self, position: Point) -> bool {
        self.linkage.in_workspace(position)
    }

    /// Whether the pen is down. Pure state, set by the caller.
    pub fn drawing(&self) -> bool {
        self.drawing
    }

    pub fn set_drawing(&mut self, drawing: bool) {
        self.drawing = drawing;
    }

    /// Whether joint zero-offsets have been established. Never mutated by
    /// the math core.
    pub fn calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn set_calibrated(&mut self, calibrated: bool) {
        self.calibrated = calibrated;
    }
}
