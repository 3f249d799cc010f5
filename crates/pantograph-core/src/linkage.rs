// Five-bar parallel linkage kinematics

use thiserror::Error;

/// Cartesian position in the robot base frame, meters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Angles of the two motor-driven links, radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JointAngles {
    pub theta1: f64,
    pub theta4: f64,
}

impl JointAngles {
    pub const fn new(theta1: f64, theta4: f64) -> Self {
        Self { theta1, theta4 }
    }

    pub fn is_finite(&self) -> bool {
        self.theta1.is_finite() && self.theta4.is_finite()
    }
}

#[derive(Debug, Error)]
pub enum KinematicsError {
    #[error("target ({x:.4}, {y:.4}) is outside the reachable workspace")]
    Unreachable { x: f64, y: f64 },

    #[error("joint angles ({theta1:.4}, {theta4:.4}) do not close the linkage")]
    NoClosure { theta1: f64, theta4: f64 },
}

/// Root selection for the tan-half-angle quadratic.
///
/// Each solve has two roots, one per fold direction of the link pair. The
/// fixed choices below pin the mechanism to a single assembly mode; the
/// forward and inverse transforms only round-trip because they match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyBranch {
    Positive,
    Negative,
}

impl AssemblyBranch {
    const fn signum(self) -> f64 {
        match self {
            AssemblyBranch::Positive => 1.0,
            AssemblyBranch::Negative => -1.0,
        }
    }
}

/// Passive-link angle in the forward transform.
const PASSIVE_BRANCH: AssemblyBranch = AssemblyBranch::Negative;
/// Pivot-1 joint angle in the inverse transform.
const THETA1_BRANCH: AssemblyBranch = AssemblyBranch::Positive;
/// Pivot-4 joint angle in the inverse transform.
const THETA4_BRANCH: AssemblyBranch = AssemblyBranch::Negative;

/// Solve `E cos(q) + F sin(q) = G` for `q`.
///
/// A negative discriminant (the two circles do not intersect) yields NaN,
/// which is left to propagate per the garbage-in, garbage-out contract.
fn half_angle(e: f64, f: f64, g: f64, branch: AssemblyBranch) -> f64 {
    let disc = e * e + f * f - g * g;
    2.0 * ((-f + branch.signum() * disc.sqrt()) / (g - e)).atan()
}

/// Five-bar linkage geometry.
///
/// Motor pivots sit at `(0, 0)` and `(motor_distance, 0)`. Each motor drives
/// a base arm of length `base_arm_length` whose elbow connects through a
/// passive link of length `link_arm_length` to the shared end-effector
/// joint. An optional tool-center-point offset shifts the commanded frame
/// relative to that joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Linkage {
    motor_distance: f64,
    base_arm_length: f64,
    link_arm_length: f64,
    tcp_offset: Point,
}

impl Linkage {
    pub const fn new(motor_distance: f64, base_arm_length: f64, link_arm_length: f64) -> Self {
        Self {
            motor_distance,
            base_arm_length,
            link_arm_length,
            tcp_offset: Point::new(0.0, 0.0),
        }
    }

    pub const fn with_tcp_offset(mut self, tcp_offset: Point) -> Self {
        self.tcp_offset = tcp_offset;
        self
    }

    pub fn motor_distance(&self) -> f64 {
        self.motor_distance
    }

    pub fn base_arm_length(&self) -> f64 {
        self.base_arm_length
    }

    pub fn link_arm_length(&self) -> f64 {
        self.link_arm_length
    }

    pub fn tcp_offset(&self) -> Point {
        self.tcp_offset
    }

    /// Joint angles to end-effector position.
    ///
    /// Builds the circle-intersection equations for the passive joint from
    /// the two elbow positions and solves the resulting quadratic for the
    /// passive-link angle, then places the end effector off the theta4
    /// elbow. Joint pairs that cannot close the linkage produce NaN.
    pub fn forward_kinematics(&self, joints: JointAngles) -> Point {
        let JointAngles { theta1, theta4 } = joints;
        let la = self.base_arm_length;
        let lb = self.link_arm_length;
        let lc = self.motor_distance;

        let e = 2.0 * lb * (lc + la * (theta4.cos() - theta1.cos()));
        let f = 2.0 * la * lb * (theta4.sin() - theta1.sin());
        let g = lc * lc + 2.0 * la * la + 2.0 * lc * la * theta4.cos()
            - 2.0 * lc * la * theta1.cos()
            - 2.0 * la * la * (theta4 - theta1).cos();

        let phi = half_angle(e, f, g, PASSIVE_BRANCH);

        Point {
            x: lc + la * theta4.cos() + lb * phi.cos() + self.tcp_offset.x,
            y: la * theta4.sin() + lb * phi.sin() + self.tcp_offset.y,
        }
    }

    /// End-effector position to joint angles.
    ///
    /// The two pivots are solved independently, each as the intersection of
    /// the base-arm circle around the pivot with the link-arm circle around
    /// the target. Unreachable targets produce NaN; gate with
    /// [`Linkage::in_workspace`] or use [`Linkage::try_inverse`].
    pub fn inverse_kinematics(&self, position: Point) -> JointAngles {
        let la = self.base_arm_length;
        let lb = self.link_arm_length;
        let lc = self.motor_distance;
        let x = position.x - self.tcp_offset.x;
        let y = position.y - self.tcp_offset.y;

        let e1 = -2.0 * la * x;
        let f1 = -2.0 * la * y;
        let g1 = la * la - lb * lb + x * x + y * y;

        let e4 = 2.0 * la * (lc - x);
        let f4 = -2.0 * la * y;
        let g4 = lc * lc + la * la - lb * lb + x * x + y * y - 2.0 * lc * x;

        JointAngles {
            theta1: half_angle(e1, f1, g1, THETA1_BRANCH),
            theta4: half_angle(e4, f4, g4, THETA4_BRANCH),
        }
    }

    /// Reachability test.
    ///
    /// The end effector must lie within the annulus
    /// `[|la - lb|, la + lb]` around both motor pivots; all four bounds are
    /// inclusive. This is necessary and sufficient for the inverse transform
    /// to have a real solution.
    pub fn in_workspace(&self, position: Point) -> bool {
        let la = self.base_arm_length;
        let lb = self.link_arm_length;
        let lc = self.motor_distance;
        let x = position.x - self.tcp_offset.x;
        let y = position.y - self.tcp_offset.y;

        let inner = (la - lb) * (la - lb);
        let outer = (la + lb) * (la + lb);
        let d1 = x * x + y * y;
        let d4 = (x - lc) * (x - lc) + y * y;

        d1 >= inner && d4 >= inner && d1 <= outer && d4 <= outer
    }

    /// Workspace-checked inverse transform.
    pub fn try_inverse(&self, position: Point) -> Result<JointAngles, KinematicsError> {
        if !self.in_workspace(position) {
            return Err(KinematicsError::Unreachable {
                x: position.x,
                y: position.y,
            });
        }
        let joints = self.inverse_kinematics(position);
        if !joints.is_finite() {
            return Err(KinematicsError::Unreachable {
                x: position.x,
                y: position.y,
            });
        }
        Ok(joints)
    }

    /// Closure-checked forward transform.
    pub fn try_forward(&self, joints: JointAngles) -> Result<Point, KinematicsError> {
        let position = self.forward_kinematics(joints);
        if !position.is_finite() {
            return Err(KinematicsError::NoClosure {
                theta1: joints.theta1,
                theta4: joints.theta4,
            });
        }
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn linkage() -> Linkage {
        Linkage::new(0.08, 0.08, 0.12)
    }

    #[test]
    fn forward_matches_known_pose() {
        let p = linkage().forward_kinematics(JointAngles::new(FRAC_PI_2, FRAC_PI_2));
        assert!((p.x - 0.04).abs() < 1e-12);
        assert!((p.y - 0.1931370849898476).abs() < 1e-12);
    }

    #[test]
    fn round_trip_within_assembly_range() {
        let linkage = linkage();
        for (theta1, theta4) in [
            (1.9, 1.1),
            (2.2, 0.9),
            (FRAC_PI_2, FRAC_PI_2),
            (2.0, 1.4),
        ] {
            let joints = JointAngles::new(theta1, theta4);
            let p = linkage.forward_kinematics(joints);
            let back = linkage.inverse_kinematics(p);
            assert!(
                (back.theta1 - theta1).abs() < 1e-9 && (back.theta4 - theta4).abs() < 1e-9,
                "round trip failed for ({theta1}, {theta4}): got ({}, {})",
                back.theta1,
                back.theta4
            );
        }
    }

    #[test]
    fn workspace_membership() {
        let linkage = linkage();
        assert!(linkage.in_workspace(Point::new(0.04, 0.15)));
        assert!(linkage.in_workspace(Point::new(0.04, 0.19)));
        assert!(linkage.in_workspace(Point::new(0.12, 0.15)));
        assert!(!linkage.in_workspace(Point::new(1.0, 1.0)));
        // within reach of pivot 1 but not pivot 4
        assert!(!linkage.in_workspace(Point::new(0.0, 0.2)));
    }

    #[test]
    fn workspace_boundary_is_inclusive() {
        let linkage = linkage();
        let outer = linkage.base_arm_length() + linkage.link_arm_length();
        let inner = linkage.link_arm_length() - linkage.base_arm_length();

        assert!(linkage.in_workspace(Point::new(outer, 0.0)));
        assert!(!linkage.in_workspace(Point::new(outer + 1e-9, 0.0)));
        assert!(linkage.in_workspace(Point::new(inner, 0.0)));
        assert!(!linkage.in_workspace(Point::new(inner - 1e-9, 0.0)));
    }

    #[test]
    fn reachable_targets_solve_to_finite_angles() {
        let linkage = linkage();
        let p = Point::new(0.04, 0.15);
        assert!(linkage.in_workspace(p));
        assert!(linkage.inverse_kinematics(p).is_finite());
    }

    #[test]
    fn unreachable_targets_solve_to_nan() {
        let linkage = linkage();
        let p = Point::new(1.0, 1.0);
        assert!(!linkage.in_workspace(p));
        let joints = linkage.inverse_kinematics(p);
        assert!(joints.theta1.is_nan());
        assert!(joints.theta4.is_nan());
    }

    #[test]
    fn try_inverse_reports_unreachable() {
        let err = linkage().try_inverse(Point::new(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, KinematicsError::Unreachable { .. }));
        assert!(
            linkage()
                .try_inverse(Point::new(0.04, 0.15))
                .unwrap()
                .is_finite()
        );
    }

    #[test]
    fn try_forward_reports_open_linkage() {
        // Short passive links: with the arms folded outward the elbows sit
        // further apart than the links can span.
        let short_links = Linkage::new(0.10, 0.05, 0.05);
        let err = short_links
            .try_forward(JointAngles::new(std::f64::consts::PI, 0.0))
            .unwrap_err();
        assert!(matches!(err, KinematicsError::NoClosure { .. }));
    }

    #[test]
    fn tcp_offset_shifts_the_commanded_frame() {
        let plain = linkage();
        let offset = Point::new(0.01, 0.02);
        let shifted = linkage().with_tcp_offset(offset);
        let joints = JointAngles::new(1.9, 1.1);

        let p0 = plain.forward_kinematics(joints);
        let p1 = shifted.forward_kinematics(joints);
        assert!((p1.x - p0.x - offset.x).abs() < 1e-12);
        assert!((p1.y - p0.y - offset.y).abs() < 1e-12);

        let back = shifted.inverse_kinematics(p1);
        assert!((back.theta1 - joints.theta1).abs() < 1e-9);
        assert!((back.theta4 - joints.theta4).abs() < 1e-9);

        assert!(shifted.in_workspace(Point::new(0.04 + offset.x, 0.15 + offset.y)));
    }
}
