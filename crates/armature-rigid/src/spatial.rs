//! Spatial (6D) vector algebra.
//!
//! Motion vectors are `[ω; v]` and force vectors `[τ; f]`, angular
//! block first. A [`SpatialInertia`] is kept in the decomposed form
//! `(mass, com, inertia about the body origin)`, which makes frame
//! changes and composite accumulation plain vector arithmetic instead
//! of 6×6 congruence products.

use nalgebra::{Isometry3, Matrix3, Vector3, Vector6};

/// 6D spatial vector, angular block in rows 0..3, linear in rows 3..6.
pub type SpatialVec = Vector6<f64>;

/// Assemble a spatial vector from its angular and linear parts.
#[inline]
pub fn spatial(angular: Vector3<f64>, linear: Vector3<f64>) -> SpatialVec {
    SpatialVec::new(
        angular.x, angular.y, angular.z, linear.x, linear.y, linear.z,
    )
}

/// Angular part of a spatial vector.
#[inline]
pub fn angular(s: &SpatialVec) -> Vector3<f64> {
    Vector3::new(s[0], s[1], s[2])
}

/// Linear part of a spatial vector.
#[inline]
pub fn linear(s: &SpatialVec) -> Vector3<f64> {
    Vector3::new(s[3], s[4], s[5])
}

/// Spatial cross product of motion vectors, `m × s`.
#[inline]
pub fn cross_motion(m: &SpatialVec, s: &SpatialVec) -> SpatialVec {
    let w = angular(m);
    let v = linear(m);
    let s_ang = angular(s);
    let s_lin = linear(s);
    spatial(w.cross(&s_ang), w.cross(&s_lin) + v.cross(&s_ang))
}

/// Spatial cross product of a motion and a force vector, `m ×* f`.
#[inline]
pub fn cross_force(m: &SpatialVec, f: &SpatialVec) -> SpatialVec {
    let w = angular(m);
    let v = linear(m);
    let f_ang = angular(f);
    let f_lin = linear(f);
    spatial(w.cross(&f_ang) + v.cross(&f_lin), w.cross(&f_lin))
}

/// Express a parent-frame motion vector in child coordinates.
///
/// `pose` is the child frame's pose in the parent frame.
#[inline]
pub fn motion_to_child(pose: &Isometry3<f64>, m: &SpatialVec) -> SpatialVec {
    let r_inv = pose.rotation.inverse();
    let p = pose.translation.vector;
    let w = angular(m);
    let v = linear(m);
    spatial(r_inv * w, r_inv * (v + w.cross(&p)))
}

/// Express a child-frame force vector in parent coordinates.
///
/// `pose` is the child frame's pose in the parent frame. This is the
/// dual of [`motion_to_child`]; the pair preserves the power product
/// `f · m` across the frame change.
#[inline]
pub fn force_to_parent(pose: &Isometry3<f64>, f: &SpatialVec) -> SpatialVec {
    let r = &pose.rotation;
    let p = pose.translation.vector;
    let n = r * angular(f);
    let lin = r * linear(f);
    spatial(n + p.cross(&lin), lin)
}

// ── SpatialInertia ─────────────────────────────────────────────────

/// Rigid-body inertia in decomposed form.
///
/// `inertia_origin` is the 3×3 rotational inertia about the carrying
/// frame's origin (not the centre of mass), expressed in that frame's
/// axes, so applying the inertia to a motion vector needs no shifting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialInertia {
    /// Mass (kg).
    pub mass: f64,
    /// Centre of mass in the carrying frame (m).
    pub com: Vector3<f64>,
    /// Rotational inertia about the frame origin, frame axes.
    pub inertia_origin: Matrix3<f64>,
}

impl SpatialInertia {
    /// The zero inertia.
    pub fn zero() -> Self {
        Self {
            mass: 0.0,
            com: Vector3::zeros(),
            inertia_origin: Matrix3::zeros(),
        }
    }

    /// Build from mass, centre of mass, and inertia about the centre
    /// of mass (the form URDF documents use).
    pub fn from_com_inertia(mass: f64, com: Vector3<f64>, inertia_com: Matrix3<f64>) -> Self {
        Self {
            mass,
            com,
            inertia_origin: inertia_com + mass * parallel_axis(&com),
        }
    }

    /// Rotational inertia about the centre of mass.
    pub fn inertia_com(&self) -> Matrix3<f64> {
        self.inertia_origin - self.mass * parallel_axis(&self.com)
    }

    /// Apply the inertia to a motion vector, producing a force vector.
    ///
    /// `[τ; f] = [I₀ ω + m c × v ; m (v + ω × c)]`.
    #[inline]
    pub fn apply(&self, m: &SpatialVec) -> SpatialVec {
        let w = angular(m);
        let v = linear(m);
        spatial(
            self.inertia_origin * w + self.mass * self.com.cross(&v),
            self.mass * (v + w.cross(&self.com)),
        )
    }

    /// Express this inertia in the parent frame, where `pose` is the
    /// carrying frame's pose in the parent.
    ///
    /// Decomposes to centre-of-mass form, moves the decomposition, and
    /// rebuilds about the parent origin (parallel axis both ways).
    pub fn to_parent(&self, pose: &Isometry3<f64>) -> Self {
        if self.mass == 0.0 {
            return Self::zero();
        }
        let r = pose.rotation.to_rotation_matrix();
        let com_parent = pose * nalgebra::Point3::from(self.com);
        let inertia_com_parent = r.matrix() * self.inertia_com() * r.matrix().transpose();
        Self::from_com_inertia(self.mass, com_parent.coords, inertia_com_parent)
    }

    /// Accumulate another inertia expressed about the same origin.
    pub fn add_assign(&mut self, other: &Self) {
        let total = self.mass + other.mass;
        if total > 0.0 {
            self.com = (self.mass * self.com + other.mass * other.com) / total;
        }
        self.mass = total;
        self.inertia_origin += other.inertia_origin;
    }
}

/// The parallel-axis matrix `|c|²·1 − c cᵀ` for an offset `c`.
fn parallel_axis(c: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::identity() * c.norm_squared() - c * c.transpose()
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn cross_products_duality() {
        // Power invariance: (m1 × m2) · f == -(m2 · (m1 ×* f)).
        let m1 = spatial(Vector3::new(0.1, -0.2, 0.3), Vector3::new(1.0, 2.0, -1.0));
        let m2 = spatial(Vector3::new(-0.4, 0.5, 0.6), Vector3::new(0.2, -0.7, 0.9));
        let f = spatial(Vector3::new(2.0, 0.5, -1.5), Vector3::new(-0.3, 1.1, 0.8));
        let lhs = cross_motion(&m1, &m2).dot(&f);
        let rhs = -m2.dot(&cross_force(&m1, &f));
        assert_relative_eq!(lhs, rhs, epsilon = 1.0e-12);
    }

    #[test]
    fn motion_force_transform_preserves_power() {
        let pose = Isometry3::from_parts(
            Translation3::new(0.3, -0.1, 1.2),
            UnitQuaternion::from_euler_angles(0.2, -0.4, 0.9),
        );
        let m_parent = spatial(Vector3::new(0.1, 0.2, 0.3), Vector3::new(-1.0, 0.5, 2.0));
        let f_child = spatial(Vector3::new(1.5, -0.5, 0.25), Vector3::new(0.75, 2.0, -1.0));
        // f_parent · m_parent == f_child · m_child
        let lhs = force_to_parent(&pose, &f_child).dot(&m_parent);
        let rhs = f_child.dot(&motion_to_child(&pose, &m_parent));
        assert_relative_eq!(lhs, rhs, epsilon = 1.0e-12);
    }

    #[test]
    fn inertia_round_trips_through_com_form() {
        let inertia = SpatialInertia::from_com_inertia(
            2.5,
            Vector3::new(0.1, -0.2, 0.4),
            Matrix3::from_diagonal(&Vector3::new(0.3, 0.4, 0.5)),
        );
        let back = inertia.inertia_com();
        assert_relative_eq!(back[(0, 0)], 0.3, epsilon = 1.0e-12);
        assert_relative_eq!(back[(1, 1)], 0.4, epsilon = 1.0e-12);
        assert_relative_eq!(back[(2, 2)], 0.5, epsilon = 1.0e-12);
        assert_relative_eq!(back[(0, 1)], 0.0, epsilon = 1.0e-12);
    }

    #[test]
    fn transform_then_inverse_transform_is_identity() {
        let inertia = SpatialInertia::from_com_inertia(
            1.75,
            Vector3::new(0.0, 0.3, -0.6),
            Matrix3::from_diagonal(&Vector3::new(0.2, 0.1, 0.15)),
        );
        let pose = Isometry3::from_parts(
            Translation3::new(-0.5, 0.2, 0.9),
            UnitQuaternion::from_euler_angles(0.5, 0.1, -0.3),
        );
        let round = inertia.to_parent(&pose).to_parent(&pose.inverse());
        assert_relative_eq!(round.mass, inertia.mass, epsilon = 1.0e-12);
        assert_relative_eq!(round.com, inertia.com, epsilon = 1.0e-10);
        assert_relative_eq!(
            round.inertia_origin,
            inertia.inertia_origin,
            epsilon = 1.0e-10
        );
    }

    #[test]
    fn transformed_inertia_agrees_on_energy() {
        // Kinetic energy ½ vᵀIv must not depend on the frame it is
        // evaluated in.
        let inertia = SpatialInertia::from_com_inertia(
            3.0,
            Vector3::new(0.2, 0.0, -0.1),
            Matrix3::from_diagonal(&Vector3::new(0.12, 0.08, 0.1)),
        );
        let pose = Isometry3::from_parts(
            Translation3::new(1.0, -0.4, 0.3),
            UnitQuaternion::from_euler_angles(-0.2, 0.6, 0.4),
        );
        let motion_child = spatial(Vector3::new(0.3, -0.1, 0.2), Vector3::new(0.5, 0.25, -0.4));
        // Same physical motion seen from the parent.
        let motion_parent = {
            let r = pose.rotation;
            let p = pose.translation.vector;
            let w = r * angular(&motion_child);
            let v = r * linear(&motion_child) + p.cross(&(r * angular(&motion_child)));
            spatial(w, v)
        };
        let e_child = 0.5 * motion_child.dot(&inertia.apply(&motion_child));
        let parent_inertia = inertia.to_parent(&pose);
        let e_parent = 0.5 * motion_parent.dot(&parent_inertia.apply(&motion_parent));
        assert_relative_eq!(e_child, e_parent, epsilon = 1.0e-10);
    }
}
