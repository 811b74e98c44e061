//! Ground contact model and the soft saturation used by joint friction.
//!
//! The ground is the world plane `z = 0`. Each contact frame below it
//! receives a spring-damper normal force and a regularized Coulomb
//! friction force, blended in over a small penetration depth so the
//! wrench is continuous at touchdown.

use nalgebra::Vector3;

use crate::options::ContactOptions;

/// World-frame force exerted by the ground on a contact frame.
///
/// `position` and `velocity` are the frame origin's world position and
/// world linear velocity. Returns zero while the frame is above the
/// ground plane.
pub fn ground_force(
    options: &ContactOptions,
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
) -> Vector3<f64> {
    let z = position.z;
    if z >= 0.0 {
        return Vector3::zeros();
    }

    // Normal spring force, damped only while the frame keeps sinking.
    let mut damping = 0.0;
    if velocity.z < 0.0 {
        damping = -options.damping * velocity.z;
    }
    let fz = -options.stiffness * z + damping;

    // Tangential friction: dry ramp below the velocity threshold, a
    // linear bridge up to 1.5x the threshold, viscous beyond.
    let vxy = Vector3::new(velocity.x, velocity.y, 0.0);
    let v_norm = vxy.norm();
    let eps = options.dry_friction_vel_eps;
    let coeff = if v_norm > eps {
        if v_norm < 1.5 * eps {
            -2.0 * v_norm * (options.friction_dry - options.friction_viscous) / eps
                + 3.0 * options.friction_dry
                - 2.0 * options.friction_viscous
        } else {
            options.friction_viscous
        }
    } else {
        v_norm * options.friction_dry / eps
    };

    let mut force = -vxy * coeff * fz;
    force.z = fz;

    // Blend the whole wrench in over the transition depth.
    let blending = (-z / options.transition_eps).min(1.0);
    force * blending
}

/// Saturate `value` into `[min, max]` with circular bevels of radius
/// `radius` replacing the hard corners, so the output stays smooth
/// through the saturation onset.
pub fn saturate_soft(value: f64, min: f64, max: f64, radius: f64) -> f64 {
    let alpha = std::f64::consts::PI / 8.0;
    let beta = std::f64::consts::PI / 4.0;

    let range = max - min;
    let middle = (max + min) / 2.0;
    let uc = 2.0 * (value - middle) / range;

    let bevel_l = radius * alpha.tan();
    let bevel_start = 1.0 - beta.cos() * bevel_l;
    let bevel_stop = 1.0 + bevel_l;
    let bevel_xc = bevel_stop;
    let bevel_yc = 1.0 - radius;

    if uc >= bevel_stop {
        max
    } else if uc <= -bevel_stop {
        min
    } else if (-bevel_start..=bevel_start).contains(&uc) {
        value
    } else if uc > bevel_start {
        let out = (radius * radius - (uc - bevel_xc) * (uc - bevel_xc)).sqrt() + bevel_yc;
        0.5 * out * range + middle
    } else {
        let out = -(radius * radius - (uc + bevel_xc) * (uc + bevel_xc)).sqrt() - bevel_yc;
        0.5 * out * range + middle
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn options() -> ContactOptions {
        ContactOptions::default()
    }

    #[test]
    fn no_force_above_the_ground() {
        let f = ground_force(
            &options(),
            &Vector3::new(0.3, -0.1, 0.02),
            &Vector3::new(1.0, 0.0, -2.0),
        );
        assert_eq!(f, Vector3::zeros());
    }

    #[test]
    fn deep_static_contact_is_a_pure_spring() {
        let opts = options();
        // 10 mm penetration, far past the 1 mm transition depth.
        let f = ground_force(&opts, &Vector3::new(0.0, 0.0, -0.01), &Vector3::zeros());
        assert_relative_eq!(f.z, opts.stiffness * 0.01, epsilon = 1.0e-9);
        assert_eq!(f.x, 0.0);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn damping_only_acts_while_sinking() {
        let opts = options();
        let pos = Vector3::new(0.0, 0.0, -0.01);
        let sinking = ground_force(&opts, &pos, &Vector3::new(0.0, 0.0, -0.5));
        let rising = ground_force(&opts, &pos, &Vector3::new(0.0, 0.0, 0.5));
        assert_relative_eq!(
            sinking.z,
            opts.stiffness * 0.01 + opts.damping * 0.5,
            epsilon = 1.0e-9
        );
        assert_relative_eq!(rising.z, opts.stiffness * 0.01, epsilon = 1.0e-9);
    }

    #[test]
    fn friction_opposes_sliding() {
        let opts = options();
        let f = ground_force(
            &opts,
            &Vector3::new(0.0, 0.0, -0.01),
            &Vector3::new(0.2, 0.0, 0.0),
        );
        // Well into the viscous regime at 0.2 m/s.
        let fz = opts.stiffness * 0.01;
        assert_relative_eq!(f.x, -0.2 * opts.friction_viscous * fz, epsilon = 1.0e-9);
        assert_relative_eq!(f.z, fz, epsilon = 1.0e-9);
    }

    #[test]
    fn friction_coefficient_is_continuous_at_regime_borders() {
        let opts = options();
        let pos = Vector3::new(0.0, 0.0, -0.01);
        let eps = opts.dry_friction_vel_eps;
        for v in [eps, 1.5 * eps] {
            let below = ground_force(&opts, &pos, &Vector3::new(v - 1.0e-9, 0.0, 0.0));
            let above = ground_force(&opts, &pos, &Vector3::new(v + 1.0e-9, 0.0, 0.0));
            assert_relative_eq!(below.x, above.x, epsilon = 1.0e-2);
        }
    }

    #[test]
    fn wrench_blends_in_over_the_transition_depth() {
        let opts = options();
        // Half the transition depth: half the spring force.
        let half = ground_force(
            &opts,
            &Vector3::new(0.0, 0.0, -opts.transition_eps / 2.0),
            &Vector3::zeros(),
        );
        assert_relative_eq!(
            half.z,
            0.5 * opts.stiffness * opts.transition_eps / 2.0,
            epsilon = 1.0e-9
        );
    }

    #[test]
    fn saturate_soft_is_identity_in_the_linear_band() {
        for v in [-0.5, 0.0, 0.5] {
            assert_eq!(saturate_soft(v, -1.0, 1.0, 0.7), v);
        }
    }

    #[test]
    fn saturate_soft_clamps_far_out() {
        assert_eq!(saturate_soft(10.0, -1.0, 1.0, 0.7), 1.0);
        assert_eq!(saturate_soft(-10.0, -1.0, 1.0, 0.7), -1.0);
    }

    #[test]
    fn saturate_soft_is_odd_about_the_middle() {
        for v in [0.8, 0.95, 1.1, 1.3] {
            assert_relative_eq!(
                saturate_soft(v, -1.0, 1.0, 0.7),
                -saturate_soft(-v, -1.0, 1.0, 0.7),
                epsilon = 1.0e-12
            );
        }
    }

    #[test]
    fn saturate_soft_is_monotone_through_the_bevel() {
        let mut last = f64::NEG_INFINITY;
        let mut v = -2.0;
        while v <= 2.0 {
            let out = saturate_soft(v, -1.0, 1.0, 0.7);
            assert!(out >= last - 1.0e-12, "not monotone at {v}");
            last = out;
            v += 1.0e-3;
        }
    }

    #[test]
    fn saturate_soft_respects_asymmetric_bounds() {
        let out = saturate_soft(100.0, -2.0, 6.0, 0.7);
        assert_eq!(out, 6.0);
        // Middle of the band stays untouched.
        assert_eq!(saturate_soft(2.0, -2.0, 6.0, 0.7), 2.0);
    }
}
