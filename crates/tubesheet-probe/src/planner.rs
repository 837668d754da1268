//! Probe waypoint pattern around a nominal tube center.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tubesheet_core::Point;

use crate::link::{AxisPair, Command};

/// One closed-loop move target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub axes: AxisPair,
    pub target: Point,
}

impl Waypoint {
    pub fn xy(target: Point) -> Self {
        Self {
            axes: AxisPair::XY,
            target,
        }
    }

    pub fn command(&self) -> Command {
        let (first, second) = match self.axes {
            AxisPair::XY => (self.target.x, self.target.y),
            AxisPair::XZ => (self.target.x, self.target.z),
            AxisPair::YZ => (self.target.y, self.target.z),
        };
        Command::MoveClosedLoop {
            axes: self.axes,
            first_axis_setpoint: first,
            second_axis_setpoint: second,
        }
    }
}

/// Errors returned by [`plan_probe_waypoints`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("probe count must be odd (got {0})")]
    EvenCount(usize),
    #[error("probe radius must be positive and finite (got {0})")]
    InvalidRadius(f64),
}

/// Visit order `0, 2, 4, …` modulo `count`.
///
/// For odd `count` this is a permutation in which consecutive entries lie on
/// roughly opposite sides of the circle.
pub fn contact_diversity_order(count: usize) -> impl Iterator<Item = usize> {
    (0..count).map(move |n| (2 * n) % count)
}

/// `count` points at angles `2πi/count` on the circle of `radius` around
/// `center`, emitted in [`contact_diversity_order`].
///
/// `count` must be odd: even counts would revisit half of the points under the
/// step-2 order and are rejected rather than adjusted.
pub fn plan_probe_waypoints(
    center: Point,
    radius: f64,
    count: usize,
) -> Result<Vec<Waypoint>, PlanError> {
    if count % 2 == 0 {
        return Err(PlanError::EvenCount(count));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(PlanError::InvalidRadius(radius));
    }

    let ring: Vec<Point> = (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            center + Point::planar(radius * angle.cos(), radius * angle.sin())
        })
        .collect();

    Ok(contact_diversity_order(count)
        .map(|i| Waypoint::xy(ring[i]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn five_point_order() {
        let order: Vec<_> = contact_diversity_order(5).collect();
        assert_eq!(order, vec![0, 2, 4, 1, 3]);
    }

    #[test]
    fn order_is_a_permutation_for_odd_counts() {
        for n in [1usize, 3, 5, 7, 9, 21] {
            let mut order: Vec<_> = contact_diversity_order(n).collect();
            order.sort_unstable();
            assert_eq!(order, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn waypoints_lie_on_circle_with_even_spacing() {
        let center = Point::new(3.25, -1.5, 0.0);
        let r = 0.375;
        for n in [3usize, 5, 7] {
            let wps = plan_probe_waypoints(center, r, n).expect("plan");
            assert_eq!(wps.len(), n);

            for wp in &wps {
                assert_eq!(wp.axes, AxisPair::XY);
                assert_relative_eq!(wp.target.distance_planar(&center), r, epsilon = 1e-12);
            }

            // Recover the ring index from the angle and check it follows 2i mod n.
            let step = TAU / n as f64;
            for (k, wp) in wps.iter().enumerate() {
                let d = wp.target - center;
                let angle = d.y.atan2(d.x).rem_euclid(TAU);
                let idx = (angle / step).round() as usize % n;
                let off = (angle - idx as f64 * step).rem_euclid(TAU);
                assert!(off.min(TAU - off) < 1e-9, "waypoint {k} off-grid by {off}");
                assert_eq!(idx, (2 * k) % n);
            }
        }
    }

    #[test]
    fn even_and_zero_counts_are_rejected() {
        let c = Point::ORIGIN;
        assert_eq!(plan_probe_waypoints(c, 1.0, 4), Err(PlanError::EvenCount(4)));
        assert_eq!(plan_probe_waypoints(c, 1.0, 0), Err(PlanError::EvenCount(0)));
    }

    #[test]
    fn bad_radius_is_rejected() {
        let c = Point::ORIGIN;
        assert!(matches!(
            plan_probe_waypoints(c, 0.0, 5),
            Err(PlanError::InvalidRadius(_))
        ));
        assert!(matches!(
            plan_probe_waypoints(c, f64::NAN, 5),
            Err(PlanError::InvalidRadius(_))
        ));
    }

    #[test]
    fn move_command_uses_axis_pair_setpoints() {
        let wp = Waypoint::xy(Point::new(1.0, 2.0, 3.0));
        assert_eq!(
            wp.command(),
            Command::MoveClosedLoop {
                axes: AxisPair::XY,
                first_axis_setpoint: 1.0,
                second_axis_setpoint: 2.0,
            }
        );
    }
}
