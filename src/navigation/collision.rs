//! Forward-simulated collision checking against a live costmap

use tracing::debug;

use crate::common::types::Pose2D;
use crate::control::Twist;
use crate::interfaces::CollisionChecker;
use crate::navigation::costmap::SharedCostmap;

/// Collision checker that projects a twist forward over a live costmap.
///
/// The twist is taken in the robot frame and integrated at `cycle_frequency`
/// for up to `simulate_ahead_time`, stopping early once the simulated
/// displacement covers the remaining distance.
#[derive(Debug, Clone)]
pub struct CostmapCollisionChecker {
    costmap: SharedCostmap,
    cycle_frequency: f64,
    simulate_ahead_time: f64,
}

impl CostmapCollisionChecker {
    pub fn new(costmap: SharedCostmap) -> Self {
        CostmapCollisionChecker {
            costmap,
            cycle_frequency: 10.0,
            simulate_ahead_time: 2.0,
        }
    }

    pub fn with_horizon(mut self, cycle_frequency: f64, simulate_ahead_time: f64) -> Self {
        self.cycle_frequency = cycle_frequency;
        self.simulate_ahead_time = simulate_ahead_time;
        self
    }
}

impl CollisionChecker for CostmapCollisionChecker {
    fn is_safe(&self, remaining_distance: f64, cmd: &Twist, pose: &Pose2D) -> bool {
        let Some(grid) = self.costmap.snapshot() else {
            return false;
        };
        if !(self.cycle_frequency > 0.0) {
            return !grid.is_obstacle(pose.x, pose.y);
        }

        let max_cycles = (self.cycle_frequency * self.simulate_ahead_time) as usize;
        let (sin, cos) = pose.theta.sin_cos();
        // Robot-frame velocity rotated into the global frame.
        let world_vx = cmd.linear.x * cos - cmd.linear.y * sin;
        let world_vy = cmd.linear.x * sin + cmd.linear.y * cos;

        for cycle in 1..=max_cycles {
            let t = cycle as f64 / self.cycle_frequency;
            let travelled = cmd.speed() * t;
            let x = pose.x + world_vx * t;
            let y = pose.y + world_vy * t;
            if grid.is_obstacle(x, y) {
                debug!(x, y, "simulated pose in collision");
                return false;
            }
            if travelled >= remaining_distance {
                break;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::costmap::OccupancyGrid;

    fn checker_with_wall_at(x: f64) -> CostmapCollisionChecker {
        let mut grid = OccupancyGrid::new(40, 40, 0.1, -2.0, -2.0);
        for j in 0..40 {
            let (gx, _) = grid.world_to_map(x, 0.0);
            grid.set_cost_map(gx, j, 254);
        }
        CostmapCollisionChecker::new(SharedCostmap::new(grid))
    }

    #[test]
    fn free_path_is_safe() {
        let checker = checker_with_wall_at(1.55);
        let cmd = Twist::new(-0.2, 0.0, 0.0);
        assert!(checker.is_safe(1.0, &cmd, &Pose2D::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn wall_within_horizon_is_unsafe() {
        let checker = checker_with_wall_at(0.25);
        let cmd = Twist::new(0.2, 0.0, 0.0);
        assert!(!checker.is_safe(1.0, &cmd, &Pose2D::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn wall_past_remaining_distance_is_ignored() {
        let checker = checker_with_wall_at(0.35);
        let cmd = Twist::new(0.2, 0.0, 0.0);
        // Only 0.1m left to go; the wall is further away.
        assert!(checker.is_safe(0.1, &cmd, &Pose2D::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn twist_is_rotated_by_heading() {
        let checker = checker_with_wall_at(0.25);
        let cmd = Twist::new(0.2, 0.0, 0.0);
        // Facing +y, forward motion runs parallel to the wall.
        let pose = Pose2D::new(0.0, -1.0, std::f64::consts::FRAC_PI_2);
        assert!(checker.is_safe(1.0, &cmd, &pose));
    }

    #[test]
    fn shorter_horizon_sees_less() {
        let cmd = Twist::new(0.2, 0.0, 0.0);
        let pose = Pose2D::new(0.0, 0.0, 0.0);
        // Half a second at 0.2 m/s only reaches 0.1m.
        let checker = checker_with_wall_at(0.25).with_horizon(10.0, 0.5);
        assert!(checker.is_safe(1.0, &cmd, &pose));
        let checker = checker_with_wall_at(0.25).with_horizon(20.0, 2.0);
        assert!(!checker.is_safe(1.0, &cmd, &pose));
    }

    #[test]
    fn leaving_the_map_is_unsafe() {
        let checker = checker_with_wall_at(1.95);
        let cmd = Twist::new(0.0, -0.5, 0.0);
        assert!(!checker.is_safe(5.0, &cmd, &Pose2D::new(0.0, -1.8, 0.0)));
    }
}
