//! Free-direction search
//!
//! Sweeps rays around the robot over an occupancy grid and returns the center
//! of the widest contiguous arc of safe rays. Pure: no publishing, no state.

use tracing::trace;

use crate::common::types::Pose2D;
use crate::navigation::costmap::OccupancyGrid;

/// Cells at or above this value block a ray.
///
/// Deliberately independent of the configurable `free_threshold`.
pub const LETHAL_THRESHOLD: u8 = 253;

// Absorbs float error when counting sweep and ray steps.
const STEP_EPSILON: f64 = 1e-9;

/// A free arc `[first_safe, last_unsafe)` in global-frame angles
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FreeArc {
    pub first_safe: f64,
    pub last_unsafe: f64,
}

impl FreeArc {
    pub fn width(&self) -> f64 {
        self.last_unsafe - self.first_safe
    }

    pub fn center(&self) -> f64 {
        (self.first_safe + self.last_unsafe) / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0
    }
}

/// Outcome of a direction search
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DirectionSearch {
    /// Steering angle, the center of `arc`
    pub angle: f64,
    /// Widest arc found; `[0, 0]` when nothing was free
    pub arc: FreeArc,
}

/// Number of whole steps of size `step` that fit in `span`
fn step_count(span: f64, step: f64) -> Option<usize> {
    if !(step.is_finite() && step > 0.0 && span.is_finite() && span >= 0.0) {
        return None;
    }
    Some((span / step + STEP_EPSILON).floor() as usize)
}

/// Whether a ray from `pose` along `angle` stays on the grid and clear of lethal cells
/// out to `max_radius`, sampled once per grid resolution.
pub fn is_ray_safe(grid: &OccupancyGrid, pose: &Pose2D, angle: f64, max_radius: f64) -> bool {
    let Some(samples) = step_count(max_radius, grid.resolution) else {
        return false;
    };
    let (cos, sin) = (angle.cos(), angle.sin());

    (0..=samples).all(|k| {
        let r = k as f64 * grid.resolution;
        let x = pose.x + r * cos;
        let y = pose.y + r * sin;
        if !grid.contains(x, y) {
            return false;
        }
        let (i, j) = grid.world_to_map(x, y);
        match grid.index(i, j) {
            Some(index) => grid.data[index] < LETHAL_THRESHOLD,
            None => false,
        }
    })
}

/// Find the center of the widest free arc between `start_angle` and `end_angle`.
///
/// Angles are visited at `start_angle + k * angle_step`, both ends included when
/// they fall on the step grid. An arc opens at the first safe angle and closes at the
/// next unsafe one; an arc still open at the end of the sweep closes at `end_angle`.
/// A closed arc replaces the best one only when strictly wider, so the first of
/// equally wide arcs wins. If no arc is found the result is exactly `0` with an
/// empty `[0, 0]` arc.
pub fn find_best_direction(
    grid: &OccupancyGrid,
    pose: &Pose2D,
    start_angle: f64,
    end_angle: f64,
    max_radius: f64,
    angle_step: f64,
) -> DirectionSearch {
    let mut best = FreeArc::default();

    let Some(steps) = step_count(end_angle - start_angle, angle_step) else {
        return DirectionSearch::default();
    };

    let mut first_safe: Option<f64> = None;
    let mut last_unsafe: Option<f64> = None;

    for k in 0..=steps {
        let angle = start_angle + k as f64 * angle_step;
        let is_safe = is_ray_safe(grid, pose, angle, max_radius);

        if is_safe && first_safe.is_none() {
            first_safe = Some(angle);
        }
        if !is_safe && first_safe.is_some() && last_unsafe.is_none() {
            last_unsafe = Some(angle);
        }
        if k == steps && first_safe.is_some() && last_unsafe.is_none() {
            last_unsafe = Some(end_angle);
        }

        if let (Some(first), Some(last)) = (first_safe, last_unsafe) {
            let candidate = FreeArc {
                first_safe: first,
                last_unsafe: last,
            };
            if candidate.width() > best.width() {
                best = candidate;
            }
            first_safe = None;
            last_unsafe = None;
        }
    }

    trace!(
        first_safe = best.first_safe,
        last_unsafe = best.last_unsafe,
        "free arc search complete"
    );

    DirectionSearch {
        angle: best.center(),
        arc: best,
    }
}
