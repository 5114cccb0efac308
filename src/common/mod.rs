//! Common utilities and types for the Prometheus recovery behaviors

pub mod clock;

/// Common types and utilities used across the codebase
pub mod types {
    use nalgebra::{Point2, Vector2};

    /// A 2D point in world coordinates
    pub type Point2D = Point2<f64>;

    /// A planar robot pose (x, y, theta) in the global frame
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pose2D {
        pub x: f64,
        pub y: f64,
        pub theta: f64,
    }

    impl Pose2D {
        pub fn new(x: f64, y: f64, theta: f64) -> Self {
            Pose2D { x, y, theta }
        }

        /// Position part of the pose
        pub fn position(&self) -> Point2D {
            Point2D::new(self.x, self.y)
        }

        /// Euclidean distance between the positions of two poses
        pub fn distance_to(&self, other: &Pose2D) -> f64 {
            nalgebra::distance(&self.position(), &other.position())
        }

        /// Point at `range` meters from this pose along a global-frame `angle`
        pub fn project(&self, angle: f64, range: f64) -> Point2D {
            self.position() + Vector2::new(angle.cos(), angle.sin()) * range
        }
    }

    /// Normalize an angle to [-pi, pi]
    pub fn normalize_angle(angle: f64) -> f64 {
        use std::f64::consts::PI;
        let mut a = angle % (2.0 * PI);
        if a > PI {
            a -= 2.0 * PI;
        } else if a < -PI {
            a += 2.0 * PI;
        }
        a
    }

}
