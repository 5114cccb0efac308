//! Velocity commands for the robot base

use nalgebra::Vector2;

/// Planar velocity command in the robot frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    pub linear: Vector2<f64>,
    pub angular: f64,
}

impl Twist {
    pub fn new(linear_x: f64, linear_y: f64, angular: f64) -> Self {
        Twist {
            linear: Vector2::new(linear_x, linear_y),
            angular,
        }
    }

    /// Pure translation, no rotation
    pub fn translation(linear: Vector2<f64>) -> Self {
        Twist {
            linear,
            angular: 0.0,
        }
    }

    /// The stop command
    pub fn zero() -> Self {
        Twist::new(0.0, 0.0, 0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.linear.x == 0.0 && self.linear.y == 0.0 && self.angular == 0.0
    }

    /// Magnitude of the linear part
    pub fn speed(&self) -> f64 {
        self.linear.norm()
    }
}

impl Default for Twist {
    fn default() -> Self {
        Twist::zero()
    }
}
