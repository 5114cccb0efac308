pub mod behaviors;
pub mod common;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod interfaces;
pub mod lifecycle;
pub mod navigation;
pub mod perception;

pub use behaviors::{BackupFreeSpace, BehaviorServer, MotionCommand, Outcome};
pub use common::types::Pose2D;
pub use config::BackupConfig;
pub use control::Twist;
pub use error::BehaviorError;
pub use interfaces::BehaviorContext;
pub use lifecycle::{Behavior, BehaviorState, Status};
pub use navigation::{find_best_direction, OccupancyGrid};
