//! Perception module for the recovery behaviors
pub mod localization;

pub use self::localization::SimulatedBase;
