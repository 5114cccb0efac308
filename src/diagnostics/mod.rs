//! Visualization markers for recovery decisions
//!
//! Marker construction is pure; behaviors push the result through a
//! [`DiagnosticsSink`](crate::interfaces::DiagnosticsSink) when enabled.

use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use crate::common::types::{Point2D, Pose2D};
use crate::interfaces::DiagnosticsSink;
use crate::navigation::free_direction::FreeArc;

/// Topic carrying the target point marker
pub const TARGET_TOPIC: &str = "back_up_free_space_markers";
/// Topic carrying the arc boundary rays
pub const RAYS_TOPIC: &str = "back_up_free_space_line";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Sphere,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Color = Color { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
}

/// A single visualization marker
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub frame_id: String,
    pub stamp: Duration,
    pub ns: &'static str,
    pub id: u32,
    pub kind: MarkerKind,
    /// Sphere center; unused for arrows
    pub position: Point2D,
    /// Arrow tail and head; empty for spheres
    pub points: Vec<Point2D>,
    pub scale: [f64; 3],
    pub color: Color,
}

/// Red sphere at the point the behavior is heading for
pub fn target_marker(frame_id: &str, stamp: Duration, target: Point2D) -> Marker {
    Marker {
        frame_id: frame_id.to_string(),
        stamp,
        ns: "target_point",
        id: 0,
        kind: MarkerKind::Sphere,
        position: target,
        points: Vec::new(),
        scale: [0.2, 0.2, 0.2],
        color: Color::RED,
    }
}

/// Green arrow along the first safe angle, red arrow along the closing unsafe angle
pub fn boundary_ray_markers(
    frame_id: &str,
    stamp: Duration,
    pose: &Pose2D,
    radius: f64,
    arc: &FreeArc,
) -> [Marker; 2] {
    let ray = |id, angle: f64, color| Marker {
        frame_id: frame_id.to_string(),
        stamp,
        ns: "rays",
        id,
        kind: MarkerKind::Arrow,
        position: Point2D::origin(),
        points: vec![pose.position(), pose.project(angle, radius)],
        scale: [0.1, 0.2, 0.2],
        color,
    };
    [
        ray(1, arc.first_safe, Color::GREEN),
        ray(2, arc.last_unsafe, Color::RED),
    ]
}

/// Sink that logs markers at debug level
#[derive(Debug, Default)]
pub struct LoggingDiagnostics;

impl DiagnosticsSink for LoggingDiagnostics {
    fn publish(&self, topic: &str, markers: &[Marker]) {
        for marker in markers {
            debug!(
                topic,
                ns = marker.ns,
                id = marker.id,
                "marker {:?} at {:?} {:?}",
                marker.kind,
                marker.position,
                marker.points
            );
        }
    }
}

/// Sink that keeps every published batch
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    published: Mutex<Vec<(String, Vec<Marker>)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, Vec<Marker>)> {
        self.published.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn publish(&self, topic: &str, markers: &[Marker]) {
        if let Ok(mut published) = self.published.lock() {
            published.push((topic.to_string(), markers.to_vec()));
        }
    }
}
