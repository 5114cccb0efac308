//! Collaborator interfaces consumed by recovery behaviors
//!
//! Behaviors never reach for global state. Everything they talk to is one of
//! these traits, handed in through a [`BehaviorContext`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::trace;

use crate::common::clock::{Clock, ShutdownSignal};
use crate::common::types::Pose2D;
use crate::control::Twist;
use crate::diagnostics::Marker;
use crate::navigation::costmap::OccupancyGrid;

/// Source of costmap snapshots
pub trait CostmapProvider: Send + Sync {
    /// Fetch a snapshot, waiting at most `timeout`
    fn fetch(&self, timeout: Duration) -> Option<OccupancyGrid>;
}

/// Pose lookup in a given frame
pub trait PoseProvider: Send + Sync {
    /// Current robot pose in `global_frame`, or `None` if no transform within `tolerance`
    fn current_pose(&self, global_frame: &str, tolerance: Duration) -> Option<Pose2D>;
}

/// Velocity command output. Fire-and-forget.
pub trait VelocityPublisher: Send + Sync {
    fn publish(&self, cmd: &Twist);
}

/// Collision-check primitive supplied by the host
pub trait CollisionChecker: Send + Sync {
    /// Whether executing `cmd` from `pose` for the `remaining_distance` is safe
    fn is_safe(&self, remaining_distance: f64, cmd: &Twist, pose: &Pose2D) -> bool;
}

/// Progress reports
pub trait FeedbackSink: Send + Sync {
    fn publish(&self, distance_traveled: f64);
}

/// Visualization markers
pub trait DiagnosticsSink: Send + Sync {
    fn publish(&self, topic: &str, markers: &[Marker]);
}

/// Feedback sink that only traces
#[derive(Debug, Default)]
pub struct LoggingFeedback;

impl FeedbackSink for LoggingFeedback {
    fn publish(&self, distance_traveled: f64) {
        trace!(distance_traveled, "feedback");
    }
}

/// Feedback sink that keeps every report
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    distances: Mutex<Vec<f64>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.distances.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn publish(&self, distance_traveled: f64) {
        if let Ok(mut distances) = self.distances.lock() {
            distances.push(distance_traveled);
        }
    }
}

/// Everything a behavior may touch while it runs
#[derive(Clone)]
pub struct BehaviorContext {
    pub clock: Arc<dyn Clock>,
    pub poses: Arc<dyn PoseProvider>,
    pub velocity: Arc<dyn VelocityPublisher>,
    pub collision: Arc<dyn CollisionChecker>,
    pub feedback: Arc<dyn FeedbackSink>,
    pub diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    pub shutdown: ShutdownSignal,
    costmap_services: HashMap<String, Arc<dyn CostmapProvider>>,
}

impl BehaviorContext {
    pub fn new(
        clock: Arc<dyn Clock>,
        poses: Arc<dyn PoseProvider>,
        velocity: Arc<dyn VelocityPublisher>,
        collision: Arc<dyn CollisionChecker>,
    ) -> Self {
        BehaviorContext {
            clock,
            poses,
            velocity,
            collision,
            feedback: Arc::new(LoggingFeedback),
            diagnostics: None,
            shutdown: ShutdownSignal::new(),
            costmap_services: HashMap::new(),
        }
    }

    /// Register a costmap provider under a service name
    pub fn with_costmap_service(mut self, name: &str, provider: Arc<dyn CostmapProvider>) -> Self {
        self.costmap_services.insert(name.to_string(), provider);
        self
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Look up a costmap provider by service name
    pub fn costmap_service(&self, name: &str) -> Option<Arc<dyn CostmapProvider>> {
        self.costmap_services.get(name).cloned()
    }
}

impl std::fmt::Debug for BehaviorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut services: Vec<_> = self.costmap_services.keys().collect();
        services.sort();
        f.debug_struct("BehaviorContext")
            .field("costmap_services", &services)
            .field("diagnostics", &self.diagnostics.is_some())
            .field("shutdown", &self.shutdown.is_triggered())
            .finish()
    }
}
