//! Back up toward free space
//!
//! On `run` the behavior fetches one costmap snapshot, finds the widest free arc
//! around the robot and commits to driving toward its center. Each
//! `cycle_update` then checks the time budget, the distance covered from the
//! pose captured at `run`, and the collision checker before publishing the
//! committed velocity again.

use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use nalgebra::Vector2;
use tracing::{debug, error, info, info_span, warn};

use crate::common::types::Pose2D;
use crate::config::BackupConfig;
use crate::control::Twist;
use crate::diagnostics::{self, RAYS_TOPIC, TARGET_TOPIC};
use crate::error::BehaviorError;
use crate::interfaces::{BehaviorContext, CostmapProvider, DiagnosticsSink};
use crate::lifecycle::{Behavior, BehaviorBase, BehaviorState, Status};
use crate::navigation::free_direction::{find_best_direction, DirectionSearch, LETHAL_THRESHOLD};

/// How long `run` waits for a costmap snapshot
pub const COSTMAP_TIMEOUT: Duration = Duration::from_secs(1);
/// Angular sweep used to search for free space
pub const SEARCH_START_ANGLE: f64 = -PI;
pub const SEARCH_END_ANGLE: f64 = PI;
pub const SEARCH_ANGLE_STEP: f64 = PI / 32.0;

/// Goal for one backup maneuver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    /// Distance to cover [m]; only the magnitude is used
    pub distance: f64,
    /// Linear speed along the chosen direction [m/s]
    pub speed: f64,
    /// Time budget; zero disables the deadline
    pub time_allowance: Duration,
}

/// Plan committed by `run` and consumed by every `cycle_update`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// Velocity published each cycle, (cos, sin) of the chosen angle times speed
    pub velocity: Vector2<f64>,
    pub target_distance: f64,
    pub time_allowance: Duration,
    pub deadline: Duration,
    /// Pose captured at `run`; the only reference for distance traveled
    pub initial_pose: Pose2D,
    pub direction: DirectionSearch,
}

/// Recovery behavior that backs the robot into the widest free arc
pub struct BackupFreeSpace {
    base: BehaviorBase,
    config: BackupConfig,
    costmap: Option<Arc<dyn CostmapProvider>>,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
    motion: Option<MotionState>,
}

impl BackupFreeSpace {
    pub fn new(config: BackupConfig) -> Self {
        BackupFreeSpace {
            base: BehaviorBase::new("back_up_free_space"),
            config,
            costmap: None,
            diagnostics: None,
            motion: None,
        }
    }

    /// Effective configuration (after clamping, once configured)
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Plan committed by the last successful `run`
    pub fn motion(&self) -> Option<&MotionState> {
        self.motion.as_ref()
    }

    fn lookup_pose(&self, ctx: &BehaviorContext) -> Option<Pose2D> {
        ctx.poses
            .current_pose(&self.config.global_frame, self.config.transform_tolerance())
    }

    fn stop_robot(ctx: &BehaviorContext) {
        ctx.velocity.publish(&Twist::zero());
    }

    fn plan(
        &self,
        ctx: &BehaviorContext,
        command: &MotionCommand,
    ) -> Result<MotionState, BehaviorError> {
        let costmap = self.costmap.as_ref().ok_or_else(|| {
            BehaviorError::Configuration("costmap service was not acquired".to_string())
        })?;

        if ctx.shutdown.is_triggered() {
            error!("Interrupted while waiting for the costmap service. Exiting.");
            return Err(BehaviorError::ServiceUnavailable);
        }
        let grid = costmap.fetch(COSTMAP_TIMEOUT).ok_or_else(|| {
            error!(
                "Costmap service '{}' did not answer within {:?}",
                self.config.service_name, COSTMAP_TIMEOUT
            );
            BehaviorError::ServiceUnavailable
        })?;

        let pose = self.lookup_pose(ctx).ok_or_else(|| {
            error!("Initial robot pose is not available.");
            BehaviorError::PoseUnavailable
        })?;

        let direction = find_best_direction(
            &grid,
            &pose,
            SEARCH_START_ANGLE,
            SEARCH_END_ANGLE,
            self.config.max_radius,
            SEARCH_ANGLE_STEP,
        );
        debug!(
            first_safe = direction.arc.first_safe,
            last_unsafe = direction.arc.last_unsafe,
            "widest free arc"
        );

        let velocity = Vector2::new(direction.angle.cos(), direction.angle.sin()) * command.speed;
        let target_distance = command.distance.abs();
        let deadline = ctx.clock.now() + command.time_allowance;

        // The pose may have moved while the snapshot was scanned.
        let initial_pose = self.lookup_pose(ctx).ok_or_else(|| {
            error!("Initial robot pose is not available.");
            BehaviorError::PoseUnavailable
        })?;

        info!(
            "backing up {:.3} meters towards free space at angle {:.3}",
            target_distance, direction.angle
        );

        if let Some(sink) = &self.diagnostics {
            let stamp = ctx.clock.now();
            let rays = diagnostics::boundary_ray_markers(
                &self.config.global_frame,
                stamp,
                &pose,
                self.config.max_radius,
                &direction.arc,
            );
            sink.publish(RAYS_TOPIC, &rays);
            let target = initial_pose.project(direction.angle, target_distance);
            let marker = diagnostics::target_marker(&self.config.global_frame, stamp, target);
            sink.publish(TARGET_TOPIC, &[marker]);
        }

        Ok(MotionState {
            velocity,
            target_distance,
            time_allowance: command.time_allowance,
            deadline,
            initial_pose,
            direction,
        })
    }

    fn step(&self, ctx: &BehaviorContext, motion: &MotionState) -> Result<Status, BehaviorError> {
        if ctx.clock.now() > motion.deadline && motion.time_allowance > Duration::ZERO {
            Self::stop_robot(ctx);
            warn!("Exceeded time allowance before reaching the target distance - Exiting");
            return Err(BehaviorError::TimeExceeded);
        }

        let pose = self.lookup_pose(ctx).ok_or_else(|| {
            error!("Current robot pose is not available.");
            BehaviorError::PoseUnavailable
        })?;

        let distance = pose.distance_to(&motion.initial_pose);
        ctx.feedback.publish(distance);

        if distance >= motion.target_distance {
            Self::stop_robot(ctx);
            info!("Backed up {:.3} meters", distance);
            return Ok(Status::Succeeded);
        }

        let cmd = Twist::translation(motion.velocity);
        if !ctx
            .collision
            .is_safe(motion.target_distance - distance, &cmd, &pose)
        {
            Self::stop_robot(ctx);
            warn!("Collision Ahead - Exiting");
            return Err(BehaviorError::CollisionImminent);
        }

        ctx.velocity.publish(&cmd);
        Ok(Status::Running)
    }
}

impl Behavior for BackupFreeSpace {
    type Command = MotionCommand;

    fn name(&self) -> &str {
        &self.base.name
    }

    fn state(&self) -> BehaviorState {
        self.base.get_state()
    }

    fn configure(&mut self, ctx: &BehaviorContext) -> Result<(), BehaviorError> {
        let _span = info_span!("behavior", name = %self.base.name).entered();
        self.base.require(
            &[
                BehaviorState::Unconfigured,
                BehaviorState::Configured,
                BehaviorState::Succeeded,
                BehaviorState::Failed,
            ],
            "configure",
        )?;

        if self.config.clamp_max_radius() {
            warn!("max_radius < robot_radius. Adjusting max_radius.");
        }
        debug!(
            free_threshold = self.config.free_threshold,
            lethal_threshold = LETHAL_THRESHOLD,
            "free space scan gates on the lethal threshold"
        );

        let costmap = ctx.costmap_service(&self.config.service_name).ok_or_else(|| {
            BehaviorError::Configuration(format!(
                "no costmap service named '{}'",
                self.config.service_name
            ))
        })?;

        self.diagnostics = match (self.config.visualize, &ctx.diagnostics) {
            (true, Some(sink)) => Some(Arc::clone(sink)),
            (true, None) => {
                warn!("visualize is set but no diagnostics sink is available");
                None
            }
            (false, _) => None,
        };
        self.costmap = Some(costmap);
        self.motion = None;
        self.base.set_state(BehaviorState::Configured);

        info!(
            global_frame = %self.config.global_frame,
            max_radius = self.config.max_radius,
            service = %self.config.service_name,
            "configured"
        );
        Ok(())
    }

    fn run(
        &mut self,
        ctx: &BehaviorContext,
        command: &MotionCommand,
    ) -> Result<Status, BehaviorError> {
        let _span = info_span!("behavior", name = %self.base.name).entered();
        self.base.require(
            &[
                BehaviorState::Configured,
                BehaviorState::Succeeded,
                BehaviorState::Failed,
            ],
            "run",
        )?;

        self.motion = None;
        match self.plan(ctx, command) {
            Ok(motion) => {
                self.motion = Some(motion);
                self.base.set_state(BehaviorState::Running);
                Ok(Status::Succeeded)
            }
            Err(e) => {
                self.base.set_state(BehaviorState::Failed);
                Err(e)
            }
        }
    }

    fn cycle_update(&mut self, ctx: &BehaviorContext) -> Result<Status, BehaviorError> {
        let _span = info_span!("behavior", name = %self.base.name).entered();
        self.base.require(&[BehaviorState::Running], "cycle_update")?;

        let Some(motion) = self.motion else {
            return Err(BehaviorError::InvalidTransition {
                state: self.base.get_state(),
                operation: "cycle_update",
            });
        };
        let result = self.step(ctx, &motion);
        self.base.settle(result)
    }

    fn cleanup(&mut self) {
        self.costmap = None;
        self.diagnostics = None;
        self.motion = None;
        self.base.set_state(BehaviorState::Unconfigured);
    }
}
