//! Drive the free-space backup behavior against a simulated base.
//!
//! ```bash
//! backup_demo --config config/backup_free_space.toml --distance 0.4 --speed 0.15
//! RUST_LOG=debug backup_demo --wall-at 0.2
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use prometheus_recovery::common::clock::{ShutdownSignal, SystemClock};
use prometheus_recovery::common::types::Pose2D;
use prometheus_recovery::diagnostics::LoggingDiagnostics;
use prometheus_recovery::interfaces::VelocityPublisher;
use prometheus_recovery::navigation::costmap::cost_values;
use prometheus_recovery::navigation::{CostmapCollisionChecker, OccupancyGrid, SharedCostmap};
use prometheus_recovery::perception::SimulatedBase;
use prometheus_recovery::{
    BackupConfig, BackupFreeSpace, BehaviorContext, BehaviorServer, MotionCommand, Outcome, Twist,
};

#[derive(Parser, Debug)]
#[command(name = "backup_demo")]
#[command(version)]
#[command(about = "Back a simulated robot out of a corner toward free space")]
struct Args {
    /// Behavior configuration (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Distance to back up [m]
    #[arg(long, default_value_t = 0.3)]
    distance: f64,

    /// Backup speed [m/s]
    #[arg(long, default_value_t = 0.1)]
    speed: f64,

    /// Time allowance [s]; 0 disables the deadline
    #[arg(long, default_value_t = 10.0)]
    time_allowance: f64,

    /// Control loop rate [Hz]
    #[arg(long, default_value_t = 10.0)]
    rate_hz: f64,

    /// Drop a wall across the chosen direction at this distance once the robot starts moving
    #[arg(long)]
    wall_at: Option<f64>,
}

/// 3m x 3m local costmap centered on the origin, walled in on the east and north
fn cornered_grid() -> OccupancyGrid {
    let mut grid = OccupancyGrid::new(60, 60, 0.05, -1.5, -1.5);
    for i in 0..60 {
        let (wall_x, _) = grid.world_to_map(0.3, 0.0);
        let (_, wall_y) = grid.world_to_map(0.0, 0.3);
        grid.set_cost_map(wall_x, i, cost_values::LETHAL_OBSTACLE);
        grid.set_cost_map(i, wall_y, cost_values::LETHAL_OBSTACLE);
    }
    grid
}

fn place_wall(costmap: &SharedCostmap, origin: &Pose2D, angle: f64, distance: f64) -> Result<()> {
    let center = origin.project(angle, distance);
    let normal = angle + std::f64::consts::FRAC_PI_2;
    costmap
        .modify(|grid| {
            let step = grid.resolution / 2.0;
            let mut offset = -0.5;
            while offset <= 0.5 {
                let (sin, cos) = normal.sin_cos();
                grid.mark_obstacle(center.x + offset * cos, center.y + offset * sin);
                offset += step;
            }
        })
        .map_err(|e| anyhow!(e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => BackupConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BackupConfig::default(),
    };
    if !(args.rate_hz > 0.0) {
        return Err(anyhow!("rate must be positive, got {}", args.rate_hz));
    }
    let time_allowance = Duration::try_from_secs_f64(args.time_allowance)
        .context("time allowance must be a non-negative number of seconds")?;

    let costmap = SharedCostmap::new(cornered_grid());
    let base = Arc::new(SimulatedBase::new(Pose2D::default()));
    let shutdown = ShutdownSignal::new();

    let mut ctx = BehaviorContext::new(
        Arc::new(SystemClock::new()),
        base.clone(),
        base.clone(),
        Arc::new(CostmapCollisionChecker::new(costmap.clone())),
    )
    .with_costmap_service(&config.service_name, Arc::new(costmap.clone()))
    .with_shutdown(shutdown.clone());
    if config.visualize {
        ctx = ctx.with_diagnostics(Arc::new(LoggingDiagnostics));
    }

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, shutting down");
                shutdown.trigger();
            }
        });
    }

    let mut server = BehaviorServer::new(BackupFreeSpace::new(config), ctx);
    server.configure()?;
    server.start(&MotionCommand {
        distance: args.distance,
        speed: args.speed,
        time_allowance,
    })?;

    if let (Some(distance), Some(motion)) = (args.wall_at, server.behavior().motion()) {
        place_wall(&costmap, &motion.initial_pose, motion.direction.angle, distance)?;
        info!("Placed a wall {:.2} m along the backup direction", distance);
    }

    let period = Duration::from_secs_f64(1.0 / args.rate_hz);
    let mut ticker = tokio::time::interval(period);
    let outcome = loop {
        ticker.tick().await;
        if shutdown.is_triggered() {
            base.publish(&Twist::zero());
            break None;
        }
        base.step(period);
        if let Some(outcome) = server.tick() {
            break Some(outcome);
        }
    };

    let pose = base.get_pose();
    match outcome {
        Some(Outcome::Succeeded { cycles }) => {
            info!(cycles, "Finished at ({:.3}, {:.3})", pose.x, pose.y);
            Ok(())
        }
        Some(Outcome::Failed { cycles, error }) => {
            Err(anyhow!("behavior failed after {} cycles: {}", cycles, error))
        }
        None => {
            info!("Interrupted at ({:.3}, {:.3})", pose.x, pose.y);
            Ok(())
        }
    }
}
