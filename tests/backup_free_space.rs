use std::sync::Arc;
use std::time::Duration;

use prometheus_recovery::common::clock::ManualClock;
use prometheus_recovery::common::types::Pose2D;
use prometheus_recovery::interfaces::{CollisionChecker, RecordingFeedback};
use prometheus_recovery::navigation::costmap::cost_values;
use prometheus_recovery::navigation::{CostmapCollisionChecker, OccupancyGrid, SharedCostmap};
use prometheus_recovery::perception::SimulatedBase;
use prometheus_recovery::{
    BackupConfig, BackupFreeSpace, Behavior, BehaviorContext, BehaviorError, BehaviorServer,
    BehaviorState, MotionCommand, Outcome, Twist,
};

const TICK: Duration = Duration::from_millis(100);

/// Never vetoes motion
struct OpenFloor;

impl CollisionChecker for OpenFloor {
    fn is_safe(&self, _remaining_distance: f64, _cmd: &Twist, _pose: &Pose2D) -> bool {
        true
    }
}

struct Rig {
    clock: Arc<ManualClock>,
    base: Arc<SimulatedBase>,
    costmap: SharedCostmap,
    feedback: Arc<RecordingFeedback>,
    server: BehaviorServer<BackupFreeSpace>,
}

impl Rig {
    fn new(grid: OccupancyGrid) -> Self {
        let costmap = SharedCostmap::new(grid);
        let collision = Arc::new(CostmapCollisionChecker::new(costmap.clone()));
        Rig::build(costmap, BackupConfig::default(), collision)
    }

    fn build(
        costmap: SharedCostmap,
        config: BackupConfig,
        collision: Arc<dyn CollisionChecker>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new());
        let base = Arc::new(SimulatedBase::new(Pose2D::default()));
        let feedback = Arc::new(RecordingFeedback::new());
        let ctx = BehaviorContext::new(clock.clone(), base.clone(), base.clone(), collision)
            .with_costmap_service(&config.service_name, Arc::new(costmap.clone()))
            .with_feedback(feedback.clone());

        let mut server = BehaviorServer::new(BackupFreeSpace::new(config), ctx);
        server.configure().unwrap();
        Rig {
            clock,
            base,
            costmap,
            feedback,
            server,
        }
    }

    fn run(&mut self, max_cycles: usize) -> Option<Outcome> {
        let clock = self.clock.clone();
        let base = self.base.clone();
        self.server.run_to_completion(max_cycles, move || {
            clock.advance(TICK);
            base.step(TICK);
        })
    }
}

/// 3m x 3m of free space centered on the origin
fn open_grid() -> OccupancyGrid {
    OccupancyGrid::new(60, 60, 0.05, -1.5, -1.5)
}

fn cornered_grid() -> OccupancyGrid {
    let mut grid = open_grid();
    let (wall_x, _) = grid.world_to_map(0.3, 0.0);
    let (_, wall_y) = grid.world_to_map(0.0, 0.3);
    for i in 0..60 {
        grid.set_cost_map(wall_x, i, cost_values::LETHAL_OBSTACLE);
        grid.set_cost_map(i, wall_y, cost_values::LETHAL_OBSTACLE);
    }
    grid
}

fn command(distance: f64, speed: f64, secs: u64) -> MotionCommand {
    MotionCommand {
        distance,
        speed,
        time_allowance: Duration::from_secs(secs),
    }
}

#[test]
fn backs_up_through_open_space() {
    let mut rig = Rig::new(open_grid());
    rig.server.start(&command(0.5, 0.2, 10)).unwrap();
    assert!(rig.server.is_active());

    let outcome = rig.run(100);
    assert!(matches!(outcome, Some(Outcome::Succeeded { .. })));
    assert_eq!(rig.server.behavior().state(), BehaviorState::Succeeded);

    let distances = rig.feedback.distances();
    assert!(distances.len() > 20);
    assert!(distances.windows(2).all(|w| w[1] >= w[0]));
    assert!(distances[distances.len() - 1] >= 0.5);

    let pose = rig.base.get_pose();
    assert!((pose.x - 0.5).abs() < 0.03);
    assert!(pose.y.abs() < 1e-6);

    let commands = rig.base.commands();
    assert!(commands[commands.len() - 1].is_zero());
    assert!(commands[..commands.len() - 1].iter().all(|c| !c.is_zero()));
}

#[test]
fn backs_up_on_a_small_free_grid() {
    let config = BackupConfig {
        max_radius: 0.4,
        ..Default::default()
    };
    let costmap = SharedCostmap::new(OccupancyGrid::new(10, 10, 0.1, -0.5, -0.5));
    let mut rig = Rig::build(costmap, config, Arc::new(OpenFloor));
    rig.server.start(&command(0.5, 0.2, 10)).unwrap();

    let direction = rig.server.behavior().motion().unwrap().direction;
    assert_eq!(direction.angle, 0.0);
    assert!((direction.arc.width() - 2.0 * std::f64::consts::PI).abs() < 1e-9);

    let outcome = rig.run(100);
    assert!(matches!(outcome, Some(Outcome::Succeeded { .. })));

    let distances = rig.feedback.distances();
    assert!(distances.windows(2).all(|w| w[1] > w[0]));
    assert!(distances[distances.len() - 2] < 0.5);
    assert!(distances[distances.len() - 1] >= 0.5);
    assert!(rig.base.current_command().is_zero());
}

#[test]
fn escapes_a_corner_away_from_the_walls() {
    let mut rig = Rig::new(cornered_grid());
    rig.server.start(&command(0.3, 0.1, 10)).unwrap();

    let angle = rig.server.behavior().motion().unwrap().direction.angle;
    assert!(angle.cos() < 0.0 && angle.sin() < 0.0, "angle {}", angle);

    let outcome = rig.run(100);
    assert!(matches!(outcome, Some(Outcome::Succeeded { .. })));
    let pose = rig.base.get_pose();
    assert!(pose.x < 0.0 && pose.y < 0.0);
    assert!(pose.distance_to(&Pose2D::default()) >= 0.3);
}

#[test]
fn stops_when_time_allowance_runs_out() {
    let mut rig = Rig::new(open_grid());
    rig.server.start(&command(1.0, 0.05, 1)).unwrap();

    let outcome = rig.run(100);
    assert_eq!(
        outcome,
        Some(Outcome::Failed {
            cycles: 12,
            error: BehaviorError::TimeExceeded
        })
    );
    assert_eq!(rig.server.behavior().state(), BehaviorState::Failed);
    assert!(rig.base.current_command().is_zero());
    assert!(rig.base.get_pose().x < 1.0);
}

#[test]
fn stops_when_an_obstacle_appears_ahead() {
    let mut rig = Rig::new(open_grid());
    rig.server.start(&command(1.0, 0.2, 0)).unwrap();

    rig.costmap
        .modify(|grid| {
            let (wall_x, _) = grid.world_to_map(0.5, 0.0);
            for j in 0..60 {
                grid.set_cost_map(wall_x, j, cost_values::LETHAL_OBSTACLE);
            }
        })
        .unwrap();

    let outcome = rig.run(100);
    assert!(matches!(
        outcome,
        Some(Outcome::Failed {
            error: BehaviorError::CollisionImminent,
            ..
        })
    ));
    assert!(rig.base.current_command().is_zero());
    assert!(rig.base.get_pose().x < 0.5);
}

#[test]
fn losing_localization_fails_without_a_stop() {
    let mut rig = Rig::new(open_grid());
    rig.server.start(&command(1.0, 0.2, 10)).unwrap();
    assert_eq!(rig.server.tick(), None);
    assert_eq!(rig.server.tick(), None);

    rig.base.set_localized(false);
    assert_eq!(
        rig.server.tick(),
        Some(Outcome::Failed {
            cycles: 3,
            error: BehaviorError::PoseUnavailable
        })
    );
    assert!(!rig.base.current_command().is_zero());
}

#[test]
fn start_fails_without_a_pose() {
    let mut rig = Rig::new(open_grid());
    rig.base.set_localized(false);

    let err = rig.server.start(&command(0.5, 0.2, 10)).unwrap_err();
    assert_eq!(err, BehaviorError::PoseUnavailable);
    assert_eq!(rig.server.behavior().state(), BehaviorState::Failed);
    assert!(rig.base.commands().is_empty());
    assert_eq!(
        rig.server.outcome(),
        Some(&Outcome::Failed {
            cycles: 0,
            error: BehaviorError::PoseUnavailable
        })
    );
}

#[test]
fn second_goal_is_refused_while_moving() {
    let mut rig = Rig::new(open_grid());
    rig.server.start(&command(0.5, 0.2, 10)).unwrap();
    assert_eq!(rig.server.tick(), None);
    assert_eq!(rig.server.tick(), None);

    let err = rig.server.start(&command(0.2, 0.1, 10)).unwrap_err();
    assert!(matches!(err, BehaviorError::InvalidTransition { .. }));
    assert!(rig.server.is_active());
    assert_eq!(rig.server.outcome(), None);

    // The original goal keeps its cycle count.
    match rig.run(100) {
        Some(Outcome::Succeeded { cycles }) => assert!(cycles >= 28, "cycles {}", cycles),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!((rig.base.get_pose().x - 0.5).abs() < 0.03);
}

#[test]
fn accepts_a_new_goal_after_finishing() {
    let mut rig = Rig::new(open_grid());
    rig.server.start(&command(0.1, 0.2, 10)).unwrap();
    assert!(matches!(rig.run(50), Some(Outcome::Succeeded { .. })));

    rig.server.start(&command(0.1, 0.2, 10)).unwrap();
    assert!(rig.server.is_active());
    assert_eq!(rig.server.outcome(), None);
    assert!(matches!(rig.run(50), Some(Outcome::Succeeded { .. })));
}

#[test]
fn configure_requires_the_costmap_service() {
    let base = Arc::new(SimulatedBase::new(Pose2D::default()));
    let costmap = SharedCostmap::new(open_grid());
    let ctx = BehaviorContext::new(
        Arc::new(ManualClock::new()),
        base.clone(),
        base,
        Arc::new(CostmapCollisionChecker::new(costmap.clone())),
    )
    .with_costmap_service("global_costmap/get_costmap", Arc::new(costmap));

    let mut server = BehaviorServer::new(BackupFreeSpace::new(BackupConfig::default()), ctx);
    assert!(matches!(
        server.configure(),
        Err(BehaviorError::Configuration(_))
    ));
    assert_eq!(server.behavior().state(), BehaviorState::Unconfigured);
}
