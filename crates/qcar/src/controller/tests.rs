use super::*;
use crate::agent::{DistanceBucket, LateralBucket, N_ACTIONS};
use crate::geom::Line2D;
use crate::sensing::NO_READING;
use crate::track::Pose;

fn seeded(seed: u64) -> SimCfg {
    let mut cfg = SimCfg::default();
    cfg.train.seed = Some(seed);
    cfg
}

fn far_destination() -> (Point2D, Point2D) {
    (Point2D::new(500.0, 500.0), Point2D::new(510.0, 510.0))
}

fn open_field() -> Track {
    Track::new(Vec::new(), far_destination(), None)
}

#[test]
fn wall_behind_the_vehicle_reads_only_on_the_sides() {
    let wall = Line2D::from_coords(-6.0, -3.0, 6.0, -3.0);
    let track = Track::new(vec![wall], far_destination(), None);
    let mut pg = Playground::new(seeded(1), track, QTable::zeros()).unwrap();
    let reading = pg.set_pose(Point2D::new(0.0, 0.0), 90.0);
    assert!(!pg.done());
    assert!(!pg.complete());
    assert_eq!(reading.front, NO_READING);
    // Side rays lean forward and never reach the wall either.
    assert_eq!(reading.right, NO_READING);
    assert_eq!(reading.left, NO_READING);

    // Turned around one unit further up, the front ray hits it four units out.
    let reading = pg.set_pose(Point2D::new(0.0, 1.0), 270.0);
    assert!(!pg.done());
    assert!((reading.front - 4.0).abs() < 1e-9);
}

#[test]
fn reaching_the_destination_completes_the_episode() {
    let dest = (Point2D::new(18.0, 40.0), Point2D::new(30.0, 37.0));
    let track = Track::new(Vec::new(), dest, None);
    let mut pg = Playground::new(seeded(2), track, QTable::zeros()).unwrap();
    assert!(!pg.done());
    pg.set_pose(Point2D::new(20.0, 38.0), 90.0);
    assert!(pg.done());
    assert!(pg.complete());
}

#[test]
fn terminal_state_is_frozen_until_reset() {
    let wall = Line2D::from_coords(-20.0, 2.0, 20.0, 2.0);
    let track = Track::new(vec![wall], far_destination(), None);
    let mut pg = Playground::new(seeded(3), track, QTable::zeros()).unwrap();
    assert!(pg.done(), "body starts touching the wall");
    assert!(!pg.complete());
    let scan = pg.scan();
    let vehicle = pg.vehicle().clone();
    for angle in [-30.0, 0.0, 30.0] {
        assert_eq!(pg.step(Some(angle)), scan.reading);
        assert_eq!(pg.scan(), scan);
    }
    pg.set_pose(Point2D::new(50.0, 50.0), 0.0);
    assert_eq!(pg.vehicle(), &vehicle);
    assert!(pg.run_simulation(0.5, scan.reading).unwrap().is_none());
    assert_eq!(pg.table(), &QTable::zeros());
}

#[test]
fn open_field_reads_the_sentinel_and_steps_forward() {
    let mut pg = Playground::new(seeded(4), open_field(), QTable::zeros()).unwrap();
    assert_eq!(pg.state(), SensorReading::NONE);
    let x0 = pg.vehicle().x;
    assert!((-1.5..1.5).contains(&x0));
    pg.step(Some(0.0));
    assert!((pg.vehicle().y - 1.0).abs() < 1e-12);
    assert!((pg.vehicle().x - x0).abs() < 1e-12);
    pg.step(None);
    assert!((pg.vehicle().y - 2.0).abs() < 1e-12);
    assert!(!pg.done());
}

#[test]
fn reset_honors_the_track_start_pose() {
    let start = Pose {
        position: Point2D::new(7.0, -2.0),
        angle: 45.0,
    };
    let track = Track::new(Vec::new(), far_destination(), Some(start));
    let mut pg = Playground::new(seeded(5), track, QTable::zeros()).unwrap();
    pg.step(Some(30.0));
    pg.reset();
    let v = pg.vehicle();
    assert_eq!((v.x, v.y, v.angle), (7.0, -2.0, 45.0));
    assert_eq!(v.wheel_angle, 0.0);
}

#[test]
fn run_simulation_updates_the_visited_cell() {
    let mut pg = Playground::new(seeded(6), Track::default_track(), QTable::zeros()).unwrap();
    let reading = pg.state();
    let t = pg.run_simulation(1.0, reading).unwrap().unwrap();
    assert!(t.action < N_ACTIONS);
    assert_eq!(t.angle, crate::agent::index_to_angle(t.action));
    assert_eq!(t.reading, pg.state());
    assert_eq!(t.prev, StateLabel::from_reading(&reading, &pg.cfg().agent));
    // Running rewards are never zero, so the cell must have moved.
    assert!(t.reward != 0.0);
    let expected = pg.cfg().agent.alpha * t.reward;
    assert!((pg.table().get(t.prev, t.action) - expected).abs() < 1e-12);
    assert_eq!(pg.cumulative_reward(), t.reward);
}

#[test]
fn success_saves_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q.json");
    let dest = (Point2D::new(-10.0, 2.0), Point2D::new(10.0, 6.0));
    let track = Track::new(Vec::new(), dest, None);
    let mut pg = Playground::new(seeded(7), track, QTable::zeros())
        .unwrap()
        .with_table_path(&path);
    let report = pg.run_episode(1.0).unwrap();
    assert!(report.complete);
    assert!(!report.truncated);
    assert!(report.steps <= 3, "{report:?}");
    assert_eq!(pg.failures(), 0);
    let stored = QTable::load(&path).unwrap().unwrap();
    for (label, row) in pg.table().iter() {
        for (a, b) in row.iter().zip(stored.row(label)) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}

#[test]
fn step_cap_ends_the_episode_as_a_failure() {
    let mut cfg = seeded(8);
    cfg.train.max_steps = 25;
    let mut pg = Playground::new(cfg, open_field(), QTable::zeros()).unwrap();
    let report = pg.run_episode(0.3).unwrap();
    assert_eq!(report.steps, 25);
    assert!(report.truncated);
    assert!(!report.complete);
    assert_eq!(pg.failures(), 1);
}

#[test]
fn training_counts_failures_and_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ckpt").join("q.json");
    let mut cfg = seeded(9);
    cfg.train.max_steps = 10;
    cfg.train.checkpoint_every = Some(2);
    let mut pg = Playground::new(cfg, open_field(), QTable::zeros())
        .unwrap()
        .with_table_path(&path);
    let report = pg.train(5, 0.9).unwrap();
    assert_eq!(report.episodes, 5);
    assert_eq!(report.successes, 0);
    assert_eq!(report.failures, 5);
    assert!(!report.interrupted);
    assert!(path.exists());

    // The counter is per run.
    let again = pg.train(2, 0.9).unwrap();
    assert_eq!(again.failures, 2);
    assert_eq!(pg.failures(), 2);
}

#[test]
fn callback_can_interrupt_training() {
    let mut cfg = seeded(10);
    cfg.train.max_steps = 5;
    let mut pg = Playground::new(cfg, open_field(), QTable::zeros()).unwrap();
    let mut seen = Vec::new();
    let report = pg
        .train_with(100, 0.5, |i, ep| {
            seen.push(ep.epsilon);
            if i == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
    assert!(report.interrupted);
    assert_eq!(report.episodes, 3);
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], 0.5);
    assert!(seen.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn epsilon_decays_exponentially() {
    let train = TrainCfg::default();
    assert_eq!(train.epsilon_at(0.99, 0, 100), 0.99);
    let mid = train.epsilon_at(0.99, 50, 100);
    assert!((mid - 0.99 * (-2.0f64).exp()).abs() < 1e-12);
    assert_eq!(train.epsilon_at(0.4, 3, 0), 0.4);
    let flat = TrainCfg {
        decay: 0.0,
        ..TrainCfg::default()
    };
    assert_eq!(flat.epsilon_at(0.7, 99, 100), 0.7);
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = || {
        let mut cfg = seeded(11);
        cfg.train.max_steps = 200;
        let mut pg = Playground::new(cfg, Track::default_track(), QTable::zeros()).unwrap();
        let report = pg.train(20, 0.9).unwrap();
        (report, pg.into_table())
    };
    assert_eq!(run(), run());
}

#[test]
fn greedy_table_prefers_learned_action() {
    let mut table = QTable::zeros();
    // Everything open ahead reads as the sentinel, which buckets as close/center.
    let label = StateLabel::new(DistanceBucket::Close, LateralBucket::Center);
    table.row_mut(label)[3] = 1.0;
    let mut pg = Playground::new(seeded(12), open_field(), table).unwrap();
    let reading = pg.state();
    let t = pg.run_simulation(0.0, reading).unwrap().unwrap();
    assert_eq!(t.prev, label);
    assert_eq!(t.angle, 0.0);
}

#[test]
fn invalid_configs_and_tables_are_rejected() {
    let mut cfg = SimCfg::default();
    cfg.train.max_steps = 0;
    assert!(matches!(
        Playground::new(cfg, open_field(), QTable::zeros()),
        Err(ConfigError::Train { .. })
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q.json");
    std::fs::write(&path, "{}").unwrap();
    assert!(matches!(
        Playground::open(SimCfg::default(), open_field(), &path),
        Err(SimError::Table(TableError::Json { .. }))
    ));
}
