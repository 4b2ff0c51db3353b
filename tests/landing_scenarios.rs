use lander::{
    App, CollisionChecker, ExecutionStatus, FlightState, GameState, Landing, LanderRunner,
    LanderState, Mode, Physics, Settings, Terrain2D, TerrainSegment, Vec2, WorldSize,
};

const DT: f64 = 0.1;

fn assert_close(left: f64, right: f64, tolerance: f64) {
    if (left - right).abs() > tolerance {
        panic!("Float close assertion failed, {left} != {right} (tolerance {tolerance})");
    }
}

fn pad_terrain() -> Terrain2D {
    Terrain2D::from_segments(
        800.,
        600.,
        vec![
            TerrainSegment::new(Vec2::new(0., 150.), Vec2::new(350., 50.), false),
            TerrainSegment::new(Vec2::new(350., 50.), Vec2::new(450., 50.), true),
            TerrainSegment::new(Vec2::new(450., 50.), Vec2::new(800., 250.), false),
        ],
    )
}

fn runner() -> LanderRunner {
    LanderRunner::new(Physics::default().with_unit_scale(1.), CollisionChecker::default())
}

fn fall(lander: &mut LanderState<Vec2>, terrain: &Terrain2D) -> usize {
    let runner = runner();
    (1..=100_000)
        .find(|_| runner.step(lander, terrain, DT) == ExecutionStatus::Finished)
        .expect("Lander never touched down")
}

#[test]
fn free_fall_onto_pad_lands() {
    let mut lander = LanderState::new(Vec2::new(400., 500.));
    fall(&mut lander, &pad_terrain());

    assert!(lander.is_landed());
    assert!(!lander.is_crashed());
    assert_eq!(*lander.flight_state(), FlightState::Landed(Landing::Correct));
    assert_eq!(lander.velocity(), Vec2::default());
    assert_eq!(lander.position().y, 50. + lander.dimensions().height / 2.);
    assert_eq!(lander.fuel(), 1000.);
}

#[test]
fn fast_descent_onto_pad_crashes() {
    let mut lander = LanderState::new(Vec2::new(400., 500.)).with_velocity(Vec2::new(0., -50.));
    fall(&mut lander, &pad_terrain());

    assert!(lander.is_crashed());
    assert!(!lander.is_landed());
    assert!(matches!(
        lander.flight_state(),
        FlightState::Landed(Landing::TooFastVertical { .. })
    ));
}

#[test]
fn free_fall_beside_pad_crashes() {
    let mut lander = LanderState::new(Vec2::new(100., 500.));
    fall(&mut lander, &pad_terrain());
    assert_eq!(*lander.flight_state(), FlightState::Landed(Landing::WrongTerrain));
}

#[test]
fn pure_gravity_is_linear_in_time() {
    let runner = LanderRunner::default();
    let terrain = pad_terrain();
    let mut lander = LanderState::new(Vec2::new(400., 10_000.)).with_velocity(Vec2::new(5., 0.));
    for n in 1..=50 {
        runner.step(&mut lander, &terrain, DT);
        assert_close(lander.velocity().y, -1.62 * 10.31 * DT * n as f64, 1e-9);
        assert_close(lander.velocity().x, 5., 1e-12);
    }
}

#[test]
fn vertical_speed_threshold_is_inclusive() {
    let checker = CollisionChecker::default();
    let contact = lander::Contact {
        height: 50.,
        on_landing_pad: true,
    };
    let at = LanderState::new(Vec2::new(400., 65.)).with_velocity(Vec2::new(20., -40.));
    let above = LanderState::new(Vec2::new(400., 65.)).with_velocity(Vec2::new(0., -40.001));
    assert_eq!(checker.classify(&at, &contact), Landing::Correct);
    assert!(matches!(
        checker.classify(&above, &contact),
        Landing::TooFastVertical { .. }
    ));
}

#[test]
fn session_replays_with_seed() {
    let settings = Settings {
        world: WorldSize {
            width: 400.,
            height: 300.,
            length: 400.,
        },
        ..Settings::default()
    };
    let play = |mode| {
        let mut app = App::with_seed(settings.clone(), mode, 42);
        app.start();
        app.set_thrust(1.);
        while app.game_state() == GameState::Flying {
            app.update(DT);
        }
        (app.telemetry(), app.game_state(), app.elapsed_time())
    };
    assert_eq!(play(Mode::Planar), play(Mode::Planar));
    assert_eq!(play(Mode::Spatial), play(Mode::Spatial));
}

#[test]
fn heightmap_survives_reset() {
    let path = std::env::temp_dir().join(format!("lander_heightmap_{}.json", std::process::id()));
    std::fs::write(&path, r#"{"Heights": [[10, 10, 10], [10, 10, 10], [10, 10, 10]]}"#).unwrap();

    let mut app = App::with_seed(Settings::default(), Mode::Spatial, 5);
    app.load_heightmap(&path).unwrap();
    let loaded = app.spatial().unwrap().1.clone();
    assert!(loaded.landing_pad().is_some());
    assert_eq!(loaded.ground_at(400., 400.).map(|c| c.height), Some(10.));

    app.reset();
    assert_eq!(app.spatial().unwrap().1, &loaded);
    std::fs::remove_file(&path).unwrap();

    assert!(app.load_heightmap(&path).is_err());
    assert_eq!(app.spatial().unwrap().1, &loaded);
}
