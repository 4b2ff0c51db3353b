use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lander::{
    init, App, Command, CommandProvider, Difficulty, GameState, LanderHistory, LanderState, Mode,
    Settings, Vector,
};
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Planar,
    Spatial,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings json file path, defaults are used for every missing key
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "planar")]
    mode: ModeArg,

    /// Terrain seed, random when absent
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    difficulty: Option<DifficultyArg>,

    /// Heightmap json file for the spatial terrain
    #[arg(long, value_name = "FILE")]
    heightmap: Option<PathBuf>,

    /// Frame time in seconds
    #[arg(long, default_value = "0.016")]
    dt: f64,

    /// Maximal number of frames
    #[arg(long, short, default_value = "10000")]
    max_steps: usize,

    /// Print the flight as json instead of a table
    #[arg(long)]
    json: bool,
}

/// Keeps the descent slower than `target_speed` and the lander upright.
struct Autopilot {
    target_speed: f64,
    rotation_step: f64,
}

impl<V: Vector> CommandProvider<V> for Autopilot {
    fn get_cmd(&mut self, lander: &LanderState<V>, _: usize) -> Option<Command> {
        let thrust = if lander.velocity().y() < -self.target_speed {
            1.
        } else {
            0.
        };
        let heading = lander.rotation().z;
        let rotation = if lander.tilt() < self.rotation_step {
            0.
        } else if heading < 180. {
            -self.rotation_step
        } else {
            self.rotation_step
        };
        Some(Command::new(thrust, rotation))
    }
}

#[derive(Serialize)]
struct Report {
    game_state: String,
    score: f64,
    elapsed_time: f64,
    fuel_used: f64,
    history: LanderHistory,
}

fn fly(app: &mut App, pilot: &mut Autopilot, dt: f64, max_steps: usize) -> LanderHistory {
    let mut history = LanderHistory::default();
    history.append_telemetry(app.telemetry());
    app.start();
    for tick in 0..max_steps {
        let command = match (app.planar(), app.spatial()) {
            (Some((lander, _)), _) => pilot.get_cmd(lander, tick),
            (_, Some((lander, _))) => pilot.get_cmd(lander, tick),
            _ => None,
        };
        if let Some(Command { thrust, rotation }) = command {
            app.set_thrust(thrust);
            if rotation > 0. {
                app.rotate_left();
            } else if rotation < 0. {
                app.rotate_right();
            }
        }
        app.update(dt);
        history.append_telemetry(app.telemetry());
        if app.game_state() != GameState::Flying {
            break;
        }
    }
    history
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => init::json::parse_settings(path).map_err(|e| e.to_string())?,
        None => Settings::default(),
    };
    let mode = match cli.mode {
        ModeArg::Planar => Mode::Planar,
        ModeArg::Spatial => Mode::Spatial,
    };
    let mut pilot = Autopilot {
        target_speed: settings.collision_checker.max_vertical_speed() / 2.,
        rotation_step: settings.lander.rotation_step,
    };
    let mut app = match cli.seed {
        Some(seed) => App::with_seed(settings, mode, seed),
        None => App::new(settings, mode),
    };
    if let Some(difficulty) = cli.difficulty {
        app.set_difficulty(match difficulty {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Normal => Difficulty::Normal,
            DifficultyArg::Hard => Difficulty::Hard,
        });
    }
    if let Some(path) = &cli.heightmap {
        app.load_heightmap(path).map_err(|e| e.to_string())?;
    }

    let history = fly(&mut app, &mut pilot, cli.dt, cli.max_steps);

    if cli.json {
        let report = Report {
            game_state: format!("{:?}", app.game_state()),
            score: app.score(),
            elapsed_time: app.elapsed_time(),
            fuel_used: app.fuel_used(),
            history,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?
        );
    } else {
        println!("{}", history.pretty_to_string());
        println!(
            "Finished {:?} after {:.2}s, score {:.0}",
            app.flight_state(),
            app.elapsed_time(),
            app.score()
        );
    }
    Ok(())
}

#[cfg(test)]
mod main_tests {
    use super::*;
    use lander::{Vec2, Vec3};

    fn pilot() -> Autopilot {
        Autopilot {
            target_speed: 20.,
            rotation_step: 2.,
        }
    }

    #[test]
    fn brakes_fast_descent() {
        let falling = LanderState::new(Vec2::new(0., 100.)).with_velocity(Vec2::new(0., -30.));
        let drifting = LanderState::new(Vec2::new(0., 100.)).with_velocity(Vec2::new(0., -10.));
        assert_eq!(pilot().get_cmd(&falling, 0), Some(Command::new(1., 0.)));
        assert_eq!(pilot().get_cmd(&drifting, 0), Some(Command::new(0., 0.)));
    }

    #[test]
    fn rights_the_lander() {
        let left = LanderState::new(Vec3::default()).with_rotation(Vec3::new(0., 0., 10.));
        let right = LanderState::new(Vec3::default()).with_rotation(Vec3::new(0., 0., -10.));
        assert_eq!(pilot().get_cmd(&left, 0).map(|c| c.rotation), Some(-2.));
        assert_eq!(pilot().get_cmd(&right, 0).map(|c| c.rotation), Some(2.));
    }

    #[test]
    fn flight_ends_in_touchdown() {
        let mut app = App::with_seed(Settings::default(), Mode::Planar, 11);
        let history = fly(&mut app, &mut pilot(), 0.016, 10_000);
        assert!(matches!(app.game_state(), GameState::Landed | GameState::Crashed));
        assert!(history.len() > 2);
    }
}
