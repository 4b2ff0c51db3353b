use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, SeedableRng};

use crate::entity::{Entity, EntityId, EntityIds, TerrainView};
use crate::error::TerrainLoadError;
use crate::simulation::*;

/// Longest step the session integrates, whatever the frame time.
pub const MAX_DT: f64 = 0.1;

pub(crate) mod defaults {
    pub const WORLD_WIDTH: f64 = 800.;
    pub const WORLD_HEIGHT: f64 = 600.;
    pub const WORLD_LENGTH: f64 = 800.;
    pub const ROTATION_STEP: f64 = 2.;
    pub const MAX_SCORE: f64 = 1000.;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldSize {
    pub width: f64,
    pub height: f64,
    pub length: f64,
}

impl Default for WorldSize {
    fn default() -> Self {
        Self {
            width: defaults::WORLD_WIDTH,
            height: defaults::WORLD_HEIGHT,
            length: defaults::WORLD_LENGTH,
        }
    }
}

/// Per-instance lander constants.
#[derive(Clone, Debug, PartialEq)]
pub struct LanderSettings {
    pub dimensions: Dimensions,
    pub mass: f64,
    pub max_fuel: f64,
    pub fuel_consumption: f64,
    pub rotation_step: f64,
}

impl Default for LanderSettings {
    fn default() -> Self {
        let lander = LanderState::<Vec2>::default();
        Self {
            dimensions: lander.dimensions(),
            mass: lander.mass(),
            max_fuel: lander.max_fuel(),
            fuel_consumption: lander.fuel_consumption(),
            rotation_step: defaults::ROTATION_STEP,
        }
    }
}

impl LanderSettings {
    fn build<V: Vector>(&self, position: V) -> LanderState<V> {
        LanderState::new(position)
            .with_dimensions(self.dimensions)
            .with_mass(self.mass)
            .with_max_fuel(self.max_fuel)
            .with_fuel(self.max_fuel)
            .with_fuel_consumption(self.fuel_consumption)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    pub physics: Physics,
    pub collision_checker: CollisionChecker,
    pub terrain: TerrainSettings,
    pub lander: LanderSettings,
    pub world: WorldSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Planar,
    Spatial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub fn gravity(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Normal => 1.62,
            Difficulty::Hard => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ready,
    Flying,
    Landed,
    Crashed,
}

enum World {
    Planar {
        lander: LanderState<Vec2>,
        terrain: Terrain2D,
    },
    Spatial {
        lander: LanderState<Vec3>,
        terrain: Terrain3D,
    },
}

/// One game session: the lander, its terrain and the game-level bookkeeping around them.
pub struct App {
    settings: Settings,
    mode: Mode,
    difficulty: Difficulty,
    runner: LanderRunner,
    world: World,
    rng: StdRng,
    ids: EntityIds,
    lander_id: EntityId,
    terrain_id: EntityId,
    heightmap: Option<PathBuf>,
    game_state: GameState,
    score: f64,
    elapsed_time: f64,
    fuel_used: f64,
}

impl App {
    pub fn new(settings: Settings, mode: Mode) -> Self {
        Self::with_rng(settings, mode, StdRng::from_entropy())
    }

    /// Reproducible session: the same seed gives the same terrains.
    pub fn with_seed(settings: Settings, mode: Mode, seed: u64) -> Self {
        Self::with_rng(settings, mode, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: Settings, mode: Mode, mut rng: StdRng) -> Self {
        let mut ids = EntityIds::default();
        let lander_id = ids.allocate();
        let terrain_id = ids.allocate();
        let world = build_world(&settings, mode, &mut rng);
        let difficulty = if settings.physics.g() == Difficulty::Easy.gravity() {
            Difficulty::Easy
        } else if settings.physics.g() == Difficulty::Hard.gravity() {
            Difficulty::Hard
        } else {
            Difficulty::Normal
        };
        Self {
            runner: LanderRunner::new(settings.physics.clone(), settings.collision_checker.clone()),
            settings,
            mode,
            difficulty,
            world,
            rng,
            ids,
            lander_id,
            terrain_id,
            heightmap: None,
            game_state: GameState::Ready,
            score: 0.,
            elapsed_time: 0.,
            fuel_used: 0.,
        }
    }

    pub fn start(&mut self) {
        if self.game_state == GameState::Ready {
            self.game_state = GameState::Flying;
        }
    }

    /// Fresh lander on a regenerated terrain, straight into flight.
    pub fn reset(&mut self) {
        self.game_state = GameState::Flying;
        self.score = 0.;
        self.elapsed_time = 0.;
        self.fuel_used = 0.;

        let WorldSize {
            width,
            height,
            length,
        } = self.settings.world;
        let terrain_settings = &self.settings.terrain;
        match &mut self.world {
            World::Planar { lander, terrain } => {
                lander.respawn_at(Vec2::new(width / 2., height * 5. / 6.));
                *terrain = Terrain2D::generate_with_rng(width, height, terrain_settings, &mut self.rng);
            }
            World::Spatial { lander, terrain } => {
                lander.respawn_at(Vec3::new(width / 2., height * 5. / 6., length / 2.));
                let loaded = self.heightmap.as_ref().map(|path| {
                    terrain.load_heightmap(path, width, length, terrain_settings)
                });
                match loaded {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        log::warn!("Falling back to generated terrain: {e}");
                        *terrain = Terrain3D::generate_with_rng(width, length, height, terrain_settings, &mut self.rng);
                    }
                    None => {
                        *terrain = Terrain3D::generate_with_rng(width, length, height, terrain_settings, &mut self.rng);
                    }
                }
            }
        }
        self.terrain_id = self.ids.allocate();
        log::debug!(
            "Game reset: mode {:?}, lander at {:?}",
            self.mode,
            self.telemetry().position
        );
    }

    /// Advances the flight by one frame. Only a flying game moves.
    /// Drifting past the terrain edge counts as a crash off the pad.
    pub fn update(&mut self, dt: f64) {
        if self.game_state != GameState::Flying {
            return;
        }
        let dt = dt.clamp(0., MAX_DT);
        let fuel_before = self.telemetry().fuel;
        match &mut self.world {
            World::Planar { lander, terrain } => {
                self.runner.step(lander, terrain, dt);
                let x = lander.position().x;
                if !lander.is_terminal() && !(0. ..=terrain.width()).contains(&x) {
                    log::info!("Lander left the terrain at x={x:.1}");
                    lander.touch_down(Landing::WrongTerrain);
                }
            }
            World::Spatial { lander, terrain } => {
                self.runner.step(lander, terrain, dt);
                let Vec3 { x, z, .. } = lander.position();
                let inside = (0. ..=terrain.width()).contains(&x) && (0. ..=terrain.length()).contains(&z);
                if !lander.is_terminal() && !inside {
                    log::info!("Lander left the terrain at x={x:.1} z={z:.1}");
                    lander.touch_down(Landing::WrongTerrain);
                }
            }
        }
        self.fuel_used += fuel_before - self.telemetry().fuel;
        self.elapsed_time += dt;

        let (landed, crashed, fuel_fraction) = match &self.world {
            World::Planar { lander, .. } => (lander.is_landed(), lander.is_crashed(), lander.fuel() / lander.max_fuel()),
            World::Spatial { lander, .. } => (lander.is_landed(), lander.is_crashed(), lander.fuel() / lander.max_fuel()),
        };
        if landed {
            self.game_state = GameState::Landed;
            self.score = if fuel_fraction.is_finite() {
                fuel_fraction * defaults::MAX_SCORE
            } else {
                0.
            };
            log::info!("Landing successful! Score: {:.0}", self.score);
        } else if crashed {
            self.game_state = GameState::Crashed;
            self.score = 0.;
            log::info!("Crash landing! Score: 0");
        }
    }

    pub fn set_thrust(&mut self, level: f64) {
        if self.game_state != GameState::Flying {
            return;
        }
        match &mut self.world {
            World::Planar { lander, .. } => lander.set_thrust(level),
            World::Spatial { lander, .. } => lander.set_thrust(level),
        }
    }

    pub fn rotate_left(&mut self) {
        if self.game_state != GameState::Flying {
            return;
        }
        let step = self.settings.lander.rotation_step;
        match &mut self.world {
            World::Planar { lander, .. } => lander.rotate_left(step),
            World::Spatial { lander, .. } => lander.rotate_left(step),
        }
    }

    pub fn rotate_right(&mut self) {
        if self.game_state != GameState::Flying {
            return;
        }
        let step = self.settings.lander.rotation_step;
        match &mut self.world {
            World::Planar { lander, .. } => lander.rotate_right(step),
            World::Spatial { lander, .. } => lander.rotate_right(step),
        }
    }

    /// New gravity, then a fresh game.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.settings.physics = self.settings.physics.clone().with_g(difficulty.gravity());
        self.runner.set_physics(self.settings.physics.clone());
        self.reset();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.world = build_world(&self.settings, mode, &mut self.rng);
        self.lander_id = self.ids.allocate();
        self.reset();
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(match self.mode {
            Mode::Planar => Mode::Spatial,
            Mode::Spatial => Mode::Planar,
        });
    }

    /// Switches the spatial terrain to a heightmap, kept across resets.
    pub fn load_heightmap<P: AsRef<Path>>(&mut self, path: P) -> Result<(), TerrainLoadError> {
        let World::Spatial { terrain, .. } = &mut self.world else {
            return Err(TerrainLoadError::PlanarMode);
        };
        let WorldSize { width, length, .. } = self.settings.world;
        terrain
            .load_heightmap(path.as_ref(), width, length, &self.settings.terrain)
            .inspect_err(|e| log::warn!("Keeping current terrain: {e}"))?;
        self.heightmap = Some(path.as_ref().to_path_buf());
        self.terrain_id = self.ids.allocate();
        Ok(())
    }

    pub fn telemetry(&self) -> Telemetry {
        match &self.world {
            World::Planar { lander, .. } => lander.into(),
            World::Spatial { lander, .. } => lander.into(),
        }
    }

    pub fn flight_state(&self) -> &FlightState {
        match &self.world {
            World::Planar { lander, .. } => lander.flight_state(),
            World::Spatial { lander, .. } => lander.flight_state(),
        }
    }

    pub fn entities(&self) -> [(EntityId, Entity<'_>); 2] {
        let (lander, terrain) = match &self.world {
            World::Planar { lander, terrain } => (
                Entity::Lander {
                    telemetry: lander.into(),
                    dimensions: lander.dimensions(),
                    flight_state: lander.flight_state(),
                },
                TerrainView::Segments(terrain.segments()),
            ),
            World::Spatial { lander, terrain } => (
                Entity::Lander {
                    telemetry: lander.into(),
                    dimensions: lander.dimensions(),
                    flight_state: lander.flight_state(),
                },
                TerrainView::Triangles(terrain.triangles()),
            ),
        };
        [
            (self.lander_id, lander),
            (self.terrain_id, Entity::Terrain(terrain)),
        ]
    }

    pub fn planar(&self) -> Option<(&LanderState<Vec2>, &Terrain2D)> {
        match &self.world {
            World::Planar { lander, terrain } => Some((lander, terrain)),
            World::Spatial { .. } => None,
        }
    }

    pub fn spatial(&self) -> Option<(&LanderState<Vec3>, &Terrain3D)> {
        match &self.world {
            World::Spatial { lander, terrain } => Some((lander, terrain)),
            World::Planar { .. } => None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn fuel_used(&self) -> f64 {
        self.fuel_used
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

fn build_world(settings: &Settings, mode: Mode, rng: &mut StdRng) -> World {
    let WorldSize {
        width,
        height,
        length,
    } = settings.world;
    match mode {
        Mode::Planar => World::Planar {
            lander: settings.lander.build(Vec2::new(width / 2., height * 5. / 6.)),
            terrain: Terrain2D::generate_with_rng(width, height, &settings.terrain, rng),
        },
        Mode::Spatial => World::Spatial {
            lander: settings.lander.build(Vec3::new(width / 2., height * 5. / 6., length / 2.)),
            terrain: Terrain3D::generate_with_rng(width, length, height, &settings.terrain, rng),
        },
    }
}
