use serde::Serialize;

use super::{CollisionChecker, Landing, LanderState, Physics, Surface, Vector};

#[derive(Debug, Clone, PartialEq)]
pub enum FlightState {
    Flying,
    Landed(Landing),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    InProgress,
    Finished,
}

/// Pilot input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Command {
    pub thrust: f64,
    pub rotation: f64,
}

impl Command {
    pub fn new(thrust: f64, rotation: f64) -> Self {
        Self { thrust, rotation }
    }
}

pub trait CommandProvider<V: Vector> {
    fn get_cmd(&mut self, lander: &LanderState<V>, tick: usize) -> Option<Command>;
}

/// Advances one lander over one terrain. Neither is owned by the runner.
#[derive(Clone, Debug, Default)]
pub struct LanderRunner {
    physics: Physics,
    collision_checker: CollisionChecker,
}

impl LanderRunner {
    pub fn new(physics: Physics, collision_checker: CollisionChecker) -> Self {
        Self {
            physics,
            collision_checker,
        }
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn collision_checker(&self) -> &CollisionChecker {
        &self.collision_checker
    }

    pub fn set_physics(&mut self, physics: Physics) {
        self.physics = physics;
    }

    /// Forces, explicit Euler position update, then touchdown resolution.
    ///
    /// Position advances with the already force-updated velocity (first order).
    /// `dt` is not clamped here.
    pub fn step<S: Surface>(&self, lander: &mut LanderState<S::Vector>, terrain: &S, dt: f64) -> ExecutionStatus {
        if lander.is_terminal() {
            return ExecutionStatus::Finished;
        }
        log::trace!("step: dt={dt} position={:?}", lander.position());

        self.physics.apply_forces(lander, dt);
        let velocity = lander.velocity();
        *lander.position_mut() += velocity * dt;

        if let Some(contact) = self.collision_checker.check(lander, terrain) {
            let mut position = lander.position();
            position.set_y(contact.height + lander.dimensions().height / 2.);
            *lander.position_mut() = position;

            let landing = self.collision_checker.classify(lander, &contact);
            match landing {
                Landing::Correct => log::info!("Successful landing at {position:?}"),
                ref other => log::info!("Crash landing at {position:?}: {other:?}"),
            }
            lander.touch_down(landing);
            ExecutionStatus::Finished
        } else {
            ExecutionStatus::InProgress
        }
    }

    /// Applies pilot commands and steps until touchdown or `max_ticks`.
    pub fn run<S: Surface>(
        &self,
        lander: &mut LanderState<S::Vector>,
        terrain: &S,
        pilot: &mut impl CommandProvider<S::Vector>,
        dt: f64,
        max_ticks: usize,
    ) -> LanderHistory {
        let mut history = LanderHistory::with_initial_state(lander);
        for tick in 0..max_ticks {
            if let Some(Command { thrust, rotation }) = pilot.get_cmd(lander, tick) {
                lander.set_thrust(thrust);
                if rotation >= 0. {
                    lander.rotate_left(rotation);
                } else {
                    lander.rotate_right(-rotation);
                }
            }
            let status = self.step(lander, terrain, dt);
            history.append_lander_state(lander);
            if status == ExecutionStatus::Finished {
                break;
            }
        }
        history
    }
}

/// Telemetry sample, independent of the simulation dimension.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Telemetry {
    pub position: (f64, f64, f64),
    pub velocity: (f64, f64, f64),
    pub rotation: (f64, f64, f64),
    pub fuel: f64,
    pub thrust_level: f64,
    pub thrust_active: bool,
}

impl<V: Vector> From<&LanderState<V>> for Telemetry {
    fn from(lander: &LanderState<V>) -> Self {
        let position = lander.position().to_vec3();
        let velocity = lander.velocity().to_vec3();
        let rotation = lander.rotation();
        Self {
            position: (position.x, position.y, position.z),
            velocity: (velocity.x, velocity.y, velocity.z),
            rotation: (rotation.x, rotation.y, rotation.z),
            fuel: lander.fuel(),
            thrust_level: lander.thrust_level(),
            thrust_active: lander.thrust_active(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LanderHistory {
    samples: Vec<Telemetry>,
}

impl LanderHistory {
    pub fn with_initial_state<V: Vector>(state: &LanderState<V>) -> Self {
        Self {
            samples: vec![state.into()],
        }
    }

    pub fn append_lander_state<V: Vector>(&mut self, state: &LanderState<V>) {
        self.samples.push(state.into());
    }

    pub fn append_telemetry(&mut self, telemetry: Telemetry) {
        self.samples.push(telemetry);
    }

    pub fn iter_history(&self) -> impl Iterator<Item = &Telemetry> + '_ {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn pretty_to_string(&self) -> String {
        self.iter_history().fold(
            format!(
                "{:>9}{:>9}{:>9}{:>9}{:>9}{:>9}{:>9}{:>9}",
                "X", "Y", "Z", "VX", "VY", "VZ", "FUEL", "HEADING"
            ),
            |out,
             Telemetry {
                 position: (x, y, z),
                 velocity: (vx, vy, vz),
                 rotation: (_, _, heading),
                 fuel,
                 ..
             }| {
                out + &format!(
                    "\n{x:9.2}{y:9.2}{z:9.2}{vx:9.2}{vy:9.2}{vz:9.2}{fuel:9.2}{heading:9.1}"
                )
            },
        )
    }
}
