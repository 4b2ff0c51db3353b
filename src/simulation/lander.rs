use super::{FlightState, Landing, Vec3, Vector};

pub(crate) mod defaults {
    pub const WIDTH: f64 = 20.;
    pub const HEIGHT: f64 = 30.;
    pub const DEPTH: f64 = 20.;
    pub const MASS: f64 = 10000.;
    pub const MAX_FUEL: f64 = 1000.;
    pub const FUEL_CONSUMPTION: f64 = 10.;
}

/// Bounding box of the body, used for contact extent and drag area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: defaults::WIDTH,
            height: defaults::HEIGHT,
            depth: defaults::DEPTH,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Spawn<V> {
    position: V,
    velocity: V,
    rotation: Vec3,
    fuel: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LanderState<V: Vector> {
    position: V,
    velocity: V,
    rotation: Vec3,
    fuel: f64,
    thrust_level: f64,
    flight_state: FlightState,
    dimensions: Dimensions,
    mass: f64,
    max_fuel: f64,
    fuel_consumption: f64,
    spawn: Spawn<V>,
}

impl<V: Vector> Default for LanderState<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: Vector> LanderState<V> {
    pub fn new(position: V) -> Self {
        Self {
            position,
            velocity: V::default(),
            rotation: Vec3::default(),
            fuel: defaults::MAX_FUEL,
            thrust_level: 0.,
            flight_state: FlightState::Flying,
            dimensions: Dimensions::default(),
            mass: defaults::MASS,
            max_fuel: defaults::MAX_FUEL,
            fuel_consumption: defaults::FUEL_CONSUMPTION,
            spawn: Spawn {
                position,
                velocity: V::default(),
                rotation: Vec3::default(),
                fuel: defaults::MAX_FUEL,
            },
        }
    }

    pub fn with_position(self, position: V) -> Self {
        Self {
            position,
            spawn: Spawn { position, ..self.spawn },
            ..self
        }
    }

    pub fn with_velocity(self, velocity: V) -> Self {
        Self {
            velocity,
            spawn: Spawn { velocity, ..self.spawn },
            ..self
        }
    }

    pub fn with_rotation(self, rotation: Vec3) -> Self {
        let rotation = rotation.map(normalize_degrees);
        Self {
            rotation,
            spawn: Spawn { rotation, ..self.spawn },
            ..self
        }
    }

    /// Also raises the tank capacity when `fuel` exceeds it.
    pub fn with_fuel(self, fuel: f64) -> Self {
        let fuel = fuel.max(0.);
        Self {
            fuel,
            max_fuel: self.max_fuel.max(fuel),
            spawn: Spawn { fuel, ..self.spawn },
            ..self
        }
    }

    pub fn with_max_fuel(self, max_fuel: f64) -> Self {
        let max_fuel = max_fuel.max(0.);
        let fuel = self.fuel.min(max_fuel);
        Self {
            fuel,
            max_fuel,
            spawn: Spawn {
                fuel: self.spawn.fuel.min(max_fuel),
                ..self.spawn
            },
            ..self
        }
    }

    pub fn with_dimensions(self, dimensions: Dimensions) -> Self {
        Self { dimensions, ..self }
    }

    /// A non-positive mass is ignored.
    pub fn with_mass(self, mass: f64) -> Self {
        if !(mass > 0.) {
            return self;
        }
        Self { mass, ..self }
    }

    pub fn with_fuel_consumption(self, fuel_consumption: f64) -> Self {
        Self {
            fuel_consumption,
            ..self
        }
    }

    /// Back to the spawn state. Mass, dimensions and tank capacity are kept.
    pub fn reset(&mut self) {
        let Spawn {
            position,
            velocity,
            rotation,
            fuel,
        } = self.spawn.clone();
        self.position = position;
        self.velocity = velocity;
        self.rotation = rotation;
        self.fuel = fuel;
        self.thrust_level = 0.;
        self.flight_state = FlightState::Flying;
    }

    /// Moves the spawn point and resets onto it.
    pub fn respawn_at(&mut self, position: V) {
        self.spawn.position = position;
        self.reset();
    }

    pub fn position(&self) -> V {
        self.position
    }

    pub fn velocity(&self) -> V {
        self.velocity
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn fuel(&self) -> f64 {
        self.fuel
    }

    pub fn max_fuel(&self) -> f64 {
        self.max_fuel
    }

    pub fn thrust_level(&self) -> f64 {
        self.thrust_level
    }

    pub fn thrust_active(&self) -> bool {
        self.thrust_level > 0. && self.fuel > 0.
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn fuel_consumption(&self) -> f64 {
        self.fuel_consumption
    }

    pub fn flight_state(&self) -> &FlightState {
        &self.flight_state
    }

    pub fn is_landed(&self) -> bool {
        matches!(self.flight_state, FlightState::Landed(Landing::Correct))
    }

    pub fn is_crashed(&self) -> bool {
        matches!(self.flight_state, FlightState::Landed(ref l) if !matches!(l, Landing::Correct))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.flight_state, FlightState::Flying)
    }

    /// Throttle in [0, 1]. An empty tank keeps the engine off, a touched down lander ignores it.
    pub fn set_thrust(&mut self, level: f64) {
        if self.is_terminal() {
            return;
        }
        self.thrust_level = if self.fuel <= 0. {
            0.
        } else {
            level.clamp(0., 1.)
        };
    }

    pub fn rotate_left(&mut self, degrees: f64) {
        if !self.is_terminal() {
            self.rotation.z = normalize_degrees(self.rotation.z + degrees);
        }
    }

    pub fn rotate_right(&mut self, degrees: f64) {
        if !self.is_terminal() {
            self.rotation.z = normalize_degrees(self.rotation.z - degrees);
        }
    }

    /// Angular distance from upright for the most tilted axis, in [0, 180].
    pub fn tilt(&self) -> f64 {
        [self.rotation.x, self.rotation.z]
            .into_iter()
            .map(|a| a.min(360. - a))
            .fold(0., f64::max)
    }

    /// Consumes propellant for `dt` seconds at the current throttle.
    pub(crate) fn burn_fuel(&mut self, dt: f64) {
        if !self.thrust_active() {
            return;
        }
        self.fuel = (self.fuel - self.fuel_consumption * self.thrust_level * dt).max(0.);
        if self.fuel <= 0. {
            self.fuel = 0.;
            self.thrust_level = 0.;
        }
    }

    pub(crate) fn velocity_mut(&mut self) -> &mut V {
        &mut self.velocity
    }

    pub(crate) fn position_mut(&mut self) -> &mut V {
        &mut self.position
    }

    pub(crate) fn touch_down(&mut self, landing: Landing) {
        self.velocity = V::default();
        self.thrust_level = 0.;
        self.flight_state = FlightState::Landed(landing);
    }
}

/// Wraps an angle in degrees into [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.);
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= 360. {
        0.
    } else {
        wrapped
    }
}
