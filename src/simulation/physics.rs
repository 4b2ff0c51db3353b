use super::{LanderState, Vector};

pub(crate) mod defaults {
    /// Lunar surface gravity.
    pub const G: f64 = 1.62;
    /// Scales gravity units to world units per second squared.
    pub const UNIT_SCALE: f64 = 10.31;
    pub const THRUST_COEFFICIENT: f64 = 2.5;
    pub const DRAG_COEFFICIENT: f64 = 0.5;
    /// Vacuum.
    pub const DENSITY: f64 = 0.;
}

/// Force model: gravity, engine thrust and quadratic drag acting on velocity.
///
/// Each phase is a no-op for a lander that has touched down.
#[derive(Clone, Debug, PartialEq)]
pub struct Physics {
    g: f64,
    unit_scale: f64,
    thrust_coefficient: f64,
    drag_coefficient: f64,
    density: f64,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            g: defaults::G,
            unit_scale: defaults::UNIT_SCALE,
            thrust_coefficient: defaults::THRUST_COEFFICIENT,
            drag_coefficient: defaults::DRAG_COEFFICIENT,
            density: defaults::DENSITY,
        }
    }
}

impl Physics {
    pub fn with_g(self, g: f64) -> Self {
        Self { g, ..self }
    }
    pub fn with_unit_scale(self, unit_scale: f64) -> Self {
        Self { unit_scale, ..self }
    }
    pub fn with_thrust_coefficient(self, thrust_coefficient: f64) -> Self {
        Self {
            thrust_coefficient,
            ..self
        }
    }
    pub fn with_drag_coefficient(self, drag_coefficient: f64) -> Self {
        Self {
            drag_coefficient,
            ..self
        }
    }
    pub fn with_density(self, density: f64) -> Self {
        let density = density.max(0.);
        Self { density, ..self }
    }

    pub fn g(&self) -> f64 {
        self.g
    }

    pub fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    pub fn thrust_coefficient(&self) -> f64 {
        self.thrust_coefficient
    }

    pub fn drag_coefficient(&self) -> f64 {
        self.drag_coefficient
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    /// Gravity, thrust, drag. The order matters under a finite `dt`.
    pub fn apply_forces<V: Vector>(&self, lander: &mut LanderState<V>, dt: f64) {
        self.apply_gravity(lander, dt);
        self.apply_thrust(lander, dt);
        self.apply_drag(lander, dt);
    }

    pub fn apply_gravity<V: Vector>(&self, lander: &mut LanderState<V>, dt: f64) {
        if lander.is_terminal() {
            return;
        }
        let velocity = lander.velocity_mut();
        velocity.set_y(velocity.y() - self.g * dt * self.unit_scale);
    }

    /// Pushes along the attitude-derived axis and burns the matching propellant.
    pub fn apply_thrust<V: Vector>(&self, lander: &mut LanderState<V>, dt: f64) {
        if lander.is_terminal() || !lander.thrust_active() {
            return;
        }
        let force = self.thrust_coefficient * self.g * lander.thrust_level();
        let axis = V::thrust_axis(lander.rotation());
        *lander.velocity_mut() += axis * (force * dt);
        lander.burn_fuel(dt);
    }

    pub fn apply_drag<V: Vector>(&self, lander: &mut LanderState<V>, dt: f64) {
        if lander.is_terminal() || self.density <= 0. {
            return;
        }
        let dimensions = lander.dimensions();
        let area = dimensions.width * dimensions.height;
        let k = 0.5 * self.density * self.drag_coefficient * area * dt / lander.mass();
        let velocity = lander.velocity_mut();
        *velocity = velocity.map(|v| v - k * v * v.abs());
    }
}
