use super::{LanderState, Vector};

pub(crate) mod defaults {
    pub const MAX_VERTICAL_SPEED: f64 = 40.;
    pub const MAX_HORIZONTAL_SPEED: f64 = 20.;
    pub const MAX_TILT: f64 = 15.;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Landing {
    Correct,
    WrongTerrain,
    NotVertical { error_abs: f64, error_rel: f64 },
    TooFastVertical { error_abs: f64, error_rel: f64 },
    TooFastHorizontal { error_abs: f64, error_rel: f64 },
}

/// Ground found beneath the lander at its current position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub height: f64,
    pub on_landing_pad: bool,
}

/// Anything the lander can touch down on.
pub trait Surface {
    type Vector: Vector;

    /// Ground under the lander, or `None` when it is outside the terrain.
    fn ground_beneath(&self, lander: &LanderState<Self::Vector>) -> Option<Contact>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollisionChecker {
    max_vertical_speed: f64,
    max_horizontal_speed: f64,
    max_tilt: f64,
}

impl Default for CollisionChecker {
    fn default() -> Self {
        Self {
            max_vertical_speed: defaults::MAX_VERTICAL_SPEED,
            max_horizontal_speed: defaults::MAX_HORIZONTAL_SPEED,
            max_tilt: defaults::MAX_TILT,
        }
    }
}

impl CollisionChecker {
    /// Contact height when the lower bound of the lander is at or below the ground.
    pub fn check<S: Surface>(&self, lander: &LanderState<S::Vector>, terrain: &S) -> Option<Contact> {
        let contact = terrain.ground_beneath(lander)?;
        let bottom = lander.position().y() - lander.dimensions().height / 2.;
        (bottom <= contact.height).then_some(contact)
    }

    /// Touchdown outcome. Every threshold is inclusive.
    pub fn classify<V: Vector>(&self, lander: &LanderState<V>, contact: &Contact) -> Landing {
        let velocity = lander.velocity();
        let tilt = lander.tilt();
        let (vertical_speed, horizontal_speed) = (velocity.y().abs(), velocity.horizontal_speed());

        if !contact.on_landing_pad {
            Landing::WrongTerrain
        } else if tilt > self.max_tilt {
            let error_abs = tilt - self.max_tilt;
            Landing::NotVertical {
                error_abs,
                error_rel: error_abs / self.max_tilt.max(f64::EPSILON),
            }
        } else if horizontal_speed > self.max_horizontal_speed {
            let error_abs = horizontal_speed - self.max_horizontal_speed;
            Landing::TooFastHorizontal {
                error_abs,
                error_rel: error_abs / self.max_horizontal_speed,
            }
        } else if vertical_speed > self.max_vertical_speed {
            let error_abs = vertical_speed - self.max_vertical_speed;
            Landing::TooFastVertical {
                error_abs,
                error_rel: error_abs / self.max_vertical_speed,
            }
        } else {
            Landing::Correct
        }
    }

    pub fn with_max_vertical_speed(self, max_vertical_speed: f64) -> Self {
        if !(max_vertical_speed > 0.) {
            return self;
        }
        Self {
            max_vertical_speed,
            ..self
        }
    }

    pub fn with_max_horizontal_speed(self, max_horizontal_speed: f64) -> Self {
        if !(max_horizontal_speed > 0.) {
            return self;
        }
        Self {
            max_horizontal_speed,
            ..self
        }
    }

    pub fn with_max_tilt(self, max_tilt: f64) -> Self {
        if !(max_tilt >= 0.) {
            return self;
        }
        Self { max_tilt, ..self }
    }

    pub fn max_vertical_speed(&self) -> f64 {
        self.max_vertical_speed
    }

    pub fn max_horizontal_speed(&self) -> f64 {
        self.max_horizontal_speed
    }

    pub fn max_tilt(&self) -> f64 {
        self.max_tilt
    }
}

#[cfg(test)]
mod collision_checker_tests {
    use super::*;
    use crate::simulation::{Terrain2D, TerrainSegment, Vec2, Vec3};

    fn terrain() -> Terrain2D {
        Terrain2D::from_segments(
            1000.,
            600.,
            vec![
                TerrainSegment::new(Vec2::new(0., 100.), Vec2::new(500., 100.), true),
                TerrainSegment::new(Vec2::new(500., 100.), Vec2::new(1000., 300.), false),
            ],
        )
    }

    fn checker() -> CollisionChecker {
        CollisionChecker::default()
            .with_max_vertical_speed(40.)
            .with_max_horizontal_speed(20.)
            .with_max_tilt(15.)
    }

    #[test]
    fn invalid_limits_are_ignored() {
        let checker = checker()
            .with_max_vertical_speed(0.)
            .with_max_horizontal_speed(f64::NAN)
            .with_max_tilt(-1.);
        assert_eq!(checker, CollisionChecker::default());
    }

    fn lander_at(x: f64, y: f64) -> LanderState<Vec2> {
        LanderState::new(Vec2::new(x, y))
    }

    fn landing(lander: &LanderState<Vec2>) -> Landing {
        let contact = checker().check(lander, &terrain()).unwrap();
        checker().classify(lander, &contact)
    }

    #[test]
    fn still_in_flight() {
        assert!(checker().check(&lander_at(250., 116.), &terrain()).is_none());
    }

    #[test]
    fn outside_terrain() {
        assert!(checker().check(&lander_at(-5., 0.), &terrain()).is_none());
        assert!(checker().check(&lander_at(1005., 0.), &terrain()).is_none());
    }

    #[test]
    fn touching_counts() {
        let contact = checker().check(&lander_at(250., 115.), &terrain()).unwrap();
        assert_eq!(contact.height, 100.);
        assert!(contact.on_landing_pad);
    }

    #[test]
    fn sloped_contact_height() {
        let contact = checker().check(&lander_at(750., 150.), &terrain()).unwrap();
        assert_eq!(contact.height, 200.);
        assert!(!contact.on_landing_pad);
    }

    #[test]
    fn wrong_terrain() {
        assert_eq!(landing(&lander_at(750., 150.)), Landing::WrongTerrain);
    }

    #[test]
    fn not_vertical() {
        for angle in [20., -20.] {
            let lander = lander_at(250., 100.).with_rotation(Vec3::new(0., 0., angle));
            assert!(matches!(
                landing(&lander),
                Landing::NotVertical { error_abs, .. } if (error_abs - 5.).abs() < 1e-9
            ));
        }
    }

    #[test]
    fn tilt_tolerance() {
        let lander = lander_at(250., 100.).with_rotation(Vec3::new(0., 0., 350.));
        assert_eq!(landing(&lander), Landing::Correct);
    }

    #[test]
    fn too_fast_vertical() {
        let lander = lander_at(250., 100.).with_velocity(Vec2::new(0., -45.));
        assert!(matches!(
            landing(&lander),
            Landing::TooFastVertical { error_abs, .. } if error_abs == 5.
        ));
    }

    #[test]
    fn too_fast_horizontal() {
        for vx in [30., -30.] {
            let lander = lander_at(250., 100.).with_velocity(Vec2::new(vx, -10.));
            assert!(matches!(
                landing(&lander),
                Landing::TooFastHorizontal { error_abs, .. } if error_abs == 10.
            ));
        }
    }

    #[test]
    fn vertical_threshold_is_inclusive() {
        let at_limit = lander_at(250., 100.).with_velocity(Vec2::new(0., -40.));
        assert_eq!(landing(&at_limit), Landing::Correct);

        let over_limit = lander_at(250., 100.).with_velocity(Vec2::new(0., -40. - 1e-9));
        assert!(matches!(landing(&over_limit), Landing::TooFastVertical { .. }));
    }

    #[test]
    fn correct() {
        let lander = lander_at(250., 100.).with_velocity(Vec2::new(-5., -10.));
        assert_eq!(landing(&lander), Landing::Correct);
    }
}
