use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn cross(self, w: Vec2) -> f64 {
        self.x * w.y - self.y * w.x
    }

    pub fn dot(self, w: Vec2) -> f64 {
        self.x * w.x + self.y * w.y
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn cross(self, w: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * w.z - self.z * w.y,
            y: self.z * w.x - self.x * w.z,
            z: self.x * w.y - self.y * w.x,
        }
    }

    pub fn dot(self, w: Vec3) -> f64 {
        self.x * w.x + self.y * w.y + self.z * w.z
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, zero vector stays zero.
    pub fn normalized(self) -> Vec3 {
        let length = self.length();
        if length > 0. {
            self * (1. / length)
        } else {
            self
        }
    }

    /// Projection onto the ground plane (x, z).
    pub fn xz(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

impl From<Vec2> for Vec3 {
    fn from(Vec2 { x, y }: Vec2) -> Self {
        Vec3 { x, y, z: 0. }
    }
}

macro_rules! impl_ops {
    ($t:ident, $($c:ident),+) => {
        impl Add for $t {
            type Output = $t;
            fn add(self, w: $t) -> $t {
                $t { $($c: self.$c + w.$c),+ }
            }
        }

        impl Sub for $t {
            type Output = $t;
            fn sub(self, w: $t) -> $t {
                $t { $($c: self.$c - w.$c),+ }
            }
        }

        impl Mul<f64> for $t {
            type Output = $t;
            fn mul(self, k: f64) -> $t {
                $t { $($c: self.$c * k),+ }
            }
        }

        impl Neg for $t {
            type Output = $t;
            fn neg(self) -> $t {
                $t { $($c: -self.$c),+ }
            }
        }

        impl AddAssign for $t {
            fn add_assign(&mut self, w: $t) {
                $(self.$c += w.$c;)+
            }
        }

        impl SubAssign for $t {
            fn sub_assign(&mut self, w: $t) {
                $(self.$c -= w.$c;)+
            }
        }
    };
}

impl_ops!(Vec2, x, y);
impl_ops!(Vec3, x, y, z);

/// Position/velocity arithmetic shared by the planar and the spatial simulation.
///
/// `y` is the vertical axis in both cases, growing upwards.
pub trait Vector:
    Copy
    + Debug
    + PartialEq
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + AddAssign
    + SubAssign
{
    fn y(&self) -> f64;

    fn set_y(&mut self, y: f64);

    /// Applies `f` to every component independently.
    fn map(self, f: impl Fn(f64) -> f64) -> Self;

    /// Speed magnitude along the ground plane.
    fn horizontal_speed(&self) -> f64;

    /// Unit direction the engine pushes along for the given attitude (degrees).
    fn thrust_axis(rotation: Vec3) -> Self;

    /// Mode-agnostic copy used by telemetry.
    fn to_vec3(self) -> Vec3;
}

impl Vector for Vec2 {
    fn y(&self) -> f64 {
        self.y
    }

    fn set_y(&mut self, y: f64) {
        self.y = y;
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Vec2::new(f(self.x), f(self.y))
    }

    fn horizontal_speed(&self) -> f64 {
        self.x.abs()
    }

    fn thrust_axis(_: Vec3) -> Self {
        // planar engine always pushes straight against gravity
        Vec2::new(0., 1.)
    }

    fn to_vec3(self) -> Vec3 {
        self.into()
    }
}

impl Vector for Vec3 {
    fn y(&self) -> f64 {
        self.y
    }

    fn set_y(&mut self, y: f64) {
        self.y = y;
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Vec3::new(f(self.x), f(self.y), f(self.z))
    }

    fn horizontal_speed(&self) -> f64 {
        self.x.hypot(self.z)
    }

    /// Independent sine/cosine terms per axis rather than a composed rotation.
    /// Exact for a single-axis tilt, inexact for compound attitudes.
    fn thrust_axis(rotation: Vec3) -> Self {
        let (rot_x, rot_z) = (rotation.x.to_radians(), rotation.z.to_radians());
        Vec3::new(-rot_z.sin(), rot_z.cos(), -rot_x.sin())
    }

    fn to_vec3(self) -> Vec3 {
        self
    }
}
