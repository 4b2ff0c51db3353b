mod collision;
mod lander;
mod lander_runner;
mod physics;
mod terrain;
mod vector;

pub use collision::*;
pub use lander::*;
pub use lander_runner::*;
pub use physics::*;
pub use terrain::*;
pub use vector::*;
