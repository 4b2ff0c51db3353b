mod app;
mod entity;
mod error;
pub mod init;
mod simulation;

pub use app::*;
pub use entity::*;
pub use error::*;
pub use simulation::*;
