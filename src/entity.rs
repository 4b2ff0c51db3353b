use crate::simulation::{Dimensions, FlightState, Telemetry, TerrainSegment, TerrainTriangle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Monotonic id source owned by one session.
#[derive(Debug, Default)]
pub struct EntityIds {
    next: u32,
}

impl EntityIds {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Read-only view of a simulated entity, for drawing.
#[derive(Debug, Clone)]
pub enum Entity<'a> {
    Lander {
        telemetry: Telemetry,
        dimensions: Dimensions,
        flight_state: &'a FlightState,
    },
    Terrain(TerrainView<'a>),
}

#[derive(Debug, Clone, Copy)]
pub enum TerrainView<'a> {
    Segments(&'a [TerrainSegment]),
    Triangles(&'a [TerrainTriangle]),
}

#[cfg(test)]
mod entity_tests {
    use super::*;

    #[test]
    fn ids_are_per_session() {
        let (mut a, mut b) = (EntityIds::default(), EntityIds::default());
        assert_eq!(a.allocate().value(), 0);
        assert_eq!(a.allocate().value(), 1);
        assert_eq!(b.allocate().value(), 0);
    }
}
