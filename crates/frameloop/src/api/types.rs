use glam::Vec2;

/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the four frame edges. Doubles as the unit vector pointing out of
/// the frame through that edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    /// All edges in sensor poll order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Right,
        Direction::Left,
    ];

    /// Unit vector pointing out of the frame (Y-up).
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::Y,
            Direction::Down => Vec2::NEG_Y,
            Direction::Right => Vec2::X,
            Direction::Left => Vec2::NEG_X,
        }
    }

    /// The opposite edge.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_are_axis_aligned() {
        assert_eq!(Direction::Up.unit(), Vec2::new(0.0, 1.0));
        assert_eq!(Direction::Left.unit(), Vec2::new(-1.0, 0.0));
        for dir in Direction::ALL {
            assert_eq!(dir.unit() + dir.opposite().unit(), Vec2::ZERO);
        }
    }
}
