use serde::{Deserialize, Serialize};

/// A single floor's hall call buttons. Owned exclusively by the backend;
/// holds no other state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Floor {
    pub level: usize,
    pub up: bool,
    pub down: bool,
}

impl Floor {
    pub fn new(level: usize) -> Self {
        Floor {
            level,
            up: false,
            down: false,
        }
    }

    pub fn press_button(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.up = true,
            Direction::Down => self.down = true,
        }
    }

    pub fn clear_button(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.up = false,
            Direction::Down => self.down = false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}
