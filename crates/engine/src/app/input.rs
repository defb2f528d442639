use crate::world::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Quit,
}

/// A discrete player request, consumed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Quit,
    Move { dx: i32, dy: i32 },
}

impl InputAction {
    pub const fn intent(self) -> Intent {
        match self {
            InputAction::MoveUp => Intent::Move { dx: 0, dy: -1 },
            InputAction::MoveDown => Intent::Move { dx: 0, dy: 1 },
            InputAction::MoveLeft => Intent::Move { dx: -1, dy: 0 },
            InputAction::MoveRight => Intent::Move { dx: 1, dy: 0 },
            InputAction::Quit => Intent::Quit,
        }
    }
}

impl Intent {
    pub fn delta(self) -> Option<Position> {
        match self {
            Intent::Move { dx, dy } => Some(Position::new(dx, dy)),
            Intent::Quit => None,
        }
    }
}
