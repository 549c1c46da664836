//! Shared game-state vocabulary
//!
//! Positions, directions, lifecycle state, inputs and the events engines emit.

use serde::{Deserialize, Serialize};

/// Integer cell coordinate
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbouring cell one unit step away (no wrapping, may leave the grid)
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// True when both axes differ by less than `radius`
    pub fn within(self, other: Position, radius: i32) -> bool {
        (self.x - other.x).abs() < radius && (self.y - other.y).abs() < radius
    }
}

/// Cardinal heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit offset, y grows downward
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    /// Constructed, never started
    #[default]
    Ready,
    /// Stepping every frame
    Playing,
    /// Frozen until resumed
    Paused,
    /// Run ended, `start` replays
    GameOver,
}

/// Which of the three games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Snake,
    Tanks,
    Breakout,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Snake, GameKind::Tanks, GameKind::Breakout];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Snake => "snake",
            GameKind::Tanks => "tanks",
            GameKind::Breakout => "breakout",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "snake" => Some(GameKind::Snake),
            "tanks" => Some(GameKind::Tanks),
            "breakout" => Some(GameKind::Breakout),
            _ => None,
        }
    }
}

/// One-shot actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Release the breakout ball from the paddle
    Launch,
    /// Fire a tank shell
    Shoot,
}

impl Action {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "launch" => Some(Action::Launch),
            "shoot" => Some(Action::Shoot),
            _ => None,
        }
    }
}

/// Input event fed to the active engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameInput {
    /// Steer
    Direction { direction: Direction },
    /// Launch or shoot
    Action { action: Action },
    /// Stop continuous movement (paddle, tank)
    Release,
}

impl GameInput {
    pub fn direction(direction: Direction) -> Self {
        GameInput::Direction { direction }
    }

    pub fn action(action: Action) -> Self {
        GameInput::Action { action }
    }
}

/// Notification emitted by an engine during `update`/`reset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// Score changed to the given total
    ScoreChanged(u64),
    /// Snake step interval changed (ms per cell)
    SpeedChanged(f64),
    /// Breakout ball lost, lives left afterwards
    LifeLost { remaining: u32 },
    /// The engine reached a terminal condition
    GameOver,
}

/// End-of-run statistics per game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStats {
    Snake {
        food_eaten: u32,
        length: usize,
        speed_ms: f64,
    },
    Tanks {
        enemies_destroyed: u32,
        shots_fired: u32,
        hits: u32,
        /// Hits per shot fired, 0 when nothing was fired
        accuracy: f64,
    },
    Breakout {
        blocks_destroyed: u32,
        lives_remaining: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposites() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dx, dy) = dir.delta();
            let (ox, oy) = dir.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn test_input_from_json() {
        let input: GameInput =
            serde_json::from_str(r#"{"type":"direction","direction":"UP"}"#).unwrap();
        assert_eq!(input, GameInput::direction(Direction::Up));

        let input: GameInput =
            serde_json::from_str(r#"{"type":"action","action":"launch"}"#).unwrap();
        assert_eq!(input, GameInput::action(Action::Launch));

        let input: GameInput = serde_json::from_str(r#"{"type":"release"}"#).unwrap();
        assert_eq!(input, GameInput::Release);

        assert!(serde_json::from_str::<GameInput>(r#"{"type":"jump"}"#).is_err());
    }

    #[test]
    fn test_kind_tags() {
        for kind in GameKind::ALL {
            assert_eq!(GameKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(GameKind::from_str("pong"), None);
        assert_eq!(Action::from_str("SHOOT"), Some(Action::Shoot));
        assert_eq!(Direction::from_str("Left"), Some(Direction::Left));
    }

    #[test]
    fn test_within_radius() {
        let a = Position::new(5, 5);
        assert!(a.within(Position::new(6, 4), 2));
        assert!(!a.within(Position::new(7, 5), 2));
    }
}
