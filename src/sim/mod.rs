//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through the `dt` handed to `update`
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod breakout;
pub mod grid;
pub mod layout;
pub mod session;
pub mod snake;
pub mod state;
pub mod tanks;
pub mod timer;

pub use breakout::{Ball, Block, BreakoutGame, Paddle};
pub use grid::{Cell, CellType, Grid, GridError};
pub use session::{Game, Scoreboard, Session};
pub use snake::{Snake, SnakeGame};
pub use state::{
    Action, Direction, GameEvent, GameInput, GameKind, GameState, GameStats, Position,
};
pub use tanks::{Bullet, Owner, Tank, TanksGame};
pub use timer::StepTimer;
