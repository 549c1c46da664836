//! The closed set of games behind one `Game` implementation

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::{
    BreakoutGame, Game, GameEvent, GameInput, GameKind, GameStats, Grid, GridError, SnakeGame,
    TanksGame, layout,
};

/// Any one of the three engines
#[derive(Debug, Clone)]
pub enum AnyGame {
    Snake(SnakeGame),
    Tanks(TanksGame),
    Breakout(BreakoutGame),
}

impl AnyGame {
    /// Generate the standard board for `kind` and build its engine
    ///
    /// The board and the engine's own RNG both derive from `seed`.
    pub fn generate(kind: GameKind, speed_multiplier: f64, seed: u64) -> Result<Self, GridError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let game = match kind {
            GameKind::Snake => {
                let grid = layout::snake_grid(&mut rng)?;
                AnyGame::Snake(SnakeGame::with_seed(grid, speed_multiplier, rng.random()))
            }
            GameKind::Tanks => {
                let grid = layout::tanks_grid()?;
                AnyGame::Tanks(TanksGame::with_seed(grid, speed_multiplier, rng.random()))
            }
            GameKind::Breakout => {
                let (grid, blocks) = layout::breakout_grid(&mut rng)?;
                AnyGame::Breakout(BreakoutGame::new(grid, blocks, speed_multiplier))
            }
        };
        log::debug!("generated {} board with seed {}", kind.as_str(), seed);
        Ok(game)
    }

    pub fn from_settings(kind: GameKind, settings: &Settings) -> Result<Self, GridError> {
        Self::generate(kind, settings.speed_multiplier(), settings.seed_or_random())
    }

    pub fn report(&self) -> ScoreReport {
        ScoreReport::from_game(self)
    }
}

impl From<SnakeGame> for AnyGame {
    fn from(game: SnakeGame) -> Self {
        AnyGame::Snake(game)
    }
}

impl From<TanksGame> for AnyGame {
    fn from(game: TanksGame) -> Self {
        AnyGame::Tanks(game)
    }
}

impl From<BreakoutGame> for AnyGame {
    fn from(game: BreakoutGame) -> Self {
        AnyGame::Breakout(game)
    }
}

impl Game for AnyGame {
    fn kind(&self) -> GameKind {
        match self {
            AnyGame::Snake(g) => g.kind(),
            AnyGame::Tanks(g) => g.kind(),
            AnyGame::Breakout(g) => g.kind(),
        }
    }

    fn update(&mut self, dt: f64, events: &mut Vec<GameEvent>) {
        match self {
            AnyGame::Snake(g) => g.update(dt, events),
            AnyGame::Tanks(g) => g.update(dt, events),
            AnyGame::Breakout(g) => g.update(dt, events),
        }
    }

    fn reset(&mut self, events: &mut Vec<GameEvent>) {
        match self {
            AnyGame::Snake(g) => g.reset(events),
            AnyGame::Tanks(g) => g.reset(events),
            AnyGame::Breakout(g) => g.reset(events),
        }
    }

    fn handle_input(&mut self, input: GameInput) {
        match self {
            AnyGame::Snake(g) => g.handle_input(input),
            AnyGame::Tanks(g) => g.handle_input(input),
            AnyGame::Breakout(g) => g.handle_input(input),
        }
    }

    fn score(&self) -> u64 {
        match self {
            AnyGame::Snake(g) => g.score(),
            AnyGame::Tanks(g) => g.score(),
            AnyGame::Breakout(g) => g.score(),
        }
    }

    fn grid(&self) -> &Grid {
        match self {
            AnyGame::Snake(g) => g.grid(),
            AnyGame::Tanks(g) => g.grid(),
            AnyGame::Breakout(g) => g.grid(),
        }
    }

    fn stats(&self) -> GameStats {
        match self {
            AnyGame::Snake(g) => g.stats(),
            AnyGame::Tanks(g) => g.stats(),
            AnyGame::Breakout(g) => g.stats(),
        }
    }
}

/// Final result handed to persistence and sharing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub game: GameKind,
    pub score: u64,
    pub stats: GameStats,
}

impl ScoreReport {
    pub fn from_game<G: Game + ?Sized>(game: &G) -> Self {
        Self {
            game: game.kind(),
            score: game.score(),
            stats: game.stats(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
