//! Breakout: paddle, one continuous ball and multi-hit blocks
//!
//! The ball keeps a continuous position alongside its rounded cell. It moves in
//! unit steps paid for by an accumulator; after every step the paddle, then the
//! blocks, are checked for contact.

use glam::Vec2;
use log::{debug, trace};
use serde::Serialize;

use super::grid::{CellType, Grid};
use super::session::{Game, Scoreboard};
use super::state::{Action, Direction, GameEvent, GameInput, GameKind, GameStats, Position};
use super::timer::StepTimer;

pub const PADDLE_WIDTH: i32 = 5;
/// ms per paddle cell
pub const PADDLE_MOVE_SPEED: f64 = 80.0;
/// ms per unit ball step
pub const BALL_SPEED: f64 = 100.0;
/// Launch heading (up and to the right)
pub const BALL_INITIAL_ANGLE: f32 = -std::f32::consts::FRAC_PI_4;
/// Steepest paddle deflection from vertical
pub const MAX_BOUNCE_ANGLE: f32 = std::f32::consts::FRAC_PI_3;
/// Half-size of the ball for sub-cell block overlap
pub const BALL_HALF_EXTENT: f32 = 0.2;
pub const INITIAL_LIVES: u32 = 3;

/// Points for destroying a block, by its starting level
pub fn score_for_level(level: u8) -> u64 {
    match level {
        1 => 10,
        2 => 20,
        3 => 40,
        4 => 80,
        _ => 10,
    }
}

/// Paddle row for a board of the given height
pub fn paddle_row(height: i32) -> i32 {
    height - 2
}

/// Horizontal paddle on a fixed row
#[derive(Debug, Clone, Serialize)]
pub struct Paddle {
    x: i32,
    y: i32,
    width: i32,
    board_width: i32,
    timer: StepTimer,
    move_direction: Option<Direction>,
}

impl Paddle {
    pub fn new(board_width: i32, board_height: i32) -> Self {
        Self {
            x: Self::centered_x(board_width, PADDLE_WIDTH),
            y: paddle_row(board_height),
            width: PADDLE_WIDTH,
            board_width,
            timer: StepTimer::new(PADDLE_MOVE_SPEED),
            move_direction: None,
        }
    }

    fn centered_x(board_width: i32, width: i32) -> i32 {
        (board_width - width) / 2
    }

    /// Leftmost occupied column
    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn set_move_direction(&mut self, direction: Option<Direction>) {
        self.move_direction = direction;
    }

    /// Move one cell per elapsed interval, kept off the side walls
    pub fn update(&mut self, dt: f64) {
        let Some(direction) = self.move_direction else {
            return;
        };
        let min_x = 1;
        let max_x = (self.board_width - self.width - 1).max(min_x);
        for _ in 0..self.timer.drain(dt) {
            self.x = match direction {
                Direction::Left => (self.x - 1).max(min_x),
                Direction::Right => (self.x + 1).min(max_x),
                _ => self.x,
            };
        }
    }

    pub fn contains_x(&self, x: i32) -> bool {
        x >= self.x && x < self.x + self.width
    }

    /// Hit offset from the paddle centre, -1 at the left edge
    pub fn relative_hit(&self, x: i32) -> f32 {
        let half = self.width as f32 / 2.0;
        let center = self.x as f32 + half;
        (x as f32 - center) / half
    }

    /// Column the unlaunched ball sits above
    pub fn center_column(&self) -> i32 {
        self.x + self.width / 2
    }

    pub fn reset(&mut self) {
        self.x = Self::centered_x(self.board_width, self.width);
        self.timer.reset();
        self.move_direction = None;
    }
}

/// Result of one ball step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallStep {
    Alive,
    /// Crossed the bottom edge
    Lost,
}

/// The ball: continuous position, unit velocity
#[derive(Debug, Clone, Serialize)]
pub struct Ball {
    pos: Vec2,
    vel: Vec2,
    launched: bool,
    timer: StepTimer,
}

impl Ball {
    pub fn new(x: i32, y: i32, speed_multiplier: f64) -> Self {
        Self {
            pos: Vec2::new(x as f32, y as f32),
            vel: Vec2::from_angle(BALL_INITIAL_ANGLE),
            launched: false,
            timer: StepTimer::new(BALL_SPEED * speed_multiplier),
        }
    }

    /// Rounded cell position
    pub fn position(&self) -> Position {
        Position::new(self.pos.x.round() as i32, self.pos.y.round() as i32)
    }

    /// Continuous position
    pub fn raw_position(&self) -> Vec2 {
        self.pos
    }

    pub fn velocity(&self) -> Vec2 {
        self.vel
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    pub fn launch(&mut self) {
        self.launched = true;
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.pos = Vec2::new(x, y);
    }

    /// Number of unit steps paid for by `dt`
    fn steps_for(&mut self, dt: f64) -> u32 {
        self.timer.drain(dt)
    }

    /// Advance one unit, reflecting off the side and top walls
    pub fn step(&mut self, board_width: i32, board_height: i32) -> BallStep {
        self.pos += self.vel;

        let right = (board_width - 1) as f32;
        if self.pos.x <= 0.0 {
            self.pos.x = 1.0;
            self.vel.x = self.vel.x.abs();
        } else if self.pos.x >= right {
            self.pos.x = right - 1.0;
            self.vel.x = -self.vel.x.abs();
        }

        if self.pos.y <= 0.0 {
            self.pos.y = 1.0;
            self.vel.y = self.vel.y.abs();
        }

        if self.pos.y >= board_height as f32 {
            return BallStep::Lost;
        }
        BallStep::Alive
    }

    pub fn bounce_vertical(&mut self) {
        self.vel.y = -self.vel.y;
    }

    pub fn bounce_horizontal(&mut self) {
        self.vel.x = -self.vel.x;
    }

    /// Upward bounce whose angle scales with the hit offset
    pub fn bounce_from_paddle(&mut self, relative_hit: f32) {
        let angle = relative_hit.clamp(-1.0, 1.0) * MAX_BOUNCE_ANGLE;
        self.vel = Vec2::new(angle.sin(), -angle.cos().abs()).normalize();
    }
}

/// A destructible block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    position: Position,
    hits_remaining: u8,
    max_hits: u8,
}

impl Block {
    pub fn new(position: Position, level: u8) -> Self {
        let level = level.max(1);
        Self {
            position,
            hits_remaining: level,
            max_hits: level,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Hits left before destruction
    pub fn level(&self) -> u8 {
        self.hits_remaining
    }

    /// Starting level
    pub fn max_level(&self) -> u8 {
        self.max_hits
    }

    pub fn is_destroyed(&self) -> bool {
        self.hits_remaining == 0
    }

    /// Take one hit; returns the award when this hit destroys the block
    pub fn hit(&mut self) -> Option<u64> {
        if self.is_destroyed() {
            return None;
        }
        self.hits_remaining -= 1;
        self.is_destroyed()
            .then(|| score_for_level(self.max_hits))
    }

    /// Continuous point overlaps the block cell, ball extent included
    pub fn overlaps(&self, point: Vec2) -> bool {
        let reach = 0.5 + BALL_HALF_EXTENT;
        (point.x - self.position.x as f32).abs() < reach
            && (point.y - self.position.y as f32).abs() < reach
    }

    /// Whether travelling along `heading` from `point` closes on the block center
    pub fn is_ahead_of(&self, point: Vec2, heading: Vec2) -> bool {
        let center = Vec2::new(self.position.x as f32, self.position.y as f32);
        (center - point).dot(heading) > 0.0
    }
}

/// How a block contact was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    /// Rounded ball cell equals the block cell
    Cell,
    /// Continuous position overlaps without a cell match
    Overlap,
}

/// Breakout engine
#[derive(Debug, Clone)]
pub struct BreakoutGame {
    grid: Grid,
    paddle: Paddle,
    ball: Ball,
    blocks: Vec<Block>,
    lives: u32,
    move_direction: Option<Direction>,
    speed_multiplier: f64,
    score: Scoreboard,
    blocks_destroyed: u32,
}

impl BreakoutGame {
    pub fn new(grid: Grid, blocks: Vec<Block>, speed_multiplier: f64) -> Self {
        let paddle = Paddle::new(grid.width(), grid.height());
        let ball = Self::serve_ball(&grid, speed_multiplier);
        Self {
            grid,
            paddle,
            ball,
            blocks,
            lives: INITIAL_LIVES,
            move_direction: None,
            speed_multiplier,
            score: Scoreboard::default(),
            blocks_destroyed: 0,
        }
    }

    fn serve_ball(grid: &Grid, speed_multiplier: f64) -> Ball {
        Ball::new(
            grid.width() / 2,
            paddle_row(grid.height()) - 1,
            speed_multiplier,
        )
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    fn check_paddle(&mut self) {
        let cell = self.ball.position();
        let row = self.paddle.y();
        if (cell.y == row - 1 || cell.y == row) && self.paddle.contains_x(cell.x) {
            let rel = self.paddle.relative_hit(cell.x);
            trace!("paddle hit at offset {:.2}", rel);
            self.ball.bounce_from_paddle(rel);
        }
    }

    /// Resolve at most one block contact
    ///
    /// A rounded-cell match anywhere wins over a continuous overlap.
    fn check_blocks(&mut self, events: &mut Vec<GameEvent>) {
        let cell = self.ball.position();
        let raw = self.ball.raw_position();

        let heading = self.ball.velocity();
        let found = self
            .blocks
            .iter()
            .position(|b| !b.is_destroyed() && b.position() == cell)
            .map(|i| (i, Contact::Cell))
            .or_else(|| {
                // An edge overlap only counts while the ball is still moving into the block
                self.blocks
                    .iter()
                    .position(|b| {
                        !b.is_destroyed() && b.overlaps(raw) && b.is_ahead_of(raw, heading)
                    })
                    .map(|i| (i, Contact::Overlap))
            });
        let Some((index, contact)) = found else {
            return;
        };

        let block = &mut self.blocks[index];
        let pos = block.position();
        match block.hit() {
            Some(points) => {
                debug!("block ({}, {}) destroyed for {}", pos.x, pos.y, points);
                self.blocks_destroyed += 1;
                self.score.add(points, events);
                self.grid.set_cell(pos, CellType::Playable, 0);
            }
            None => {
                self.grid.set_level(pos, block.level());
            }
        }

        match contact {
            Contact::Cell => self.ball.bounce_vertical(),
            Contact::Overlap => {
                let dx = (raw.x - pos.x as f32).abs();
                let dy = (raw.y - pos.y as f32).abs();
                if dx > dy {
                    self.ball.bounce_horizontal();
                } else {
                    self.ball.bounce_vertical();
                }
            }
        }
    }

    fn all_blocks_destroyed(&self) -> bool {
        self.blocks.iter().all(Block::is_destroyed)
    }

    fn lose_life(&mut self, events: &mut Vec<GameEvent>) {
        self.lives = self.lives.saturating_sub(1);
        debug!("ball lost, {} lives left", self.lives);
        events.push(GameEvent::LifeLost {
            remaining: self.lives,
        });
        if self.lives == 0 {
            events.push(GameEvent::GameOver);
            return;
        }
        self.paddle.reset();
        self.ball = Self::serve_ball(&self.grid, self.speed_multiplier);
    }
}

impl Game for BreakoutGame {
    fn kind(&self) -> GameKind {
        GameKind::Breakout
    }

    fn update(&mut self, dt: f64, events: &mut Vec<GameEvent>) {
        self.paddle.set_move_direction(self.move_direction);
        self.paddle.update(dt);

        if !self.ball.is_launched() {
            let x = self.paddle.center_column();
            let y = self.paddle.y() - 1;
            self.ball.set_position(x as f32, y as f32);
            return;
        }

        let (width, height) = (self.grid.width(), self.grid.height());
        for _ in 0..self.ball.steps_for(dt) {
            if self.ball.step(width, height) == BallStep::Lost {
                self.lose_life(events);
                return;
            }
            self.check_paddle();
            self.check_blocks(events);
            if self.all_blocks_destroyed() {
                events.push(GameEvent::GameOver);
                return;
            }
        }
    }

    fn reset(&mut self, events: &mut Vec<GameEvent>) {
        self.paddle.reset();
        self.ball = Self::serve_ball(&self.grid, self.speed_multiplier);
        self.lives = INITIAL_LIVES;
        self.blocks_destroyed = 0;
        self.score.set(0, events);

        for block in &mut self.blocks {
            let pos = block.position();
            self.grid
                .set_cell(pos, CellType::Obstacle, block.max_level());
            *block = Block::new(pos, block.max_level());
        }
    }

    fn handle_input(&mut self, input: GameInput) {
        match input {
            GameInput::Direction { direction } if direction.is_horizontal() => {
                self.move_direction = Some(direction);
            }
            GameInput::Action {
                action: Action::Launch,
            } => {
                if !self.ball.is_launched() {
                    self.ball.launch();
                }
            }
            GameInput::Release => self.move_direction = None,
            _ => {}
        }
    }

    fn score(&self) -> u64 {
        self.score.get()
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn stats(&self) -> GameStats {
        GameStats::Breakout {
            blocks_destroyed: self.blocks_destroyed,
            lives_remaining: self.lives,
        }
    }
}
