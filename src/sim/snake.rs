//! Snake: a self-growing body on a wrap-around board
//!
//! The snake steps one cell per speed interval, wraps toroidally on both axes,
//! eats food scattered over PLAYABLE cells and dies only by biting itself.

use std::collections::{BTreeSet, VecDeque};

use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::grid::Grid;
use super::session::{Game, Scoreboard};
use super::state::{Direction, GameEvent, GameInput, GameKind, GameStats, Position};
use super::timer::StepTimer;
use crate::wrap_coordinate;

/// Initial step interval (ms per cell)
pub const INITIAL_SPEED: f64 = 100.0;
/// Fastest allowed step interval
pub const MIN_SPEED: f64 = 40.0;
/// Interval reduction per food eaten
pub const SPEED_INCREMENT: f64 = 3.0;
pub const SCORE_PER_FOOD: u64 = 10;
pub const INITIAL_FOOD_COUNT: usize = 5;
pub const MAX_FOOD_ON_BOARD: usize = 8;
pub const INITIAL_SNAKE_LENGTH: usize = 3;
/// Turns buffered beyond the immediate pending one
pub const MAX_DIRECTION_QUEUE: usize = 2;

/// Fixed-capacity FIFO of buffered turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirectionQueue {
    slots: [Direction; MAX_DIRECTION_QUEUE],
    head: usize,
    len: usize,
}

impl DirectionQueue {
    fn new() -> Self {
        Self {
            slots: [Direction::Right; MAX_DIRECTION_QUEUE],
            head: 0,
            len: 0,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn is_full(&self) -> bool {
        self.len == MAX_DIRECTION_QUEUE
    }

    fn back(&self) -> Option<Direction> {
        if self.is_empty() {
            return None;
        }
        Some(self.slots[(self.head + self.len - 1) % MAX_DIRECTION_QUEUE])
    }

    fn push(&mut self, dir: Direction) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[(self.head + self.len) % MAX_DIRECTION_QUEUE] = dir;
        self.len += 1;
        true
    }

    fn pop(&mut self) -> Option<Direction> {
        if self.is_empty() {
            return None;
        }
        let dir = self.slots[self.head];
        self.head = (self.head + 1) % MAX_DIRECTION_QUEUE;
        self.len -= 1;
        Some(dir)
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

/// The snake body and its steering state
#[derive(Debug, Clone)]
pub struct Snake {
    /// Head first
    body: VecDeque<Position>,
    direction: Direction,
    /// Applied on the next step
    next_direction: Direction,
    queue: DirectionQueue,
    growing: bool,
    width: i32,
    height: i32,
}

impl Snake {
    pub fn new(width: i32, height: i32) -> Self {
        let mut snake = Self {
            body: VecDeque::with_capacity(INITIAL_SNAKE_LENGTH),
            direction: Direction::Right,
            next_direction: Direction::Right,
            queue: DirectionQueue::new(),
            growing: false,
            width,
            height,
        };
        snake.reset();
        snake
    }

    /// Horizontal body at (w/4, h/2) heading right, tail wrapped onto the board
    ///
    /// Boards narrower than the starting length get a shorter snake so no two
    /// segments share a cell.
    fn initial_body(&self) -> VecDeque<Position> {
        let start_x = self.width / 4;
        let start_y = self.height / 2;
        let length = INITIAL_SNAKE_LENGTH.min(self.width.max(1) as usize);
        (0..length as i32)
            .map(|i| Position::new((start_x - i).rem_euclid(self.width), start_y))
            .collect()
    }

    pub fn reset(&mut self) {
        self.body = self.initial_body();
        self.direction = Direction::Right;
        self.next_direction = Direction::Right;
        self.queue.clear();
        self.growing = false;
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn body(&self) -> impl ExactSizeIterator<Item = &Position> {
        self.body.iter()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Direction of the last step
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Direction the next step will take
    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    /// Number of buffered turns beyond the pending one
    pub fn queued_turns(&self) -> usize {
        self.queue.len()
    }

    /// Request a turn
    ///
    /// Rejected when it repeats or reverses whichever direction is about to
    /// apply (the newest buffered turn, or the pending one if nothing is
    /// buffered). The first turn of a step replaces the pending direction; later turns in
    /// the same step are buffered, and dropped once the buffer is full.
    pub fn set_direction(&mut self, dir: Direction) {
        let about_to_apply = self.queue.back().unwrap_or(self.next_direction);
        if dir == about_to_apply || dir == about_to_apply.opposite() {
            return;
        }

        if self.queue.is_empty() && self.next_direction == self.direction {
            self.next_direction = dir;
        } else if !self.queue.push(dir) {
            trace!("turn {} dropped, buffer full", dir.as_str());
        }
    }

    /// Advance one cell in the pending direction
    pub fn step(&mut self) {
        self.direction = self.next_direction;
        if let Some(dir) = self.queue.pop() {
            self.next_direction = dir;
        }

        let head = self.head().step(self.direction);
        let head = Position::new(
            wrap_coordinate(head.x, self.width),
            wrap_coordinate(head.y, self.height),
        );
        self.body.push_front(head);

        if self.growing {
            self.growing = false;
        } else {
            self.body.pop_back();
        }
    }

    /// Lengthen by one on the next step
    pub fn grow(&mut self) {
        self.growing = true;
    }

    /// True when the head overlaps any other segment
    pub fn bites_itself(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|&segment| segment == head)
    }
}

/// Snake engine
#[derive(Debug, Clone)]
pub struct SnakeGame {
    grid: Grid,
    snake: Snake,
    /// PLAYABLE cells, fixed for the session
    available: Vec<Position>,
    food: BTreeSet<Position>,
    timer: StepTimer,
    speed_multiplier: f64,
    score: Scoreboard,
    food_eaten: u32,
    rng: Pcg32,
}

impl SnakeGame {
    pub fn new(grid: Grid, speed_multiplier: f64) -> Self {
        Self::with_seed(grid, speed_multiplier, rand::random())
    }

    pub fn with_seed(grid: Grid, speed_multiplier: f64, seed: u64) -> Self {
        let snake = Snake::new(grid.width(), grid.height());
        let available = grid.playable_positions();
        let mut game = Self {
            grid,
            snake,
            available,
            food: BTreeSet::new(),
            timer: StepTimer::new(INITIAL_SPEED * speed_multiplier),
            speed_multiplier,
            score: Scoreboard::default(),
            food_eaten: 0,
            rng: Pcg32::seed_from_u64(seed),
        };
        game.spawn_initial_food();
        game
    }

    fn spawn_initial_food(&mut self) {
        for _ in 0..INITIAL_FOOD_COUNT {
            self.spawn_food();
        }
    }

    /// Place one food on a random free PLAYABLE cell; no-op when none is free
    fn spawn_food(&mut self) {
        let candidates: Vec<Position> = self
            .available
            .iter()
            .copied()
            .filter(|&p| !self.snake.contains(p) && !self.food.contains(&p))
            .collect();
        if candidates.is_empty() {
            return;
        }
        let pick = candidates[self.rng.random_range(0..candidates.len())];
        trace!("food at ({}, {})", pick.x, pick.y);
        self.food.insert(pick);
    }

    fn eat_if_on_food(&mut self, events: &mut Vec<GameEvent>) {
        let head = self.snake.head();
        if !self.food.remove(&head) {
            return;
        }
        self.snake.grow();
        self.food_eaten += 1;
        self.score.add(SCORE_PER_FOOD, events);

        let speed = (self.timer.period() - SPEED_INCREMENT).max(MIN_SPEED);
        self.timer.set_period(speed);
        events.push(GameEvent::SpeedChanged(speed));

        if self.food.len() < MAX_FOOD_ON_BOARD {
            self.spawn_food();
        }
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> &BTreeSet<Position> {
        &self.food
    }

    /// Current step interval (ms per cell)
    pub fn speed(&self) -> f64 {
        self.timer.period()
    }
}

impl Game for SnakeGame {
    fn kind(&self) -> GameKind {
        GameKind::Snake
    }

    fn update(&mut self, dt: f64, events: &mut Vec<GameEvent>) {
        if !self.timer.tick(dt) {
            return;
        }

        self.snake.step();
        if self.snake.bites_itself() {
            debug!("snake bit itself at length {}", self.snake.len());
            events.push(GameEvent::GameOver);
            return;
        }
        self.eat_if_on_food(events);
    }

    fn reset(&mut self, events: &mut Vec<GameEvent>) {
        self.snake.reset();
        self.food.clear();
        self.spawn_initial_food();
        self.score.set(0, events);
        self.food_eaten = 0;

        let speed = INITIAL_SPEED * self.speed_multiplier;
        self.timer = StepTimer::new(speed);
        events.push(GameEvent::SpeedChanged(speed));
    }

    fn handle_input(&mut self, input: GameInput) {
        if let GameInput::Direction { direction } = input {
            self.snake.set_direction(direction);
        }
    }

    fn score(&self) -> u64 {
        self.score.get()
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn stats(&self) -> GameStats {
        GameStats::Snake {
            food_eaten: self.food_eaten,
            length: self.snake.len(),
            speed_ms: self.speed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::sim::grid::CellType;

    fn open_grid(width: i32, height: i32) -> Grid {
        Grid::filled(width, height, CellType::Playable, 1).unwrap()
    }

    fn body_of(snake: &Snake) -> Vec<Position> {
        snake.body().copied().collect()
    }

    #[test]
    fn test_initial_body_wraps_onto_board() {
        let snake = Snake::new(5, 5);
        assert_eq!(
            body_of(&snake),
            vec![Position::new(1, 2), Position::new(0, 2), Position::new(4, 2)]
        );
    }

    #[test]
    fn test_narrow_board_shortens_initial_body() {
        let mut snake = Snake::new(2, 3);
        assert_eq!(body_of(&snake), vec![Position::new(0, 1), Position::new(1, 1)]);
        snake.step();
        assert!(!snake.bites_itself());
        assert_eq!(snake.head(), Position::new(1, 1));

        let mut snake = Snake::new(1, 3);
        assert_eq!(snake.len(), 1);
        snake.step();
        assert!(!snake.bites_itself());
    }

    #[test]
    fn test_reverse_rejected() {
        let mut snake = Snake::new(20, 10);
        snake.set_direction(Direction::Left);
        assert_eq!(snake.next_direction(), Direction::Right);
        snake.step();
        assert_eq!(snake.direction(), Direction::Right);
    }

    #[test]
    fn test_double_tap_is_honoured_in_order() {
        let mut snake = Snake::new(20, 10);
        let start = snake.head();

        // Up replaces the pending direction, Left is buffered behind it
        snake.set_direction(Direction::Up);
        snake.set_direction(Direction::Left);
        assert_eq!(snake.next_direction(), Direction::Up);
        assert_eq!(snake.queued_turns(), 1);

        snake.step();
        assert_eq!(snake.direction(), Direction::Up);
        assert_eq!(snake.head(), Position::new(start.x, start.y - 1));
        snake.step();
        assert_eq!(snake.direction(), Direction::Left);
        assert_eq!(snake.head(), Position::new(start.x - 1, start.y - 1));
        assert!(!snake.bites_itself());
    }

    #[test]
    fn test_buffer_caps_at_two() {
        let mut snake = Snake::new(20, 10);
        snake.set_direction(Direction::Up);
        snake.set_direction(Direction::Left);
        snake.set_direction(Direction::Down);
        assert_eq!(snake.queued_turns(), 2);
        snake.set_direction(Direction::Right);
        assert_eq!(snake.queued_turns(), 2);

        snake.step();
        assert_eq!(snake.direction(), Direction::Up);
        assert_eq!(snake.next_direction(), Direction::Left);
        snake.step();
        assert_eq!(snake.direction(), Direction::Left);
        assert_eq!(snake.next_direction(), Direction::Down);
        snake.step();
        assert_eq!(snake.direction(), Direction::Down);
        assert_eq!(snake.queued_turns(), 0);
    }

    #[test]
    fn test_reverse_of_pending_turn_rejected() {
        let mut snake = Snake::new(20, 10);
        snake.set_direction(Direction::Up);
        snake.set_direction(Direction::Down);
        assert_eq!(snake.next_direction(), Direction::Up);
        assert_eq!(snake.queued_turns(), 0);

        // Checked against the newest buffered turn once one exists
        snake.set_direction(Direction::Left);
        snake.set_direction(Direction::Right);
        assert_eq!(snake.queued_turns(), 1);
    }

    #[test]
    fn test_growth_adds_one_segment() {
        let mut snake = Snake::new(20, 10);
        snake.grow();
        snake.step();
        assert_eq!(snake.len(), INITIAL_SNAKE_LENGTH + 1);
        snake.step();
        assert_eq!(snake.len(), INITIAL_SNAKE_LENGTH + 1);
    }

    #[test]
    fn test_self_collision() {
        let mut snake = Snake::new(20, 10);
        for _ in 0..3 {
            snake.grow();
            snake.step();
        }
        assert!(!snake.bites_itself());
        snake.set_direction(Direction::Up);
        snake.step();
        snake.set_direction(Direction::Left);
        snake.step();
        snake.set_direction(Direction::Down);
        snake.step();
        assert!(snake.bites_itself());
    }

    #[test]
    fn test_eating_food_end_to_end() {
        let mut game = SnakeGame::with_seed(open_grid(5, 5), 1.0, 7);
        let mut events = Vec::new();
        game.reset(&mut events);
        events.clear();
        assert_eq!(game.snake().head(), Position::new(1, 2));
        assert_eq!(game.food().len(), INITIAL_FOOD_COUNT);

        let target = Position::new(2, 2);
        if !game.food.contains(&target) {
            let first = *game.food.iter().next().unwrap();
            game.food.remove(&first);
            game.food.insert(target);
        }
        let before = game.food().len();

        game.update(INITIAL_SPEED, &mut events);

        assert_eq!(game.score(), 10);
        assert_eq!(game.snake().head(), target);
        assert!(!game.food().contains(&target));
        assert_eq!(game.food().len(), before);
        assert_eq!(game.speed(), INITIAL_SPEED - SPEED_INCREMENT);
        assert!(events.contains(&GameEvent::ScoreChanged(10)));
        assert!(events.contains(&GameEvent::SpeedChanged(INITIAL_SPEED - SPEED_INCREMENT)));

        // Growth lands on the next step
        game.update(game.speed(), &mut events);
        assert_eq!(game.snake().len(), INITIAL_SNAKE_LENGTH + 1);
    }

    #[test]
    fn test_food_avoids_snake_and_fills_up() {
        // 4 playable cells, 3 taken by the snake: only one food fits
        let grid = Grid::from_fn(4, 3, |p| {
            if p.y == 1 {
                (CellType::Playable, 2)
            } else {
                (CellType::Empty, 0)
            }
        })
        .unwrap();
        let game = SnakeGame::with_seed(grid, 1.0, 1);
        assert_eq!(game.food().len(), 1);
        let food = *game.food().iter().next().unwrap();
        assert!(!game.snake().contains(food));
        assert_eq!(food.y, 1);
    }

    #[test]
    fn test_speed_floor() {
        let mut game = SnakeGame::with_seed(open_grid(10, 10), 1.0, 3);
        let mut events = Vec::new();
        game.timer.set_period(MIN_SPEED + 1.0);
        game.food.insert(game.snake().head().step(Direction::Right));
        game.update(MIN_SPEED + 1.0, &mut events);
        assert_eq!(game.speed(), MIN_SPEED);
    }

    #[test]
    fn test_step_waits_for_interval() {
        let mut game = SnakeGame::with_seed(open_grid(10, 10), 2.0, 3);
        let mut events = Vec::new();
        let head = game.snake().head();
        game.update(INITIAL_SPEED, &mut events);
        assert_eq!(game.snake().head(), head);
        game.update(INITIAL_SPEED, &mut events);
        assert_ne!(game.snake().head(), head);
    }

    #[test]
    fn test_repeated_turn_not_buffered() {
        let mut snake = Snake::new(20, 10);
        snake.set_direction(Direction::Right);
        assert_eq!(snake.queued_turns(), 0);
        snake.set_direction(Direction::Up);
        snake.set_direction(Direction::Up);
        assert_eq!(snake.queued_turns(), 0);
        assert_eq!(snake.next_direction(), Direction::Up);
    }

    #[test]
    fn test_release_is_ignored() {
        let mut game = SnakeGame::with_seed(open_grid(10, 10), 1.0, 3);
        game.handle_input(GameInput::Release);
        assert_eq!(game.snake().next_direction(), Direction::Right);
        game.handle_input(GameInput::direction(Direction::Down));
        assert_eq!(game.snake().next_direction(), Direction::Down);
    }

    #[test]
    fn test_self_bite_ends_game() {
        let mut game = SnakeGame::with_seed(open_grid(10, 10), 1.0, 3);
        game.food.clear();
        for _ in 0..3 {
            game.snake.grow();
            game.snake.step();
        }
        let mut events = Vec::new();
        for dir in [Direction::Up, Direction::Left, Direction::Down] {
            game.handle_input(GameInput::direction(dir));
            game.update(INITIAL_SPEED, &mut events);
        }
        assert_eq!(events.last(), Some(&GameEvent::GameOver));
    }

    proptest! {
        #[test]
        fn prop_head_stays_in_bounds(
            width in 1i32..12,
            height in 1i32..12,
            x in 0i32..12,
            y in 0i32..12,
            dir_idx in 0usize..4,
        ) {
            let mut snake = Snake::new(width, height);
            let start = Position::new(x % width, y % height);
            snake.body[0] = start;
            snake.next_direction = Direction::ALL[dir_idx];
            snake.step();
            let head = snake.head();
            prop_assert!(head.x >= 0 && head.x < width);
            prop_assert!(head.y >= 0 && head.y < height);
        }

        #[test]
        fn prop_body_unique_until_bite(turns in proptest::collection::vec(0usize..4, 1..120)) {
            let mut game = SnakeGame::with_seed(open_grid(9, 7), 1.0, 11);
            let mut events = Vec::new();
            for turn in turns {
                game.handle_input(GameInput::direction(Direction::ALL[turn]));
                game.update(game.speed(), &mut events);
                if events.contains(&GameEvent::GameOver) {
                    break;
                }
                let body = body_of(game.snake());
                let unique: BTreeSet<_> = body.iter().copied().collect();
                prop_assert_eq!(unique.len(), body.len());

                // Contiguity, wrap-aware
                for pair in body.windows(2) {
                    let dx = (pair[0].x - pair[1].x).rem_euclid(9);
                    let dy = (pair[0].y - pair[1].y).rem_euclid(7);
                    let unit = matches!((dx, dy), (1, 0) | (8, 0) | (0, 1) | (0, 6));
                    prop_assert!(unit);
                }
            }
        }
    }
}
