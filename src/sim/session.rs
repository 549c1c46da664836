//! Lifecycle wrapper shared by every game
//!
//! `Session` owns one engine and drives it from host frame timestamps:
//! READY -> PLAYING -> PAUSED -> GAME_OVER. Engines report score, speed and
//! termination as `GameEvent`s; the session forwards them to observers.

use log::{debug, info};

use super::grid::Grid;
use super::state::{GameEvent, GameInput, GameKind, GameState, GameStats};
use crate::consts::MAX_FRAME_DELTA_MS;

/// A steppable game engine
pub trait Game {
    /// Game-type tag
    fn kind(&self) -> GameKind;

    /// Advance the simulation by `dt` elapsed milliseconds
    fn update(&mut self, dt: f64, events: &mut Vec<GameEvent>);

    /// Reinitialize entities and score to the session's starting configuration
    fn reset(&mut self, events: &mut Vec<GameEvent>);

    /// Apply a player input; irrelevant inputs are ignored
    fn handle_input(&mut self, input: GameInput);

    fn score(&self) -> u64;

    fn grid(&self) -> &Grid;

    /// Statistics for the current run
    fn stats(&self) -> GameStats;
}

/// Running score owned by an engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    score: u64,
}

impl Scoreboard {
    pub fn get(&self) -> u64 {
        self.score
    }

    /// Add points and report the new total
    pub fn add(&mut self, points: u64, events: &mut Vec<GameEvent>) {
        self.set(self.score + points, events);
    }

    pub fn set(&mut self, score: u64, events: &mut Vec<GameEvent>) {
        self.score = score;
        events.push(GameEvent::ScoreChanged(score));
    }
}

type Observer<T> = Option<Box<dyn FnMut(T)>>;

/// Callbacks fired synchronously as events are dispatched
#[derive(Default)]
pub struct Observers {
    on_score_change: Observer<u64>,
    on_game_over: Observer<u64>,
    on_state_change: Observer<GameState>,
    on_speed_change: Observer<f64>,
    on_life_lost: Observer<u32>,
}

/// Host-facing lifecycle around one engine
pub struct Session<G: Game> {
    game: G,
    state: GameState,
    /// Host timestamp of the last processed frame
    last_frame: f64,
    /// Whether the host should keep calling `frame`
    running: bool,
    max_frame_delta: f64,
    observers: Observers,
    events: Vec<GameEvent>,
}

impl<G: Game> Session<G> {
    pub fn new(game: G) -> Self {
        Self {
            game,
            state: GameState::Ready,
            last_frame: 0.0,
            running: false,
            max_frame_delta: MAX_FRAME_DELTA_MS,
            observers: Observers::default(),
            events: Vec::new(),
        }
    }

    /// Override the per-frame delta clamp
    pub fn with_max_frame_delta(mut self, max_ms: f64) -> Self {
        self.max_frame_delta = max_ms;
        self
    }

    /// Begin (or restart after game over) at host time `now`
    pub fn start(&mut self, now: f64) {
        match self.state {
            GameState::Playing => return,
            GameState::Paused => {
                self.resume(now);
                return;
            }
            GameState::Ready | GameState::GameOver => {
                let mut events = std::mem::take(&mut self.events);
                self.game.reset(&mut events);
                self.dispatch(&mut events);
                self.events = events;
            }
        }
        info!("{} started", self.game.kind().as_str());
        self.set_state(GameState::Playing);
        self.last_frame = now;
        self.running = true;
        self.frame(now);
    }

    /// Freeze stepping; only valid while playing
    pub fn pause(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.set_state(GameState::Paused);
        self.running = false;
    }

    /// Continue from a pause, re-baselining the clock at `now`
    pub fn resume(&mut self, now: f64) {
        if self.state != GameState::Paused {
            return;
        }
        self.set_state(GameState::Playing);
        self.last_frame = now;
        self.running = true;
        self.frame(now);
    }

    pub fn toggle_pause(&mut self, now: f64) {
        match self.state {
            GameState::Playing => self.pause(),
            GameState::Paused => self.resume(now),
            _ => {}
        }
    }

    /// Stop stepping unconditionally (host navigated away)
    pub fn destroy(&mut self) {
        if self.running {
            debug!("{} session destroyed", self.game.kind().as_str());
        }
        self.running = false;
    }

    /// One host frame at timestamp `now` (ms)
    pub fn frame(&mut self, now: f64) {
        if !self.running || self.state != GameState::Playing {
            return;
        }
        let dt = (now - self.last_frame).clamp(0.0, self.max_frame_delta);
        self.last_frame = now;

        let mut events = std::mem::take(&mut self.events);
        self.game.update(dt, &mut events);
        self.dispatch(&mut events);
        self.events = events;
    }

    pub fn handle_input(&mut self, input: GameInput) {
        self.game.handle_input(input);
    }

    fn dispatch(&mut self, events: &mut Vec<GameEvent>) {
        for event in events.drain(..) {
            match event {
                GameEvent::ScoreChanged(score) => {
                    if let Some(cb) = self.observers.on_score_change.as_mut() {
                        cb(score);
                    }
                }
                GameEvent::SpeedChanged(speed) => {
                    if let Some(cb) = self.observers.on_speed_change.as_mut() {
                        cb(speed);
                    }
                }
                GameEvent::LifeLost { remaining } => {
                    if let Some(cb) = self.observers.on_life_lost.as_mut() {
                        cb(remaining);
                    }
                }
                GameEvent::GameOver => {
                    if self.state != GameState::GameOver {
                        self.end_game();
                    }
                }
            }
        }
    }

    fn end_game(&mut self) {
        let score = self.game.score();
        info!("{} over, score {}", self.game.kind().as_str(), score);
        self.set_state(GameState::GameOver);
        self.running = false;
        if let Some(cb) = self.observers.on_game_over.as_mut() {
            cb(score);
        }
    }

    fn set_state(&mut self, state: GameState) {
        self.state = state;
        if let Some(cb) = self.observers.on_state_change.as_mut() {
            cb(state);
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.game.score()
    }

    pub fn grid(&self) -> &Grid {
        self.game.grid()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The engine, for per-game snapshots
    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn set_on_score_change(&mut self, cb: impl FnMut(u64) + 'static) {
        self.observers.on_score_change = Some(Box::new(cb));
    }

    pub fn set_on_game_over(&mut self, cb: impl FnMut(u64) + 'static) {
        self.observers.on_game_over = Some(Box::new(cb));
    }

    pub fn set_on_state_change(&mut self, cb: impl FnMut(GameState) + 'static) {
        self.observers.on_state_change = Some(Box::new(cb));
    }

    pub fn set_on_speed_change(&mut self, cb: impl FnMut(f64) + 'static) {
        self.observers.on_speed_change = Some(Box::new(cb));
    }

    pub fn set_on_life_lost(&mut self, cb: impl FnMut(u32) + 'static) {
        self.observers.on_life_lost = Some(Box::new(cb));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::grid::CellType;

    /// Scores a point every 100 ms, ends at `limit`
    struct Counter {
        grid: Grid,
        score: Scoreboard,
        elapsed: f64,
        limit: u64,
        updates: u32,
        resets: u32,
    }

    impl Counter {
        fn new(limit: u64) -> Self {
            Self {
                grid: Grid::filled(2, 2, CellType::Playable, 0).unwrap(),
                score: Scoreboard::default(),
                elapsed: 0.0,
                limit,
                updates: 0,
                resets: 0,
            }
        }
    }

    impl Game for Counter {
        fn kind(&self) -> GameKind {
            GameKind::Snake
        }

        fn update(&mut self, dt: f64, events: &mut Vec<GameEvent>) {
            self.updates += 1;
            self.elapsed += dt;
            while self.elapsed >= 100.0 {
                self.elapsed -= 100.0;
                self.score.add(1, events);
                if self.score.get() >= self.limit {
                    events.push(GameEvent::GameOver);
                    return;
                }
            }
        }

        fn reset(&mut self, events: &mut Vec<GameEvent>) {
            self.resets += 1;
            self.elapsed = 0.0;
            self.score.set(0, events);
        }

        fn handle_input(&mut self, _input: GameInput) {}

        fn score(&self) -> u64 {
            self.score.get()
        }

        fn grid(&self) -> &Grid {
            &self.grid
        }

        fn stats(&self) -> GameStats {
            GameStats::Breakout {
                blocks_destroyed: 0,
                lives_remaining: 0,
            }
        }
    }

    #[test]
    fn test_start_resets_and_plays() {
        let mut session = Session::new(Counter::new(100));
        assert_eq!(session.state(), GameState::Ready);

        session.start(1000.0);
        assert_eq!(session.state(), GameState::Playing);
        assert!(session.is_running());
        assert_eq!(session.game().resets, 1);

        session.frame(1100.0);
        session.frame(1200.0);
        assert_eq!(session.score(), 2);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut session = Session::new(Counter::new(100));
        session.start(0.0);
        session.frame(150.0);
        assert_eq!(session.score(), 1);

        session.pause();
        assert_eq!(session.state(), GameState::Paused);
        session.frame(5000.0);
        assert_eq!(session.score(), 1);

        // Resume re-baselines: the 10 s gap never reaches the engine
        session.resume(10_000.0);
        session.frame(10_050.0);
        assert_eq!(session.score(), 2);
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let mut session = Session::new(Counter::new(100));
        session.pause();
        assert_eq!(session.state(), GameState::Ready);
        session.resume(0.0);
        assert_eq!(session.state(), GameState::Ready);
        session.toggle_pause(0.0);
        assert_eq!(session.state(), GameState::Ready);

        session.start(0.0);
        session.toggle_pause(10.0);
        assert_eq!(session.state(), GameState::Paused);
        session.toggle_pause(20.0);
        assert_eq!(session.state(), GameState::Playing);

        // start while playing does not reset
        session.start(30.0);
        assert_eq!(session.game().resets, 1);
    }

    #[test]
    fn test_game_over_halts_and_notifies() {
        let mut session = Session::new(Counter::new(3));
        let states = Rc::new(RefCell::new(Vec::new()));
        let final_score = Rc::new(RefCell::new(None));
        let scores = Rc::new(RefCell::new(Vec::new()));
        {
            let states = states.clone();
            session.set_on_state_change(move |s| states.borrow_mut().push(s));
            let final_score = final_score.clone();
            session.set_on_game_over(move |s| *final_score.borrow_mut() = Some(s));
            let scores = scores.clone();
            session.set_on_score_change(move |s| scores.borrow_mut().push(s));
        }

        session.start(0.0);
        for t in 1..=5 {
            session.frame(t as f64 * 100.0);
        }

        assert_eq!(session.state(), GameState::GameOver);
        assert!(!session.is_running());
        assert_eq!(*final_score.borrow(), Some(3));
        assert_eq!(*scores.borrow(), vec![0, 1, 2, 3]);
        assert_eq!(
            *states.borrow(),
            vec![GameState::Playing, GameState::GameOver]
        );

        // Frames after game over do nothing until restarted
        let updates = session.game().updates;
        session.frame(2000.0);
        assert_eq!(session.game().updates, updates);

        session.start(3000.0);
        assert_eq!(session.state(), GameState::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.game().resets, 2);
    }

    #[test]
    fn test_destroy_stops_stepping() {
        let mut session = Session::new(Counter::new(100));
        session.start(0.0);
        session.destroy();
        session.frame(500.0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.state(), GameState::Playing);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut session = Session::new(Counter::new(1000)).with_max_frame_delta(250.0);
        session.start(0.0);
        session.frame(60_000.0);
        assert_eq!(session.score(), 2);
    }
}
