//! Tanks: player tank versus AI enemies on a destructible arena
//!
//! Time is tracked on an internal simulation clock (the sum of every `dt` fed
//! to `update`), so cooldowns, AI cadence and spawning freeze while paused.
//!
//! Update order: player, bullets, enemy AI, spawning, collisions.

use std::collections::HashSet;

use log::{debug, info, trace};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::grid::{CellType, Grid};
use super::layout;
use super::session::{Game, Scoreboard};
use super::state::{Action, Direction, GameEvent, GameInput, GameKind, GameStats, Position};
use super::timer::StepTimer;

pub const PLAYER_HP: u32 = 3;
pub const ENEMY_HP: u32 = 1;
/// Player ms per cell
pub const TANK_MOVE_SPEED: f64 = 150.0;
/// Enemy step interval relative to the player's
pub const ENEMY_SPEED_FACTOR: f64 = 1.5;
pub const SHOOT_COOLDOWN: f64 = 500.0;
/// Bullet ms per cell
pub const BULLET_SPEED: f64 = 80.0;
pub const BULLET_DAMAGE: u32 = 1;
pub const INITIAL_ENEMY_COUNT: usize = 3;
pub const MAX_ENEMIES: usize = 5;
pub const SPAWN_INTERVAL: f64 = 5000.0;
pub const AI_INTERVAL: f64 = 300.0;
pub const SCORE_PER_ENEMY: u64 = 100;
/// Chance an enemy ignores the chase heading and picks any direction
pub const RANDOM_TURN_CHANCE: f64 = 0.2;
/// Chebyshev distance to the player a spawn point must exceed
pub const SPAWN_CLEARANCE: i32 = 2;

/// Who fired a bullet / which side a tank is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Player,
    Enemy,
}

fn elapsed_since(last: Option<f64>, now: f64, interval: f64) -> bool {
    last.is_none_or(|t| now - t >= interval)
}

#[derive(Debug, Clone, Serialize)]
pub struct Tank {
    position: Position,
    direction: Direction,
    hp: u32,
    max_hp: u32,
    owner: Owner,
    timer: StepTimer,
    last_shot: Option<f64>,
}

impl Tank {
    pub fn new(position: Position, direction: Direction, hp: u32, owner: Owner, move_speed: f64) -> Self {
        Self {
            position,
            direction,
            hp,
            max_hp: hp,
            owner,
            timer: StepTimer::new(move_speed),
            last_shot: None,
        }
    }

    pub fn player(position: Position, speed_multiplier: f64) -> Self {
        Self::new(
            position,
            Direction::Up,
            PLAYER_HP,
            Owner::Player,
            TANK_MOVE_SPEED * speed_multiplier,
        )
    }

    pub fn enemy(position: Position, speed_multiplier: f64) -> Self {
        Self::new(
            position,
            Direction::Down,
            ENEMY_HP,
            Owner::Enemy,
            TANK_MOVE_SPEED * ENEMY_SPEED_FACTOR * speed_multiplier,
        )
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Cell directly ahead
    pub fn next_position(&self) -> Position {
        self.position.step(self.direction)
    }

    fn advance(&mut self) {
        self.position = self.next_position();
    }

    pub fn can_shoot(&self, now: f64) -> bool {
        elapsed_since(self.last_shot, now, SHOOT_COOLDOWN)
    }

    /// Record the shot and return the bullet's starting cell
    fn shoot(&mut self, now: f64) -> Position {
        self.last_shot = Some(now);
        self.next_position()
    }

    pub fn take_damage(&mut self, damage: u32) {
        self.hp = self.hp.saturating_sub(damage);
    }

    pub fn reset(&mut self, position: Position) {
        self.position = position;
        self.direction = Direction::Up;
        self.hp = self.max_hp;
        self.last_shot = None;
        self.timer.reset();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Bullet {
    position: Position,
    direction: Direction,
    owner: Owner,
    timer: StepTimer,
    active: bool,
}

impl Bullet {
    pub fn new(position: Position, direction: Direction, owner: Owner) -> Self {
        Self {
            position,
            direction,
            owner,
            timer: StepTimer::new(BULLET_SPEED),
            active: true,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Advance at most one cell; returns true if it moved
    fn update(&mut self, dt: f64) -> bool {
        if !self.active || !self.timer.tick(dt) {
            return false;
        }
        self.position = self.position.step(self.direction);
        true
    }
}

/// Heading that closes the larger axis gap to `target` (ties go vertical)
pub fn chase_heading(from: Position, target: Position) -> Direction {
    let dx = target.x - from.x;
    let dy = target.y - from.y;
    if dx.abs() > dy.abs() {
        if dx > 0 { Direction::Right } else { Direction::Left }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

/// Tanks engine
#[derive(Debug, Clone)]
pub struct TanksGame {
    grid: Grid,
    player: Tank,
    enemies: Vec<Tank>,
    bullets: Vec<Bullet>,
    player_spawn: Position,
    enemy_spawns: Vec<Position>,
    clock: f64,
    last_spawn: Option<f64>,
    last_ai: Option<f64>,
    want_move: bool,
    want_shoot: bool,
    move_direction: Direction,
    speed_multiplier: f64,
    score: Scoreboard,
    enemies_destroyed: u32,
    shots_fired: u32,
    hits: u32,
    rng: Pcg32,
}

impl TanksGame {
    pub fn new(grid: Grid, speed_multiplier: f64) -> Self {
        Self::with_seed(grid, speed_multiplier, rand::random())
    }

    pub fn with_seed(grid: Grid, speed_multiplier: f64, seed: u64) -> Self {
        let player_spawn = layout::player_spawn(&grid);
        let enemy_spawns = layout::enemy_spawns(&grid);
        Self {
            player: Tank::player(player_spawn, speed_multiplier),
            grid,
            enemies: Vec::new(),
            bullets: Vec::new(),
            player_spawn,
            enemy_spawns,
            clock: 0.0,
            last_spawn: None,
            last_ai: None,
            want_move: false,
            want_shoot: false,
            move_direction: Direction::Up,
            speed_multiplier,
            score: Scoreboard::default(),
            enemies_destroyed: 0,
            shots_fired: 0,
            hits: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn player(&self) -> &Tank {
        &self.player
    }

    pub fn enemies(&self) -> &[Tank] {
        &self.enemies
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn enemies_destroyed(&self) -> u32 {
        self.enemies_destroyed
    }

    /// Simulation time in ms
    pub fn clock(&self) -> f64 {
        self.clock
    }

    fn is_open(&self, pos: Position) -> bool {
        self.grid.cell_at(pos).is_some_and(|c| !c.is_obstacle())
    }

    fn live_enemy_at(&self, pos: Position, skip: Option<usize>) -> bool {
        self.enemies
            .iter()
            .enumerate()
            .any(|(i, e)| Some(i) != skip && e.is_alive() && e.position() == pos)
    }

    fn player_can_enter(&self, pos: Position) -> bool {
        self.is_open(pos) && !self.live_enemy_at(pos, None)
    }

    fn enemy_can_enter(&self, pos: Position, index: usize) -> bool {
        self.is_open(pos)
            && !(self.player.is_alive() && self.player.position() == pos)
            && !self.live_enemy_at(pos, Some(index))
    }

    /// Spawn point free of obstacles, tanks and the player's surroundings
    pub fn is_position_clear(&self, pos: Position) -> bool {
        self.is_open(pos)
            && !pos.within(self.player.position(), SPAWN_CLEARANCE)
            && !self.live_enemy_at(pos, None)
    }

    fn fire(&mut self, shooter: Owner, index: usize) {
        let now = self.clock;
        let tank = match shooter {
            Owner::Player => &mut self.player,
            Owner::Enemy => &mut self.enemies[index],
        };
        let direction = tank.direction();
        let start = tank.shoot(now);
        if !self.grid.contains(start) {
            return;
        }
        trace!("{:?} fired {:?} from ({}, {})", shooter, direction, start.x, start.y);
        if shooter == Owner::Player {
            self.shots_fired += 1;
        }
        self.bullets.push(Bullet::new(start, direction, shooter));
    }

    fn update_player(&mut self, dt: f64) {
        if !self.player.is_alive() {
            return;
        }

        if self.want_move && self.player.timer.tick(dt) {
            self.player.set_direction(self.move_direction);
            let next = self.player.next_position();
            if self.player_can_enter(next) {
                self.player.advance();
            }
        }

        if self.want_shoot && self.player.can_shoot(self.clock) {
            self.fire(Owner::Player, 0);
            self.want_shoot = false;
        }
    }

    fn update_bullets(&mut self, dt: f64) {
        for bullet in &mut self.bullets {
            if bullet.update(dt) && !self.grid.contains(bullet.position()) {
                bullet.deactivate();
            }
        }
        self.bullets.retain(Bullet::is_active);
    }

    fn update_enemies(&mut self, dt: f64) {
        for enemy in &mut self.enemies {
            enemy.timer.charge(dt);
        }

        if !elapsed_since(self.last_ai, self.clock, AI_INTERVAL) {
            return;
        }
        self.last_ai = Some(self.clock);

        for index in 0..self.enemies.len() {
            if self.enemies[index].is_alive() {
                self.run_enemy_ai(index);
            }
        }
        self.enemies.retain(Tank::is_alive);
    }

    fn run_enemy_ai(&mut self, index: usize) {
        let target = self.player.position();
        let mut heading = chase_heading(self.enemies[index].position(), target);
        if self.rng.random_bool(RANDOM_TURN_CHANCE) {
            heading = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
        }

        self.enemies[index].set_direction(heading);
        if self.enemies[index].timer.try_step() {
            let next = self.enemies[index].next_position();
            if self.enemy_can_enter(next, index) {
                self.enemies[index].advance();
            }
        }

        let here = self.enemies[index].position();
        let aim = if here.x == target.x {
            Some(if target.y < here.y { Direction::Up } else { Direction::Down })
        } else if here.y == target.y {
            Some(if target.x < here.x { Direction::Left } else { Direction::Right })
        } else {
            None
        };
        let Some(aim) = aim else {
            return;
        };
        if self.enemies[index].can_shoot(self.clock) {
            self.enemies[index].set_direction(aim);
            self.fire(Owner::Enemy, index);
        }
    }

    fn spawn_enemies(&mut self) {
        if self.enemies.len() >= MAX_ENEMIES || self.enemy_spawns.is_empty() {
            return;
        }
        if !elapsed_since(self.last_spawn, self.clock, SPAWN_INTERVAL) {
            return;
        }

        if self.enemies.is_empty() && self.last_spawn.is_none() {
            info!("enemy wave of {}", INITIAL_ENEMY_COUNT);
            for i in 0..INITIAL_ENEMY_COUNT {
                self.spawn_enemy(i % self.enemy_spawns.len());
            }
        } else {
            let index = self.rng.random_range(0..self.enemy_spawns.len());
            self.spawn_enemy(index);
        }
        self.last_spawn = Some(self.clock);
    }

    fn spawn_enemy(&mut self, spawn_index: usize) {
        let pos = self.enemy_spawns[spawn_index];
        if !self.is_position_clear(pos) {
            trace!("spawn ({}, {}) blocked", pos.x, pos.y);
            return;
        }
        debug!("enemy spawned at ({}, {})", pos.x, pos.y);
        self.enemies.push(Tank::enemy(pos, self.speed_multiplier));
    }

    /// Every bullet in a cell holding live bullets of both owners is spent.
    fn cancel_opposing_bullets(&mut self) {
        let cells_of = |owner: Owner| -> HashSet<Position> {
            self.bullets
                .iter()
                .filter(|b| b.active && b.owner == owner)
                .map(|b| b.position)
                .collect()
        };
        let player = cells_of(Owner::Player);
        let contested: HashSet<Position> =
            cells_of(Owner::Enemy).intersection(&player).copied().collect();
        if contested.is_empty() {
            return;
        }
        for bullet in &mut self.bullets {
            if bullet.active && contested.contains(&bullet.position) {
                bullet.deactivate();
            }
        }
    }

    fn resolve_collisions(&mut self, events: &mut Vec<GameEvent>) {
        self.cancel_opposing_bullets();

        for bullet in &mut self.bullets {
            if !bullet.active {
                continue;
            }
            let pos = bullet.position;

            let obstacle = self
                .grid
                .cell_at(pos)
                .filter(|c| c.is_obstacle())
                .map(|c| c.level);
            if let Some(level) = obstacle {
                bullet.deactivate();
                if level <= 1 {
                    self.grid.set_cell(pos, CellType::Playable, 0);
                } else {
                    self.grid.set_level(pos, level - 1);
                }
                continue;
            }

            match bullet.owner {
                Owner::Player => {
                    let Some(enemy) = self
                        .enemies
                        .iter_mut()
                        .find(|e| e.is_alive() && e.position() == pos)
                    else {
                        continue;
                    };
                    enemy.take_damage(BULLET_DAMAGE);
                    bullet.deactivate();
                    self.hits += 1;
                    if !enemy.is_alive() {
                        debug!("enemy destroyed at ({}, {})", pos.x, pos.y);
                        self.enemies_destroyed += 1;
                        self.score.add(SCORE_PER_ENEMY, events);
                    }
                }
                Owner::Enemy => {
                    if self.player.position() == pos {
                        self.player.take_damage(BULLET_DAMAGE);
                        bullet.deactivate();
                        debug!("player hit, {} hp left", self.player.hp());
                    }
                }
            }
        }
        self.bullets.retain(Bullet::is_active);
    }
}

impl Game for TanksGame {
    fn kind(&self) -> GameKind {
        GameKind::Tanks
    }

    fn update(&mut self, dt: f64, events: &mut Vec<GameEvent>) {
        if dt > 0.0 {
            self.clock += dt;
        }

        self.update_player(dt);
        self.update_bullets(dt);
        self.update_enemies(dt);
        self.spawn_enemies();
        self.resolve_collisions(events);

        if !self.player.is_alive() {
            info!("player destroyed, {} enemies down", self.enemies_destroyed);
            events.push(GameEvent::GameOver);
        }
    }

    fn reset(&mut self, events: &mut Vec<GameEvent>) {
        self.player.reset(self.player_spawn);
        self.enemies.clear();
        self.bullets.clear();
        self.last_spawn = None;
        self.last_ai = None;
        self.want_move = false;
        self.want_shoot = false;
        self.enemies_destroyed = 0;
        self.shots_fired = 0;
        self.hits = 0;
        self.score.set(0, events);
    }

    fn handle_input(&mut self, input: GameInput) {
        match input {
            GameInput::Direction { direction } => {
                self.want_move = true;
                self.move_direction = direction;
            }
            GameInput::Action {
                action: Action::Shoot,
            } => self.want_shoot = true,
            GameInput::Release => self.want_move = false,
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
        let accuracy = if self.shots_fired == 0 {
            0.0
        } else {
            f64::from(self.hits) / f64::from(self.shots_fired)
        };
        GameStats::Tanks {
            enemies_destroyed: self.enemies_destroyed,
            shots_fired: self.shots_fired,
            hits: self.hits,
            accuracy,
        }
    }
}
