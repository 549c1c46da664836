//! Starting boards for each game
//!
//! Snake and Breakout boards are randomized through the caller's RNG so a
//! seeded run reproduces the same layout. The Tanks arena is fixed.

use rand::Rng;

use super::breakout::Block;
use super::grid::{CellType, Grid, GridError};
use super::state::Position;

pub const SNAKE_WIDTH: i32 = 52;
pub const SNAKE_HEIGHT: i32 = 7;

pub const BREAKOUT_WIDTH: i32 = 52;
pub const BREAKOUT_HEIGHT: i32 = 12;
pub const BLOCK_START_ROW: i32 = 1;
pub const BLOCK_ROWS: i32 = 4;
/// Chance a block is placed in an eligible cell
const BLOCK_DENSITY: f64 = 0.85;
/// Extra chance to leave a gap on the diagonal gap pattern
const BLOCK_GAP_CHANCE: f64 = 0.3;

pub const TANKS_WIDTH: i32 = 40;
pub const TANKS_HEIGHT: i32 = 20;
/// Side of the square kept clear around spawn corners
const SPAWN_ZONE: i32 = 3;
const CLUSTER_SPACING: i32 = 3;

/// Activity level for one snake cell
fn contribution_level<R: Rng>(rng: &mut R) -> u8 {
    let roll: f64 = rng.random();
    match roll {
        r if r < 0.10 => 0,
        r if r < 0.25 => 1,
        r if r < 0.50 => 2,
        r if r < 0.75 => 3,
        _ => 4,
    }
}

/// Snake board: random levels, level 0 cells are EMPTY and unusable
pub fn snake_grid<R: Rng>(rng: &mut R) -> Result<Grid, GridError> {
    Grid::from_fn(SNAKE_WIDTH, SNAKE_HEIGHT, |_| {
        let level = contribution_level(&mut *rng);
        let kind = if level > 0 {
            CellType::Playable
        } else {
            CellType::Empty
        };
        (kind, level)
    })
}

fn block_level(y: i32) -> u8 {
    (BLOCK_ROWS - (y - BLOCK_START_ROW)).max(1) as u8
}

fn place_block<R: Rng>(pos: Position, width: i32, rng: &mut R) -> bool {
    if pos.x <= 1 || pos.x >= width - 2 {
        return false;
    }
    if (pos.x + pos.y) % 7 == 0 && rng.random_bool(BLOCK_GAP_CHANCE) {
        return false;
    }
    rng.random_bool(BLOCK_DENSITY)
}

/// Breakout board: side walls plus rows of blocks, stronger toward the top
pub fn breakout_grid<R: Rng>(rng: &mut R) -> Result<(Grid, Vec<Block>), GridError> {
    let mut blocks = Vec::new();
    let rows = BLOCK_START_ROW..BLOCK_START_ROW + BLOCK_ROWS;
    let grid = Grid::from_fn(BREAKOUT_WIDTH, BREAKOUT_HEIGHT, |pos| {
        if pos.x == 0 || pos.x == BREAKOUT_WIDTH - 1 {
            return (CellType::Obstacle, 4);
        }
        if rows.contains(&pos.y) && place_block(pos, BREAKOUT_WIDTH, &mut *rng) {
            let level = block_level(pos.y);
            blocks.push(Block::new(pos, level));
            return (CellType::Obstacle, level);
        }
        (CellType::Playable, 0)
    })?;
    Ok((grid, blocks))
}

fn is_border(pos: Position, width: i32, height: i32) -> bool {
    pos.x == 0 || pos.y == 0 || pos.x == width - 1 || pos.y == height - 1
}

fn is_spawn_zone(pos: Position, width: i32, height: i32) -> bool {
    let near_top = pos.y <= SPAWN_ZONE;
    let left = pos.x <= SPAWN_ZONE;
    let right = pos.x >= width - SPAWN_ZONE - 1;
    let center = (pos.x - width / 2).abs() <= 2;
    (left && pos.y >= height - SPAWN_ZONE - 1) || (near_top && (left || right || center))
}

fn is_arena_obstacle(pos: Position) -> bool {
    let cluster_seed = (pos.x / CLUSTER_SPACING * 17 + pos.y / CLUSTER_SPACING * 31) % 100;
    if cluster_seed < 40 {
        let local = (pos.x % CLUSTER_SPACING * 3 + pos.y % CLUSTER_SPACING * 5 + cluster_seed) % 10;
        return local < 6;
    }
    (pos.x * 11 + pos.y * 23) % 100 < 15
}

fn arena_obstacle_level(pos: Position) -> u8 {
    match (pos.x * 7 + pos.y * 13) % 10 {
        0..=1 => 4,
        2..=4 => 3,
        5..=7 => 2,
        _ => 1,
    }
}

fn background_level(pos: Position) -> u8 {
    let noise = (pos.x as f64 * 0.5).sin() * (pos.y as f64 * 0.7).cos();
    u8::from(noise > 0.7)
}

/// Tanks arena: solid border, clustered destructible cover, clear spawn zones
pub fn tanks_grid() -> Result<Grid, GridError> {
    let (w, h) = (TANKS_WIDTH, TANKS_HEIGHT);
    Grid::from_fn(w, h, |pos| {
        if is_border(pos, w, h) {
            (CellType::Obstacle, 4)
        } else if is_spawn_zone(pos, w, h) {
            (CellType::Playable, 0)
        } else if is_arena_obstacle(pos) {
            (CellType::Obstacle, arena_obstacle_level(pos))
        } else {
            (CellType::Playable, background_level(pos))
        }
    })
}

/// Player start, bottom-left
pub fn player_spawn(grid: &Grid) -> Position {
    Position::new(2, grid.height() - 3)
}

/// Enemy spawn points along the top: left, right, centre
pub fn enemy_spawns(grid: &Grid) -> Vec<Position> {
    let w = grid.width();
    vec![
        Position::new(2, 2),
        Position::new(w - 3, 2),
        Position::new(w / 2, 2),
    ]
}
