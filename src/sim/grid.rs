//! Fixed-shape cell grid shared by all three games
//!
//! The shape is decided at construction and never changes. Individual cells
//! mutate in place (type and level) as obstacles are destroyed or restored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::Position;
use crate::consts::MAX_CELL_LEVEL;

/// What a cell is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellType {
    /// Background, not usable by entities
    Empty,
    /// Wall, block or destructible cover
    Obstacle,
    /// Free space entities may occupy
    Playable,
}

/// A single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub position: Position,
    pub kind: CellType,
    /// Intensity / remaining durability, 0..=4
    pub level: u8,
}

impl Cell {
    pub fn new(position: Position, kind: CellType, level: u8) -> Self {
        Self {
            position,
            kind,
            level,
        }
    }

    pub fn is_obstacle(&self) -> bool {
        self.kind == CellType::Obstacle
    }

    pub fn is_playable(&self) -> bool {
        self.kind == CellType::Playable
    }
}

/// Reasons a grid cannot be built
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    Empty { width: i32, height: i32 },
    #[error("expected {expected} cells, got {actual}")]
    CellCount { expected: usize, actual: usize },
    #[error("cell at index {index} reports position ({x}, {y})")]
    Misplaced { index: usize, x: i32, y: i32 },
    #[error("cell ({x}, {y}) has level {level}, max is 4")]
    Level { x: i32, y: i32, level: u8 },
}

/// Row-major grid of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid from row-major cells, validating shape and levels
    pub fn new(width: i32, height: i32, cells: Vec<Cell>) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::Empty { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if cells.len() != expected {
            return Err(GridError::CellCount {
                expected,
                actual: cells.len(),
            });
        }
        for (index, cell) in cells.iter().enumerate() {
            let x = (index % width as usize) as i32;
            let y = (index / width as usize) as i32;
            if cell.position != Position::new(x, y) {
                return Err(GridError::Misplaced {
                    index,
                    x: cell.position.x,
                    y: cell.position.y,
                });
            }
            if cell.level > MAX_CELL_LEVEL {
                return Err(GridError::Level {
                    x,
                    y,
                    level: cell.level,
                });
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a grid by asking `f` for the type and level of every position
    pub fn from_fn<F>(width: i32, height: i32, mut f: F) -> Result<Self, GridError>
    where
        F: FnMut(Position) -> (CellType, u8),
    {
        if width <= 0 || height <= 0 {
            return Err(GridError::Empty { width, height });
        }
        let mut cells = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                let position = Position::new(x, y);
                let (kind, level) = f(position);
                cells.push(Cell::new(position, kind, level));
            }
        }
        Self::new(width, height, cells)
    }

    /// Uniform grid, handy for tests and blank boards
    pub fn filled(width: i32, height: i32, kind: CellType, level: u8) -> Result<Self, GridError> {
        Self::from_fn(width, height, |_| (kind, level))
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos)
            .then(|| (pos.y as usize) * (self.width as usize) + pos.x as usize)
    }

    /// Cell at `pos`, `None` outside the grid
    pub fn cell_at(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    /// True when `pos` is inside the grid and holds an obstacle
    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.cell_at(pos).is_some_and(Cell::is_obstacle)
    }

    /// Every cell, row-major
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells matching `filter`, row-major
    pub fn cells_where<'a, F>(&'a self, filter: F) -> impl Iterator<Item = &'a Cell> + 'a
    where
        F: Fn(&Cell) -> bool + 'a,
    {
        self.cells.iter().filter(move |c| filter(*c))
    }

    /// Positions of every PLAYABLE cell
    pub fn playable_positions(&self) -> Vec<Position> {
        self.cells_where(Cell::is_playable)
            .map(|c| c.position)
            .collect()
    }

    /// One row of cells, for renderers
    pub fn row(&self, y: i32) -> Option<&[Cell]> {
        if y < 0 || y >= self.height {
            return None;
        }
        let start = (y as usize) * (self.width as usize);
        Some(&self.cells[start..start + self.width as usize])
    }

    /// Change a cell's type; returns false outside the grid
    pub fn set_kind(&mut self, pos: Position, kind: CellType) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i].kind = kind;
                true
            }
            None => false,
        }
    }

    /// Change a cell's level (clamped to 0..=4); returns false outside the grid
    pub fn set_level(&mut self, pos: Position, level: u8) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i].level = level.min(MAX_CELL_LEVEL);
                true
            }
            None => false,
        }
    }

    /// Set both type and level at once
    pub fn set_cell(&mut self, pos: Position, kind: CellType, level: u8) -> bool {
        self.set_kind(pos, kind) && self.set_level(pos, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_bounds() {
        let grid = Grid::filled(4, 3, CellType::Playable, 2).unwrap();
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);

        let cell = grid.cell_at(Position::new(3, 2)).unwrap();
        assert_eq!(cell.position, Position::new(3, 2));
        assert_eq!(cell.level, 2);

        assert!(grid.cell_at(Position::new(4, 0)).is_none());
        assert!(grid.cell_at(Position::new(0, 3)).is_none());
        assert!(grid.cell_at(Position::new(-1, 0)).is_none());
    }

    #[test]
    fn test_filter_and_mutate() {
        let mut grid = Grid::from_fn(3, 3, |p| {
            if p.x == 1 {
                (CellType::Obstacle, 3)
            } else {
                (CellType::Playable, 0)
            }
        })
        .unwrap();
        assert_eq!(grid.playable_positions().len(), 6);
        assert_eq!(grid.cells_where(Cell::is_obstacle).count(), 3);

        let pos = Position::new(1, 1);
        assert!(grid.is_obstacle(pos));
        assert!(grid.set_cell(pos, CellType::Playable, 0));
        assert!(!grid.is_obstacle(pos));
        assert_eq!(grid.playable_positions().len(), 7);

        assert!(!grid.set_level(Position::new(9, 9), 1));
        assert!(grid.set_level(pos, 9));
        assert_eq!(grid.cell_at(pos).unwrap().level, MAX_CELL_LEVEL);
    }

    #[test]
    fn test_rows() {
        let grid = Grid::filled(5, 2, CellType::Empty, 0).unwrap();
        let row = grid.row(1).unwrap();
        assert_eq!(row.len(), 5);
        assert_eq!(row[4].position, Position::new(4, 1));
        assert!(grid.row(2).is_none());
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            Grid::filled(0, 3, CellType::Empty, 0),
            Err(GridError::Empty {
                width: 0,
                height: 3
            })
        );
        assert_eq!(
            Grid::new(2, 2, vec![Cell::new(Position::new(0, 0), CellType::Empty, 0)]),
            Err(GridError::CellCount {
                expected: 4,
                actual: 1
            })
        );
        let swapped = vec![
            Cell::new(Position::new(1, 0), CellType::Empty, 0),
            Cell::new(Position::new(0, 0), CellType::Empty, 0),
        ];
        assert!(matches!(
            Grid::new(2, 1, swapped),
            Err(GridError::Misplaced { index: 0, .. })
        ));
        assert!(matches!(
            Grid::filled(1, 1, CellType::Obstacle, 7),
            Err(GridError::Level { level: 7, .. })
        ));
    }
}
