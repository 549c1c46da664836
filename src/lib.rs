//! Grid Arcade - three turn-free arcade games on a contribution-style grid
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, lifecycle, snake/breakout/tanks engines)
//! - `arcade`: Closed set of engines behind one `Game` implementation
//! - `settings`: Data-driven speed/seed configuration

pub mod arcade;
pub mod settings;
pub mod sim;

pub use arcade::{AnyGame, ScoreReport};
pub use settings::{Settings, SettingsError, SpeedPreset};

/// Game configuration constants
pub mod consts {
    /// Largest frame delta (ms) the lifecycle wrapper will feed an engine
    pub const MAX_FRAME_DELTA_MS: f64 = 250.0;

    /// Highest cell intensity / obstacle durability
    pub const MAX_CELL_LEVEL: u8 = 4;

    /// Multiplier used for touch devices (slower stepping)
    pub const RELAXED_SPEED_MULTIPLIER: f64 = 1.5;
}

/// Wrap a coordinate onto `[0, max)` after a single unit step
///
/// Values below zero land on `max - 1`, values at or past `max` land on zero.
#[inline]
pub fn wrap_coordinate(value: i32, max: i32) -> i32 {
    if value < 0 {
        max - 1
    } else if value >= max {
        0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_coordinate() {
        assert_eq!(wrap_coordinate(-1, 5), 4);
        assert_eq!(wrap_coordinate(5, 5), 0);
        assert_eq!(wrap_coordinate(3, 5), 3);
        assert_eq!(wrap_coordinate(0, 1), 0);
    }
}
