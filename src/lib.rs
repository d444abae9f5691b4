/// Tile Runner: deterministic flip-screen platformer simulation.
///
/// Module layout:
///   - `domain`: pure data + rules: tiles, registries, collision queries,
///     character state, sprite motion. No world-level side effects.
///   - `sim`:    the running world: screens, per-tick `step`, respawn
///     search, outbound events, text-diagram screen builder.
///   - `ui`:     collaborators fed by the event stream (sound).
///   - `config`: `config.toml` loader and the immutable `Tuning` context.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
pub mod ui;

pub use config::{GameConfig, Tuning};
pub use error::{ConfigError, WorldError};
pub use sim::world::{Phase, World};

/// Fixed geometry. None of these change at runtime.
pub mod consts {
    /// Tile size in pixels.
    pub const TILE_W: i32 = 20;
    pub const TILE_H: i32 = 20;

    /// Grid dimensions in cells.
    pub const GRID_COLS: usize = 32;
    pub const GRID_ROWS: usize = 20;

    /// Screen size in pixels (grid * tile).
    pub const SCREEN_W: i32 = GRID_COLS as i32 * TILE_W;
    pub const SCREEN_H: i32 = GRID_ROWS as i32 * TILE_H;

    /// The character's bounding box. Always exactly 40x40.
    pub const CHAR_W: i32 = 40;
    pub const CHAR_H: i32 = 40;

    /// Recently visited screens remembered for respawn.
    pub const HISTORY_CAPACITY: usize = 8;

    /// Frames per tile animation loop (hazards, conveyors, collapsibles).
    pub const TILE_ANIM_FRAMES: u8 = 4;
    /// Ticks between tile animation frames.
    pub const TILE_ANIM_TICKS: u32 = 4;
}
