/// Error taxonomy.
///
/// `WorldError` is returned by the editor / lookup entry points of `World`
/// when the caller passes references that do not exist. These indicate corrupt
/// world data or caller misuse, so the simulation never tries to recover from
/// them on its own.
///
/// Expected boundary conditions (tile queries outside the grid, a bonus door
/// pointing at a missing screen) are NOT errors: they degrade to Empty / no-op.

use thiserror::Error;

use crate::domain::geometry::ScreenId;
use crate::domain::registry::{ConveyorId, HazardId};
use crate::domain::sprite::SheetId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("invalid tuning: {0}")]
    Tuning(#[from] ConfigError),

    #[error("unknown screen {0:?}")]
    UnknownScreen(ScreenId),

    #[error("screen {0:?} already exists")]
    DuplicateScreen(ScreenId),

    #[error("unknown hazard definition {0}")]
    UnknownHazard(HazardId),

    #[error("unknown conveyor pair {0}")]
    UnknownConveyor(ConveyorId),

    #[error("conveyor pair {0} already allocated")]
    DuplicateConveyor(ConveyorId),

    #[error("sprite sheet {0:?} is not known to the image provider")]
    UnknownSheet(SheetId),

    #[error("cell ({row}, {col}) is outside the tile grid")]
    OutOfGrid { row: usize, col: usize },

    #[error("no goodie at ({row}, {col}) on screen {screen:?}")]
    NoGoodie { screen: ScreenId, row: usize, col: usize },

    #[error("level diagram has {rows} rows / {cols} columns, grid is 20x32")]
    DiagramTooLarge { rows: usize, cols: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("terminal velocity {0} must be positive and below one tile height")]
    TerminalVelocity(f64),

    #[error("jump velocity {0} must be negative (upward)")]
    JumpVelocity(f64),

    #[error("gravity must be positive (jump {jump}, fall {fall})")]
    Gravity { jump: f64, fall: f64 },

    #[error("fall damage exponent {0} must be greater than 1")]
    DamageExponent(f64),

    #[error("walk speed {0} must be positive and below half a tile")]
    WalkSpeed(f64),

    #[error("conveyor speed {0} must be below one tile width")]
    ConveyorSpeed(u32),

    #[error("max health must be positive")]
    MaxHealth,
}
