/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// `Tuning` is the immutable context handed to `World::new`: every constant
/// the simulation uses that is not pure geometry lives here.

use serde::Deserialize;
use std::path::PathBuf;

use crate::consts::{TILE_H, TILE_W};
use crate::error::ConfigError;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub demo: DemoConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    // movement
    pub walk_speed: f64,
    pub jump_velocity: f64,
    pub jump_gravity: f64,
    pub fall_gravity: f64,
    pub terminal_velocity: f64,
    pub conveyor_speed: u32,

    // fall damage (jump-landing and fall-landing are tuned separately)
    pub safe_jump_ticks: u32,
    pub safe_fall_ticks: u32,
    pub damage_exponent: f64,

    // powerup decay
    pub powerup_safe_ticks: u32,
    pub powerup_flash_count: u32,
    pub powerup_flash_interval: u32,

    // character lifecycle
    pub max_health: i32,
    pub start_lives: u32,
    pub infinite_lives: bool,
    pub dying_ticks: u32,
    pub grace_ticks: u32,
    pub unjump_ticks: u32,

    // tiles
    pub hazard_explode_ticks: u32,
    pub collapse_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub tick_rate_ms: u64,
    pub ticks: u64,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    movement: TomlMovement,
    #[serde(default)]
    damage: TomlDamage,
    #[serde(default)]
    powerup: TomlPowerup,
    #[serde(default)]
    character: TomlCharacter,
    #[serde(default)]
    tiles: TomlTiles,
    #[serde(default)]
    demo: TomlDemo,
}

#[derive(Deserialize, Debug)]
struct TomlMovement {
    #[serde(default = "default_walk_speed")]
    walk_speed: f64,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f64,
    #[serde(default = "default_jump_gravity")]
    jump_gravity: f64,
    #[serde(default = "default_fall_gravity")]
    fall_gravity: f64,
    #[serde(default = "default_terminal_velocity")]
    terminal_velocity: f64,
    #[serde(default = "default_conveyor_speed")]
    conveyor_speed: u32,
}

#[derive(Deserialize, Debug)]
struct TomlDamage {
    #[serde(default = "default_safe_jump")]
    safe_jump_ticks: u32,
    #[serde(default = "default_safe_fall")]
    safe_fall_ticks: u32,
    #[serde(default = "default_damage_exponent")]
    exponent: f64,
}

#[derive(Deserialize, Debug)]
struct TomlPowerup {
    #[serde(default = "default_powerup_safe")]
    safe_ticks: u32,
    #[serde(default = "default_flash_count")]
    flash_count: u32,
    #[serde(default = "default_flash_interval")]
    flash_interval: u32,
}

#[derive(Deserialize, Debug)]
struct TomlCharacter {
    #[serde(default = "default_max_health")]
    max_health: i32,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default)]
    infinite_lives: bool,
    #[serde(default = "default_dying_ticks")]
    dying_ticks: u32,
    #[serde(default = "default_grace_ticks")]
    grace_ticks: u32,
    #[serde(default = "default_unjump_ticks")]
    unjump_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiles {
    #[serde(default = "default_explode_ticks")]
    hazard_explode_ticks: u32,
    #[serde(default = "default_collapse_ticks")]
    collapse_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlDemo {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_demo_ticks")]
    ticks: u64,
}

// ── Defaults ──

fn default_walk_speed() -> f64 { 4.0 }
fn default_jump_velocity() -> f64 { -11.0 }
fn default_jump_gravity() -> f64 { 0.6 }
fn default_fall_gravity() -> f64 { 1.0 }
fn default_terminal_velocity() -> f64 { 10.0 }
fn default_conveyor_speed() -> u32 { 3 }
fn default_safe_jump() -> u32 { 40 }    // a flat jump lands after ~37 ticks
fn default_safe_fall() -> u32 { 20 }    // ~7 tiles of free fall
fn default_damage_exponent() -> f64 { 1.6 }
fn default_powerup_safe() -> u32 { 400 }
fn default_flash_count() -> u32 { 6 }
fn default_flash_interval() -> u32 { 5 }
fn default_max_health() -> i32 { 100 }
fn default_lives() -> u32 { 5 }
fn default_dying_ticks() -> u32 { 40 }
fn default_grace_ticks() -> u32 { 30 }
fn default_unjump_ticks() -> u32 { 6 }
fn default_explode_ticks() -> u32 { 12 }
fn default_collapse_ticks() -> u32 { 8 }
fn default_tick_rate() -> u64 { 20 }   // 50 Hz
fn default_demo_ticks() -> u64 { 600 }

impl Default for TomlMovement {
    fn default() -> Self {
        TomlMovement {
            walk_speed: default_walk_speed(),
            jump_velocity: default_jump_velocity(),
            jump_gravity: default_jump_gravity(),
            fall_gravity: default_fall_gravity(),
            terminal_velocity: default_terminal_velocity(),
            conveyor_speed: default_conveyor_speed(),
        }
    }
}

impl Default for TomlDamage {
    fn default() -> Self {
        TomlDamage {
            safe_jump_ticks: default_safe_jump(),
            safe_fall_ticks: default_safe_fall(),
            exponent: default_damage_exponent(),
        }
    }
}

impl Default for TomlPowerup {
    fn default() -> Self {
        TomlPowerup {
            safe_ticks: default_powerup_safe(),
            flash_count: default_flash_count(),
            flash_interval: default_flash_interval(),
        }
    }
}

impl Default for TomlCharacter {
    fn default() -> Self {
        TomlCharacter {
            max_health: default_max_health(),
            lives: default_lives(),
            infinite_lives: false,
            dying_ticks: default_dying_ticks(),
            grace_ticks: default_grace_ticks(),
            unjump_ticks: default_unjump_ticks(),
        }
    }
}

impl Default for TomlTiles {
    fn default() -> Self {
        TomlTiles {
            hazard_explode_ticks: default_explode_ticks(),
            collapse_ticks: default_collapse_ticks(),
        }
    }
}

impl Default for TomlDemo {
    fn default() -> Self {
        TomlDemo {
            tick_rate_ms: default_tick_rate(),
            ticks: default_demo_ticks(),
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        GameConfig::from_schema(TomlConfig::default()).tuning
    }
}

// ── Validation ──

impl Tuning {
    /// Reject values that would break collision invariants
    /// (e.g. a terminal velocity large enough to tunnel through a tile).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.terminal_velocity <= 0.0 || self.terminal_velocity >= TILE_H as f64 {
            return Err(ConfigError::TerminalVelocity(self.terminal_velocity));
        }
        if self.jump_velocity >= 0.0 || -self.jump_velocity >= TILE_H as f64 {
            return Err(ConfigError::JumpVelocity(self.jump_velocity));
        }
        if self.jump_gravity <= 0.0 || self.fall_gravity <= 0.0 {
            return Err(ConfigError::Gravity { jump: self.jump_gravity, fall: self.fall_gravity });
        }
        if self.damage_exponent <= 1.0 {
            return Err(ConfigError::DamageExponent(self.damage_exponent));
        }
        if self.walk_speed <= 0.0 || self.walk_speed >= (TILE_W / 2) as f64 {
            return Err(ConfigError::WalkSpeed(self.walk_speed));
        }
        if self.conveyor_speed >= TILE_W as u32 {
            return Err(ConfigError::ConveyorSpeed(self.conveyor_speed));
        }
        if self.max_health <= 0 {
            return Err(ConfigError::MaxHealth);
        }
        Ok(())
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file, missing keys or invalid tuning fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let cfg = Self::from_schema(load_toml(&search_dirs));
        if let Err(e) = cfg.tuning.validate() {
            log::warn!("config.toml tuning rejected: {e}; using default tuning");
            return GameConfig { tuning: Tuning::default(), demo: cfg.demo };
        }
        cfg
    }

    /// Parse a config document. Used by `load` and by tests.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let schema = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::from_schema(schema))
    }

    fn from_schema(toml_cfg: TomlConfig) -> Self {
        GameConfig {
            tuning: Tuning {
                walk_speed: toml_cfg.movement.walk_speed,
                jump_velocity: toml_cfg.movement.jump_velocity,
                jump_gravity: toml_cfg.movement.jump_gravity,
                fall_gravity: toml_cfg.movement.fall_gravity,
                terminal_velocity: toml_cfg.movement.terminal_velocity,
                conveyor_speed: toml_cfg.movement.conveyor_speed,
                safe_jump_ticks: toml_cfg.damage.safe_jump_ticks,
                safe_fall_ticks: toml_cfg.damage.safe_fall_ticks,
                damage_exponent: toml_cfg.damage.exponent,
                powerup_safe_ticks: toml_cfg.powerup.safe_ticks,
                powerup_flash_count: toml_cfg.powerup.flash_count,
                powerup_flash_interval: toml_cfg.powerup.flash_interval,
                max_health: toml_cfg.character.max_health,
                start_lives: toml_cfg.character.lives,
                infinite_lives: toml_cfg.character.infinite_lives,
                dying_ticks: toml_cfg.character.dying_ticks,
                grace_ticks: toml_cfg.character.grace_ticks,
                unjump_ticks: toml_cfg.character.unjump_ticks,
                hazard_explode_ticks: toml_cfg.tiles.hazard_explode_ticks,
                collapse_ticks: toml_cfg.tiles.collapse_ticks,
            },
            demo: DemoConfig {
                tick_rate_ms: toml_cfg.demo.tick_rate_ms,
                ticks: toml_cfg.demo.ticks,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Tuning::default().validate(), Ok(()));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[damage]\nsafe_fall_ticks = 12\n\n[character]\ninfinite_lives = true\n",
        ).unwrap();
        assert_eq!(cfg.tuning.safe_fall_ticks, 12);
        assert_eq!(cfg.tuning.safe_jump_ticks, default_safe_jump());
        assert!(cfg.tuning.infinite_lives);
        assert_eq!(cfg.tuning.walk_speed, default_walk_speed());
        assert_eq!(cfg.demo.ticks, default_demo_ticks());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.tuning, Tuning::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(GameConfig::from_toml_str("[movement]\nwalk_speed = \"fast\"").is_err());
    }

    #[test]
    fn terminal_velocity_must_stay_below_a_tile() {
        let mut t = Tuning::default();
        t.terminal_velocity = TILE_H as f64;
        assert!(matches!(t.validate(), Err(ConfigError::TerminalVelocity(_))));
    }

    #[test]
    fn linear_damage_is_rejected() {
        let mut t = Tuning::default();
        t.damage_exponent = 1.0;
        assert!(matches!(t.validate(), Err(ConfigError::DamageExponent(_))));
    }
}
