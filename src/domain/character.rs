/// The player character: sub-pixel position, velocity, health and lives,
/// the jumping / unjumping / dying flags and the active powerup.
///
/// The character is built once per session and reset in place on respawn,
/// never recreated. Movement integration lives in `sim::step`; this module
/// owns the state rules that do not need the world.

use crate::config::Tuning;
use crate::consts::{CHAR_H, CHAR_W};

use super::entity::{DamageCause, Facing, Lives, Powerup, PowerupKind, PowerupTick};
use super::geometry::{PixelRect, ScreenId, FIRST_SCREEN};
use super::history::ScreenHistory;
use super::registry::{DeathAnim, Rotation};
use super::sprite::SheetId;

/// Sheet holding the character's 40×40 frames: one row per facing.
pub const CHARACTER_SHEET: SheetId = SheetId(0);

const WALK_FRAMES: i32 = 4;
const WALK_ANIM_TICKS: u32 = 3;

/// Fall damage for `ticks` spent airborne: zero up to `threshold`, then
/// `floor((ticks - threshold) ^ exponent)`. With exponent > 1 this grows
/// faster than linearly, so long falls are disproportionately punishing.
pub fn fall_damage(ticks: u32, threshold: u32, exponent: f64) -> u32 {
    if ticks <= threshold {
        return 0;
    }
    let over = (ticks - threshold) as f64;
    over.powf(exponent).floor().min(u32::MAX as f64) as u32
}

/// Velocity and movement flags saved with a `cameFrom` snapshot.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Momentum {
    pub vx: f64,
    pub vy: f64,
    pub jumping: bool,
    pub conveyor: Option<Rotation>,
}

/// Outcome of `Character::hurt`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Hurt {
    /// An active powerup absorbed it.
    Blocked,
    Survived,
    /// Health dropped below zero.
    Died,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Dying {
    anim: DeathAnim,
    elapsed: u32,
}

#[derive(Clone, Debug)]
pub struct Character {
    pub x: f64,
    pub y: f64,
    /// y at the start of the current tick; thru tiles need it.
    pub prev_y: f64,
    pub vx: f64,
    pub vy: f64,
    pub health: i32,
    max_health: i32,
    pub lives: Lives,
    jumping: bool,
    unjumping: bool,
    unjump_left: u32,
    dying: Option<Dying>,
    pub conveyor: Option<Rotation>,
    pub powerup: Option<Powerup>,
    pub screen: ScreenId,
    pub history: ScreenHistory,
    pub airborne_ticks: u32,
    pub was_grounded: bool,
    pub grace_ticks: u32,
    pub facing: Facing,
    pub keys: u32,
    walk_frame: i32,
    walk_clock: u32,
}

impl Character {
    pub fn new(tuning: &Tuning) -> Self {
        Character {
            x: 0.0,
            y: 0.0,
            prev_y: 0.0,
            vx: 0.0,
            vy: 0.0,
            health: tuning.max_health,
            max_health: tuning.max_health,
            lives: if tuning.infinite_lives {
                Lives::Infinite
            } else {
                Lives::Finite(tuning.start_lives)
            },
            jumping: false,
            unjumping: false,
            unjump_left: 0,
            dying: None,
            conveyor: None,
            powerup: None,
            screen: FIRST_SCREEN,
            history: ScreenHistory::new(),
            airborne_ticks: 0,
            was_grounded: false,
            grace_ticks: 0,
            facing: Facing::Right,
            keys: 0,
            walk_frame: 0,
            walk_clock: 0,
        }
    }

    // ── Flags ──

    pub fn is_jumping(&self) -> bool { self.jumping }

    pub fn is_unjumping(&self) -> bool { self.unjumping }

    pub fn is_dying(&self) -> bool { self.dying.is_some() }

    pub fn death_anim(&self) -> Option<DeathAnim> {
        self.dying.map(|d| d.anim)
    }

    /// Frozen and drawn highlighted right after a respawn.
    pub fn is_highlighted(&self) -> bool { self.grace_ticks > 0 }

    pub fn max_health(&self) -> i32 { self.max_health }

    /// Setting `jumping` always clears `unjumping`.
    pub fn set_jumping(&mut self, jumping: bool) {
        self.jumping = jumping;
        if jumping {
            self.unjumping = false;
            self.unjump_left = 0;
        }
    }

    /// Landed from a jump: hold off re-jumping for `ticks`.
    pub fn begin_unjump(&mut self, ticks: u32) {
        self.jumping = false;
        self.unjumping = ticks > 0;
        self.unjump_left = ticks;
    }

    pub fn tick_unjump(&mut self) {
        if self.unjumping {
            self.unjump_left = self.unjump_left.saturating_sub(1);
            if self.unjump_left == 0 {
                self.unjumping = false;
            }
        }
    }

    // ── Damage and death ──

    pub fn is_immune(&self, cause: DamageCause) -> bool {
        let Some(p) = self.powerup else { return false };
        match (p.kind, cause) {
            (_, DamageCause::Forced | DamageCause::OutOfWorld) => false,
            (PowerupKind::Wings, DamageCause::Fall) => true,
            (PowerupKind::Shield, DamageCause::Fall) => false,
            (PowerupKind::Shield, _) => true,
            _ => false,
        }
    }

    pub fn hurt(&mut self, amount: u32, cause: DamageCause) -> Hurt {
        if self.is_immune(cause) {
            return Hurt::Blocked;
        }
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.health = self.health.saturating_sub(amount);
        if self.health < 0 { Hurt::Died } else { Hurt::Survived }
    }

    /// Enter the dying state: everything freezes while `anim` plays.
    pub fn begin_dying(&mut self, anim: DeathAnim) {
        debug_assert!(self.dying.is_none(), "already dying");
        self.dying = Some(Dying { anim, elapsed: 0 });
        self.vx = 0.0;
        self.vy = 0.0;
        self.powerup = None;
        self.conveyor = None;
        self.jumping = false;
        self.unjumping = false;
    }

    /// Advance the death animation. True once `length` ticks have passed.
    pub fn advance_dying(&mut self, length: u32) -> bool {
        match &mut self.dying {
            Some(d) => {
                d.elapsed += 1;
                d.elapsed >= length
            }
            None => false,
        }
    }

    /// Spend a life. Returns true on game over.
    pub fn lose_life(&mut self) -> bool {
        match &mut self.lives {
            Lives::Infinite => false,
            Lives::Finite(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
        }
    }

    pub fn add_life(&mut self) {
        if let Lives::Finite(n) = &mut self.lives {
            *n = n.saturating_add(1);
        }
    }

    pub fn heal(&mut self, amount: u32) {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    // ── Powerups ──

    /// A new powerup replaces whatever was active.
    pub fn grant_powerup(&mut self, kind: PowerupKind, tuning: &Tuning) {
        self.powerup = Some(Powerup::new(kind, tuning.powerup_safe_ticks));
    }

    pub fn tick_powerup(&mut self, tuning: &Tuning) -> Option<PowerupTick> {
        let p = self.powerup.as_mut()?;
        let t = p.tick(tuning.powerup_flash_count, tuning.powerup_flash_interval);
        if t == PowerupTick::Expired {
            self.powerup = None;
        }
        Some(t)
    }

    pub fn score_multiplier(&self) -> u64 {
        match self.powerup {
            Some(Powerup { kind: PowerupKind::ScoreMultiplier(m), .. }) => m.max(1) as u64,
            _ => 1,
        }
    }

    // ── Respawn ──

    pub fn momentum(&self) -> Momentum {
        Momentum { vx: self.vx, vy: self.vy, jumping: self.jumping, conveyor: self.conveyor }
    }

    /// Reset in place at (x, y). `momentum` restores a saved entry velocity;
    /// `None` starts from rest.
    pub fn respawn(&mut self, x: f64, y: f64, momentum: Option<Momentum>, tuning: &Tuning) {
        let m = momentum.unwrap_or_default();
        self.x = x;
        self.y = y;
        self.prev_y = y;
        self.vx = m.vx;
        self.vy = m.vy;
        self.conveyor = m.conveyor;
        self.unjumping = false;
        self.unjump_left = 0;
        self.set_jumping(m.jumping);
        self.health = self.max_health;
        self.dying = None;
        self.grace_ticks = tuning.grace_ticks;
        self.airborne_ticks = 0;
        self.was_grounded = false;
        self.walk_frame = 0;
        self.walk_clock = 0;
    }

    // ── Geometry and animation ──

    pub fn bbox(&self) -> PixelRect {
        PixelRect::character_at(self.x, self.y)
    }

    /// Current frame within `CHARACTER_SHEET`.
    pub fn clip(&self) -> PixelRect {
        let row = match self.facing {
            Facing::Right => 0,
            Facing::Left => 1,
        };
        PixelRect::new(self.walk_frame * CHAR_W, row * CHAR_H, CHAR_W, CHAR_H)
    }

    pub fn advance_walk(&mut self, walking: bool) {
        if !walking {
            self.walk_frame = 0;
            self.walk_clock = 0;
            return;
        }
        self.walk_clock += 1;
        if self.walk_clock >= WALK_ANIM_TICKS {
            self.walk_clock = 0;
            self.walk_frame = (self.walk_frame + 1) % WALK_FRAMES;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn character() -> Character {
        Character::new(&Tuning::default())
    }

    #[test]
    fn jumping_clears_unjumping() {
        let mut c = character();
        c.begin_unjump(3);
        assert!(c.is_unjumping());
        assert!(!c.is_jumping());
        c.set_jumping(true);
        assert!(c.is_jumping());
        assert!(!c.is_unjumping());
    }

    #[test]
    fn unjump_runs_out() {
        let mut c = character();
        c.begin_unjump(2);
        c.tick_unjump();
        assert!(c.is_unjumping());
        c.tick_unjump();
        assert!(!c.is_unjumping());
    }

    #[test]
    fn shield_blocks_sprite_damage() {
        let t = Tuning::default();
        let mut c = character();
        c.health = 5;
        c.grant_powerup(PowerupKind::Shield, &t);
        assert_eq!(c.hurt(10, DamageCause::Sprite), Hurt::Blocked);
        assert_eq!(c.health, 5);
        // but not a fall
        assert_eq!(c.hurt(10, DamageCause::Fall), Hurt::Died);
    }

    #[test]
    fn wings_block_only_falls() {
        let t = Tuning::default();
        let mut c = character();
        c.grant_powerup(PowerupKind::Wings, &t);
        assert!(c.is_immune(DamageCause::Fall));
        assert!(!c.is_immune(DamageCause::Hazard));
        assert!(!c.is_immune(DamageCause::OutOfWorld));
    }

    #[test]
    fn health_zero_is_alive_below_zero_is_dead() {
        let mut c = character();
        c.health = 10;
        assert_eq!(c.hurt(10, DamageCause::Drain), Hurt::Survived);
        assert_eq!(c.health, 0);
        assert_eq!(c.hurt(1, DamageCause::Drain), Hurt::Died);
    }

    #[test]
    fn dying_freezes_and_clears_powerup() {
        let t = Tuning::default();
        let mut c = character();
        c.vx = 3.0;
        c.vy = 5.0;
        c.grant_powerup(PowerupKind::Shield, &t);
        c.begin_dying(DeathAnim::Burn);
        assert!(c.is_dying());
        assert_eq!((c.vx, c.vy), (0.0, 0.0));
        assert!(c.powerup.is_none());
        assert!(!c.advance_dying(2));
        assert!(c.advance_dying(2));
    }

    #[test]
    fn lives_count_down_to_game_over() {
        let mut c = character();
        c.lives = Lives::Finite(2);
        assert!(!c.lose_life());
        assert!(c.lose_life());
        c.lives = Lives::Infinite;
        for _ in 0..10 {
            assert!(!c.lose_life());
        }
        c.add_life();
        assert_eq!(c.lives, Lives::Infinite);
    }

    #[test]
    fn respawn_restores_health_and_starts_grace() {
        let t = Tuning::default();
        let mut c = character();
        c.health = -3;
        c.begin_dying(DeathAnim::Splat);
        let m = Momentum { vx: 2.0, vy: -4.0, jumping: true, conveyor: None };
        c.respawn(100.0, 60.0, Some(m), &t);
        assert_eq!(c.health, t.max_health);
        assert!(!c.is_dying());
        assert!(c.is_highlighted());
        assert!(c.is_jumping());
        assert_eq!((c.x, c.y, c.vx, c.vy), (100.0, 60.0, 2.0, -4.0));
    }

    #[test]
    fn heal_is_capped() {
        let mut c = character();
        c.health = c.max_health() - 5;
        c.heal(50);
        assert_eq!(c.health, c.max_health());
    }

    #[test]
    fn clip_row_follows_facing() {
        let mut c = character();
        assert_eq!(c.clip(), PixelRect::new(0, 0, 40, 40));
        c.facing = Facing::Left;
        for _ in 0..WALK_ANIM_TICKS {
            c.advance_walk(true);
        }
        assert_eq!(c.clip(), PixelRect::new(40, 40, 40, 40));
        c.advance_walk(false);
        assert_eq!(c.clip().x, 0);
    }

    #[test]
    fn fall_damage_threshold() {
        assert_eq!(fall_damage(20, 20, 1.6), 0);
        assert_eq!(fall_damage(21, 20, 1.6), 1);
        assert_eq!(fall_damage(24, 20, 2.0), 16);
    }

    #[test]
    fn fall_damage_grows_faster_than_linear() {
        let t = Tuning::default();
        let th = t.safe_fall_ticks;
        let e = t.damage_exponent;
        assert!(fall_damage(th + 10, th, e) > 2 * fall_damage(th + 5, th, e));
        assert!(fall_damage(th + 40, th, e) > 4 * fall_damage(th + 10, th, e));
    }

    proptest! {
        #[test]
        fn fall_damage_is_monotone(t in 0u32..500, th in 0u32..60, e in 1.01f64..3.0) {
            prop_assert!(fall_damage(t + 1, th, e) >= fall_damage(t, th, e));
        }

        #[test]
        fn fall_damage_is_superlinear(k in 1u32..100, th in 0u32..60, e in 1.01f64..3.0) {
            prop_assert!(fall_damage(th + 2 * k, th, e) >= 2 * fall_damage(th + k, th, e));
        }
    }
}
