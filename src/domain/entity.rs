/// Small value types shared by the character and the world: input, facing,
/// lives, damage causes and the powerup decay state machine.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Frame input: held horizontal direction plus the jump button.
/// Jump is level-triggered; it only has an effect while grounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub movement: Option<Facing>,
    pub jump: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lives {
    Finite(u32),
    Infinite,
}

/// Why the character is being hurt. Immunity rules key off this.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DamageCause {
    /// Landing after too long in the air.
    Fall,
    Hazard,
    Sprite,
    Drain,
    /// Ignores every immunity (scripted kills).
    Forced,
    /// Dropped off the bottom of a screen with nothing beneath it.
    OutOfWorld,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerupKind {
    /// Immune to everything except falling.
    Shield,
    /// Immune to fall damage.
    Wings,
    ScoreMultiplier(u32),
}

/// Powerup lifecycle.
///
///   Active(remaining) ──0──▶ Warning(flashing) ──0──▶ Expired
///
/// During Warning the powerup is still in effect; visibility toggles every
/// `interval` ticks so the holder can see it running out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerupDecay {
    Active { remaining: u32 },
    Warning { toggles_left: u32, interval_left: u32, visible: bool },
    Expired,
}

/// What one decay tick produced.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerupTick {
    Quiet,
    /// Visibility toggled. `warn` is set on every other flash, the ones
    /// that should play the warning sound.
    Flash { warn: bool },
    Expired,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Powerup {
    pub kind: PowerupKind,
    pub decay: PowerupDecay,
}

impl Powerup {
    pub fn new(kind: PowerupKind, safe_ticks: u32) -> Self {
        Powerup { kind, decay: PowerupDecay::Active { remaining: safe_ticks } }
    }

    /// False only during the "off" half of a warning flash.
    pub fn is_visible(&self) -> bool {
        match self.decay {
            PowerupDecay::Warning { visible, .. } => visible,
            PowerupDecay::Active { .. } => true,
            PowerupDecay::Expired => false,
        }
    }

    pub fn tick(&mut self, flash_count: u32, flash_interval: u32) -> PowerupTick {
        let interval = flash_interval.max(1);
        match self.decay {
            PowerupDecay::Active { remaining } if remaining > 1 => {
                self.decay = PowerupDecay::Active { remaining: remaining - 1 };
                PowerupTick::Quiet
            }
            PowerupDecay::Active { .. } => {
                if flash_count == 0 {
                    self.decay = PowerupDecay::Expired;
                    return PowerupTick::Expired;
                }
                self.decay = PowerupDecay::Warning {
                    toggles_left: flash_count * 2,
                    interval_left: interval,
                    visible: true,
                };
                PowerupTick::Quiet
            }
            PowerupDecay::Warning { toggles_left, interval_left, visible } => {
                if interval_left > 1 {
                    self.decay = PowerupDecay::Warning {
                        toggles_left,
                        interval_left: interval_left - 1,
                        visible,
                    };
                    return PowerupTick::Quiet;
                }
                if toggles_left <= 1 {
                    self.decay = PowerupDecay::Expired;
                    return PowerupTick::Expired;
                }
                self.decay = PowerupDecay::Warning {
                    toggles_left: toggles_left - 1,
                    interval_left: interval,
                    visible: !visible,
                };
                // Going invisible is the start of a flash
                PowerupTick::Flash { warn: visible }
            }
            PowerupDecay::Expired => PowerupTick::Expired,
        }
    }
}
