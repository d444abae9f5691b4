/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Active screen animation (tiles, sprites)
///   2. Dying countdown → life loss → respawn       (ends the tick)
///   3. Grace period after a respawn                 (ends the tick)
///   4. Powerup decay
///   5. Movement: input, sides, gravity, ceiling, landing, conveyor
///   6. Screen edges (transition, clamp or out-of-world)
///   7. Hazards under the 2×2 effective cells
///   8. Sprite contacts (harmful, drain, exit door, bonus door)
///   9. Goodie pickup
///
/// A death at any stage ends the tick; everything freezes until the death
/// animation has played.

use crate::consts::{CHAR_H, CHAR_W, SCREEN_H, SCREEN_W, TILE_H};
use crate::domain::character::{fall_damage, Character, Hurt, CHARACTER_SHEET};
use crate::domain::entity::{DamageCause, FrameInput, Lives, PowerupTick};
use crate::domain::geometry::{effective_cells, quadrant_cells, Edge, ScreenId};
use crate::domain::physics::{self, Ceiling, GroundState};
use crate::domain::registry::{DeathAnim, GoodieEffect, PlayMode, Rotation, SoundEffect};
use crate::domain::sprite::{pixels_collide, Placed, SpriteKind};
use crate::domain::tile::Tile;

use super::event::GameEvent;
use super::respawn;
use super::screen::CameFrom;
use super::world::{Phase, World};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut World, input: FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if world.character.is_dying() {
        resolve_dying(world, &mut events);
        return events;
    }

    animate_active_screen(world);

    if world.character.grace_ticks > 0 {
        world.character.grace_ticks -= 1;
        return events;
    }

    resolve_powerup(world, &mut events);
    if let Some((anim, cause)) = resolve_movement(world, input, &mut events) {
        kill(world, anim, cause, &mut events);
        return events;
    }
    resolve_screen_edges(world, &mut events);
    if world.character.is_dying() { return events; }
    resolve_hazards(world, &mut events);
    if world.character.is_dying() { return events; }
    resolve_sprite_contacts(world, &mut events);
    if world.character.is_dying() || world.phase != Phase::Playing { return events; }
    resolve_goodies(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn sound(events: &mut Vec<GameEvent>, effect: SoundEffect) {
    events.push(GameEvent::Sound { effect, mode: PlayMode::Once });
}

/// Switch the conveyor the character rides, starting / stopping the belt loop.
fn set_conveyor(c: &mut Character, rotation: Option<Rotation>, events: &mut Vec<GameEvent>) {
    if c.conveyor == rotation { return; }
    if c.conveyor.is_some() {
        events.push(GameEvent::StopSound { effect: SoundEffect::Conveyor });
    }
    if rotation.is_some() {
        events.push(GameEvent::Sound { effect: SoundEffect::Conveyor, mode: PlayMode::Loop });
    }
    c.conveyor = rotation;
}

pub(crate) fn kill(world: &mut World, anim: DeathAnim, cause: DamageCause, events: &mut Vec<GameEvent>) {
    let c = &mut world.character;
    if c.is_dying() { return; }
    set_conveyor(c, None, events);
    c.begin_dying(anim);
    log::info!("character killed on {:?} ({cause:?}) at tick {}", c.screen, world.tick);
    sound(events, SoundEffect::Die);
    events.push(GameEvent::CharacterKilled { anim, cause });
}

/// Move the character onto screen `to` at (x, y): the screen resets, its
/// non-persistent goodies return and the entry is recorded as `came_from`.
pub(crate) fn enter_screen(world: &mut World, to: ScreenId, x: f64, y: f64, events: &mut Vec<GameEvent>) {
    let c = &mut world.character;
    let from = c.screen;
    if from != to {
        c.history.push(from);
    }
    c.screen = to;
    c.x = x;
    c.y = y;
    c.prev_y = y;
    c.was_grounded = false;
    let momentum = c.momentum();

    for g in world.goodies.iter_mut().filter(|g| g.screen == to) {
        g.reset();
    }
    if let Some(screen) = world.screens.get_mut(&to) {
        screen.reset();
        screen.came_from = Some(CameFrom { x, y, momentum });
    }
    log::debug!("screen {from:?} -> {to:?} at ({x:.1}, {y:.1})");
    events.push(GameEvent::ScreenChanged { from, to });
}

fn animate_active_screen(world: &mut World) {
    if let Some(screen) = world.screens.get_mut(&world.character.screen) {
        screen.tick();
    }
}

// ══════════════════════════════════════════════════════════════
// Death and respawn
// ══════════════════════════════════════════════════════════════

fn resolve_dying(world: &mut World, events: &mut Vec<GameEvent>) {
    if !world.character.advance_dying(world.tuning.dying_ticks) { return; }

    let game_over = world.character.lose_life();
    let remaining = match world.character.lives {
        Lives::Finite(n) => Some(n),
        Lives::Infinite => None,
    };
    events.push(GameEvent::LifeLost { remaining });

    if game_over {
        world.phase = Phase::Lost;
        log::info!("game over at tick {} with score {}", world.tick, world.score);
        sound(events, SoundEffect::Lose);
        events.push(GameEvent::GameLost);
        return;
    }

    let choice = respawn::choose_respawn(world);
    respawn::apply_respawn(world, &choice);
    if world.character.conveyor.is_some() {
        events.push(GameEvent::Sound { effect: SoundEffect::Conveyor, mode: PlayMode::Loop });
    }
    events.push(GameEvent::Respawned { screen: choice.screen, source: choice.source });
}

fn resolve_powerup(world: &mut World, events: &mut Vec<GameEvent>) {
    let Some(kind) = world.character.powerup.map(|p| p.kind) else { return };
    match world.character.tick_powerup(&world.tuning) {
        Some(PowerupTick::Flash { warn: true }) => sound(events, SoundEffect::PowerupWarning),
        Some(PowerupTick::Expired) => events.push(GameEvent::PowerupExpired { kind }),
        _ => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

/// Integrate one tick of movement. Returns the death to apply if the
/// landing was fatal.
fn resolve_movement(
    world: &mut World,
    input: FrameInput,
    events: &mut Vec<GameEvent>,
) -> Option<(DeathAnim, DamageCause)> {
    let World { screens, character: c, tuning: t, .. } = world;
    let screen = screens.get_mut(&c.screen)?;

    c.prev_y = c.y;
    c.tick_unjump();

    let grounded = physics::resolve_ground(&screen.grid, c.x, c.y, c.vy, c.y, c.conveyor).is_grounded();
    if grounded {
        c.vx = match input.movement {
            Some(dir) => {
                c.facing = dir;
                dir.sign() * t.walk_speed
            }
            None => 0.0,
        };
        if input.jump {
            c.vy = t.jump_velocity;
            c.set_jumping(true);
            events.push(GameEvent::Jumped);
            sound(events, SoundEffect::Jump);
        }
    }
    c.advance_walk(grounded && c.vx != 0.0);

    // Horizontal
    let (nx, blocked) = physics::move_horizontal(&screen.grid, c.x, c.y, c.vx);
    c.x = nx;
    if blocked { c.vx = 0.0; }

    // Vertical
    if !grounded || c.vy < 0.0 {
        let ny = c.y + c.vy;
        if c.vy < 0.0 {
            match physics::solid_to_up(&screen.grid, c.x, ny) {
                Ceiling::Clear => c.y = ny,
                Ceiling::Recenter(x) => {
                    c.x = x;
                    c.y = ny;
                }
                Ceiling::Blocked { row } => {
                    c.y = ((row + 1) * TILE_H) as f64;
                    c.vy = -c.vy;
                }
            }
        } else {
            c.y = ny;
        }
        let gravity = if c.is_jumping() { t.jump_gravity } else { t.fall_gravity };
        c.vy = (c.vy + gravity).min(t.terminal_velocity);
        c.airborne_ticks += 1;
    }

    // Landing
    match physics::resolve_ground(&screen.grid, c.x, c.y, c.vy, c.prev_y, c.conveyor) {
        GroundState::Grounded { penetration, conveyor, collapsibles } => {
            c.y = c.y.floor() - penetration as f64;
            c.vy = 0.0;
            if !c.was_grounded {
                c.was_grounded = true;
                let ticks = c.airborne_ticks;
                let from_jump = c.is_jumping();
                let threshold = if from_jump { t.safe_jump_ticks } else { t.safe_fall_ticks };
                let damage = fall_damage(ticks, threshold, t.damage_exponent);
                c.airborne_ticks = 0;
                if from_jump {
                    c.begin_unjump(t.unjump_ticks);
                }
                if ticks > 0 {
                    sound(events, SoundEffect::Land);
                    events.push(GameEvent::Landed { airborne_ticks: ticks, damage });
                }
                if damage > 0 && c.hurt(damage, DamageCause::Fall) == Hurt::Died {
                    return Some((DeathAnim::Splat, DamageCause::Fall));
                }
                screen.last_on_ground = Some((c.x, c.y));
            }

            set_conveyor(c, conveyor.map(|r| r.rotation), events);
            for (row, col) in collapsibles {
                if screen.grid.trigger_collapse(row, col, t.collapse_ticks) {
                    events.push(GameEvent::CollapsibleTriggered { row, col });
                }
            }
            if let Some(rotation) = c.conveyor {
                c.x += physics::conveyor_displacement(&screen.grid, c.x, c.y, rotation, t.conveyor_speed);
            }
        }
        GroundState::Rising | GroundState::Airborne => {
            c.was_grounded = false;
            set_conveyor(c, None, events);
        }
    }
    None
}

// ══════════════════════════════════════════════════════════════
// Screen edges
// ══════════════════════════════════════════════════════════════

fn resolve_screen_edges(world: &mut World, events: &mut Vec<GameEvent>) {
    let max_x = (SCREEN_W - CHAR_W) as f64;
    let max_y = (SCREEN_H - CHAR_H) as f64;
    let c = &world.character;
    let edge = if c.x < 0.0 {
        Edge::Left
    } else if c.x > max_x {
        Edge::Right
    } else if c.y < 0.0 {
        Edge::Top
    } else if c.y > max_y {
        Edge::Bottom
    } else {
        return;
    };

    let to = c.screen.neighbour(edge);
    if world.screens.contains_key(&to) {
        let (x, y) = match edge {
            Edge::Left => (c.x + max_x, c.y),
            Edge::Right => (c.x - max_x, c.y),
            Edge::Top => (c.x, c.y + max_y),
            Edge::Bottom => (c.x, c.y - max_y),
        };
        enter_screen(world, to, x, y, events);
        return;
    }

    let c = &mut world.character;
    match edge {
        Edge::Left => {
            c.x = 0.0;
            c.vx = 0.0;
        }
        Edge::Right => {
            c.x = max_x;
            c.vx = 0.0;
        }
        Edge::Top => {
            c.y = 0.0;
            c.vy = c.vy.max(0.0);
        }
        Edge::Bottom => {
            log::debug!("fell off the bottom of {:?}", c.screen);
            kill(world, DeathAnim::Collapse, DamageCause::OutOfWorld, events);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Hazards
// ══════════════════════════════════════════════════════════════

fn resolve_hazards(world: &mut World, events: &mut Vec<GameEvent>) {
    let World { screens, character: c, hazards, tuning: t, .. } = world;
    let Some(screen) = screens.get_mut(&c.screen) else { return };

    let mut lethal = None;
    for (row, col) in effective_cells(c.x, c.y) {
        let tile = screen.grid.tile_at_cell(row, col);
        if !tile.is_armed_hazard() { continue; }
        let Tile::Hazard { def, .. } = tile else { continue };
        let Some(def) = hazards.get(def).copied() else {
            debug_assert!(false, "hazard tile references unknown definition {def}");
            continue;
        };

        let kills = !def.harmless && !c.is_immune(DamageCause::Hazard);
        if def.explodes {
            screen.grid.explode_hazard(row, col, t.hazard_explode_ticks);
            sound(events, SoundEffect::Explode);
        }
        if def.explodes || kills {
            events.push(GameEvent::HazardTriggered { row, col, exploded: def.explodes });
        }
        if kills && lethal.is_none() {
            lethal = Some(def.death_anim);
        }
    }

    if let Some(anim) = lethal {
        kill(world, anim, DamageCause::Hazard, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Sprites
// ══════════════════════════════════════════════════════════════

enum Contact {
    Harm,
    Drain(u32),
    Exit,
    Door(ScreenId),
}

fn resolve_sprite_contacts(world: &mut World, events: &mut Vec<GameEvent>) {
    let c = &world.character;
    let Some(screen) = world.screens.get(&c.screen) else { return };
    let me = Placed { sheet: CHARACTER_SHEET, bbox: c.bbox(), clip: c.clip() };

    let contacts: Vec<Contact> = screen
        .sprites
        .iter()
        .filter(|s| s.visible && s.kind != SpriteKind::Scenery && s.bbox().intersects(&me.bbox))
        .filter(|s| pixels_collide(world.metrics.as_ref(), &me, &s.placed()))
        .filter_map(|s| match s.kind {
            SpriteKind::Harmful => Some(Contact::Harm),
            SpriteKind::Drain { per_tick } => Some(Contact::Drain(per_tick)),
            SpriteKind::ExitDoor => Some(Contact::Exit),
            SpriteKind::BonusDoor { target } => Some(Contact::Door(target)),
            SpriteKind::Scenery => None,
        })
        .collect();

    for contact in contacts {
        match contact {
            Contact::Harm => {
                if !world.character.is_immune(DamageCause::Sprite) {
                    kill(world, DeathAnim::Zap, DamageCause::Sprite, events);
                    return;
                }
            }
            Contact::Drain(amount) => {
                if world.character.hurt(amount, DamageCause::Drain) == Hurt::Died {
                    kill(world, DeathAnim::Collapse, DamageCause::Drain, events);
                    return;
                }
            }
            Contact::Exit => {
                if world.character.keys >= world.keys_required() {
                    win(world, events);
                    return;
                }
            }
            Contact::Door(target) => {
                if take_bonus_door(world, target, events) {
                    return;
                }
            }
        }
    }
}

fn win(world: &mut World, events: &mut Vec<GameEvent>) {
    world.phase = Phase::Won;
    set_conveyor(&mut world.character, None, events);
    log::info!("game won at tick {} with score {}", world.tick, world.score);
    sound(events, SoundEffect::Win);
    events.push(GameEvent::GameWon);
}

/// Transfer to `target`'s start tile. A door to a missing screen stays shut.
fn take_bonus_door(world: &mut World, target: ScreenId, events: &mut Vec<GameEvent>) -> bool {
    let Some((x, y)) = world.screens.get(&target).map(|s| s.start_point()) else {
        log::warn!(
            "bonus door on {:?} leads to missing screen {:?}",
            world.character.screen, target
        );
        return false;
    };
    let c = &mut world.character;
    c.vx = 0.0;
    c.vy = 0.0;
    c.set_jumping(false);
    c.airborne_ticks = 0;
    set_conveyor(c, None, events);
    sound(events, SoundEffect::Teleport);
    enter_screen(world, target, x, y, events);
    true
}

// ══════════════════════════════════════════════════════════════
// Goodies
// ══════════════════════════════════════════════════════════════

fn resolve_goodies(world: &mut World, events: &mut Vec<GameEvent>) {
    let screen = world.character.screen;
    for (row, col) in quadrant_cells(world.character.x, world.character.y) {
        if row < 0 || col < 0 { continue; }
        let (row, col) = (row as usize, col as usize);
        let Some(goodie) = world
            .goodies
            .iter_mut()
            .find(|g| g.screen == screen && g.row == row && g.col == col && g.is_available())
        else {
            continue;
        };
        goodie.collect();
        let kind = goodie.kind;

        let delta = kind.score() * world.character.score_multiplier();
        if delta > 0 {
            world.score += delta;
            events.push(GameEvent::ScoreChanged { delta, total: world.score });
        }

        match kind.effect() {
            GoodieEffect::None => {}
            GoodieEffect::Key => world.character.keys += 1,
            GoodieEffect::Heal(amount) => world.character.heal(amount),
            GoodieEffect::ExtraLife => world.character.add_life(),
            GoodieEffect::Powerup(p) => {
                world.character.grant_powerup(p, &world.tuning);
                events.push(GameEvent::PowerupGranted { kind: p });
            }
        }
        sound(events, kind.sound());
        events.push(GameEvent::GoodieCollected { kind, row, col });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
