/// Text-diagram screen builder and the built-in demo world.
///
/// A diagram is up to 20 lines of up to 32 characters, one per grid cell.
/// Short lines and missing rows are empty. Everything goes through the
/// `World` editor entry points, so references are validated the same way
/// an editor's would be.
///
/// ## Legend
///   ' ' '.' = Empty        '#' = Solid          '=' = Thru
///   '%' = Scenic           '~' = Collapsible    'S' = Character start
///   '^' = Spikes           '!' = Mine           '*' = Firework (harmless)
///   '>' = Belt clockwise   '<' = Belt anti-clockwise
///   '$' = Coin   'G' = Gem   'K' = Key   '+' = Medkit   'L' = Extra life
///   'O' = Shield 'W' = Wings 'X' = Triple score

use crate::config::Tuning;
use crate::consts::{GRID_COLS, GRID_ROWS};
use crate::domain::character::CHARACTER_SHEET;
use crate::domain::geometry::{PixelRect, ScreenId, FIRST_SCREEN};
use crate::domain::registry::{
    ConveyorId, ConveyorRef, DeathAnim, GoodieKind, HazardDef, HazardId, Rotation,
};
use crate::domain::sprite::{AlphaMask, AnimSpeed, AnimType, MaskLibrary, SheetId, Sprite, SpriteKind};
use crate::error::WorldError;

use super::world::{TileSpec, World};

pub const SPIKES: HazardId = 1;
pub const MINE: HazardId = 2;
pub const FIREWORK: HazardId = 3;
pub const BELT: ConveyorId = 1;

pub const BAT_SHEET: SheetId = SheetId(1);
pub const DOOR_SHEET: SheetId = SheetId(2);
pub const SLIME_SHEET: SheetId = SheetId(3);

/// Define the hazards and conveyor pair the legend refers to.
pub fn define_standard_catalog(world: &mut World) -> Result<(), WorldError> {
    world.define_hazard(HazardDef { id: SPIKES, explodes: false, death_anim: DeathAnim::Splat, harmless: false });
    world.define_hazard(HazardDef { id: MINE, explodes: true, death_anim: DeathAnim::Burn, harmless: false });
    world.define_hazard(HazardDef { id: FIREWORK, explodes: true, death_anim: DeathAnim::Burn, harmless: true });
    world.allocate_conveyor(BELT)?;
    Ok(())
}

enum Cell {
    Empty,
    Tile(TileSpec),
    Goodie(GoodieKind),
    Start,
}

fn parse_cell(ch: char) -> Cell {
    let belt = |rotation| TileSpec::Conveyor(ConveyorRef { id: BELT, rotation });
    match ch {
        '#' => Cell::Tile(TileSpec::Solid(1)),
        '=' => Cell::Tile(TileSpec::Thru(1)),
        '%' => Cell::Tile(TileSpec::Scenic(1)),
        '~' => Cell::Tile(TileSpec::Collapsible(1)),
        '^' => Cell::Tile(TileSpec::Hazard(SPIKES)),
        '!' => Cell::Tile(TileSpec::Hazard(MINE)),
        '*' => Cell::Tile(TileSpec::Hazard(FIREWORK)),
        '>' => Cell::Tile(belt(Rotation::Clockwise)),
        '<' => Cell::Tile(belt(Rotation::AntiClockwise)),
        '$' => Cell::Goodie(GoodieKind::Coin),
        'G' => Cell::Goodie(GoodieKind::Gem),
        'K' => Cell::Goodie(GoodieKind::Key),
        '+' => Cell::Goodie(GoodieKind::Medkit),
        'L' => Cell::Goodie(GoodieKind::ExtraLife),
        'O' => Cell::Goodie(GoodieKind::Shield),
        'W' => Cell::Goodie(GoodieKind::Wings),
        'X' => Cell::Goodie(GoodieKind::Triple),
        'S' => Cell::Start,
        _ => Cell::Empty,
    }
}

/// Add screen `id` built from `rows`.
pub fn load_screen(world: &mut World, id: ScreenId, rows: &[&str]) -> Result<(), WorldError> {
    let cols = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    if rows.len() > GRID_ROWS || cols > GRID_COLS {
        return Err(WorldError::DiagramTooLarge { rows: rows.len(), cols });
    }
    world.add_screen(id)?;
    for (row, line) in rows.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            match parse_cell(ch) {
                Cell::Empty => {}
                Cell::Tile(spec) => world.place_tile(id, row, col, spec)?,
                Cell::Goodie(kind) => world.place_goodie(id, row, col, kind)?,
                Cell::Start => world.set_character_start(id, row, col)?,
            }
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Built-in demo world
// ══════════════════════════════════════════════════════════════

const DEMO_SCREEN_0: [&str; 20] = [
    "################################",
    "#                               ",
    "#                               ",
    "#      $ $ $           G        ",
    "#     =======        =====      ",
    "#                               ",
    "#  S                       K    ",
    "#                      ~~~~~~   ",
    "#    W                          ",
    "#  =====        $ $             ",
    "#             >>>>>>>           ",
    "#                               ",
    "#                     +         ",
    "#                   #####       ",
    "#         ^^                    ",
    "#######################   ######",
    "#                               ",
    "#                               ",
    "#                               ",
    "################################",
];

const DEMO_SCREEN_1: [&str; 20] = [
    "################################",
    "                               #",
    "                               #",
    "       K                       #",
    "     =====                     #",
    "                               #",
    "                  X            #",
    "               <<<<<<<         #",
    "                               #",
    "   $ $ $                       #",
    "  ========           !         #",
    "                 ########      #",
    "                               #",
    "       *                       #",
    "################      ##########",
    "                               #",
    "   O                           #",
    "                               #",
    "                               #",
    "################################",
];

/// Alpha masks for the demo sheets: a 4×2-frame character, a two-row bat,
/// a door and a pulsing slime.
pub fn demo_metrics() -> MaskLibrary {
    let bat_frame = [
        "#........#",
        "##......##",
        "###.##.###",
        ".########.",
        "..######..",
        "...#..#...",
    ];
    let mut bat_rows: Vec<String> = Vec::new();
    for _ in 0..2 {
        for line in bat_frame {
            bat_rows.push(line.repeat(4));
        }
    }
    let bat_refs: Vec<&str> = bat_rows.iter().map(|s| s.as_str()).collect();

    MaskLibrary::new()
        .with(CHARACTER_SHEET, AlphaMask::opaque(160, 80))
        .with(BAT_SHEET, AlphaMask::from_rows(&bat_refs))
        .with(DOOR_SHEET, AlphaMask::opaque(40, 40))
        .with(SLIME_SHEET, AlphaMask::opaque(60, 20))
}

/// Two side-by-side screens: keys on both, the exit on the second.
pub fn demo_world(tuning: Tuning) -> Result<World, WorldError> {
    let mut world = World::new(tuning, Box::new(demo_metrics()))?;
    define_standard_catalog(&mut world)?;

    let second = ScreenId(1);
    load_screen(&mut world, FIRST_SCREEN, &DEMO_SCREEN_0)?;
    load_screen(&mut world, second, &DEMO_SCREEN_1)?;
    world.screen_mut(second)?.background = 1;

    world.add_sprite(
        FIRST_SCREEN,
        Sprite::new(SLIME_SHEET, (20, 20), (300.0, 280.0), PixelRect::new(240, 260, 200, 40), (1.5, 0.0), SpriteKind::Drain { per_tick: 2 })
            .with_anim(AnimType::Oscillate, AnimSpeed::Slow),
    )?;
    world.add_sprite(
        second,
        Sprite::new(BAT_SHEET, (10, 6), (200.0, 60.0), PixelRect::new(120, 40, 300, 160), (2.0, 1.0), SpriteKind::Harmful)
            .with_anim(AnimType::Cycle, AnimSpeed::Fast),
    )?;
    world.add_sprite(
        second,
        Sprite::new(DOOR_SHEET, (40, 40), (560.0, 320.0), PixelRect::new(560, 320, 40, 40), (0.0, 0.0), SpriteKind::ExitDoor)
            .with_anim(AnimType::Still, AnimSpeed::Normal),
    )?;
    world.add_sprite(
        second,
        Sprite::new(DOOR_SHEET, (40, 40), (40.0, 320.0), PixelRect::new(40, 320, 40, 40), (0.0, 0.0), SpriteKind::BonusDoor { target: FIRST_SCREEN })
            .with_anim(AnimType::Still, AnimSpeed::Normal),
    )?;
    Ok(world)
}
