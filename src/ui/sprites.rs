/// Sprite sheet: named glyph sprites for the terminal.
///
/// A sprite is two glyphs wide (one 32 px tile spans two terminal columns)
/// with a foreground and an optional background. Lookups for unknown names
/// return `None`, and the caller draws a flat color instead. Each missing
/// name is logged once.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::domain::entity::{Direction, Pose};
use super::canvas::Rgb;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SpriteHandle {
    pub glyphs: [char; 2],
    pub fg: Rgb,
    pub bg: Option<Rgb>,
}

const fn sprite(a: char, b: char, fg: Rgb, bg: Option<Rgb>) -> SpriteHandle {
    SpriteHandle { glyphs: [a, b], fg, bg }
}

pub struct SpriteSheet {
    sprites: HashMap<String, SpriteHandle>,
    reported: RefCell<BTreeSet<String>>,
}

impl SpriteSheet {
    /// Sheet with nothing in it: everything falls back to flat fills.
    pub fn empty() -> Self {
        SpriteSheet { sprites: HashMap::new(), reported: RefCell::new(BTreeSet::new()) }
    }

    /// Built-in terminal sprites.
    pub fn terminal() -> Self {
        let mut sheet = SpriteSheet::empty();
        let grass_bg = Some(Rgb(34, 85, 34));
        sheet.insert("tile_grass", sprite('░', '░', Rgb(46, 110, 46), grass_bg));
        sheet.insert("tile_wall", sprite('█', '█', Rgb(110, 110, 120), Some(Rgb(70, 70, 80))));
        sheet.insert("tile_water", sprite('≈', '≈', Rgb(120, 180, 255), Some(Rgb(30, 70, 160))));
        sheet.insert("crate", sprite('▐', '▌', Rgb(181, 120, 60), Some(Rgb(110, 60, 20))));
        sheet.insert("crate_break", sprite('╳', '╳', Rgb(220, 170, 110), None));
        sheet.insert("bush", sprite('♣', '♣', Rgb(90, 200, 90), None));

        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            let face = match dir {
                Direction::Up => '▲',
                Direction::Down => '▼',
                Direction::Left => '◀',
                Direction::Right => '▶',
            };
            sheet.insert(&sprite_name("player", Pose::Idle, dir), sprite('☺', face, Rgb(120, 170, 255), None));
            sheet.insert(&sprite_name("player", Pose::Walk, dir), sprite('☻', face, Rgb(140, 190, 255), None));
            sheet.insert(&sprite_name("player", Pose::Attack, dir), sprite('☻', '✦', Rgb(255, 255, 200), None));
            sheet.insert(&sprite_name("enemy", Pose::Idle, dir), sprite('Ö', face, Rgb(255, 90, 90), None));
            sheet.insert(&sprite_name("enemy", Pose::Walk, dir), sprite('Ö', face, Rgb(255, 120, 100), None));
            // No enemy attack frames: the flat red fill flashes instead.
        }
        sheet
    }

    pub fn insert(&mut self, name: &str, handle: SpriteHandle) {
        self.sprites.insert(name.to_string(), handle);
    }

    pub fn get(&self, name: &str) -> Option<SpriteHandle> {
        let found = self.sprites.get(name).copied();
        if found.is_none() && self.reported.borrow_mut().insert(name.to_string()) {
            debug!(sprite = name, "sprite missing, using flat fill");
        }
        found
    }

    #[cfg(test)]
    fn reported_count(&self) -> usize {
        self.reported.borrow().len()
    }
}

/// `<who>_<pose>_<direction>`, e.g. `player_walk_left`.
pub fn sprite_name(who: &str, pose: Pose, dir: Direction) -> String {
    let pose = match pose {
        Pose::Idle => "idle",
        Pose::Walk => "walk",
        Pose::Attack => "attack",
    };
    let dir = match dir {
        Direction::Up => "up",
        Direction::Down => "down",
        Direction::Left => "left",
        Direction::Right => "right",
    };
    format!("{who}_{pose}_{dir}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_pose_and_direction() {
        assert_eq!(sprite_name("player", Pose::Walk, Direction::Left), "player_walk_left");
        assert_eq!(sprite_name("enemy", Pose::Attack, Direction::Up), "enemy_attack_up");
    }

    #[test]
    fn terminal_sheet_covers_tiles_and_player() {
        let sheet = SpriteSheet::terminal();
        for name in ["tile_grass", "tile_wall", "tile_water", "crate", "bush", "player_attack_down"] {
            assert!(sheet.get(name).is_some(), "{name}");
        }
        assert!(sheet.get("enemy_attack_left").is_none());
    }

    #[test]
    fn missing_names_reported_once() {
        let sheet = SpriteSheet::empty();
        assert!(sheet.get("ghost").is_none());
        assert!(sheet.get("ghost").is_none());
        assert!(sheet.get("wraith").is_none());
        assert_eq!(sheet.reported_count(), 2);
    }
}
