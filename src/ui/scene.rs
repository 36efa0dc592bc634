/// Scene composer: draws one frame of the world onto a `Canvas`.
///
/// Layers, back to front:
///   1. Tiles in the visible range (clipped to the play area)
///   2. World objects: shake offset, break scale/fade, health bars
///   3. Enemies, then the player and its attack effect
///   4. HUD and overlays (unclipped)
///
/// Anything without a sprite is drawn as a flat fill in its fallback color.

use crate::domain::entity::{Direction, Entity};
use crate::domain::grid::{tile_origin, TILE_SIZE};
use crate::domain::object::GameObject;
use crate::sim::world::{Phase, WorldState};
use super::canvas::{Canvas, Rect, Rgb};
use super::sprites::{sprite_name, SpriteSheet};

const HEALTH_BAR_H: f32 = 4.0;
const PLAYER_FALLBACK: Rgb = Rgb(40, 90, 230);
const ENEMY_FALLBACK: Rgb = Rgb(220, 30, 30);
const HUD_FG: Rgb = Rgb(230, 230, 230);

pub fn compose(canvas: &mut dyn Canvas, world: &WorldState, sheet: &SpriteSheet) {
    let view = canvas.viewport();
    let cam = &world.camera;
    let to_screen = |x: f32, y: f32, w: f32, h: f32| Rect::new(view.x + x - cam.x, view.y + y - cam.y, w, h);

    canvas.set_clip(view);

    // ── Tiles ──
    let (cols, rows) = world.grid.visible_range(cam.viewport());
    for row in rows {
        for col in cols.clone() {
            let Some(kind) = world.grid.kind_at(col as i32, row as i32) else { continue };
            let (x, y) = tile_origin(col, row);
            let rect = to_screen(x, y, TILE_SIZE, TILE_SIZE);
            match sheet.get(kind.sprite_name()) {
                Some(s) => canvas.draw_sprite(&s, rect, 1.0),
                None => canvas.fill_rect(rect, kind.fallback_color().into(), 1.0),
            }
        }
    }

    // ── World objects ──
    for obj in &world.objects {
        let b = &obj.body;
        let (ox, oy) = obj.shake_offset();
        let mut rect = to_screen(b.x + ox, b.y + oy, b.width, b.height);
        if !rect.intersects(&view) { continue; }
        let mut alpha = 1.0;
        if let Some(p) = obj.break_progress() {
            rect = rect.scaled(1.0 + 0.3 * p);
            alpha = 1.0 - p;
        }
        match sheet.get(obj.sprite_name()) {
            Some(s) => canvas.draw_sprite(&s, rect, alpha),
            None => canvas.fill_rect(rect, obj.fallback_color().into(), alpha),
        }
        if b.is_damaged() && !obj.is_breaking() {
            health_bar(canvas, to_screen(b.x, b.y, b.width, b.height), b);
        }
    }

    // ── Entities ──
    for enemy in &world.enemies {
        let hop = enemy.flinch_offset();
        let rect = to_screen(enemy.body.x, enemy.body.y + hop, enemy.body.width, enemy.body.height);
        if !rect.intersects(&view) { continue; }
        draw_entity(canvas, sheet, "enemy", enemy, rect, ENEMY_FALLBACK);
        health_bar(canvas, rect, &enemy.body);
    }

    let p = &world.player;
    let rect = to_screen(p.body.x, p.body.y, p.body.width, p.body.height);
    draw_entity(canvas, sheet, "player", p, rect, PLAYER_FALLBACK);
    if let Some(progress) = p.attack_progress(world.tuning.player.attack_anim) {
        attack_effect(canvas, rect, p.direction, world.tuning.player.attack_radius, progress);
    }

    canvas.clear_clip();

    // ── HUD ──
    let hud = format!(
        " HP {}/{}   Foes {}   Cleared {}   Seed {} ",
        p.body.health(),
        p.body.max_health(),
        world.enemies.len(),
        world.objects_cleared,
        world.seed,
    );
    canvas.draw_text(0.0, 0.0, &hud, HUD_FG);

    let mid_y = view.y + view.h / 2.0;
    if world.phase == Phase::GameOver {
        canvas.draw_text(view.x + 16.0, mid_y, " GAME OVER   R: new map   Q: quit ", Rgb::RED);
    } else if world.paused {
        canvas.draw_text(view.x + 16.0, mid_y, " PAUSED   P: resume   M: mute   R: new map   Q: quit ", Rgb::WHITE);
    }
    canvas.draw_text(
        0.0,
        view.y + view.h,
        " WASD/Arrows: move   Space/Click: attack   P: pause   M: mute   Q: quit",
        Rgb(110, 110, 110),
    );
}

fn draw_entity(canvas: &mut dyn Canvas, sheet: &SpriteSheet, who: &str, e: &Entity, rect: Rect, fallback: Rgb) {
    match sheet.get(&sprite_name(who, e.pose, e.direction)) {
        Some(s) => canvas.draw_sprite(&s, rect, 1.0),
        None => canvas.fill_rect(rect, fallback, 1.0),
    }
}

/// Thin bar above the body: dark track, red fill by remaining health.
fn health_bar(canvas: &mut dyn Canvas, body_rect: Rect, body: &GameObject) {
    let y = body_rect.y - HEALTH_BAR_H - 2.0;
    canvas.fill_rect(Rect::new(body_rect.x, y, body_rect.w, HEALTH_BAR_H), Rgb::BLACK, 0.5);
    let filled = body_rect.w * body.health_ratio();
    if filled > 0.0 {
        canvas.fill_rect(Rect::new(body_rect.x, y, filled, HEALTH_BAR_H), Rgb::RED, 1.0);
    }
}

/// Fading flash in front of the player, shrinking as the swing ends.
fn attack_effect(canvas: &mut dyn Canvas, body: Rect, facing: Direction, radius: f32, progress: f32) {
    let fade = 1.0 - progress;
    let (mut cx, mut cy) = (body.x + body.w / 2.0, body.y + body.h / 2.0);
    match facing {
        Direction::Up => cy -= 20.0,
        Direction::Down => cy += body.h,
        Direction::Left => cx -= 20.0,
        Direction::Right => cx += body.w,
    }
    let r = radius * fade;
    if r <= 0.0 { return; }
    canvas.fill_rect(Rect::new(cx - r / 2.0, cy - r / 2.0, r, r), Rgb::WHITE, 0.5 * fade);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::grid::TileGrid;
    use crate::domain::object::WorldObject;
    use crate::ui::sprites::SpriteHandle;

    #[derive(Debug, PartialEq)]
    enum Call {
        Fill(Rect, Rgb),
        Sprite([char; 2], Rect, f32),
        Text(String),
        Clip,
        Unclip,
    }

    struct Recorder {
        view: Rect,
        calls: Vec<Call>,
    }

    impl Canvas for Recorder {
        fn viewport(&self) -> Rect { self.view }
        fn fill_rect(&mut self, rect: Rect, color: Rgb, _alpha: f32) { self.calls.push(Call::Fill(rect, color)); }
        fn draw_sprite(&mut self, s: &SpriteHandle, rect: Rect, alpha: f32) { self.calls.push(Call::Sprite(s.glyphs, rect, alpha)); }
        fn draw_text(&mut self, _x: f32, _y: f32, text: &str, _c: Rgb) { self.calls.push(Call::Text(text.to_string())); }
        fn set_clip(&mut self, _r: Rect) { self.calls.push(Call::Clip); }
        fn clear_clip(&mut self) { self.calls.push(Call::Unclip); }
    }

    fn small_world(objects: Vec<WorldObject>) -> WorldState {
        let config = GameConfig::default();
        let player = Entity::player(64.0, 64.0, &config.tuning.player);
        let mut w = WorldState::from_parts(TileGrid::bordered(6, 5), objects, player, vec![], &config);
        w.camera.view_w = 192.0;
        w.camera.view_h = 160.0;
        w
    }

    fn recorder() -> Recorder {
        Recorder { view: Rect::new(0.0, 64.0, 192.0, 160.0), calls: vec![] }
    }

    #[test]
    fn layers_draw_back_to_front() {
        let world = small_world(vec![WorldObject::bush_at(96.0, 32.0, 1)]);
        let mut c = recorder();
        compose(&mut c, &world, &SpriteSheet::empty());

        assert_eq!(c.calls.first(), Some(&Call::Clip));
        // Clip, 6x5 tiles, then the bush, then the player.
        let bush = Rect::new(96.0, 96.0, 32.0, 32.0);
        let player = Rect::new(64.0, 128.0, 32.0, 32.0);
        let bush_at = c.calls.iter().position(|k| *k == Call::Fill(bush, Rgb(0x4c, 0xaf, 0x50))).unwrap();
        let player_at = c.calls.iter().position(|k| *k == Call::Fill(player, PLAYER_FALLBACK)).unwrap();
        let unclip_at = c.calls.iter().position(|k| *k == Call::Unclip).unwrap();
        assert_eq!(bush_at, 31);
        assert!(bush_at < player_at && player_at < unclip_at);
        assert!(matches!(&c.calls[unclip_at + 1], Call::Text(t) if t.contains("HP 5/5")));
    }

    #[test]
    fn sprites_used_when_present() {
        let world = small_world(vec![]);
        let mut c = recorder();
        compose(&mut c, &world, &SpriteSheet::terminal());
        assert!(c.calls.iter().any(|k| matches!(k, Call::Sprite(['█', '█'], _, _))));
        assert!(!c.calls.iter().any(|k| matches!(k, Call::Fill(..))));
    }

    #[test]
    fn breaking_crate_grows_and_fades() {
        let mut crate_obj = WorldObject::crate_at(96.0, 32.0, 1, 0.5);
        crate_obj.take_damage(1);
        crate_obj.update(0.25);
        let world = small_world(vec![crate_obj]);
        let mut c = recorder();
        compose(&mut c, &world, &SpriteSheet::terminal());
        let expected = Rect::new(96.0, 96.0, 32.0, 32.0).scaled(1.15);
        assert!(c.calls.iter().any(|k| *k == Call::Sprite(['╳', '╳'], expected, 0.5)));
    }

    #[test]
    fn damaged_object_gets_health_bar() {
        let mut crate_obj = WorldObject::crate_at(96.0, 32.0, 2, 0.5);
        crate_obj.take_damage(1);
        let world = small_world(vec![crate_obj]);
        let mut c = recorder();
        compose(&mut c, &world, &SpriteSheet::terminal());
        // Track is the full width, fill is half of it.
        assert!(c.calls.iter().any(|k| *k == Call::Fill(Rect::new(96.0, 90.0, 32.0, 4.0), Rgb::BLACK)));
        assert!(c.calls.iter().any(|k| *k == Call::Fill(Rect::new(96.0, 90.0, 16.0, 4.0), Rgb::RED)));
    }

    #[test]
    fn game_over_banner() {
        let mut world = small_world(vec![]);
        world.phase = Phase::GameOver;
        let mut c = recorder();
        compose(&mut c, &world, &SpriteSheet::empty());
        assert!(c.calls.iter().any(|k| matches!(k, Call::Text(t) if t.contains("GAME OVER"))));
    }
}
