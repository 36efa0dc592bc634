/// Game objects: the shared body every world entity is built on, and the
/// destructible world objects (crates, bushes) that live on the map.
///
/// Objects are never removed in place. Damage drives health to 0, and the
/// owner filters destroyed objects out at the end of the frame.

use super::grid::TILE_SIZE;

/// Number of ticks a crate shakes after a non-fatal hit.
pub const SHAKE_TICKS: u8 = 5;

/// Position, size and health shared by every world entity.
///
/// Invariant: `0 <= health <= max_health`.
#[derive(Clone, Debug, PartialEq)]
pub struct GameObject {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    health: i32,
    max_health: i32,
    pub destructible: bool,
}

impl GameObject {
    pub fn new(x: f32, y: f32, width: f32, height: f32, health: i32, destructible: bool) -> Self {
        let max_health = health.max(0);
        GameObject { x, y, width, height, health: max_health, max_health, destructible }
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Remove `amount` health, clamped to `[0, max_health]`.
    /// Non-destructible objects ignore damage.
    pub fn take_damage(&mut self, amount: i32) {
        if self.destructible {
            self.health = (self.health - amount.max(0)).clamp(0, self.max_health);
        }
    }

    /// Drop straight to 0 health (end of a break animation).
    pub fn destroy(&mut self) {
        self.health = 0;
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0
    }

    pub fn is_damaged(&self) -> bool {
        self.health < self.max_health
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health == 0 { return 0.0; }
        self.health as f32 / self.max_health as f32
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Distance between the centers of two bodies.
    pub fn center_distance(&self, other: &GameObject) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
    }

    /// Strict AABB overlap (touching edges do not count).
    pub fn overlaps_box(&self, x: f32, y: f32, w: f32, h: f32) -> bool {
        self.x < x + w && self.x + self.width > x && self.y < y + h && self.y + self.height > y
    }

    #[cfg(test)]
    pub fn overlaps(&self, other: &GameObject) -> bool {
        self.overlaps_box(other.x, other.y, other.width, other.height)
    }

    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Crate animation state. Breaking is a one-way transition.
#[derive(Clone, Debug, PartialEq)]
pub struct CrateState {
    breaking: bool,
    break_elapsed: f32,
    break_duration: f32,
    shake_ticks: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Crate(CrateState),
    Bush,
}

/// What a single hit did to a world object.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HitOutcome {
    Damaged,
    Breaking,
    Destroyed,
    Ignored,
}

#[derive(Clone, Debug)]
pub struct WorldObject {
    pub body: GameObject,
    pub kind: ObjectKind,
}

impl WorldObject {
    pub fn crate_at(x: f32, y: f32, health: i32, break_duration: f32) -> Self {
        WorldObject {
            body: GameObject::new(x, y, TILE_SIZE, TILE_SIZE, health, true),
            kind: ObjectKind::Crate(CrateState {
                breaking: false,
                break_elapsed: 0.0,
                break_duration,
                shake_ticks: 0,
            }),
        }
    }

    pub fn bush_at(x: f32, y: f32, health: i32) -> Self {
        WorldObject {
            body: GameObject::new(x, y, TILE_SIZE, TILE_SIZE, health, true),
            kind: ObjectKind::Bush,
        }
    }

    /// Apply one hit.
    ///
    /// A crate on its last health point enters the breaking transition
    /// instead of losing health, whatever the damage amount. Hits on a
    /// breaking crate are ignored.
    pub fn take_damage(&mut self, amount: i32) -> HitOutcome {
        match &mut self.kind {
            ObjectKind::Crate(state) => {
                if state.breaking {
                    HitOutcome::Ignored
                } else if self.body.health() <= amount {
                    state.breaking = true;
                    state.break_elapsed = 0.0;
                    state.shake_ticks = 0;
                    HitOutcome::Breaking
                } else {
                    self.body.take_damage(amount);
                    state.shake_ticks = SHAKE_TICKS;
                    HitOutcome::Damaged
                }
            }
            ObjectKind::Bush => {
                self.body.take_damage(amount);
                if self.body.is_destroyed() { HitOutcome::Destroyed } else { HitOutcome::Damaged }
            }
        }
    }

    /// Advance animation timers by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let ObjectKind::Crate(state) = &mut self.kind {
            if state.shake_ticks > 0 {
                state.shake_ticks -= 1;
            }
            if state.breaking {
                state.break_elapsed += dt;
                if state.break_elapsed >= state.break_duration {
                    self.body.destroy();
                }
            }
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.body.is_destroyed()
    }

    /// Crates are solid; bushes are cover only.
    pub fn blocks_movement(&self) -> bool {
        matches!(self.kind, ObjectKind::Crate(_))
    }

    pub fn slows_movement(&self) -> bool {
        matches!(self.kind, ObjectKind::Bush)
    }

    pub fn is_breaking(&self) -> bool {
        matches!(&self.kind, ObjectKind::Crate(s) if s.breaking)
    }

    /// Break animation progress 0.0 → 1.0, `None` unless breaking.
    pub fn break_progress(&self) -> Option<f32> {
        match &self.kind {
            ObjectKind::Crate(s) if s.breaking => {
                if s.break_duration <= 0.0 { return Some(1.0); }
                Some((s.break_elapsed / s.break_duration).min(1.0))
            }
            _ => None,
        }
    }

    /// Render-only recoil offset while shaking.
    pub fn shake_offset(&self) -> (f32, f32) {
        match &self.kind {
            ObjectKind::Crate(s) if s.shake_ticks > 0 => {
                let i = SHAKE_TICKS - s.shake_ticks;
                if i % 2 == 0 { (3.0, 2.0) } else { (-3.0, -2.0) }
            }
            _ => (0.0, 0.0),
        }
    }

    pub fn sprite_name(&self) -> &'static str {
        match &self.kind {
            ObjectKind::Crate(s) if s.breaking => "crate_break",
            ObjectKind::Crate(_) => "crate",
            ObjectKind::Bush => "bush",
        }
    }

    pub fn fallback_color(&self) -> (u8, u8, u8) {
        match &self.kind {
            ObjectKind::Crate(s) if s.breaking => (0xa0, 0x52, 0x2d),
            ObjectKind::Crate(_) => (0x8b, 0x45, 0x13),
            ObjectKind::Bush => (0x4c, 0xaf, 0x50),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_stays_in_bounds() {
        let mut b = GameObject::new(0.0, 0.0, 32.0, 32.0, 3, true);
        b.take_damage(-5); // negative damage never heals past max
        assert_eq!(b.health(), 3);
        b.take_damage(1);
        assert_eq!(b.health(), 2);
        assert!(!b.is_destroyed());
        b.take_damage(10);
        assert_eq!(b.health(), 0);
        assert!(b.is_destroyed());
    }

    #[test]
    fn indestructible_ignores_damage() {
        let mut b = GameObject::new(0.0, 0.0, 32.0, 32.0, 2, false);
        b.take_damage(5);
        assert_eq!(b.health(), 2);
    }

    #[test]
    fn overlap_is_strict() {
        let a = GameObject::new(0.0, 0.0, 32.0, 32.0, 1, true);
        let touching = GameObject::new(32.0, 0.0, 32.0, 32.0, 1, true);
        let inside = GameObject::new(31.0, 31.0, 32.0, 32.0, 1, true);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
    }

    #[test]
    fn crate_last_point_enters_breaking() {
        let mut c = WorldObject::crate_at(0.0, 0.0, 1, 0.5);
        assert_eq!(c.take_damage(1), HitOutcome::Breaking);
        assert!(c.is_breaking());
        assert!(!c.is_destroyed());
        // non-interruptible
        assert_eq!(c.take_damage(3), HitOutcome::Ignored);
        assert_eq!(c.body.health(), 1);
    }

    #[test]
    fn crate_breaks_regardless_of_damage_amount() {
        let mut c = WorldObject::crate_at(0.0, 0.0, 1, 0.5);
        assert_eq!(c.take_damage(7), HitOutcome::Breaking);
    }

    #[test]
    fn crate_destroyed_exactly_after_break_duration() {
        let mut c = WorldObject::crate_at(0.0, 0.0, 1, 0.5);
        c.take_damage(1);
        c.update(0.25);
        assert!(!c.is_destroyed());
        assert!((c.break_progress().unwrap() - 0.5).abs() < 1e-6);
        c.update(0.125);
        assert!(!c.is_destroyed());
        c.update(0.125);
        assert!(c.is_destroyed());
    }

    #[test]
    fn crate_non_fatal_hit_shakes() {
        let mut c = WorldObject::crate_at(10.0, 10.0, 2, 0.5);
        assert_eq!(c.take_damage(1), HitOutcome::Damaged);
        assert_eq!(c.body.health(), 1);
        assert_eq!(c.shake_offset(), (3.0, 2.0));
        c.update(0.016);
        assert_eq!(c.shake_offset(), (-3.0, -2.0));
        for _ in 0..4 { c.update(0.016); }
        assert_eq!(c.shake_offset(), (0.0, 0.0));
        // shaking never moves the body
        assert_eq!((c.body.x, c.body.y), (10.0, 10.0));
    }

    #[test]
    fn bush_is_cover_only() {
        let mut b = WorldObject::bush_at(0.0, 0.0, 1);
        assert!(!b.blocks_movement());
        assert!(b.slows_movement());
        assert_eq!(b.take_damage(1), HitOutcome::Destroyed);
        assert!(b.is_destroyed());
    }
}
