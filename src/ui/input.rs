/// Input state tracker: keyboard and mouse.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered attack (only fires on initial press or click)
///   - Movement and attack in the same tick
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
/// The mouse cursor is kept in terminal cells and converted to world pixels
/// through the camera when a snapshot is built.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

use crate::domain::entity::{Direction, InputSnapshot};
use crate::sim::world::Camera;
use super::canvas::{PX_PER_COL, PX_PER_ROW};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_UP: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: [KeyCode; 3] = [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_LEFT: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_ATTACK: [KeyCode; 3] = [KeyCode::Char(' '), KeyCode::Char('j'), KeyCode::Char('J')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call. Used for edge-triggered actions.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    /// Last known mouse position, terminal `(column, row)`.
    mouse_cell: Option<(u16, u16)>,
    /// Left button went down during the last drain.
    clicked: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
            mouse_cell: None,
            clicked: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.clicked = false;

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key),
                Ok(Event::Mouse(mouse)) => self.on_mouse(mouse),
                _ => {}
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Not trusted without enhancement; timeout expiry handles it
            }
            _ => {
                let was_held = self.is_held_inner(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.clicked = true;
                self.mouse_cell = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.mouse_cell = Some((mouse.column, mouse.row));
            }
            _ => {}
        }
    }

    /// Is this key currently held down?
    /// Used for continuous actions (movement).
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_inner(code)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Build this frame's snapshot.
    ///
    /// The cursor is the mouse position in world pixels (center of the cell
    /// under the pointer). A keyboard attack, or no mouse seen yet, aims one
    /// tile ahead of `facing`.
    pub fn snapshot(
        &self,
        camera: &Camera,
        origin_row: u16,
        player_center: (f32, f32),
        facing: Direction,
    ) -> InputSnapshot {
        let key_attack = self.any_pressed(&KEYS_ATTACK);
        let mouse = self.mouse_cell.and_then(|cell| cell_to_world(camera, origin_row, cell));
        let (cursor_x, cursor_y) = match mouse {
            Some(p) if !key_attack => p,
            _ => aim_ahead(player_center, facing),
        };
        InputSnapshot {
            up: self.any_held(&KEYS_UP),
            down: self.any_held(&KEYS_DOWN),
            left: self.any_held(&KEYS_LEFT),
            right: self.any_held(&KEYS_RIGHT),
            attack: key_attack || self.clicked,
            cursor_x,
            cursor_y,
        }
    }

    // ── Internal ──

    fn is_held_inner(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

/// Terminal cell to world pixel, `None` above the play area.
pub fn cell_to_world(camera: &Camera, origin_row: u16, (col, row): (u16, u16)) -> Option<(f32, f32)> {
    let row = row.checked_sub(origin_row)?;
    let sx = col as f32 * PX_PER_COL + PX_PER_COL / 2.0;
    let sy = row as f32 * PX_PER_ROW + PX_PER_ROW / 2.0;
    Some(camera.to_world(sx, sy))
}

/// A point one tile ahead of `center` in `facing`.
pub fn aim_ahead(center: (f32, f32), facing: Direction) -> (f32, f32) {
    let (ux, uy) = facing.unit();
    (center.0 + ux * PX_PER_ROW, center.1 + uy * PX_PER_ROW)
}
