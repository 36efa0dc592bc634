/// Gamepad input via gilrs.
///
/// Every button, D-pad included, is one slot in a table of held/edge pairs.
/// Movement reads the D-pad or the left stick past a deadzone. Which buttons
/// attack, pause and quit comes from `[gamepad]` in config.toml:
///   A / X / R1   →  Attack (toward current facing)
///   Start        →  Pause, or a new map after game over
///   Select       →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::info;
use tracing::debug;

use crate::config::GamepadConfig;
use crate::domain::entity::{Direction, InputSnapshot};
use super::input::aim_ahead;

const STICK_DEADZONE: f32 = 0.25;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
}

const BTN_COUNT: usize = 14;

impl Btn {
    /// Config name to button. Face buttons also accept compass names.
    fn from_name(s: &str) -> Option<Btn> {
        let b = match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Btn::A,
            "B" | "EAST" => Btn::B,
            "X" | "WEST" => Btn::X,
            "Y" | "NORTH" => Btn::Y,
            "L1" | "LB" => Btn::L1,
            "R1" | "RB" => Btn::R1,
            "L2" | "LT" => Btn::L2,
            "R2" | "RT" => Btn::R2,
            "START" => Btn::Start,
            "SELECT" | "BACK" => Btn::Select,
            _ => return None,
        };
        Some(b)
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        let b = match btn {
            Button::South => Btn::A,
            Button::East => Btn::B,
            Button::West => Btn::X,
            Button::North => Btn::Y,
            Button::LeftTrigger => Btn::L1,
            Button::RightTrigger => Btn::R1,
            Button::LeftTrigger2 => Btn::L2,
            Button::RightTrigger2 => Btn::R2,
            Button::Start => Btn::Start,
            Button::Select => Btn::Select,
            Button::DPadUp => Btn::Up,
            Button::DPadDown => Btn::Down,
            Button::DPadLeft => Btn::Left,
            Button::DPadRight => Btn::Right,
            _ => return None,
        };
        Some(b)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Pressed {
    held: bool,
    /// Went down since the last `update()`.
    edge: bool,
}

#[derive(Debug, PartialEq)]
struct Bindings {
    attack: Vec<Btn>,
    pause: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for Bindings {
    fn default() -> Self {
        Bindings {
            attack: vec![Btn::A, Btn::X, Btn::R1],
            pause: vec![Btn::Start],
            quit: vec![Btn::Select],
        }
    }
}

/// Parsed button list, or `current` when nothing in `names` is a button.
fn parse_bindings(names: &[String], current: &[Btn]) -> Vec<Btn> {
    let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
    if parsed.is_empty() { current.to_vec() } else { parsed }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
    pads: [Pressed; BTN_COUNT],
    /// Left stick, gilrs convention: +y is up.
    stick: (f32, f32),
    bindings: Bindings,
    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let any = g.gamepads().next().is_some();
                (Some(g), any)
            }
            Err(e) => {
                debug!(error = %e, "gamepad backend unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            pads: [Pressed::default(); BTN_COUNT],
            stick: (0.0, 0.0),
            bindings: Bindings::default(),
            connected,
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        let b = &mut self.bindings;
        b.attack = parse_bindings(&cfg.attack, &b.attack);
        b.pause = parse_bindings(&cfg.pause, &b.pause);
        b.quit = parse_bindings(&cfg.quit, &b.quit);
        debug!(bindings = ?self.bindings, "gamepad bindings");
    }

    /// Call once per frame, before reading any state.
    pub fn update(&mut self) {
        self.clear_edges();
        #[cfg(feature = "gamepad")]
        self.poll();
    }

    #[cfg(feature = "gamepad")]
    fn poll(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else { return };
        let events: Vec<EventType> = std::iter::from_fn(|| gilrs.next_event()).map(|e| e.event).collect();

        for event in events {
            match event {
                EventType::ButtonPressed(b, _) => self.set_gilrs(b, true),
                EventType::ButtonReleased(b, _) => self.set_gilrs(b, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick.0 = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick.1 = v,
                EventType::Connected => {
                    self.connected = true;
                    info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.pads = [Pressed::default(); BTN_COUNT];
                    self.stick = (0.0, 0.0);
                    info!("gamepad disconnected");
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_gilrs(&mut self, btn: Button, down: bool) {
        self.connected = true;
        if let Some(b) = Btn::from_gilrs(btn) {
            self.set(b, down);
        }
    }

    fn set(&mut self, btn: Btn, down: bool) {
        let p = &mut self.pads[btn as usize];
        if down && !p.held {
            p.edge = true;
        }
        p.held = down;
    }

    fn clear_edges(&mut self) {
        for p in &mut self.pads {
            p.edge = false;
        }
    }

    fn any_edge(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.pads[b as usize].edge)
    }

    fn held(&self, btn: Btn) -> bool {
        self.pads[btn as usize].held
    }

    pub fn attack_pressed(&self) -> bool {
        self.any_edge(&self.bindings.attack)
    }

    pub fn pause_pressed(&self) -> bool {
        self.any_edge(&self.bindings.pause)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_edge(&self.bindings.quit)
    }

    /// OR the pad into a keyboard/mouse snapshot. A pad attack aims one
    /// tile ahead of the current facing, since a pad has no cursor.
    pub fn merge_into(&self, snap: &mut InputSnapshot, player_center: (f32, f32), facing: Direction) {
        let (sx, sy) = self.stick;
        snap.up |= self.held(Btn::Up) || sy > STICK_DEADZONE;
        snap.down |= self.held(Btn::Down) || sy < -STICK_DEADZONE;
        snap.left |= self.held(Btn::Left) || sx < -STICK_DEADZONE;
        snap.right |= self.held(Btn::Right) || sx > STICK_DEADZONE;
        if self.attack_pressed() && !snap.attack {
            snap.attack = true;
            let (x, y) = aim_ahead(player_center, facing);
            snap.cursor_x = x;
            snap.cursor_y = y;
        }
    }
}
