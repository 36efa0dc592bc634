/// Render target abstraction.
///
/// The scene composer draws in pixels through `Canvas`; the terminal
/// renderer maps pixels onto character cells, and tests record calls.

use super::sprites::SpriteHandle;

/// Pixels covered by one terminal column.
pub const PX_PER_COL: f32 = 16.0;
/// Pixels covered by one terminal row.
pub const PX_PER_ROW: f32 = 32.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb(r, g, b)
    }
}

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(220, 40, 40);

    /// Mix `self` over `under` with coverage `alpha` in [0, 1].
    pub fn over(self, under: Rgb, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |top: u8, bottom: u8| (top as f32 * a + bottom as f32 * (1.0 - a)).round() as u8;
        Rgb(mix(self.0, under.0), mix(self.1, under.1), mix(self.2, under.2))
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Same center, sides multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Rect {
        let (w, h) = (self.w * factor, self.h * factor);
        Rect::new(self.x + (self.w - w) / 2.0, self.y + (self.h - h) / 2.0, w, h)
    }
}

pub trait Canvas {
    /// Play area in canvas pixels. The world is drawn inside it.
    fn viewport(&self) -> Rect;
    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32);
    fn draw_sprite(&mut self, sprite: &SpriteHandle, rect: Rect, alpha: f32);
    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Rgb);
    /// Restrict drawing to `rect` until `clear_clip`.
    fn set_clip(&mut self, rect: Rect);
    fn clear_clip(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(Rgb::WHITE.over(Rgb::BLACK, 1.0), Rgb::WHITE);
        assert_eq!(Rgb::WHITE.over(Rgb::BLACK, 0.0), Rgb::BLACK);
        assert_eq!(Rgb(200, 100, 0).over(Rgb(0, 0, 0), 0.5), Rgb(100, 50, 0));
    }

    #[test]
    fn scaling_keeps_center() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0).scaled(1.5);
        assert_eq!(r, Rect::new(5.0, 5.0, 30.0, 30.0));
    }
}
