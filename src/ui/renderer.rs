/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The scene composer draws into the `front` buffer through `TerminalCanvas`
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Canvas pixels map onto cells at 16 px per column and 32 px per row, so
/// one 32 px tile is two columns by one row.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use tracing::debug;

use crate::sim::world::{Phase, WorldState};
use super::canvas::{Canvas, Rect, Rgb, PX_PER_COL, PX_PER_ROW};
use super::scene;
use super::sprites::{SpriteHandle, SpriteSheet};

/// Explicit dark background for all "empty" terminal cells.
///
/// Using the same RGB for `Clear(ClearType::All)` and every cell's
/// background keeps the inter-row gap on VTE terminals the same color as
/// the cells.
const BASE_BG: Rgb = Rgb(22, 22, 35);

/// First terminal row of the play area. Row 0 is the HUD.
pub const MAP_ROW: u16 = 2;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Rgb,
    bg: Rgb,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Rgb::WHITE, bg: BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Rgb(255, 0, 255), bg: Rgb(255, 0, 255) };
}

fn term_color(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x < self.width && y < self.height {
            Some(&mut self.cells[y * self.width + x])
        } else {
            None
        }
    }
}

// ── TerminalCanvas: pixels onto cells ──

/// A cell is drawn by a rect when the cell's center lies inside it.
struct TerminalCanvas<'a> {
    buf: &'a mut FrameBuffer,
    view: Rect,
    clip: Option<Rect>,
}

impl<'a> TerminalCanvas<'a> {
    fn new(buf: &'a mut FrameBuffer, view: Rect) -> Self {
        TerminalCanvas { buf, view, clip: None }
    }

    fn clip_allows(&self, px: f32, py: f32) -> bool {
        self.clip.map_or(true, |c| contains(&c, px, py))
    }

    /// Columns whose centers fall in `[x, x + w)`.
    fn cols(&self, x: f32, w: f32) -> std::ops::Range<usize> {
        span(x, w, PX_PER_COL, self.buf.width)
    }

    /// Rows whose centers fall in `[y, y + h)`.
    fn rows(&self, y: f32, h: f32) -> std::ops::Range<usize> {
        span(y, h, PX_PER_ROW, self.buf.height)
    }

    fn each_cell(&mut self, rect: Rect, mut paint: impl FnMut(&mut Cell, usize)) {
        for row in self.rows(rect.y, rect.h) {
            for (i, col) in self.cols(rect.x, rect.w).enumerate() {
                let (cx, cy) = cell_center(col, row);
                if !self.clip_allows(cx, cy) { continue; }
                if let Some(cell) = self.buf.get_mut(col, row) {
                    paint(cell, i);
                }
            }
        }
    }
}

fn contains(r: &Rect, px: f32, py: f32) -> bool {
    px >= r.x && px < r.x + r.w && py >= r.y && py < r.y + r.h
}

fn cell_center(col: usize, row: usize) -> (f32, f32) {
    (col as f32 * PX_PER_COL + PX_PER_COL / 2.0, row as f32 * PX_PER_ROW + PX_PER_ROW / 2.0)
}

fn span(start: f32, len: f32, step: f32, max: usize) -> std::ops::Range<usize> {
    let first = ((start - step / 2.0) / step).ceil().max(0.0) as usize;
    let end = ((start + len - step / 2.0) / step).ceil().max(0.0) as usize;
    first.min(max)..end.min(max).max(first.min(max))
}

impl Canvas for TerminalCanvas<'_> {
    fn viewport(&self) -> Rect {
        self.view
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        if rect.h < PX_PER_ROW / 2.0 {
            // Thin strip: a line glyph on the row holding its middle.
            let mid = rect.y + rect.h / 2.0;
            let row = (mid / PX_PER_ROW).floor();
            if row < 0.0 { return; }
            let line = Rect::new(rect.x, row * PX_PER_ROW, rect.w, PX_PER_ROW);
            self.each_cell(line, |cell, _| {
                cell.ch = '▁';
                cell.fg = color.over(cell.bg, alpha);
            });
            return;
        }
        self.each_cell(rect, |cell, _| {
            cell.bg = color.over(cell.bg, alpha);
            if alpha >= 1.0 {
                cell.ch = ' ';
            } else {
                cell.fg = color.over(cell.fg, alpha);
            }
        });
    }

    fn draw_sprite(&mut self, sprite: &SpriteHandle, rect: Rect, alpha: f32) {
        self.each_cell(rect, |cell, i| {
            let under = cell.bg;
            cell.ch = sprite.glyphs[i % 2];
            cell.fg = sprite.fg.over(under, alpha);
            if let Some(bg) = sprite.bg {
                cell.bg = bg.over(under, alpha);
            }
        });
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Rgb) {
        if x < 0.0 || y < 0.0 { return; }
        let row = (y / PX_PER_ROW) as usize;
        let col0 = (x / PX_PER_COL) as usize;
        for (i, ch) in text.chars().enumerate() {
            let col = col0 + i;
            let (cx, cy) = cell_center(col, row);
            if !self.clip_allows(cx, cy) { continue; }
            let Some(cell) = self.buf.get_mut(col, row) else { break };
            cell.ch = ch;
            cell.fg = color;
            cell.bg = Rgb::BLACK.over(cell.bg, 0.6);
        }
    }

    fn set_clip(&mut self, rect: Rect) {
        self.clip = Some(rect);
    }

    fn clear_clip(&mut self) {
        self.clip = None;
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced: false,
        }
    }

    /// Take over the terminal. Returns whether key Release events will be
    /// reported.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(term_color(BASE_BG)),
            Clear(ClearType::All)
        )?;

        self.enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        debug!(enhanced = self.enhanced, "terminal ready");

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back != front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &mut WorldState, sheet: &SpriteSheet) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(term_color(BASE_BG)), Clear(ClearType::All))?;
        }

        // Clean transition on game over
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(term_color(BASE_BG)), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        let view = play_area(self.term_w, self.term_h);
        world.camera.view_w = view.w;
        world.camera.view_h = view.h;
        world.follow_player();

        self.front.clear();
        scene::compose(&mut TerminalCanvas::new(&mut self.front, view), world, sheet);

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Rgb::WHITE;
        let mut last_bg = BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, never ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(term_color(last_fg)),
            SetBackgroundColor(term_color(last_bg)),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(term_color(cell.fg)))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(term_color(cell.bg)))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

/// Play area in canvas pixels: full width, between the HUD and the help row.
fn play_area(term_w: usize, term_h: usize) -> Rect {
    let reserved = MAP_ROW as usize + 1;
    let rows = term_h.saturating_sub(reserved).max(1);
    Rect::new(
        0.0,
        MAP_ROW as f32 * PX_PER_ROW,
        term_w as f32 * PX_PER_COL,
        rows as f32 * PX_PER_ROW,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(buf: &mut FrameBuffer) -> TerminalCanvas<'_> {
        let view = play_area(buf.width, buf.height);
        TerminalCanvas::new(buf, view)
    }

    #[test]
    fn play_area_leaves_hud_and_help_rows() {
        assert_eq!(play_area(80, 24), Rect::new(0.0, 64.0, 1280.0, 672.0));
        assert_eq!(play_area(80, 2).h, 32.0);
    }

    #[test]
    fn tile_rect_covers_two_columns_one_row() {
        let mut buf = FrameBuffer::new(10, 6);
        canvas(&mut buf).fill_rect(Rect::new(32.0, 64.0, 32.0, 32.0), Rgb::RED, 1.0);
        for x in 0..10 {
            let expected = if x == 2 || x == 3 { Rgb::RED } else { BASE_BG };
            assert_eq!(buf.get(x, 2).bg, expected, "col {x}");
        }
        assert_eq!(buf.get(2, 1).bg, BASE_BG);
        assert_eq!(buf.get(2, 3).bg, BASE_BG);
    }

    #[test]
    fn thin_strip_becomes_a_line_glyph() {
        let mut buf = FrameBuffer::new(10, 6);
        canvas(&mut buf).fill_rect(Rect::new(32.0, 90.0, 16.0, 4.0), Rgb::RED, 1.0);
        assert_eq!(buf.get(2, 2).ch, '▁');
        assert_eq!(buf.get(2, 2).fg, Rgb::RED);
        assert_eq!(buf.get(2, 2).bg, BASE_BG);
        assert_eq!(buf.get(3, 2).ch, ' ');
    }

    #[test]
    fn sprites_alternate_glyphs_and_fade() {
        let mut buf = FrameBuffer::new(10, 6);
        let s = SpriteHandle { glyphs: ['<', '>'], fg: Rgb::WHITE, bg: None };
        let mut c = canvas(&mut buf);
        c.draw_sprite(&s, Rect::new(0.0, 64.0, 64.0, 32.0), 1.0);
        c.draw_sprite(&s, Rect::new(96.0, 64.0, 32.0, 32.0), 0.0);
        let row: String = (0..4).map(|x| buf.get(x, 2).ch).collect();
        assert_eq!(row, "<><>");
        assert_eq!(buf.get(6, 2).fg, BASE_BG);
    }

    #[test]
    fn clip_limits_drawing() {
        let mut buf = FrameBuffer::new(10, 6);
        let mut c = canvas(&mut buf);
        c.set_clip(Rect::new(0.0, 64.0, 160.0, 128.0));
        c.fill_rect(Rect::new(0.0, 0.0, 160.0, 192.0), Rgb(60, 200, 80), 1.0);
        c.clear_clip();
        c.draw_text(0.0, 0.0, "HP", Rgb::WHITE);
        assert_eq!(buf.get(0, 0).ch, 'H');
        assert_eq!(buf.get(1, 0).ch, 'P');
        assert_eq!(buf.get(0, 1).bg, BASE_BG);
        assert_eq!(buf.get(4, 2).bg, Rgb(60, 200, 80));
        assert_eq!(buf.get(4, 5).bg, BASE_BG);
    }

    #[test]
    fn translucent_fill_blends() {
        let mut buf = FrameBuffer::new(4, 4);
        canvas(&mut buf).fill_rect(Rect::new(0.0, 64.0, 32.0, 32.0), Rgb::WHITE, 0.5);
        assert_eq!(buf.get(0, 2).bg, Rgb(139, 139, 145));
    }

    #[test]
    fn offscreen_rects_are_ignored() {
        let mut buf = FrameBuffer::new(4, 4);
        let mut c = canvas(&mut buf);
        c.fill_rect(Rect::new(-200.0, -200.0, 32.0, 32.0), Rgb::RED, 1.0);
        c.fill_rect(Rect::new(900.0, 64.0, 32.0, 32.0), Rgb::RED, 1.0);
        assert!(buf.cells.iter().all(|c| *c == Cell::BLANK));
    }
}
