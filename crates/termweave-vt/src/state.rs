#![forbid(unsafe_code)]

//! The ingest state machine: tokens in, cell grid out.
//!
//! [`VtState`] is a minimal terminal emulator. Printable characters are
//! buffered and committed to the grid one grapheme cluster per cell when the
//! next control token arrives (or on [`VtState::flush`]). Controls move the
//! write cursor, erase, scroll, or change the pen.
//!
//! # Invariants
//!
//! 1. **Cursor bounds**: `0 <= x <= width` and `0 <= y < height` (for a
//!    non-empty grid). `x == width` means the next print wraps.
//! 2. **Grid size**: the grid always covers `(0, 0, width, height)`.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Out of range motion | Large parameters | Clamped to the grid |
//! | Unknown CSI / ESC | Unsupported sequence | Ignored |
//! | Malformed SGR color | Truncated parameters | Palette color 0 |
//! | Zero-size grid | Resize to 0 | Prints are dropped |

use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use termweave_core::geometry::{Point, Rect};
use termweave_render::color::{Palettes, Rgba};
use termweave_render::display::{CellSink, CellSource, CompositeOp, Display, compose};

use crate::sgr::{self, Pen};
use crate::tokenizer::{Token, TokenSink};

/// Tab stops every this many columns.
const TAB_WIDTH: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SavedCursor {
    x: i32,
    y: i32,
    pen: Pen,
}

/// Grid, write cursor, pen and pending print run of one virtual terminal.
#[derive(Debug, Clone)]
pub struct VtState {
    grid: Display,
    pending: String,
    x: i32,
    y: i32,
    pen: Pen,
    scroll_region: Option<(u16, u16)>,
    saved: Option<SavedCursor>,
    palettes: Arc<Palettes>,
}

impl VtState {
    /// A blank `width × height` terminal using the xterm palette.
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_palettes(width, height, Arc::new(Palettes::xterm()))
    }

    /// A blank terminal sharing an existing palette table.
    pub fn with_palettes(width: u16, height: u16, palettes: Arc<Palettes>) -> Self {
        Self {
            grid: Display::new(Rect::from_size(width, height)),
            pending: String::new(),
            x: 0,
            y: 0,
            pen: Pen::DEFAULT,
            scroll_region: None,
            saved: None,
            palettes,
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.grid.width()
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.grid.height()
    }

    /// The committed grid. Pending prints are not included until flushed.
    #[inline]
    pub fn grid(&self) -> &Display {
        &self.grid
    }

    /// The write cursor.
    #[inline]
    pub fn cursor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn pen(&self) -> Pen {
        self.pen
    }

    /// The last scroll region set with `CSI top;bottom r` (1-based).
    #[inline]
    pub fn scroll_region(&self) -> Option<(u16, u16)> {
        self.scroll_region
    }

    #[inline]
    pub fn palettes(&self) -> &Arc<Palettes> {
        &self.palettes
    }

    /// Whether printed text is waiting to be committed.
    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn max_x(&self) -> i32 {
        (self.width() as i32 - 1).max(0)
    }

    fn max_y(&self) -> i32 {
        (self.height() as i32 - 1).max(0)
    }

    /// Commit buffered prints to the grid.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        if self.grid.rect().is_empty() {
            return;
        }
        let width = self.width() as i32;
        for cluster in pending.graphemes(true) {
            if self.x >= width {
                self.x = 0;
                self.y += 1;
            }
            if self.y > self.max_y() {
                let over = self.y - self.max_y();
                self.grid.scroll_up(over.min(u16::MAX as i32) as u16);
                self.y = self.max_y();
            }
            self.grid.set(self.x, self.y, cluster, self.pen.fg, self.pen.bg);
            self.x += 1;
        }
        // Hand the allocation back for the next run.
        self.pending = pending;
        self.pending.clear();
    }

    /// Resize the grid, keeping the overlapping top-left content.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.flush();
        let mut grid = Display::new(Rect::from_size(width, height));
        let old = &self.grid;
        compose(&mut grid, old.rect(), old, Point::ORIGIN, CompositeOp::Src);
        self.grid = grid;
        self.x = self.x.clamp(0, width as i32);
        self.y = self.y.clamp(0, self.max_y());
        if let Some(saved) = &mut self.saved {
            saved.x = saved.x.clamp(0, width as i32);
            saved.y = saved.y.clamp(0, (height as i32 - 1).max(0));
        }
    }

    /// Back to the power-on state: blank grid, default pen, cursor home.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.grid = Display::new(self.grid.rect());
        self.x = 0;
        self.y = 0;
        self.pen = Pen::DEFAULT;
        self.scroll_region = None;
        self.saved = None;
    }

    fn line_feed(&mut self) {
        if self.y >= self.max_y() {
            self.grid.scroll_up(1);
            self.y = self.max_y();
        } else {
            self.y += 1;
        }
    }

    fn reverse_index(&mut self) {
        if self.y <= 0 {
            self.grid.scroll_down(1);
            self.y = 0;
        } else {
            self.y -= 1;
        }
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | 0x0b | 0x0c => self.line_feed(),
            b'\r' => self.x = 0,
            b'\t' => {
                let next = (self.x / TAB_WIDTH + 1) * TAB_WIDTH;
                self.x = next.min(self.max_x());
            }
            0x08 => self.x = (self.x.min(self.max_x()) - 1).max(0),
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!(byte, "ignored control");
            }
        }
    }

    fn blank(&mut self, rect: Rect) {
        let (fg, bg) = (self.pen.fg, self.pen.bg);
        self.grid.fill(rect, " ", fg, bg);
    }

    fn erase_line(&mut self, mode: u16) {
        let width = self.width();
        let x = self.x.min(self.max_x());
        let rect = match mode {
            0 => Rect::new(x, self.y, (width as i32 - x).max(0) as u16, 1),
            1 => Rect::new(0, self.y, (x + 1) as u16, 1),
            2 => Rect::new(0, self.y, width, 1),
            _ => return,
        };
        self.blank(rect);
    }

    fn erase_display(&mut self, mode: u16) {
        let (width, height) = (self.width(), self.height());
        match mode {
            0 => {
                self.erase_line(0);
                let below = self.y + 1;
                self.blank(Rect::new(
                    0,
                    below,
                    width,
                    (height as i32 - below).max(0) as u16,
                ));
            }
            1 => {
                self.erase_line(1);
                self.blank(Rect::new(0, 0, width, self.y.max(0) as u16));
            }
            2 | 3 => self.blank(Rect::from_size(width, height)),
            _ => {}
        }
    }

    fn csi(&mut self, params: &[u16], intermediates: &[u8], action: char) {
        if !intermediates.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::trace!(?params, ?intermediates, %action, "ignored private CSI");
            return;
        }

        // Motion counts and positions treat 0 and "missing" as 1.
        let count = |i: usize| params.get(i).copied().filter(|&n| n > 0).unwrap_or(1) as i32;
        let mode = params.first().copied().unwrap_or(0);

        match action {
            'A' => self.y = (self.y - count(0)).max(0),
            'B' => self.y = (self.y + count(0)).min(self.max_y()),
            'C' => self.x = (self.x + count(0)).min(self.max_x()),
            'D' => self.x = (self.x.min(self.max_x()) - count(0)).max(0),
            'E' => {
                self.y = (self.y + count(0)).min(self.max_y());
                self.x = 0;
            }
            'F' => {
                self.y = (self.y - count(0)).max(0);
                self.x = 0;
            }
            'G' | '`' => self.x = (count(0) - 1).min(self.max_x()),
            'd' => self.y = (count(0) - 1).min(self.max_y()),
            'H' | 'f' => {
                self.y = (count(0) - 1).min(self.max_y());
                self.x = (count(1) - 1).min(self.max_x());
            }
            'J' => self.erase_display(mode),
            'K' => self.erase_line(mode),
            'm' => sgr::apply(params, &mut self.pen, &self.palettes),
            'r' => {
                let top = count(0) as u16;
                let bottom = params
                    .get(1)
                    .copied()
                    .filter(|&n| n > 0)
                    .unwrap_or(self.height());
                self.scroll_region = Some((top, bottom));
            }
            'S' => self.grid.scroll_up(count(0) as u16),
            'T' => self.grid.scroll_down(count(0) as u16),
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!(?params, %action, "ignored CSI");
            }
        }
    }

    fn esc(&mut self, intermediates: &[u8], action: u8) {
        if !intermediates.is_empty() {
            return;
        }
        match action {
            b'7' => {
                self.saved = Some(SavedCursor {
                    x: self.x,
                    y: self.y,
                    pen: self.pen,
                })
            }
            b'8' => {
                if let Some(saved) = self.saved {
                    self.x = saved.x;
                    self.y = saved.y;
                    self.pen = saved.pen;
                }
            }
            b'D' => self.line_feed(),
            b'E' => {
                self.line_feed();
                self.x = 0;
            }
            b'M' => self.reverse_index(),
            b'c' => self.reset(),
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!(action, "ignored ESC");
            }
        }
    }

    /// Cell contents at `(x, y)` of the committed grid.
    pub fn cell(&self, x: i32, y: i32) -> (&str, Rgba, Rgba) {
        let c = self.grid.at(x, y);
        (c.text, c.fg, c.bg)
    }
}

impl TokenSink for VtState {
    fn token(&mut self, token: Token<'_>) {
        if let Token::Print(c) = token {
            self.pending.push(c);
            return;
        }
        self.flush();
        match token {
            Token::Print(_) => {}
            Token::Execute(byte) => self.execute(byte),
            Token::Csi {
                params,
                intermediates,
                action,
            } => self.csi(params, intermediates, action),
            Token::Esc {
                intermediates,
                action,
            } => self.esc(intermediates, action),
        }
    }
}
