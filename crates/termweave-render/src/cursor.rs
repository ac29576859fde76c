#![forbid(unsafe_code)]

//! Believed terminal cursor state and the motion codec.
//!
//! A [`CursorState`] is what we can prove about the physical terminal: the
//! cursor position (each axis known or unknown) and the active colors
//! (transparent = unknown). Every emitting method appends bytes and updates
//! the state to match what the terminal will believe once those bytes land.
//!
//! # Motion policy
//!
//! [`CursorState::go_to`] picks the first rule that applies:
//!
//! 1. either axis unknown: absolute `CSI row;col H`
//! 2. one column left on the same row: `BS`
//! 3. already there: nothing
//! 4. the origin: `CSI H`
//! 5. column 0 of the next row: color reset (if needed) then `CR LF`
//! 6. anything else: absolute `CSI row;col H`

use std::io::{self, Write};

use termweave_core::geometry::Point;

use crate::ansi;
use crate::color::{DEFAULT_BG, DEFAULT_FG, Rgba};

/// What the physical terminal is believed to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    /// Column, `None` when it cannot be proven.
    pub x: Option<i32>,
    /// Row, `None` when it cannot be proven.
    pub y: Option<i32>,
    /// Active foreground; transparent when unknown.
    pub fg: Rgba,
    /// Active background; transparent when unknown.
    pub bg: Rgba,
    /// The screen was cleared and nothing has been written since.
    pub cleared: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self::START
    }
}

impl CursorState {
    /// Nothing is known.
    pub const START: Self = Self {
        x: None,
        y: None,
        fg: Rgba::TRANSPARENT,
        bg: Rgba::TRANSPARENT,
        cleared: false,
    };

    /// At the origin with the terminal's default colors.
    pub const RESET: Self = Self {
        x: Some(0),
        y: Some(0),
        fg: DEFAULT_FG,
        bg: DEFAULT_BG,
        cleared: false,
    };

    /// The believed position, if both axes are known.
    #[inline]
    pub fn position(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }

    /// Whether the active colors are the terminal defaults.
    #[inline]
    pub fn is_default_colors(&self) -> bool {
        self.fg == DEFAULT_FG && self.bg == DEFAULT_BG
    }

    /// Forget the position, for when something else moved the cursor.
    #[inline]
    pub fn invalidate(&mut self) {
        self.x = None;
        self.y = None;
    }

    /// Move to `to` with the cheapest sequence the state allows.
    pub fn go_to<W: Write>(&mut self, w: &mut W, to: Point) -> io::Result<()> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => {
                if y == to.y && x.checked_sub(1) == Some(to.x) {
                    w.write_all(ansi::BS)?;
                } else if x == to.x && y == to.y {
                    return Ok(());
                } else if to == Point::ORIGIN {
                    ansi::cursor_home(w)?;
                } else if to.x == 0 && y.checked_add(1) == Some(to.y) {
                    self.reset(w)?;
                    w.write_all(ansi::CRLF)?;
                } else {
                    ansi::cup(w, to.y, to.x)?;
                }
            }
            _ => ansi::cup(w, to.y, to.x)?,
        }
        self.x = Some(to.x);
        self.y = Some(to.y);
        Ok(())
    }

    /// Write one glyph at the current position.
    ///
    /// Exactly one code point advances the column by one; anything else
    /// (empty, combining sequences, wide clusters) leaves it unknown.
    pub fn write_glyph<W: Write>(&mut self, w: &mut W, text: &str) -> io::Result<()> {
        w.write_all(text.as_bytes())?;
        let mut chars = text.chars();
        self.x = match (chars.next(), chars.next()) {
            (Some(_), None) => self.x.map(|x| x.saturating_add(1)),
            _ => None,
        };
        self.cleared = false;
        Ok(())
    }

    /// Reset colors to the terminal defaults: `CSI m`.
    pub fn reset<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        if self.is_default_colors() {
            return Ok(());
        }
        ansi::sgr_reset(w)?;
        if self.bg != DEFAULT_BG {
            self.cleared = false;
        }
        self.fg = DEFAULT_FG;
        self.bg = DEFAULT_BG;
        Ok(())
    }

    /// Clear the screen: `CSI 2 J`. The position is unknown afterwards.
    pub fn clear<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        if !self.cleared {
            ansi::clear_screen(w)?;
            self.cleared = true;
        }
        self.invalidate();
        Ok(())
    }

    /// Move to the origin: `CSI H`.
    pub fn home<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        ansi::cursor_home(w)?;
        self.x = Some(0);
        self.y = Some(0);
        Ok(())
    }

    pub fn hide<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        ansi::cursor_hide(w)
    }

    pub fn show<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        ansi::cursor_show(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(
        cursor: &mut CursorState,
        f: impl FnOnce(&mut CursorState, &mut Vec<u8>) -> io::Result<()>,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        f(cursor, &mut buf).unwrap();
        buf
    }

    fn at(x: i32, y: i32) -> CursorState {
        CursorState {
            x: Some(x),
            y: Some(y),
            ..CursorState::RESET
        }
    }

    #[test]
    fn unknown_position_uses_absolute() {
        let mut c = CursorState::START;
        let out = emit(&mut c, |c, w| c.go_to(w, Point::new(3, 2)));
        assert_eq!(out, b"\x1b[3;4H");
        assert_eq!(c.position(), Some(Point::new(3, 2)));

        let mut c = CursorState {
            x: None,
            ..at(0, 0)
        };
        let out = emit(&mut c, |c, w| c.go_to(w, Point::new(0, 0)));
        assert_eq!(out, b"\x1b[1;1H");
    }

    #[test]
    fn one_left_is_backspace() {
        let mut c = at(5, 1);
        assert_eq!(emit(&mut c, |c, w| c.go_to(w, Point::new(4, 1))), b"\x08");
        assert_eq!(c.x, Some(4));
    }

    #[test]
    fn same_position_emits_nothing() {
        let mut c = at(7, 3);
        let out = emit(&mut c, |c, w| c.go_to(w, Point::new(7, 3)));
        assert!(out.is_empty());
    }

    #[test]
    fn origin_is_home() {
        let mut c = at(7, 3);
        assert_eq!(emit(&mut c, |c, w| c.go_to(w, Point::ORIGIN)), b"\x1b[H");
    }

    #[test]
    fn next_line_is_crlf() {
        let mut c = at(9, 0);
        assert_eq!(emit(&mut c, |c, w| c.go_to(w, Point::new(0, 1))), b"\r\n");
        assert_eq!(c.position(), Some(Point::new(0, 1)));
    }

    #[test]
    fn next_line_resets_colors_first() {
        let mut c = CursorState {
            fg: Rgba::WHITE,
            ..at(2, 4)
        };
        assert_eq!(
            emit(&mut c, |c, w| c.go_to(w, Point::new(0, 5))),
            b"\x1b[m\r\n"
        );
        assert!(c.is_default_colors());
    }

    #[test]
    fn elsewhere_is_absolute() {
        let mut c = at(2, 2);
        assert_eq!(
            emit(&mut c, |c, w| c.go_to(w, Point::new(10, 2))),
            b"\x1b[3;11H"
        );
        assert_eq!(
            emit(&mut c, |c, w| c.go_to(w, Point::new(1, 3))),
            b"\x1b[4;2H"
        );
    }

    #[test]
    fn glyph_advances_for_single_code_point() {
        let mut c = at(0, 0);
        assert_eq!(emit(&mut c, |c, w| c.write_glyph(w, "é")), "é".as_bytes());
        assert_eq!(c.x, Some(1));
    }

    #[test]
    fn glyph_invalidates_for_clusters_and_empty() {
        let mut c = at(0, 0);
        emit(&mut c, |c, w| c.write_glyph(w, "e\u{301}"));
        assert_eq!(c.x, None);
        assert_eq!(c.y, Some(0));

        let mut c = at(0, 0);
        emit(&mut c, |c, w| c.write_glyph(w, ""));
        assert_eq!(c.x, None);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut c = CursorState::RESET;
        assert!(emit(&mut c, |c, w| c.reset(w)).is_empty());

        let mut c = CursorState::START;
        assert_eq!(emit(&mut c, |c, w| c.reset(w)), b"\x1b[m");
        assert!(emit(&mut c, |c, w| c.reset(w)).is_empty());
    }

    #[test]
    fn clear_is_idempotent_but_always_invalidates() {
        let mut c = CursorState::RESET;
        assert_eq!(emit(&mut c, |c, w| c.clear(w)), b"\x1b[2J");
        assert_eq!(c.position(), None);

        emit(&mut c, |c, w| c.home(w));
        assert!(emit(&mut c, |c, w| c.clear(w)).is_empty());
        assert_eq!(c.position(), None);

        emit(&mut c, |c, w| c.home(w));
        emit(&mut c, |c, w| c.write_glyph(w, "x"));
        assert_eq!(emit(&mut c, |c, w| c.clear(w)), b"\x1b[2J");
    }

    #[test]
    fn reset_to_default_background_forgets_clear() {
        let mut c = CursorState {
            bg: Rgba::WHITE,
            ..CursorState::RESET
        };
        emit(&mut c, |c, w| c.clear(w));
        emit(&mut c, |c, w| c.reset(w));
        assert!(!c.cleared);
        assert_eq!(emit(&mut c, |c, w| c.clear(w)), b"\x1b[2J");

        // Foreground-only reset keeps the clear.
        let mut c = CursorState {
            fg: Rgba::WHITE,
            ..CursorState::RESET
        };
        emit(&mut c, |c, w| c.clear(w));
        emit(&mut c, |c, w| c.reset(w));
        assert!(emit(&mut c, |c, w| c.clear(w)).is_empty());
    }

    #[test]
    fn hide_show() {
        let mut c = CursorState::START;
        assert_eq!(emit(&mut c, |c, w| c.hide(w)), b"\x1b[?25l");
        assert_eq!(emit(&mut c, |c, w| c.show(w)), b"\x1b[?25h");
    }
}
