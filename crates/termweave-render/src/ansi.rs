#![forbid(unsafe_code)]

//! ANSI escape sequence generation helpers.
//!
//! Pure byte-generation functions; state tracking lives in
//! [`CursorState`](crate::cursor::CursorState).
//!
//! | Sequence | Description |
//! |----------|-------------|
//! | `ESC [ row ; col H` | CUP (1-indexed) |
//! | `ESC [ H` | Home |
//! | `ESC [ 2 J` | Erase display |
//! | `ESC [ m` | SGR reset |
//! | `ESC [ 3x m` / `ESC [ 9x m` | 16-color foreground |
//! | `ESC [ 38 ; 5 ; n m` | 256-color foreground |
//! | `ESC [ 38 ; 2 ; r ; g ; b m` | true color foreground |
//! | `ESC [ ? 25 l` / `ESC [ ? 25 h` | Hide / show cursor |

use std::io::{self, Write};

/// SGR reset: `CSI m`
pub const SGR_RESET: &[u8] = b"\x1b[m";

/// Erase the whole display: `CSI 2 J`
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Cursor to the origin: `CSI H`
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// Hide cursor: `CSI ? 25 l`
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Show cursor: `CSI ? 25 h`
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

/// Backspace, one column left.
pub const BS: &[u8] = b"\x08";

/// Carriage return then line feed.
pub const CRLF: &[u8] = b"\r\n";

#[inline]
pub fn sgr_reset<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SGR_RESET)
}

#[inline]
pub fn clear_screen<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CLEAR_SCREEN)
}

#[inline]
pub fn cursor_home<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_HOME)
}

#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_HIDE)
}

#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_SHOW)
}

/// CUP (Cursor Position): `CSI row ; col H`
///
/// Row and col are 0-indexed input, written 1-indexed.
pub fn cup<W: Write>(w: &mut W, row: i32, col: i32) -> io::Result<()> {
    write!(
        w,
        "\x1b[{};{}H",
        row.saturating_add(1),
        col.saturating_add(1)
    )
}

/// Foreground from a 256-color index, using the short 16-color codes
/// (30-37, 90-97) where they exist.
pub fn sgr_fg_indexed<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    match index {
        0..=7 => write!(w, "\x1b[{}m", 30 + index),
        8..=15 => write!(w, "\x1b[{}m", 90 + index - 8),
        _ => write!(w, "\x1b[38;5;{index}m"),
    }
}

/// Background from a 256-color index (40-47, 100-107, else `48;5;n`).
pub fn sgr_bg_indexed<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    match index {
        0..=7 => write!(w, "\x1b[{}m", 40 + index),
        8..=15 => write!(w, "\x1b[{}m", 100 + index - 8),
        _ => write!(w, "\x1b[48;5;{index}m"),
    }
}

/// True color foreground: `CSI 38;2;r;g;b m`
pub fn sgr_fg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[38;2;{r};{g};{b}m")
}

/// True color background: `CSI 48;2;r;g;b m`
pub fn sgr_bg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[48;2;{r};{g};{b}m")
}
