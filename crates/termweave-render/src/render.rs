#![forbid(unsafe_code)]

//! Diff rendering: the bytes that turn one grid into another.
//!
//! Cells are visited in row-major order. A cell is skipped when its glyph,
//! foreground and background all match the old grid; otherwise the cursor
//! moves there, only the color channels that differ from the tracked colors
//! are re-selected, and the glyph is written. An empty glyph is written and
//! compared as a single space.

use std::io::{self, Write};

use crate::color::ColorModel;
use crate::cursor::CursorState;
use crate::display::{CellRef, CellSource};

/// Counters from one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Cells visited.
    pub cells: usize,
    /// Cells written.
    pub changed: usize,
}

#[inline]
fn same_cell(a: &CellRef<'_>, b: &CellRef<'_>) -> bool {
    a.visible_text() == b.visible_text() && a.fg == b.fg && a.bg == b.bg
}

/// Render `new` over `old` (or everything, when `old` is `None`).
///
/// Ends with a single `CSI m` when the tracked colors are not the terminal
/// defaults, so the terminal is left with default attributes.
pub fn render<W, S>(
    w: &mut W,
    cursor: &mut CursorState,
    new: &S,
    old: Option<&dyn CellSource>,
    model: &ColorModel<'_>,
) -> io::Result<RenderStats>
where
    W: Write,
    S: CellSource + ?Sized,
{
    let bounds = new.bounds();
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "render",
        width = bounds.width,
        height = bounds.height,
        full = old.is_none()
    )
    .entered();

    let mut stats = RenderStats::default();
    for p in bounds.positions() {
        stats.cells += 1;
        let cell = new.at(p.x, p.y);
        if let Some(old) = old
            && same_cell(&cell, &old.at(p.x, p.y))
        {
            continue;
        }
        stats.changed += 1;
        // Past the last column the terminal holds a pending wrap; relative
        // motion along that row would land one column short.
        if cursor.y == Some(p.y) && cursor.x.is_some_and(|x| x >= bounds.right()) {
            cursor.x = None;
        }
        cursor.go_to(w, p)?;
        model.render(w, cursor, cell.fg, cell.bg)?;
        cursor.write_glyph(w, cell.visible_text())?;
    }
    cursor.reset(w)?;

    #[cfg(feature = "tracing")]
    tracing::trace!(changed = stats.changed, "render pass complete");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorDepth, DEFAULT_BG, DEFAULT_FG, Palettes, Rgba};
    use crate::display::{CellSink, Display};
    use termweave_core::geometry::Rect;

    fn run(
        cursor: &mut CursorState,
        new: &Display,
        old: Option<&Display>,
        depth: ColorDepth,
    ) -> (Vec<u8>, RenderStats) {
        let palettes = Palettes::xterm();
        let model = ColorModel::new(depth, &palettes);
        let mut buf = Vec::new();
        let old = old.map(|d| d as &dyn CellSource);
        let stats = render(&mut buf, cursor, new, old, &model).unwrap();
        (buf, stats)
    }

    fn text_grid(lines: &[&str]) -> Display {
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut d = Display::new(Rect::from_size(width as u16, lines.len() as u16));
        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                d.set(x as i32, y as i32, &ch.to_string(), DEFAULT_FG, DEFAULT_BG);
            }
        }
        d
    }

    #[test]
    fn identical_grids_emit_nothing() {
        let g = text_grid(&["hello", "world"]);
        let mut cursor = CursorState::RESET;
        let (out, stats) = run(&mut cursor, &g, Some(&g), ColorDepth::TrueColor);
        assert!(out.is_empty());
        assert_eq!(stats.changed, 0);
        assert_eq!(stats.cells, 10);
    }

    #[test]
    fn identical_grids_may_only_reset() {
        let g = text_grid(&["x"]);
        let mut cursor = CursorState {
            fg: Rgba::WHITE,
            ..CursorState::RESET
        };
        let (out, _) = run(&mut cursor, &g, Some(&g), ColorDepth::TrueColor);
        assert_eq!(out, b"\x1b[m");
    }

    #[test]
    fn single_white_glyph_after_clear() {
        let mut new = Display::new(Rect::from_size(3, 2));
        new.set(0, 0, "a", Rgba::WHITE, Rgba::BLACK);
        let old = Display::new(Rect::from_size(3, 2));

        let mut cursor = CursorState::RESET;
        let mut cleared = Vec::new();
        cursor.clear(&mut cleared).unwrap();

        let (out, stats) = run(&mut cursor, &new, Some(&old), ColorDepth::TrueColor);
        assert_eq!(out, b"\x1b[1;1H\x1b[97ma\x1b[m");
        assert_eq!(stats.changed, 1);
    }

    #[test]
    fn two_lines_use_crlf() {
        let new = text_grid(&["abc", "123"]);
        let old = Display::new(new.rect());
        let mut cursor = CursorState::RESET;
        let (out, _) = run(&mut cursor, &new, Some(&old), ColorDepth::Ansi256);
        assert_eq!(out, b"abc\r\n123");
        assert_eq!(cursor.x, Some(3));
        assert_eq!(cursor.y, Some(1));
    }

    #[test]
    fn right_margin_uses_absolute_motion() {
        let old = text_grid(&["abc"]);
        let new = text_grid(&["abd"]);
        let mut cursor = CursorState {
            x: Some(3),
            ..CursorState::RESET
        };
        let (out, _) = run(&mut cursor, &new, Some(&old), ColorDepth::TrueColor);
        assert_eq!(out, b"\x1b[1;3Hd");
    }

    #[test]
    fn empty_glyph_renders_as_space() {
        let mut new = Display::new(Rect::from_size(2, 1));
        new.set(1, 0, "z", DEFAULT_FG, DEFAULT_BG);
        let mut cursor = CursorState::RESET;
        let (out, stats) = run(&mut cursor, &new, None, ColorDepth::Ansi16);
        assert_eq!(out, b" z");
        assert_eq!(stats.changed, 2);
    }

    #[test]
    fn empty_and_space_compare_equal() {
        let mut new = Display::new(Rect::from_size(1, 1));
        new.set(0, 0, " ", Rgba::TRANSPARENT, Rgba::TRANSPARENT);
        let old = Display::new(new.rect());
        let mut cursor = CursorState::RESET;
        let (out, _) = run(&mut cursor, &new, Some(&old), ColorDepth::TrueColor);
        assert!(out.is_empty());
    }

    #[test]
    fn only_changed_cells_are_written() {
        let old = text_grid(&["abcd"]);
        let new = text_grid(&["abXd"]);
        let mut cursor = CursorState::RESET;
        let (out, stats) = run(&mut cursor, &new, Some(&old), ColorDepth::TrueColor);
        assert_eq!(out, b"\x1b[1;3HX");
        assert_eq!(stats.changed, 1);
    }

    #[test]
    fn adjacent_changes_skip_motion() {
        let old = text_grid(&["aaaa"]);
        let new = text_grid(&["abba"]);
        let mut cursor = CursorState::START;
        cursor.fg = DEFAULT_FG;
        cursor.bg = DEFAULT_BG;
        let (out, _) = run(&mut cursor, &new, Some(&old), ColorDepth::TrueColor);
        assert_eq!(out, b"\x1b[1;2Hbb");
    }

    #[test]
    fn colors_change_per_channel() {
        let red = Rgba::rgb(205, 0, 0);
        let mut new = Display::new(Rect::from_size(2, 1));
        new.set(0, 0, "a", red, DEFAULT_BG);
        new.set(1, 0, "b", red, red);
        let mut cursor = CursorState::RESET;
        let (out, _) = run(&mut cursor, &new, None, ColorDepth::Ansi16);
        assert_eq!(out, b"\x1b[31ma\x1b[41mb\x1b[m");
        assert!(cursor.is_default_colors());
    }

    #[test]
    fn same_palette_entry_is_selected_once() {
        let mut new = Display::new(Rect::from_size(2, 1));
        new.set(0, 0, "a", Rgba::rgb(250, 10, 10), DEFAULT_BG);
        new.set(1, 0, "b", Rgba::rgb(205, 0, 0), DEFAULT_BG);
        let mut cursor = CursorState::RESET;
        let (out, _) = run(&mut cursor, &new, None, ColorDepth::Ansi8);
        assert_eq!(out, b"\x1b[31mab\x1b[m");
    }

    #[test]
    fn color_quantized_to_default_emits_no_sgr() {
        let mut new = Display::new(Rect::from_size(1, 1));
        new.set(0, 0, "a", Rgba::rgb(230, 230, 230), Rgba::rgb(3, 3, 3));
        let mut cursor = CursorState::RESET;
        let (out, _) = run(&mut cursor, &new, None, ColorDepth::Ansi16);
        assert_eq!(out, b"a");
        assert!(cursor.is_default_colors());
    }

    #[test]
    fn mono_emits_text_only() {
        let mut new = Display::new(Rect::from_size(2, 1));
        new.set(0, 0, "a", Rgba::rgb(1, 2, 3), Rgba::rgb(4, 5, 6));
        new.set(1, 0, "b", Rgba::WHITE, Rgba::WHITE);
        let mut cursor = CursorState::RESET;
        let (out, _) = run(&mut cursor, &new, None, ColorDepth::Mono);
        assert_eq!(out, b"ab");
    }

    #[test]
    fn multi_code_point_glyph_forces_absolute_move() {
        let mut new = Display::new(Rect::from_size(2, 1));
        new.set(0, 0, "e\u{301}", DEFAULT_FG, DEFAULT_BG);
        new.set(1, 0, "x", DEFAULT_FG, DEFAULT_BG);
        let mut cursor = CursorState::RESET;
        let (out, _) = run(&mut cursor, &new, None, ColorDepth::TrueColor);
        assert_eq!(out, "e\u{301}\x1b[1;2Hx".as_bytes());
    }
}
