#![forbid(unsafe_code)]

//! The cell grid: three aligned planes over a rectangle.
//!
//! A [`Display`] stores, for every cell of its [`Rect`], a glyph string, a
//! foreground and a background [`Rgba`]. An empty glyph is transparent: it
//! draws nothing, not even a space. Addressing uses absolute coordinates,
//! so a display need not start at the origin.
//!
//! [`View`] and [`ViewMut`] address a sub-rectangle of a display without
//! copying. Out-of-bounds reads return [`CellRef::EMPTY`]; out-of-bounds
//! writes do nothing.
//!
//! [`compose`] layers one surface over another with a [`CompositeOp`],
//! optionally through a [`Mask`].

use termweave_core::geometry::{Point, Rect};

use crate::color::Rgba;

/// A borrowed view of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef<'a> {
    pub text: &'a str,
    pub fg: Rgba,
    pub bg: Rgba,
}

impl CellRef<'static> {
    /// Empty glyph with transparent colors.
    pub const EMPTY: Self = Self {
        text: "",
        fg: Rgba::TRANSPARENT,
        bg: Rgba::TRANSPARENT,
    };
}

impl CellRef<'_> {
    /// The glyph as the terminal shows it: empty renders as a space.
    #[inline]
    pub fn visible_text(&self) -> &str {
        if self.text.is_empty() { " " } else { self.text }
    }
}

/// Read access to a cell surface.
pub trait CellSource {
    /// The addressable rectangle.
    fn bounds(&self) -> Rect;

    /// The cell at `(x, y)`, or [`CellRef::EMPTY`] outside the bounds.
    fn at(&self, x: i32, y: i32) -> CellRef<'_>;
}

/// Write access to a cell surface. Writes outside the bounds are ignored.
pub trait CellSink: CellSource {
    fn set_text(&mut self, x: i32, y: i32, text: &str);

    fn set_colors(&mut self, x: i32, y: i32, fg: Rgba, bg: Rgba);

    fn set(&mut self, x: i32, y: i32, text: &str, fg: Rgba, bg: Rgba) {
        self.set_text(x, y, text);
        self.set_colors(x, y, fg, bg);
    }

    /// Set every cell of `rect` (clipped to the bounds).
    fn fill(&mut self, rect: Rect, text: &str, fg: Rgba, bg: Rgba) {
        let Some(rect) = rect.intersection_opt(&self.bounds()) else {
            return;
        };
        for p in rect.positions() {
            self.set(p.x, p.y, text, fg, bg);
        }
    }

    /// Make every cell of `rect` transparent.
    fn clear(&mut self, rect: Rect) {
        self.fill(rect, "", Rgba::TRANSPARENT, Rgba::TRANSPARENT);
    }
}

/// A rectangle of cells with text, foreground and background planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    rect: Rect,
    text: Vec<String>,
    fg: Vec<Rgba>,
    bg: Vec<Rgba>,
}

impl Display {
    /// A fully transparent display covering `rect`.
    pub fn new(rect: Rect) -> Self {
        let len = rect.area();
        Self {
            rect,
            text: vec![String::new(); len],
            fg: vec![Rgba::TRANSPARENT; len],
            bg: vec![Rgba::TRANSPARENT; len],
        }
    }

    /// Front and back displays over the same rectangle.
    pub fn pair(rect: Rect) -> (Self, Self) {
        (Self::new(rect), Self::new(rect))
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.rect.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.rect.height
    }

    /// Cells per row in the backing planes.
    #[inline]
    pub fn stride(&self) -> usize {
        self.rect.width as usize
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let col = (x - self.rect.x) as usize;
        let row = (y - self.rect.y) as usize;
        Some(row * self.stride() + col)
    }

    /// A read-only view of `rect`, clipped to this display.
    pub fn view(&self, rect: Rect) -> View<'_> {
        View {
            display: self,
            rect: rect.intersection(&self.rect),
        }
    }

    /// A writable view of `rect`, clipped to this display.
    pub fn view_mut(&mut self, rect: Rect) -> ViewMut<'_> {
        let rect = rect.intersection(&self.rect);
        ViewMut {
            display: self,
            rect,
        }
    }

    /// One row as a string, transparent cells shown as spaces.
    pub fn row_text(&self, y: i32) -> String {
        (self.rect.x..self.rect.right())
            .map(|x| self.at(x, y).visible_text().to_string())
            .collect()
    }

    /// Shift rows up by `n`, blanking the rows exposed at the bottom.
    pub fn scroll_up(&mut self, n: u16) {
        let n = (n as usize).min(self.rect.height as usize);
        if n == 0 {
            return;
        }
        let shift = n * self.stride();
        self.text.rotate_left(shift);
        self.fg.rotate_left(shift);
        self.bg.rotate_left(shift);
        let start = self.text.len() - shift;
        self.blank_range(start..self.text.len());
    }

    /// Shift rows down by `n`, blanking the rows exposed at the top.
    pub fn scroll_down(&mut self, n: u16) {
        let n = (n as usize).min(self.rect.height as usize);
        if n == 0 {
            return;
        }
        let shift = n * self.stride();
        self.text.rotate_right(shift);
        self.fg.rotate_right(shift);
        self.bg.rotate_right(shift);
        self.blank_range(0..shift);
    }

    fn blank_range(&mut self, range: std::ops::Range<usize>) {
        for t in &mut self.text[range.clone()] {
            t.clear();
        }
        self.fg[range.clone()].fill(Rgba::TRANSPARENT);
        self.bg[range].fill(Rgba::TRANSPARENT);
    }
}

impl CellSource for Display {
    #[inline]
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn at(&self, x: i32, y: i32) -> CellRef<'_> {
        match self.index(x, y) {
            Some(i) => CellRef {
                text: &self.text[i],
                fg: self.fg[i],
                bg: self.bg[i],
            },
            None => CellRef::EMPTY,
        }
    }
}

impl CellSink for Display {
    fn set_text(&mut self, x: i32, y: i32, text: &str) {
        if let Some(i) = self.index(x, y) {
            let cell = &mut self.text[i];
            cell.clear();
            cell.push_str(text);
        }
    }

    fn set_colors(&mut self, x: i32, y: i32, fg: Rgba, bg: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.fg[i] = fg;
            self.bg[i] = bg;
        }
    }
}

/// A read-only sub-rectangle of a [`Display`].
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    display: &'a Display,
    rect: Rect,
}

impl<'a> View<'a> {
    /// A nested view, clipped to this one.
    pub fn view(&self, rect: Rect) -> View<'a> {
        View {
            display: self.display,
            rect: rect.intersection(&self.rect),
        }
    }
}

impl CellSource for View<'_> {
    #[inline]
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn at(&self, x: i32, y: i32) -> CellRef<'_> {
        if self.rect.contains(x, y) {
            self.display.at(x, y)
        } else {
            CellRef::EMPTY
        }
    }
}

/// A writable sub-rectangle of a [`Display`].
#[derive(Debug)]
pub struct ViewMut<'a> {
    display: &'a mut Display,
    rect: Rect,
}

impl ViewMut<'_> {
    /// A nested writable view, clipped to this one.
    pub fn view_mut(&mut self, rect: Rect) -> ViewMut<'_> {
        let rect = rect.intersection(&self.rect);
        ViewMut {
            display: &mut *self.display,
            rect,
        }
    }

    /// Read-only access to the same region.
    pub fn as_view(&self) -> View<'_> {
        View {
            display: &*self.display,
            rect: self.rect,
        }
    }
}

impl CellSource for ViewMut<'_> {
    #[inline]
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn at(&self, x: i32, y: i32) -> CellRef<'_> {
        if self.rect.contains(x, y) {
            self.display.at(x, y)
        } else {
            CellRef::EMPTY
        }
    }
}

impl CellSink for ViewMut<'_> {
    fn set_text(&mut self, x: i32, y: i32, text: &str) {
        if self.rect.contains(x, y) {
            self.display.set_text(x, y, text);
        }
    }

    fn set_colors(&mut self, x: i32, y: i32, fg: Rgba, bg: Rgba) {
        if self.rect.contains(x, y) {
            self.display.set_colors(x, y, fg, bg);
        }
    }
}

/// How source colors combine with destination colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOp {
    /// Porter-Duff source-over.
    #[default]
    Over,
    /// Source replaces destination.
    Src,
}

impl CompositeOp {
    #[inline]
    pub fn apply(self, src: Rgba, dst: Rgba) -> Rgba {
        match self {
            Self::Over => src.over(dst),
            Self::Src => src,
        }
    }
}

/// Restricts which cells a composition touches.
pub trait Mask {
    fn bounds(&self) -> Rect;

    fn covers(&self, x: i32, y: i32) -> bool;
}

impl Mask for Rect {
    #[inline]
    fn bounds(&self) -> Rect {
        *self
    }

    #[inline]
    fn covers(&self, x: i32, y: i32) -> bool {
        self.contains(x, y)
    }
}

/// Compose `src` (starting at `sp`) onto the `r` region of `dst`.
pub fn compose<D, S>(dst: &mut D, r: Rect, src: &S, sp: Point, op: CompositeOp)
where
    D: CellSink + ?Sized,
    S: CellSource + ?Sized,
{
    compose_masked(dst, r, src, sp, None, Point::ORIGIN, op);
}

/// Compose `src` onto `dst` through `mask` (aligned at `mp`).
///
/// `r` is clipped to the destination bounds, the source bounds and the mask
/// bounds (each translated so that `sp`/`mp` line up with `r`'s corner),
/// and `sp`/`mp` shift by however much `r`'s corner moved. Per cell:
///
/// * a non-empty source glyph replaces the destination glyph;
/// * `dst.bg = src.bg ⊕ dst.bg`;
/// * `dst.fg = src.fg ⊕ (src.bg ⊕ dst.fg)`.
pub fn compose_masked<D, S>(
    dst: &mut D,
    r: Rect,
    src: &S,
    sp: Point,
    mask: Option<&dyn Mask>,
    mp: Point,
    op: CompositeOp,
) where
    D: CellSink + ?Sized,
    S: CellSource + ?Sized,
{
    let Some((r, sp, mp)) = clip(dst.bounds(), r, src.bounds(), sp, mask, mp) else {
        return;
    };

    for p in r.positions() {
        let offset = p - r.min();
        if let Some(mask) = mask {
            let m = mp + offset;
            if !mask.covers(m.x, m.y) {
                continue;
            }
        }
        let s = src.at(sp.x + offset.x, sp.y + offset.y);
        let d = dst.at(p.x, p.y);
        let bg = op.apply(s.bg, d.bg);
        let fg = op.apply(s.fg, op.apply(s.bg, d.fg));
        if !s.text.is_empty() {
            dst.set_text(p.x, p.y, s.text);
        }
        dst.set_colors(p.x, p.y, fg, bg);
    }
}

fn clip(
    dst: Rect,
    r: Rect,
    src: Rect,
    sp: Point,
    mask: Option<&dyn Mask>,
    mp: Point,
) -> Option<(Rect, Point, Point)> {
    let orig = r.min();
    let mut r = r.intersection_opt(&dst)?;
    r = r.intersection_opt(&src.translate(orig - sp))?;
    if let Some(mask) = mask {
        r = r.intersection_opt(&mask.bounds().translate(orig - mp))?;
    }
    let delta = r.min() - orig;
    Some((r, sp + delta, mp + delta))
}
