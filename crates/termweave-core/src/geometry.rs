#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Unlike screen coordinates, a [`Rect`] here may sit anywhere on a signed
//! plane: sub-views and composition sources are routinely offset from the
//! origin, and clipping handles the negative half.

use std::ops::{Add, Sub};

/// A signed cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

/// An axis-aligned box of cells.
///
/// The origin is inclusive, the right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Top-left corner.
    #[inline]
    pub const fn min(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Number of cells.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Intersection of two rectangles; empty (at the clamped corner) when
    /// they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other)
            .unwrap_or_else(|| Rect::new(self.x.max(other.x), self.y.max(other.y), 0, 0))
    }

    /// Intersection, or `None` when the overlap is empty.
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, (right - x) as u16, (bottom - y) as u16))
        } else {
            None
        }
    }

    /// The same rectangle moved by `delta`.
    #[inline]
    pub fn translate(&self, delta: Point) -> Rect {
        Rect::new(
            self.x.saturating_add(delta.x),
            self.y.saturating_add(delta.y),
            self.width,
            self.height,
        )
    }

    /// Every cell position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Point> + use<> {
        let (x0, right) = (self.x, self.right());
        (self.y..self.bottom())
            .flat_map(move |y| (x0..right).map(move |x| Point::new(x, y)))
    }
}
