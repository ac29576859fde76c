#![forbid(unsafe_code)]

//! Encoding side of termweave.
//!
//! A [`Display`] holds the desired screen as three aligned planes (glyphs,
//! foreground, background). [`render::render`] compares it with the
//! previously shown grid and drives a [`CursorState`] so only the changed
//! cells are written, with the cheapest cursor motion the tracked state
//! allows. [`Presenter`] wraps that loop around a real output sink.

pub mod ansi;
pub mod color;
pub mod cursor;
pub mod display;
pub mod presenter;
pub mod render;

pub use color::{
    ColorDepth, ColorModel, DEFAULT_BG, DEFAULT_FG, Palettes, ParseColorDepthError, Rgba,
};
pub use cursor::CursorState;
pub use display::{
    CellRef, CellSink, CellSource, CompositeOp, Display, Mask, View, ViewMut, compose,
    compose_masked,
};
pub use presenter::Presenter;
pub use render::RenderStats;
pub use termweave_core::geometry::{Point, Rect};
