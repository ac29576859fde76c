#![forbid(unsafe_code)]

//! Core primitives for termweave.
//!
//! Cell grids, views and masks are all addressed through the signed-origin
//! [`Rect`](geometry::Rect) defined here.

pub mod geometry;

pub use geometry::{Point, Rect};
