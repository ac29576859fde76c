#![forbid(unsafe_code)]

//! Decoding side of termweave.
//!
//! Turns another program's output stream into a cell grid that can be
//! composed into a [`termweave_render::Display`] and rendered like any other.
//!
//! - [`tokenizer`] splits bytes into tokens ([`VteTokenizer`] by default).
//! - [`state::VtState`] applies tokens to a grid; [`sgr`] decodes colors.
//! - [`VirtualTerminal`] pairs the two.
//! - [`VtWriter`] shares a terminal between a writer thread and a reader,
//!   with a coalescing redraw signal ([`Redraws`]).
//! - [`spawn_pump`] feeds a writer from any `Read` source.

pub mod pump;
pub mod sgr;
pub mod state;
pub mod terminal;
pub mod tokenizer;
pub mod writer;

pub use pump::spawn_pump;
pub use sgr::Pen;
pub use state::VtState;
pub use terminal::VirtualTerminal;
pub use tokenizer::{Token, TokenSink, Tokenizer, VteTokenizer};
pub use writer::{Redraws, VtWriter};
