#![forbid(unsafe_code)]

//! A tokenizer bound to an ingest state.

use termweave_core::geometry::Point;
use termweave_render::display::Display;

use crate::state::VtState;
use crate::tokenizer::{Tokenizer, VteTokenizer};

/// Bytes in, committed grid out.
///
/// [`feed`](Self::feed) always flushes pending prints before returning, so
/// the grid reflects every complete character seen so far. Escape sequences
/// split across calls are carried by the tokenizer.
pub struct VirtualTerminal {
    tokenizer: Box<dyn Tokenizer>,
    state: VtState,
}

impl VirtualTerminal {
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_tokenizer(width, height, Box::new(VteTokenizer::new()))
    }

    /// Use a custom tokenizer.
    pub fn with_tokenizer(width: u16, height: u16, tokenizer: Box<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            state: VtState::new(width, height),
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.tokenizer.advance(bytes, &mut self.state);
        self.state.flush();
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.state.resize(width, height);
    }

    /// Full reset, including any half-parsed sequence.
    pub fn reset(&mut self) {
        self.tokenizer.reset();
        self.state.reset();
    }

    #[inline]
    pub fn grid(&self) -> &Display {
        self.state.grid()
    }

    #[inline]
    pub fn cursor(&self) -> Point {
        self.state.cursor()
    }

    #[inline]
    pub fn state(&self) -> &VtState {
        &self.state
    }

    #[inline]
    pub fn size(&self) -> (u16, u16) {
        (self.state.width(), self.state.height())
    }
}

impl std::fmt::Debug for VirtualTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualTerminal")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{Token, TokenSink};
    use termweave_render::display::CellSource;

    #[test]
    fn feed_flushes_each_call() {
        let mut vt = VirtualTerminal::new(4, 1);
        vt.feed(b"ab");
        assert_eq!(vt.grid().row_text(0), "ab  ");
        assert_eq!(vt.cursor(), Point::new(2, 0));
    }

    #[test]
    fn split_escape_across_feeds() {
        let mut vt = VirtualTerminal::new(4, 1);
        vt.feed(b"a\x1b[");
        vt.feed(b"3Gb");
        assert_eq!(vt.grid().row_text(0), "a b ");
    }

    #[test]
    fn reset_drops_partial_sequence_and_grid() {
        let mut vt = VirtualTerminal::new(3, 1);
        vt.feed(b"ab\x1b[");
        vt.reset();
        vt.feed(b"2Gx");
        assert_eq!(vt.grid().row_text(0), "2Gx");
    }

    /// Treats every byte as a printable ASCII character.
    struct RawTokenizer;

    impl Tokenizer for RawTokenizer {
        fn advance(&mut self, bytes: &[u8], sink: &mut dyn TokenSink) {
            for &b in bytes {
                sink.token(Token::Print(b as char));
            }
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn custom_tokenizer() {
        let mut vt = VirtualTerminal::with_tokenizer(6, 1, Box::new(RawTokenizer));
        vt.feed(b"\x1b[1m");
        assert_eq!(vt.grid().at(0, 0).text, "\u{1b}");
        assert_eq!(vt.grid().at(1, 0).text, "[");
    }

    #[test]
    fn resize_reports_size() {
        let mut vt = VirtualTerminal::new(3, 2);
        vt.resize(5, 1);
        assert_eq!(vt.size(), (5, 1));
        assert_eq!(vt.grid().row_text(0), "     ");
    }
}
