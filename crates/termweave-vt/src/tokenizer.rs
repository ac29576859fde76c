#![forbid(unsafe_code)]

//! Escape-sequence tokenization.
//!
//! A [`Tokenizer`] splits a byte stream into [`Token`]s and hands them to a
//! [`TokenSink`]. The ingest state machine only ever sees tokens, so the
//! tokenizer can be swapped; [`VteTokenizer`] is the default, backed by the
//! `vte` crate.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Invalid UTF-8 | Corrupted input | Replacement character printed |
//! | Truncated sequence | Chunk boundary | Buffered until the next call |
//! | OSC / DCS | Unsupported strings | Swallowed, no token |

use smallvec::SmallVec;
use vte::{Params, Parser, Perform};

/// One lexical unit of the VT protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A printable character.
    Print(char),
    /// A C0/C1 control byte (LF, CR, HT, BS, ...).
    Execute(u8),
    /// `ESC [ params intermediates action`.
    ///
    /// Colon sub-parameters are flattened into `params`; an omitted
    /// parameter reads as 0.
    Csi {
        params: &'a [u16],
        intermediates: &'a [u8],
        action: char,
    },
    /// `ESC intermediates action`.
    Esc {
        intermediates: &'a [u8],
        action: u8,
    },
}

/// Receives tokens.
pub trait TokenSink {
    fn token(&mut self, token: Token<'_>);
}

impl<F: FnMut(Token<'_>)> TokenSink for F {
    fn token(&mut self, token: Token<'_>) {
        self(token)
    }
}

/// Splits bytes into tokens. Incomplete sequences carry over between calls.
pub trait Tokenizer: Send + Sync {
    fn advance(&mut self, bytes: &[u8], sink: &mut dyn TokenSink);

    /// Drop any partially parsed sequence.
    fn reset(&mut self);
}

/// [`Tokenizer`] over `vte::Parser`.
pub struct VteTokenizer {
    parser: Parser,
    params: SmallVec<[u16; 16]>,
}

impl VteTokenizer {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            params: SmallVec::new(),
        }
    }
}

impl Default for VteTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VteTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VteTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for VteTokenizer {
    fn advance(&mut self, bytes: &[u8], sink: &mut dyn TokenSink) {
        let mut adapter = VteAdapter {
            sink,
            params: &mut self.params,
        };
        self.parser.advance(&mut adapter, bytes);
    }

    fn reset(&mut self) {
        self.parser = Parser::new();
        self.params.clear();
    }
}

/// Bridges vte's `Perform` callbacks to a [`TokenSink`].
struct VteAdapter<'a> {
    sink: &'a mut dyn TokenSink,
    params: &'a mut SmallVec<[u16; 16]>,
}

impl Perform for VteAdapter<'_> {
    fn print(&mut self, c: char) {
        self.sink.token(Token::Print(c));
    }

    fn execute(&mut self, byte: u8) {
        self.sink.token(Token::Execute(byte));
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        if ignore {
            return;
        }
        self.params.clear();
        for group in params.iter() {
            self.params.extend_from_slice(group);
        }
        self.sink.token(Token::Csi {
            params: &self.params[..],
            intermediates,
            action,
        });
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], ignore: bool, byte: u8) {
        if ignore {
            return;
        }
        self.sink.token(Token::Esc {
            intermediates,
            action: byte,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Owned {
        Print(char),
        Execute(u8),
        Csi(Vec<u16>, Vec<u8>, char),
        Esc(Vec<u8>, u8),
    }

    fn collect(tokenizer: &mut VteTokenizer, bytes: &[u8]) -> Vec<Owned> {
        let mut out = Vec::new();
        let mut sink = |t: Token<'_>| {
            out.push(match t {
                Token::Print(c) => Owned::Print(c),
                Token::Execute(b) => Owned::Execute(b),
                Token::Csi {
                    params,
                    intermediates,
                    action,
                } => Owned::Csi(params.to_vec(), intermediates.to_vec(), action),
                Token::Esc {
                    intermediates,
                    action,
                } => Owned::Esc(intermediates.to_vec(), action),
            })
        };
        tokenizer.advance(bytes, &mut sink);
        out
    }

    #[test]
    fn prints_and_controls() {
        let mut t = VteTokenizer::new();
        assert_eq!(
            collect(&mut t, b"a\r\n\x08"),
            vec![
                Owned::Print('a'),
                Owned::Execute(b'\r'),
                Owned::Execute(b'\n'),
                Owned::Execute(0x08),
            ]
        );
    }

    #[test]
    fn csi_params() {
        let mut t = VteTokenizer::new();
        assert_eq!(
            collect(&mut t, b"\x1b[12;34H\x1b[38;5;196m"),
            vec![
                Owned::Csi(vec![12, 34], vec![], 'H'),
                Owned::Csi(vec![38, 5, 196], vec![], 'm'),
            ]
        );
    }

    #[test]
    fn empty_sgr_reads_as_zero() {
        let mut t = VteTokenizer::new();
        assert_eq!(
            collect(&mut t, b"\x1b[m"),
            vec![Owned::Csi(vec![0], vec![], 'm')]
        );
    }

    #[test]
    fn colon_subparams_flatten() {
        let mut t = VteTokenizer::new();
        assert_eq!(
            collect(&mut t, b"\x1b[38:2:1:2:3m"),
            vec![Owned::Csi(vec![38, 2, 1, 2, 3], vec![], 'm')]
        );
    }

    #[test]
    fn private_marker_is_an_intermediate() {
        let mut t = VteTokenizer::new();
        assert_eq!(
            collect(&mut t, b"\x1b[?25l"),
            vec![Owned::Csi(vec![25], vec![b'?'], 'l')]
        );
    }

    #[test]
    fn esc_sequences() {
        let mut t = VteTokenizer::new();
        assert_eq!(
            collect(&mut t, b"\x1b7\x1b(B"),
            vec![Owned::Esc(vec![], b'7'), Owned::Esc(vec![b'('], b'B')]
        );
    }

    #[test]
    fn split_sequence_carries_over() {
        let mut t = VteTokenizer::new();
        assert!(collect(&mut t, b"\x1b[3").is_empty());
        assert_eq!(
            collect(&mut t, b"1m"),
            vec![Owned::Csi(vec![31], vec![], 'm')]
        );
    }

    #[test]
    fn split_utf8_carries_over() {
        let mut t = VteTokenizer::new();
        let bytes = "é".as_bytes();
        assert!(collect(&mut t, &bytes[..1]).is_empty());
        assert_eq!(collect(&mut t, &bytes[1..]), vec![Owned::Print('é')]);
    }

    #[test]
    fn reset_drops_partial_sequence() {
        let mut t = VteTokenizer::new();
        collect(&mut t, b"\x1b[3");
        t.reset();
        assert_eq!(
            collect(&mut t, b"1m"),
            vec![Owned::Print('1'), Owned::Print('m')]
        );
    }

    #[test]
    fn osc_is_swallowed() {
        let mut t = VteTokenizer::new();
        assert_eq!(
            collect(&mut t, b"\x1b]0;title\x07x"),
            vec![Owned::Print('x')]
        );
    }
}
