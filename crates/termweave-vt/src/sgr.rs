#![forbid(unsafe_code)]

//! SGR (Select Graphic Rendition) decoding into pen colors.
//!
//! Only colors are tracked. Attribute codes (bold, underline, ...) are
//! accepted and ignored. Extended colors (`38`/`48`) accept the palette form
//! `5;n` and the RGB form `2;r;g;b`; a missing or malformed sub-sequence
//! selects palette color 0 instead of failing.

use termweave_render::color::{DEFAULT_BG, DEFAULT_FG, Palettes, Rgba};

/// The colors new text is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pen {
    pub fg: Rgba,
    pub bg: Rgba,
}

impl Pen {
    /// Terminal default colors.
    pub const DEFAULT: Self = Self {
        fg: DEFAULT_FG,
        bg: DEFAULT_BG,
    };
}

impl Default for Pen {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Apply one SGR parameter list to `pen`.
pub fn apply(params: &[u16], pen: &mut Pen, palettes: &Palettes) {
    if params.is_empty() {
        *pen = Pen::DEFAULT;
        return;
    }

    let mut i = 0;
    while i < params.len() {
        let code = params[i];
        i += 1;
        match code {
            0 => *pen = Pen::DEFAULT,
            30..=37 => pen.fg = palettes.color((code - 30) as u8),
            39 => pen.fg = DEFAULT_FG,
            40..=47 => pen.bg = palettes.color((code - 40) as u8),
            49 => pen.bg = DEFAULT_BG,
            90..=97 => pen.fg = palettes.color((code - 90 + 8) as u8),
            100..=107 => pen.bg = palettes.color((code - 100 + 8) as u8),
            38 | 48 => {
                let (color, used) = extended(&params[i..], palettes);
                i += used;
                if code == 38 {
                    pen.fg = color;
                } else {
                    pen.bg = color;
                }
            }
            _ => {}
        }
    }
}

/// Decode the parameters following a `38`/`48`, returning the color and how
/// many parameters it consumed.
fn extended(rest: &[u16], palettes: &Palettes) -> (Rgba, usize) {
    let fallback = palettes.color(0);
    match rest {
        [5, n, ..] => match u8::try_from(*n) {
            Ok(n) => (palettes.color(n), 2),
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(index = *n, "SGR palette index out of range");
                (fallback, 2)
            }
        },
        [2, r, g, b, ..] => match (u8::try_from(*r), u8::try_from(*g), u8::try_from(*b)) {
            (Ok(r), Ok(g), Ok(b)) => (Rgba::rgb(r, g, b), 4),
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!(r = *r, g = *g, b = *b, "SGR rgb component out of range");
                (fallback, 4)
            }
        },
        _ => {
            #[cfg(feature = "tracing")]
            tracing::debug!(params = ?rest, "malformed extended SGR color");
            (fallback, rest.len())
        }
    }
}
