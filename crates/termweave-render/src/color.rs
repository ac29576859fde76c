#![forbid(unsafe_code)]

//! Colors, palettes, and color-depth quantization.
//!
//! [`Rgba`] is the only color type in the crate. A [`ColorModel`] pairs a
//! [`ColorDepth`] with the shared [`Palettes`] and turns requested colors
//! into SGR bytes, tracking what the terminal currently uses in a
//! [`CursorState`].

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::ansi;
use crate::cursor::CursorState;

/// A packed straight-alpha RGBA color: `r << 24 | g << 16 | b << 8 | a`.
///
/// Alpha 0 means "unspecified": the cell inherits whatever lies beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Rgba(pub u32);

impl Rgba {
    /// Fully transparent (alpha = 0).
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque RGB color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Create an RGBA color with explicit alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn is_transparent(self) -> bool {
        self.a() == 0
    }

    #[inline]
    const fn div_round_u8(numer: u64, denom: u64) -> u8 {
        let v = (numer + (denom / 2)) / denom;
        if v > 255 { 255 } else { v as u8 }
    }

    /// Porter-Duff SourceOver: `self over dst`.
    ///
    /// Computed in exact rational form on straight alpha and rounded once.
    #[inline]
    pub fn over(self, dst: Self) -> Self {
        let s_a = self.a() as u64;
        if s_a == 255 {
            return self;
        }
        if s_a == 0 {
            return dst;
        }

        let d_a = dst.a() as u64;
        let inv_s_a = 255 - s_a;

        // numer_a = 255*s_a + d_a*(255 - s_a), i.e. out_a scaled by 255.
        let numer_a = 255 * s_a + d_a * inv_s_a;
        let out_a = Self::div_round_u8(numer_a, 255);

        let channel = |s: u8, d: u8| {
            Self::div_round_u8((s as u64) * s_a * 255 + (d as u64) * d_a * inv_s_a, numer_a)
        };

        Self::rgba(
            channel(self.r(), dst.r()),
            channel(self.g(), dst.g()),
            channel(self.b(), dst.b()),
            out_a,
        )
    }

    /// Squared Euclidean distance over the RGB channels. Alpha is ignored.
    #[inline]
    pub fn distance_sq(self, other: Self) -> u32 {
        let d = |a: u8, b: u8| {
            let v = a as i32 - b as i32;
            (v * v) as u32
        };
        d(self.r(), other.r()) + d(self.g(), other.g()) + d(self.b(), other.b())
    }
}

/// xterm's 16 system colors.
const SYSTEM_COLORS: [Rgba; 16] = [
    Rgba::rgb(0, 0, 0),
    Rgba::rgb(205, 0, 0),
    Rgba::rgb(0, 205, 0),
    Rgba::rgb(205, 205, 0),
    Rgba::rgb(0, 0, 238),
    Rgba::rgb(205, 0, 205),
    Rgba::rgb(0, 205, 205),
    Rgba::rgb(229, 229, 229),
    Rgba::rgb(127, 127, 127),
    Rgba::rgb(255, 0, 0),
    Rgba::rgb(0, 255, 0),
    Rgba::rgb(255, 255, 0),
    Rgba::rgb(92, 92, 255),
    Rgba::rgb(255, 0, 255),
    Rgba::rgb(0, 255, 255),
    Rgba::rgb(255, 255, 255),
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

/// Terminal default foreground (palette index 7).
pub const DEFAULT_FG: Rgba = SYSTEM_COLORS[7];
/// Terminal default background (palette index 0).
pub const DEFAULT_BG: Rgba = SYSTEM_COLORS[0];

/// The 8, 16 and 256 color tables plus the exact reverse index of the
/// 256-color table.
///
/// Build once with [`Palettes::xterm`] and share by reference.
#[derive(Debug, Clone)]
pub struct Palettes {
    ansi256: Vec<Rgba>,
    exact: HashMap<Rgba, u8>,
}

impl Palettes {
    /// The standard xterm tables.
    pub fn xterm() -> Self {
        let mut ansi256 = Vec::with_capacity(256);
        ansi256.extend_from_slice(&SYSTEM_COLORS);
        for i in 0..216usize {
            ansi256.push(Rgba::rgb(
                CUBE_LEVELS[i / 36],
                CUBE_LEVELS[(i / 6) % 6],
                CUBE_LEVELS[i % 6],
            ));
        }
        for i in 0..24u8 {
            let v = 8 + 10 * i;
            ansi256.push(Rgba::rgb(v, v, v));
        }

        let mut exact = HashMap::with_capacity(256);
        for (i, c) in ansi256.iter().enumerate() {
            exact.entry(*c).or_insert(i as u8);
        }

        Self { ansi256, exact }
    }

    /// The color table for a depth; empty for depths without a palette.
    pub fn palette(&self, depth: ColorDepth) -> &[Rgba] {
        match depth {
            ColorDepth::Mono | ColorDepth::TrueColor => &[],
            ColorDepth::Ansi8 => &self.ansi256[..8],
            ColorDepth::Ansi16 => &self.ansi256[..16],
            ColorDepth::Ansi256 => &self.ansi256,
        }
    }

    /// Color at a 256-color index.
    #[inline]
    pub fn color(&self, index: u8) -> Rgba {
        self.ansi256[index as usize]
    }

    /// Lowest 256-color index whose color is exactly `color` (alpha included).
    #[inline]
    pub fn exact(&self, color: Rgba) -> Option<u8> {
        self.exact.get(&color).copied()
    }

    /// Index of the nearest palette entry for `depth`, or `None` for depths
    /// without a palette.
    pub fn quantize(&self, depth: ColorDepth, color: Rgba) -> Option<u8> {
        nearest(self.palette(depth), color)
    }
}

impl Default for Palettes {
    fn default() -> Self {
        Self::xterm()
    }
}

/// First palette entry at minimum RGB distance.
fn nearest(palette: &[Rgba], color: Rgba) -> Option<u8> {
    let mut best: Option<(u8, u32)> = None;
    for (i, c) in palette.iter().enumerate() {
        let d = c.distance_sq(color);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i as u8, d));
            if d == 0 {
                break;
            }
        }
    }
    best.map(|(i, _)| i)
}

/// How many colors the terminal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorDepth {
    /// No color output.
    Mono,
    /// The 8 base ANSI colors.
    Ansi8,
    /// 8 base plus 8 bright colors.
    Ansi16,
    /// The xterm 256-color palette.
    Ansi256,
    /// 24-bit RGB.
    #[default]
    TrueColor,
}

#[derive(Debug, Clone, Default)]
struct DetectInputs {
    no_color: bool,
    term: String,
    colorterm: String,
}

impl DetectInputs {
    fn from_env() -> Self {
        Self {
            no_color: env::var("NO_COLOR").is_ok(),
            term: env::var("TERM").unwrap_or_default(),
            colorterm: env::var("COLORTERM").unwrap_or_default(),
        }
    }
}

impl ColorDepth {
    /// Detect the depth from `NO_COLOR`, `COLORTERM` and `TERM`.
    pub fn detect() -> Self {
        Self::detect_from_inputs(&DetectInputs::from_env())
    }

    fn detect_from_inputs(env: &DetectInputs) -> Self {
        let term = env.term.to_ascii_lowercase();
        let colorterm = env.colorterm.to_ascii_lowercase();

        if env.no_color || term.is_empty() || term == "dumb" {
            Self::Mono
        } else if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            Self::TrueColor
        } else if term.contains("256") {
            Self::Ansi256
        } else if term.contains("color") {
            Self::Ansi16
        } else {
            Self::Ansi8
        }
    }

    /// Number of palette entries, `None` for mono and true color.
    pub const fn palette_len(self) -> Option<usize> {
        match self {
            Self::Mono | Self::TrueColor => None,
            Self::Ansi8 => Some(8),
            Self::Ansi16 => Some(16),
            Self::Ansi256 => Some(256),
        }
    }
}

impl fmt::Display for ColorDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mono => "mono",
            Self::Ansi8 => "8",
            Self::Ansi16 => "16",
            Self::Ansi256 => "256",
            Self::TrueColor => "truecolor",
        })
    }
}

/// Error parsing a [`ColorDepth`] name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseColorDepthError {
    /// The input was empty.
    Empty,
    /// The input named no known depth.
    Unknown(String),
}

impl fmt::Display for ParseColorDepthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty color depth"),
            Self::Unknown(s) => write!(f, "unknown color depth: {s:?}"),
        }
    }
}

impl std::error::Error for ParseColorDepthError {}

impl FromStr for ColorDepth {
    type Err = ParseColorDepthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseColorDepthError::Empty);
        }
        match s.to_ascii_lowercase().as_str() {
            "mono" | "none" | "0" | "1" => Ok(Self::Mono),
            "8" | "ansi8" => Ok(Self::Ansi8),
            "16" | "ansi16" => Ok(Self::Ansi16),
            "256" | "ansi256" => Ok(Self::Ansi256),
            "truecolor" | "24bit" | "24" | "rgb" => Ok(Self::TrueColor),
            _ => Err(ParseColorDepthError::Unknown(s.to_string())),
        }
    }
}

/// Emits color selection bytes for one depth.
#[derive(Debug, Clone, Copy)]
pub struct ColorModel<'a> {
    depth: ColorDepth,
    palettes: &'a Palettes,
}

impl<'a> ColorModel<'a> {
    pub fn new(depth: ColorDepth, palettes: &'a Palettes) -> Self {
        Self { depth, palettes }
    }

    #[inline]
    pub fn depth(&self) -> ColorDepth {
        self.depth
    }

    #[inline]
    pub fn palettes(&self) -> &'a Palettes {
        self.palettes
    }

    /// The color the terminal will actually show for `color` used as a
    /// foreground. Transparent resolves to the terminal default.
    pub fn effective_fg(&self, color: Rgba) -> Rgba {
        self.effective(color, DEFAULT_FG)
    }

    /// Background counterpart of [`effective_fg`](Self::effective_fg).
    pub fn effective_bg(&self, color: Rgba) -> Rgba {
        self.effective(color, DEFAULT_BG)
    }

    fn effective(&self, color: Rgba, default: Rgba) -> Rgba {
        let color = if color.is_transparent() {
            default
        } else {
            color
        };
        match self.depth {
            ColorDepth::Mono | ColorDepth::TrueColor => color,
            depth => self
                .palettes
                .quantize(depth, color)
                .map_or(color, |i| self.palettes.color(i)),
        }
    }

    /// Emit whichever of `fg` and `bg` differ from the colors `cursor`
    /// believes are active, and record the new colors.
    ///
    /// Comparison and tracking use the effective colors, so requests that
    /// select the same palette entry emit nothing. Mono emits nothing and
    /// leaves the tracked colors alone.
    pub fn render<W: Write>(
        &self,
        w: &mut W,
        cursor: &mut CursorState,
        fg: Rgba,
        bg: Rgba,
    ) -> io::Result<()> {
        if self.depth == ColorDepth::Mono {
            return Ok(());
        }
        let fg = self.effective_fg(fg);
        let bg = self.effective_bg(bg);

        if cursor.fg != fg {
            self.write_fg(w, fg)?;
            cursor.fg = fg;
        }
        if cursor.bg != bg {
            self.write_bg(w, bg)?;
            cursor.bg = bg;
            // A later clear must repaint with the new background.
            cursor.cleared = false;
        }
        Ok(())
    }

    /// Write the foreground selection for `color` unconditionally.
    pub fn write_fg<W: Write>(&self, w: &mut W, color: Rgba) -> io::Result<()> {
        match self.select(color) {
            Selection::None => Ok(()),
            Selection::Index(i) => ansi::sgr_fg_indexed(w, i),
            Selection::Rgb(c) => ansi::sgr_fg_rgb(w, c.r(), c.g(), c.b()),
        }
    }

    /// Write the background selection for `color` unconditionally.
    pub fn write_bg<W: Write>(&self, w: &mut W, color: Rgba) -> io::Result<()> {
        match self.select(color) {
            Selection::None => Ok(()),
            Selection::Index(i) => ansi::sgr_bg_indexed(w, i),
            Selection::Rgb(c) => ansi::sgr_bg_rgb(w, c.r(), c.g(), c.b()),
        }
    }

    fn select(&self, color: Rgba) -> Selection {
        match self.depth {
            ColorDepth::Mono => Selection::None,
            ColorDepth::TrueColor => match self.palettes.exact(color) {
                Some(i) => Selection::Index(i),
                None => Selection::Rgb(color),
            },
            depth => match self.palettes.quantize(depth, color) {
                Some(i) => Selection::Index(i),
                None => Selection::None,
            },
        }
    }
}

enum Selection {
    None,
    Index(u8),
    Rgb(Rgba),
}
