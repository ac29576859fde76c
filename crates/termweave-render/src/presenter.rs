#![forbid(unsafe_code)]

//! Presenter: frame-by-frame output to a real terminal.
//!
//! The presenter owns the output sink, the believed [`CursorState`], and the
//! last frame the terminal is known to show. Each [`Presenter::present`]
//! renders the new frame against that frame into one buffer and writes it
//! with a single `write_all` + `flush`.
//!
//! A failed write leaves the terminal in an unknown state, so the presenter
//! forgets both the cursor and the last frame; the next `present` is a full
//! redraw.
//!
//! ```ignore
//! let mut presenter = Presenter::new(std::io::stdout(), ColorDepth::detect());
//! presenter.enter()?;
//! let mut frame = Display::new(Rect::from_size(80, 24));
//! // ... draw into `frame` ...
//! presenter.present(&frame)?;
//! presenter.leave()?;
//! ```

use std::io::{self, Write};

use crate::color::{ColorDepth, ColorModel, Palettes};
use crate::cursor::CursorState;
use crate::display::{CellSource, Display};
use crate::render::{self, RenderStats};

/// Initial capacity of the frame buffer.
const BUFFER_CAPACITY: usize = 16 * 1024;

/// State-tracked frame writer.
pub struct Presenter<W: Write> {
    writer: W,
    depth: ColorDepth,
    palettes: Palettes,
    cursor: CursorState,
    last: Option<Display>,
    buf: Vec<u8>,
}

impl<W: Write> Presenter<W> {
    /// A presenter that assumes nothing about the terminal.
    pub fn new(writer: W, depth: ColorDepth) -> Self {
        Self {
            writer,
            depth,
            palettes: Palettes::xterm(),
            cursor: CursorState::START,
            last: None,
            buf: Vec::with_capacity(BUFFER_CAPACITY),
        }
    }

    #[inline]
    pub fn depth(&self) -> ColorDepth {
        self.depth
    }

    #[inline]
    pub fn palettes(&self) -> &Palettes {
        &self.palettes
    }

    /// What the terminal is believed to show.
    #[inline]
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// The last frame successfully written, if any.
    #[inline]
    pub fn last_frame(&self) -> Option<&Display> {
        self.last.as_ref()
    }

    /// Forget everything; the next frame is a full redraw.
    pub fn invalidate(&mut self) {
        self.cursor = CursorState::START;
        self.last = None;
    }

    /// Reset colors, clear the screen, home and hide the cursor.
    pub fn enter(&mut self) -> io::Result<()> {
        self.buf.clear();
        let mut cursor = self.cursor;
        cursor.reset(&mut self.buf)?;
        cursor.clear(&mut self.buf)?;
        cursor.home(&mut self.buf)?;
        cursor.hide(&mut self.buf)?;
        self.last = None;
        self.commit(cursor)
    }

    /// Reset colors, clear the screen, home and show the cursor.
    pub fn leave(&mut self) -> io::Result<()> {
        self.buf.clear();
        let mut cursor = self.cursor;
        cursor.reset(&mut self.buf)?;
        cursor.clear(&mut self.buf)?;
        cursor.home(&mut self.buf)?;
        cursor.show(&mut self.buf)?;
        self.last = None;
        self.commit(cursor)
    }

    /// Bring the terminal from the last frame to `frame`.
    ///
    /// A frame whose bounds differ from the last one clears the screen and
    /// is drawn in full.
    pub fn present(&mut self, frame: &Display) -> io::Result<RenderStats> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "present",
            width = frame.width(),
            height = frame.height()
        )
        .entered();

        self.buf.clear();
        let mut cursor = self.cursor;
        let resized = self
            .last
            .as_ref()
            .is_some_and(|last| last.rect() != frame.rect());
        if resized {
            // Cells outside the new bounds would otherwise stay on screen.
            cursor.reset(&mut self.buf)?;
            cursor.clear(&mut self.buf)?;
        }
        let old = self
            .last
            .as_ref()
            .filter(|_| !resized)
            .map(|last| last as &dyn CellSource);
        let model = ColorModel::new(self.depth, &self.palettes);
        let stats = render::render(&mut self.buf, &mut cursor, frame, old, &model)?;

        self.commit(cursor)?;
        self.last = Some(frame.clone());

        #[cfg(feature = "tracing")]
        tracing::trace!(
            changed = stats.changed,
            bytes = self.buf.len(),
            "frame presented"
        );
        Ok(stats)
    }

    fn commit(&mut self, cursor: CursorState) -> io::Result<()> {
        let result = self
            .writer
            .write_all(&self.buf)
            .and_then(|()| self.writer.flush());
        match result {
            Ok(()) => {
                self.cursor = cursor;
                Ok(())
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "terminal write failed; forcing full redraw");
                self.invalidate();
                Err(err)
            }
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
