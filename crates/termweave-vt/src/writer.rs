#![forbid(unsafe_code)]

//! Shared, thread-safe ingest endpoint.
//!
//! A [`VtWriter`] is an `io::Write` handle over a [`VirtualTerminal`] behind a
//! reader/writer lock. A pump thread writes into it while the render thread
//! [`draw`](VtWriter::draw)s the grid into its own display. Each write pushes
//! a redraw notification into a single-slot channel; while a notification is
//! pending further ones are dropped, so a burst of writes wakes the consumer
//! once.
//!
//! Lock poisoning is recovered: the terminal state is plain data that every
//! operation leaves consistent.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use termweave_core::geometry::{Point, Rect};
use termweave_render::display::{CellSink, CompositeOp, Display, compose};

use crate::terminal::VirtualTerminal;

/// Writable, cloneable handle to a virtual terminal.
#[derive(Debug, Clone)]
pub struct VtWriter {
    terminal: Arc<RwLock<VirtualTerminal>>,
    dirty: SyncSender<()>,
}

/// Receiving end of the redraw notifications.
#[derive(Debug)]
pub struct Redraws {
    rx: Receiver<()>,
}

impl VtWriter {
    /// A blank `width × height` terminal and its redraw receiver.
    pub fn new(width: u16, height: u16) -> (Self, Redraws) {
        Self::from_terminal(VirtualTerminal::new(width, height))
    }

    /// Wrap an existing terminal.
    pub fn from_terminal(terminal: VirtualTerminal) -> (Self, Redraws) {
        let (dirty, rx) = mpsc::sync_channel(1);
        let writer = Self {
            terminal: Arc::new(RwLock::new(terminal)),
            dirty,
        };
        (writer, Redraws { rx })
    }

    fn read(&self) -> RwLockReadGuard<'_, VirtualTerminal> {
        self.terminal.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, VirtualTerminal> {
        self.terminal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy the grid into `r` of `dst`, grid origin at `r`'s corner.
    ///
    /// Colors are replaced, not blended; transparent grid cells keep the
    /// destination glyph.
    pub fn draw<D: CellSink + ?Sized>(&self, dst: &mut D, r: Rect) {
        let terminal = self.read();
        compose(dst, r, terminal.grid(), Point::ORIGIN, CompositeOp::Src);
    }

    /// Resize the grid, keeping the overlapping content.
    pub fn resize(&self, width: u16, height: u16) {
        self.write_lock().resize(width, height);
    }

    /// A copy of the current grid.
    pub fn snapshot(&self) -> Display {
        self.read().grid().clone()
    }

    /// The write cursor.
    pub fn cursor(&self) -> Point {
        self.read().cursor()
    }

    pub fn size(&self) -> (u16, u16) {
        self.read().size()
    }
}

impl io::Write for VtWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_lock().feed(buf);
        // Full slot: a redraw is already pending.
        let _ = self.dirty.try_send(());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Redraws {
    /// Block until the grid changes. `None` once every writer is gone.
    pub fn recv(&self) -> Option<()> {
        self.rx.recv().ok()
    }

    /// Whether the grid changed since the last call.
    pub fn try_recv(&self) -> Result<(), TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<(), RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}
