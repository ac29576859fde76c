#![forbid(unsafe_code)]

//! Background byte pump from a child's output into an ingest writer.

use std::io::{self, Read, Write};
use std::thread::{self, JoinHandle};

const BUF_SIZE: usize = 8192;

/// Copy `reader` into `writer` on a new thread until EOF.
///
/// The handle yields the number of bytes copied, or the first read/write
/// error. `Interrupted` reads are retried.
pub fn spawn_pump<R, W>(mut reader: R, mut writer: W) -> io::Result<JoinHandle<io::Result<u64>>>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("termweave-pump".into())
        .spawn(move || {
            let mut buf = [0u8; BUF_SIZE];
            let mut total = 0u64;
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(total, "pump reached EOF");
                        return Ok(total);
                    }
                    Ok(n) => {
                        if let Err(err) = writer.write_all(&buf[..n]) {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(%err, total, "pump write failed");
                            return Err(err);
                        }
                        total += n as u64;
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                    Err(err) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(%err, total, "pump read failed");
                        return Err(err);
                    }
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::VtWriter;
    use std::io::Cursor;

    #[test]
    fn pumps_until_eof() {
        let (w, redraws) = VtWriter::new(5, 2);
        let reader = Cursor::new(b"ab\r\ncd".to_vec());
        let handle = spawn_pump(reader, w.clone()).unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), 6);
        assert!(redraws.try_recv().is_ok());
        let grid = w.snapshot();
        assert_eq!(grid.row_text(0), "ab   ");
        assert_eq!(grid.row_text(1), "cd   ");
    }

    /// Fails with `Interrupted` once, then yields its data.
    struct Flaky {
        interrupted: bool,
        data: Cursor<Vec<u8>>,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn retries_interrupted_reads() {
        let reader = Flaky {
            interrupted: false,
            data: Cursor::new(b"xyz".to_vec()),
        };
        let handle = spawn_pump(reader, Vec::new()).unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), 3);
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn read_error_is_returned() {
        let handle = spawn_pump(Broken, Vec::new()).unwrap();
        let err = handle.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    struct Full;

    impl Write for Full {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_error_is_returned() {
        let handle = spawn_pump(Cursor::new(b"a".to_vec()), Full).unwrap();
        let err = handle.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
