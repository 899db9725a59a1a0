//! Store Module
//!
//! Append-only record log over a single file.
//!
//! ## Responsibilities
//! - Frame every record with its length
//! - Buffer appends for throughput
//! - Serve reads by byte position
//! - Flush and sync on close
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Record 1                                │
//! │ ┌───────────────┬─────────────────────┐ │
//! │ │ Len (8, BE)   │ Payload (Len bytes) │ │
//! │ └───────────────┴─────────────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2                                │
//! │ ┌───────────────┬─────────────────────┐ │
//! │ │ Len (8, BE)   │ Payload (Len bytes) │ │
//! │ └───────────────┴─────────────────────┘ │
//! └─────────────────────────────────────────┘
//! ```

mod frame;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use parking_lot::Mutex;

use crate::error::{LogError, Result};
use crate::file;

pub use frame::LEN_WIDTH;

/// Append-only, length-framed record store
///
/// ## Concurrency:
/// - `append`, `read`, `read_at` and `flush` all take the same mutex, so a
///   header is never visible without its payload and positions are handed
///   out gap-free in append order.
/// - All methods use `&self`; share the store behind an `Arc` freely.
pub struct Store {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    /// Buffered writer over the append-mode file
    writer: BufWriter<File>,
    /// Byte offset the next append starts at (includes buffered bytes)
    size: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl StoreInner {
    /// Discard every byte past `keep`, on disk and in the buffer
    ///
    /// Bytes before `keep` belong to earlier appends and survive, whether
    /// they already reached the file or are still buffered.
    fn rollback(&mut self, keep: u64) -> io::Result<()> {
        let replacement = BufWriter::new(self.writer.get_ref().try_clone()?);
        let (file, buffered) = std::mem::replace(&mut self.writer, replacement).into_parts();
        let buffered = buffered.unwrap_or_else(|panicked| panicked.into_inner());

        let on_disk = file.metadata()?.len();
        drop(file);

        if on_disk >= keep {
            if on_disk > keep {
                self.writer.get_ref().set_len(keep)?;
            }
            return Ok(());
        }

        let pending = (keep - on_disk) as usize;
        if pending > buffered.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "{} bytes of earlier records missing from buffer ({} held)",
                    pending,
                    buffered.len()
                ),
            ));
        }
        self.writer.write_all(&buffered[..pending])
    }
}

impl Store {
    /// Wrap an already-open file
    ///
    /// The size is taken from the file's current length, so reopening a
    /// closed store resumes exactly where it left off. The file must be
    /// opened in append mode (see [`crate::open_file`]).
    pub fn new(file: File) -> Result<Self> {
        let size = file.metadata()?.len();
        tracing::debug!(size, "store opened");

        Ok(Self {
            inner: Mutex::new(StoreInner {
                writer: BufWriter::new(file),
                size,
                poisoned: false,
            }),
        })
    }

    /// Append a record, returning `(bytes_written, position)`
    ///
    /// `position` is where the record's header begins; `bytes_written`
    /// includes the 8-byte header.
    ///
    /// If the write fails, the partial record is removed from the buffer
    /// and the file so `size` still marks where the next append begins.
    /// If that cleanup fails too, the store is poisoned and refuses further
    /// appends.
    pub fn append(&self, payload: &[u8]) -> Result<(u64, u64)> {
        let mut inner = self.inner.lock();
        if inner.poisoned {
            return Err(LogError::Poisoned(format!(
                "an earlier append at position {} could not be rolled back",
                inner.size
            )));
        }
        let position = inner.size;

        let header = frame::encode_header(payload.len() as u64);
        let outcome = match inner.writer.write_all(&header) {
            Ok(()) => inner.writer.write_all(payload),
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            if let Err(rollback) = inner.rollback(position) {
                inner.poisoned = true;
                tracing::warn!(position, error = %rollback, "append rollback failed, store poisoned");
            } else {
                tracing::debug!(position, error = %e, "append failed, partial record discarded");
            }
            return Err(e.into());
        }

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;

        tracing::trace!(position, written, "record appended");
        Ok((written, position))
    }

    /// Read the record starting at `position`
    ///
    /// Returns:
    /// - `Ok(payload)` — the record's bytes
    /// - `Err(EndOfData)` — nothing written at or after `position`
    /// - `Err(TornRecord)` — fewer bytes stored than the header declares
    pub fn read(&self, position: u64) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        let size = inner.size;
        if position >= size {
            return Err(LogError::EndOfData);
        }

        let available = size - position;
        if available < LEN_WIDTH {
            return Err(LogError::TornRecord {
                position,
                expected: LEN_WIDTH,
                available,
            });
        }

        let file = inner.writer.get_ref();
        let mut header = [0u8; LEN_WIDTH as usize];
        file::read_exact_at(file, &mut header, position)?;

        let len = frame::decode_header(&header);
        let available = available - LEN_WIDTH;
        if len > available {
            return Err(LogError::TornRecord {
                position,
                expected: len,
                available,
            });
        }

        let mut payload = vec![0u8; len as usize];
        file::read_exact_at(file, &mut payload, position + LEN_WIDTH)?;
        Ok(payload)
    }

    /// Read raw bytes at an absolute offset, unframed
    ///
    /// Returns the number of bytes read; fewer than `buf.len()` means the
    /// end of the store was reached, zero means `offset` is past it.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;
        Ok(file::read_full_at(inner.writer.get_ref(), buf, offset)?)
    }

    /// Push buffered bytes to the OS (no fsync)
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().writer.flush()?;
        Ok(())
    }

    /// Current size in bytes, including records still in the buffer
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Flush, fsync and close the file
    pub fn close(self) -> Result<()> {
        let inner = self.inner.into_inner();
        let size = inner.size;

        let file = inner
            .writer
            .into_inner()
            .map_err(|e| LogError::Io(e.into_error()))?;
        file.sync_all()?;

        tracing::debug!(size, "store closed");
        Ok(())
    }
}
