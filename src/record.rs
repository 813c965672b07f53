//! The 80-byte record framer.
//!
//! XPORT frames every logical section as whole 80-byte "records" (140 bytes
//! for a NAMESTR). This module owns the sentinel constants used to identify
//! each header record and the two small pumps ([`RecordSource`],
//! [`RecordSink`]) that move whole records, and arbitrary spans across
//! record boundaries, to and from an opaque byte source/sink.

use std::io::{Read, Write};

use crate::bytes::PAD;
use crate::error::{Error, Result};

/// The length of a single record in bytes.
pub const RECORD_LEN: usize = 80;

/// The length of a NAMESTR record in bytes.
pub const NAMESTR_LEN: usize = 140;

/// The length of a VMS-variant NAMESTR record in bytes (read-only; this
/// crate never writes the VMS layout).
pub const NAMESTR_LEN_VMS: usize = 136;

/// Library header sentinel (record 1 of every XPORT v5 file).
pub const LIBRARY_HEADER: &[u8; RECORD_LEN] =
    b"HEADER RECORD*******LIBRARY HEADER RECORD!!!!!!!000000000000000000000000000000  ";

/// Library header sentinel for the rejected V8 extension.
pub const LIBV8_HEADER: &[u8; RECORD_LEN] =
    b"HEADER RECORD*******LIBV8   HEADER RECORD!!!!!!!000000000000000000000000000000  ";

/// The CPORT ("compressed transport") sentinel.
pub const CPORT_HEADER: &[u8; RECORD_LEN] =
    b"**COMPRESSED** **COMPRESSED** **COMPRESSED** **COMPRESSED** **COMPRESSED**     ";

/// Member header sentinel.
pub const MEMBER_HEADER: &[u8; RECORD_LEN] =
    b"HEADER RECORD*******MEMBER  HEADER RECORD!!!!!!!000000000000000001600000000140  ";

/// Member descriptor header sentinel.
pub const MEMBER_HEADER_DATA: &[u8; RECORD_LEN] =
    b"HEADER RECORD*******DSCRPTR HEADER RECORD!!!!!!!000000000000000000000000000000  ";

/// The fixed 54-byte prefix of the NAMESTR header; bytes 54..58 carry the
/// ASCII variable count.
pub const NAMESTR_HEADER_PREFIX: &[u8; 54] = b"HEADER RECORD*******NAMESTR HEADER RECORD!!!!!!!000000";

/// Observation header sentinel.
pub const OBS_HEADER: &[u8; RECORD_LEN] =
    b"HEADER RECORD*******OBS     HEADER RECORD!!!!!!!000000000000000000000000000000  ";

/// Classification of the file's first record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A supported SAS V5 XPORT file.
    V5,
    /// The rejected SAS V8 XPORT extension.
    V8,
    /// The rejected compressed (CPORT) variant.
    CPort,
    /// Neither sentinel matched.
    Malformed,
}

/// Classifies a file by its first 80-byte record.
#[must_use]
pub fn classify(first_record: &[u8; RECORD_LEN]) -> FileKind {
    if first_record == LIBRARY_HEADER {
        FileKind::V5
    } else if first_record == LIBV8_HEADER {
        FileKind::V8
    } else if first_record == CPORT_HEADER {
        FileKind::CPort
    } else {
        FileKind::Malformed
    }
}

/// Pulls whole 80-byte records, and arbitrary byte spans across record
/// boundaries, from an opaque byte source.
pub struct RecordSource<R: Read> {
    inner: R,
    leftover: Vec<u8>,
}

impl<R: Read> RecordSource<R> {
    /// Wraps a byte source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            leftover: Vec::new(),
        }
    }

    /// Reads exactly one 80-byte record.
    ///
    /// Returns `Ok(None)` if the source is exactly at a clean record
    /// boundary with no more bytes (normal end of file). Returns
    /// [`Error::Malformed`] if fewer than 80 bytes remain.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or a short final record.
    pub fn next_record(&mut self) -> Result<Option<[u8; RECORD_LEN]>> {
        let mut buf = [0u8; RECORD_LEN];
        let mut filled = 0;
        loop {
            match self.inner.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
            if filled == RECORD_LEN {
                break;
            }
        }
        if filled == 0 {
            Ok(None)
        } else if filled < RECORD_LEN {
            Err(Error::malformed(format!(
                "truncated record: expected 80 bytes, got {filled}"
            )))
        } else {
            Ok(Some(buf))
        }
    }

    /// Releases the underlying byte source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads exactly `len` bytes, pulling additional records as needed and
    /// retaining any leftover for the next call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the source runs out of records
    /// before `len` bytes have been collected.
    pub fn read_exact_spanning(&mut self, len: usize) -> Result<Vec<u8>> {
        while self.leftover.len() < len {
            match self.next_record()? {
                Some(record) => self.leftover.extend_from_slice(&record),
                None => {
                    return Err(Error::malformed(format!(
                        "unexpected end of file: needed {len} bytes, had {}",
                        self.leftover.len()
                    )));
                }
            }
        }
        let rest = self.leftover.split_off(len);
        let result = std::mem::replace(&mut self.leftover, rest);
        Ok(result)
    }
}

/// Accumulates bytes into whole 80-byte records and writes them to an
/// opaque byte sink.
pub struct RecordSink<W: Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: Write> RecordSink<W> {
    /// Wraps a byte sink.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(RECORD_LEN),
        }
    }

    /// Writes one pre-built 80-byte record.
    ///
    /// # Panics
    ///
    /// Panics if the internal buffer is not currently aligned to a record
    /// boundary (a programming error: header records are only ever
    /// written between other whole-record writes).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn write_record(&mut self, record: &[u8; RECORD_LEN]) -> Result<()> {
        assert!(
            self.buffer.is_empty(),
            "write_record called with a partially-filled record buffer"
        );
        self.inner.write_all(record)?;
        Ok(())
    }

    /// Writes `data`, accumulating into 80-byte blocks and flushing each
    /// full block as it completes.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        while self.buffer.len() >= RECORD_LEN {
            let rest = self.buffer.split_off(RECORD_LEN);
            self.inner.write_all(&self.buffer)?;
            self.buffer = rest;
        }
        Ok(())
    }

    /// The number of bytes already written into the current, not-yet-full
    /// record.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Pads the current partial record to an 80-byte boundary with `pad`
    /// and flushes it. A no-op if already aligned.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn pad_to_boundary(&mut self, pad: u8) -> Result<()> {
        let remainder = self.buffer.len() % RECORD_LEN;
        if remainder == 0 {
            return Ok(());
        }
        let needed = RECORD_LEN - remainder;
        self.write_bytes(&vec![pad; needed])
    }

    /// Flushes the underlying sink and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the internal buffer is not empty (callers must pad to a
    /// boundary before finishing).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if flushing fails.
    pub fn finish(mut self) -> Result<W> {
        assert!(
            self.buffer.is_empty(),
            "finish called with unpadded trailing bytes"
        );
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// The default end-of-file pad record: 80 bytes of ASCII space.
pub const BLANK_RECORD: [u8; RECORD_LEN] = [PAD; RECORD_LEN];
