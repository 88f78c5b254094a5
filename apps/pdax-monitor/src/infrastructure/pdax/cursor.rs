//! Binary Cursors
//!
//! Sequential big-endian readers and writers over PDAX frames. The wire
//! format has no field names or length prefixes for fixed-width fields, so
//! every decoder walks the frame field by field with a [`ReadCursor`].
//!
//! The offset only moves forward, by exactly the width of each field.

/// Cursor overran the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{width} byte field at offset {offset} overruns {len} byte buffer")]
pub struct CursorError {
    /// Offset of the field.
    pub offset: usize,
    /// Width of the field.
    pub width: usize,
    /// Buffer length.
    pub len: usize,
}

/// Forward-only reader over a frame.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ReadCursor<'a> {
    /// Create a cursor at offset 0.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the current offset.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Read a `u8`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] if the buffer is exhausted.
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        self.take::<1>().map(|[b]| b)
    }

    /// Read a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        self.take().map(u16::from_be_bytes)
    }

    /// Read a big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        self.take().map(u32::from_be_bytes)
    }

    /// Read a big-endian IEEE-754 `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] if fewer than 8 bytes remain.
    pub fn read_f64(&mut self) -> Result<f64, CursorError> {
        self.take().map(f64::from_be_bytes)
    }

    /// Skip `width` bytes without reading them.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] if fewer than `width` bytes remain.
    pub fn advance(&mut self, width: usize) -> Result<(), CursorError> {
        self.check(width)?;
        self.position += width;
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        self.check(N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.position..self.position + N]);
        self.position += N;
        Ok(bytes)
    }

    const fn check(&self, width: usize) -> Result<(), CursorError> {
        if width > self.remaining() {
            return Err(CursorError {
                offset: self.position,
                width,
                len: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Forward-only writer into a preallocated buffer.
#[derive(Debug)]
pub struct WriteCursor<'a> {
    data: &'a mut [u8],
    position: usize,
}

impl<'a> WriteCursor<'a> {
    /// Create a cursor at offset 0.
    #[must_use]
    pub const fn new(data: &'a mut [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Write a `u8`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] if the buffer is full.
    pub fn write_u8(&mut self, value: u8) -> Result<(), CursorError> {
        self.put(&[value])
    }

    /// Write a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] if fewer than 2 bytes remain.
    pub fn write_u16(&mut self, value: u16) -> Result<(), CursorError> {
        self.put(&value.to_be_bytes())
    }

    /// Write a big-endian IEEE-754 `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError`] if fewer than 8 bytes remain.
    pub fn write_f64(&mut self, value: f64) -> Result<(), CursorError> {
        self.put(&value.to_be_bytes())
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), CursorError> {
        let end = self.position + bytes.len();
        if end > self.data.len() {
            return Err(CursorError {
                offset: self.position,
                width: bytes.len(),
                len: self.data.len(),
            });
        }
        self.data[self.position..end].copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }
}
