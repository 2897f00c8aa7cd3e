//! Raw font bytes: bounds-checked slicing and big-endian scalar reads.

use std::ops::{Range, RangeBounds};

use otf_types::{BigEndian, FixedSize, Scalar};

use crate::read::{ComputeSize, FontReadWithArgs, ReadError};

/// A borrowed view over a contiguous range of font bytes.
///
/// This never owns data and never mutates the bytes it wraps; every parsed
/// table is ultimately a `FontData` plus some decoded summary fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontData<'a> {
    bytes: &'a [u8],
}

impl<'a> FontData<'a> {
    pub const EMPTY: FontData<'static> = FontData { bytes: &[] };

    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `self[pos..]`, or `None` if `pos` is out of bounds.
    pub fn split_off(&self, pos: usize) -> Option<FontData<'a>> {
        self.bytes.get(pos..).map(|bytes| FontData { bytes })
    }

    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<FontData<'a>> {
        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        self.bytes.get(bounds).map(|bytes| FontData { bytes })
    }

    /// Read a scalar at `offset`, performing the big-endian decode.
    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ReadError> {
        let end = offset
            .checked_add(T::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        self.bytes
            .get(offset..end)
            .and_then(T::read)
            .ok_or(ReadError::OutOfBounds)
    }

    pub fn read_be_at<T: Scalar>(&self, offset: usize) -> Result<BigEndian<T>, ReadError> {
        let end = offset
            .checked_add(T::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        self.bytes
            .get(offset..end)
            .and_then(BigEndian::from_slice)
            .ok_or(ReadError::OutOfBounds)
    }

    /// Read a zero-copy array of fixed-width big-endian records.
    pub fn read_array<T: Scalar + 'static>(
        &self,
        range: Range<usize>,
    ) -> Result<&'a [BigEndian<T>], ReadError> {
        let bytes = self.bytes.get(range).ok_or(ReadError::OutOfBounds)?;
        if bytes.len() % T::RAW_BYTE_LEN != 0 {
            return Err(ReadError::InvalidArrayLen);
        }
        bytemuck::try_cast_slice(bytes).map_err(|_| ReadError::InvalidArrayLen)
    }

    pub fn read_with_args<T>(&self, range: Range<usize>, args: &T::Args) -> Result<T, ReadError>
    where
        T: FontReadWithArgs<'a>,
    {
        self.slice(range)
            .ok_or(ReadError::OutOfBounds)
            .and_then(|data| T::read_with_args(data, args))
    }

    fn check_in_bounds(&self, offset: usize) -> Result<(), ReadError> {
        self.bytes
            .get(..offset)
            .ok_or(ReadError::OutOfBounds)
            .map(|_| ())
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub(crate) fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            data: *self,
        }
    }
}

impl<'a> From<&'a [u8]> for FontData<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        FontData::new(bytes)
    }
}

/// A cursor for sequentially validating and reading fields out of [`FontData`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Cursor<'a> {
    pos: usize,
    data: FontData<'a>,
}

impl<'a> Cursor<'a> {
    pub fn new(data: FontData<'a>) -> Self {
        Cursor { pos: 0, data }
    }

    fn advance_by(&mut self, n_bytes: usize) {
        self.pos = self.pos.saturating_add(n_bytes);
    }

    pub fn read<T: Scalar>(&mut self) -> Result<T, ReadError> {
        let value = self.data.read_at(self.pos);
        self.advance_by(T::RAW_BYTE_LEN);
        value
    }

    pub fn read_be<T: Scalar>(&mut self) -> Result<BigEndian<T>, ReadError> {
        let value = self.data.read_be_at(self.pos);
        self.advance_by(T::RAW_BYTE_LEN);
        value
    }

    pub fn read_with_args<T>(&mut self, args: &T::Args) -> Result<T, ReadError>
    where
        T: FontReadWithArgs<'a> + ComputeSize,
    {
        let len = T::compute_size(args)?;
        let end = self.pos.checked_add(len).ok_or(ReadError::OutOfBounds)?;
        let value = self.data.read_with_args(self.pos..end, args);
        self.advance_by(len);
        value
    }

    pub fn read_array<T: Scalar + 'static>(
        &mut self,
        n_elem: usize,
    ) -> Result<&'a [BigEndian<T>], ReadError> {
        let len = n_elem
            .checked_mul(T::RAW_BYTE_LEN)
            .ok_or(ReadError::OutOfBounds)?;
        let end = self.pos.checked_add(len).ok_or(ReadError::OutOfBounds)?;
        let value = self.data.read_array(self.pos..end);
        self.advance_by(len);
        value
    }

    pub fn advance_bytes(&mut self, n_bytes: usize) {
        self.advance_by(n_bytes);
    }

    pub fn position(&self) -> Result<usize, ReadError> {
        self.data.check_in_bounds(self.pos).map(|_| self.pos)
    }

    pub fn remaining(self) -> Option<FontData<'a>> {
        self.data.split_off(self.pos)
    }

    pub fn finish(self) -> Result<(), ReadError> {
        self.data.check_in_bounds(self.pos)
    }
}
