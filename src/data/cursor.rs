//! Primitive field decoding over an immutable byte buffer.
//!
//! Every read is bounds-checked against the remaining bytes and fails with
//! [`AsdError::Format`] naming the offset and buffer length; nothing here
//! panics on short input.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{AsdError, Result};

/// Fixed-width little-endian scalar layout.
pub trait LeScalar: Sized + Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decode from exactly `WIDTH` bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! le_scalar {
    ($($t:ty),*) => {$(
        impl LeScalar for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            #[inline]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_le_bytes(raw)
            }
        }
    )*};
}

le_scalar!(u8, i8, u16, i16, u32, i32, i64, f32, f64);

/// A read position inside a fully materialised buffer.
///
/// The offset only moves forward.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    /// Everything from the current offset to the end of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        self.buf.get(self.offset..).unwrap_or_default()
    }

    /// Build a format error located at the current offset.
    pub fn error(&self, reason: impl Into<String>) -> AsdError {
        AsdError::format(self.offset, self.buf.len(), reason)
    }

    /// Fail unless at least `need` bytes remain.
    pub fn ensure(&self, need: usize, what: &str) -> Result<()> {
        if self.remaining() < need {
            return Err(self.error(format!(
                "{what} needs {need} bytes but only {} remain",
                self.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        self.ensure(n, what)?;
        let slice = self
            .offset
            .checked_add(n)
            .and_then(|end| self.buf.get(self.offset..end))
            .ok_or_else(|| self.error(format!("{what} starts past the end of the buffer")))?;
        self.offset += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize, what: &str) -> Result<()> {
        self.read_bytes(n, what).map(|_| ())
    }

    pub fn read<T: LeScalar>(&mut self, what: &str) -> Result<T> {
        self.read_bytes(T::WIDTH, what).map(T::from_le_slice)
    }

    pub fn read_bool(&mut self, what: &str) -> Result<bool> {
        self.read::<u8>(what).map(|b| b != 0)
    }

    /// Read a signed 16-bit length `L`, then `L` raw bytes.
    ///
    /// A negative or overlong length fails at the prefix offset, leaving the
    /// cursor where it was.
    pub fn read_bstr(&mut self, what: &str) -> Result<&'a [u8]> {
        let start = *self;
        let len = self.read::<i16>(what)?;
        let Ok(len) = usize::try_from(len) else {
            *self = start;
            return Err(start.error(format!("{what} has negative string length {len}")));
        };
        if self.remaining() < len {
            let err = start.error(format!(
                "{what} declares a {len}-byte string but only {} bytes remain",
                self.remaining()
            ));
            *self = start;
            return Err(err);
        }
        self.read_bytes(len, what)
    }

    /// Read `count` little-endian doubles.
    pub fn read_f64_array(&mut self, count: usize, what: &str) -> Result<Vec<f64>> {
        let width = count
            .checked_mul(f64::WIDTH)
            .ok_or_else(|| self.error(format!("{what} element count {count} overflows")))?;
        let bytes = self.read_bytes(width, what)?;
        Ok(bytes.chunks_exact(f64::WIDTH).map(f64::from_le_slice).collect())
    }

    /// Read a C `struct tm` stored as nine 16-bit integers.
    pub fn read_calendar_time(&mut self, what: &str) -> Result<CalendarTime> {
        let bytes = self.read_bytes(CalendarTime::WIDTH, what)?;
        let mut f = bytes.chunks_exact(i16::WIDTH).map(i16::from_le_slice);
        let mut next = || f.next().unwrap_or_default();
        Ok(CalendarTime {
            second: next(),
            minute: next(),
            hour: next(),
            day: next(),
            month: next(),
            year_offset: next(),
            weekday: next(),
            year_day: next(),
            dst: next(),
        })
    }
}

// ---------------------------------------------------------------------------
// Functional entry points: (value, next_offset)
// ---------------------------------------------------------------------------

pub fn decode_scalar<T: LeScalar>(buf: &[u8], offset: usize) -> Result<(T, usize)> {
    let mut cur = Cursor::at(buf, offset);
    let value = cur.read::<T>("scalar")?;
    Ok((value, cur.offset()))
}

pub fn decode_length_prefixed_string(buf: &[u8], offset: usize) -> Result<(&[u8], usize)> {
    let mut cur = Cursor::at(buf, offset);
    let bytes = cur.read_bstr("string")?;
    Ok((bytes, cur.offset()))
}

pub fn decode_timestamp(buf: &[u8], offset: usize) -> Result<(CalendarTime, usize)> {
    let mut cur = Cursor::at(buf, offset);
    let time = cur.read_calendar_time("timestamp")?;
    Ok((time, cur.offset()))
}

// ---------------------------------------------------------------------------
// CalendarTime
// ---------------------------------------------------------------------------

/// Raw `struct tm` fields as stored by the instrument software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CalendarTime {
    pub second: i16,
    pub minute: i16,
    pub hour: i16,
    pub day: i16,
    pub month: i16,
    /// Years since 1900.
    pub year_offset: i16,
    pub weekday: i16,
    pub year_day: i16,
    pub dst: i16,
}

impl CalendarTime {
    pub const WIDTH: usize = 18;

    /// Calendar timestamp with `year = 1900 + year_offset`; month is used as stored.
    ///
    /// `None` when the fields do not name a real date and time.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        let component = |v: i16| u32::try_from(v).ok();
        NaiveDate::from_ymd_opt(
            1900 + i32::from(self.year_offset),
            component(self.month)?,
            component(self.day)?,
        )?
        .and_hms_opt(
            component(self.hour)?,
            component(self.minute)?,
            component(self.second)?,
        )
    }
}
