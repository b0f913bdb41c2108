//! Byte sinks that the SMF encoder can write into.
//!
//! The main in-memory sink is [`ByteSink`](struct.ByteSink.html), an append-only byte builder
//! that packs multi-byte integers in big-endian order, as mandated by the SMF format.

use crate::prelude::*;
use core::cell::Cell;

pub type IoResult<W> = StdResult<(), <W as Write>::Error>;

/// A destination for encoded bytes.
pub trait Write {
    type Error;
    fn write_all(&mut self, buf: &[u8]) -> IoResult<Self>;
    fn invalid_input(msg: &'static str) -> Self::Error;
}

impl Write for Vec<u8> {
    type Error = &'static str;
    fn write_all(&mut self, buf: &[u8]) -> IoResult<Self> {
        self.extend_from_slice(buf);
        Ok(())
    }
    fn invalid_input(msg: &'static str) -> &'static str {
        msg
    }
}

/// Integers that can be appended to a `ByteSink` with a fixed width.
///
/// The byte order is always big-endian, independent of the host.
pub trait FixedWidth: Copy {
    /// How many bytes this integer takes up.
    const WIDTH: usize;
    /// Append the big-endian bytes of this integer.
    fn put_be(self, out: &mut Vec<u8>);
}

macro_rules! impl_fixed_width {
    {$( $int:ty ),*} => {
        $(
            impl FixedWidth for $int {
                const WIDTH: usize = mem::size_of::<$int>();
                #[inline]
                fn put_be(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_be_bytes());
                }
            }
        )*
    }
}
impl_fixed_width! {u8, u16, u32, u64, i8, i16, i32, i64}

impl FixedWidth for u24 {
    const WIDTH: usize = 3;
    #[inline]
    fn put_be(self, out: &mut Vec<u8>) {
        let int = self.as_int();
        out.extend_from_slice(&[(int >> 16) as u8, (int >> 8) as u8, int as u8]);
    }
}

/// An append-only byte builder.
///
/// Bytes are only ever appended at the end, so the append position is always the length of the
/// buffer. Appended bytes can be read back either by index (`get`) or sequentially through an
/// independent read cursor (`get_next`), which never disturbs appends.
#[derive(Clone, Default)]
pub struct ByteSink {
    buf: Vec<u8>,
    read_pos: Cell<usize>,
}
impl ByteSink {
    /// Create an empty sink.
    #[inline]
    pub fn new() -> ByteSink {
        ByteSink::default()
    }

    /// Create an empty sink with space for at least `cap` bytes.
    #[inline]
    pub fn with_capacity(cap: usize) -> ByteSink {
        ByteSink {
            buf: Vec::with_capacity(cap),
            read_pos: Cell::new(0),
        }
    }

    /// Append a fixed-width integer in big-endian order.
    #[inline]
    pub fn put<T: FixedWidth>(&mut self, value: T) -> &mut ByteSink {
        let before = self.buf.len();
        value.put_be(&mut self.buf);
        assert_eq!(
            self.buf.len(),
            before + T::WIDTH,
            "fixed-width append wrote an unexpected amount of bytes"
        );
        self
    }

    #[inline]
    pub fn put_byte(&mut self, byte: u8) -> &mut ByteSink {
        self.buf.push(byte);
        self
    }

    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut ByteSink {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append the raw UTF-8 bytes of a string, with no length prefix nor terminator.
    #[inline]
    pub fn put_str(&mut self, text: &str) -> &mut ByteSink {
        self.put_bytes(text.as_bytes())
    }

    /// Read the byte at `index`, without moving the read cursor.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.buf.get(index).copied()
    }

    /// Read the byte under the read cursor and advance it.
    ///
    /// Returns `None` once every appended byte has been read.
    #[inline]
    pub fn get_next(&self) -> Option<u8> {
        let pos = self.read_pos.get();
        let byte = self.get(pos)?;
        self.read_pos.set(pos + 1);
        Some(byte)
    }

    /// Position of the read cursor.
    #[inline]
    pub fn read_position(&self) -> usize {
        self.read_pos.get()
    }

    /// Move the read cursor back to the start.
    #[inline]
    pub fn rewind(&self) {
        self.read_pos.set(0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remove all bytes and reset the read cursor.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
        self.read_pos.set(0);
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..]
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}
impl AsRef<[u8]> for ByteSink {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
impl PartialEq for ByteSink {
    fn eq(&self, other: &ByteSink) -> bool {
        self.buf == other.buf
    }
}
impl Eq for ByteSink {}
impl fmt::Debug for ByteSink {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ByteSink[{}]", self.buf.len())?;
        for byte in self.buf.iter() {
            write!(f, " {:02x}", byte)?;
        }
        Ok(())
    }
}
impl From<ByteSink> for Vec<u8> {
    fn from(sink: ByteSink) -> Vec<u8> {
        sink.into_vec()
    }
}

impl Write for ByteSink {
    type Error = &'static str;
    fn write_all(&mut self, buf: &[u8]) -> IoResult<Self> {
        self.put_bytes(buf);
        Ok(())
    }
    fn invalid_input(msg: &'static str) -> &'static str {
        msg
    }
}

/// Counts bytes instead of storing them.
pub(crate) struct WriteCounter(pub u64);
impl Write for WriteCounter {
    type Error = &'static str;
    fn write_all(&mut self, buf: &[u8]) -> IoResult<Self> {
        self.0 += buf.len() as u64;
        Ok(())
    }
    fn invalid_input(msg: &'static str) -> &'static str {
        msg
    }
}

/// Adapts any `std::io::Write` into a sink.
#[cfg(feature = "std")]
pub struct IoWrap<T>(pub T);
#[cfg(feature = "std")]
impl<T: io::Write> Write for IoWrap<T> {
    type Error = io::Error;
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut self.0, buf)
    }
    fn invalid_input(msg: &'static str) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidInput, msg)
    }
}
