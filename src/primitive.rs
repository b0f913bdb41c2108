//! Simple building-block data with a known, fixed binary representation.

use crate::prelude::*;

/// Slightly restricted integers.
macro_rules! restricted_int {
    {$(#[$attr:meta])* $name:ident : $inner:tt => $bits:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl From<$inner> for $name {
            /// Lossy conversion, masks off the top bits.
            #[inline]
            fn from(raw: $inner) -> $name {
                $name::new(raw)
            }
        }
        impl From<$name> for $inner {
            #[inline]
            fn from(restricted: $name) -> $inner {restricted.0}
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// The maximum value that this restricted integer can hold.
            #[inline]
            pub const fn max_value() -> $name {
                $name (Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn new(raw: $inner) -> $name {
                $name (raw & Self::MASK)
            }

            /// Returns `Some` if the raw integer is within range of the restricted integer, and
            /// `None` otherwise.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw <= Self::MASK {
                    Some($name(raw))
                }else{
                    None
                }
            }

            /// The inner integer, always within range.
            #[inline]
            pub const fn as_int(self) -> $inner {
                self.0
            }
        }
    };
}
restricted_int! {
    /// A 15-bit integer type.
    ///
    /// Wraps the `u16` type and ensures that the top bit is always zero.
    u15: u16 => 15
}
restricted_int! {
    /// A 7-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top bit is always zero.
    u7: u8 => 7
}
restricted_int! {
    /// A 4-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top 4 bits are always zero.
    u4: u8 => 4
}
restricted_int! {
    /// A 24-bit integer type.
    ///
    /// Wraps the `u32` type and ensures that the top 8 bits are always zero.
    u24: u32 => 24
}
restricted_int! {
    /// Referred to in the MIDI spec as "variable length int".
    u28: u32 => 28
}

impl u28 {
    /// Write this integer as a MIDI variable-length quantity: 7 bits per byte, most significant
    /// group first, with the top bit set on every byte except the last one.
    pub(crate) fn write_varlen<W: Write>(&self, out: &mut W) -> IoResult<W> {
        let mut buf = [0; 4];
        let len = self.encode_varlen(&mut buf);
        out.write_all(&buf[..len])
    }

    /// Encode into a fixed buffer, returning how many bytes were used (1 to 4).
    pub(crate) fn encode_varlen(&self, buf: &mut [u8; 4]) -> usize {
        let int = self.as_int();
        let mut len = 0;
        let mut skipping = true;
        for i in (0..4).rev() {
            let byte = ((int >> (i * 7)) & 0x7F) as u8;
            if skipping && byte == 0 && i != 0 {
                //Skip these leading zeros
            } else {
                skipping = false;
                buf[len] = if i == 0 {
                    //Last byte
                    byte
                } else {
                    //Leading byte
                    byte | 0x80
                };
                len += 1;
            }
        }
        len
    }

    /// Read a variable-length quantity, advancing the slice.
    ///
    /// Returns `None` if the slice ends before the last byte, or if the quantity is longer than
    /// 4 bytes.
    #[cfg(test)]
    pub(crate) fn read_varlen(raw: &mut &[u8]) -> Option<u28> {
        let mut int: u32 = 0;
        for i in 0..4 {
            let byte = *raw.get(i)?;
            int <<= 7;
            int |= (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                *raw = &raw[i + 1..];
                //At most 4 reads of 7 bits each, so the int fits in 28 bits
                return Some(u28::from(int));
            }
        }
        None
    }
}

/// Write a slice represented as a varlen `u28` length and then the raw bytes.
pub(crate) fn write_varlen_slice<W: Write>(slice: &[u8], out: &mut W) -> IoResult<W> {
    let len = u32::try_from(slice.len())
        .ok()
        .and_then(u28::try_from)
        .ok_or_else(|| W::invalid_input("varlen slice exceeds 28 bits"))?;
    len.write_varlen(out)?;
    out.write_all(slice)?;
    Ok(())
}

/// The order in which tracks should be laid out when playing back this SMF file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// This file has a single track only.
    SingleTrack,
    /// This file has several tracks that should be played simultaneously.
    ///
    /// The first track holds the tempo and song metadata.
    Parallel,
}
impl Format {
    /// The format a file with `track_count` tracks should use.
    #[inline]
    pub fn for_track_count(track_count: usize) -> Format {
        if track_count == 1 {
            Format::SingleTrack
        } else {
            Format::Parallel
        }
    }

    pub(crate) fn encode(&self) -> [u8; 2] {
        let code: u16 = match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
        };
        code.to_be_bytes()
    }

    /// Numeric format code as written to the header.
    #[inline]
    pub fn as_int(self) -> u16 {
        u16::from_be_bytes(self.encode())
    }
}
