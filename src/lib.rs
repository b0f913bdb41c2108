//! # Overview
//!
//! `mmlsmf` compiles Music Macro Language (MML) scores into Standard Midi Files (SMF).
//!
//! Usage is as simple as:
//!
//! ```rust
//! use mmlsmf::{num::u7, Converter};
//!
//! let smf = Converter::new("MML@t190l8cdefgab>c4.,l8<cdefgab>c4.,l8>cdefgab>c4.;", u7::new(1))
//!     .to_bytes()
//!     .unwrap();
//!
//! println!("midi file fits in {} bytes!", smf.len());
//! ```
//!
//! # MML scores
//!
//! A score is written as `MML@<voice>,<voice>,<voice>;`. Each comma-separated voice becomes a
//! separate SMF track, all sharing the MIDI channel of the score. A voice is a sequence of
//! commands:
//!
//! - `c d e f g a b`, optionally followed by an accidental (`+`, `#` or `-`), a length, a dot
//!   and a tie (`&`): play a note in the current octave.
//! - `n<key>`: play a raw note number, ignoring the octave.
//! - `r<length>`: rest.
//! - `o<octave>`, `<`, `>`: set, lower or raise the octave.
//! - `l<length>`: set the default note length (`l4` is a quarter note). `l8&` ties the previous
//!   note into the next one.
//! - `t<bpm>`: change the tempo.
//! - `v<volume>`: set the volume, from 1 to 15.
//!
//! Anything else is skipped.
//!
//! Several scores can be compiled into the same file through
//! [`Converter::new_multi`](struct.Converter.html#method.new_multi); each gets its own MIDI
//! channel and instrument.
//!
//! # Writing Standard Midi Files
//!
//! Conversions produce an in-memory [`Smf`](struct.Smf.html), which can be encoded into a
//! [`ByteSink`](io/struct.ByteSink.html), any [`Write`](io/trait.Write.html) sink, or saved to
//! disk with the `std` feature.
//!
//! ```rust
//! # use mmlsmf::{num::u7, Converter};
//! let smf = Converter::new("MML@l8cdef,,;", u7::new(1)).to_smf().unwrap();
//!
//! let mut in_memory: Vec<u8> = Vec::new();
//! smf.write(&mut in_memory).unwrap();
//! assert_eq!(&in_memory[..4], b"MThd");
//! ```
//!
//! # About features
//!
//! - The `std` feature
//!
//!   Enables writing into `std::io::Write` sinks through `io::IoWrap`, and the `Smf::save`
//!   method. This feature is enabled by default.
//!
//!   The crate is not `no_std`: it links the standard library regardless, and disabling this
//!   feature only removes the `std::io` and filesystem integration.
//!
//! - The `strict` feature
//!
//!   By default `mmlsmf` will attempt to plow through sloppy MML, throwing away any token it
//!   cannot understand. By enabling the `strict` feature the compiler will instead reject such
//!   scores, throwing errors of the kind `ErrorKind::Malformed`.
//!
//! # Logging
//!
//! Diagnostics (skipped events, dropped tokens) are reported through the `log` facade. No logger
//! is installed by this crate.

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
#[macro_use]
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{Error, ErrorKind, Result, ResultExt, StdResult},
        io::{IoResult, Write},
        primitive::{u15, u24, u28, u4, u7},
    };
    pub(crate) use core::{convert::TryFrom, fmt, mem};
    #[cfg(feature = "std")]
    pub(crate) use std::{fs::File, io, path::Path};
}

mod convert;
mod event;
pub mod io;
mod mml;
mod primitive;
mod score;
mod smf;

pub use crate::{
    convert::{Converter, ConverterOptions, Preamble},
    error::{Error, ErrorKind, Location, Result},
    event::{Channel, EncodeError, TrackEvent, TrackEventKind},
    mml::{VoiceParser, MAX_NOTE, MIN_NOTE, NOTE_OFFSET, TICKS_PER_QUARTER, TICKS_PER_WHOLE},
    primitive::Format,
    score::{Part, Score},
    smf::{write, Header, Smf, Track},
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u15, u24, u28, u4, u7};
}
