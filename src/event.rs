//! All sort of track events and their binary encodings.

use crate::{prelude::*, primitive::write_varlen_slice};

/// A MIDI channel, numbered from 1 to 16 as musicians do.
///
/// Internally the zero-based 4-bit index is stored, which is what ends up in the low nibble of
/// channel status bytes.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Channel(u4);
impl Channel {
    /// Create a channel from its 1-based number.
    ///
    /// Returns `None` if `number` is not within `1..=16`.
    #[inline]
    pub fn new(number: u8) -> Option<Channel> {
        if (1..=16).contains(&number) {
            Some(Channel(u4::new(number - 1)))
        } else {
            None
        }
    }

    /// Create a channel from its zero-based index.
    #[inline]
    pub fn from_index(index: u4) -> Channel {
        Channel(index)
    }

    /// The 1-based channel number.
    #[inline]
    pub fn number(self) -> u8 {
        self.0.as_int() + 1
    }

    /// The zero-based channel index.
    #[inline]
    pub fn index(self) -> u4 {
        self.0
    }

    /// `base + channel - 1`, where `base` is a channel status with a zero low nibble.
    #[inline]
    pub(crate) fn status(self, base: u8) -> u8 {
        base | self.0.as_int()
    }
}
impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.number(), f)
    }
}

/// A track event placed at an absolute position in its track.
///
/// Unlike the delta times stored in SMF files, `lead_time` counts ticks from the start of the
/// track. It is fixed once the event is created; delta times are only computed by the encoder.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct TrackEvent {
    lead_time: u32,
    kind: TrackEventKind,
}
impl TrackEvent {
    #[inline]
    pub fn new(lead_time: u32, kind: TrackEventKind) -> TrackEvent {
        TrackEvent { lead_time, kind }
    }

    /// Absolute position of this event, in ticks from the start of the track.
    #[inline]
    pub fn lead_time(&self) -> u32 {
        self.lead_time
    }

    #[inline]
    pub fn kind(&self) -> &TrackEventKind {
        &self.kind
    }

    #[inline]
    pub fn into_kind(self) -> TrackEventKind {
        self.kind
    }
}
impl fmt::Display for TrackEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.lead_time, self.kind)
    }
}

/// The closed set of events a compiled MML voice can contain.
///
/// It notably does *not* include the timing of the event; the `TrackEvent` struct is responsible
/// for this.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum TrackEventKind {
    /// Set the tempo, in microseconds per quarter note.
    Tempo(u24),
    /// Change the program (also known as instrument) for a channel.
    ProgramChange { channel: Channel, program: u7 },
    /// Modify the value of a MIDI controller.
    ControlChange {
        channel: Channel,
        controller: u7,
        value: u7,
    },
    /// Start playing a note.
    NoteOn { channel: Channel, key: u7, vel: u7 },
    /// Stop playing a note.
    NoteOff { channel: Channel, key: u7, vel: u7 },
    /// A System Exclusive message.
    ///
    /// Unlike in the SMF encoding, the data bytes here *include* the leading `0xF0` byte. Data
    /// not starting with `0xF0` cannot be encoded.
    SysEx(Vec<u8>),
    /// Sequencer-specific meta event, carrying arbitrary data.
    SequencerSpecific(Vec<u8>),
    /// Arbitrary text meta event.
    Text(String),
    /// End of track meta event. Must be the last event of every track.
    EndOfTrack,
}
impl TrackEventKind {
    /// Write the full binary encoding of this event, status byte included.
    ///
    /// Running status is not applied here; see the track writer.
    pub fn encode<W: Write>(&self, out: &mut W) -> StdResult<(), EncodeError<W::Error>> {
        use self::TrackEventKind::*;
        match self {
            Tempo(tempo) => {
                out.write_all(&[0xFF, 0x51, 0x03])?;
                let int = tempo.as_int();
                out.write_all(&[(int >> 16) as u8, (int >> 8) as u8, int as u8])?;
            }
            Text(text) => {
                out.write_all(&[0xFF, 0x01])?;
                write_varlen_slice(text.as_bytes(), out)?;
            }
            SequencerSpecific(data) => {
                out.write_all(&[0xFF, 0x7F])?;
                write_varlen_slice(data, out)?;
            }
            SysEx(data) => match data.split_first() {
                Some((&0xF0, rest)) => {
                    out.write_all(&[0xF0])?;
                    write_varlen_slice(rest, out)?;
                }
                _ => {
                    return Err(EncodeError::Event(err_encoding!(
                        "sysex data must start with 0xF0"
                    )))
                }
            },
            ProgramChange { channel, program } => {
                out.write_all(&[channel.status(0xC0), program.as_int()])?;
            }
            ControlChange {
                channel,
                controller,
                value,
            } => {
                out.write_all(&[channel.status(0xB0), controller.as_int(), value.as_int()])?;
            }
            NoteOn { channel, key, vel } => {
                out.write_all(&[channel.status(0x90), key.as_int(), vel.as_int()])?;
            }
            NoteOff { channel, key, vel } => {
                out.write_all(&[channel.status(0x80), key.as_int(), vel.as_int()])?;
            }
            EndOfTrack => {
                out.write_all(&[0xFF, 0x2F, 0x00])?;
            }
        }
        Ok(())
    }

    /// If this is a note off, the key it releases.
    #[inline]
    pub fn note_off_key(&self) -> Option<u7> {
        match self {
            TrackEventKind::NoteOff { key, .. } => Some(*key),
            _ => None,
        }
    }
}

fn write_hex(f: &mut fmt::Formatter, label: &str, data: &[u8]) -> fmt::Result {
    f.write_str(label)?;
    for byte in data {
        write!(f, " {:02x}", byte)?;
    }
    Ok(())
}

/// Short, human readable descriptions in the style of `mf2t` text dumps.
impl fmt::Display for TrackEventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::TrackEventKind::*;
        match self {
            Tempo(tempo) => write!(f, "Tempo {}", tempo),
            ProgramChange { channel, program } => write!(f, "PrCh ch={} p={}", channel, program),
            ControlChange {
                channel,
                controller,
                value,
            } => write!(f, "Par ch={} c={} v={}", channel, controller, value),
            NoteOn { channel, key, vel } => write!(f, "On ch={} n={} v={}", channel, key, vel),
            NoteOff { channel, key, vel } => write!(f, "Off ch={} n={} v={}", channel, key, vel),
            SysEx(data) => write_hex(f, "SysEx", data),
            SequencerSpecific(data) => write_hex(f, "SeqSpec", data),
            Text(text) => write!(f, "Meta Text {:?}", text),
            EndOfTrack => f.write_str("Meta TrkEnd"),
        }
    }
}

/// Failure while encoding a single event.
#[derive(Debug)]
pub enum EncodeError<E> {
    /// The event itself cannot be represented.
    Event(ErrorKind),
    /// The underlying sink failed.
    Io(E),
}
impl<E> From<E> for EncodeError<E> {
    fn from(err: E) -> EncodeError<E> {
        EncodeError::Io(err)
    }
}
