//! The MML voice parser.
//!
//! A voice is compiled by a small state machine that walks the command tokens in order, keeping
//! track of the octave, default length, volume, ties and the current time.

use crate::{
    event::{Channel, TrackEvent, TrackEventKind},
    prelude::*,
};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Ticks in a quarter note. Durations in MML are always measured against this resolution.
pub const TICKS_PER_QUARTER: u32 = 96;
/// Ticks in a whole note, the base of the `l<n>` length computation.
pub const TICKS_PER_WHOLE: u32 = TICKS_PER_QUARTER * 4;
/// Largest accepted length divisor.
const MAX_LENGTH: u32 = TICKS_PER_QUARTER * 2;

/// Default lowest note, before the fixed offset is applied.
pub const MIN_NOTE: u8 = 0;
/// Default highest note, before the fixed offset is applied.
pub const MAX_NOTE: u8 = 96;
/// Device calibration: added to every note after it is folded into the note range.
pub const NOTE_OFFSET: u8 = 12;

const DEFAULT_OCTAVE: i64 = 4;
const MAX_OCTAVE: i64 = 9;
const DEFAULT_VOLUME: u8 = 8;
const MIN_VOLUME: u32 = 1;
const MAX_VOLUME: u32 = 15;
const VELOCITY_PER_VOLUME: u8 = 8;

/// A command, an optional accidental (notes only) and the `[digits][.][&]` suffix.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:(?P<note>[A-Ga-g])(?P<acc>[-+#]?)|(?P<cmd>[LlNnOoRrTtVv<>]))",
        r"(?P<num>[0-9]*)(?P<dot>\.?)(?P<tie>&?)",
    ))
    .expect("mml token grammar must compile")
});

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Op {
    /// A note letter, with its pitch class already shifted by the accidental.
    Note(i64),
    Key,
    Length,
    Octave,
    OctaveDown,
    OctaveUp,
    Rest,
    Tempo,
    Volume,
}

#[derive(Copy, Clone, Debug)]
struct Token<'a> {
    text: &'a str,
    op: Op,
    num: Option<u32>,
    dotted: bool,
    tied: bool,
}
impl<'a> Token<'a> {
    fn read(caps: &Captures<'a>, text: &'a str) -> Option<Token<'a>> {
        let op = if let Some(note) = caps.name("note") {
            let class = note.as_str().chars().next().and_then(pitch_class)?;
            let accidental = match caps.name("acc").map(|m| m.as_str()) {
                Some("+") | Some("#") => 1,
                Some("-") => -1,
                _ => 0,
            };
            Op::Note(class + accidental)
        } else {
            match caps.name("cmd")?.as_str() {
                "L" | "l" => Op::Length,
                "N" | "n" => Op::Key,
                "O" | "o" => Op::Octave,
                "R" | "r" => Op::Rest,
                "T" | "t" => Op::Tempo,
                "V" | "v" => Op::Volume,
                "<" => Op::OctaveDown,
                ">" => Op::OctaveUp,
                _ => return None,
            }
        };
        let num = caps
            .name("num")
            .map(|m| m.as_str())
            .filter(|digits| !digits.is_empty())
            //Absurdly large values saturate, and are later rejected as out of range
            .map(|digits| digits.parse::<u32>().unwrap_or(u32::MAX));
        Some(Token {
            text,
            op,
            num,
            dotted: caps.name("dot").map_or(false, |m| !m.as_str().is_empty()),
            tied: caps.name("tie").map_or(false, |m| !m.as_str().is_empty()),
        })
    }
}

fn pitch_class(letter: char) -> Option<i64> {
    Some(match letter.to_ascii_lowercase() {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return None,
    })
}

/// Drop a token that cannot be understood, or fail if the `strict` feature is enabled.
fn reject(text: &str, msg: &'static str) -> Result<()> {
    if cfg!(feature = "strict") {
        bail!(err_malformed!(msg))
    } else {
        debug!("dropping mml {:?}: {}", text, msg);
        Ok(())
    }
}

/// Apply the dot of a token, if any: one and a half times the length, rounded down.
fn dotted(ticks: u32, dot: bool) -> u32 {
    if dot {
        ticks + ticks / 2
    } else {
        ticks
    }
}

/// Compiles single MML voices into lists of track events.
///
/// The parser itself only holds configuration; all of the per-voice state is created anew on
/// every call to [`parse`](#method.parse).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VoiceParser {
    channel: Channel,
    min_note: u8,
    max_note: u8,
}
impl VoiceParser {
    /// Create a parser emitting events on the given channel, with the default note range.
    pub fn new(channel: Channel) -> VoiceParser {
        VoiceParser {
            channel,
            min_note: MIN_NOTE,
            max_note: MAX_NOTE,
        }
    }

    /// Change the range notes are folded into (before the fixed `NOTE_OFFSET` is added).
    ///
    /// The range must span at least an octave, and the highest note plus the offset must still
    /// be a valid MIDI key.
    pub fn with_note_range(mut self, min_note: u8, max_note: u8) -> Result<VoiceParser> {
        ensure!(
            max_note >= min_note.saturating_add(11),
            err_limit!("note range must span at least an octave")
        );
        ensure!(
            max_note as u32 + NOTE_OFFSET as u32 <= u7::max_value().as_int() as u32,
            err_limit!("note range exceeds the midi key range")
        );
        self.min_note = min_note;
        self.max_note = max_note;
        Ok(self)
    }

    #[inline]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    #[inline]
    pub fn note_range(&self) -> (u8, u8) {
        (self.min_note, self.max_note)
    }

    /// Compile a single voice, placing its first event at `start` ticks.
    ///
    /// Whitespace is ignored. The returned events are sorted by lead time and always end with
    /// an `EndOfTrack` event, one default note length after the last note.
    pub fn parse(&self, mml: &str, start: u32) -> Result<Vec<TrackEvent>> {
        let clean = mml
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>();
        let mut voice = VoiceState::new(self, start);
        let mut unread = 0;
        for caps in TOKEN.captures_iter(&clean) {
            let (from, to) = match caps.get(0) {
                Some(m) => (m.start(), m.end()),
                None => continue,
            };
            if from > unread {
                reject(&clean[unread..from], "unknown command")?;
            }
            unread = to;
            match Token::read(&caps, &clean[from..to]) {
                Some(token) => voice.apply(token)?,
                None => reject(&clean[from..to], "unknown command")?,
            }
        }
        if unread < clean.len() {
            reject(&clean[unread..], "unknown command")?;
        }
        voice.finish()
    }

    /// Fold a raw note into the configured range by whole octaves, then add the offset.
    pub(crate) fn fold_note(&self, raw: i64) -> u7 {
        let (min, max) = (self.min_note as i64, self.max_note as i64);
        let mut note = raw;
        if note < min {
            note += 12 * ((min - note + 11) / 12);
        }
        if note > max {
            note -= 12 * ((note - max + 11) / 12);
        }
        u7::new((note + NOTE_OFFSET as i64) as u8)
    }
}

struct VoiceState<'p> {
    parser: &'p VoiceParser,
    octave: i64,
    /// Default note length, in ticks.
    note_time: u32,
    volume: u8,
    /// The key currently sustained by a tie.
    tied: Option<u7>,
    time: u32,
    events: Vec<TrackEvent>,
}
impl<'p> VoiceState<'p> {
    fn new(parser: &'p VoiceParser, start: u32) -> VoiceState<'p> {
        VoiceState {
            parser,
            octave: DEFAULT_OCTAVE,
            note_time: TICKS_PER_QUARTER,
            volume: DEFAULT_VOLUME,
            tied: None,
            time: start,
            events: Vec::new(),
        }
    }

    fn push(&mut self, kind: TrackEventKind) {
        self.events.push(TrackEvent::new(self.time, kind));
    }

    fn advance(&mut self, ticks: u32) -> Result<()> {
        self.time = self
            .time
            .checked_add(ticks)
            .ok_or(err_limit!("voice is too long"))?;
        Ok(())
    }

    /// Commands that carry no length should not carry a dot or a tie either.
    fn plain(&self, token: &Token) -> Result<()> {
        if token.dotted || token.tied {
            reject(token.text, "dot or tie on a command without length")?;
        }
        Ok(())
    }

    /// The length of a note or rest token.
    fn ticks(&self, token: &Token) -> Result<u32> {
        let base = match token.num {
            None => self.note_time,
            Some(n) if (1..=MAX_LENGTH).contains(&n) => TICKS_PER_WHOLE / n,
            Some(_) => {
                reject(token.text, "note length out of range")?;
                self.note_time
            }
        };
        Ok(dotted(base, token.dotted))
    }

    fn apply(&mut self, token: Token) -> Result<()> {
        trace!(
            "{:?} at tick {} (o{} l{} v{})",
            token.text,
            self.time,
            self.octave,
            self.note_time,
            self.volume
        );
        let channel = self.parser.channel;
        match token.op {
            Op::Length => match token.num.filter(|n| (1..=MAX_LENGTH).contains(n)) {
                Some(n) => {
                    self.note_time = dotted(TICKS_PER_WHOLE / n, token.dotted);
                    if token.tied {
                        self.tie_back();
                    }
                }
                None => reject(token.text, "note length out of range")?,
            },
            Op::Octave => {
                self.plain(&token)?;
                if token.num.is_none() {
                    reject(token.text, "missing octave")?;
                }
                self.octave = token.num.unwrap_or(0) as i64;
            }
            Op::OctaveDown | Op::OctaveUp => {
                if token.num.is_some() {
                    reject(token.text, "octave shifts take no value")?;
                }
                self.plain(&token)?;
                self.octave = if token.op == Op::OctaveUp {
                    (self.octave + 1).min(MAX_OCTAVE)
                } else {
                    (self.octave - 1).max(0)
                };
            }
            Op::Tempo => {
                self.plain(&token)?;
                let tempo = token
                    .num
                    .filter(|&bpm| bpm > 0)
                    .map(|bpm| 60_000_000 / bpm)
                    .filter(|&us| us > 0)
                    .and_then(u24::try_from);
                match tempo {
                    Some(tempo) => self.push(TrackEventKind::Tempo(tempo)),
                    None => reject(token.text, "tempo out of range")?,
                }
            }
            Op::Volume => {
                self.plain(&token)?;
                if token.num.is_none() {
                    reject(token.text, "missing volume")?;
                }
                let volume = token.num.unwrap_or(0);
                self.volume = volume.max(MIN_VOLUME).min(MAX_VOLUME) as u8;
            }
            Op::Rest => {
                if token.tied {
                    reject(token.text, "rests cannot be tied")?;
                }
                let ticks = self.ticks(&token)?;
                self.advance(ticks)?;
            }
            Op::Note(class) => {
                let ticks = self.ticks(&token)?;
                let key = self.parser.fold_note(12 * self.octave + class);
                self.play(channel, key, ticks, token.tied)?;
            }
            Op::Key => {
                let raw = match token.num {
                    Some(key) if key <= self.parser.max_note as u32 => key as i64,
                    Some(_) => {
                        reject(token.text, "note number out of range")?;
                        0
                    }
                    None => {
                        reject(token.text, "missing note number")?;
                        0
                    }
                };
                if token.dotted {
                    reject(token.text, "note numbers take no dot")?;
                }
                let key = self.parser.fold_note(raw);
                self.play(channel, key, self.note_time, token.tied)?;
            }
        }
        Ok(())
    }

    fn play(&mut self, channel: Channel, key: u7, ticks: u32, tie: bool) -> Result<()> {
        //A tie into a different key ends the sustained note first
        if let Some(held) = self.tied {
            if held != key {
                self.push(TrackEventKind::NoteOff {
                    channel,
                    key: held,
                    vel: u7::new(0),
                });
                self.tied = None;
            }
        }
        if self.tied.is_none() {
            self.push(TrackEventKind::NoteOn {
                channel,
                key,
                vel: u7::new(self.volume * VELOCITY_PER_VOLUME),
            });
        }
        self.advance(ticks)?;
        if tie {
            self.tied = Some(key);
        } else {
            self.tied = None;
            self.push(TrackEventKind::NoteOff {
                channel,
                key,
                vel: u7::new(0),
            });
        }
        Ok(())
    }

    /// A tie declared on a length change (`c8l16&c`) ties the previous note: its release is
    /// taken back and its key becomes the sustained one.
    fn tie_back(&mut self) {
        if self.tied.is_some() {
            return;
        }
        let last_off = self
            .events
            .iter()
            .rposition(|ev| ev.kind().note_off_key().is_some());
        match last_off {
            Some(idx) => self.tied = self.events.remove(idx).kind().note_off_key(),
            None => debug!("length tie with no previous note, ignoring"),
        }
    }

    fn finish(mut self) -> Result<Vec<TrackEvent>> {
        if let Some(key) = self.tied.take() {
            self.push(TrackEventKind::NoteOff {
                channel: self.parser.channel,
                key,
                vel: u7::new(0),
            });
        }
        self.advance(self.note_time)?;
        self.push(TrackEventKind::EndOfTrack);
        Ok(self.events)
    }
}
