//! Top-level conversion of MML scores into Standard Midi Files.

use crate::{
    event::{Channel, TrackEvent, TrackEventKind},
    io::ByteSink,
    mml::{VoiceParser, MAX_NOTE, MIN_NOTE},
    prelude::*,
    primitive::Format,
    score::{Part, Score},
    smf::{Header, Smf},
};
use log::debug;

/// Events placed at the very start of the first track of a file, before anything else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preamble {
    /// Written as a text meta event.
    pub text: String,
    /// Initial tempo, in microseconds per quarter note.
    pub tempo: u24,
    /// Device initialization message, including the leading `0xF0`.
    pub sysex: Option<Vec<u8>>,
}
impl Default for Preamble {
    fn default() -> Preamble {
        Preamble {
            text: "Yokoso Project(https://yoko.so/)".to_string(),
            tempo: u24::new(500_000),
            //GS reset
            sysex: Some(vec![
                0xF0, 0x41, 0x10, 0x42, 0x12, 0x40, 0x00, 0x7F, 0x00, 0x41, 0xF7,
            ]),
        }
    }
}
impl Preamble {
    pub(crate) fn events(&self) -> Vec<TrackEvent> {
        let mut events = vec![
            TrackEvent::new(0, TrackEventKind::Text(self.text.clone())),
            TrackEvent::new(0, TrackEventKind::Tempo(self.tempo)),
        ];
        if let Some(sysex) = &self.sysex {
            events.push(TrackEvent::new(0, TrackEventKind::SysEx(sysex.clone())));
        }
        events
    }
}

/// Settings shared by every track of a conversion.
///
/// Built by value:
///
/// ```rust
/// # use mmlsmf::{num::{u15, u7}, ConverterOptions};
/// let options = ConverterOptions::default()
///     .with_timebase(u15::new(480))
///     .with_pan(u7::new(32))
///     .with_preamble(None);
/// assert_eq!(options.effect, u7::new(0));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Ticks per quarter note, as declared in the file header.
    ///
    /// This does not rescale the compiled events, which always use 96 ticks per quarter note.
    pub timebase: u15,
    pub pan: u7,
    pub effect: u7,
    /// Notes are folded by octaves into `min_note..=max_note`, before the fixed offset.
    pub min_note: u8,
    pub max_note: u8,
    pub preamble: Option<Preamble>,
}
impl Default for ConverterOptions {
    fn default() -> ConverterOptions {
        ConverterOptions {
            timebase: u15::new(96),
            pan: u7::new(64),
            effect: u7::new(0),
            min_note: MIN_NOTE,
            max_note: MAX_NOTE,
            preamble: Some(Preamble::default()),
        }
    }
}
impl ConverterOptions {
    pub fn with_timebase(mut self, timebase: u15) -> ConverterOptions {
        self.timebase = timebase;
        self
    }

    pub fn with_pan(mut self, pan: u7) -> ConverterOptions {
        self.pan = pan;
        self
    }

    pub fn with_effect(mut self, effect: u7) -> ConverterOptions {
        self.effect = effect;
        self
    }

    /// Set the note range. It is validated when converting.
    pub fn with_note_range(mut self, min_note: u8, max_note: u8) -> ConverterOptions {
        self.min_note = min_note;
        self.max_note = max_note;
        self
    }

    pub fn with_preamble(mut self, preamble: Option<Preamble>) -> ConverterOptions {
        self.preamble = preamble;
        self
    }
}

/// Converts a list of scores, each played by an instrument, into a Standard Midi File.
///
/// Each score is assigned the MIDI channel matching its 1-based position in the list, and each
/// of its voices becomes a separate track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converter {
    scores: Vec<String>,
    instruments: Vec<u7>,
    options: ConverterOptions,
}
impl Converter {
    /// Convert a single score, played by the given instrument on channel 1.
    pub fn new<S: Into<String>>(score: S, instrument: u7) -> Converter {
        Converter::new_multi(Some(score), Some(instrument))
    }

    /// Convert several scores, pairing them one-to-one with instruments.
    ///
    /// The counts are only checked when converting.
    pub fn new_multi<S, I, P>(scores: I, instruments: P) -> Converter
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
        P: IntoIterator<Item = u7>,
    {
        Converter {
            scores: scores.into_iter().map(Into::into).collect(),
            instruments: instruments.into_iter().collect(),
            options: ConverterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConverterOptions) -> Converter {
        self.options = options;
        self
    }

    #[inline]
    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    #[inline]
    pub fn scores(&self) -> &[String] {
        &self.scores[..]
    }

    pub fn set_scores<S: Into<String>, I: IntoIterator<Item = S>>(&mut self, scores: I) {
        self.scores = scores.into_iter().map(Into::into).collect();
    }

    #[inline]
    pub fn instruments(&self) -> &[u7] {
        &self.instruments[..]
    }

    pub fn set_instruments<P: IntoIterator<Item = u7>>(&mut self, instruments: P) {
        self.instruments = instruments.into_iter().collect();
    }

    /// Compile every score into an in-memory file.
    ///
    /// Conversion is all-or-nothing: any failing score fails the whole conversion.
    pub fn to_smf(&self) -> Result<Smf> {
        ensure!(!self.scores.is_empty(), err_grammar!("no scores to convert"));
        ensure!(
            self.scores.len() == self.instruments.len(),
            ErrorKind::Arity {
                scores: self.scores.len(),
                instruments: self.instruments.len(),
            }
        );
        ensure!(
            self.scores.len() <= 16,
            err_limit!("more scores than midi channels")
        );
        let options = &self.options;
        let mut tracks = Vec::new();
        let parts = self.scores.iter().zip(self.instruments.iter());
        for (idx, (text, &program)) in parts.enumerate() {
            let channel = u8::try_from(idx + 1)
                .ok()
                .and_then(Channel::new)
                .ok_or(err_limit!("more scores than midi channels"))
                .at(idx, None)?;
            let parser = VoiceParser::new(channel)
                .with_note_range(options.min_note, options.max_note)?;
            let part = Part {
                channel,
                program,
                pan: options.pan,
                effect: options.effect,
            };
            let score = Score::parse(text).at(idx, None)?;
            for (voice_idx, voice) in score.voices().iter().enumerate() {
                let preamble = if idx == 0 && voice_idx == 0 {
                    options.preamble.as_ref()
                } else {
                    None
                };
                tracks.push(part.compile(&parser, voice, preamble).at(idx, Some(voice_idx))?);
            }
        }
        debug!(
            "converted {} scores into {} tracks",
            self.scores.len(),
            tracks.len()
        );
        let header = Header::new(Format::for_track_count(tracks.len()), options.timebase);
        Ok(Smf::new(header, tracks))
    }

    /// Compile every score and encode the resulting file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let smf = self.to_smf()?;
        let unencodable = |msg| Error::new(err_limit!(msg));
        let len = smf.encoded_len().map_err(unencodable)?;
        let mut out = ByteSink::with_capacity(len as usize);
        smf.write(&mut out).map_err(unencodable)?;
        debug!("encoded {} tracks into {} bytes", smf.tracks.len(), out.len());
        Ok(out.into_vec())
    }
}
