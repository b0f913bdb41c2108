//! The `MML@...;` score wrapper, and the assembly of voices into complete tracks.

use crate::{
    convert::Preamble,
    event::{Channel, TrackEvent, TrackEventKind},
    mml::VoiceParser,
    prelude::*,
    smf::Track,
};
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

/// Exactly three voices, drawn from the MML alphabet. The first voice may be closed by a stray
/// `;` before its comma, and anything after the final `;` is ignored.
static SCORE: Lazy<Regex> = Lazy::new(|| {
    const VOICE: &str = r"([\s0-9a-glnortvA-GLNORTV#<>.&+\-]*)";
    Regex::new(&format!(r"^\s*MML@{v};?,{v},{v};", v = VOICE))
        .expect("score grammar must compile")
});

/// Voices per score, one track each.
const VOICES_PER_SCORE: usize = 3;

/// Setup events are placed in the first half note, and the voice body starts after a whole note.
const PROGRAM_TICK: u32 = 192;
const PAN_TICK: u32 = 193;
const EFFECT_TICK: u32 = 194;
const BODY_TICK: u32 = 384;
const EMPTY_END_TICK: u32 = 385;

const PAN_CONTROLLER: u8 = 10;
const EFFECT_CONTROLLER: u8 = 91;

/// A score, split into its three comma-separated voices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Score<'a> {
    voices: Vec<&'a str>,
}
impl<'a> Score<'a> {
    /// Extract the voices of an `MML@<voice>,<voice>,<voice>;` score.
    ///
    /// Fails with `ErrorKind::Grammar` if the wrapper is missing, the voice count is not three,
    /// or a voice holds characters outside the MML alphabet.
    /// Voices are not parsed here, and may be empty.
    pub fn parse(text: &'a str) -> Result<Score<'a>> {
        let caps = SCORE
            .captures(text)
            .ok_or(err_grammar!("expected `MML@<voice>,<voice>,<voice>;`"))?;
        let voices = (1..=VOICES_PER_SCORE)
            .map(|idx| caps.get(idx).map_or("", |voice| voice.as_str()))
            .collect();
        Ok(Score { voices })
    }

    #[inline]
    pub fn voices(&self) -> &[&'a str] {
        &self.voices[..]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

/// The channel and mixer settings shared by all voices of a score.
///
/// Every track compiled through a part starts with a program change and the pan and effect
/// controller values, before the voice body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub channel: Channel,
    pub program: u7,
    pub pan: u7,
    pub effect: u7,
}
impl Part {
    /// A centered part with no effect.
    pub fn new(channel: Channel, program: u7) -> Part {
        Part {
            channel,
            program,
            pan: u7::new(64),
            effect: u7::new(0),
        }
    }

    fn setup(&self) -> [TrackEvent; 3] {
        let channel = self.channel;
        [
            TrackEvent::new(
                PROGRAM_TICK,
                TrackEventKind::ProgramChange {
                    channel,
                    program: self.program,
                },
            ),
            TrackEvent::new(
                PAN_TICK,
                TrackEventKind::ControlChange {
                    channel,
                    controller: u7::new(PAN_CONTROLLER),
                    value: self.pan,
                },
            ),
            TrackEvent::new(
                EFFECT_TICK,
                TrackEventKind::ControlChange {
                    channel,
                    controller: u7::new(EFFECT_CONTROLLER),
                    value: self.effect,
                },
            ),
        ]
    }

    /// Compile a single voice into a complete track, optionally headed by a preamble.
    ///
    /// An empty (or whitespace-only) voice still yields a valid track, holding only the setup
    /// events and an end of track.
    pub fn compile(
        &self,
        parser: &VoiceParser,
        voice: &str,
        preamble: Option<&Preamble>,
    ) -> Result<Track> {
        let mut track = Vec::new();
        if let Some(preamble) = preamble {
            track.extend(preamble.events());
        }
        track.extend(self.setup().iter().cloned());
        if voice.trim().is_empty() {
            track.push(TrackEvent::new(EMPTY_END_TICK, TrackEventKind::EndOfTrack));
        } else {
            track.extend(parser.parse(voice, BODY_TICK)?);
        }
        trace!(
            "compiled voice on channel {} into {} events",
            self.channel,
            track.len()
        );
        Ok(track)
    }
}
