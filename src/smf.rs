//! Specific to the SMF packaging of compiled tracks.

use crate::{
    event::{EncodeError, TrackEvent},
    io::{ByteSink, WriteCounter},
    prelude::*,
    primitive::Format,
};
#[cfg(feature = "std")]
use crate::io::IoWrap;
use log::warn;

/// A compiled track: events sorted by lead time, ending with an end of track.
pub type Track = Vec<TrackEvent>;

/// A complete Standard Midi File, held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Smf {
    pub header: Header,
    pub tracks: Vec<Track>,
}
impl Smf {
    pub fn new(header: Header, tracks: Vec<Track>) -> Smf {
        Smf { header, tracks }
    }

    /// Encode and write the file into the given sink.
    ///
    /// See [`write`](fn.write.html) for more information.
    pub fn write<W: Write>(&self, out: &mut W) -> IoResult<W> {
        write(&self.header, &self.tracks, out)
    }

    /// The exact amount of bytes `write` would produce.
    pub fn encoded_len(&self) -> StdResult<u64, &'static str> {
        let mut counter = WriteCounter(0);
        self.write(&mut counter)?;
        Ok(counter.0)
    }

    /// Encode and write the file to the given path, creating or truncating it.
    #[cfg(feature = "std")]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fn save_impl(smf: &Smf, path: &Path) -> io::Result<()> {
            let mut file = IoWrap(io::BufWriter::new(File::create(path)?));
            smf.write(&mut file)?;
            io::Write::flush(&mut file.0)
        }
        save_impl(self, path.as_ref())
    }

    /// A line-oriented text rendition of the file, in the spirit of `mf2t`.
    ///
    /// Only meant for inspection: the first line is `MFile <format> <tracks> <timebase>`, and
    /// each track is listed between `MTrk` and `TrkEnd` lines, one event per line.
    pub fn dump(&self) -> Vec<String> {
        let event_count = self.tracks.iter().map(|track| track.len()).sum::<usize>();
        let mut lines = Vec::with_capacity(1 + 2 * self.tracks.len() + event_count);
        lines.push(format!(
            "MFile {} {} {}",
            self.header.format.as_int(),
            self.tracks.len(),
            self.header.timebase
        ));
        for track in self.tracks.iter() {
            lines.push("MTrk".to_string());
            lines.extend(track.iter().map(|ev| ev.to_string()));
            lines.push("TrkEnd".to_string());
        }
        lines
    }
}

/// A MIDI file header.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Header {
    pub format: Format,
    /// Ticks per quarter note.
    pub timebase: u15,
}
impl Header {
    pub fn new(format: Format, timebase: u15) -> Header {
        Header { format, timebase }
    }

    fn write<W: Write>(&self, track_count: usize, out: &mut W) -> IoResult<W> {
        let track_count = u16::try_from(track_count)
            .map_err(|_| W::invalid_input("track count exceeds 16 bit range"))?;
        let mut chunk = ByteSink::with_capacity(4 + 4 + 6);
        chunk
            .put_str("MThd")
            .put(6u32)
            .put_bytes(&self.format.encode()[..])
            .put(track_count)
            .put(self.timebase.as_int());
        out.write_all(chunk.as_slice())
    }
}

/// Encode and write a header and its tracks into the given sink.
///
/// Each event is preceded by its delta time from the previous written event, and consecutive
/// channel events sharing a status byte are written using running status.
///
/// Events that cannot be encoded are skipped with a warning, and their delta time is carried
/// over to the next event. Other than that, this function will bubble up errors from the
/// underlying sink and produce `invalid_input` errors if the tracks cannot be represented (more
/// than 65535 tracks, unsorted events or chunk sizes over 4GB).
pub fn write<W: Write>(header: &Header, tracks: &[Track], out: &mut W) -> IoResult<W> {
    header.write(tracks.len(), out)?;
    //Tracks are buffered so that chunk lengths can be written up front
    let mut payload = ByteSink::with_capacity(8 * 1024);
    for track in tracks {
        write_track(track, &mut payload).map_err(W::invalid_input)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| W::invalid_input("midi chunk size exceeds 32 bit range"))?;
        out.write_all(b"MTrk")?;
        out.write_all(&len.to_be_bytes())?;
        out.write_all(payload.as_slice())?;
        payload.clear();
    }
    Ok(())
}

/// Write the event stream of a single track, without the chunk header.
fn write_track(track: &[TrackEvent], out: &mut ByteSink) -> IoResult<ByteSink> {
    let mut running_time = 0;
    let mut running_status = 0;
    let mut raw = ByteSink::with_capacity(16);
    for ev in track {
        raw.clear();
        match ev.kind().encode(&mut raw) {
            Ok(()) => {}
            Err(EncodeError::Event(err)) => {
                warn!("skipping event \"{}\": {}", ev, err);
                continue;
            }
            Err(EncodeError::Io(err)) => return Err(err),
        }
        let (status, data) = match raw.as_slice().split_first() {
            Some((&status, data)) => (status, data),
            None => continue,
        };
        let delta = ev
            .lead_time()
            .checked_sub(running_time)
            .and_then(u28::try_from)
            .ok_or("track events out of order or too far apart")?;
        running_time = ev.lead_time();
        delta.write_varlen(out)?;
        if status < 0x80 || status > 0xEF || status != running_status {
            out.put_byte(status);
        }
        out.put_bytes(data);
        running_status = status;
    }
    Ok(())
}
