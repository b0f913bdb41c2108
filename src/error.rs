use core::fmt;
use thiserror::Error;

/// Represents an error while compiling an MML score into an SMF file.
///
/// This type wraps an `ErrorKind` and, when the failure can be pinned down to a single score or
/// voice, its location inside the score list.
///
/// For more information about the error policy used by `mmlsmf`, see
/// [`ErrorKind`](enum.ErrorKind.html).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}{}", location_suffix(.location))]
pub struct Error {
    kind: ErrorKind,
    location: Option<Location>,
}
impl Error {
    /// Create a new error with the given `ErrorKind`.
    #[inline]
    pub fn new(kind: ErrorKind) -> Error {
        Error {
            kind,
            location: None,
        }
    }

    /// More information about the error itself.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The score (and voice) that caused the error, if the error is tied to one.
    #[inline]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub(crate) fn at(mut self, location: Location) -> Error {
        //Keep the innermost location
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }
}
impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Error {
        Error::new(kind)
    }
}

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(" (at {})", loc),
        None => String::new(),
    }
}

/// Identifies a score in the list given to a converter, and optionally one of its voices.
///
/// Both indices are zero-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub score: usize,
    pub voice: Option<usize>,
}
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.voice {
            Some(voice) => write!(f, "score {} voice {}", self.score, voice),
            None => write!(f, "score {}", self.score),
        }
    }
}

/// The type of error that occurred while compiling.
///
/// Errors are broadly categorized, and specific error info is provided as a non-normative string
/// literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The score text does not follow the `MML@voice,voice,voice;` wrapper grammar, either by
    /// holding another number of voices or characters outside the MML alphabet.
    ///
    /// Nothing can be compiled from such a score.
    #[error("invalid score: {0}")]
    Grammar(&'static str),

    /// The amount of scores and the amount of instruments given to a converter differ.
    #[error("score count ({scores}) does not match instrument count ({instruments})")]
    Arity { scores: usize, instruments: usize },

    /// Non-fatal error, the MML contains a token that cannot be understood.
    ///
    /// This kind of error is not emitted by default, only if the `strict` crate feature is
    /// enabled. Otherwise the offending token is dropped.
    #[error("malformed mml: {0}")]
    Malformed(&'static str),

    /// A single event could not be encoded into its binary form.
    ///
    /// The encoder never aborts because of these: the event is skipped and a warning is logged.
    #[error("unencodable event: {0}")]
    Encoding(&'static str),

    /// Some quantity does not fit into the SMF format (channels, tracks, chunk sizes).
    #[error("limit exceeded: {0}")]
    Limit(&'static str),
}
impl ErrorKind {
    /// Get the informative message on what exactly went wrong.
    #[inline]
    pub fn message(&self) -> &'static str {
        match *self {
            ErrorKind::Grammar(msg) => msg,
            ErrorKind::Arity { .. } => "score and instrument counts differ",
            ErrorKind::Malformed(msg) => msg,
            ErrorKind::Encoding(msg) => msg,
            ErrorKind::Limit(msg) => msg,
        }
    }
}

macro_rules! err_grammar {
    ($msg:expr) => {{
        ErrorKind::Grammar($msg)
    }};
}
macro_rules! err_malformed {
    ($msg:expr) => {{
        ErrorKind::Malformed($msg)
    }};
}
macro_rules! err_encoding {
    ($msg:expr) => {{
        ErrorKind::Encoding($msg)
    }};
}
macro_rules! err_limit {
    ($msg:expr) => {{
        ErrorKind::Limit($msg)
    }};
}

pub(crate) trait ResultExt<T> {
    fn at(self, score: usize, voice: Option<usize>) -> StdResult<T, Error>;
}
impl<T> ResultExt<T> for StdResult<T, Error> {
    #[inline]
    fn at(self, score: usize, voice: Option<usize>) -> StdResult<T, Error> {
        self.map_err(|err| err.at(Location { score, voice }))
    }
}
impl<T> ResultExt<T> for StdResult<T, ErrorKind> {
    #[inline]
    fn at(self, score: usize, voice: Option<usize>) -> StdResult<T, Error> {
        self.map_err(|kind| Error::new(kind).at(Location { score, voice }))
    }
}

/// The result type used by the MML compiler.
pub type Result<T> = StdResult<T, Error>;
pub(crate) use core::result::Result as StdResult;
