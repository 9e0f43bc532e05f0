use thiserror::Error;

/// Everything that can go wrong while moving fragments around.
///
/// Only [`FragmentError::EmptySource`], [`FragmentError::InvalidConfig`],
/// [`FragmentError::Incomplete`] and [`FragmentError::ThreadPanicked`] end a run.
/// The per-fragment kinds are logged once, recorded in the run report, and the
/// affected fragment is left out of the rebuilt surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    #[error("fragment {index} is empty (width {width}, height {height})")]
    InvalidFragment { index: usize, width: usize, height: usize },

    #[error("failed to decode fragment payload: {reason}")]
    DecodeFailure { reason: String },

    #[error("fragment at offset {offset} ({width}x{height}) exceeds surface bounds {surface_width}x{surface_height}")]
    OutOfBoundsPlacement {
        offset: usize,
        width: usize,
        height: usize,
        surface_width: usize,
        surface_height: usize,
    },

    #[error("index {index} exceeds channel contents ({len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("ready flag not observed within {waited_ms} ms for fragment at offset {offset}")]
    HandshakeTimeout { offset: usize, waited_ms: u128 },

    #[error("source surface is empty ({width}x{height})")]
    EmptySource { width: usize, height: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("channel closed")]
    ChannelClosed,

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),

    #[error("gave up after {passes} passes with {completed}/{expected} fragments applied")]
    Incomplete { completed: usize, expected: usize, passes: usize },
}

impl FragmentError {
    /// Errors that abort a run instead of skipping a single fragment.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FragmentError::EmptySource { .. }
                | FragmentError::InvalidConfig(_)
                | FragmentError::Incomplete { .. }
                | FragmentError::ThreadPanicked(_)
        )
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        FragmentError::DecodeFailure { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, FragmentError>;
