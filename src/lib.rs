//! Fragment exchange: split a surface into equal-width fragments, move them
//! from a producer to a consumer and rebuild the surface from their offsets.
//!
//! Two hand-off styles are provided:
//! - [`Exchange::FragmentChannel`]: an index-addressed bounded store drained by a
//!   consumer thread in a shuffled, rescanned order with exactly-once application.
//! - [`Exchange::Fragmenter`] / [`Exchange::Defragmenter`]: synchronous
//!   notification gated by a [`Exchange::Gate::ReadyGate`], or by a single-slot
//!   rendezvous.

pub mod error;

pub use error::{FragmentError, Result};

// Module naming follows the project layout (Core = surface/codec, Exchange = hand-off)
#[allow(non_snake_case)]
pub mod Core {
    pub mod codec;
    pub mod layout;
    pub mod surface;
    pub use codec::{Codec, RawCodec};
    pub use layout::SliceLayout;
    pub use surface::{Region, Surface};
}

#[allow(non_snake_case)]
pub mod Exchange;

#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}
