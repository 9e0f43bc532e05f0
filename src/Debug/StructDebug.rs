use std::fmt;
use std::sync::atomic::Ordering;
use crate::Core::surface::{Region, Surface};
use crate::Exchange::Channel::FragmentChannel;
use crate::Exchange::Gate::ReadyGate;
use crate::Exchange::Fragmenter;
use crate::Exchange::Structs::FragmentInfo;

/// Debug function for Region
///
/// Shows geometry only; pixel bytes are summarised by length
pub fn debug_region(region: &Region, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Region")
        .field("width", &region.width())
        .field("height", &region.height())
        .field("channels", &region.channels())
        .field("bytes", &region.data().len())
        .finish()
}

/// Debug function for Surface
pub fn debug_surface(surface: &Surface, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Surface")
        .field("width", &surface.width())
        .field("height", &surface.height())
        .field("channels", &surface.channels())
        .field("bytes", &surface.data().len())
        .finish()
}

/// Debug function for FragmentInfo
///
/// Payload is opaque; only its recorded size is shown
pub fn debug_fragment_info(info: &FragmentInfo, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FragmentInfo")
        .field("index", &info.index())
        .field("offset", &info.offset())
        .field("size", &info.size())
        .field("payload", &"<opaque>")
        .finish()
}

/// Debug function for FragmentChannel
///
/// Uses `try_lock` so formatting never blocks behind (or deadlocks against) a
/// thread holding the channel.
pub fn debug_fragment_channel(channel: &FragmentChannel, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut s = f.debug_struct("FragmentChannel");
    s.field("capacity", &channel.capacity)
        .field("pushed", &channel.pushed.load(Ordering::Relaxed))
        .field("reads", &channel.reads.load(Ordering::Relaxed));
    match channel.state.try_lock() {
        Some(state) => s
            .field("len", &state.items.len())
            .field("consumed", &state.consumed.len())
            .field("peak_len", &state.peak_len)
            .field("closed", &state.closed)
            .finish(),
        None => s.field("state", &"<locked>").finish(),
    }
}

/// Debug function for ReadyGate
pub fn debug_ready_gate(gate: &ReadyGate, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut s = f.debug_struct("ReadyGate");
    s.field("timeout", &gate.timeout);
    match gate.ready.try_lock() {
        Some(ready) => s.field("ready", &*ready).finish(),
        None => s.field("ready", &"<locked>").finish(),
    }
}

/// Debug function for Fragmenter
///
/// Subscribers are opaque trait objects; only their ids are listed
pub fn debug_fragmenter(fragmenter: &Fragmenter<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Fragmenter")
        .field("subscribers", &fragmenter.subscriber_ids())
        .field("gated", &fragmenter.gate.is_some())
        .finish_non_exhaustive()
}
