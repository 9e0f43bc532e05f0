// Index-addressed fragment store shared by one producer and one consumer.

use crate::Exchange::Structs::Fragment_Structs::FragmentInfo;
use crossbeam_utils::CachePadded;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::atomic::AtomicU64;

/// A capacity-bounded, append-only store of fragments with a consumed-set.
///
/// ### Concurrency Design:
/// - **Producer (push)**: waits while the store already holds `capacity` items,
///   appends, then wakes every waiter.
/// - **Consumer (drain_at)**: waits while the store is empty, then *reads* the
///   item at the requested position. Nothing is ever removed; fragments stay
///   addressable for every later rescan.
/// - The consumed-set lives under the same mutex as the items, so "has this index
///   been applied" and "is this index visible" are always observed together.
///
/// Capacity equals the fragment count of the run, so in a one-producer run the
/// full-wait is never actually taken. It is still predicate guarded.
pub struct FragmentChannel {
    /// Items, consumed-set and end-of-stream flag.
    pub(crate) state: Mutex<ChannelState>,

    /// Signalled on every push, every consumption mark and on close.
    pub(crate) cond: Condvar,

    /// Maximum number of resident items.
    pub(crate) capacity: usize,

    /// Successful pushes. Written by the producer only.
    pub(crate) pushed: CachePadded<AtomicU64>,

    /// Successful `drain_at` reads. Written by the consumer only.
    pub(crate) reads: CachePadded<AtomicU64>,
}

pub(crate) struct ChannelState {
    pub(crate) items: Vec<FragmentInfo>,
    pub(crate) consumed: HashSet<usize>,
    pub(crate) closed: bool,
    /// Largest `items.len()` ever observed.
    pub(crate) peak_len: usize,
}
