use std::collections::HashSet;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use crossbeam_utils::CachePadded;
use log::trace;
use parking_lot::{Condvar, Mutex};

use super::Channel::{ChannelState, FragmentChannel};
use crate::error::{FragmentError, Result};
use crate::Exchange::Structs::Fragment_Structs::FragmentInfo;

impl FragmentChannel {
    /// Create an empty channel that holds at most `capacity` fragments.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FragmentError::InvalidConfig(
                "FragmentChannel::new(): capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            state: Mutex::new(ChannelState {
                items: Vec::with_capacity(capacity),
                consumed: HashSet::with_capacity(capacity),
                closed: false,
                peak_len: 0,
            }),
            cond: Condvar::new(),
            capacity,
            pushed: CachePadded::new(AtomicU64::new(0)),
            reads: CachePadded::new(AtomicU64::new(0)),
        })
    }

    /// Append a fragment, blocking while the channel is full.
    ///
    /// Returns [`FragmentError::ChannelClosed`] if the channel was closed before
    /// room became available.
    pub fn push(&self, info: FragmentInfo) -> Result<()> {
        let mut state = self.state.lock();
        let capacity = self.capacity;
        self.cond
            .wait_while(&mut state, |s| s.items.len() >= capacity && !s.closed);
        if state.closed {
            return Err(FragmentError::ChannelClosed);
        }

        trace!(
            "channel: push index={} offset={} size={}",
            info.index(),
            info.offset(),
            info.size()
        );
        state.items.push(info);
        state.peak_len = state.peak_len.max(state.items.len());
        drop(state);

        self.pushed.fetch_add(1, Relaxed);
        self.cond.notify_all();
        Ok(())
    }

    /// Read the fragment stored at position `index`, blocking while the channel
    /// is empty.
    ///
    /// The fragment is copied out and stays in the channel. Positions follow
    /// push order; the fragment's own index is carried in the [`FragmentInfo`].
    /// - `IndexOutOfRange` if `index` is not (yet) populated.
    /// - `ChannelClosed` if the channel was closed while still empty.
    pub fn drain_at(&self, index: usize) -> Result<FragmentInfo> {
        let mut state = self.state.lock();
        self.cond
            .wait_while(&mut state, |s| s.items.is_empty() && !s.closed);

        let len = state.items.len();
        let found = state.items.get(index).cloned();
        drop(state);

        match found {
            Some(info) => {
                self.reads.fetch_add(1, Relaxed);
                Ok(info)
            }
            None if len == 0 => Err(FragmentError::ChannelClosed),
            None => Err(FragmentError::IndexOutOfRange { index, len }),
        }
    }

    /// Fragment index of the item stored at `position`, without copying it.
    /// Never blocks.
    pub fn index_at(&self, position: usize) -> Option<usize> {
        self.state.lock().items.get(position).map(FragmentInfo::index)
    }

    /// Whether fragment `index` has already been applied.
    pub fn is_consumed(&self, index: usize) -> bool {
        self.state.lock().consumed.contains(&index)
    }

    /// Record fragment `index` as applied. Returns `false` if it was already recorded.
    pub fn mark_consumed(&self, index: usize) -> bool {
        let inserted = self.state.lock().consumed.insert(index);
        self.cond.notify_all();
        inserted
    }

    /// Block until the channel holds more than `seen` items, is closed, or
    /// `timeout` elapses. Returns the length observed on wake-up.
    pub fn wait_for_growth(&self, seen: usize, timeout: Duration) -> usize {
        let mut state = self.state.lock();
        self.cond
            .wait_while_for(&mut state, |s| s.items.len() <= seen && !s.closed, timeout);
        state.items.len()
    }

    /// Mark end of stream. Wakes every waiter; further pushes fail.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Highest number of fragments resident at once.
    pub fn peak_len(&self) -> usize {
        self.state.lock().peak_len
    }

    /// Size of the consumed-set.
    pub fn consumed_count(&self) -> usize {
        self.state.lock().consumed.len()
    }

    /// Total successful pushes so far.
    pub fn pushed(&self) -> u64 {
        self.pushed.load(Relaxed)
    }

    /// Total successful `drain_at` reads so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Relaxed)
    }
}
