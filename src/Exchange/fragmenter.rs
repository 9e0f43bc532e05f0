// Variant (b) producer: encodes each slice and pushes it synchronously to every subscriber.

use std::fmt;

use log::{debug, info, warn};

use crate::error::{FragmentError, Result};
use crate::Core::codec::Codec;
use crate::Core::surface::Surface;
use crate::Exchange::producer::{encode_fragment, prepare_source};
use crate::Exchange::Gate::ReadyGate;
use crate::Exchange::Structs::FragmentInfo;

/// Receives fragments from a [`Fragmenter`], one call per fragment.
pub trait Subscriber {
    fn notify(&mut self, info: &FragmentInfo) -> Result<()>;
}

/// Handle returned by [`Fragmenter::add_subscriber`], used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0)
    }
}

/// Result of [`Fragmenter::remove_subscriber`].
pub enum Removal<'a> {
    /// The subscriber was registered and is handed back.
    Removed(&'a mut dyn Subscriber),
    /// The id was issued by this fragmenter but has been removed before. No-op.
    AlreadyRemoved,
    /// This fragmenter never issued the id. No-op.
    NeverRegistered,
}

impl<'a> Removal<'a> {
    pub fn is_removed(&self) -> bool {
        matches!(self, Removal::Removed(_))
    }

    pub fn into_subscriber(self) -> Option<&'a mut dyn Subscriber> {
        match self {
            Removal::Removed(subscriber) => Some(subscriber),
            _ => None,
        }
    }
}

impl fmt::Debug for Removal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Removal::Removed(_) => f.write_str("Removed(<subscriber>)"),
            Removal::AlreadyRemoved => f.write_str("AlreadyRemoved"),
            Removal::NeverRegistered => f.write_str("NeverRegistered"),
        }
    }
}

/// What one fragmenting run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Fragments encoded and offered to subscribers.
    pub produced: usize,
    /// Successful `notify` calls, summed over subscribers.
    pub delivered: usize,
    /// Slices that never reached a subscriber.
    pub skipped: Vec<(usize, FragmentError)>,
    /// `notify` calls that returned an error.
    pub failed: Vec<(usize, SubscriberId, FragmentError)>,
}

impl NotifyReport {
    /// Fragment indices that hit a handshake timeout.
    pub fn timeouts(&self) -> Vec<usize> {
        self.failed
            .iter()
            .filter(|(_, _, e)| matches!(e, FragmentError::HandshakeTimeout { .. }))
            .map(|(index, _, _)| *index)
            .collect()
    }
}

/// Broadcasts fragments to an ordered list of subscribers.
///
/// Per fragment: encode, call `notify` on each subscriber in registration order,
/// then raise the ready gate (when one is attached).
pub struct Fragmenter<'a> {
    pub(crate) codec: &'a dyn Codec,
    pub(crate) gate: Option<&'a ReadyGate>,
    pub(crate) subscribers: Vec<(SubscriberId, &'a mut dyn Subscriber)>,
    next_id: u64,
}

impl<'a> Fragmenter<'a> {
    pub fn new(codec: &'a dyn Codec) -> Self {
        Self {
            codec,
            gate: None,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Raise `gate` after each fragment has been offered to every subscriber.
    pub fn with_gate(mut self, gate: &'a ReadyGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn add_subscriber(&mut self, subscriber: &'a mut dyn Subscriber) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    /// Unregister `id`, handing the subscriber back.
    ///
    /// Removing an id twice, or one this fragmenter never issued, changes nothing
    /// and says which of the two it was.
    pub fn remove_subscriber(&mut self, id: SubscriberId) -> Removal<'a> {
        if id.0 >= self.next_id {
            debug!("remove: {} was never registered", id);
            return Removal::NeverRegistered;
        }
        match self.subscribers.iter().position(|(sid, _)| *sid == id) {
            Some(pos) => {
                let (_, subscriber) = self.subscribers.remove(pos);
                debug!("removed {}", id);
                Removal::Removed(subscriber)
            }
            None => {
                debug!("remove: {} already removed", id);
                Removal::AlreadyRemoved
            }
        }
    }

    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.subscribers.iter().map(|(id, _)| *id).collect()
    }

    /// Slice `source` into `count` fragments and offer each one to every subscriber.
    pub fn fragment(&mut self, source: &Surface, count: usize) -> Result<NotifyReport> {
        let (layout, source) = prepare_source(source, count)?;
        let mut report = NotifyReport::default();

        for index in 0..layout.count {
            debug!("fragmenting: {}/{}", index + 1, count);
            let info = match encode_fragment(self.codec, &source, &layout, index) {
                Ok(info) => info,
                Err(e) => {
                    warn!("fragmenter: fragment {} skipped: {}", index, e);
                    report.skipped.push((index, e));
                    continue;
                }
            };
            report.produced += 1;

            for (id, subscriber) in self.subscribers.iter_mut() {
                debug!("notifying {} of offset {}", id, info.offset());
                match subscriber.notify(&info) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        warn!("fragmenter: {} rejected fragment {}: {}", id, index, e);
                        report.failed.push((index, *id, e));
                    }
                }
            }

            if let Some(gate) = self.gate {
                gate.signal_ready();
            }
        }

        info!(
            "fragmenter finished: {} produced, {} delivered, {} failed",
            report.produced,
            report.delivered,
            report.failed.len()
        );
        Ok(report)
    }
}

impl fmt::Debug for Fragmenter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_fragmenter(self, f)
    }
}
