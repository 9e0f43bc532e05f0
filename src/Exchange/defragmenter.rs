// Variant (b) consumer side: rebuilds the surface from notified fragments.

use log::warn;

use crate::error::{FragmentError, Result};
use crate::Core::codec::Codec;
use crate::Core::surface::Surface;
use crate::Exchange::consumer::apply_fragment;
use crate::Exchange::fragmenter::Subscriber;
use crate::Exchange::Gate::{HandoffReceiver, HandoffSender, ReadyGate};
use crate::Exchange::Structs::FragmentInfo;

/// Owns the destination surface and applies every fragment it is given.
///
/// With a gate attached, `notify` waits on the gate before applying; without one
/// it applies immediately.
pub struct Defragmenter<'a> {
    codec: &'a dyn Codec,
    gate: Option<&'a ReadyGate>,
    surface: Surface,
    applied: usize,
}

impl<'a> Defragmenter<'a> {
    /// Allocate a zeroed `width` x `height` destination.
    pub fn new(codec: &'a dyn Codec, width: usize, height: usize, channels: usize) -> Result<Self> {
        Ok(Self {
            codec,
            gate: None,
            surface: Surface::new(width, height, channels)?,
            applied: 0,
        })
    }

    pub fn with_gate(mut self, gate: &'a ReadyGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Decode and place `info` without touching any gate.
    pub fn apply(&mut self, info: &FragmentInfo) -> Result<()> {
        apply_fragment(self.codec, &mut self.surface, info)?;
        self.applied += 1;
        Ok(())
    }

    /// Apply every fragment arriving through `rx` until the sender is dropped.
    /// Returns the fragments that could not be applied.
    pub fn receive_all(&mut self, rx: &HandoffReceiver<FragmentInfo>) -> Vec<(usize, FragmentError)> {
        let mut failures = Vec::new();
        while let Some(info) = rx.recv() {
            if let Err(e) = self.apply(&info) {
                warn!("defragmenter: fragment {} not applied: {}", info.index(), e);
                failures.push((info.index(), e));
            }
        }
        failures
    }

    /// Number of fragments written so far.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn reconstructed(&self) -> &Surface {
        &self.surface
    }

    pub fn into_surface(self) -> Surface {
        self.surface
    }
}

impl Subscriber for Defragmenter<'_> {
    fn notify(&mut self, info: &FragmentInfo) -> Result<()> {
        let Some(gate) = self.gate else {
            return self.apply(info);
        };
        let codec = self.codec;
        let surface = &mut self.surface;
        gate.consume(info.offset(), || apply_fragment(codec, surface, info))??;
        self.applied += 1;
        Ok(())
    }
}

/// Subscriber that hands each fragment to a receiver thread through a
/// rendezvous, returning only once the receiver has taken it.
pub struct HandoffForwarder {
    tx: HandoffSender<FragmentInfo>,
}

impl HandoffForwarder {
    pub fn new(tx: HandoffSender<FragmentInfo>) -> Self {
        Self { tx }
    }
}

impl Subscriber for HandoffForwarder {
    fn notify(&mut self, info: &FragmentInfo) -> Result<()> {
        self.tx.send(info.clone())
    }
}
