use std::time::Duration;

use crossbeam_utils::thread;
use log::info;

use super::consumer::{DrainReport, FragmentConsumer, DEFAULT_IDLE_WAIT};
use super::defragmenter::{Defragmenter, HandoffForwarder};
use super::fragmenter::{Fragmenter, NotifyReport};
use super::order::VisitOrder;
use super::producer::{prepare_source, FragmentProducer, ProduceReport};
use super::Channel::FragmentChannel;
use super::Gate::{rendezvous, ReadyGate, DEFAULT_HANDSHAKE_TIMEOUT};
use crate::error::{FragmentError, Result};
use crate::Core::codec::Codec;
use crate::Core::surface::Surface;

pub const DEFAULT_FRAGMENT_COUNT: usize = 48;

/// How the observer variant hands a fragment to its subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandoffMode {
    /// Ready flag + timed wait, notify before signal. Synchronous.
    #[default]
    Handshake,
    /// Single-slot rendezvous to a receiver thread; no timeout.
    Rendezvous,
}

/// Output of [`ExchangeBuilder::run_channel`].
#[derive(Debug)]
pub struct ChannelRun {
    pub surface: Surface,
    pub produced: ProduceReport,
    pub drained: DrainReport,
}

/// Output of [`ExchangeBuilder::run_observer`].
#[derive(Debug)]
pub struct ObserverRun {
    pub surface: Surface,
    pub notified: NotifyReport,
    /// Fragments the rendezvous receiver could not apply.
    pub receive_failures: Vec<(usize, FragmentError)>,
}

/// Configuration for one fragmentation run. Every run owns its own channel,
/// gate and destination surface.
#[derive(Debug, Clone)]
pub struct ExchangeBuilder {
    fragment_count: usize,
    seed: Option<u64>,
    visit_order: Option<Vec<usize>>,
    handshake_timeout: Duration,
    max_passes: Option<usize>,
    idle_wait: Duration,
    stall_timeout: Option<Duration>,
    handoff_mode: HandoffMode,
}

impl Default for ExchangeBuilder {
    fn default() -> Self {
        Self {
            fragment_count: DEFAULT_FRAGMENT_COUNT,
            seed: None,
            visit_order: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            max_passes: None,
            idle_wait: DEFAULT_IDLE_WAIT,
            stall_timeout: None,
            handoff_mode: HandoffMode::default(),
        }
    }
}

impl ExchangeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragment_count(mut self, count: usize) -> Self {
        self.fragment_count = count;
        self
    }

    /// Seed for the consumer's shuffled visit order.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Use an explicit visit order instead of a shuffle.
    pub fn with_visit_order(mut self, order: Vec<usize>) -> Self {
        self.visit_order = Some(order);
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// How long the consumer waits for new fragments after a fruitless pass.
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Fail the channel run once the producer goes this long without pushing.
    pub fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
        self.stall_timeout = Some(stall_timeout);
        self
    }

    pub fn with_handoff_mode(mut self, mode: HandoffMode) -> Self {
        self.handoff_mode = mode;
        self
    }

    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    /// The consumer visit order this configuration produces.
    pub fn visit_order(&self) -> Result<VisitOrder> {
        match &self.visit_order {
            Some(order) if order.len() != self.fragment_count => Err(FragmentError::InvalidConfig(format!(
                "visit order has {} entries for {} fragments",
                order.len(),
                self.fragment_count
            ))),
            Some(order) => VisitOrder::from_indices(order.clone()),
            None => Ok(VisitOrder::shuffled(self.fragment_count, self.seed)),
        }
    }

    /// Producer and consumer on two threads around a [`FragmentChannel`].
    pub fn run_channel(&self, source: &Surface, codec: &dyn Codec) -> Result<ChannelRun> {
        // Fatal checks happen before any thread starts.
        prepare_source(source, self.fragment_count)?;
        let order = self.visit_order()?;

        let channel = FragmentChannel::new(self.fragment_count)?;
        let mut surface = source.blank_like();
        let producer = FragmentProducer::new(&channel, codec);
        let mut consumer = FragmentConsumer::new(&channel, codec, order).with_idle_wait(self.idle_wait);
        if let Some(passes) = self.max_passes {
            consumer = consumer.with_max_passes(passes);
        }
        if let Some(stall) = self.stall_timeout {
            consumer = consumer.with_stall_timeout(stall);
        }

        let count = self.fragment_count;
        let (produced, drained) = thread::scope(|s| {
            let producer_handle = s.spawn(|_| producer.produce(source, count));
            let dest = &mut surface;
            let consumer_handle = s.spawn(move |_| consumer.drain_into(dest));
            (producer_handle.join(), consumer_handle.join())
        })
        .map_err(|_| FragmentError::ThreadPanicked("scope"))?;

        let produced = produced.map_err(|_| FragmentError::ThreadPanicked("producer"))??;
        let drained = drained.map_err(|_| FragmentError::ThreadPanicked("consumer"))??;
        info!(
            "channel run done: {} produced, {} applied, {} missing",
            produced.produced,
            drained.applied,
            drained.missing.len()
        );

        Ok(ChannelRun {
            surface,
            produced,
            drained,
        })
    }

    /// Fragmenter notifying a single Defragmenter, per [`HandoffMode`].
    pub fn run_observer(&self, source: &Surface, codec: &dyn Codec) -> Result<ObserverRun> {
        prepare_source(source, self.fragment_count)?;
        let count = self.fragment_count;

        let run = match self.handoff_mode {
            HandoffMode::Handshake => {
                let gate = ReadyGate::with_timeout(self.handshake_timeout);
                let mut defragmenter =
                    Defragmenter::new(codec, source.width(), source.height(), source.channels())?
                        .with_gate(&gate);
                let notified = {
                    let mut fragmenter = Fragmenter::new(codec).with_gate(&gate);
                    fragmenter.add_subscriber(&mut defragmenter);
                    fragmenter.fragment(source, count)?
                };
                ObserverRun {
                    surface: defragmenter.into_surface(),
                    notified,
                    receive_failures: Vec::new(),
                }
            }
            HandoffMode::Rendezvous => {
                let (tx, rx) = rendezvous();
                let mut defragmenter =
                    Defragmenter::new(codec, source.width(), source.height(), source.channels())?;

                let (notified, receive_failures) = thread::scope(|s| {
                    let receiver = s.spawn(move |_| {
                        let failures = defragmenter.receive_all(&rx);
                        (defragmenter, failures)
                    });
                    let mut forwarder = HandoffForwarder::new(tx);
                    let notified = {
                        let mut fragmenter = Fragmenter::new(codec);
                        fragmenter.add_subscriber(&mut forwarder);
                        fragmenter.fragment(source, count)
                    };
                    // Closing the sender ends the receiver loop.
                    drop(forwarder);
                    (notified, receiver.join())
                })
                .map_err(|_| FragmentError::ThreadPanicked("scope"))?;

                let (defragmenter, receive_failures) =
                    receive_failures.map_err(|_| FragmentError::ThreadPanicked("defragmenter"))?;
                ObserverRun {
                    surface: defragmenter.into_surface(),
                    notified: notified?,
                    receive_failures,
                }
            }
        };

        info!(
            "observer run done: {} produced, {} delivered",
            run.notified.produced, run.notified.delivered
        );
        Ok(run)
    }
}
