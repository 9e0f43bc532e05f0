// Variant (a) consumer: rescans a fixed permutation until every fragment is applied once.

use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};

use crate::error::{FragmentError, Result};
use crate::Core::codec::Codec;
use crate::Core::surface::Surface;
use crate::Exchange::order::VisitOrder;
use crate::Exchange::Channel::FragmentChannel;
use crate::Exchange::Structs::FragmentInfo;

/// Decode `info` and write it onto row 0 of `surface` at its offset.
pub(crate) fn apply_fragment(codec: &dyn Codec, surface: &mut Surface, info: &FragmentInfo) -> Result<()> {
    if !info.is_consistent() {
        return Err(FragmentError::decode(format!(
            "recorded size {} does not match payload length {}",
            info.size(),
            info.payload().len()
        )));
    }
    let region = codec.decode(info.payload())?;
    surface.place(info.offset(), &region)
}

/// Result of one scan over the visit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Fragment indices newly marked consumed during this pass.
    pub consumed: usize,
    /// Of those, how many actually changed the surface.
    pub applied: usize,
    /// Visits to indices that were already consumed.
    pub duplicate_visits: usize,
    /// Visits to positions the channel did not hold yet.
    pub out_of_range: usize,
    /// Consumed indices whose application failed.
    pub skipped: Vec<(usize, FragmentError)>,
    /// The channel was closed while still empty.
    pub closed_empty: bool,
}

/// Totals for a whole drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Indices marked consumed. Equals the fragment count on a complete run.
    pub completed: usize,
    pub applied: usize,
    pub passes: usize,
    pub duplicate_visits: usize,
    pub out_of_range: usize,
    pub skipped: Vec<(usize, FragmentError)>,
    /// Fragment indices never seen before the producer closed the channel.
    pub missing: Vec<usize>,
}

impl DrainReport {
    fn absorb(&mut self, pass: PassOutcome) {
        self.passes += 1;
        self.completed += pass.consumed;
        self.applied += pass.applied;
        self.duplicate_visits += pass.duplicate_visits;
        self.out_of_range += pass.out_of_range;
        self.skipped.extend(pass.skipped);
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// How long a pass that found nothing new waits for the producer by default.
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(250);

pub struct FragmentConsumer<'a> {
    channel: &'a FragmentChannel,
    codec: &'a dyn Codec,
    order: VisitOrder,
    max_passes: usize,
    idle_wait: Duration,
    stall_timeout: Option<Duration>,
}

impl<'a> FragmentConsumer<'a> {
    /// The pass limit defaults to `2 * len + 2`. Only passes that consume
    /// something or run against a closed channel count toward it: there are at
    /// most `len` of the first kind and a fruitless pass on a closed channel ends
    /// the drain. Idle waits on an open channel are free, so a slow producer is
    /// never cut off; use [`with_stall_timeout`](Self::with_stall_timeout) to
    /// bound those.
    pub fn new(channel: &'a FragmentChannel, codec: &'a dyn Codec, order: VisitOrder) -> Self {
        let max_passes = 2 * order.len() + 2;
        Self {
            channel,
            codec,
            order,
            max_passes,
            idle_wait: DEFAULT_IDLE_WAIT,
            stall_timeout: None,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Give up with [`FragmentError::Incomplete`] when the channel stays open
    /// and does not grow for this long. Unset by default.
    ///
    /// Measured between passes, so it does not interrupt a `drain_at` blocked
    /// on a channel that is still empty.
    pub fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
        self.stall_timeout = Some(stall_timeout);
        self
    }

    pub fn order(&self) -> &VisitOrder {
        &self.order
    }

    /// Walk the visit order once, applying every visible fragment not yet
    /// consumed. The order ranges over channel positions; the consumed-set is
    /// keyed by each fragment's own index, so a fragment the producer skipped
    /// does not shift the bookkeeping of the ones after it.
    ///
    /// A pass over a fully consumed channel writes nothing.
    pub fn scan(&self, surface: &mut Surface) -> PassOutcome {
        let mut pass = PassOutcome::default();
        let expected = self.order.len();

        for position in self.order.iter() {
            if let Some(index) = self.channel.index_at(position) {
                if self.channel.is_consumed(index) {
                    trace!("fragment {} already consumed", index);
                    pass.duplicate_visits += 1;
                    continue;
                }
            }

            let info = match self.channel.drain_at(position) {
                Ok(info) => info,
                Err(FragmentError::ChannelClosed) => {
                    pass.closed_empty = true;
                    return pass;
                }
                Err(e) => {
                    debug!("consumer: {}", e);
                    pass.out_of_range += 1;
                    continue;
                }
            };

            let index = info.index();
            if index >= expected {
                warn!("consumer: fragment index {} outside 0..{}", index, expected);
                pass.out_of_range += 1;
                continue;
            }
            if self.channel.is_consumed(index) {
                pass.duplicate_visits += 1;
                continue;
            }

            debug!(
                "consumed fragment {} of {} (size {}, offset {})",
                index,
                expected,
                info.size(),
                info.offset()
            );
            match apply_fragment(self.codec, surface, &info) {
                Ok(()) => pass.applied += 1,
                Err(e) => {
                    warn!("consumer: fragment {} not applied: {}", index, e);
                    pass.skipped.push((index, e));
                }
            }
            self.channel.mark_consumed(index);
            pass.consumed += 1;
        }
        pass
    }

    fn unconsumed(&self) -> Vec<usize> {
        (0..self.order.len())
            .filter(|&i| !self.channel.is_consumed(i))
            .collect()
    }

    fn incomplete(&self, report: &DrainReport) -> FragmentError {
        FragmentError::Incomplete {
            completed: report.completed,
            expected: self.order.len(),
            passes: report.passes,
        }
    }

    /// Rescan until every fragment index has been consumed.
    ///
    /// Ends early, with the unseen indices listed in [`DrainReport::missing`], when
    /// the producer closed the channel and a full pass made no progress. Fails with
    /// [`FragmentError::Incomplete`] once the pass limit or the stall timeout is
    /// exceeded.
    pub fn drain_into(&self, surface: &mut Surface) -> Result<DrainReport> {
        let expected = self.order.len();
        let mut report = DrainReport::default();
        let mut counted = 0;
        let mut last_growth = Instant::now();
        info!("consumer started: {} fragments", expected);

        while report.completed < expected {
            if counted >= self.max_passes {
                return Err(self.incomplete(&report));
            }

            let seen = self.channel.len();
            let pass = self.scan(surface);
            let progressed = pass.consumed > 0;
            let closed_empty = pass.closed_empty;
            report.absorb(pass);

            let closed = self.channel.is_closed();
            if progressed || closed {
                counted += 1;
            }
            if progressed {
                last_growth = Instant::now();
                continue;
            }
            // Nothing new this pass: either the producer is done or we wait for it.
            if closed_empty || (closed && self.channel.len() == seen) {
                report.missing = self.unconsumed();
                warn!(
                    "consumer: channel closed with {} fragments never produced: {:?}",
                    report.missing.len(),
                    report.missing
                );
                break;
            }
            if let Some(limit) = self.stall_timeout {
                if last_growth.elapsed() >= limit {
                    warn!("consumer: no new fragment for {:?}, giving up", limit);
                    return Err(self.incomplete(&report));
                }
            }
            if self.channel.wait_for_growth(seen, self.idle_wait) > seen {
                last_growth = Instant::now();
            }
        }

        info!(
            "consumer finished: {}/{} consumed in {} passes",
            report.completed, expected, report.passes
        );
        Ok(report)
    }
}
