// Variant (a) producer: slices the source and pushes every fragment into the channel.

use std::borrow::Cow;

use log::{debug, info, warn};

use crate::error::{FragmentError, Result};
use crate::Core::codec::Codec;
use crate::Core::layout::SliceLayout;
use crate::Core::surface::{Region, Surface};
use crate::Exchange::Channel::FragmentChannel;
use crate::Exchange::Structs::FragmentInfo;

/// What one producer run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceReport {
    pub layout: SliceLayout,
    /// Fragments handed to the channel.
    pub produced: usize,
    /// Fragments that never left the producer, with the reason.
    pub skipped: Vec<(usize, FragmentError)>,
}

/// Validate the source and compute its slicing, resampling it when the width is
/// not a multiple of `count` so every slice has the same width.
///
/// An empty source is the one fatal condition of a run.
pub(crate) fn prepare_source(source: &Surface, count: usize) -> Result<(SliceLayout, Cow<'_, Surface>)> {
    if source.is_empty() {
        return Err(FragmentError::EmptySource {
            width: source.width(),
            height: source.height(),
        });
    }
    let layout = SliceLayout::new(source.width(), source.height(), count)?;
    if layout.needs_resize() && layout.fragment_width > 0 {
        info!(
            "resizing source from {} to {}x{} for {} fragments",
            source.width(),
            layout.sliced_width(),
            layout.fragment_height,
            count
        );
        return Ok((layout, Cow::Owned(source.resize_width(layout.sliced_width())?)));
    }
    Ok((layout, Cow::Borrowed(source)))
}

/// Cut fragment `index` out of `source` and encode it.
pub(crate) fn encode_fragment(
    codec: &dyn Codec,
    source: &Surface,
    layout: &SliceLayout,
    index: usize,
) -> Result<FragmentInfo> {
    let offset = layout.offset(index);
    let region: Region = source.slice(offset, layout.fragment_width);
    if region.is_empty() {
        return Err(FragmentError::InvalidFragment {
            index,
            width: region.width(),
            height: region.height(),
        });
    }
    let payload = codec.encode(&region)?;
    Ok(FragmentInfo::new(index, offset, payload))
}

/// Closes the channel when the producer finishes, including by unwinding.
struct CloseOnDrop<'a>(&'a FragmentChannel);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

pub struct FragmentProducer<'a> {
    channel: &'a FragmentChannel,
    codec: &'a dyn Codec,
}

impl<'a> FragmentProducer<'a> {
    pub fn new(channel: &'a FragmentChannel, codec: &'a dyn Codec) -> Self {
        Self { channel, codec }
    }

    /// Slice `source` into `count` fragments and push them in index order.
    ///
    /// Invalid or unencodable slices are logged and skipped. The channel is
    /// closed when this returns so the consumer can tell "late" from "never".
    pub fn produce(&self, source: &Surface, count: usize) -> Result<ProduceReport> {
        let _close = CloseOnDrop(self.channel);

        if count > self.channel.capacity() {
            return Err(FragmentError::InvalidConfig(format!(
                "{} fragments do not fit a channel of capacity {}",
                count,
                self.channel.capacity()
            )));
        }
        let (layout, source) = prepare_source(source, count)?;
        info!("producer started: {} fragments of {}x{}", count, layout.fragment_width, layout.fragment_height);

        let mut report = ProduceReport {
            layout,
            produced: 0,
            skipped: Vec::new(),
        };

        for (index, offset) in layout.offsets() {
            let info = match encode_fragment(self.codec, &source, &layout, index) {
                Ok(info) => info,
                Err(e) => {
                    warn!("producer: fragment {} skipped: {}", index, e);
                    report.skipped.push((index, e));
                    continue;
                }
            };
            debug!(
                "produced fragment {} of {} (size {}, offset {})",
                index + 1,
                count,
                info.size(),
                offset
            );
            self.channel.push(info)?;
            report.produced += 1;
        }

        info!("producer finished: {} produced, {} skipped", report.produced, report.skipped.len());
        Ok(report)
    }
}
