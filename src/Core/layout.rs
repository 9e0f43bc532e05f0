// Equal-width vertical slicing of a W x H surface.

use crate::error::{FragmentError, Result};

/// Geometry of `count` equal-width vertical slices.
///
/// `fragment_width = source_width / count`; when that does not divide evenly the
/// source has to be resampled to `fragment_width * count` columns first
/// (see [`SliceLayout::needs_resize`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceLayout {
    pub count: usize,
    pub fragment_width: usize,
    pub fragment_height: usize,
    pub source_width: usize,
}

impl SliceLayout {
    pub fn new(source_width: usize, source_height: usize, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(FragmentError::InvalidConfig(
                "fragment count must be at least 1".into(),
            ));
        }
        Ok(Self {
            count,
            fragment_width: source_width / count,
            fragment_height: source_height,
            source_width,
        })
    }

    /// Width every slice will actually cover.
    pub fn sliced_width(&self) -> usize {
        self.fragment_width * self.count
    }

    pub fn needs_resize(&self) -> bool {
        self.sliced_width() != self.source_width
    }

    /// Horizontal offset of fragment `index`.
    #[inline]
    pub fn offset(&self, index: usize) -> usize {
        index * self.fragment_width
    }

    pub fn offsets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.count).map(move |i| (i, self.offset(i)))
    }
}
