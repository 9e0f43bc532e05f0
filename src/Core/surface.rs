// Pixel containers shared by both hand-off variants.
//
// Layout is row-major, `channels` interleaved bytes per pixel, no row padding.

use crate::error::{FragmentError, Result};

/// A decoded block of pixels, as produced by slicing a surface or by a codec.
#[derive(Clone, PartialEq, Eq)]
pub struct Region {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Region {
    /// Wraps an existing pixel buffer. The buffer length must match the dimensions.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| FragmentError::decode("region dimensions overflow"))?;
        if data.len() != expected {
            return Err(FragmentError::decode(format!(
                "pixel buffer holds {} bytes, {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True when the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.channels == 0
    }

    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * self.channels;
        &self.data[y * stride..(y + 1) * stride]
    }
}

/// A mutable 2-D canvas. Freshly allocated surfaces are zero-filled.
#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Surface {
    /// Allocate a zero-initialized surface.
    ///
    /// Dimensions whose byte count does not fit in `usize` are an
    /// [`FragmentError::InvalidConfig`].
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| {
                FragmentError::InvalidConfig(format!(
                    "Surface::new(): {width}x{height}x{channels} overflows"
                ))
            })?;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![0u8; len],
        })
    }

    /// Build a surface from existing pixels (e.g. a decoded source image).
    pub fn from_pixels(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        let region = Region::new(width, height, channels, data).map_err(|e| {
            FragmentError::InvalidConfig(format!("Surface::from_pixels(): {e}"))
        })?;
        Ok(Self {
            width,
            height,
            channels,
            data: region.data,
        })
    }

    /// Allocate an empty destination with the same geometry as `self`.
    pub fn blank_like(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: vec![0u8; self.data.len()],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.channels == 0
    }

    /// Bytes of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        Some(&self.data[start..start + self.channels])
    }

    #[inline]
    fn stride(&self) -> usize {
        self.width * self.channels
    }

    /// Copy the full-height column band `[offset, offset + width)` out of the surface.
    ///
    /// The band is truncated at the right edge; a band starting past the edge is empty.
    pub fn slice(&self, offset: usize, width: usize) -> Region {
        let start = offset.min(self.width);
        let end = offset.saturating_add(width).min(self.width);
        let band = end - start;

        let mut data = Vec::with_capacity(band * self.height * self.channels);
        for y in 0..self.height {
            let row = y * self.stride();
            data.extend_from_slice(&self.data[row + start * self.channels..row + end * self.channels]);
        }
        Region {
            width: band,
            height: self.height,
            channels: self.channels,
            data,
        }
    }

    /// Write `region` with its top-left corner at `(offset, 0)`.
    ///
    /// Placements that do not fit entirely are rejected and leave the surface untouched.
    pub fn place(&mut self, offset: usize, region: &Region) -> Result<()> {
        let fits_x = offset
            .checked_add(region.width)
            .map_or(false, |right| right <= self.width);
        if !fits_x || region.height > self.height {
            return Err(FragmentError::OutOfBoundsPlacement {
                offset,
                width: region.width,
                height: region.height,
                surface_width: self.width,
                surface_height: self.height,
            });
        }
        if region.channels != self.channels {
            return Err(FragmentError::decode(format!(
                "fragment has {} channels, surface has {}",
                region.channels, self.channels
            )));
        }

        let band = region.width * self.channels;
        let stride = self.stride();
        for y in 0..region.height {
            let dst = y * stride + offset * self.channels;
            self.data[dst..dst + band].copy_from_slice(region.row(y));
        }
        Ok(())
    }

    /// Nearest-neighbour horizontal resample to `new_width` columns, height unchanged.
    pub fn resize_width(&self, new_width: usize) -> Result<Surface> {
        let mut out = Surface::new(new_width, self.height, self.channels)?;
        if self.width == 0 {
            return Ok(out);
        }
        for y in 0..self.height {
            for x in 0..new_width {
                // Widened so `x * width` cannot wrap; the quotient is below `width`.
                let src_x = (x as u128 * self.width as u128 / new_width as u128) as usize;
                let src = (y * self.width + src_x) * self.channels;
                let dst = (y * new_width + x) * self.channels;
                out.data[dst..dst + self.channels]
                    .copy_from_slice(&self.data[src..src + self.channels]);
            }
        }
        Ok(out)
    }

    /// True when every byte in the column band `[offset, offset + width)` is zero.
    pub fn is_band_blank(&self, offset: usize, width: usize) -> bool {
        self.slice(offset, width).data.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_region(self, f)
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_surface(self, f)
    }
}
