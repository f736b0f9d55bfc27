//! Monochrome display frames.
//!
//! A [`Frame`] is a `width × height` 1-bit bitmap, packed row-major with
//! the most significant bit leftmost.  [`Frame::to_pages`] converts it to
//! the SSD130x page layout (8 vertical pixels per byte, LSB on top) that the
//! panel driver streams out.

pub mod pipeline;
pub mod text;

pub use pipeline::FramePipeline;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Ordinal index within the animation (from the `frame<N>.png` name).
    pub index: u32,
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Frame {
    /// An all-black frame.
    pub fn blank(index: u32, width: u32, height: u32) -> Self {
        let stride = Self::stride_for(width);
        Self {
            index,
            width,
            height,
            bits: vec![0; stride * height as usize],
        }
    }

    fn stride_for(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = y as usize * Self::stride_for(self.width) + (x as usize / 8);
        self.bits[byte] & (0x80 >> (x % 8)) != 0
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let byte = y as usize * Self::stride_for(self.width) + (x as usize / 8);
        let mask = 0x80 >> (x % 8);
        if on {
            self.bits[byte] |= mask;
        } else {
            self.bits[byte] &= !mask;
        }
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Packed row-major bits.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// SSD130x page layout: `height / 8` pages of `width` column bytes.
    pub fn to_pages(&self) -> Vec<u8> {
        let pages = self.height.div_ceil(8);
        let mut out = vec![0u8; (pages * self.width) as usize];
        for page in 0..pages {
            for x in 0..self.width {
                let mut column = 0u8;
                for bit in 0..8 {
                    if self.pixel(x, page * 8 + bit) {
                        column |= 1 << bit;
                    }
                }
                out[(page * self.width + x) as usize] = column;
            }
        }
        out
    }
}
