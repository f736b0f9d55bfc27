//! SSD1309-style page framebuffer writer.
//!
//! Streams each [`Frame`] as `height / 8` pages of `width` column bytes
//! (LSB = top pixel of the page) to any `std::io::Write` sink: a Linux
//! framebuffer node, a SPI bridge's character device, or a file when
//! recording frames on the host.

use std::io::Write;

use log::warn;

use crate::app::ports::DisplayPort;
use crate::error::DisplayError;
use crate::frames::Frame;

pub struct Ssd1309Framebuffer<W> {
    sink: W,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl<W: Write> Ssd1309Framebuffer<W> {
    pub fn new(sink: W, width: u32, height: u32) -> Self {
        Self {
            sink,
            width,
            height,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn write_pages(&mut self, pages: &[u8]) -> Result<(), DisplayError> {
        self.sink
            .write_all(pages)
            .and_then(|()| self.sink.flush())
            .map_err(|e| {
                warn!("display write failed: {}", e);
                DisplayError::WriteFailed
            })
    }
}

impl<W: Write> DisplayPort for Ssd1309Framebuffer<W> {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(DisplayError::SizeMismatch);
        }
        self.write_pages(&frame.to_pages())?;
        self.frames_written += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let blank = vec![0u8; (self.height.div_ceil(8) * self.width) as usize];
        self.write_pages(&blank)
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
