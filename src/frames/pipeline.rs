//! Frame pipeline: numbered PNG sequence → display-ready 1-bit frames.
//!
//! ## Asset layout
//!
//! ```text
//! <asset_root>/
//!   happy/   frame1.png frame2.png … frame44.png
//!   sad/     frame1.png …
//! ```
//!
//! Files are ordered by the number embedded in the name, never by string
//! order (`frame10` sorts after `frame9`).  Each image is scaled to fit
//! within 95 % of the panel (upscaling capped at 1.5×), centred on a black
//! canvas and dithered to 1 bit.
//!
//! Frames are rebuilt on every call; nothing is cached.

use std::path::{Path, PathBuf};

use image::imageops::{self, BiLevel, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use log::{debug, error, info, warn};

use super::Frame;
use crate::config::EngineConfig;
use crate::error::AssetError;

/// Fraction of the panel an image may cover.
const FILL_RATIO: f64 = 0.95;
/// Largest permitted upscale factor.
const MAX_UPSCALE: f64 = 1.5;

pub struct FramePipeline {
    root: PathBuf,
    width: u32,
    height: u32,
}

impl FramePipeline {
    pub fn new(root: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            root: root.into(),
            width,
            height,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.asset_root.clone(),
            config.display_width,
            config.display_height,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load every frame for `emotion`, in index order.
    ///
    /// A missing directory or an empty one yields an empty sequence; a frame
    /// that fails to decode is logged and skipped.
    pub fn load(&self, emotion: &str) -> Vec<Frame> {
        match self.try_load(emotion) {
            Ok(frames) => frames,
            Err(e) => {
                error!("frames: {}: {}", emotion, e);
                Vec::new()
            }
        }
    }

    /// Like [`load`](Self::load) but reports why nothing was loaded.
    pub fn try_load(&self, emotion: &str) -> Result<Vec<Frame>, AssetError> {
        let files = self.frame_files(emotion)?;
        info!("frames: loading '{}' ({} files)", emotion, files.len());

        let mut frames = Vec::with_capacity(files.len());
        for (index, path) in files {
            match image::open(&path) {
                Ok(img) => frames.push(self.rasterize(&img, index)),
                Err(e) => error!("frames: skipping {}: {}", path.display(), e),
            }
        }

        if frames.is_empty() {
            return Err(AssetError::DecodeFailed);
        }
        debug!("frames: '{}' ready ({} frames)", emotion, frames.len());
        Ok(frames)
    }

    /// `frame<N>.png` files for `emotion`, sorted by `N`.
    pub fn frame_files(&self, emotion: &str) -> Result<Vec<(u32, PathBuf)>, AssetError> {
        let dir = self.root.join(emotion);
        let entries = std::fs::read_dir(&dir).map_err(|_| AssetError::MissingDirectory)?;

        let files: Vec<(u32, PathBuf)> = entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                let index = frame_index(path.file_name()?.to_str()?)?;
                Some((index, path))
            })
            .collect();

        if files.is_empty() {
            return Err(AssetError::NoFrames);
        }
        Ok(order_frame_files(files))
    }

    /// Scale, centre and binarize one decoded image.
    pub fn rasterize(&self, img: &DynamicImage, index: u32) -> Frame {
        let max_w = (f64::from(self.width) * FILL_RATIO) as u32;
        let max_h = (f64::from(self.height) * FILL_RATIO) as u32;
        let scale = fit_scale(img.width(), img.height(), max_w, max_h);

        let new_w = ((f64::from(img.width()) * scale) as u32).max(1);
        let new_h = ((f64::from(img.height()) * scale) as u32).max(1);
        let scaled = img.resize_exact(new_w, new_h, FilterType::Lanczos3).to_rgba8();

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, Rgba([0, 0, 0, 255]));
        let x = (i64::from(self.width) - i64::from(new_w)) / 2;
        let y = (i64::from(self.height) - i64::from(new_h)) / 2;
        imageops::overlay(&mut canvas, &scaled, x, y);

        let mut gray = DynamicImage::ImageRgba8(canvas).to_luma8();
        imageops::dither(&mut gray, &BiLevel);

        let mut frame = Frame::blank(index, self.width, self.height);
        for (px, py, luma) in gray.enumerate_pixels() {
            if luma.0[0] > 127 {
                frame.set_pixel(px, py, true);
            }
        }
        frame
    }
}

/// Parse the `N` out of `frame<N>.png`.
pub fn frame_index(file_name: &str) -> Option<u32> {
    let digits = file_name.strip_prefix("frame")?.strip_suffix(".png")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Sort `(index, path)` pairs by numeric index.
pub fn order_frame_files(mut files: Vec<(u32, PathBuf)>) -> Vec<(u32, PathBuf)> {
    files.sort_by_key(|(index, _)| *index);
    files
}

/// Largest scale that fits `w × h` inside `max_w × max_h`, capped at 1.5×.
pub fn fit_scale(w: u32, h: u32, max_w: u32, max_h: u32) -> f64 {
    if w == 0 || h == 0 {
        warn!("frames: zero-sized image");
        return 1.0;
    }
    let sw = f64::from(max_w) / f64::from(w);
    let sh = f64::from(max_h) / f64::from(h);
    sw.min(sh).min(MAX_UPSCALE)
}
