//! Rasterized track: a grayscale image sampled by the virtual line sensors,
//! plus the track-piece occupancy grid used for start-line derivation.

pub mod demo;
pub mod grid;

pub use grid::{Connection, PieceGrid};

use std::path::PathBuf;

use image::{GrayImage, RgbaImage};
use log::debug;
use thiserror::Error;

use render::Canvas;
use simcore::Pose;

/// Default pixel-intensity cutoff for the on-line test.
pub const DEFAULT_LINE_THRESHOLD: u8 = 100;

#[derive(Debug, Error)]
pub enum TrackLoadError {
    #[error("failed to read track file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode track image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("track image has zero area")]
    EmptyImage,
}

/// Where a track raster comes from.
///
/// `Raster` is the in-memory editor path of the original tool: a prepared
/// grayscale canvas that may carry an explicit start pose as metadata.
pub enum TrackSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Raster { image: GrayImage, start_pose: Option<Pose> },
}

impl TrackSource {
    /// Explicit start-pose metadata attached to the source, if any.
    pub fn start_pose_hint(&self) -> Option<Pose> {
        match self {
            TrackSource::Raster { start_pose, .. } => *start_pose,
            _ => None,
        }
    }
}

/// Grayscale raster of the track with a threshold-based on-line test.
///
/// Dark pixels are line; light pixels are paper. The threshold is owned by
/// the engine's parameters and pushed down on load and on parameter updates.
pub struct TrackMap {
    image: Option<GrayImage>,
    watermark: Option<RgbaImage>,
    line_threshold: u8,
}

impl Default for TrackMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackMap {
    pub fn new() -> Self {
        TrackMap { image: None, watermark: None, line_threshold: DEFAULT_LINE_THRESHOLD }
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn width_px(&self) -> u32 {
        self.image.as_ref().map_or(0, |i| i.width())
    }

    pub fn height_px(&self) -> u32 {
        self.image.as_ref().map_or(0, |i| i.height())
    }

    pub fn line_threshold(&self) -> u8 {
        self.line_threshold
    }

    pub fn set_line_threshold(&mut self, threshold: u8) {
        self.line_threshold = threshold;
    }

    /// Decodes `source` and replaces the current raster.
    ///
    /// Decoding happens before any field is touched: on error the previously
    /// loaded track (if any) stays intact. Returns the new dimensions.
    pub fn load(&mut self, source: TrackSource, threshold: u8) -> Result<(u32, u32), TrackLoadError> {
        let gray = match source {
            TrackSource::Path(path) => {
                let bytes = std::fs::read(&path).map_err(|source| TrackLoadError::Io { path, source })?;
                image::load_from_memory(&bytes)?.to_luma8()
            }
            TrackSource::Bytes(bytes) => image::load_from_memory(&bytes)?.to_luma8(),
            TrackSource::Raster { image, .. } => image,
        };
        if gray.width() == 0 || gray.height() == 0 {
            return Err(TrackLoadError::EmptyImage);
        }
        let dims = (gray.width(), gray.height());
        debug!("track loaded: {}x{} px, threshold {}", dims.0, dims.1, threshold);
        self.image = Some(gray);
        self.line_threshold = threshold;
        Ok(dims)
    }

    /// Whether the pixel at (px, py) is part of the line.
    ///
    /// False when no track is loaded or the point falls outside the raster.
    pub fn is_pixel_on_line(&self, px: f64, py: f64) -> bool {
        let Some(image) = &self.image else { return false };
        if px < 0.0 || py < 0.0 {
            return false;
        }
        let (x, y) = (px as u32, py as u32);
        if x >= image.width() || y >= image.height() {
            return false;
        }
        image.get_pixel(x, y).0[0] < self.line_threshold
    }

    /// Watermark image alpha-blended over the raster on draw.
    pub fn set_watermark(&mut self, watermark: Option<RgbaImage>) {
        self.watermark = watermark;
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let Some(image) = &self.image else { return };
        canvas.blit_gray(image);
        if let Some(mark) = &self.watermark {
            let x = (canvas.width() as i64 - mark.width() as i64) / 2;
            let y = (canvas.height() as i64 - mark.height() as i64) / 2;
            canvas.blit_rgba(mark, x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// 20x10 white raster with a dark vertical stripe at x in [8, 12).
    fn striped() -> GrayImage {
        GrayImage::from_fn(20, 10, |x, _| if (8..12).contains(&x) { Luma([0]) } else { Luma([255]) })
    }

    #[test]
    fn test_load_raster_reports_dimensions() {
        let mut map = TrackMap::new();
        let dims = map
            .load(TrackSource::Raster { image: striped(), start_pose: None }, 100)
            .unwrap();
        assert_eq!(dims, (20, 10));
        assert!(map.is_loaded());
        assert_eq!(map.width_px(), 20);
        assert_eq!(map.height_px(), 10);
    }

    #[test]
    fn test_is_pixel_on_line_threshold() {
        let mut map = TrackMap::new();
        map.load(TrackSource::Raster { image: striped(), start_pose: None }, 100).unwrap();
        assert!(map.is_pixel_on_line(9.0, 5.0));
        assert!(!map.is_pixel_on_line(2.0, 5.0));
    }

    #[test]
    fn test_is_pixel_on_line_outside_raster_is_false() {
        let mut map = TrackMap::new();
        map.load(TrackSource::Raster { image: striped(), start_pose: None }, 100).unwrap();
        assert!(!map.is_pixel_on_line(-1.0, 5.0));
        assert!(!map.is_pixel_on_line(9.0, 50.0));
        assert!(!map.is_pixel_on_line(1e9, 1e9));
    }

    #[test]
    fn test_unloaded_map_answers_false() {
        let map = TrackMap::new();
        assert!(!map.is_pixel_on_line(0.0, 0.0));
        assert_eq!(map.width_px(), 0);
    }

    #[test]
    fn test_failed_decode_keeps_previous_track() {
        let mut map = TrackMap::new();
        map.load(TrackSource::Raster { image: striped(), start_pose: None }, 100).unwrap();
        let err = map.load(TrackSource::Bytes(vec![0, 1, 2, 3]), 100);
        assert!(err.is_err());
        assert!(map.is_loaded());
        assert_eq!(map.width_px(), 20);
    }

    #[test]
    fn test_start_pose_hint_only_on_raster_sources() {
        let pose = Pose::new(0.1, 0.2, 0.3);
        let with = TrackSource::Raster { image: striped(), start_pose: Some(pose) };
        assert_eq!(with.start_pose_hint(), Some(pose));
        assert_eq!(TrackSource::Bytes(vec![]).start_pose_hint(), None);
    }
}
