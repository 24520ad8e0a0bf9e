//! Bundled demo track.
//!
//! Stands in for the default track image the original tool ships: a closed
//! ring of straight segments between the centers of the border cells of a
//! 3x3 piece grid, with the matching occupancy grid so start-line derivation
//! has connections to work with.

use image::{GrayImage, Luma};

use crate::PieceGrid;

/// Border-cell ring of a 3x3 grid, in driving order.
const RING: [(usize, usize); 8] =
    [(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0), (1, 0)];

/// Builds a square ring track. `cell_px` is the piece size; the image comes
/// out `3*cell_px` on a side with a dark line of width `cell_px / 8`.
pub fn ring_track(cell_px: u32) -> (GrayImage, PieceGrid) {
    let side = 3 * cell_px;
    let mut image = GrayImage::from_pixel(side, side, Luma([255]));

    let center = |(r, c): (usize, usize)| {
        ((c as f64 + 0.5) * cell_px as f64, (r as f64 + 0.5) * cell_px as f64)
    };
    let radius = (cell_px as f64 / 16.0).max(2.0);
    for i in 0..RING.len() {
        let (x1, y1) = center(RING[i]);
        let (x2, y2) = center(RING[(i + 1) % RING.len()]);
        stamp_segment(&mut image, x1, y1, x2, y2, radius);
    }

    let mut grid = PieceGrid::new(3, 3);
    for (r, c) in RING {
        grid.set(r, c, true);
    }
    (image, grid)
}

/// Stamps a dark line segment as overlapping discs.
fn stamp_segment(image: &mut GrayImage, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
    let length = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
    let steps = (length / (radius / 2.0)).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        stamp_disc(image, x1 + (x2 - x1) * t, y1 + (y2 - y1) * t, radius);
    }
}

fn stamp_disc(image: &mut GrayImage, cx: f64, cy: f64, radius: f64) {
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil() as u32).min(image.width().saturating_sub(1));
    let y1 = ((cy + radius).ceil() as u32).min(image.height().saturating_sub(1));
    let r2 = radius * radius;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                image.put_pixel(x, y, Luma([0]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TrackMap, TrackSource};

    #[test]
    fn test_ring_track_dimensions() {
        let (image, grid) = ring_track(200);
        assert_eq!(image.dimensions(), (600, 600));
        assert_eq!((grid.rows(), grid.cols()), (3, 3));
    }

    #[test]
    fn test_ring_grid_leaves_center_empty() {
        let (_, grid) = ring_track(200);
        assert!(!grid.is_occupied(1, 1));
        assert_eq!(grid.connections().len(), 8);
    }

    #[test]
    fn test_connection_midpoints_lie_on_the_line() {
        let (image, grid) = ring_track(200);
        let mut map = TrackMap::new();
        map.load(TrackSource::Raster { image, start_pose: None }, 100).unwrap();
        for conn in grid.connections() {
            let cell = 200.0;
            let mx = ((conn.c1 as f64 + conn.c2 as f64) / 2.0 + 0.5) * cell;
            let my = ((conn.r1 as f64 + conn.r2 as f64) / 2.0 + 0.5) * cell;
            assert!(map.is_pixel_on_line(mx, my), "connection midpoint ({mx}, {my}) off line");
        }
    }
}
