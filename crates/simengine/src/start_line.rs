//! Start-line placement: derived from track-piece adjacency when possible,
//! otherwise a configurable fixed fallback.

use rand::Rng;
use rand::seq::SliceRandom;

use simcore::{PIXELS_PER_METER, Pose, StartLine, px_to_m};
use trackmap::PieceGrid;

/// A resolved start line together with the pose that runs a lap across it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartPlacement {
    pub line: StartLine,
    pub pose: Pose,
}

/// Derives a start line from the piece grid's cell adjacencies.
///
/// One connection between occupied cells is picked uniformly at random; the
/// start line spans `1.5 ×` the wheelbase across the inter-cell direction,
/// centered on the midpoint of the two cell centers — the spot where the
/// drawn line crosses from one piece into the next. The pose heads along the
/// inter-cell direction, so driving the track crosses the line squarely.
///
/// Returns `None` when the grid holds no adjacent occupied pair; the caller
/// falls back to its fixed segment.
pub fn derive_from_connections<R: Rng>(
    grid: &PieceGrid,
    track_width_px: f64,
    wheelbase_m: f64,
    rng: &mut R,
) -> Option<StartPlacement> {
    if grid.cols() == 0 {
        return None;
    }
    let connections = grid.connections();
    let conn = connections.choose(rng)?;

    let cell_size_px = track_width_px / grid.cols() as f64;
    let x1 = (conn.c1 as f64 + 0.5) * cell_size_px;
    let y1 = (conn.r1 as f64 + 0.5) * cell_size_px;
    let x2 = (conn.c2 as f64 + 0.5) * cell_size_px;
    let y2 = (conn.r2 as f64 + 0.5) * cell_size_px;

    let cx = (x1 + x2) / 2.0;
    let cy = (y1 + y2) / 2.0;
    let angle = (y2 - y1).atan2(x2 - x1);
    let perp = angle + std::f64::consts::FRAC_PI_2;

    let half_px = wheelbase_m * 1.5 * PIXELS_PER_METER / 2.0;
    let dx = perp.cos() * half_px;
    let dy = perp.sin() * half_px;

    Some(StartPlacement {
        line: StartLine::new(
            px_to_m(cx - dx),
            px_to_m(cy - dy),
            px_to_m(cx + dx),
            px_to_m(cy + dy),
        ),
        pose: Pose::new(px_to_m(cx), px_to_m(cy), angle),
    })
}

/// Last-resort start segment, in pixel space.
///
/// The default coordinates come from the historical bundled track and are
/// not meaningful for arbitrary images; override per deployment when the
/// piece grid is unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackStartLine {
    pub x1_px: f64,
    pub y1_px: f64,
    pub x2_px: f64,
    pub y2_px: f64,
}

impl Default for FallbackStartLine {
    fn default() -> Self {
        FallbackStartLine {
            x1_px: 749.6005822946047,
            y1_px: 523.3982349194796,
            x2_px: 988.4578291329269,
            y2_px: 523.3982349194796,
        }
    }
}

impl FallbackStartLine {
    /// The fallback segment in meters, with the pose at its center heading
    /// across it.
    pub fn placement(&self) -> StartPlacement {
        let line = StartLine::new(
            px_to_m(self.x1_px),
            px_to_m(self.y1_px),
            px_to_m(self.x2_px),
            px_to_m(self.y2_px),
        );
        let center = line.center();
        StartPlacement {
            line,
            pose: Pose::new(center.x, center.y, line.perpendicular_angle_rad()),
        }
    }
}
