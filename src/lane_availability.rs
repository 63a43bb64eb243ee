// src/lane_availability.rs
//
// Decides whether the lane on the signaled side is wide enough to be a
// target for a nudgeless lane change. Recomputed every cycle from the
// model's lane lines; no history.

use crate::types::{LaneChangeDirection, LaneLine};
use ndarray::Array1;
use thiserror::Error;

/// Minimum width of the target lane, meters
pub const MIN_LANE_WIDTH: f32 = 2.6;

#[derive(Debug, Error, PartialEq)]
pub enum LaneAvailabilityError {
    #[error("no lane change direction requested")]
    NoDirection,

    #[error("lane line {index} missing ({available} lines available)")]
    MissingLine { index: usize, available: usize },

    #[error("lane line {index} has no points")]
    EmptyLine { index: usize },

    #[error("lane line {index} has {x_len} x values but {y_len} y values")]
    MismatchedAxes {
        index: usize,
        x_len: usize,
        y_len: usize,
    },

    #[error("current lane has {current} points but target lane has {target}")]
    LengthMismatch { current: usize, target: usize },

    #[error("lane geometry contains non-finite values")]
    NonFinite,
}

/// Indices of (ego lane edge, far edge of target lane) for a direction, into
/// lane lines ordered far left, ego left, ego right, far right.
pub fn boundary_indices(direction: LaneChangeDirection) -> Option<(usize, usize)> {
    match direction {
        LaneChangeDirection::Left => Some((1, 0)),
        LaneChangeDirection::Right => Some((2, 3)),
        LaneChangeDirection::None => None,
    }
}

fn line_at(lines: &[LaneLine], index: usize) -> Result<&LaneLine, LaneAvailabilityError> {
    let line = lines
        .get(index)
        .ok_or(LaneAvailabilityError::MissingLine {
            index,
            available: lines.len(),
        })?;

    if line.is_empty() {
        return Err(LaneAvailabilityError::EmptyLine { index });
    }
    if line.x.len() != line.y.len() {
        return Err(LaneAvailabilityError::MismatchedAxes {
            index,
            x_len: line.x.len(),
            y_len: line.y.len(),
        });
    }
    Ok(line)
}

/// Piecewise-linear interpolation of `fp` over `xp` at `x`, clamped to the
/// end values outside the sampled range. `xp` is expected to be increasing.
pub fn interp(x: f32, xp: &[f32], fp: &[f32]) -> f32 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return f32::NAN;
    }
    if n == 1 || x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    // First sample strictly greater than x; guaranteed in 1..n by the clamps above
    let hi = xp[..n].partition_point(|&v| v <= x).clamp(1, n - 1);
    let lo = hi - 1;
    let dx = xp[hi] - xp[lo];
    if dx.abs() <= f32::EPSILON {
        return fp[lo];
    }
    let t = (x - xp[lo]) / dx;
    fp[lo] + t * (fp[hi] - fp[lo])
}

/// Maximum lateral gap between the ego lane edge and the far edge of the
/// target lane, sampled along the target line's longitudinal range.
pub fn max_lane_width(
    lines: &[LaneLine],
    direction: LaneChangeDirection,
) -> Result<f32, LaneAvailabilityError> {
    let (current_idx, target_idx) =
        boundary_indices(direction).ok_or(LaneAvailabilityError::NoDirection)?;

    let current = line_at(lines, current_idx)?;
    let target = line_at(lines, target_idx)?;

    if current.x.len() != target.x.len() {
        return Err(LaneAvailabilityError::LengthMismatch {
            current: current.x.len(),
            target: target.x.len(),
        });
    }

    let n = target.x.len();
    let xs = Array1::linspace(target.x[0], target.x[n - 1], n);
    let current_y = xs.mapv(|x| interp(x, &current.x, &current.y));
    let target_y = xs.mapv(|x| interp(x, &target.x, &target.y));
    let widths = (&target_y - &current_y).mapv(f32::abs);

    if widths.iter().any(|w| !w.is_finite()) {
        return Err(LaneAvailabilityError::NonFinite);
    }

    Ok(widths.fold(0.0_f32, |acc, &w| acc.max(w)))
}

/// True when the target lane is at least [`MIN_LANE_WIDTH`] wide somewhere
/// along the horizon. Any shape problem in the geometry reports not available.
pub fn is_lane_available(
    lines: &[LaneLine],
    direction: LaneChangeDirection,
) -> Result<bool, LaneAvailabilityError> {
    Ok(max_lane_width(lines, direction)? >= MIN_LANE_WIDTH)
}
