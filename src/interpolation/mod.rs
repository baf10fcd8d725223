// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Regridding of tensor data along named axes.

[`regrid`] applies 1-D linear interpolation independently along a subset of a
tensor's axes, leaving all other axes untouched; this is the workhorse behind
every `interpolate_*`, `regrid` and combination operation of the scattering
data formats. [`downsample_axis`] is the integral-conserving variant used
when angular resolution is reduced for storage: plain interpolation onto a
coarser grid loses part of the integral, downsampling must not.
 */

mod error;

pub use error::RegridError;

use itertools::Itertools;
use ndarray::{azip, Array1, ArrayD, Axis};
use num_traits::Zero;

use crate::math::is_strictly_sorted;

/// Element types that linear interpolation can combine: real and complex
/// tensor entries.
pub trait Lerp:
    Copy + Zero + std::ops::Add<Output = Self> + std::ops::Mul<f64, Output = Self>
{
}

impl<T> Lerp for T where
    T: Copy + Zero + std::ops::Add<Output = T> + std::ops::Mul<f64, Output = T>
{
}

/// A single-axis regrid instruction: interpolate from `source` grid points
/// onto `target` grid points along tensor axis `axis`.
///
/// When `extrapolate` is false, target points outside the source range clamp
/// to the boundary value; when true, the edge segment is continued linearly.
/// That policy lives here and only here; callers pass the flag through
/// unchanged.
#[derive(Clone, Copy)]
pub struct AxisRegrid<'a> {
    pub axis: usize,
    pub source: &'a [f64],
    pub target: &'a [f64],
    pub extrapolate: bool,
}

/// Interpolate tensor data along one axis.
///
/// All other axes are untouched; the output tensor's `axis` has the target
/// grid's length. A source axis of length 1 broadcasts its value to every
/// target point.
pub fn regrid_axis<A: Lerp>(
    data: &ArrayD<A>,
    axis: usize,
    source: &[f64],
    target: &[f64],
    extrapolate: bool,
) -> Result<ArrayD<A>, RegridError> {
    if source.is_empty() || target.is_empty() {
        return Err(RegridError::EmptyGrid);
    }
    if !is_strictly_sorted(source) {
        return Err(RegridError::UnsortedGrid);
    }
    if data.len_of(Axis(axis)) != source.len() {
        return Err(RegridError::AxisLength {
            axis,
            grid_len: source.len(),
            axis_len: data.len_of(Axis(axis)),
        });
    }

    let weights = interpolation_weights(source, target, extrapolate);
    let mut shape = data.shape().to_vec();
    shape[axis] = target.len();
    let mut out = ArrayD::<A>::zeros(shape);
    for (k, &(i0, i1, w)) in weights.iter().enumerate() {
        let lo = data.index_axis(Axis(axis), i0);
        let hi = data.index_axis(Axis(axis), i1);
        let mut dst = out.index_axis_mut(Axis(axis), k);
        azip!((d in &mut dst, &a in &lo, &b in &hi) *d = a * (1.0 - w) + b * w);
    }
    Ok(out)
}

/// Interpolate tensor data along several axes in one pass.
///
/// Linear interpolation on a product grid factorizes, so the joint regrid is
/// a sequence of independent single-axis passes. Axes whose target grid
/// equals their source grid are skipped.
pub fn regrid<A: Lerp>(data: &ArrayD<A>, axes: &[AxisRegrid]) -> Result<ArrayD<A>, RegridError> {
    let mut out: Option<ArrayD<A>> = None;
    for step in axes {
        if step.source == step.target {
            continue;
        }
        let src = out.as_ref().unwrap_or(data);
        out = Some(regrid_axis(
            src,
            step.axis,
            step.source,
            step.target,
            step.extrapolate,
        )?);
    }
    Ok(out.unwrap_or_else(|| data.clone()))
}

/// For each target point: the two bracketing source indices and the weight
/// of the upper one.
fn interpolation_weights(
    source: &[f64],
    target: &[f64],
    extrapolate: bool,
) -> Vec<(usize, usize, f64)> {
    let n = source.len();
    target
        .iter()
        .map(|&t| {
            if n == 1 {
                return (0, 0, 0.0);
            }
            if t <= source[0] {
                return if extrapolate {
                    (0, 1, (t - source[0]) / (source[1] - source[0]))
                } else {
                    (0, 0, 0.0)
                };
            }
            if t >= source[n - 1] {
                return if extrapolate {
                    (
                        n - 2,
                        n - 1,
                        (t - source[n - 2]) / (source[n - 1] - source[n - 2]),
                    )
                } else {
                    (n - 1, n - 1, 0.0)
                };
            }
            // source[i] < t <= source[i + 1] is impossible to miss now.
            let i = source.partition_point(|&s| s < t) - 1;
            (i, i + 1, (t - source[i]) / (source[i + 1] - source[i]))
        })
        .collect()
}

/// Downsample tensor data along one axis of a periodic domain, conserving
/// the integral.
///
/// Each target value is the average of the periodic piecewise-linear
/// interpolant of the source data over the midpoint-bounded cell around the
/// target point. The cells tile the period exactly, so the trapezoidal
/// integral over the periodic domain (see
/// [`periodic_integration_weights`](crate::quadrature::periodic_integration_weights))
/// is conserved to rounding.
pub fn downsample_axis<A: Lerp>(
    data: &ArrayD<A>,
    axis: usize,
    source: &[f64],
    target: &[f64],
    domain: (f64, f64),
) -> Result<ArrayD<A>, RegridError> {
    if source.is_empty() || target.is_empty() {
        return Err(RegridError::EmptyGrid);
    }
    if !is_strictly_sorted(source) || !is_strictly_sorted(target) {
        return Err(RegridError::UnsortedGrid);
    }
    if data.len_of(Axis(axis)) != source.len() {
        return Err(RegridError::AxisLength {
            axis,
            grid_len: source.len(),
            axis_len: data.len_of(Axis(axis)),
        });
    }

    let period = domain.1 - domain.0;
    let coeffs = cell_average_coefficients(source, target, period);

    let mut shape = data.shape().to_vec();
    shape[axis] = target.len();
    let mut out = ArrayD::<A>::zeros(shape);
    for (k, row) in coeffs.outer_iter().enumerate() {
        let mut dst = out.index_axis_mut(Axis(axis), k);
        for (j, &c) in row.iter().enumerate() {
            if c == 0.0 {
                continue;
            }
            let src = data.index_axis(Axis(axis), j);
            azip!((d in &mut dst, &s in &src) *d = *d + s * c);
        }
    }
    Ok(out)
}

/// Coefficient matrix `c` such that `value_k = Σ_j c[k, j] · f_j` is the
/// cell average of the periodic piecewise-linear interpolant of `f` over
/// target cell `k`.
fn cell_average_coefficients(source: &[f64], target: &[f64], period: f64) -> ndarray::Array2<f64> {
    let n_src = source.len();
    let n_tgt = target.len();

    // Extended node list closing the period: source points plus the first
    // point shifted by one period. Coefficient index n_src folds back to 0.
    let mut ext = Vec::with_capacity(n_src + 1);
    ext.extend_from_slice(source);
    ext.push(source[0] + period);

    // Cell boundaries are the periodic midpoints between target points.
    let mut bounds = Vec::with_capacity(n_tgt + 1);
    bounds.push(0.5 * (target[n_tgt - 1] + target[0] + period) - period);
    for (a, b) in target.iter().tuple_windows() {
        bounds.push(0.5 * (a + b));
    }
    bounds.push(bounds[0] + period);

    let mut coeffs = ndarray::Array2::<f64>::zeros((n_tgt, n_src));
    for k in 0..n_tgt {
        let (lo, hi) = (bounds[k], bounds[k + 1]);
        let width = hi - lo;
        let mut row = Array1::<f64>::zeros(n_src + 1);
        if n_tgt == 1 {
            // A single cell is the whole period.
            add_segment_coefficients(&ext, ext[0], ext[0] + period, &mut row);
        } else {
            // Shift the cell into the extended node range, splitting it at
            // the wrap point if needed.
            let lo = ext[0] + (lo - ext[0]).rem_euclid(period);
            let hi = lo + width;
            if hi <= ext[0] + period {
                add_segment_coefficients(&ext, lo, hi, &mut row);
            } else {
                add_segment_coefficients(&ext, lo, ext[0] + period, &mut row);
                add_segment_coefficients(&ext, ext[0], hi - period, &mut row);
            }
        }
        // Fold the closing node back onto the first point and average.
        row[0] += row[n_src];
        for j in 0..n_src {
            coeffs[(k, j)] = row[j] / width;
        }
    }
    coeffs
}

/// Accumulate the coefficients of `∫_lo^hi` of the piecewise-linear
/// interpolant over the (non-wrapping) node list `ext` into `row`.
fn add_segment_coefficients(ext: &[f64], lo: f64, hi: f64, row: &mut Array1<f64>) {
    for j in 0..ext.len() - 1 {
        let (a, b) = (ext[j], ext[j + 1]);
        let seg_lo = lo.max(a);
        let seg_hi = hi.min(b);
        if seg_hi <= seg_lo {
            continue;
        }
        let dx = b - a;
        // Fractional positions of the overlap within the segment.
        let s0 = (seg_lo - a) / dx;
        let s1 = (seg_hi - a) / dx;
        let len = seg_hi - seg_lo;
        // ∫ over the overlap of (1 - s) f_j + s f_{j+1}.
        let mean_s = 0.5 * (s0 + s1);
        row[j] += len * (1.0 - mean_s);
        row[j + 1] += len * mean_s;
    }
}
