// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Scattering data fields.

A scattering data field holds directionally-resolved single-scattering
properties over frequency and temperature grids, in one of three formats:

- [`GriddedField`]: a rank-7 tensor over
  (frequency, temperature, incoming azimuth, incoming zenith, scattering
  azimuth, scattering zenith, element);
- [`SpectralField`]: a rank-6 complex tensor where the two scattering-angle
  axes are replaced by a spherical-harmonic coefficient axis;
- [`FullySpectralField`]: a rank-5 complex tensor where the incoming-angle
  axes are spectral as well.

The trailing "element" axis packs physically distinct quantities (phase
matrix entries, extinction entries, ...); its semantic meaning is managed by
the caller. Conversions between the formats are always explicit; there is no
dynamic dispatch over formats.

Grids are immutable and shared between instances via [`Arc`]; the bulk data
tensor is uniquely owned per instance and deep-copied by `copy()`.
 */

mod error;
mod fully_spectral;
mod gridded;
mod spectral;
#[cfg(test)]
mod tests;

pub use error::FieldError;
pub use fully_spectral::FullySpectralField;
pub use gridded::GriddedField;
pub use spectral::SpectralField;

use std::sync::Arc;

use ndarray::ArrayD;

use crate::interpolation::{self, AxisRegrid, Lerp};
use crate::math::is_strictly_sorted;

/// The representation of the angular dependencies of a scattering data
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Gridded,
    Spectral,
    FullySpectral,
}

/// The symmetry class of a particle ensemble, derived from which angular
/// dependencies of its scattering data are trivial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleType {
    /// Totally random orientation: only the scattering zenith angle remains.
    Random,

    /// Azimuthally-random orientation: no incoming-azimuth dependency.
    AzimuthallyRandom,

    /// No trivial angular dependencies.
    General,
}

/// Determine the particle type for the given angular grid sizes.
///
/// This is a pure function of the grid cardinalities; fields recompute it at
/// construction so it can never diverge from the grids.
pub fn determine_type(
    n_lon_inc: usize,
    n_lat_inc: usize,
    n_lon_scat: usize,
    _n_lat_scat: usize,
) -> ParticleType {
    if n_lon_inc == 1 && n_lat_inc == 1 && n_lon_scat == 1 {
        return ParticleType::Random;
    }
    if n_lon_inc == 1 {
        return ParticleType::AzimuthallyRandom;
    }
    ParticleType::General
}

/// Common metadata of every scattering data field: grid cardinalities and
/// the derived particle type.
pub trait ScatteringField {
    /// Get the format of this field.
    fn get_data_format(&self) -> DataFormat;

    /// Get the particle type derived from the angular grid sizes.
    fn get_particle_type(&self) -> ParticleType;

    fn get_n_freqs(&self) -> usize;
    fn get_n_temps(&self) -> usize;
    fn get_n_lon_inc(&self) -> usize;
    fn get_n_lat_inc(&self) -> usize;
    fn get_n_lon_scat(&self) -> usize;
    fn get_n_lat_scat(&self) -> usize;
}

/// Validate a caller-supplied grid before it becomes part of a field.
pub(crate) fn validate_grid(name: &'static str, grid: &[f64]) -> Result<(), FieldError> {
    if grid.is_empty() {
        return Err(FieldError::EmptyGrid { name });
    }
    if !is_strictly_sorted(grid) {
        return Err(FieldError::UnsortedGrid { name });
    }
    Ok(())
}

/// Validate a data tensor against the axis extents its grids imply.
pub(crate) fn validate_shape<A>(data: &ArrayD<A>, grid_dims: &[usize]) -> Result<(), FieldError> {
    let found = data.shape().to_vec();
    // The element axis is free; every other axis must match its grid.
    if found.len() != grid_dims.len() + 1 || found[..grid_dims.len()] != *grid_dims {
        let mut expected = grid_dims.to_vec();
        expected.push(found.last().copied().unwrap_or(0));
        return Err(FieldError::DataShape { expected, found });
    }
    Ok(())
}

/// Regrid with grids that were validated when their fields were
/// constructed; failures would be internal logic errors.
pub(crate) fn regrid_validated<A: Lerp>(data: &ArrayD<A>, axes: &[AxisRegrid]) -> ArrayD<A> {
    interpolation::regrid(data, axes).expect("grids are validated at field construction")
}

/// Resize the trailing element axis of a data tensor. New entries are zero;
/// on shrinking, trailing entries are dropped.
pub(crate) fn resize_element_axis<A: Lerp>(data: &mut ArrayD<A>, n: usize) {
    let last = data.ndim() - 1;
    let current = data.len_of(ndarray::Axis(last));
    if current == n {
        return;
    }
    let mut shape = data.shape().to_vec();
    shape[last] = n;
    let mut resized = ArrayD::<A>::zeros(shape);
    let keep = current.min(n);
    resized
        .slice_axis_mut(ndarray::Axis(last), ndarray::Slice::from(0..keep))
        .assign(&data.slice_axis(ndarray::Axis(last), ndarray::Slice::from(0..keep)));
    *data = resized;
}

/// Shorthand for sharing a caller-supplied grid.
pub(crate) fn shared_grid(grid: Vec<f64>) -> Arc<Vec<f64>> {
    Arc::new(grid)
}
