// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Single-scattering optical-property data for radiative-transfer applications.

Scattering properties (phase matrix, extinction matrix, absorption vector,
back- and forward-scattering coefficients) are resolved over frequency,
temperature and direction. This crate represents such data in three
mathematically equivalent formats and converts between them:

- [`GriddedField`]: all angular dependencies on explicit grids;
- [`SpectralField`]: the scattering-angle dependency expanded into a
  spherical-harmonic series;
- [`FullySpectralField`]: both the incoming- and the scattering-angle
  dependencies expanded spectrally.

Every format supports interpolation and regridding along its non-spectral
axes, integral-conserving angular downsampling (gridded), normalization of
the scattering-angle integral, and addition/scaling. Scattering datasets
computed on heterogeneous grids can therefore be combined, compressed for
storage, and handed to whichever radiative-transfer solver consumes them.
 */

pub mod constants;
mod error;
pub mod field;
pub mod interpolation;
pub(crate) mod math;
pub mod quadrature;
pub mod sht;

// Re-exports.
pub use error::ScatteringError;
pub use field::{
    DataFormat, FieldError, FullySpectralField, GriddedField, ParticleType, ScatteringField,
    SpectralField,
};
pub use interpolation::RegridError;
pub use quadrature::GaussLegendreQuadrature;
pub use sht::{Sht, ShtError};

use num_complex::Complex;

/// A double-precision complex number.
#[allow(non_camel_case_types)]
pub type c64 = Complex<f64>;
