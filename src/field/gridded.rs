// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scattering data with all angular dependencies on explicit grids.

use std::ops::{Add, AddAssign, Mul, MulAssign};
use std::sync::Arc;

use log::{debug, trace};
use ndarray::{parallel::prelude::*, ArrayD, Axis, Ix2};

use super::{
    determine_type, regrid_validated, resize_element_axis, shared_grid, validate_grid,
    validate_shape, DataFormat, FieldError, ParticleType, ScatteringField, SpectralField,
};
use crate::constants::TAU;
use crate::interpolation::{downsample_axis, regrid_axis, AxisRegrid};
use crate::math::CartesianIndices;
use crate::quadrature::{integration_weights, periodic_integration_weights};
use crate::sht::Sht;
use crate::c64;

const AX_FREQ: usize = 0;
const AX_TEMP: usize = 1;
const AX_LON_INC: usize = 2;
const AX_LAT_INC: usize = 3;
const AX_LON_SCAT: usize = 4;
const AX_LAT_SCAT: usize = 5;

/// Gridded scattering data.
///
/// The data tensor has rank 7 with axes (frequency, temperature, incoming
/// azimuth, incoming zenith, scattering azimuth, scattering zenith,
/// element). Angles are in radians; azimuth grids live on \[0, 2π), zenith
/// grids on \[0, π\].
#[derive(Debug, Clone)]
pub struct GriddedField {
    f_grid: Arc<Vec<f64>>,
    t_grid: Arc<Vec<f64>>,
    lon_inc: Arc<Vec<f64>>,
    lat_inc: Arc<Vec<f64>>,
    lon_scat: Arc<Vec<f64>>,
    lat_scat: Arc<Vec<f64>>,
    particle_type: ParticleType,
    data: ArrayD<f64>,
}

impl GriddedField {
    /// Create a gridded scattering data field from grids and a fully
    /// populated rank-7 data tensor.
    pub fn new(
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
        lon_inc: Vec<f64>,
        lat_inc: Vec<f64>,
        lon_scat: Vec<f64>,
        lat_scat: Vec<f64>,
        data: ArrayD<f64>,
    ) -> Result<GriddedField, FieldError> {
        validate_grid("frequency", &f_grid)?;
        validate_grid("temperature", &t_grid)?;
        validate_grid("incoming azimuth", &lon_inc)?;
        validate_grid("incoming zenith", &lat_inc)?;
        validate_grid("scattering azimuth", &lon_scat)?;
        validate_grid("scattering zenith", &lat_scat)?;
        validate_shape(
            &data,
            &[
                f_grid.len(),
                t_grid.len(),
                lon_inc.len(),
                lat_inc.len(),
                lon_scat.len(),
                lat_scat.len(),
            ],
        )?;
        Ok(Self::from_parts(
            shared_grid(f_grid),
            shared_grid(t_grid),
            shared_grid(lon_inc),
            shared_grid(lat_inc),
            shared_grid(lon_scat),
            shared_grid(lat_scat),
            data,
        ))
    }

    /// Create an empty (zero-initialized) field with the given number of
    /// elements.
    ///
    /// Useful to pre-allocate a composite field that is filled with
    /// [`GriddedField::set_data`] from datasets defined on heterogeneous
    /// grids.
    pub fn new_empty(
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
        lon_inc: Vec<f64>,
        lat_inc: Vec<f64>,
        lon_scat: Vec<f64>,
        lat_scat: Vec<f64>,
        n_elements: usize,
    ) -> Result<GriddedField, FieldError> {
        let data = ArrayD::zeros(vec![
            f_grid.len(),
            t_grid.len(),
            lon_inc.len(),
            lat_inc.len(),
            lon_scat.len(),
            lat_scat.len(),
            n_elements,
        ]);
        Self::new(f_grid, t_grid, lon_inc, lat_inc, lon_scat, lat_scat, data)
    }

    /// Invariant-preserving constructor for internal use: grids are already
    /// validated and the tensor shape matches them.
    pub(crate) fn from_parts(
        f_grid: Arc<Vec<f64>>,
        t_grid: Arc<Vec<f64>>,
        lon_inc: Arc<Vec<f64>>,
        lat_inc: Arc<Vec<f64>>,
        lon_scat: Arc<Vec<f64>>,
        lat_scat: Arc<Vec<f64>>,
        data: ArrayD<f64>,
    ) -> GriddedField {
        let particle_type =
            determine_type(lon_inc.len(), lat_inc.len(), lon_scat.len(), lat_scat.len());
        GriddedField {
            f_grid,
            t_grid,
            lon_inc,
            lat_inc,
            lon_scat,
            lat_scat,
            particle_type,
            data,
        }
    }

    /// Deep copy of the scattering data. The returned field's data tensor is
    /// fully independent; grids remain shared (they are immutable).
    pub fn copy(&self) -> GriddedField {
        self.clone()
    }

    pub fn get_f_grid(&self) -> &[f64] {
        &self.f_grid
    }

    pub fn get_t_grid(&self) -> &[f64] {
        &self.t_grid
    }

    pub fn get_lon_inc(&self) -> &[f64] {
        &self.lon_inc
    }

    pub fn get_lat_inc(&self) -> &[f64] {
        &self.lat_inc
    }

    pub fn get_lon_scat(&self) -> &[f64] {
        &self.lon_scat
    }

    pub fn get_lat_scat(&self) -> &[f64] {
        &self.lat_scat
    }

    /// The number of stored elements (the trailing tensor axis).
    pub fn get_n_coeffs(&self) -> usize {
        self.data.len_of(Axis(6))
    }

    /// The data tensor containing the scattering data.
    pub fn get_data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// The maximal anti-aliasing-safe SHT parameters for the scattering-angle
    /// grids.
    pub fn get_sht_scat_params(&self) -> (usize, usize, usize, usize) {
        Sht::get_params(self.get_n_lon_scat(), self.get_n_lat_scat())
    }

    /// Interpolate the data to a new frequency grid. All other grids are
    /// unchanged.
    pub fn interpolate_frequency(&self, frequencies: Vec<f64>) -> Result<GriddedField, FieldError> {
        validate_grid("frequency", &frequencies)?;
        let data = regrid_axis(&self.data, AX_FREQ, &self.f_grid, &frequencies, false)?;
        Ok(Self::from_parts(
            shared_grid(frequencies),
            Arc::clone(&self.t_grid),
            Arc::clone(&self.lon_inc),
            Arc::clone(&self.lat_inc),
            Arc::clone(&self.lon_scat),
            Arc::clone(&self.lat_scat),
            data,
        ))
    }

    /// Interpolate the data to a new temperature grid.
    ///
    /// With `extrapolate` unset, target temperatures outside the source
    /// range clamp to the boundary; the policy is owned by the regridder and
    /// the flag is passed through unchanged.
    pub fn interpolate_temperature(
        &self,
        temperatures: Vec<f64>,
        extrapolate: bool,
    ) -> Result<GriddedField, FieldError> {
        validate_grid("temperature", &temperatures)?;
        let data = regrid_axis(&self.data, AX_TEMP, &self.t_grid, &temperatures, extrapolate)?;
        Ok(Self::from_parts(
            Arc::clone(&self.f_grid),
            shared_grid(temperatures),
            Arc::clone(&self.lon_inc),
            Arc::clone(&self.lat_inc),
            Arc::clone(&self.lon_scat),
            Arc::clone(&self.lat_scat),
            data,
        ))
    }

    /// Interpolate the data to new angular grids.
    pub fn interpolate_angles(
        &self,
        lon_inc: Vec<f64>,
        lat_inc: Vec<f64>,
        lon_scat: Vec<f64>,
        lat_scat: Vec<f64>,
    ) -> Result<GriddedField, FieldError> {
        validate_grid("incoming azimuth", &lon_inc)?;
        validate_grid("incoming zenith", &lat_inc)?;
        validate_grid("scattering azimuth", &lon_scat)?;
        validate_grid("scattering zenith", &lat_scat)?;
        let data = crate::interpolation::regrid(
            &self.data,
            &[
                AxisRegrid {
                    axis: AX_LON_INC,
                    source: &self.lon_inc,
                    target: &lon_inc,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LAT_INC,
                    source: &self.lat_inc,
                    target: &lat_inc,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LON_SCAT,
                    source: &self.lon_scat,
                    target: &lon_scat,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LAT_SCAT,
                    source: &self.lat_scat,
                    target: &lat_scat,
                    extrapolate: false,
                },
            ],
        )?;
        Ok(Self::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            shared_grid(lon_inc),
            shared_grid(lat_inc),
            shared_grid(lon_scat),
            shared_grid(lat_scat),
            data,
        ))
    }

    /// Reduce the scattering-angle resolution while conserving the angular
    /// integral.
    ///
    /// The azimuth axis is downsampled with an integral-conserving cell
    /// average over the periodic \[0, 2π) domain; the zenith axis is then
    /// interpolated. This is what distinguishes downsampling from plain
    /// interpolation: the integral computed by
    /// [`GriddedField::integrate_scattering_angles`] is preserved over the
    /// resampled azimuth.
    pub fn downsample_scattering_angles(
        &self,
        lon_scat: Vec<f64>,
        lat_scat: Vec<f64>,
    ) -> Result<GriddedField, FieldError> {
        validate_grid("scattering azimuth", &lon_scat)?;
        validate_grid("scattering zenith", &lat_scat)?;
        let data = downsample_axis(
            &self.data,
            AX_LON_SCAT,
            &self.lon_scat,
            &lon_scat,
            (0.0, TAU),
        )?;
        let data = regrid_axis(&data, AX_LAT_SCAT, &self.lat_scat, &lat_scat, false)?;
        Ok(Self::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            Arc::clone(&self.lon_inc),
            Arc::clone(&self.lat_inc),
            shared_grid(lon_scat),
            shared_grid(lat_scat),
            data,
        ))
    }

    /// Regrid the data to new grids along all six grid axes in one pass.
    pub fn regrid(
        &self,
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
        lon_inc: Vec<f64>,
        lat_inc: Vec<f64>,
        lon_scat: Vec<f64>,
        lat_scat: Vec<f64>,
    ) -> Result<GriddedField, FieldError> {
        validate_grid("frequency", &f_grid)?;
        validate_grid("temperature", &t_grid)?;
        validate_grid("incoming azimuth", &lon_inc)?;
        validate_grid("incoming zenith", &lat_inc)?;
        validate_grid("scattering azimuth", &lon_scat)?;
        validate_grid("scattering zenith", &lat_scat)?;
        let data = self.regrid_onto(&f_grid, &t_grid, &lon_inc, &lat_inc, &lon_scat, &lat_scat);
        Ok(Self::from_parts(
            shared_grid(f_grid),
            shared_grid(t_grid),
            shared_grid(lon_inc),
            shared_grid(lat_inc),
            shared_grid(lon_scat),
            shared_grid(lat_scat),
            data,
        ))
    }

    fn regrid_onto(
        &self,
        f_grid: &[f64],
        t_grid: &[f64],
        lon_inc: &[f64],
        lat_inc: &[f64],
        lon_scat: &[f64],
        lat_scat: &[f64],
    ) -> ArrayD<f64> {
        regrid_validated(
            &self.data,
            &[
                AxisRegrid {
                    axis: AX_FREQ,
                    source: &self.f_grid,
                    target: f_grid,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_TEMP,
                    source: &self.t_grid,
                    target: t_grid,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LON_INC,
                    source: &self.lon_inc,
                    target: lon_inc,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LAT_INC,
                    source: &self.lat_inc,
                    target: lat_inc,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LON_SCAT,
                    source: &self.lon_scat,
                    target: lon_scat,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LAT_SCAT,
                    source: &self.lat_scat,
                    target: lat_scat,
                    extrapolate: false,
                },
            ],
        )
    }

    /// Overwrite the (frequency, temperature) slice of this field with the
    /// data of `other`, regridded onto this field's angular grids.
    ///
    /// `other`'s first frequency and temperature point are used. This is how
    /// a composite field is assembled from per-frequency/temperature
    /// datasets on heterogeneous grids.
    pub fn set_data(&mut self, frequency_index: usize, temperature_index: usize, other: &GriddedField) {
        assert_eq!(
            self.get_n_coeffs(),
            other.get_n_coeffs(),
            "cannot combine fields with different element counts"
        );
        let regridded = regrid_validated(
            &other.data,
            &[
                AxisRegrid {
                    axis: AX_LON_INC,
                    source: &other.lon_inc,
                    target: &self.lon_inc,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LAT_INC,
                    source: &other.lat_inc,
                    target: &self.lat_inc,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LON_SCAT,
                    source: &other.lon_scat,
                    target: &self.lon_scat,
                    extrapolate: false,
                },
                AxisRegrid {
                    axis: AX_LAT_SCAT,
                    source: &other.lat_scat,
                    target: &self.lat_scat,
                    extrapolate: false,
                },
            ],
        );
        self.data
            .view_mut()
            .index_axis_move(Axis(AX_FREQ), frequency_index)
            .index_axis_move(Axis(0), temperature_index)
            .assign(
                &regridded
                    .view()
                    .index_axis_move(Axis(AX_FREQ), 0)
                    .index_axis_move(Axis(0), 0),
            );
    }

    /// Integrate the data over the scattering angles.
    ///
    /// For every (frequency, temperature, incoming angle, element)
    /// combination, the 2-D scattering-angle slice is integrated over
    /// azimuth ∈ \[0, 2π) and colatitude (-cos of the zenith angle) with
    /// trapezoidal weights. Returns a rank-5 tensor with the scattering-angle
    /// axes collapsed.
    pub fn integrate_scattering_angles(&self) -> ArrayD<f64> {
        let lon_weights = periodic_integration_weights(&self.lon_scat, TAU);
        let colat: Vec<f64> = self.lat_scat.iter().map(|theta| -theta.cos()).collect();
        let lat_weights = integration_weights(&colat, (-1.0, 1.0));

        let n_elements = self.get_n_coeffs();
        let dims_loop = [
            self.get_n_freqs(),
            self.get_n_temps(),
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
        ];
        let mut result = ArrayD::<f64>::zeros(vec![
            dims_loop[0],
            dims_loop[1],
            dims_loop[2],
            dims_loop[3],
            n_elements,
        ]);
        for idx in CartesianIndices::new(&dims_loop) {
            let block = self
                .data
                .view()
                .index_axis_move(Axis(0), idx[0])
                .index_axis_move(Axis(0), idx[1])
                .index_axis_move(Axis(0), idx[2])
                .index_axis_move(Axis(0), idx[3]);
            for e in 0..n_elements {
                let matrix = block.index_axis(Axis(2), e);
                let mut acc = 0.0;
                for (j, &w_lon) in lon_weights.iter().enumerate() {
                    for (i, &w_lat) in lat_weights.iter().enumerate() {
                        acc += matrix[[j, i]] * w_lon * w_lat;
                    }
                }
                let mut out_idx = idx.clone();
                out_idx.push(e);
                result[out_idx.as_slice()] = acc;
            }
        }
        result
    }

    /// Normalize the scattering-angle integrals to `value`, in place.
    ///
    /// Every (frequency, temperature, incoming angle) slice is scaled so
    /// that its first element integrates to `value`; all elements of the
    /// slice are scaled by the same factor. Slices whose integral is exactly
    /// zero are left untouched.
    pub fn normalize(&mut self, value: f64) {
        let integrals = self.integrate_scattering_angles();
        let dims_loop = [
            self.get_n_freqs(),
            self.get_n_temps(),
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
        ];
        for idx in CartesianIndices::new(&dims_loop) {
            let mut first = idx.clone();
            first.push(0);
            let integral = integrals[first.as_slice()];
            if integral == 0.0 {
                continue;
            }
            let factor = value / integral;
            trace!("normalizing slice {idx:?} by {factor:e}");
            let mut block = self
                .data
                .view_mut()
                .index_axis_move(Axis(0), idx[0])
                .index_axis_move(Axis(0), idx[1])
                .index_axis_move(Axis(0), idx[2])
                .index_axis_move(Axis(0), idx[3]);
            block.mapv_inplace(|v| v * factor);
        }
    }

    /// Change the number of stored elements. New elements are zero; on
    /// shrinking, trailing elements are dropped.
    pub fn set_number_of_scattering_coeffs(&mut self, n: usize) {
        resize_element_axis(&mut self.data, n);
    }

    /// Convert to spectral format with the maximal anti-aliasing-safe
    /// truncation for the scattering-angle grids.
    pub fn to_spectral(&self) -> Result<SpectralField, FieldError> {
        let (l_max, m_max, _, _) = self.get_sht_scat_params();
        self.to_spectral_truncated(l_max, m_max)
    }

    /// Convert to spectral format with the given truncation.
    pub fn to_spectral_truncated(
        &self,
        l_max: usize,
        m_max: usize,
    ) -> Result<SpectralField, FieldError> {
        let sht = Sht::new(l_max, m_max, self.get_n_lon_scat(), self.get_n_lat_scat())?;
        Ok(self.to_spectral_with(Arc::new(sht)))
    }

    /// Convert to spectral format using an existing transform object. The
    /// transform's grid sizes must match the scattering-angle grids.
    pub fn to_spectral_with(&self, sht: Arc<Sht>) -> SpectralField {
        assert_eq!(
            (sht.get_n_longitudes(), sht.get_n_latitudes()),
            (self.get_n_lon_scat(), self.get_n_lat_scat()),
            "the SHT grid does not match the scattering-angle grids"
        );
        debug!(
            "gridded -> spectral: l_max={} m_max={}",
            sht.get_l_max(),
            sht.get_m_max()
        );

        let n_elements = self.get_n_coeffs();
        let dims_loop = [
            self.get_n_temps(),
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
            n_elements,
        ];
        let mut data_new = ArrayD::<c64>::zeros(vec![
            self.get_n_freqs(),
            self.get_n_temps(),
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
            sht.get_n_spectral_coeffs(),
            n_elements,
        ]);
        // Iterations are independent; fan out over the frequency axis.
        data_new
            .axis_iter_mut(Axis(AX_FREQ))
            .into_par_iter()
            .zip(self.data.axis_iter(Axis(AX_FREQ)).into_par_iter())
            .for_each(|(mut out_f, in_f)| {
                for idx in CartesianIndices::new(&dims_loop) {
                    let matrix = in_f
                        .view()
                        .index_axis_move(Axis(0), idx[0])
                        .index_axis_move(Axis(0), idx[1])
                        .index_axis_move(Axis(0), idx[2])
                        .index_axis_move(Axis(2), idx[3])
                        .into_dimensionality::<Ix2>()
                        .expect("scattering-angle slice is rank 2");
                    let coeffs = sht.transform(matrix);
                    out_f
                        .view_mut()
                        .index_axis_move(Axis(0), idx[0])
                        .index_axis_move(Axis(0), idx[1])
                        .index_axis_move(Axis(0), idx[2])
                        .index_axis_move(Axis(1), idx[3])
                        .assign(&coeffs);
                }
            });

        SpectralField::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            Arc::clone(&self.lon_inc),
            Arc::clone(&self.lat_inc),
            sht,
            data_new,
        )
    }
}

impl ScatteringField for GriddedField {
    fn get_data_format(&self) -> DataFormat {
        DataFormat::Gridded
    }

    fn get_particle_type(&self) -> ParticleType {
        self.particle_type
    }

    fn get_n_freqs(&self) -> usize {
        self.f_grid.len()
    }

    fn get_n_temps(&self) -> usize {
        self.t_grid.len()
    }

    fn get_n_lon_inc(&self) -> usize {
        self.lon_inc.len()
    }

    fn get_n_lat_inc(&self) -> usize {
        self.lat_inc.len()
    }

    fn get_n_lon_scat(&self) -> usize {
        self.lon_scat.len()
    }

    fn get_n_lat_scat(&self) -> usize {
        self.lat_scat.len()
    }
}

impl AddAssign<&GriddedField> for GriddedField {
    /// Regrid `other` onto this field's grids and accumulate it. This
    /// field's grids never change.
    fn add_assign(&mut self, other: &GriddedField) {
        assert_eq!(
            self.get_n_coeffs(),
            other.get_n_coeffs(),
            "cannot combine fields with different element counts"
        );
        let regridded = other.regrid_onto(
            &self.f_grid,
            &self.t_grid,
            &self.lon_inc,
            &self.lat_inc,
            &self.lon_scat,
            &self.lat_scat,
        );
        self.data += &regridded;
    }
}

impl Add<&GriddedField> for &GriddedField {
    type Output = GriddedField;

    fn add(self, other: &GriddedField) -> GriddedField {
        let mut result = self.copy();
        result += other;
        result
    }
}

impl MulAssign<f64> for GriddedField {
    fn mul_assign(&mut self, c: f64) {
        self.data *= c;
    }
}

impl Mul<f64> for &GriddedField {
    type Output = GriddedField;

    fn mul(self, c: f64) -> GriddedField {
        let mut result = self.copy();
        result *= c;
        result
    }
}
