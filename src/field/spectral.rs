// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scattering data with the scattering-angle dependency in spectral form.

use std::ops::{Add, AddAssign, Mul, MulAssign};
use std::sync::Arc;

use log::debug;
use ndarray::{parallel::prelude::*, ArrayD, Axis, Ix1, Ix2};

use super::{
    determine_type, regrid_validated, resize_element_axis, shared_grid, validate_grid,
    validate_shape, DataFormat, FieldError, FullySpectralField, GriddedField, ParticleType,
    ScatteringField,
};
use crate::constants::SQRT_4_PI;
use crate::interpolation::{regrid_axis, AxisRegrid};
use crate::math::CartesianIndices;
use crate::sht::Sht;
use crate::c64;

const AX_FREQ: usize = 0;
const AX_TEMP: usize = 1;
const AX_LON_INC: usize = 2;
const AX_LAT_INC: usize = 3;
const AX_COEFF: usize = 4;

/// Scattering data whose scattering-angle dependency is expanded into
/// spherical-harmonic coefficients.
///
/// The data tensor has rank 6 with axes (frequency, temperature, incoming
/// azimuth, incoming zenith, scattering coefficient, element) and complex
/// entries. The scattering-angle grids live on the transform object.
#[derive(Debug, Clone)]
pub struct SpectralField {
    f_grid: Arc<Vec<f64>>,
    t_grid: Arc<Vec<f64>>,
    lon_inc: Arc<Vec<f64>>,
    lat_inc: Arc<Vec<f64>>,
    sht_scat: Arc<Sht>,
    particle_type: ParticleType,
    data: ArrayD<c64>,
}

impl SpectralField {
    /// Create a spectral scattering data field.
    pub fn new(
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
        lon_inc: Vec<f64>,
        lat_inc: Vec<f64>,
        sht_scat: Arc<Sht>,
        data: ArrayD<c64>,
    ) -> Result<SpectralField, FieldError> {
        validate_grid("frequency", &f_grid)?;
        validate_grid("temperature", &t_grid)?;
        validate_grid("incoming azimuth", &lon_inc)?;
        validate_grid("incoming zenith", &lat_inc)?;
        validate_shape(
            &data,
            &[
                f_grid.len(),
                t_grid.len(),
                lon_inc.len(),
                lat_inc.len(),
                sht_scat.get_n_spectral_coeffs(),
            ],
        )?;
        Ok(Self::from_parts(
            shared_grid(f_grid),
            shared_grid(t_grid),
            shared_grid(lon_inc),
            shared_grid(lat_inc),
            sht_scat,
            data,
        ))
    }

    /// Create an empty (zero-initialized) field with the given number of
    /// elements.
    pub fn new_empty(
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
        lon_inc: Vec<f64>,
        lat_inc: Vec<f64>,
        sht_scat: Arc<Sht>,
        n_elements: usize,
    ) -> Result<SpectralField, FieldError> {
        let data = ArrayD::zeros(vec![
            f_grid.len(),
            t_grid.len(),
            lon_inc.len(),
            lat_inc.len(),
            sht_scat.get_n_spectral_coeffs(),
            n_elements,
        ]);
        Self::new(f_grid, t_grid, lon_inc, lat_inc, sht_scat, data)
    }

    pub(crate) fn from_parts(
        f_grid: Arc<Vec<f64>>,
        t_grid: Arc<Vec<f64>>,
        lon_inc: Arc<Vec<f64>>,
        lat_inc: Arc<Vec<f64>>,
        sht_scat: Arc<Sht>,
        data: ArrayD<c64>,
    ) -> SpectralField {
        let particle_type = determine_type(
            lon_inc.len(),
            lat_inc.len(),
            sht_scat.get_n_longitudes(),
            sht_scat.get_n_latitudes(),
        );
        SpectralField {
            f_grid,
            t_grid,
            lon_inc,
            lat_inc,
            sht_scat,
            particle_type,
            data,
        }
    }

    /// Deep copy of the scattering data. Grids and the transform object
    /// remain shared (they are immutable).
    pub fn copy(&self) -> SpectralField {
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
        self.sht_scat.get_longitude_grid()
    }

    pub fn get_lat_scat(&self) -> &[f64] {
        self.sht_scat.get_latitude_grid()
    }

    /// The transform object expanding the scattering-angle dependency.
    pub fn get_sht_scat(&self) -> &Arc<Sht> {
        &self.sht_scat
    }

    /// The number of stored elements (the trailing tensor axis).
    pub fn get_n_coeffs(&self) -> usize {
        self.data.len_of(Axis(5))
    }

    /// The data tensor containing the scattering data.
    pub fn get_data(&self) -> &ArrayD<c64> {
        &self.data
    }

    /// The maximal anti-aliasing-safe SHT parameters for the incoming-angle
    /// grids.
    pub fn get_sht_inc_params(&self) -> (usize, usize, usize, usize) {
        Sht::get_params(self.get_n_lon_inc(), self.get_n_lat_inc())
    }

    /// Interpolate the data to a new frequency grid.
    pub fn interpolate_frequency(&self, frequencies: Vec<f64>) -> Result<SpectralField, FieldError> {
        validate_grid("frequency", &frequencies)?;
        let data = regrid_axis(&self.data, AX_FREQ, &self.f_grid, &frequencies, false)?;
        Ok(Self::from_parts(
            shared_grid(frequencies),
            Arc::clone(&self.t_grid),
            Arc::clone(&self.lon_inc),
            Arc::clone(&self.lat_inc),
            Arc::clone(&self.sht_scat),
            data,
        ))
    }

    /// Interpolate the data to a new temperature grid; see
    /// [`GriddedField::interpolate_temperature`] for the extrapolation
    /// policy.
    pub fn interpolate_temperature(
        &self,
        temperatures: Vec<f64>,
        extrapolate: bool,
    ) -> Result<SpectralField, FieldError> {
        validate_grid("temperature", &temperatures)?;
        let data = regrid_axis(&self.data, AX_TEMP, &self.t_grid, &temperatures, extrapolate)?;
        Ok(Self::from_parts(
            Arc::clone(&self.f_grid),
            shared_grid(temperatures),
            Arc::clone(&self.lon_inc),
            Arc::clone(&self.lat_inc),
            Arc::clone(&self.sht_scat),
            data,
        ))
    }

    /// Interpolate the data to new incoming-angle grids. The
    /// scattering-angle dependency is spectral and unaffected.
    pub fn interpolate_angles(
        &self,
        lon_inc: Vec<f64>,
        lat_inc: Vec<f64>,
    ) -> Result<SpectralField, FieldError> {
        validate_grid("incoming azimuth", &lon_inc)?;
        validate_grid("incoming zenith", &lat_inc)?;
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
            ],
        )?;
        Ok(Self::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            shared_grid(lon_inc),
            shared_grid(lat_inc),
            Arc::clone(&self.sht_scat),
            data,
        ))
    }

    /// Regrid the data to new frequency, temperature and incoming-angle
    /// grids in one pass.
    pub fn regrid(
        &self,
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
        lon_inc: Vec<f64>,
        lat_inc: Vec<f64>,
    ) -> Result<SpectralField, FieldError> {
        validate_grid("frequency", &f_grid)?;
        validate_grid("temperature", &t_grid)?;
        validate_grid("incoming azimuth", &lon_inc)?;
        validate_grid("incoming zenith", &lat_inc)?;
        let data = self.regrid_onto(&f_grid, &t_grid, &lon_inc, &lat_inc);
        Ok(Self::from_parts(
            shared_grid(f_grid),
            shared_grid(t_grid),
            shared_grid(lon_inc),
            shared_grid(lat_inc),
            Arc::clone(&self.sht_scat),
            data,
        ))
    }

    fn regrid_onto(
        &self,
        f_grid: &[f64],
        t_grid: &[f64],
        lon_inc: &[f64],
        lat_inc: &[f64],
    ) -> ArrayD<c64> {
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
            ],
        )
    }

    /// Merge the data of `other` into the (frequency, temperature) slice of
    /// this field.
    ///
    /// `other`'s incoming angles are regridded onto this field's grids and
    /// its scattering coefficients are re-expanded onto this field's
    /// truncation with [`Sht::add_coeffs`], per incoming angle and element
    /// independently; `other`'s first frequency and temperature point are
    /// used.
    pub fn set_data(&mut self, frequency_index: usize, temperature_index: usize, other: &SpectralField) {
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
            ],
        );
        let dims_loop = [
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
            self.get_n_coeffs(),
        ];
        for idx in CartesianIndices::new(&dims_loop) {
            let merged = {
                let own = self
                    .data
                    .view()
                    .index_axis_move(Axis(0), frequency_index)
                    .index_axis_move(Axis(0), temperature_index)
                    .index_axis_move(Axis(0), idx[0])
                    .index_axis_move(Axis(0), idx[1])
                    .index_axis_move(Axis(1), idx[2])
                    .into_dimensionality::<Ix1>()
                    .expect("coefficient slice is rank 1");
                let donor = regridded
                    .view()
                    .index_axis_move(Axis(0), 0)
                    .index_axis_move(Axis(0), 0)
                    .index_axis_move(Axis(0), idx[0])
                    .index_axis_move(Axis(0), idx[1])
                    .index_axis_move(Axis(1), idx[2])
                    .into_dimensionality::<Ix1>()
                    .expect("coefficient slice is rank 1");
                Sht::add_coeffs(&self.sht_scat, own, &other.sht_scat, donor)
            };
            self.data
                .view_mut()
                .index_axis_move(Axis(0), frequency_index)
                .index_axis_move(Axis(0), temperature_index)
                .index_axis_move(Axis(0), idx[0])
                .index_axis_move(Axis(0), idx[1])
                .index_axis_move(Axis(1), idx[2])
                .assign(&merged);
        }
    }

    /// Integrate the data over the scattering angles.
    ///
    /// The angular integral of a band-limited field is its degree-0
    /// coefficient scaled by √(4π); this is a direct extraction, no
    /// quadrature is involved. Returns a rank-5 real tensor with the
    /// coefficient axis collapsed.
    pub fn integrate_scattering_angles(&self) -> ArrayD<f64> {
        self.data
            .index_axis(Axis(AX_COEFF), 0)
            .mapv(|z| z.re * SQRT_4_PI)
    }

    /// Normalize the scattering-angle integrals to `value`, in place.
    ///
    /// The entire coefficient slice is scaled uniformly by
    /// `value / integral`. Uniform scaling is linear, so the degree-0
    /// coefficient and with it the integral rescale exactly while the
    /// relative angular structure is preserved. Slices whose integral is
    /// exactly zero are left untouched.
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
            let mut block = self
                .data
                .view_mut()
                .index_axis_move(Axis(0), idx[0])
                .index_axis_move(Axis(0), idx[1])
                .index_axis_move(Axis(0), idx[2])
                .index_axis_move(Axis(0), idx[3]);
            block.mapv_inplace(|z| z * factor);
        }
    }

    /// Change the number of stored elements. New elements are zero; on
    /// shrinking, trailing elements are dropped.
    pub fn set_number_of_scattering_coeffs(&mut self, n: usize) {
        resize_element_axis(&mut self.data, n);
    }

    /// Re-expand the data onto a different scattering-angle truncation.
    ///
    /// Implemented by accumulating this field into an empty field of the new
    /// truncation, reusing the coefficient-merge logic of `+=`. Growing the
    /// truncation is lossless; shrinking drops the higher coefficients.
    pub fn to_spectral_with(&self, sht_scat: Arc<Sht>) -> SpectralField {
        let data = ArrayD::zeros(vec![
            self.get_n_freqs(),
            self.get_n_temps(),
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
            sht_scat.get_n_spectral_coeffs(),
            self.get_n_coeffs(),
        ]);
        let mut result = Self::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            Arc::clone(&self.lon_inc),
            Arc::clone(&self.lat_inc),
            sht_scat,
            data,
        );
        result += self;
        result
    }

    /// Re-expand the data onto the given truncation, keeping the
    /// scattering-angle grid sizes.
    pub fn to_spectral_truncated(
        &self,
        l_max: usize,
        m_max: usize,
    ) -> Result<SpectralField, FieldError> {
        let sht = Sht::new(
            l_max,
            m_max,
            self.sht_scat.get_n_longitudes(),
            self.sht_scat.get_n_latitudes(),
        )?;
        Ok(self.to_spectral_with(Arc::new(sht)))
    }

    /// Convert to gridded format by synthesizing the scattering-angle
    /// dependency onto the transform's angular grids.
    pub fn to_gridded(&self) -> GriddedField {
        debug!(
            "spectral -> gridded: {} x {} scattering angles",
            self.get_n_lon_scat(),
            self.get_n_lat_scat()
        );
        let n_elements = self.get_n_coeffs();
        let dims_loop = [
            self.get_n_temps(),
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
            n_elements,
        ];
        let sht = &self.sht_scat;
        let mut data_new = ArrayD::<f64>::zeros(vec![
            self.get_n_freqs(),
            self.get_n_temps(),
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
            self.get_n_lon_scat(),
            self.get_n_lat_scat(),
            n_elements,
        ]);
        data_new
            .axis_iter_mut(Axis(AX_FREQ))
            .into_par_iter()
            .zip(self.data.axis_iter(Axis(AX_FREQ)).into_par_iter())
            .for_each(|(mut out_f, in_f)| {
                for idx in CartesianIndices::new(&dims_loop) {
                    let coeffs = in_f
                        .view()
                        .index_axis_move(Axis(0), idx[0])
                        .index_axis_move(Axis(0), idx[1])
                        .index_axis_move(Axis(0), idx[2])
                        .index_axis_move(Axis(1), idx[3])
                        .into_dimensionality::<Ix1>()
                        .expect("coefficient slice is rank 1");
                    let matrix = sht.synthesize(coeffs);
                    out_f
                        .view_mut()
                        .index_axis_move(Axis(0), idx[0])
                        .index_axis_move(Axis(0), idx[1])
                        .index_axis_move(Axis(0), idx[2])
                        .index_axis_move(Axis(2), idx[3])
                        .assign(&matrix);
                }
            });

        GriddedField::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            Arc::clone(&self.lon_inc),
            Arc::clone(&self.lat_inc),
            Arc::new(self.sht_scat.get_longitude_grid().to_vec()),
            Arc::new(self.sht_scat.get_latitude_grid().to_vec()),
            data_new,
        )
    }

    /// Convert to gridded format on a resampled scattering-angle grid of the
    /// given sizes.
    pub fn to_gridded_resampled(
        &self,
        n_lon: usize,
        n_lat: usize,
    ) -> Result<GriddedField, FieldError> {
        let sht = Sht::new(
            self.sht_scat.get_l_max(),
            self.sht_scat.get_m_max(),
            n_lon,
            n_lat,
        )?;
        Ok(self.to_spectral_with(Arc::new(sht)).to_gridded())
    }

    /// Convert to fully-spectral format with the maximal anti-aliasing-safe
    /// truncation for the incoming-angle grids.
    pub fn to_fully_spectral(&self) -> Result<FullySpectralField, FieldError> {
        let (l_max, m_max, _, _) = self.get_sht_inc_params();
        self.to_fully_spectral_truncated(l_max, m_max)
    }

    /// Convert to fully-spectral format with the given incoming-angle
    /// truncation.
    pub fn to_fully_spectral_truncated(
        &self,
        l_max: usize,
        m_max: usize,
    ) -> Result<FullySpectralField, FieldError> {
        let sht = Sht::new(l_max, m_max, self.get_n_lon_inc(), self.get_n_lat_inc())?;
        Ok(self.to_fully_spectral_with(Arc::new(sht)))
    }

    /// Convert to fully-spectral format using an existing transform object
    /// for the incoming angles. The transform's grid sizes must match the
    /// incoming-angle grids.
    ///
    /// The complex-argument forward transform is applied along the incoming
    /// angles for every scattering coefficient and element independently.
    pub fn to_fully_spectral_with(&self, sht_inc: Arc<Sht>) -> FullySpectralField {
        assert_eq!(
            (sht_inc.get_n_longitudes(), sht_inc.get_n_latitudes()),
            (self.get_n_lon_inc(), self.get_n_lat_inc()),
            "the SHT grid does not match the incoming-angle grids"
        );
        debug!(
            "spectral -> fully spectral: l_max={} m_max={}",
            sht_inc.get_l_max(),
            sht_inc.get_m_max()
        );

        let n_elements = self.get_n_coeffs();
        let n_scat = self.sht_scat.get_n_spectral_coeffs();
        let dims_loop = [self.get_n_temps(), n_scat, n_elements];
        let mut data_new = ArrayD::<c64>::zeros(vec![
            self.get_n_freqs(),
            self.get_n_temps(),
            sht_inc.get_n_spectral_coeffs_cmplx(),
            n_scat,
            n_elements,
        ]);
        data_new
            .axis_iter_mut(Axis(AX_FREQ))
            .into_par_iter()
            .zip(self.data.axis_iter(Axis(AX_FREQ)).into_par_iter())
            .for_each(|(mut out_f, in_f)| {
                for idx in CartesianIndices::new(&dims_loop) {
                    // The incoming-angle matrix for one scattering
                    // coefficient and element.
                    let matrix = in_f
                        .view()
                        .index_axis_move(Axis(0), idx[0])
                        .index_axis_move(Axis(2), idx[1])
                        .index_axis_move(Axis(2), idx[2])
                        .into_dimensionality::<Ix2>()
                        .expect("incoming-angle slice is rank 2");
                    let coeffs = sht_inc.transform_cmplx(matrix);
                    out_f
                        .view_mut()
                        .index_axis_move(Axis(0), idx[0])
                        .index_axis_move(Axis(1), idx[1])
                        .index_axis_move(Axis(1), idx[2])
                        .assign(&coeffs);
                }
            });

        FullySpectralField::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            sht_inc,
            Arc::clone(&self.sht_scat),
            data_new,
        )
    }
}

impl ScatteringField for SpectralField {
    fn get_data_format(&self) -> DataFormat {
        DataFormat::Spectral
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
        self.sht_scat.get_n_longitudes()
    }

    fn get_n_lat_scat(&self) -> usize {
        self.sht_scat.get_n_latitudes()
    }
}

impl AddAssign<&SpectralField> for SpectralField {
    /// Regrid `other` onto this field's grids and accumulate it, merging
    /// the scattering coefficients onto this field's truncation per
    /// (frequency, temperature, incoming angle, element) independently.
    fn add_assign(&mut self, other: &SpectralField) {
        assert_eq!(
            self.get_n_coeffs(),
            other.get_n_coeffs(),
            "cannot combine fields with different element counts"
        );
        let regridded = other.regrid_onto(&self.f_grid, &self.t_grid, &self.lon_inc, &self.lat_inc);
        let dims_loop = [
            self.get_n_freqs(),
            self.get_n_temps(),
            self.get_n_lon_inc(),
            self.get_n_lat_inc(),
            self.get_n_coeffs(),
        ];
        for idx in CartesianIndices::new(&dims_loop) {
            let merged = {
                let own = self
                    .data
                    .view()
                    .index_axis_move(Axis(0), idx[0])
                    .index_axis_move(Axis(0), idx[1])
                    .index_axis_move(Axis(0), idx[2])
                    .index_axis_move(Axis(0), idx[3])
                    .index_axis_move(Axis(1), idx[4])
                    .into_dimensionality::<Ix1>()
                    .expect("coefficient slice is rank 1");
                let donor = regridded
                    .view()
                    .index_axis_move(Axis(0), idx[0])
                    .index_axis_move(Axis(0), idx[1])
                    .index_axis_move(Axis(0), idx[2])
                    .index_axis_move(Axis(0), idx[3])
                    .index_axis_move(Axis(1), idx[4])
                    .into_dimensionality::<Ix1>()
                    .expect("coefficient slice is rank 1");
                Sht::add_coeffs(&self.sht_scat, own, &other.sht_scat, donor)
            };
            self.data
                .view_mut()
                .index_axis_move(Axis(0), idx[0])
                .index_axis_move(Axis(0), idx[1])
                .index_axis_move(Axis(0), idx[2])
                .index_axis_move(Axis(0), idx[3])
                .index_axis_move(Axis(1), idx[4])
                .assign(&merged);
        }
    }
}

impl Add<&SpectralField> for &SpectralField {
    type Output = SpectralField;

    fn add(self, other: &SpectralField) -> SpectralField {
        let mut result = self.copy();
        result += other;
        result
    }
}

impl MulAssign<f64> for SpectralField {
    fn mul_assign(&mut self, c: f64) {
        self.data.mapv_inplace(|z| z * c);
    }
}

impl Mul<f64> for &SpectralField {
    type Output = SpectralField;

    fn mul(self, c: f64) -> SpectralField {
        let mut result = self.copy();
        result *= c;
        result
    }
}
