// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scattering data with both angular dependencies in spectral form.

use std::ops::{Add, AddAssign, Mul, MulAssign};
use std::sync::Arc;

use log::debug;
use ndarray::{parallel::prelude::*, ArrayD, Axis, Ix1, Ix2};

use super::{
    determine_type, regrid_validated, resize_element_axis, shared_grid, validate_grid,
    validate_shape, DataFormat, FieldError, ParticleType, ScatteringField, SpectralField,
};
use crate::interpolation::{regrid_axis, AxisRegrid};
use crate::math::CartesianIndices;
use crate::sht::Sht;
use crate::c64;

const AX_FREQ: usize = 0;
const AX_TEMP: usize = 1;

/// Scattering data whose incoming- and scattering-angle dependencies are
/// both expanded into spherical-harmonic coefficients.
///
/// The data tensor has rank 5 with axes (frequency, temperature, incoming
/// coefficient, scattering coefficient, element) and complex entries. The
/// incoming-angle expansion uses the complex-argument transform, so its
/// coefficient axis keeps all orders.
#[derive(Debug, Clone)]
pub struct FullySpectralField {
    f_grid: Arc<Vec<f64>>,
    t_grid: Arc<Vec<f64>>,
    sht_inc: Arc<Sht>,
    sht_scat: Arc<Sht>,
    particle_type: ParticleType,
    data: ArrayD<c64>,
}

impl FullySpectralField {
    /// Create a fully-spectral scattering data field.
    pub fn new(
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
        sht_inc: Arc<Sht>,
        sht_scat: Arc<Sht>,
        data: ArrayD<c64>,
    ) -> Result<FullySpectralField, FieldError> {
        validate_grid("frequency", &f_grid)?;
        validate_grid("temperature", &t_grid)?;
        validate_shape(
            &data,
            &[
                f_grid.len(),
                t_grid.len(),
                sht_inc.get_n_spectral_coeffs_cmplx(),
                sht_scat.get_n_spectral_coeffs(),
            ],
        )?;
        Ok(Self::from_parts(
            shared_grid(f_grid),
            shared_grid(t_grid),
            sht_inc,
            sht_scat,
            data,
        ))
    }

    /// Create an empty (zero-initialized) field with the given number of
    /// elements.
    pub fn new_empty(
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
        sht_inc: Arc<Sht>,
        sht_scat: Arc<Sht>,
        n_elements: usize,
    ) -> Result<FullySpectralField, FieldError> {
        let data = ArrayD::zeros(vec![
            f_grid.len(),
            t_grid.len(),
            sht_inc.get_n_spectral_coeffs_cmplx(),
            sht_scat.get_n_spectral_coeffs(),
            n_elements,
        ]);
        Self::new(f_grid, t_grid, sht_inc, sht_scat, data)
    }

    pub(crate) fn from_parts(
        f_grid: Arc<Vec<f64>>,
        t_grid: Arc<Vec<f64>>,
        sht_inc: Arc<Sht>,
        sht_scat: Arc<Sht>,
        data: ArrayD<c64>,
    ) -> FullySpectralField {
        let particle_type = determine_type(
            sht_inc.get_n_longitudes(),
            sht_inc.get_n_latitudes(),
            sht_scat.get_n_longitudes(),
            sht_scat.get_n_latitudes(),
        );
        FullySpectralField {
            f_grid,
            t_grid,
            sht_inc,
            sht_scat,
            particle_type,
            data,
        }
    }

    /// Deep copy of the scattering data. Grids and the transform objects
    /// remain shared (they are immutable).
    pub fn copy(&self) -> FullySpectralField {
        self.clone()
    }

    pub fn get_f_grid(&self) -> &[f64] {
        &self.f_grid
    }

    pub fn get_t_grid(&self) -> &[f64] {
        &self.t_grid
    }

    pub fn get_lon_inc(&self) -> &[f64] {
        self.sht_inc.get_longitude_grid()
    }

    pub fn get_lat_inc(&self) -> &[f64] {
        self.sht_inc.get_latitude_grid()
    }

    pub fn get_lon_scat(&self) -> &[f64] {
        self.sht_scat.get_longitude_grid()
    }

    pub fn get_lat_scat(&self) -> &[f64] {
        self.sht_scat.get_latitude_grid()
    }

    /// The transform object expanding the incoming-angle dependency.
    pub fn get_sht_inc(&self) -> &Arc<Sht> {
        &self.sht_inc
    }

    /// The transform object expanding the scattering-angle dependency.
    pub fn get_sht_scat(&self) -> &Arc<Sht> {
        &self.sht_scat
    }

    /// The number of stored elements (the trailing tensor axis).
    pub fn get_n_coeffs(&self) -> usize {
        self.data.len_of(Axis(4))
    }

    /// The data tensor containing the scattering data.
    pub fn get_data(&self) -> &ArrayD<c64> {
        &self.data
    }

    /// Interpolate the data to a new frequency grid.
    pub fn interpolate_frequency(
        &self,
        frequencies: Vec<f64>,
    ) -> Result<FullySpectralField, FieldError> {
        validate_grid("frequency", &frequencies)?;
        let data = regrid_axis(&self.data, AX_FREQ, &self.f_grid, &frequencies, false)?;
        Ok(Self::from_parts(
            shared_grid(frequencies),
            Arc::clone(&self.t_grid),
            Arc::clone(&self.sht_inc),
            Arc::clone(&self.sht_scat),
            data,
        ))
    }

    /// Interpolate the data to a new temperature grid; see
    /// [`GriddedField::interpolate_temperature`](super::GriddedField::interpolate_temperature)
    /// for the extrapolation policy.
    pub fn interpolate_temperature(
        &self,
        temperatures: Vec<f64>,
        extrapolate: bool,
    ) -> Result<FullySpectralField, FieldError> {
        validate_grid("temperature", &temperatures)?;
        let data = regrid_axis(&self.data, AX_TEMP, &self.t_grid, &temperatures, extrapolate)?;
        Ok(Self::from_parts(
            Arc::clone(&self.f_grid),
            shared_grid(temperatures),
            Arc::clone(&self.sht_inc),
            Arc::clone(&self.sht_scat),
            data,
        ))
    }

    /// Regrid the data to new frequency and temperature grids in one pass.
    pub fn regrid(
        &self,
        f_grid: Vec<f64>,
        t_grid: Vec<f64>,
    ) -> Result<FullySpectralField, FieldError> {
        validate_grid("frequency", &f_grid)?;
        validate_grid("temperature", &t_grid)?;
        let data = self.regrid_onto(&f_grid, &t_grid);
        Ok(Self::from_parts(
            shared_grid(f_grid),
            shared_grid(t_grid),
            Arc::clone(&self.sht_inc),
            Arc::clone(&self.sht_scat),
            data,
        ))
    }

    fn regrid_onto(&self, f_grid: &[f64], t_grid: &[f64]) -> ArrayD<c64> {
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
            ],
        )
    }

    /// Merge the data of `other` into the (frequency, temperature) slice of
    /// this field, re-expanding both spectral axes onto this field's
    /// truncations with [`Sht::add_coeffs_cmplx`] per element.
    /// `other`'s first frequency and temperature point are used.
    pub fn set_data(
        &mut self,
        frequency_index: usize,
        temperature_index: usize,
        other: &FullySpectralField,
    ) {
        assert_eq!(
            self.get_n_coeffs(),
            other.get_n_coeffs(),
            "cannot combine fields with different element counts"
        );
        for e in 0..self.get_n_coeffs() {
            let merged = {
                let own = self
                    .data
                    .view()
                    .index_axis_move(Axis(0), frequency_index)
                    .index_axis_move(Axis(0), temperature_index)
                    .index_axis_move(Axis(2), e)
                    .into_dimensionality::<Ix2>()
                    .expect("coefficient slice is rank 2");
                let donor = other
                    .data
                    .view()
                    .index_axis_move(Axis(0), 0)
                    .index_axis_move(Axis(0), 0)
                    .index_axis_move(Axis(2), e)
                    .into_dimensionality::<Ix2>()
                    .expect("coefficient slice is rank 2");
                Sht::add_coeffs_cmplx(
                    &self.sht_inc,
                    &self.sht_scat,
                    own,
                    &other.sht_inc,
                    &other.sht_scat,
                    donor,
                )
            };
            self.data
                .view_mut()
                .index_axis_move(Axis(0), frequency_index)
                .index_axis_move(Axis(0), temperature_index)
                .index_axis_move(Axis(2), e)
                .assign(&merged);
        }
    }

    /// Change the number of stored elements. New elements are zero; on
    /// shrinking, trailing elements are dropped.
    pub fn set_number_of_scattering_coeffs(&mut self, n: usize) {
        resize_element_axis(&mut self.data, n);
    }

    /// Convert to spectral format by synthesizing the incoming-angle
    /// dependency onto the incoming transform's angular grids. The
    /// scattering-angle axis stays spectral.
    pub fn to_spectral(&self) -> SpectralField {
        debug!(
            "fully spectral -> spectral: {} x {} incoming angles",
            self.sht_inc.get_n_longitudes(),
            self.sht_inc.get_n_latitudes()
        );
        let n_elements = self.get_n_coeffs();
        let n_scat = self.sht_scat.get_n_spectral_coeffs();
        let dims_loop = [self.get_n_temps(), n_scat, n_elements];
        let sht_inc = &self.sht_inc;
        let mut data_new = ArrayD::<c64>::zeros(vec![
            self.get_n_freqs(),
            self.get_n_temps(),
            sht_inc.get_n_longitudes(),
            sht_inc.get_n_latitudes(),
            n_scat,
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
                        .index_axis_move(Axis(1), idx[1])
                        .index_axis_move(Axis(1), idx[2])
                        .into_dimensionality::<Ix1>()
                        .expect("coefficient slice is rank 1");
                    let matrix = sht_inc.synthesize_cmplx(coeffs);
                    out_f
                        .view_mut()
                        .index_axis_move(Axis(0), idx[0])
                        .index_axis_move(Axis(2), idx[1])
                        .index_axis_move(Axis(2), idx[2])
                        .assign(&matrix);
                }
            });

        SpectralField::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            Arc::new(self.sht_inc.get_longitude_grid().to_vec()),
            Arc::new(self.sht_inc.get_latitude_grid().to_vec()),
            Arc::clone(&self.sht_scat),
            data_new,
        )
    }

    /// Re-expand the scattering-angle axis onto a different truncation, then
    /// synthesize the incoming-angle axis.
    ///
    /// Implemented by accumulating this field into an empty field of the new
    /// truncation, reusing the coefficient-merge logic of `+=`.
    pub fn to_spectral_with(&self, sht_scat: Arc<Sht>) -> SpectralField {
        let data = ArrayD::zeros(vec![
            self.get_n_freqs(),
            self.get_n_temps(),
            self.sht_inc.get_n_spectral_coeffs_cmplx(),
            sht_scat.get_n_spectral_coeffs(),
            self.get_n_coeffs(),
        ]);
        let mut result = Self::from_parts(
            Arc::clone(&self.f_grid),
            Arc::clone(&self.t_grid),
            Arc::clone(&self.sht_inc),
            sht_scat,
            data,
        );
        result += self;
        result.to_spectral()
    }

    /// Re-expand the scattering-angle axis onto the given truncation,
    /// keeping its grid sizes, then synthesize the incoming-angle axis.
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
}

impl ScatteringField for FullySpectralField {
    fn get_data_format(&self) -> DataFormat {
        DataFormat::FullySpectral
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
        self.sht_inc.get_n_longitudes()
    }

    fn get_n_lat_inc(&self) -> usize {
        self.sht_inc.get_n_latitudes()
    }

    fn get_n_lon_scat(&self) -> usize {
        self.sht_scat.get_n_longitudes()
    }

    fn get_n_lat_scat(&self) -> usize {
        self.sht_scat.get_n_latitudes()
    }
}

impl AddAssign<&FullySpectralField> for FullySpectralField {
    /// Regrid `other` onto this field's frequency and temperature grids and
    /// accumulate it, merging both spectral axes onto this field's
    /// truncations per (frequency, temperature, element) independently.
    fn add_assign(&mut self, other: &FullySpectralField) {
        assert_eq!(
            self.get_n_coeffs(),
            other.get_n_coeffs(),
            "cannot combine fields with different element counts"
        );
        let regridded = other.regrid_onto(&self.f_grid, &self.t_grid);
        let dims_loop = [self.get_n_freqs(), self.get_n_temps(), self.get_n_coeffs()];
        for idx in CartesianIndices::new(&dims_loop) {
            let merged = {
                let own = self
                    .data
                    .view()
                    .index_axis_move(Axis(0), idx[0])
                    .index_axis_move(Axis(0), idx[1])
                    .index_axis_move(Axis(2), idx[2])
                    .into_dimensionality::<Ix2>()
                    .expect("coefficient slice is rank 2");
                let donor = regridded
                    .view()
                    .index_axis_move(Axis(0), idx[0])
                    .index_axis_move(Axis(0), idx[1])
                    .index_axis_move(Axis(2), idx[2])
                    .into_dimensionality::<Ix2>()
                    .expect("coefficient slice is rank 2");
                Sht::add_coeffs_cmplx(
                    &self.sht_inc,
                    &self.sht_scat,
                    own,
                    &other.sht_inc,
                    &other.sht_scat,
                    donor,
                )
            };
            self.data
                .view_mut()
                .index_axis_move(Axis(0), idx[0])
                .index_axis_move(Axis(0), idx[1])
                .index_axis_move(Axis(2), idx[2])
                .assign(&merged);
        }
    }
}

impl Add<&FullySpectralField> for &FullySpectralField {
    type Output = FullySpectralField;

    fn add(self, other: &FullySpectralField) -> FullySpectralField {
        let mut result = self.copy();
        result += other;
        result
    }
}

impl MulAssign<f64> for FullySpectralField {
    fn mul_assign(&mut self, c: f64) {
        self.data.mapv_inplace(|z| z * c);
    }
}

impl Mul<f64> for &FullySpectralField {
    type Output = FullySpectralField;

    fn mul(self, c: f64) -> FullySpectralField {
        let mut result = self.copy();
        result *= c;
        result
    }
}
