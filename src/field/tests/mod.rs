// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Property tests for the scattering data formats.
//!
//! Synthetic data is made band-limited by projecting deterministic
//! pseudo-random grids through the transform, so that format conversions are
//! exact and round trips can be checked tightly.

use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::{Array2, ArrayD, Axis};

use super::*;
use crate::constants::{PI, SQRT_4_PI, TAU};
use crate::math::CartesianIndices;
use crate::sht::Sht;
use crate::c64;

/// Deterministic xorshift64* value sequence; keeps the synthetic data
/// reproducible without a randomness dependency.
struct ValueSequence {
    state: u64,
}

impl ValueSequence {
    fn new(seed: u64) -> ValueSequence {
        ValueSequence {
            state: seed.max(1),
        }
    }

    /// The next value in (-1, 1).
    fn next_value(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D);
        (bits >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }

    fn next_complex(&mut self) -> c64 {
        c64::new(self.next_value(), self.next_value())
    }
}

fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![a];
    }
    (0..n)
        .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
        .collect()
}

fn azimuth_grid(n: usize) -> Vec<f64> {
    (0..n).map(|j| j as f64 * TAU / n as f64).collect()
}

fn zenith_grid(n: usize) -> Vec<f64> {
    (0..n).map(|i| (i as f64 + 0.5) * PI / n as f64).collect()
}

/// A band-limited scattering-angle slice: pseudo-random grid values
/// projected onto the transform's truncation.
fn band_limited_slice(sht: &Sht, seq: &mut ValueSequence, offset: f64) -> Array2<f64> {
    let raw = Array2::from_shape_fn(
        (sht.get_n_longitudes(), sht.get_n_latitudes()),
        |_| seq.next_value() + offset,
    );
    sht.synthesize(sht.transform(raw.view()).view())
}

/// A gridded field whose scattering-angle dependency is band-limited to the
/// given transform's truncation and whose scattering-angle grids are the
/// transform's grids.
fn synthetic_gridded(
    f_grid: &[f64],
    t_grid: &[f64],
    lon_inc: &[f64],
    lat_inc: &[f64],
    sht: &Sht,
    n_elements: usize,
    seq: &mut ValueSequence,
    offset: f64,
) -> GriddedField {
    let lon_scat = sht.get_longitude_grid().to_vec();
    let lat_scat = sht.get_latitude_grid().to_vec();
    let mut data = ArrayD::<f64>::zeros(vec![
        f_grid.len(),
        t_grid.len(),
        lon_inc.len(),
        lat_inc.len(),
        lon_scat.len(),
        lat_scat.len(),
        n_elements,
    ]);
    let dims_loop = [
        f_grid.len(),
        t_grid.len(),
        lon_inc.len(),
        lat_inc.len(),
        n_elements,
    ];
    for idx in CartesianIndices::new(&dims_loop) {
        let slice = band_limited_slice(sht, seq, offset);
        data.view_mut()
            .index_axis_move(Axis(0), idx[0])
            .index_axis_move(Axis(0), idx[1])
            .index_axis_move(Axis(0), idx[2])
            .index_axis_move(Axis(0), idx[3])
            .index_axis_move(Axis(2), idx[4])
            .assign(&slice);
    }
    GriddedField::new(
        f_grid.to_vec(),
        t_grid.to_vec(),
        lon_inc.to_vec(),
        lat_inc.to_vec(),
        lon_scat,
        lat_scat,
        data,
    )
    .unwrap()
}

/// A fully-spectral field with pseudo-random complex coefficients.
fn synthetic_fully_spectral(
    f_grid: &[f64],
    t_grid: &[f64],
    sht_inc: Arc<Sht>,
    sht_scat: Arc<Sht>,
    n_elements: usize,
    seq: &mut ValueSequence,
) -> FullySpectralField {
    let data = ArrayD::from_shape_fn(
        vec![
            f_grid.len(),
            t_grid.len(),
            sht_inc.get_n_spectral_coeffs_cmplx(),
            sht_scat.get_n_spectral_coeffs(),
            n_elements,
        ]
        .as_slice(),
        |_| seq.next_complex(),
    );
    FullySpectralField::new(f_grid.to_vec(), t_grid.to_vec(), sht_inc, sht_scat, data).unwrap()
}

fn test_grids() -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let f_grid = linspace(1e9, 1e11, 3);
    let t_grid = linspace(250.0, 290.0, 2);
    let lon_inc = vec![0.0];
    let lat_inc = zenith_grid(4);
    (f_grid, t_grid, lon_inc, lat_inc)
}

fn assert_tensors_close(a: &ArrayD<f64>, b: &ArrayD<f64>, epsilon: f64) {
    assert_eq!(a.shape(), b.shape());
    for (&x, &y) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!(x, y, epsilon = epsilon);
    }
}

fn assert_cmplx_tensors_close(a: &ArrayD<c64>, b: &ArrayD<c64>, epsilon: f64) {
    assert_eq!(a.shape(), b.shape());
    for (&x, &y) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!(x.re, y.re, epsilon = epsilon);
        assert_abs_diff_eq!(x.im, y.im, epsilon = epsilon);
    }
}

#[test]
fn particle_type_classification() {
    assert_eq!(determine_type(1, 1, 1, 37), ParticleType::Random);
    assert_eq!(determine_type(1, 19, 37, 19), ParticleType::AzimuthallyRandom);
    assert_eq!(determine_type(5, 19, 37, 19), ParticleType::General);

    // The classification must come out of a constructed field the same way.
    let field = GriddedField::new_empty(
        vec![1e9],
        vec![270.0],
        azimuth_grid(1),
        zenith_grid(19),
        azimuth_grid(37),
        zenith_grid(19),
        1,
    )
    .unwrap();
    assert_eq!(field.get_particle_type(), ParticleType::AzimuthallyRandom);
    assert_eq!(field.get_data_format(), DataFormat::Gridded);
}

#[test]
fn gridded_spectral_round_trip() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht = Sht::new(4, 3, 8, 6).unwrap();
    let mut seq = ValueSequence::new(1);
    let gridded = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 2, &mut seq, 0.0);

    let round_tripped = gridded.to_spectral_truncated(4, 3).unwrap().to_gridded();
    assert_tensors_close(round_tripped.get_data(), gridded.get_data(), 1e-10);
}

#[test]
fn spectral_fully_spectral_round_trip() {
    let f_grid = linspace(1e9, 1e11, 2);
    let t_grid = linspace(250.0, 290.0, 2);
    let sht_inc = Arc::new(Sht::new(3, 2, 6, 5).unwrap());
    let sht_scat = Arc::new(Sht::new(4, 3, 8, 6).unwrap());
    let mut seq = ValueSequence::new(2);
    let fully = synthetic_fully_spectral(
        &f_grid,
        &t_grid,
        Arc::clone(&sht_inc),
        Arc::clone(&sht_scat),
        2,
        &mut seq,
    );

    // The spectral reference is band-limited over the incoming angles by
    // construction.
    let spectral = fully.to_spectral();
    let round_tripped = spectral
        .to_fully_spectral_with(Arc::clone(&sht_inc))
        .to_spectral();
    assert_cmplx_tensors_close(round_tripped.get_data(), spectral.get_data(), 1e-10);
}

#[test]
fn downsampling_conserves_integral() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht = Sht::new(5, 3, 16, 7).unwrap();
    let mut seq = ValueSequence::new(3);
    let gridded = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 2, &mut seq, 2.0);

    // Halve the azimuth resolution, keep the zenith grid.
    let downsampled = gridded
        .downsample_scattering_angles(azimuth_grid(8), gridded.get_lat_scat().to_vec())
        .unwrap();
    let before = gridded.integrate_scattering_angles();
    let after = downsampled.integrate_scattering_angles();
    for (&x, &y) in before.iter().zip(after.iter()) {
        assert_relative_eq!(x, y, max_relative = 1e-8);
    }
}

#[test]
fn downsampling_conserves_integral_in_latitude() {
    // Data constant over the zenith angle: the zenith interpolation of the
    // downsampler cannot lose anything, whatever the new grid.
    let f_grid = vec![1e9];
    let t_grid = vec![270.0];
    let lon_scat = azimuth_grid(12);
    let lat_scat = zenith_grid(9);
    let mut seq = ValueSequence::new(4);
    let lon_profile: Vec<f64> = (0..12).map(|_| seq.next_value() + 2.0).collect();
    let data = ArrayD::from_shape_fn(
        vec![1, 1, 1, 1, 12, 9, 1].as_slice(),
        |ix| lon_profile[ix[4]],
    );
    let gridded = GriddedField::new(
        f_grid,
        t_grid,
        vec![0.0],
        vec![PI / 2.0],
        lon_scat,
        lat_scat,
        data,
    )
    .unwrap();

    let downsampled = gridded
        .downsample_scattering_angles(azimuth_grid(5), zenith_grid(4))
        .unwrap();
    let before = gridded.integrate_scattering_angles();
    let after = downsampled.integrate_scattering_angles();
    assert_relative_eq!(before[[0, 0, 0, 0, 0]], after[[0, 0, 0, 0, 0]], max_relative = 1e-8);
}

#[test]
fn gridded_normalization_is_exact() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht = Sht::new(4, 3, 8, 6).unwrap();
    let mut seq = ValueSequence::new(5);
    // Offset keeps every integral well away from zero.
    let mut gridded =
        synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 2, &mut seq, 3.0);

    let value = 4.0 * PI;
    gridded.normalize(value);
    let integrals = gridded.integrate_scattering_angles();
    let n_first = integrals.len_of(Axis(4));
    for idx in CartesianIndices::new(&[3, 2, 1, 4]) {
        let mut first = idx.clone();
        first.push(0);
        assert_relative_eq!(integrals[first.as_slice()], value, max_relative = 1e-10);
    }
    assert_eq!(n_first, 2);
}

#[test]
fn normalization_skips_zero_integrals() {
    let f_grid = vec![1e9, 1e10];
    let t_grid = vec![270.0];
    let sht = Sht::new(3, 2, 6, 5).unwrap();
    let mut seq = ValueSequence::new(6);
    let mut gridded = synthetic_gridded(
        &f_grid,
        &t_grid,
        &[0.0],
        &zenith_grid(2),
        &sht,
        1,
        &mut seq,
        2.0,
    );
    // Zero out the first frequency entirely.
    {
        let mut data = gridded.get_data().clone();
        data.index_axis_mut(Axis(0), 0).fill(0.0);
        gridded = GriddedField::new(
            gridded.get_f_grid().to_vec(),
            gridded.get_t_grid().to_vec(),
            gridded.get_lon_inc().to_vec(),
            gridded.get_lat_inc().to_vec(),
            gridded.get_lon_scat().to_vec(),
            gridded.get_lat_scat().to_vec(),
            data,
        )
        .unwrap();
    }

    gridded.normalize(1.0);
    let integrals = gridded.integrate_scattering_angles();
    // The zeroed slices stay zero, the others are normalized.
    for idx in CartesianIndices::new(&[1, 2]) {
        assert_abs_diff_eq!(integrals[[0, 0, 0, idx[1], 0]], 0.0);
        assert_relative_eq!(integrals[[1, 0, 0, idx[1], 0]], 1.0, max_relative = 1e-10);
    }
}

#[test]
fn spectral_normalization_scales_uniformly() {
    let f_grid = vec![1e9];
    let t_grid = vec![270.0];
    let sht = Arc::new(Sht::new(4, 3, 8, 6).unwrap());
    let mut seq = ValueSequence::new(7);
    let n_coeffs = sht.get_n_spectral_coeffs();
    let mut data = ArrayD::from_shape_fn(
        vec![1, 1, 1, 2, n_coeffs, 1].as_slice(),
        |_| seq.next_complex(),
    );
    // A solidly non-zero degree-0 coefficient in every slice.
    data.index_axis_mut(Axis(4), 0).fill(c64::new(1.5, 0.0));
    let mut spectral = SpectralField::new(
        f_grid,
        t_grid,
        vec![0.0],
        zenith_grid(2),
        Arc::clone(&sht),
        data.clone(),
    )
    .unwrap();

    let value = 2.5;
    spectral.normalize(value);

    // The integral is now exactly the requested value...
    let integrals = spectral.integrate_scattering_angles();
    for &integral in integrals.iter() {
        assert_relative_eq!(integral, value, max_relative = 1e-12);
    }
    // ...and every coefficient was scaled by the same factor, preserving
    // the angular structure.
    let factor = value / (1.5 * SQRT_4_PI);
    for (before, after) in data.iter().zip(spectral.get_data().iter()) {
        let expected = *before * factor;
        assert_abs_diff_eq!(after.re, expected.re, epsilon = 1e-12);
        assert_abs_diff_eq!(after.im, expected.im, epsilon = 1e-12);
    }
}

#[test]
fn addition_on_identical_grids_is_elementwise() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht = Sht::new(4, 3, 8, 6).unwrap();
    let mut seq = ValueSequence::new(8);
    let a = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 2, &mut seq, 0.0);
    let b = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 2, &mut seq, 0.0);

    let sum = &a + &b;
    let expected = a.get_data() + b.get_data();
    assert_tensors_close(sum.get_data(), &expected, 1e-12);

    // The same property in spectral form, where addition goes through the
    // coefficient merge.
    let a_s = a.to_spectral_truncated(4, 3).unwrap();
    let b_s = b.to_spectral_truncated(4, 3).unwrap();
    let sum_s = &a_s + &b_s;
    let expected_s = a_s.get_data() + b_s.get_data();
    assert_cmplx_tensors_close(sum_s.get_data(), &expected_s, 1e-12);
}

#[test]
fn addition_merges_mismatched_truncations() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht_fine = Sht::new(4, 3, 8, 6).unwrap();
    let sht_coarse = Sht::new(3, 2, 8, 6).unwrap();
    let mut seq = ValueSequence::new(9);
    let a = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht_fine, 1, &mut seq, 0.0);
    let b = synthetic_gridded(
        &f_grid, &t_grid, &lon_inc, &lat_inc, &sht_coarse, 1, &mut seq, 0.0,
    );

    let a_s = a.to_spectral_truncated(4, 3).unwrap();
    let b_s = b.to_spectral_truncated(3, 2).unwrap();
    let sum = &a_s + &b_s;

    // The coarser field's coefficients all fit into the finer truncation,
    // so the merge is lossless and the sum synthesizes to the gridded sum.
    let expected = a_s.to_gridded().get_data() + b_s.to_gridded().get_data();
    assert_tensors_close(sum.to_gridded().get_data(), &expected, 1e-10);
}

#[test]
fn scalar_multiplication_is_linear() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht = Sht::new(3, 2, 6, 5).unwrap();
    let mut seq = ValueSequence::new(10);
    let a = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 2, &mut seq, 0.0);

    let scaled = &a * 3.25;
    let expected = a.get_data() * 3.25;
    assert_tensors_close(scaled.get_data(), &expected, 1e-12);

    let a_s = a.to_spectral().unwrap();
    let scaled_s = &a_s * 3.25;
    let expected_s = a_s.get_data() * 3.25;
    assert_cmplx_tensors_close(scaled_s.get_data(), &expected_s, 1e-12);
}

#[test]
fn element_count_resize_round_trips() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht = Sht::new(3, 2, 6, 5).unwrap();
    let mut seq = ValueSequence::new(11);
    let original = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 3, &mut seq, 0.0);

    // Growing pads with exact zeros.
    let mut grown = original.copy();
    grown.set_number_of_scattering_coeffs(5);
    assert_eq!(grown.get_n_coeffs(), 5);
    for e in 0..3 {
        assert_tensors_close(
            &grown.get_data().index_axis(Axis(6), e).to_owned(),
            &original.get_data().index_axis(Axis(6), e).to_owned(),
            0.0,
        );
    }
    for e in 3..5 {
        assert!(grown.get_data().index_axis(Axis(6), e).iter().all(|&v| v == 0.0));
    }

    // Shrinking drops the trailing elements only.
    let mut shrunk = original.copy();
    shrunk.set_number_of_scattering_coeffs(2);
    assert_eq!(shrunk.get_n_coeffs(), 2);
    for e in 0..2 {
        assert_tensors_close(
            &shrunk.get_data().index_axis(Axis(6), e).to_owned(),
            &original.get_data().index_axis(Axis(6), e).to_owned(),
            0.0,
        );
    }
}

#[test]
fn copy_yields_independent_data() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht = Sht::new(3, 2, 6, 5).unwrap();
    let mut seq = ValueSequence::new(12);
    let original = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 1, &mut seq, 1.0);
    let reference = original.get_data().clone();

    let mut copied = original.copy();
    copied *= 2.0;
    copied.normalize(1.0);
    assert_tensors_close(original.get_data(), &reference, 0.0);
}

#[test]
fn set_data_assembles_composite_fields() {
    // A coarse composite field is filled from a donor defined on finer
    // angular grids at a single frequency and temperature.
    let mut composite = GriddedField::new_empty(
        vec![1e9, 1e10],
        vec![250.0, 290.0],
        vec![0.0],
        zenith_grid(3),
        azimuth_grid(4),
        zenith_grid(5),
        1,
    )
    .unwrap();

    let donor_value = 0.75;
    let donor = GriddedField::new(
        vec![1e10],
        vec![290.0],
        vec![0.0],
        zenith_grid(7),
        azimuth_grid(9),
        zenith_grid(11),
        ArrayD::from_elem(vec![1, 1, 1, 7, 9, 11, 1].as_slice(), donor_value),
    )
    .unwrap();

    composite.set_data(1, 1, &donor);

    // The written slice is the regridded donor (a constant stays a
    // constant); every other slice is untouched.
    for (ix, &v) in composite.get_data().indexed_iter() {
        if ix[0] == 1 && ix[1] == 1 {
            assert_abs_diff_eq!(v, donor_value, epsilon = 1e-12);
        } else {
            assert_abs_diff_eq!(v, 0.0);
        }
    }
}

#[test]
fn spectral_set_data_merges_coefficients() {
    let f_grid = vec![1e9, 1e10];
    let t_grid = vec![270.0];
    let sht = Arc::new(Sht::new(3, 2, 6, 5).unwrap());
    let mut composite = SpectralField::new_empty(
        f_grid,
        t_grid,
        vec![0.0],
        zenith_grid(2),
        Arc::clone(&sht),
        1,
    )
    .unwrap();

    let mut seq = ValueSequence::new(13);
    let donor_gridded = synthetic_gridded(
        &[1e10],
        &[270.0],
        &[0.0],
        &zenith_grid(2),
        &sht,
        1,
        &mut seq,
        0.0,
    );
    let donor = donor_gridded.to_spectral_truncated(3, 2).unwrap();

    composite.set_data(1, 0, &donor);

    // Into an empty slice, the merge reduces to a copy.
    let written = composite
        .get_data()
        .index_axis(Axis(0), 1)
        .to_owned()
        .into_dyn();
    let expected = donor.get_data().index_axis(Axis(0), 0).to_owned().into_dyn();
    assert_cmplx_tensors_close(&written, &expected, 1e-12);
    assert!(composite
        .get_data()
        .index_axis(Axis(0), 0)
        .iter()
        .all(|z| z.re == 0.0 && z.im == 0.0));
}

#[test]
fn truncation_growth_is_lossless() {
    let (f_grid, t_grid, lon_inc, lat_inc) = test_grids();
    let sht = Sht::new(3, 2, 8, 6).unwrap();
    let mut seq = ValueSequence::new(14);
    let gridded = synthetic_gridded(&f_grid, &t_grid, &lon_inc, &lat_inc, &sht, 1, &mut seq, 0.0);

    let spectral = gridded.to_spectral_truncated(3, 2).unwrap();
    let expanded = spectral.to_spectral_truncated(5, 3).unwrap();
    assert_eq!(
        expanded.get_sht_scat().get_n_spectral_coeffs(),
        Sht::new(5, 3, 8, 6).unwrap().get_n_spectral_coeffs()
    );
    assert_tensors_close(
        expanded.to_gridded().get_data(),
        spectral.to_gridded().get_data(),
        1e-10,
    );
}

#[test]
fn frequency_interpolation_is_linear() {
    let t_grid = vec![270.0];
    let sht = Sht::new(2, 1, 4, 3).unwrap();
    let mut seq = ValueSequence::new(15);
    let gridded = synthetic_gridded(
        &[1.0e9, 3.0e9],
        &t_grid,
        &[0.0],
        &zenith_grid(2),
        &sht,
        1,
        &mut seq,
        0.0,
    );

    let interpolated = gridded.interpolate_frequency(vec![2.0e9]).unwrap();
    assert_eq!(interpolated.get_n_freqs(), 1);
    let expected = (&gridded.get_data().index_axis(Axis(0), 0).to_owned()
        + &gridded.get_data().index_axis(Axis(0), 1).to_owned())
        * 0.5;
    assert_tensors_close(
        &interpolated.get_data().index_axis(Axis(0), 0).to_owned().into_dyn(),
        &expected.into_dyn(),
        1e-12,
    );
}

#[test]
fn temperature_extrapolation_flag_is_honoured() {
    let sht = Sht::new(2, 1, 4, 3).unwrap();
    let mut seq = ValueSequence::new(16);
    let gridded = synthetic_gridded(
        &[1e9],
        &[250.0, 300.0],
        &[0.0],
        &zenith_grid(2),
        &sht,
        1,
        &mut seq,
        0.0,
    );

    // Clamped: the out-of-range point reproduces the boundary.
    let clamped = gridded
        .interpolate_temperature(vec![350.0], false)
        .unwrap();
    let boundary = gridded.get_data().index_axis(Axis(1), 1).to_owned();
    assert_tensors_close(
        &clamped.get_data().index_axis(Axis(1), 0).to_owned().into_dyn(),
        &boundary.clone().into_dyn(),
        1e-12,
    );

    // Extrapolated: the edge segment continues linearly.
    let extrapolated = gridded.interpolate_temperature(vec![350.0], true).unwrap();
    let inner = gridded.get_data().index_axis(Axis(1), 0).to_owned();
    let expected = &boundary * 2.0 - &inner;
    assert_tensors_close(
        &extrapolated.get_data().index_axis(Axis(1), 0).to_owned().into_dyn(),
        &expected.into_dyn(),
        1e-12,
    );
}

#[test]
fn constant_field_integrates_to_4_pi() {
    // A constant unit field integrates to 4π in both formats; the spectral
    // route goes through the degree-0 coefficient alone.
    let data = ArrayD::from_elem(vec![1, 1, 1, 1, 8, 6, 1].as_slice(), 1.0);
    let sht = Sht::new(4, 3, 8, 6).unwrap();
    let gridded = GriddedField::new(
        vec![1e9],
        vec![270.0],
        vec![0.0],
        vec![PI / 2.0],
        sht.get_longitude_grid().to_vec(),
        sht.get_latitude_grid().to_vec(),
        data,
    )
    .unwrap();

    let integral = gridded.integrate_scattering_angles();
    assert_relative_eq!(integral[[0, 0, 0, 0, 0]], 4.0 * PI, max_relative = 1e-12);

    let spectral = gridded.to_spectral_truncated(4, 3).unwrap();
    let integral_s = spectral.integrate_scattering_angles();
    assert_relative_eq!(integral_s[[0, 0, 0, 0, 0]], 4.0 * PI, max_relative = 1e-10);
}

#[test]
fn random_particle_data_is_degenerate_but_valid() {
    // Totally random orientation: all angular grids except the scattering
    // zenith have a single point.
    let lat_scat = zenith_grid(16);
    let data = ArrayD::from_elem(vec![1, 1, 1, 1, 1, 16, 1].as_slice(), 1.0);
    let field = GriddedField::new(
        vec![1e9],
        vec![270.0],
        vec![0.0],
        vec![PI / 2.0],
        vec![0.0],
        lat_scat,
        data,
    )
    .unwrap();
    assert_eq!(field.get_particle_type(), ParticleType::Random);
    // The degenerate azimuth carries the full 2π.
    let integral = field.integrate_scattering_angles();
    assert_relative_eq!(integral[[0, 0, 0, 0, 0]], 4.0 * PI, max_relative = 1e-8);
}
