// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Spherical-harmonic transforms of angularly-gridded data.

An [`Sht`] is configured with a truncation (`l_max`, `m_max`) and an angular
grid (`n_lon` equidistant azimuth points on \[0, 2π), `n_lat` Gauss-Legendre
zenith angles) and maps between gridded matrices and spectral coefficient
vectors. The quadrature latitudes make the analysis exact for band-limited
fields, which is what the scattering-data formats rely on for lossless
round trips.

Coefficients are stored order-major: all degrees of order m = 0, then of
m = 1, and so on. The real-argument transform keeps orders m ≥ 0 (negative
orders follow from conjugate symmetry); the complex-argument variant keeps
all orders -m_max ..= m_max, ordered ascending in m.

The implementation is a direct summation over the grid. FFT-based longitude
handling and SIMD kernels are deliberately absent; the interface is what the
data model consumes, the internals are replaceable.
 */

mod error;

pub use error::ShtError;

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use num_traits::Zero;

use crate::constants::{SQRT_4_PI, TAU};
use crate::quadrature::GaussLegendreQuadrature;
use crate::c64;

/// A spherical-harmonic transform object for a fixed truncation and angular
/// grid.
#[derive(Debug, Clone)]
pub struct Sht {
    l_max: usize,
    m_max: usize,
    n_lon: usize,
    n_lat: usize,
    /// Azimuth angles, equidistant on [0, 2π).
    lon_grid: Vec<f64>,
    /// Zenith angles, ascending: arccos of the Gauss-Legendre nodes.
    lat_grid: Vec<f64>,
    /// Gauss-Legendre weights aligned with `lat_grid`.
    quad_weights: Vec<f64>,
    /// Normalized associated Legendre functions at cos(lat), one row per
    /// latitude, columns in real coefficient layout.
    plm: Array2<f64>,
}

impl Sht {
    /// Create a transform for the given truncation and grid sizes.
    ///
    /// The truncation must satisfy the anti-aliasing conditions
    /// `m_max <= l_max`, `n_lat >= l_max + 1` and `n_lon >= 2 m_max + 1`;
    /// degenerate single-point grids therefore force the corresponding
    /// truncation to zero. Violations are rejected here, never downstream.
    pub fn new(l_max: usize, m_max: usize, n_lon: usize, n_lat: usize) -> Result<Sht, ShtError> {
        if m_max > l_max {
            return Err(ShtError::InvalidTruncation { l_max, m_max });
        }
        if n_lat < l_max + 1 || n_lon < 2 * m_max + 1 {
            return Err(ShtError::GridTooSmall {
                l_max,
                m_max,
                n_lon,
                n_lat,
            });
        }

        let quadrature = GaussLegendreQuadrature::new(n_lat);
        // Ascending zenith angle means descending quadrature node.
        let lat_grid: Vec<f64> = quadrature.get_nodes().iter().rev().map(|x| x.acos()).collect();
        let quad_weights: Vec<f64> = quadrature.get_weights().iter().rev().copied().collect();
        let lon_grid: Vec<f64> = (0..n_lon).map(|j| j as f64 * TAU / n_lon as f64).collect();

        let n_coeffs = n_real_coeffs(l_max, m_max);
        let mut plm = Array2::zeros((n_lat, n_coeffs));
        for (i, theta) in lat_grid.iter().enumerate() {
            let mut row = plm.row_mut(i);
            normalized_legendre_row(theta.cos(), l_max, m_max, row.as_slice_mut().unwrap());
        }

        debug!("new SHT: l_max={l_max} m_max={m_max} n_lon={n_lon} n_lat={n_lat}");
        Ok(Sht {
            l_max,
            m_max,
            n_lon,
            n_lat,
            lon_grid,
            lat_grid,
            quad_weights,
            plm,
        })
    }

    /// The maximal anti-aliasing-safe parameters `(l_max, m_max, n_lon,
    /// n_lat)` for a given angular grid.
    pub fn get_params(n_lon: usize, n_lat: usize) -> (usize, usize, usize, usize) {
        let l_max = n_lat - 1;
        let m_max = l_max.min((n_lon - 1) / 2);
        (l_max, m_max, n_lon, n_lat)
    }

    pub fn get_l_max(&self) -> usize {
        self.l_max
    }

    pub fn get_m_max(&self) -> usize {
        self.m_max
    }

    pub fn get_n_longitudes(&self) -> usize {
        self.n_lon
    }

    pub fn get_n_latitudes(&self) -> usize {
        self.n_lat
    }

    /// The number of coefficients of the real-argument transform (orders
    /// m >= 0).
    pub fn get_n_spectral_coeffs(&self) -> usize {
        n_real_coeffs(self.l_max, self.m_max)
    }

    /// The number of coefficients of the complex-argument transform (orders
    /// -m_max ..= m_max).
    pub fn get_n_spectral_coeffs_cmplx(&self) -> usize {
        (2 * self.m_max + 1) * (self.l_max + 1) - self.m_max * (self.m_max + 1)
    }

    /// Azimuth angles \[radians\], equidistant on [0, 2π).
    pub fn get_longitude_grid(&self) -> &[f64] {
        &self.lon_grid
    }

    /// Zenith angles \[radians\], ascending on (0, π).
    pub fn get_latitude_grid(&self) -> &[f64] {
        &self.lat_grid
    }

    /// Cosines of the zenith angles (the Gauss-Legendre nodes, descending).
    pub fn get_colatitude_grid(&self) -> Vec<f64> {
        self.lat_grid.iter().map(|theta| theta.cos()).collect()
    }

    /// Index of the coefficient of degree l, order m in the real layout.
    fn coeff_index(&self, l: usize, m: usize) -> usize {
        m * (self.l_max + 1) - m * (m.saturating_sub(1)) / 2 + (l - m)
    }

    /// Index of the coefficient of degree l, order m in the complex layout.
    fn coeff_index_cmplx(&self, l: usize, m: isize) -> usize {
        let mut offset = 0;
        let mut mp = -(self.m_max as isize);
        while mp < m {
            offset += self.l_max + 1 - mp.unsigned_abs();
            mp += 1;
        }
        offset + (l - m.unsigned_abs())
    }

    /// Forward transform of a real angularly-gridded matrix
    /// (`n_lon` × `n_lat`) into spectral coefficients.
    pub fn transform(&self, data: ArrayView2<f64>) -> Array1<c64> {
        assert_eq!(
            data.dim(),
            (self.n_lon, self.n_lat),
            "gridded data does not match the SHT grid"
        );

        let fourier = self.fourier_analysis(|m| m as f64, self.m_max + 1, |j, i| {
            c64::new(data[(j, i)], 0.0)
        });

        let mut coeffs = Array1::<c64>::zeros(self.get_n_spectral_coeffs());
        for m in 0..=self.m_max {
            for l in m..=self.l_max {
                let idx = self.coeff_index(l, m);
                let mut acc = c64::zero();
                for i in 0..self.n_lat {
                    acc += fourier[(m, i)] * (self.quad_weights[i] * self.plm[(i, idx)]);
                }
                coeffs[idx] = acc;
            }
        }
        coeffs
    }

    /// Synthesize a real angularly-gridded matrix (`n_lon` × `n_lat`) from
    /// spectral coefficients. Inverse of [`Sht::transform`].
    pub fn synthesize(&self, coeffs: ArrayView1<c64>) -> Array2<f64> {
        assert_eq!(
            coeffs.len(),
            self.get_n_spectral_coeffs(),
            "coefficient vector does not match the SHT truncation"
        );

        // Legendre synthesis per order.
        let mut g = Array2::<c64>::zeros((self.m_max + 1, self.n_lat));
        for m in 0..=self.m_max {
            for l in m..=self.l_max {
                let idx = self.coeff_index(l, m);
                for i in 0..self.n_lat {
                    g[(m, i)] += coeffs[idx] * self.plm[(i, idx)];
                }
            }
        }

        // Fourier synthesis; negative orders are the conjugates of the
        // positive ones.
        let mut out = Array2::<f64>::zeros((self.n_lon, self.n_lat));
        for (j, &phi) in self.lon_grid.iter().enumerate() {
            for m in 0..=self.m_max {
                let phase = c64::from_polar(1.0, m as f64 * phi);
                let scale = if m == 0 { 1.0 } else { 2.0 };
                for i in 0..self.n_lat {
                    out[(j, i)] += scale * (g[(m, i)] * phase).re;
                }
            }
        }
        out
    }

    /// Forward transform of a complex angularly-gridded matrix, keeping all
    /// orders -m_max ..= m_max.
    pub fn transform_cmplx(&self, data: ArrayView2<c64>) -> Array1<c64> {
        assert_eq!(
            data.dim(),
            (self.n_lon, self.n_lat),
            "gridded data does not match the SHT grid"
        );

        let n_orders = 2 * self.m_max + 1;
        let fourier = self.fourier_analysis(
            |m_idx| (m_idx as isize - self.m_max as isize) as f64,
            n_orders,
            |j, i| data[(j, i)],
        );

        let mut coeffs = Array1::<c64>::zeros(self.get_n_spectral_coeffs_cmplx());
        for m in -(self.m_max as isize)..=(self.m_max as isize) {
            let m_idx = (m + self.m_max as isize) as usize;
            let m_abs = m.unsigned_abs();
            // Y_{l,-m} = (-1)^m conj(Y_{l,m}).
            let sign = if m < 0 && m_abs % 2 == 1 { -1.0 } else { 1.0 };
            for l in m_abs..=self.l_max {
                let idx = self.coeff_index_cmplx(l, m);
                let plm_idx = self.coeff_index(l, m_abs);
                let mut acc = c64::zero();
                for i in 0..self.n_lat {
                    acc += fourier[(m_idx, i)] * (self.quad_weights[i] * self.plm[(i, plm_idx)]);
                }
                coeffs[idx] = acc * sign;
            }
        }
        coeffs
    }

    /// Synthesize a complex angularly-gridded matrix from complex-argument
    /// coefficients. Inverse of [`Sht::transform_cmplx`].
    pub fn synthesize_cmplx(&self, coeffs: ArrayView1<c64>) -> Array2<c64> {
        assert_eq!(
            coeffs.len(),
            self.get_n_spectral_coeffs_cmplx(),
            "coefficient vector does not match the SHT truncation"
        );

        let n_orders = 2 * self.m_max + 1;
        let mut g = Array2::<c64>::zeros((n_orders, self.n_lat));
        for m in -(self.m_max as isize)..=(self.m_max as isize) {
            let m_idx = (m + self.m_max as isize) as usize;
            let m_abs = m.unsigned_abs();
            let sign = if m < 0 && m_abs % 2 == 1 { -1.0 } else { 1.0 };
            for l in m_abs..=self.l_max {
                let idx = self.coeff_index_cmplx(l, m);
                let plm_idx = self.coeff_index(l, m_abs);
                for i in 0..self.n_lat {
                    g[(m_idx, i)] += coeffs[idx] * (sign * self.plm[(i, plm_idx)]);
                }
            }
        }

        let mut out = Array2::<c64>::zeros((self.n_lon, self.n_lat));
        for (j, &phi) in self.lon_grid.iter().enumerate() {
            for m in -(self.m_max as isize)..=(self.m_max as isize) {
                let m_idx = (m + self.m_max as isize) as usize;
                let phase = c64::from_polar(1.0, m as f64 * phi);
                for i in 0..self.n_lat {
                    out[(j, i)] += g[(m_idx, i)] * phase;
                }
            }
        }
        out
    }

    /// Longitude analysis shared by the real and complex transforms:
    /// `g_m(θ_i) = Σ_j f(φ_j, θ_i) e^{-i m φ_j} Δφ`.
    fn fourier_analysis(
        &self,
        order: impl Fn(usize) -> f64,
        n_orders: usize,
        value: impl Fn(usize, usize) -> c64,
    ) -> Array2<c64> {
        let dphi = TAU / self.n_lon as f64;
        let mut g = Array2::<c64>::zeros((n_orders, self.n_lat));
        for (j, &phi) in self.lon_grid.iter().enumerate() {
            for m_idx in 0..n_orders {
                let phase = c64::from_polar(dphi, -order(m_idx) * phi);
                for i in 0..self.n_lat {
                    g[(m_idx, i)] += phase * value(j, i);
                }
            }
        }
        g
    }

    /// Re-express `b` on `sht_l`'s truncation and add it to `a`.
    ///
    /// The result has `sht_l`'s coefficient count; coefficients of `b`
    /// beyond `sht_l`'s truncation are dropped, so callers always pass the
    /// target transform as the left argument. This is the sole primitive for
    /// combining spectrally-represented data on mismatched truncations.
    pub fn add_coeffs(
        sht_l: &Sht,
        a: ArrayView1<c64>,
        sht_r: &Sht,
        b: ArrayView1<c64>,
    ) -> Array1<c64> {
        assert_eq!(
            a.len(),
            sht_l.get_n_spectral_coeffs(),
            "left coefficient vector does not match its SHT"
        );
        assert_eq!(
            b.len(),
            sht_r.get_n_spectral_coeffs(),
            "right coefficient vector does not match its SHT"
        );

        let mut out = a.to_owned();
        let l_shared = sht_l.l_max.min(sht_r.l_max);
        let m_shared = sht_l.m_max.min(sht_r.m_max);
        for m in 0..=m_shared {
            for l in m..=l_shared {
                out[sht_l.coeff_index(l, m)] += b[sht_r.coeff_index(l, m)];
            }
        }
        out
    }

    /// The two-axis variant of [`Sht::add_coeffs`] for coefficient matrices
    /// whose rows are complex-argument incoming-angle coefficients and whose
    /// columns are scattering-angle coefficients.
    pub fn add_coeffs_cmplx(
        inc_l: &Sht,
        scat_l: &Sht,
        a: ArrayView2<c64>,
        inc_r: &Sht,
        scat_r: &Sht,
        b: ArrayView2<c64>,
    ) -> Array2<c64> {
        assert_eq!(
            a.dim(),
            (
                inc_l.get_n_spectral_coeffs_cmplx(),
                scat_l.get_n_spectral_coeffs()
            ),
            "left coefficient matrix does not match its SHT pair"
        );
        assert_eq!(
            b.dim(),
            (
                inc_r.get_n_spectral_coeffs_cmplx(),
                scat_r.get_n_spectral_coeffs()
            ),
            "right coefficient matrix does not match its SHT pair"
        );

        let mut out = a.to_owned();
        let l_inc = inc_l.l_max.min(inc_r.l_max);
        let m_inc = inc_l.m_max.min(inc_r.m_max) as isize;
        let l_scat = scat_l.l_max.min(scat_r.l_max);
        let m_scat = scat_l.m_max.min(scat_r.m_max);
        for mi in -m_inc..=m_inc {
            for li in mi.unsigned_abs()..=l_inc {
                let row_l = inc_l.coeff_index_cmplx(li, mi);
                let row_r = inc_r.coeff_index_cmplx(li, mi);
                for ms in 0..=m_scat {
                    for ls in ms..=l_scat {
                        out[(row_l, scat_l.coeff_index(ls, ms))] +=
                            b[(row_r, scat_r.coeff_index(ls, ms))];
                    }
                }
            }
        }
        out
    }
}

/// The number of (l, m) pairs with 0 <= m <= min(l, m_max) and l <= l_max.
fn n_real_coeffs(l_max: usize, m_max: usize) -> usize {
    (m_max + 1) * (l_max + 1) - m_max * (m_max + 1) / 2
}

/// Evaluate the orthonormal (4π-normalized, Condon-Shortley phase)
/// associated Legendre functions at x = cos θ into `row`, using the real
/// coefficient layout.
///
/// Uses the standard stable recursions: diagonal first, then upward in
/// degree at fixed order.
fn normalized_legendre_row(x: f64, l_max: usize, m_max: usize, row: &mut [f64]) {
    let sin_theta = (1.0 - x * x).max(0.0).sqrt();
    let index = |l: usize, m: usize| m * (l_max + 1) - m * (m.saturating_sub(1)) / 2 + (l - m);

    let mut p_mm = 1.0 / SQRT_4_PI;
    for m in 0..=m_max {
        if m > 0 {
            p_mm *= -((2 * m + 1) as f64 / (2 * m) as f64).sqrt() * sin_theta;
        }
        row[index(m, m)] = p_mm;
        if l_max > m {
            let mut p_prev = p_mm;
            let mut p = ((2 * m + 3) as f64).sqrt() * x * p_mm;
            row[index(m + 1, m)] = p;
            for l in m + 2..=l_max {
                let lf = l as f64;
                let mf = m as f64;
                let a = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
                let b = (((lf - 1.0) * (lf - 1.0) - mf * mf)
                    / (4.0 * (lf - 1.0) * (lf - 1.0) - 1.0))
                    .sqrt();
                let p_next = a * (x * p - b * p_prev);
                p_prev = p;
                p = p_next;
                row[index(l, m)] = p_next;
            }
        }
    }
}
