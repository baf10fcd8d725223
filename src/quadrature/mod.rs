// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Quadratures and integration weights.

[`GaussLegendreQuadrature`] provides node/weight pairs for integration over
\[-1, 1\]; it anchors the latitude grids of the spherical-harmonic transform.
The weight helpers below turn arbitrary sorted 1-D grids into trapezoidal
integration weights, which is what the gridded format's angular integral
uses: format grids are caller-supplied and generally not quadrature nodes.
 */


use ndarray::Array1;

const NEWTON_MAX_ITER: usize = 100;
const NEWTON_PRECISION: f64 = 1e-15;

/// Gauss-Legendre quadrature for the integration of functions over the
/// interval \[-1, 1\].
///
/// A quadrature of degree n integrates polynomials up to degree 2n - 1
/// exactly.
#[derive(Debug, Clone)]
pub struct GaussLegendreQuadrature {
    degree: usize,
    nodes: Array1<f64>,
    weights: Array1<f64>,
}

impl GaussLegendreQuadrature {
    /// Find the nodes and weights for a quadrature of the given degree.
    ///
    /// The nodes are the roots of the Legendre polynomial of that degree,
    /// found by Newton iteration; Legendre values come from the three-term
    /// recurrence. Nodes are returned in ascending order.
    pub fn new(degree: usize) -> GaussLegendreQuadrature {
        assert!(degree > 0, "quadrature degree must be at least 1");
        let n = degree;
        let mut nodes = Array1::zeros(n);
        let mut weights = Array1::zeros(n);

        let nf = n as f64;
        // Evaluate P_n and its derivative at x via the three-term
        // recurrence; P_n'(x) = n (P_{n-1} - x P_n) / (1 - x^2).
        let eval = |x: f64| -> (f64, f64) {
            let mut p_l = x;
            let mut p_l_1 = 1.0;
            for l in 2..=n {
                let lf = l as f64;
                let p_l_2 = p_l_1;
                p_l_1 = p_l;
                p_l = ((2.0 * lf - 1.0) * x * p_l_1 - (lf - 1.0) * p_l_2) / lf;
            }
            let dp_dx = nf * (p_l_1 - x * p_l) / ((1.0 - x) * (1.0 + x));
            (p_l, dp_dx)
        };

        // The nodes are symmetric about 0; find the non-positive half and
        // mirror.
        let n_half = (n + 1) / 2;
        for i in 1..=n_half {
            // Tricomi's initial guess for the i-th root.
            let mut x = -(1.0 - (nf - 1.0) / (8.0 * nf * nf * nf))
                * (std::f64::consts::PI * (4.0 * i as f64 - 1.0) / (4.0 * nf + 2.0)).cos();

            for _ in 0..NEWTON_MAX_ITER {
                let (p, dp_dx) = eval(x);
                let x_old = x;
                x -= p / dp_dx;
                if (x - x_old).abs() < NEWTON_PRECISION {
                    break;
                }
            }

            let (_, dp_dx) = eval(x);
            let w = 2.0 / ((1.0 - x * x) * dp_dx * dp_dx);

            nodes[i - 1] = x;
            weights[i - 1] = w;
            nodes[n - i] = -x;
            weights[n - i] = w;
        }

        // Degree 1 degenerates to the midpoint rule.
        if n == 1 {
            nodes[0] = 0.0;
            weights[0] = 2.0;
        }

        GaussLegendreQuadrature {
            degree,
            nodes,
            weights,
        }
    }

    pub fn get_degree(&self) -> usize {
        self.degree
    }

    pub fn get_nodes(&self) -> &Array1<f64> {
        &self.nodes
    }

    pub fn get_weights(&self) -> &Array1<f64> {
        &self.weights
    }
}

/// Trapezoidal integration weights for a sorted grid spanning the given
/// domain.
///
/// The integrand is treated as piecewise linear between grid points and
/// constant between the domain boundaries and the outermost points, matching
/// the clamping behaviour of the regridder. A single-point grid therefore
/// carries the full domain span; that is what makes degenerate (size-1)
/// angular grids integrate correctly.
pub fn integration_weights(grid: &[f64], domain: (f64, f64)) -> Array1<f64> {
    let n = grid.len();
    assert!(n > 0, "cannot integrate over an empty grid");
    let mut weights = Array1::zeros(n);
    for i in 0..n {
        let lower = if i == 0 { domain.0 } else { grid[i - 1] };
        let upper = if i == n - 1 { domain.1 } else { grid[i + 1] };
        weights[i] = 0.5 * (upper - lower);
    }
    // The boundary segments are constant, not shared with a neighbour.
    weights[0] += 0.5 * (grid[0] - domain.0);
    weights[n - 1] += 0.5 * (domain.1 - grid[n - 1]);
    weights
}

/// Trapezoidal integration weights for a sorted grid on a periodic domain
/// \[0, period).
///
/// The wrap-around segment between the last and (periodically continued)
/// first point is included, so the weights always sum to the full period. A
/// single point carries the whole period.
pub fn periodic_integration_weights(grid: &[f64], period: f64) -> Array1<f64> {
    let n = grid.len();
    assert!(n > 0, "cannot integrate over an empty grid");
    if n == 1 {
        return Array1::from_elem(1, period);
    }
    let mut weights = Array1::zeros(n);
    for i in 0..n {
        let lower = if i == 0 {
            grid[n - 1] - period
        } else {
            grid[i - 1]
        };
        let upper = if i == n - 1 { grid[0] + period } else { grid[i + 1] };
        weights[i] = 0.5 * (upper - lower);
    }
    weights
}
