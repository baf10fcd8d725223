// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.


/// An iterator over all index combinations of a set of dimensions, in
/// row-major order (the last dimension varies fastest).
///
/// The per-slice loops of the scattering-data formats run over the
/// non-angular axes (frequency × temperature × incoming angles × element) of
/// a data tensor; this iterator supplies those coordinates. It is finite and
/// restartable, and iterations are independent of each other.
pub(crate) struct CartesianIndices {
    dims: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl CartesianIndices {
    pub(crate) fn new(dims: &[usize]) -> CartesianIndices {
        // A zero-length dimension means there is nothing to iterate over.
        let next = if dims.iter().any(|&d| d == 0) {
            None
        } else {
            Some(vec![0; dims.len()])
        };
        CartesianIndices {
            dims: dims.to_vec(),
            next,
        }
    }
}

impl Iterator for CartesianIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        // Advance like an odometer, last digit fastest.
        let mut succ = current.clone();
        for (i, dim) in self.dims.iter().enumerate().rev() {
            succ[i] += 1;
            if succ[i] < *dim {
                self.next = Some(succ);
                break;
            }
            succ[i] = 0;
        }
        Some(current)
    }
}

/// Is the slice strictly ascending? Grids must be strictly ascending for
/// interpolation weights to be meaningful (repeated points would produce a
/// zero-width segment).
pub(crate) fn is_strictly_sorted(v: &[f64]) -> bool {
    v.windows(2).all(|w| w[0] < w[1])
}
