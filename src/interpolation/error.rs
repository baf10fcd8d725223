// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegridError {
    #[error("the grid for axis {axis} has {grid_len} points, but the tensor axis has {axis_len}")]
    AxisLength {
        axis: usize,
        grid_len: usize,
        axis_len: usize,
    },

    #[error("cannot regrid from or onto an empty grid")]
    EmptyGrid,

    #[error("interpolation grids must be strictly ascending")]
    UnsortedGrid,
}
