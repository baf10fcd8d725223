// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("the data tensor has shape {found:?}, but the grids imply {expected:?}")]
    DataShape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("the {name} grid is empty")]
    EmptyGrid { name: &'static str },

    #[error("the {name} grid is not strictly ascending")]
    UnsortedGrid { name: &'static str },

    #[error(transparent)]
    Sht(#[from] crate::sht::ShtError),

    #[error(transparent)]
    Regrid(#[from] crate::interpolation::RegridError),
}
