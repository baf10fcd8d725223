// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all scatfield-related errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScatteringError {
    #[error("{0}")]
    Field(#[from] crate::field::FieldError),

    #[error("{0}")]
    Sht(#[from] crate::sht::ShtError),

    #[error("{0}")]
    Regrid(#[from] crate::interpolation::RegridError),
}
