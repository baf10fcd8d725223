// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShtError {
    #[error("invalid truncation: m_max ({m_max}) exceeds l_max ({l_max})")]
    InvalidTruncation { l_max: usize, m_max: usize },

    #[error(
        "the angular grid ({n_lon} x {n_lat}) is too small for the truncation \
         (l_max {l_max}, m_max {m_max}); n_lat >= l_max + 1 and n_lon >= 2 m_max + 1 \
         are required"
    )]
    GridTooSmall {
        l_max: usize,
        m_max: usize,
        n_lon: usize,
        n_lat: usize,
    },
}
