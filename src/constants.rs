// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision; scattering data is combined and
normalized in double precision throughout.
 */

pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// The square root of 4π. The solid-angle integral of a band-limited field
/// equals its degree-0 spherical-harmonic coefficient multiplied by this
/// value.
pub const SQRT_4_PI: f64 = 3.544907701811032;
