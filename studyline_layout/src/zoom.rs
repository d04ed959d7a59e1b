// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};

/// An integer zoom step, always within [`Zoom::MIN`]`..=`[`Zoom::MAX`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct Zoom(i32);

impl Zoom {
    /// Smallest zoom step.
    pub const MIN: i32 = -3;
    /// Largest zoom step.
    pub const MAX: i32 = 3;

    /// Creates a zoom step, clamping out-of-range requests.
    pub fn new(step: i32) -> Self {
        Self(step.clamp(Self::MIN, Self::MAX))
    }

    /// The zoom step.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Column width multiplier, `base^step`.
    pub fn factor(self, base: f64) -> f64 {
        base.powi(self.0)
    }

    /// All zoom steps, smallest first.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl From<i32> for Zoom {
    fn from(step: i32) -> Self {
        Self::new(step)
    }
}

impl From<Zoom> for i32 {
    fn from(zoom: Zoom) -> Self {
        zoom.0
    }
}

/// A zoom request from the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ZoomRequest {
    /// Use this step (clamped).
    Fixed(Zoom),
    /// Pick the step whose total width is closest to the auto-fit target.
    AutoFit,
}

impl Default for ZoomRequest {
    fn default() -> Self {
        Self::Fixed(Zoom::default())
    }
}

impl From<i32> for ZoomRequest {
    fn from(step: i32) -> Self {
        Self::Fixed(Zoom::new(step))
    }
}

impl From<Zoom> for ZoomRequest {
    fn from(zoom: Zoom) -> Self {
        Self::Fixed(zoom)
    }
}
