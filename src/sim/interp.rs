//! Easing curves for swirl falloff and spin

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Easing function applied to a 0-1 progress value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Interp {
    #[default]
    Linear,
    Pow2In,
    Pow2Out,
    Pow3In,
    Pow3Out,
    SineIn,
    SineOut,
    Smooth,
}

impl Interp {
    pub fn apply(self, a: f32) -> f32 {
        match self {
            Interp::Linear => a,
            Interp::Pow2In => a * a,
            Interp::Pow2Out => 1.0 - (a - 1.0) * (a - 1.0),
            Interp::Pow3In => a * a * a,
            Interp::Pow3Out => (a - 1.0).powi(3) + 1.0,
            Interp::SineIn => 1.0 - (a * FRAC_PI_2).cos(),
            Interp::SineOut => (a * FRAC_PI_2).sin(),
            Interp::Smooth => a * a * (3.0 - 2.0 * a),
        }
    }
}

/// Remap `f` from `[from, to]` to `[0, 1]`, clamped
#[inline]
pub fn curve(f: f32, from: f32, to: f32) -> f32 {
    if f < from {
        0.0
    } else if f > to {
        1.0
    } else if to <= from {
        1.0
    } else {
        (f - from) / (to - from)
    }
}
