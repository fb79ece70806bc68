//! Adjustable effects
//!
//! Each effect is described by an [`EffectSpec`]: its default parameter,
//! the bounds the parameter is clamped into, and the transform that renders
//! it. The session state machine only ever talks to effects through this
//! descriptor.

pub mod transform;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::raster::RasterImage;

/// Effects a user can open from the main menu
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Brightness,
    Contrast,
    Pixelate,
}

/// Static description of an effect
#[derive(Debug, Clone, Copy)]
pub struct EffectSpec {
    /// Parameter value when the menu opens ("no adjustment")
    pub default: i32,
    /// Inclusive lower bound
    pub min: i32,
    /// Inclusive upper bound
    pub max: i32,
    /// Renders the effect at a given parameter
    pub transform: fn(&RasterImage, i32) -> RasterImage,
}

const BRIGHTNESS: EffectSpec = EffectSpec {
    default: 0,
    min: -255,
    max: 255,
    transform: transform::brightness,
};

// Contrast has no natural bound; the parameter only saturates at i32 limits.
const CONTRAST: EffectSpec = EffectSpec {
    default: 0,
    min: i32::MIN,
    max: i32::MAX,
    transform: transform::contrast,
};

const PIXELATE: EffectSpec = EffectSpec {
    default: 1,
    min: 1,
    max: 40,
    transform: transform::pixelate,
};

impl Effect {
    pub fn spec(self) -> &'static EffectSpec {
        match self {
            Effect::Brightness => &BRIGHTNESS,
            Effect::Contrast => &CONTRAST,
            Effect::Pixelate => &PIXELATE,
        }
    }

    pub fn default_parameter(self) -> i32 {
        self.spec().default
    }

    /// Apply `delta` to `current`, clamping into the effect's bounds
    ///
    /// Never wraps: overflowing deltas saturate before clamping.
    pub fn adjust(self, current: i32, delta: i32) -> i32 {
        let spec = self.spec();
        current.saturating_add(delta).clamp(spec.min, spec.max)
    }

    /// Render this effect at `parameter`
    pub fn apply(self, img: &RasterImage, parameter: i32) -> RasterImage {
        (self.spec().transform)(img, parameter)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Effect::Brightness => "Brightness",
            Effect::Contrast => "Contrast",
            Effect::Pixelate => "Pixel size",
        };
        f.write_str(name)
    }
}

/// Which way a "+" / "-" button nudges the parameter
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// Signed delta for a step of `step`
    pub fn delta(self, step: i32) -> i32 {
        match self {
            Direction::Increase => step,
            Direction::Decrease => step.saturating_neg(),
        }
    }
}
