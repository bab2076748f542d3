// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration.
//!
//! All distances are in drawing (world) units, angles in degrees.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How an endpoint picks among several registered points in snap range.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SnapPolicy {
    /// First registered point in range, in registration order.
    #[default]
    FirstMatch,
    /// Closest registered point; ties go to the earlier registration.
    Nearest,
}

/// Primitive normalization thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Segments (and rectangle sides) shorter than this are discarded
    pub min_length: f64,
    /// A rectangle with a side below this may be a thin filled wall
    pub thickness_threshold: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_length: 20.0,
            thickness_threshold: 15.0,
        }
    }
}

/// Configuration for the wall topology pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TopologyConfig {
    /// Maximum endpoint gap treated as the same connection point
    pub snap_distance: f64,
    /// Maximum deviation from colinear / perpendicular for a continuation
    pub angle_tolerance: f64,
    /// Minimum merged wall length; only applied with `enforce_min_wall_length`
    pub min_wall_length: f64,
    /// Drop merged walls shorter than `min_wall_length`. Off by default.
    pub enforce_min_wall_length: bool,
    pub snap_policy: SnapPolicy,
    pub normalizer: NormalizerConfig,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            snap_distance: 10.0,
            angle_tolerance: 5.0,
            min_wall_length: 50.0,
            enforce_min_wall_length: false,
            snap_policy: SnapPolicy::FirstMatch,
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl TopologyConfig {
    /// Build a validated configuration with the given snap distance and
    /// angle tolerance; all other options keep their defaults.
    pub fn new(snap_distance: f64, angle_tolerance: f64) -> Result<Self> {
        let config = Self {
            snap_distance,
            angle_tolerance,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would silently produce nonsense connectivity.
    pub fn validate(&self) -> Result<()> {
        positive("snap_distance", self.snap_distance)?;
        positive("angle_tolerance", self.angle_tolerance)?;
        non_negative("min_wall_length", self.min_wall_length)?;
        non_negative("normalizer.min_length", self.normalizer.min_length)?;
        non_negative(
            "normalizer.thickness_threshold",
            self.normalizer.thickness_threshold,
        )?;
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be a non-negative finite number, got {value}"
        )))
    }
}
